use crate::beat::Beat;
use crate::error::ParseError;
use num_integer::Integer;
use std::collections::BTreeMap;
use std::fmt;

/// Rows per measure when a measure holds nothing finer than quarter notes.
const MIN_ROWS_PER_MEASURE: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoteType {
    Tap,
    HoldHead,
    Tail,
    RollHead,
    Attack,
    Fake,
    Keysound,
    Lift,
    Mine,
}

impl NoteType {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '1' => Some(NoteType::Tap),
            '2' => Some(NoteType::HoldHead),
            '3' => Some(NoteType::Tail),
            '4' => Some(NoteType::RollHead),
            'A' => Some(NoteType::Attack),
            'F' => Some(NoteType::Fake),
            'K' => Some(NoteType::Keysound),
            'L' => Some(NoteType::Lift),
            'M' => Some(NoteType::Mine),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            NoteType::Tap => '1',
            NoteType::HoldHead => '2',
            NoteType::Tail => '3',
            NoteType::RollHead => '4',
            NoteType::Attack => 'A',
            NoteType::Fake => 'F',
            NoteType::Keysound => 'K',
            NoteType::Lift => 'L',
            NoteType::Mine => 'M',
        }
    }
}

/// A single placed object in a chart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Note {
    pub beat: Beat,
    pub column: usize,
    pub note_type: NoteType,
    pub player: usize,
    pub keysound_index: Option<u32>,
}

/// Decomposed view of a chart's note notation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteData {
    columns: usize,
    players: usize,
    notes: Vec<Note>,
}

impl NoteData {
    /// Decompose note notation (measures split by `,`, players by `&`) into notes.
    pub fn parse(notation: &str) -> Result<Self, ParseError> {
        let mut columns = 0;
        let mut notes = Vec::new();
        let blocks: Vec<&str> = notation.split('&').collect();

        for (player, block) in blocks.iter().enumerate() {
            for (measure, text) in block.split(',').enumerate() {
                let rows = text
                    .lines()
                    .map(|line| strip_comment(line).trim())
                    .filter(|line| !line.is_empty())
                    .map(parse_row)
                    .collect::<Result<Vec<_>, _>>()?;

                for (row_index, row) in rows.iter().enumerate() {
                    if columns == 0 {
                        columns = row.len();
                    } else if row.len() != columns {
                        return Err(ParseError::RowWidth {
                            row: row_text(row),
                            found: row.len(),
                            expected: columns,
                        });
                    }

                    let beat = Beat::from_row(measure, row_index, rows.len());
                    for (column, cell) in row.iter().enumerate() {
                        if let Some((note_type, keysound_index)) = *cell {
                            notes.push(Note {
                                beat,
                                column,
                                note_type,
                                player,
                                keysound_index,
                            });
                        }
                    }
                }
            }
        }

        Ok(NoteData {
            columns,
            players: blocks.len(),
            notes,
        })
    }

    /// Build note data from a note sequence for a chart with `columns` columns.
    /// The player count is taken from the highest player index present.
    pub fn from_notes(notes: impl IntoIterator<Item = Note>, columns: usize) -> Self {
        let notes: Vec<Note> = notes.into_iter().collect();
        NoteData {
            columns,
            players: notes.iter().map(|n| n.player + 1).max().unwrap_or(1),
            notes,
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Number of `&`-separated player blocks, including empty ones.
    pub fn players(&self) -> usize {
        self.players
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Note> {
        self.notes.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Recompose the notes into measure notation.
    pub fn to_notation(&self) -> String {
        let players = self.notes.iter().map(|n| n.player + 1).fold(self.players, usize::max);

        (0..players.max(1))
            .map(|player| self.player_notation(player))
            .collect::<Vec<_>>()
            .join("\n&\n")
    }

    fn player_notation(&self, player: usize) -> String {
        let mut measures: BTreeMap<usize, Vec<&Note>> = BTreeMap::new();
        for note in self.notes.iter().filter(|n| n.player == player) {
            measures.entry(note.beat.measure()).or_default().push(note);
        }
        let measure_count = measures.keys().next_back().map_or(1, |m| m + 1);

        (0..measure_count)
            .map(|index| {
                let notes = measures.get(&index).map(Vec::as_slice).unwrap_or(&[]);
                self.measure_notation(notes)
            })
            .collect::<Vec<_>>()
            .join("\n,\n")
    }

    fn measure_notation(&self, notes: &[&Note]) -> String {
        let rows = notes
            .iter()
            .fold(MIN_ROWS_PER_MEASURE, |acc, n| acc.lcm(&n.beat.rows_needed()));

        let mut grid = vec![vec![String::from("0"); self.columns]; rows];
        for note in notes {
            let Some(row) = note.beat.row_in_measure(rows) else {
                continue;
            };
            if let Some(cell) = grid.get_mut(row).and_then(|r| r.get_mut(note.column)) {
                *cell = match note.keysound_index {
                    Some(index) => format!("{}[{}]", note.note_type.as_char(), index),
                    None => note.note_type.as_char().to_string(),
                };
            }
        }

        grid.iter()
            .map(|row| row.concat())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for NoteData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_notation())
    }
}

impl<'a> IntoIterator for &'a NoteData {
    type Item = &'a Note;
    type IntoIter = std::slice::Iter<'a, Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.notes.iter()
    }
}

impl IntoIterator for NoteData {
    type Item = Note;
    type IntoIter = std::vec::IntoIter<Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.notes.into_iter()
    }
}

/// Turn a roll head into a hold head; every other note passes through.
pub fn roll_to_hold(note: Note) -> Note {
    let note_type = match note.note_type {
        NoteType::RollHead => NoteType::HoldHead,
        other @ (NoteType::Tap
        | NoteType::HoldHead
        | NoteType::Tail
        | NoteType::Attack
        | NoteType::Fake
        | NoteType::Keysound
        | NoteType::Lift
        | NoteType::Mine) => other,
    };
    Note { note_type, ..note }
}

pub fn rewrite_rolls_to_holds(data: &NoteData) -> NoteData {
    NoteData {
        columns: data.columns,
        players: data.players,
        notes: data.iter().copied().map(roll_to_hold).collect(),
    }
}

type Cell = Option<(NoteType, Option<u32>)>;

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn parse_row(line: &str) -> Result<Vec<Cell>, ParseError> {
    let mut cells = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '0' {
            cells.push(None);
            continue;
        }
        let note_type = NoteType::from_char(c).ok_or(ParseError::UnknownNote(c))?;

        let mut keysound_index = None;
        if chars.peek() == Some(&'[') {
            chars.next();
            let digits: String = chars.by_ref().take_while(|&d| d != ']').collect();
            let index = digits
                .trim()
                .parse::<u32>()
                .map_err(|_| ParseError::BadKeysound(line.to_string()))?;
            keysound_index = Some(index);
        }
        cells.push(Some((note_type, keysound_index)));
    }

    Ok(cells)
}

fn row_text(row: &[Cell]) -> String {
    row.iter()
        .map(|cell| cell.map_or('0', |(t, _)| t.as_char()))
        .collect()
}
