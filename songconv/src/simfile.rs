//! Reading and writing `.sm` simfiles.
//!
//! A simfile is a flat list of `#KEY:value;` properties. Every `#NOTES`
//! property is a chart made of six `:`-separated fields, the last of which
//! holds the note notation. Values are kept exactly as written so that a
//! document serializes back to the same text, apart from whatever was
//! changed in between.

use crate::error::{ConvertError, ParseError, Result};
use crate::notes::{rewrite_rolls_to_holds, NoteData};
use crate::SongFiles;
use std::fmt;
use std::path::Path;

/// Properties that only exist in the `.ssc` flavour of the format.
const SSC_ONLY_KEYS: [&str; 3] = ["VERSION", "NOTEDATA", "STEPSTYPE"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    pub key: String,
    pub value: String,
}

/// One `#NOTES` entry. Fields are stored verbatim, including surrounding whitespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chart {
    pub stepstype: String,
    pub description: String,
    pub difficulty: String,
    pub meter: String,
    pub radarvalues: String,
    pub notes: String,
}

impl Chart {
    fn from_value(value: &str, line: usize) -> std::result::Result<Self, ParseError> {
        let fields: Vec<&str> = value.split(':').collect();
        match fields.as_slice() {
            [stepstype, description, difficulty, meter, radarvalues, notes] => Ok(Chart {
                stepstype: stepstype.to_string(),
                description: description.to_string(),
                difficulty: difficulty.to_string(),
                meter: meter.to_string(),
                radarvalues: radarvalues.to_string(),
                notes: notes.to_string(),
            }),
            _ => Err(ParseError::MalformedChart {
                line,
                found: fields.len(),
            }),
        }
    }

    pub fn note_data(&self) -> std::result::Result<NoteData, ParseError> {
        NoteData::parse(&self.notes)
    }

    /// Replace the notation with a recomposed version of `data`.
    pub fn set_note_data(&mut self, data: &NoteData) {
        self.notes = format!("\n{}\n", data);
    }

    /// A copy of this chart with every roll head turned into a hold head.
    pub fn with_rolls_as_holds(&self) -> std::result::Result<Chart, ParseError> {
        let data = self.note_data()?;
        let mut chart = self.clone();
        // nothing to recompose without a single row to take the width from
        if data.columns() > 0 {
            chart.set_note_data(&rewrite_rolls_to_holds(&data));
        }
        Ok(chart)
    }

    fn value(&self) -> String {
        [
            self.stepstype.as_str(),
            self.description.as_str(),
            self.difficulty.as_str(),
            self.meter.as_str(),
            self.radarvalues.as_str(),
            self.notes.as_str(),
        ]
        .join(":")
    }
}

/// A parsed `.sm` document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimfileDocument {
    properties: Vec<Property>,
    charts: Vec<Chart>,
}

impl SimfileDocument {
    /// Read and parse the simfile at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let is_ssc = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("ssc"));
        if is_ssc {
            return Err(ParseError::UnsupportedVariant.into());
        }

        let bytes = std::fs::read(path).map_err(|e| ConvertError::io(path, e))?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(Self::parse(text.trim_start_matches('\u{feff}'))?)
    }

    pub fn parse(text: &str) -> std::result::Result<Self, ParseError> {
        let mut document = SimfileDocument::default();

        for (key, value, line) in tokenize(text)? {
            if SSC_ONLY_KEYS.iter().any(|k| key.eq_ignore_ascii_case(k)) {
                return Err(ParseError::UnsupportedVariant);
            }
            if key.eq_ignore_ascii_case("NOTES") {
                document.charts.push(Chart::from_value(&value, line)?);
            } else {
                document.properties.push(Property { key, value });
            }
        }

        Ok(document)
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn charts(&self) -> &[Chart] {
        &self.charts
    }

    pub fn charts_mut(&mut self) -> &mut [Chart] {
        &mut self.charts
    }

    /// Value of the first property named `key` (case-insensitive).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.key.eq_ignore_ascii_case(key))
            .map(|p| p.value.as_str())
    }

    /// Overwrite the property named `key`, appending it if absent.
    pub fn set(&mut self, key: &str, value: &str) {
        match self
            .properties
            .iter_mut()
            .find(|p| p.key.eq_ignore_ascii_case(key))
        {
            Some(property) => property.value = value.to_string(),
            None => self.properties.push(Property {
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }

    pub fn music(&self) -> Option<&str> {
        self.get("MUSIC")
    }

    pub fn background(&self) -> Option<&str> {
        self.get("BACKGROUND")
    }

    pub fn banner(&self) -> Option<&str> {
        self.get("BANNER")
    }

    /// Point the music, background and banner fields at `files`.
    pub fn apply_asset_references(&mut self, files: &SongFiles) {
        self.set("MUSIC", &files.music);
        self.set("BACKGROUND", &files.background);
        self.set("BANNER", &files.banner);
    }

    /// Rewrite roll heads into hold heads in every chart.
    pub fn rewrite_rolls_to_holds(&mut self) -> std::result::Result<(), ParseError> {
        let charts = self
            .charts
            .iter()
            .map(Chart::with_rolls_as_holds)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.charts = charts;
        Ok(())
    }

    pub fn serialize(&self) -> String {
        let mut output = String::new();
        for property in &self.properties {
            output.push_str(&format!("#{}:{};\n", property.key, property.value));
        }
        for chart in &self.charts {
            output.push_str(&format!("\n#NOTES:{};\n", chart.value()));
        }
        output
    }
}

impl fmt::Display for SimfileDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

/// Split MSD text into `(key, value, line)` triples.
fn tokenize(text: &str) -> std::result::Result<Vec<(String, String, usize)>, ParseError> {
    let mut properties = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1;

    while let Some(c) = chars.next() {
        match c {
            '\n' => line += 1,
            c if c.is_whitespace() => {}
            '/' if chars.peek() == Some(&'/') => skip_comment(&mut chars),
            '#' => {
                let start = line;
                let mut key = String::new();
                // `#KEY;` is a key with an empty value
                let mut has_value = true;
                loop {
                    match chars.next() {
                        Some(':') => break,
                        Some(';') | None => {
                            has_value = false;
                            break;
                        }
                        Some(c) => {
                            if c == '\n' {
                                line += 1;
                            }
                            key.push(c);
                        }
                    }
                }

                let mut value = String::new();
                while has_value {
                    match chars.next() {
                        Some(';') | None => break,
                        Some('\\') => {
                            value.push('\\');
                            if let Some(escaped) = chars.next() {
                                value.push(escaped);
                            }
                        }
                        Some('/') if chars.peek() == Some(&'/') => skip_comment(&mut chars),
                        Some('\n') => {
                            line += 1;
                            // a '#' opening a line means the ';' was forgotten
                            if chars.peek() == Some(&'#') {
                                break;
                            }
                            value.push('\n');
                        }
                        Some(c) => value.push(c),
                    }
                }

                properties.push((key.trim().to_string(), value, start));
            }
            _ => return Err(ParseError::StrayText { line }),
        }
    }

    Ok(properties)
}

fn skip_comment(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while let Some(&c) = chars.peek() {
        if c == '\n' {
            break;
        }
        chars.next();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::NoteType;

    const SIMFILE: &str = "#TITLE:Test Song;
#ARTIST:Someone;
#BANNER:banner art.png;
#BACKGROUND:bg.jpg;
#MUSIC:song.mp3;
#OFFSET:-0.012;
#BPMS:0.000=150.000;

//--------------- dance-single - Foo ----------------
#NOTES:
     dance-single:
     Foo:
     Challenge:
     9:
     0.1,0.2,0.3,0.4,0.5:
0000
4000
0000
3000
;
";

    #[test]
    fn test_parse_fields() {
        let doc = SimfileDocument::parse(SIMFILE).unwrap();
        assert_eq!(doc.music(), Some("song.mp3"));
        assert_eq!(doc.background(), Some("bg.jpg"));
        assert_eq!(doc.banner(), Some("banner art.png"));
        assert_eq!(doc.get("bpms"), Some("0.000=150.000"));
        assert_eq!(doc.charts().len(), 1);

        let chart = &doc.charts()[0];
        assert_eq!(chart.stepstype.trim(), "dance-single");
        assert_eq!(chart.difficulty.trim(), "Challenge");
        assert_eq!(chart.meter.trim(), "9");
    }

    #[test]
    fn test_serialize_is_lossless() {
        let doc = SimfileDocument::parse(SIMFILE).unwrap();
        let text = doc.serialize();
        assert_eq!(SimfileDocument::parse(&text).unwrap(), doc);
        assert!(text.contains("#OFFSET:-0.012;\n"));
        assert!(text.contains("#NOTES:\n     dance-single:\n"));
    }

    #[test]
    fn test_apply_asset_references() {
        let mut doc = SimfileDocument::parse(SIMFILE).unwrap();
        doc.apply_asset_references(&SongFiles::canonical());

        assert_eq!(doc.music(), Some("audio.ogg"));
        assert_eq!(doc.background(), Some("bg.png"));
        assert_eq!(doc.banner(), Some("bn.png"));
        assert_eq!(doc.get("TITLE"), Some("Test Song"));
        assert_eq!(doc.properties().len(), 7);
    }

    #[test]
    fn test_missing_asset_field_is_appended() {
        let mut doc = SimfileDocument::parse("#TITLE:x;\n").unwrap();
        assert_eq!(doc.banner(), None);
        doc.apply_asset_references(&SongFiles::canonical());
        assert_eq!(doc.banner(), Some("bn.png"));
    }

    #[test]
    fn test_rewrite_rolls() {
        let mut doc = SimfileDocument::parse(SIMFILE).unwrap();
        doc.rewrite_rolls_to_holds().unwrap();

        let notes = doc.charts()[0].note_data().unwrap();
        assert_eq!(notes.notes()[0].note_type, NoteType::HoldHead);
        assert_eq!(notes.notes()[1].note_type, NoteType::Tail);
        assert_eq!(doc.charts()[0].notes, "\n0000\n2000\n0000\n3000\n");
        assert_eq!(doc.charts()[0].radarvalues, SimfileDocument::parse(SIMFILE).unwrap().charts()[0].radarvalues);
    }

    #[test]
    fn test_empty_chart_is_left_alone() {
        let text = "#NOTES:dance-single::Beginner:1:0:\n;";
        let mut doc = SimfileDocument::parse(text).unwrap();
        doc.rewrite_rolls_to_holds().unwrap();
        assert_eq!(doc.charts()[0].notes, "\n");
    }

    #[test]
    fn test_ssc_is_rejected() {
        let text = "#VERSION:0.83;\n#TITLE:x;\n#NOTEDATA:;\n";
        assert_eq!(SimfileDocument::parse(text), Err(ParseError::UnsupportedVariant));
    }

    #[test]
    fn test_missing_semicolon_recovers() {
        let doc = SimfileDocument::parse("#TITLE:x\n#MUSIC:a.ogg;\n#BANNER:b.png").unwrap();
        assert_eq!(doc.get("TITLE"), Some("x"));
        assert_eq!(doc.music(), Some("a.ogg"));
        assert_eq!(doc.banner(), Some("b.png"));
    }

    #[test]
    fn test_key_without_value() {
        let doc = SimfileDocument::parse("#TITLE:x;\n#SELECTABLE;\n#MUSIC:a.ogg;\n").unwrap();
        assert_eq!(doc.get("SELECTABLE"), Some(""));
        assert_eq!(doc.music(), Some("a.ogg"));
        assert_eq!(doc.properties().len(), 3);

        let doc = SimfileDocument::parse("#TITLE:x;\n#SELECTABLE").unwrap();
        assert_eq!(doc.get("SELECTABLE"), Some(""));
    }

    #[test]
    fn test_stray_text() {
        assert_eq!(
            SimfileDocument::parse("#TITLE:x;\nhello\n"),
            Err(ParseError::StrayText { line: 2 })
        );
    }

    #[test]
    fn test_malformed_chart() {
        let err = SimfileDocument::parse("#TITLE:x;\n#NOTES:dance-single:1000;\n").unwrap_err();
        assert_eq!(err, ParseError::MalformedChart { line: 2, found: 2 });
    }
}
