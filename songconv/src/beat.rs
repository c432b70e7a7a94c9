use num_integer::Integer;
use std::cmp::Ordering;
use std::fmt;

/// Beats per measure in 4/4 note data.
pub const BEATS_PER_MEASURE: i64 = 4;

/// An exact beat position, kept as a reduced fraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Beat {
    num: i64,
    den: i64,
}

impl Beat {
    /// Build a beat from `num / den`. A zero denominator is treated as 1.
    pub fn new(num: i64, den: i64) -> Self {
        let den = if den == 0 { 1 } else { den };
        let sign = if den < 0 { -1 } else { 1 };
        let g = num.gcd(&den).max(1);
        Beat {
            num: sign * num / g,
            den: sign * den / g,
        }
    }

    pub fn whole(beats: i64) -> Self {
        Beat { num: beats, den: 1 }
    }

    /// Position of `row` out of `rows` evenly spaced rows in `measure`.
    pub fn from_row(measure: usize, row: usize, rows: usize) -> Self {
        let rows = rows.max(1) as i64;
        Beat::new(
            BEATS_PER_MEASURE * (measure as i64 * rows + row as i64),
            rows,
        )
    }

    pub fn numer(&self) -> i64 {
        self.num
    }

    pub fn denom(&self) -> i64 {
        self.den
    }

    /// Index of the measure this beat falls in.
    pub fn measure(&self) -> usize {
        Integer::div_floor(&self.num, &(BEATS_PER_MEASURE * self.den)).max(0) as usize
    }

    /// Smallest number of rows per measure that puts this beat on a row.
    pub fn rows_needed(&self) -> usize {
        // offset inside the measure as a fraction of the measure
        let measure_den = BEATS_PER_MEASURE * self.den;
        let offset = self.num.mod_floor(&measure_den);
        (measure_den / offset.gcd(&measure_den).max(1)) as usize
    }

    /// Row index of this beat in its measure when the measure has `rows` rows.
    /// Returns `None` when the beat does not land on one of those rows.
    pub fn row_in_measure(&self, rows: usize) -> Option<usize> {
        let measure_den = BEATS_PER_MEASURE * self.den;
        let scaled = self.num.mod_floor(&measure_den) * rows as i64;
        if scaled % measure_den == 0 {
            Some((scaled / measure_den) as usize)
        } else {
            None
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl Ord for Beat {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.num as i128 * other.den as i128).cmp(&(other.num as i128 * self.den as i128))
    }
}

impl PartialOrd for Beat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Beat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}
