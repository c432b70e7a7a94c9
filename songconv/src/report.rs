use crate::error::ConvertError;
use std::fmt;

/// What happened to one asset of a song.
#[derive(Debug)]
pub enum StepOutcome {
    Converted,
    /// Output already present and left untouched.
    Skipped,
    Failed(ConvertError),
    /// An earlier fatal step stopped the song first.
    NotAttempted,
}

impl StepOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }

    pub fn error(&self) -> Option<&ConvertError> {
        match self {
            StepOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Converted => write!(f, "converted"),
            StepOutcome::Skipped => write!(f, "skipped"),
            StepOutcome::Failed(e) => write!(f, "failed ({})", e),
            StepOutcome::NotAttempted => write!(f, "not attempted"),
        }
    }
}

/// Per-song result of a conversion.
///
/// Only the chart and audio steps decide the status; banner and background
/// failures are recorded here and nowhere else.
#[derive(Debug)]
pub struct SongReport {
    pub chart: StepOutcome,
    pub audio: StepOutcome,
    pub banner: StepOutcome,
    pub background: StepOutcome,
}

impl Default for SongReport {
    fn default() -> Self {
        SongReport {
            chart: StepOutcome::NotAttempted,
            audio: StepOutcome::NotAttempted,
            banner: StepOutcome::NotAttempted,
            background: StepOutcome::NotAttempted,
        }
    }
}

impl SongReport {
    pub fn is_success(&self) -> bool {
        matches!(self.chart, StepOutcome::Converted)
            && matches!(self.audio, StepOutcome::Converted | StepOutcome::Skipped)
    }

    /// 0 when the song is playable, 1 otherwise.
    pub fn status(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

/// Totals over a whole batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub converted: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn record(&mut self, report: &SongReport) {
        if report.is_success() {
            self.converted += 1;
        } else {
            self.failed += 1;
        }
    }
}
