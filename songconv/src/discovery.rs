use crate::error::{ConvertError, Result};
use crate::reporter::Reporter;
use crate::simfile::SimfileDocument;
use log::Level;
use std::path::{Path, PathBuf};

/// Preferred chart extension.
pub const PRIMARY_EXTENSION: &str = "sm";
/// Only used when no primary chart exists.
pub const SECONDARY_EXTENSION: &str = "ssc";

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// Pick the chart out of a list of directory entries.
pub fn select_chart_file<I>(entries: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut fallback = None;
    for entry in entries {
        if has_extension(&entry, PRIMARY_EXTENSION) {
            return Some(entry);
        }
        if has_extension(&entry, SECONDARY_EXTENSION) {
            fallback = Some(entry);
        }
    }
    fallback
}

/// Locate the chart file among the immediate entries of `dir`.
pub fn find_chart_file(dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    select_chart_file(entries.filter_map(|e| e.ok()).map(|e| e.path()))
}

/// The chart of `dir`, provided it parses.
pub fn check_song_directory(dir: &Path) -> Result<PathBuf> {
    let chart = find_chart_file(dir).ok_or_else(|| ConvertError::NoChart(dir.to_path_buf()))?;
    SimfileDocument::open(&chart)?;
    Ok(chart)
}

/// Whether `dir` holds a chart that parses. Never fails, only answers.
pub fn is_valid_song_directory(dir: &Path) -> bool {
    check_song_directory(dir).is_ok()
}

/// Every immediate subdirectory of `base` that is a valid song directory.
/// Skipped subdirectories are reported at debug level with the reason.
pub fn list_song_directories(base: &Path, reporter: &impl Reporter) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(base).map_err(|e| ConvertError::io(base, e))?;

    let mut songs = Vec::new();
    for path in entries.filter_map(|e| e.ok()).map(|e| e.path()) {
        if !path.is_dir() {
            continue;
        }
        match check_song_directory(&path) {
            Ok(_) => songs.push(path),
            Err(e) => reporter.emit(Level::Debug, &format!("skipping {}: {}", path.display(), e)),
        }
    }
    Ok(songs)
}
