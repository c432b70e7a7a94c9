use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConvertError>;

/// Malformed chart text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error(".ssc simfiles are currently unsupported")]
    UnsupportedVariant,

    #[error("unexpected text outside of a property on line {line}")]
    StrayText { line: usize },

    #[error("#NOTES on line {line} has {found} fields, expected 6")]
    MalformedChart { line: usize, found: usize },

    #[error("note row {row:?} has {found} columns, expected {expected}")]
    RowWidth { row: String, found: usize, expected: usize },

    #[error("unknown note character '{0}'")]
    UnknownNote(char),

    #[error("bad keysound index in row {0:?}")]
    BadKeysound(String),
}

/// Everything that can go wrong while converting one song.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to parse chart: {0}")]
    Parse(#[from] ParseError),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no chart file found in {}", .0.display())]
    NoChart(PathBuf),

    #[error("chart does not declare a {role} file")]
    MissingAsset { role: &'static str },

    #[error("ffmpeg executable not found, install it or set FFMPEG_PATH")]
    TranscoderNotFound,

    #[error("FFMPEG_PATH points to missing file {}", .0.display())]
    FfmpegPathMissing(PathBuf),

    #[error("audio transcoder failed on \"{}\": {reason}", path.display())]
    Transcode { path: PathBuf, reason: String },

    #[error("image \"{}\": {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl ConvertError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }
}
