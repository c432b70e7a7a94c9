use crate::error::{ConvertError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Output sample rate of converted audio.
pub const SAMPLE_RATE: u32 = 48_000;
/// Vorbis quality level passed to the encoder.
pub const VORBIS_QUALITY: u8 = 4;

/// Turns a song's audio file into the output track.
///
/// The produced track keeps the channel layout, is resampled to 48 kHz,
/// encoded as Vorbis and carries no metadata.
pub trait Transcoder {
    fn transcode(&self, input: &Path, output: &Path) -> Result<()>;
}

/// Transcoder backed by an external `ffmpeg` process.
///
/// Output can drift 40-50ms from the source because MP3 framing is not
/// compensated for.
#[derive(Clone, Debug, Default)]
pub struct FfmpegTranscoder {
    program: Option<PathBuf>,
}

impl FfmpegTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this executable instead of searching for one.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        FfmpegTranscoder {
            program: Some(program.into()),
        }
    }

    /// Find the ffmpeg executable: explicit path, then `FFMPEG_PATH`, then `PATH`.
    pub fn program(&self) -> Result<PathBuf> {
        locate(
            self.program.as_deref(),
            std::env::var_os("FFMPEG_PATH").map(PathBuf::from),
        )
    }

    pub fn args(input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        args.push("-i".into());
        args.push(input.into());
        for arg in ["-map_metadata", "-1", "-map", "0:a"] {
            args.push(arg.into());
        }
        args.push("-ar".into());
        args.push(SAMPLE_RATE.to_string().into());
        args.push("-c:a".into());
        args.push("libvorbis".into());
        args.push("-qscale:a".into());
        args.push(VORBIS_QUALITY.to_string().into());
        args.push("-y".into());
        args.push(output.into());
        args
    }
}

/// An `FFMPEG_PATH` that names a missing file is an error rather than a
/// reason to fall back to `PATH`.
fn locate(explicit: Option<&Path>, env_path: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(program) = explicit {
        return Ok(program.to_path_buf());
    }

    match env_path {
        Some(path) if path.exists() => Ok(path),
        Some(path) => Err(ConvertError::FfmpegPathMissing(path)),
        None => which::which("ffmpeg").map_err(|_| ConvertError::TranscoderNotFound),
    }
}

impl Transcoder for FfmpegTranscoder {
    fn transcode(&self, input: &Path, output: &Path) -> Result<()> {
        let program = self.program()?;

        let status = Command::new(&program)
            .args(Self::args(input, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| ConvertError::Transcode {
                path: input.to_path_buf(),
                reason: format!("failed to start {}: {}", program.display(), e),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ConvertError::Transcode {
                path: input.to_path_buf(),
                reason: format!("ffmpeg exited with {}", status),
            })
        }
    }
}
