use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use songconv::audio::FfmpegTranscoder;
use songconv::reporter::LogReporter;
use songconv::{ConvertConfig, SongConverter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Convert a song pack into normalized simfile folders", long_about = None)]
struct Args {
    /// Song pack source directory
    input: PathBuf,

    /// Song pack destination directory
    output: PathBuf,

    /// Enable verbose console output
    #[arg(short)]
    verbose: bool,

    /// Force overwrite of existing audio files
    #[arg(short)]
    force: bool,

    /// Keep roll notes instead of turning them into holds
    #[arg(long)]
    keep_rolls: bool,

    /// Path to the ffmpeg executable (defaults to FFMPEG_PATH, then PATH)
    #[arg(long)]
    ffmpeg: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_default_env()
        .filter_level(level.parse().unwrap_or(log::LevelFilter::Warn))
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    if !args.input.is_dir() {
        log::error!("Input path is not a valid directory");
        return Ok(ExitCode::FAILURE);
    }

    let config = ConvertConfig {
        force_overwrite: args.force,
        rolls_to_holds: !args.keep_rolls,
    };
    let transcoder = match args.ffmpeg {
        Some(path) => FfmpegTranscoder::with_program(path),
        None => FfmpegTranscoder::new(),
    };

    let converter = SongConverter::new(config, transcoder, LogReporter);
    let summary = converter.convert_all(&args.input, &args.output)?;

    log::info!(
        "Converted {} songs, {} failed",
        summary.converted,
        summary.failed
    );

    Ok(ExitCode::SUCCESS)
}
