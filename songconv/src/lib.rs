pub mod artwork;
pub mod audio;
pub mod beat;
pub mod discovery;
pub mod error;
pub mod notes;
pub mod report;
pub mod reporter;
pub mod simfile;

use audio::Transcoder;
use error::{ConvertError, Result};
use report::{BatchSummary, SongReport, StepOutcome};
use reporter::Reporter;
use simfile::SimfileDocument;
use std::path::{Path, PathBuf};

/// File names of the four assets of a song.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongFiles {
    pub simfile: String,
    pub music: String,
    pub background: String,
    pub banner: String,
}

impl SongFiles {
    /// Fixed names every converted song is written with.
    pub fn canonical() -> Self {
        SongFiles {
            simfile: "steps.sm".to_string(),
            music: "audio.ogg".to_string(),
            background: "bg.png".to_string(),
            banner: "bn.png".to_string(),
        }
    }

    /// Names as found in a song: the chart's own file name plus the
    /// references it declares.
    pub fn from_document(chart_path: &Path, document: &SimfileDocument) -> Self {
        let declared = |value: Option<&str>| value.map(str::trim).unwrap_or_default().to_string();
        SongFiles {
            simfile: chart_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            music: declared(document.music()),
            background: declared(document.background()),
            banner: declared(document.banner()),
        }
    }

    /// Resolve every name against `dir`. Absolute names stay as they are.
    pub fn resolve(&self, dir: &Path) -> SongPaths {
        let join = |name: &str| (!name.is_empty()).then(|| dir.join(name));
        SongPaths {
            simfile: dir.join(&self.simfile),
            music: join(&self.music),
            background: join(&self.background),
            banner: join(&self.banner),
        }
    }
}

/// Absolute locations of a song's assets. Missing references are `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongPaths {
    pub simfile: PathBuf,
    pub music: Option<PathBuf>,
    pub background: Option<PathBuf>,
    pub banner: Option<PathBuf>,
}

/// Conversion options
#[derive(Clone, Debug)]
pub struct ConvertConfig {
    /// Re-encode audio even if the output track exists.
    pub force_overwrite: bool,
    pub rolls_to_holds: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        ConvertConfig {
            force_overwrite: false,
            rolls_to_holds: true,
        }
    }
}

/// Converts song directories one after another.
pub struct SongConverter<T, R> {
    config: ConvertConfig,
    transcoder: T,
    reporter: R,
}

impl<T: Transcoder, R: Reporter> SongConverter<T, R> {
    pub fn new(config: ConvertConfig, transcoder: T, reporter: R) -> Self {
        SongConverter {
            config,
            transcoder,
            reporter,
        }
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    pub fn transcoder(&self) -> &T {
        &self.transcoder
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Convert every valid song under `input_dir` into `output_dir`.
    pub fn convert_all(&self, input_dir: &Path, output_dir: &Path) -> Result<BatchSummary> {
        if !output_dir.is_dir() {
            self.reporter
                .info("Output directory does not exist, attempting to create it");
            std::fs::create_dir_all(output_dir).map_err(|e| ConvertError::io(output_dir, e))?;
        }

        let mut summary = BatchSummary::default();
        for song_dir in discovery::list_song_directories(input_dir, &self.reporter)? {
            let Some(name) = song_dir.file_name() else {
                continue;
            };
            self.reporter
                .progress(&format!("Converting song {}...", name.to_string_lossy()));

            let report = self.convert_song(&song_dir, &output_dir.join(name));
            if !report.is_success() {
                self.reporter
                    .error(&format!("Song \"{}\" was not converted", song_dir.display()));
            }
            summary.record(&report);
        }

        Ok(summary)
    }

    /// Convert one song directory.
    ///
    /// The chart is always rewritten. Audio is skipped when the output exists
    /// unless forced. Banner and background are always regenerated and their
    /// failures never affect the song's status.
    pub fn convert_song(&self, in_dir: &Path, out_dir: &Path) -> SongReport {
        let mut report = SongReport::default();

        if out_dir.is_dir() {
            self.reporter.info(&format!(
                "song output directory \"{}\" already exists",
                out_dir.display()
            ));
        } else if let Err(e) = std::fs::create_dir_all(out_dir) {
            let e = ConvertError::io(out_dir, e);
            self.reporter.error(&format!("Failed to create output directory: {}", e));
            report.chart = StepOutcome::Failed(e);
            return report;
        }

        let out_files = SongFiles::canonical();

        let (document, in_paths) = match self.load_song(in_dir) {
            Ok(loaded) => loaded,
            Err(e) => {
                self.reporter.error(&format!(
                    "Failed to read simfile in \"{}\": {}",
                    in_dir.display(),
                    e
                ));
                report.chart = StepOutcome::Failed(e);
                return report;
            }
        };

        let out_chart = out_dir.join(&out_files.simfile);
        if let Err(e) = self.convert_simfile(document, &out_files, &out_chart) {
            self.reporter.error(&format!(
                "Failed to convert simfile \"{}\": {}",
                in_paths.simfile.display(),
                e
            ));
            report.chart = StepOutcome::Failed(e);
            return report;
        }
        report.chart = StepOutcome::Converted;

        let out_music = out_dir.join(&out_files.music);
        report.audio = self.convert_audio(in_paths.music.as_deref(), &out_music);
        if report.audio.is_failed() {
            return report;
        }

        report.banner = self.convert_artwork(
            "banner",
            in_paths.banner.as_deref(),
            &out_dir.join(&out_files.banner),
            artwork::convert_banner,
        );
        report.background = self.convert_artwork(
            "background",
            in_paths.background.as_deref(),
            &out_dir.join(&out_files.background),
            artwork::convert_background,
        );

        report
    }

    fn load_song(&self, in_dir: &Path) -> Result<(SimfileDocument, SongPaths)> {
        let chart_path = discovery::find_chart_file(in_dir)
            .ok_or_else(|| ConvertError::NoChart(in_dir.to_path_buf()))?;
        let document = SimfileDocument::open(&chart_path)?;
        let paths = SongFiles::from_document(&chart_path, &document).resolve(in_dir);
        Ok((document, paths))
    }

    fn convert_simfile(
        &self,
        mut document: SimfileDocument,
        out_files: &SongFiles,
        out_path: &Path,
    ) -> Result<()> {
        if self.config.rolls_to_holds {
            document.rewrite_rolls_to_holds()?;
        }
        document.apply_asset_references(out_files);
        let text = document.serialize();

        self.note_existing(out_path);
        std::fs::write(out_path, text).map_err(|e| ConvertError::io(out_path, e))
    }

    fn convert_audio(&self, input: Option<&Path>, output: &Path) -> StepOutcome {
        if !self.config.force_overwrite && output.exists() {
            self.reporter.warn(&format!(
                "Output file \"{}\" already exists, skipping",
                output.display()
            ));
            return StepOutcome::Skipped;
        }

        let result = match input {
            Some(input) => {
                let name = input.file_name().unwrap_or(input.as_os_str());
                self.reporter
                    .info(&format!("Converting audio file \"{}\"...", name.to_string_lossy()));
                self.transcoder.transcode(input, output)
            }
            None => Err(ConvertError::MissingAsset { role: "music" }),
        };

        match result {
            Ok(()) => StepOutcome::Converted,
            Err(e) => {
                let shown = input.map(|p| p.display().to_string()).unwrap_or_default();
                self.reporter
                    .error(&format!("Failed to convert audio file \"{}\": {}", shown, e));
                StepOutcome::Failed(e)
            }
        }
    }

    fn convert_artwork(
        &self,
        role: &'static str,
        input: Option<&Path>,
        output: &Path,
        convert: fn(&Path, &Path) -> Result<()>,
    ) -> StepOutcome {
        self.note_existing(output);

        let result = match input {
            Some(input) => convert(input, output),
            None => Err(ConvertError::MissingAsset { role }),
        };

        match result {
            Ok(()) => StepOutcome::Converted,
            Err(e) => {
                self.reporter
                    .error(&format!("Failed to convert {} image: {}", role, e));
                StepOutcome::Failed(e)
            }
        }
    }

    fn note_existing(&self, path: &Path) {
        if path.exists() {
            self.reporter
                .info(&format!("Output file \"{}\" already exists", path.display()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_config_default() {
        let config = ConvertConfig::default();
        assert!(!config.force_overwrite);
        assert!(config.rolls_to_holds);
    }

    #[test]
    fn test_song_files_resolve() {
        let document =
            SimfileDocument::parse("#MUSIC:song.mp3;\n#BANNER: bn.jpg ;\n#BACKGROUND:;\n").unwrap();
        let files = SongFiles::from_document(Path::new("/in/Song/song.sm"), &document);
        assert_eq!(files.simfile, "song.sm");
        assert_eq!(files.banner, "bn.jpg");

        let paths = files.resolve(Path::new("/in/Song"));
        assert_eq!(paths.simfile, PathBuf::from("/in/Song/song.sm"));
        assert_eq!(paths.music, Some(PathBuf::from("/in/Song/song.mp3")));
        assert_eq!(paths.banner, Some(PathBuf::from("/in/Song/bn.jpg")));
        assert_eq!(paths.background, None);
    }

    #[test]
    fn test_canonical_names() {
        let paths = SongFiles::canonical().resolve(Path::new("out"));
        assert_eq!(paths.simfile, PathBuf::from("out/steps.sm"));
        assert_eq!(paths.music, Some(PathBuf::from("out/audio.ogg")));
        assert_eq!(paths.background, Some(PathBuf::from("out/bg.png")));
        assert_eq!(paths.banner, Some(PathBuf::from("out/bn.png")));
    }
}
