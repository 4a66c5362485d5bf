use anyhow::{anyhow, Context, Result};
use log::{debug, error, info, warn};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::app_config::Config;
use crate::encoder::{BurnJob, FfmpegEncoder, VideoEncoder};
use crate::errors::EncoderError;
use crate::file_utils::{FileManager, FileType};
use crate::overlay;
use crate::subtitle_processor::CueTrack;
use crate::timestamp::Offset;
use crate::transform;

// @module: Application controller for subtitle timing and burning

/// Main application controller.
///
/// Each operation reads its inputs completely, transforms in memory and only
/// then writes, so a failure never leaves a half-written output behind.
#[derive(Debug)]
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Collaborator that renders videos
    encoder: Arc<dyn VideoEncoder>,
}

impl Controller {
    // @method: Create a new controller backed by ffmpeg
    pub fn with_config(config: Config) -> Result<Self> {
        let encoder = Arc::new(FfmpegEncoder::new(config.encoder.clone()));
        Self::with_encoder(config, encoder)
    }

    // @method: Create a controller with an explicit encoder
    pub fn with_encoder(config: Config, encoder: Arc<dyn VideoEncoder>) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config, encoder })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shift every cue of `input` by `offset` and write the result to `output`
    pub fn shift_file(&self, input: &Path, output: &Path, offset: Offset) -> Result<()> {
        info!("Shifting {:?} by {}s", input, offset);

        let track = CueTrack::from_file(input)?;
        let shifted = transform::shift(&track, offset)
            .with_context(|| format!("Failed to shift subtitles from {:?}", input))?;
        shifted.write_to_vtt(output)?;

        info!("Created adjusted subtitle file: {:?} ({} cues)", output, shifted.len());
        Ok(())
    }

    /// Append `second` after `first`, offsetting the second file by `offset`
    pub fn combine_files(&self, first: &Path, second: &Path, output: &Path, offset: Offset) -> Result<()> {
        info!("Combining {:?} and {:?} (second offset {}s)", first, second, offset);

        let first_track = CueTrack::from_file(first)?;
        let second_track = CueTrack::from_file(second)?;

        if let (Some(last), Some(next)) = (first_track.cues().last(), second_track.cues().first()) {
            if let Ok(next_start) = next.start().add(offset) {
                if next_start < last.end() {
                    warn!(
                        "Second track starts at {} before the first track ends at {}, cues will overlap",
                        next_start, last.end()
                    );
                }
            }
        }

        let combined = transform::combine(&first_track, &second_track, offset)
            .with_context(|| format!("Failed to combine {:?} and {:?}", first, second))?;
        combined.write_to_vtt(output)?;

        info!("Created combined subtitle file: {:?} ({} cues)", output, combined.len());
        Ok(())
    }

    /// Convert `input` into an overlay script
    pub fn convert_file(&self, input: &Path, output: &Path, offset: Offset) -> Result<()> {
        info!("Converting {:?} to overlay format", input);
        if !offset.is_zero() {
            info!("Applying time offset of {} seconds", offset);
        }

        let track = CueTrack::from_file(input)?;
        let document = overlay::to_overlay(&track, offset, &self.config.overlay)
            .with_context(|| format!("Failed to convert {:?}", input))?;
        document.write_to_file(output)?;

        info!("Created overlay script: {:?} ({} events)", output, document.events.len());
        Ok(())
    }

    /// Burn `subtitle` into `video`, returning the path actually written.
    ///
    /// In preview mode only the configured preview length is rendered, into
    /// a `_debug` sibling of `output`.
    pub async fn burn(
        &self,
        video: &Path,
        subtitle: &Path,
        output: &Path,
        offset: Offset,
        preview: bool,
    ) -> Result<PathBuf> {
        let start_time = Instant::now();

        info!("Processing video: {:?}", video);
        info!("With subtitles: {:?}", subtitle);

        if !FileManager::file_exists(video) {
            return Err(anyhow!("Video file does not exist: {:?}", video));
        }
        match FileManager::detect_file_type(video)? {
            FileType::Video => {}
            other => warn!("{:?} does not look like a video ({:?}), passing it to the encoder anyway", video, other),
        }

        let track = CueTrack::from_file(subtitle)?;
        if !offset.is_zero() {
            info!("Applying time offset of {} seconds", offset);
        }
        let document = overlay::to_overlay(&track, offset, &self.config.overlay)
            .with_context(|| format!("Failed to convert {:?}", subtitle))?;

        let output = if preview {
            info!("Preview mode: rendering the first {} seconds only", self.config.encoder.preview_secs);
            FileManager::preview_output_path(output)
        } else {
            output.to_path_buf()
        };
        info!("Output to: {:?}", output);

        if let Some(parent) = output.parent() {
            FileManager::ensure_dir(parent)?;
        }

        // Removed when dropped, on success and on every error path
        let mut overlay_file = tempfile::Builder::new()
            .prefix("subburn_")
            .suffix(".ass")
            .tempfile()
            .context("Failed to create temporary overlay script")?;
        overlay_file
            .write_all(document.to_string().as_bytes())
            .context("Failed to write temporary overlay script")?;
        overlay_file.flush().context("Failed to write temporary overlay script")?;
        debug!("Overlay script written to {:?}", overlay_file.path());

        let job = BurnJob {
            video: video.to_path_buf(),
            overlay: overlay_file.path().to_path_buf(),
            output: output.clone(),
            preview,
        };

        // An output that predates this run is only removed once the encoder has rewritten it
        let previous_output = OutputStamp::of(&output);

        let outcome = match self.encoder.burn(&job).await {
            Ok(outcome) => outcome,
            Err(e) => {
                Self::discard_partial_output(&output, previous_output.as_ref());
                return Err(e).with_context(|| format!("Error processing {:?}", video));
            }
        };

        if !outcome.success {
            Self::discard_partial_output(&output, previous_output.as_ref());
            let failure = EncoderError::Failed {
                exit_code: outcome.exit_code,
                diagnostics: outcome.diagnostics_text(),
            };
            return Err(failure).with_context(|| format!("Error processing {:?}", video));
        }

        info!(
            "Successfully processed: {:?} in {:.1}s",
            output,
            start_time.elapsed().as_secs_f64()
        );
        Ok(output)
    }

    fn discard_partial_output(output: &Path, previous: Option<&OutputStamp>) {
        if let Some(previous) = previous {
            if OutputStamp::of(output).as_ref() == Some(previous) {
                debug!("Encoder did not touch existing output {:?}, keeping it", output);
                return;
            }
        }

        match FileManager::remove_if_exists(output) {
            Ok(true) => warn!("Removed incomplete output {:?}", output),
            Ok(false) => {}
            Err(e) => error!("Could not remove incomplete output {:?}: {}", output, e),
        }
    }
}

// @struct: Size and modification time of an output file
#[derive(Debug, PartialEq, Eq)]
struct OutputStamp {
    len: u64,
    modified: Option<SystemTime>,
}

impl OutputStamp {
    fn of(path: &Path) -> Option<Self> {
        let metadata = fs::metadata(path).ok()?;
        Some(Self {
            len: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }
}
