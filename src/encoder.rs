/*!
 * External video encoder used to burn overlay scripts into video.
 *
 * The encoder is a collaborator behind the [`VideoEncoder`] trait: it takes a
 * source video, an overlay script and an output path, and reports an exit
 * status plus the tail of its diagnostic stream. The ffmpeg implementation
 * lives here; tests substitute their own.
 */

use std::collections::VecDeque;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

use crate::app_config::EncoderConfig;
use crate::errors::EncoderError;

/// Number of diagnostic lines kept from the encoder's stderr
const DIAGNOSTIC_TAIL: usize = 40;

/// Everything the encoder needs for one render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurnJob {
    pub video: PathBuf,
    pub overlay: PathBuf,
    pub output: PathBuf,
    /// Render only the configured preview length
    pub preview: bool,
}

/// Result of a finished encoder run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOutcome {
    pub success: bool,
    pub exit_code: Option<i32>,
    /// Meaningful stderr lines, oldest first
    pub diagnostics: Vec<String>,
}

impl EncodeOutcome {
    pub fn diagnostics_text(&self) -> String {
        if self.diagnostics.is_empty() {
            "unknown encoder error (no diagnostics captured)".to_string()
        } else {
            self.diagnostics.join("\n")
        }
    }
}

/// Anything able to burn an overlay script into a video
#[async_trait]
pub trait VideoEncoder: Send + Sync + Debug {
    /// Run one render to completion.
    ///
    /// A render that runs but fails is reported through
    /// [`EncodeOutcome::success`]; errors are reserved for runs that could not
    /// be started or finished.
    async fn burn(&self, job: &BurnJob) -> Result<EncodeOutcome, EncoderError>;
}

/// ffmpeg-backed encoder
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    config: EncoderConfig,
}

impl FfmpegEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Command line arguments for `job`, without the program name
    pub fn build_args(&self, job: &BurnJob) -> Vec<String> {
        let c = &self.config;
        let mut args = vec![
            "-i".to_string(),
            job.video.to_string_lossy().to_string(),
            "-vf".to_string(),
            format!("ass={}", escape_filter_path(&job.overlay)),
            "-c:v".to_string(),
            c.video_codec.clone(),
            "-preset".to_string(),
            c.preset.clone(),
            "-crf".to_string(),
            c.crf.to_string(),
            "-c:a".to_string(),
            c.audio_codec.clone(),
        ];

        if c.faststart {
            args.push("-movflags".to_string());
            args.push("+faststart".to_string());
        }

        args.push("-threads".to_string());
        args.push(c.threads.clone());

        if job.preview {
            args.push("-t".to_string());
            args.push(c.preview_secs.to_string());
        }

        args.push("-y".to_string());
        args.push(job.output.to_string_lossy().to_string());
        args
    }

    fn spinner() -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    }

    /// Stream stderr until the process closes it, then wait for the exit status
    async fn drive(
        child: &mut Child,
        spinner: &ProgressBar,
        diagnostics: &mut VecDeque<String>,
    ) -> std::io::Result<ExitStatus> {
        if let Some(stderr) = child.stderr.take() {
            let mut reader = BufReader::new(stderr);
            let mut pending = Vec::new();

            // ffmpeg ends progress lines with '\r', so split on both terminators
            loop {
                let consumed = {
                    let available = reader.fill_buf().await?;
                    if available.is_empty() {
                        break;
                    }
                    for &byte in available {
                        if byte == b'\r' || byte == b'\n' {
                            record_line(&pending, spinner, diagnostics);
                            pending.clear();
                        } else {
                            pending.push(byte);
                        }
                    }
                    available.len()
                };
                reader.consume(consumed);
            }
            record_line(&pending, spinner, diagnostics);
        }

        child.wait().await
    }
}

#[async_trait]
impl VideoEncoder for FfmpegEncoder {
    async fn burn(&self, job: &BurnJob) -> Result<EncodeOutcome, EncoderError> {
        let args = self.build_args(job);
        debug!("Running {} {}", self.config.program, args.join(" "));

        let mut child = Command::new(&self.config.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EncoderError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;

        let spinner = Self::spinner();
        spinner.set_message(format!("Encoding {}", job.output.display()));
        let mut diagnostics = VecDeque::with_capacity(DIAGNOSTIC_TAIL);

        let status = match self.config.timeout_secs {
            Some(secs) => {
                let run = Self::drive(&mut child, &spinner, &mut diagnostics);
                let finished = tokio::time::timeout(Duration::from_secs(secs), run).await;
                match finished {
                    Ok(status) => status?,
                    Err(_) => {
                        let _ = child.kill().await;
                        spinner.abandon_with_message("Encoder timed out");
                        return Err(EncoderError::Timeout(secs));
                    }
                }
            }
            None => Self::drive(&mut child, &spinner, &mut diagnostics).await?,
        };

        spinner.finish_and_clear();
        info!("Encoder exited with {}", status);

        Ok(EncodeOutcome {
            success: status.success(),
            exit_code: status.code(),
            diagnostics: diagnostics.into_iter().collect(),
        })
    }
}

fn record_line(raw: &[u8], spinner: &ProgressBar, diagnostics: &mut VecDeque<String>) {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    if line.contains("frame=") {
        spinner.set_message(line.to_string());
        debug!("{}", line);
        return;
    }

    if is_banner_noise(line) {
        return;
    }

    if diagnostics.len() == DIAGNOSTIC_TAIL {
        diagnostics.pop_front();
    }
    diagnostics.push_back(line.to_string());
}

/// Version banner, build configuration and stream metadata lines
fn is_banner_noise(line: &str) -> bool {
    const NOISE_PREFIXES: [&str; 12] = [
        "ffmpeg version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Chapter",
        "Stream #",
        "Output #",
        "Stream mapping:",
        "Press [q]",
    ];
    NOISE_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

/// Escape a path for use as a filter option value (`ass=<path>`).
///
/// Inside a filtergraph `:` separates options and `,;[]'` are structural,
/// so each of them is backslash-escaped.
pub fn escape_filter_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let raw = if cfg!(windows) {
        raw.replace('\\', "/")
    } else {
        raw.replace('\\', "\\\\")
    };

    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, ':' | '\'' | ',' | ';' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
