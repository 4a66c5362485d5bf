/*!
 * Tests for encoder command construction
 */

use std::path::{Path, PathBuf};

use subburn::encoder::escape_filter_path;
use subburn::{BurnJob, EncodeOutcome, EncoderConfig, FfmpegEncoder};

fn job(preview: bool) -> BurnJob {
    BurnJob {
        video: PathBuf::from("in.mp4"),
        overlay: PathBuf::from("/tmp/subs.ass"),
        output: PathBuf::from("out.mp4"),
        preview,
    }
}

/// Test the full argument list for a regular render
#[test]
fn test_buildArgs_withDefaults_shouldMatchExpectedCommand() {
    let encoder = FfmpegEncoder::new(EncoderConfig::default());
    let args = encoder.build_args(&job(false));

    assert_eq!(
        args,
        [
            "-i", "in.mp4", "-vf", "ass=/tmp/subs.ass", "-c:v", "libx264", "-preset", "veryfast",
            "-crf", "23", "-c:a", "copy", "-movflags", "+faststart", "-threads", "auto", "-y",
            "out.mp4",
        ]
    );
}

/// Test that preview renders are truncated to the configured length
#[test]
fn test_buildArgs_withPreview_shouldLimitDuration() {
    let config = EncoderConfig {
        preview_secs: 15,
        ..EncoderConfig::default()
    };
    let args = FfmpegEncoder::new(config).build_args(&job(true));

    let t = args.iter().position(|a| a == "-t").expect("-t present");
    assert_eq!(args[t + 1], "15");
    assert_eq!(args[args.len() - 2], "-y");
    assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
}

/// Test that disabled options are left out
#[test]
fn test_buildArgs_withoutFaststart_shouldOmitMovflags() {
    let config = EncoderConfig {
        faststart: false,
        crf: 18,
        ..EncoderConfig::default()
    };
    let args = FfmpegEncoder::new(config).build_args(&job(false));

    assert!(!args.iter().any(|a| a == "-movflags"));
    assert!(!args.iter().any(|a| a == "-t"));
    assert!(args.windows(2).any(|w| w[0] == "-crf" && w[1] == "18"));
}

/// Test escaping of filter option separators
#[test]
fn test_escapeFilterPath_withSpecialCharacters_shouldEscape() {
    assert_eq!(escape_filter_path(Path::new("/tmp/a.ass")), "/tmp/a.ass");
    assert_eq!(
        escape_filter_path(Path::new("/tmp/it's [v1], part;2:x.ass")),
        "/tmp/it\\'s \\[v1\\]\\, part\\;2\\:x.ass"
    );
}

/// Test the fallback when no diagnostics were captured
#[test]
fn test_diagnosticsText_shouldJoinOrFallBack() {
    let mut outcome = EncodeOutcome {
        success: false,
        exit_code: Some(1),
        diagnostics: Vec::new(),
    };
    assert!(outcome.diagnostics_text().contains("no diagnostics"));

    outcome.diagnostics = vec!["first".to_string(), "second".to_string()];
    assert_eq!(outcome.diagnostics_text(), "first\nsecond");
}
