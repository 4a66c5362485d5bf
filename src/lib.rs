/*!
 * # subburn - subtitle timing and burning
 *
 * A Rust library for adjusting WebVTT subtitle timings without precision loss
 * and burning subtitles into videos as styled overlays.
 *
 * ## Features
 *
 * - Parse WebVTT tracks into cues with exact millisecond timestamps
 * - Shift a whole track forwards or backwards
 * - Combine two episodes' tracks into one, offsetting the second
 * - Convert tracks into top-positioned ASS overlay scripts
 * - Burn overlays into videos through ffmpeg, with a short preview mode
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `timestamp`: Exact timestamps and signed offsets
 * - `subtitle_processor`: Cue model, WebVTT parsing and native formatting
 * - `transform`: Shift and combine operations
 * - `overlay`: Overlay script conversion and rendering
 * - `encoder`: External video encoder collaborator
 * - `app_config`: Configuration management
 * - `app_controller`: File-level operations used by the CLI
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod encoder;
pub mod errors;
pub mod file_utils;
pub mod overlay;
pub mod subtitle_processor;
pub mod timestamp;
pub mod transform;

// Re-export main types for easier usage
pub use app_config::{Config, EncoderConfig, OverlayStyle};
pub use encoder::{BurnJob, EncodeOutcome, FfmpegEncoder, VideoEncoder};
pub use errors::{AppError, EncoderError, SubtitleError, TimeError};
pub use overlay::{to_overlay, OverlayDocument, OverlayEvent};
pub use subtitle_processor::{Cue, CueTrack};
pub use timestamp::{Offset, Timestamp};
pub use transform::{combine, shift};
