/*!
 * Conversion of cue tracks into styled overlay scripts (ASS).
 *
 * The produced script is the file handed to the encoder for burning. It uses
 * a single named style and centisecond timestamps.
 */

use std::fmt;
use std::path::Path;

use anyhow::Result;
use log::debug;

use crate::app_config::OverlayStyle;
use crate::errors::SubtitleError;
use crate::file_utils::FileManager;
use crate::subtitle_processor::CueTrack;
use crate::timestamp::{Offset, Timestamp};
use crate::transform;

/// Line break marker inside a dialogue line
pub const BREAK_MARKER: &str = "\\N";

const STYLE_FORMAT: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";

const EVENT_FORMAT: &str = "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

/// One dialogue line of the overlay script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayEvent {
    pub start: Timestamp,
    pub end: Timestamp,
    /// Single physical line, breaks already replaced by [`BREAK_MARKER`]
    pub text: String,
}

/// A complete overlay script ready to be written
#[derive(Debug, Clone)]
pub struct OverlayDocument {
    pub style: OverlayStyle,
    pub events: Vec<OverlayEvent>,
}

impl OverlayDocument {
    /// Write the script atomically
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        FileManager::write_atomic(path, &self.to_string())
    }

    fn write_header(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = &self.style;

        writeln!(f, "[Script Info]")?;
        writeln!(f, "ScriptType: v4.00+")?;
        writeln!(f, "PlayResX: {}", s.play_res_x)?;
        writeln!(f, "PlayResY: {}", s.play_res_y)?;
        writeln!(f, "WrapStyle: {}", s.wrap_style)?;
        writeln!(f)?;

        writeln!(f, "[V4+ Styles]")?;
        writeln!(f, "{}", STYLE_FORMAT)?;
        writeln!(
            f,
            "Style: {},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            s.name,
            s.font_name,
            s.font_size,
            s.primary_colour,
            s.secondary_colour,
            s.outline_colour,
            s.back_colour,
            flag(s.bold),
            flag(s.italic),
            flag(s.underline),
            flag(s.strike_out),
            s.scale_x,
            s.scale_y,
            s.spacing,
            s.angle,
            s.border_style,
            s.outline,
            s.shadow,
            s.alignment,
            s.margin_l,
            s.margin_r,
            s.margin_v,
            s.encoding
        )?;
        writeln!(f)?;

        writeln!(f, "[Events]")?;
        writeln!(f, "{}", EVENT_FORMAT)
    }
}

impl fmt::Display for OverlayDocument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.write_header(f)?;
        for event in &self.events {
            writeln!(
                f,
                "Dialogue: 0,{},{},{},,0,0,0,,{}",
                event.start.format_short_hours(),
                event.end.format_short_hours(),
                self.style.name,
                event.text
            )?;
        }
        Ok(())
    }
}

/// Shift `track` by `offset` and map it onto overlay dialogue lines
pub fn to_overlay(track: &CueTrack, offset: Offset, style: &OverlayStyle) -> Result<OverlayDocument, SubtitleError> {
    let shifted;
    let source = if offset.is_zero() {
        track
    } else {
        shifted = transform::shift(track, offset)?;
        &shifted
    };

    let events = source
        .iter()
        .map(|cue| OverlayEvent {
            start: cue.start(),
            end: cue.end(),
            text: cue.lines().join(BREAK_MARKER),
        })
        .collect::<Vec<_>>();

    debug!("Converted {} cue(s) to overlay style '{}'", events.len(), style.name);

    Ok(OverlayDocument {
        style: style.clone(),
        events,
    })
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}
