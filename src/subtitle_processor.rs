use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::errors::{SubtitleError, TimeError};
use crate::file_utils::FileManager;
use crate::timestamp::{Offset, Timestamp};

// @module: Cue model, WebVTT parsing and native formatting

// @const: Header token every native file starts with
pub const NATIVE_HEADER: &str = "WEBVTT";

// @const: Separator between the two timestamps of a timing line
const TIMING_ARROW: &str = "-->";

// @const: Blocks that carry no cue and are skipped by the parser
const METADATA_BLOCKS: [&str; 3] = ["NOTE", "STYLE", "REGION"];

// @struct: Single timed subtitle entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    // @field: Identifier line from the source, never re-emitted
    identifier: Option<String>,

    start: Timestamp,

    end: Timestamp,

    // @field: Text lines, verbatim
    lines: Vec<String>,
}

impl Cue {
    /// Create a cue, rejecting an end that comes before the start
    pub fn new(start: Timestamp, end: Timestamp, lines: Vec<String>) -> Result<Self, SubtitleError> {
        if end < start {
            return Err(SubtitleError::InvertedRange {
                start: start.format(),
                end: end.format(),
            });
        }

        Ok(Self {
            identifier: None,
            start,
            end,
            lines,
        })
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Text lines joined with newlines
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Copy of this cue moved along the timeline; text is untouched
    pub fn shifted(&self, offset: Offset) -> Result<Self, TimeError> {
        Ok(Self {
            identifier: self.identifier.clone(),
            start: self.start.add(offset)?,
            end: self.end.add(offset)?,
            lines: self.lines.clone(),
        })
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{} {} {}", self.start, TIMING_ARROW, self.end)?;
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        writeln!(f)
    }
}

/// Ordered cues of one media item, in display order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueTrack {
    cues: Vec<Cue>,
}

/// Parser position inside the block grammar
enum ParserState {
    /// Nothing but blank lines seen so far
    ExpectHeader,
    /// Inside the header block, until the first blank line
    InHeader,
    /// Between blocks
    ExpectBlock,
    /// Identifier consumed, the timing line must follow
    ExpectTiming { identifier: String },
    /// Timing consumed, collecting text lines until a blank line
    ExpectText(Cue),
    /// Inside a NOTE/STYLE/REGION block
    SkipBlock,
}

impl CueTrack {
    pub fn new(cues: Vec<Cue>) -> Self {
        Self { cues }
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cue> {
        self.cues.iter()
    }

    /// Parse WebVTT text into a track.
    ///
    /// The grammar is `header blank+ (block blank+)*` where a block is either
    /// a NOTE/STYLE/REGION block (skipped) or `identifier? timing text*`.
    /// The first malformed block aborts the whole parse.
    pub fn parse(content: &str) -> Result<Self, SubtitleError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let mut cues = Vec::new();
        let mut state = ParserState::ExpectHeader;
        let mut block = 0;
        let mut skipped_blocks = 0;

        for (index, line) in content.lines().enumerate() {
            let line_no = index + 1;
            let blank = line.trim().is_empty();

            state = match state {
                ParserState::ExpectHeader if blank => ParserState::ExpectHeader,
                ParserState::ExpectHeader => {
                    if !is_header_line(line) {
                        return Err(parse_error(0, line_no, "missing WEBVTT header"));
                    }
                    ParserState::InHeader
                }
                ParserState::InHeader if blank => ParserState::ExpectBlock,
                ParserState::InHeader => ParserState::InHeader,
                ParserState::ExpectBlock if blank => ParserState::ExpectBlock,
                ParserState::ExpectBlock => {
                    block += 1;
                    if is_metadata_line(line) {
                        skipped_blocks += 1;
                        ParserState::SkipBlock
                    } else if line.contains(TIMING_ARROW) {
                        ParserState::ExpectText(parse_timing_line(line, block, line_no)?)
                    } else {
                        ParserState::ExpectTiming {
                            identifier: line.to_string(),
                        }
                    }
                }
                ParserState::ExpectTiming { identifier } => {
                    if blank || !line.contains(TIMING_ARROW) {
                        return Err(parse_error(block, line_no, "missing '-->' timing line"));
                    }
                    let cue = parse_timing_line(line, block, line_no)?.with_identifier(identifier);
                    ParserState::ExpectText(cue)
                }
                // Only an empty line ends a cue, whitespace-only lines are text
                ParserState::ExpectText(cue) if line.is_empty() => {
                    cues.push(cue);
                    ParserState::ExpectBlock
                }
                ParserState::ExpectText(mut cue) => {
                    cue.lines.push(line.to_string());
                    ParserState::ExpectText(cue)
                }
                ParserState::SkipBlock if blank => ParserState::ExpectBlock,
                ParserState::SkipBlock => ParserState::SkipBlock,
            };
        }

        match state {
            ParserState::ExpectHeader => {
                return Err(parse_error(0, 1, "missing WEBVTT header"));
            }
            ParserState::ExpectTiming { .. } => {
                let last_line = content.lines().count();
                return Err(parse_error(block, last_line, "missing '-->' timing line"));
            }
            ParserState::ExpectText(cue) => cues.push(cue),
            _ => {}
        }

        if skipped_blocks > 0 {
            debug!("Skipped {} NOTE/STYLE/REGION block(s)", skipped_blocks);
        }
        if cues.is_empty() {
            warn!("No cues found in subtitle content");
        }

        Ok(Self { cues })
    }

    /// Read and parse a subtitle file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = FileManager::read_to_string(path)?;
        let track = Self::parse(&content)
            .with_context(|| format!("Failed to parse subtitle file: {}", path.display()))?;

        debug!("Parsed {} cue(s) from {}", track.len(), path.display());
        Ok(track)
    }

    /// Render in the native round-trip format
    pub fn to_vtt_string(&self) -> String {
        self.to_string()
    }

    /// Write the native format atomically; on error no file is left behind
    pub fn write_to_vtt<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        FileManager::write_atomic(path, &self.to_vtt_string())
    }
}

impl fmt::Display for CueTrack {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", NATIVE_HEADER)?;
        writeln!(f)?;
        for cue in &self.cues {
            write!(f, "{}", cue)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a CueTrack {
    type Item = &'a Cue;
    type IntoIter = std::slice::Iter<'a, Cue>;

    fn into_iter(self) -> Self::IntoIter {
        self.cues.iter()
    }
}

impl FromIterator<Cue> for CueTrack {
    fn from_iter<I: IntoIterator<Item = Cue>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn parse_error(block: usize, line: usize, reason: impl Into<String>) -> SubtitleError {
    SubtitleError::Parse {
        block,
        line,
        reason: reason.into(),
    }
}

fn is_header_line(line: &str) -> bool {
    line.strip_prefix(NATIVE_HEADER)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '\t']))
}

fn is_metadata_line(line: &str) -> bool {
    METADATA_BLOCKS.iter().any(|keyword| {
        line.strip_prefix(keyword)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '\t']))
    })
}

/// Parse `<start> --> <end>[ settings]` into an empty cue
fn parse_timing_line(line: &str, block: usize, line_no: usize) -> Result<Cue, SubtitleError> {
    let (left, right) = line
        .split_once(TIMING_ARROW)
        .ok_or_else(|| parse_error(block, line_no, "missing '-->' timing line"))?;

    let mut right_tokens = right.split_whitespace();
    let end_text = right_tokens
        .next()
        .ok_or_else(|| parse_error(block, line_no, "missing end timestamp"))?;

    let settings: Vec<&str> = right_tokens.collect();
    if !settings.is_empty() {
        debug!("Dropping cue settings in block {}: {}", block, settings.join(" "));
    }

    let start = Timestamp::parse(left.trim()).map_err(|e| parse_error(block, line_no, e.to_string()))?;
    let end = Timestamp::parse(end_text).map_err(|e| parse_error(block, line_no, e.to_string()))?;

    Cue::new(start, end, Vec::new()).map_err(|e| parse_error(block, line_no, e.to_string()))
}
