/*!
 * Linear time transformations over cue tracks.
 *
 * Both operations build a fresh track. A failing cue aborts the whole
 * operation, so callers never see a half-shifted result.
 */

use log::debug;

use crate::errors::SubtitleError;
use crate::subtitle_processor::{Cue, CueTrack};
use crate::timestamp::Offset;

/// Move every cue of `track` by `offset`
pub fn shift(track: &CueTrack, offset: Offset) -> Result<CueTrack, SubtitleError> {
    let cues = shift_cues(track.cues(), offset)?;
    debug!("Shifted {} cue(s) by {}s", cues.len(), offset);
    Ok(CueTrack::new(cues))
}

/// Append `second` after `first`, moving the second track's cues by `offset`.
///
/// The offset is normally the duration of the first episode and is supplied
/// by the caller. Cues are neither reordered nor checked for overlap.
pub fn combine(first: &CueTrack, second: &CueTrack, offset: Offset) -> Result<CueTrack, SubtitleError> {
    let mut cues = Vec::with_capacity(first.len() + second.len());
    cues.extend(first.iter().cloned());

    let shifted = shift_cues(second.cues(), offset).map_err(|e| match e {
        SubtitleError::Timing { cue, source } => SubtitleError::Timing {
            cue: cue + first.len(),
            source,
        },
        other => other,
    })?;
    cues.extend(shifted);

    debug!(
        "Combined {} + {} cue(s), second track offset {}s",
        first.len(),
        second.len(),
        offset
    );
    Ok(CueTrack::new(cues))
}

fn shift_cues(cues: &[Cue], offset: Offset) -> Result<Vec<Cue>, SubtitleError> {
    cues.iter()
        .enumerate()
        .map(|(index, cue)| {
            cue.shifted(offset).map_err(|source| SubtitleError::Timing {
                cue: index + 1,
                source,
            })
        })
        .collect()
}
