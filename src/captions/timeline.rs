/*!
 * Caption timeline reconstruction for rolling auto-caption tracks.
 *
 * A rolling track shows a line growing word by word across several cues,
 * then once more as a settled single line, and often repeats that settled
 * line at the top of the next cue. Each distinct settled line is turned into
 * exactly one caption with the interval it was really on screen:
 *
 * - start: the first earlier cue whose text matches it (fuzzy)
 * - end: the start of the first later settled render of the same line
 *
 * Duplicates keep their longest interval, then overlaps are clamped.
 */

use log::debug;
use std::collections::HashMap;

use crate::captions::vtt::Cue;
use crate::subtitle_processor::{renumber, CaptionBlock};

/// Default gap left between a clamped caption and its successor
pub const DEFAULT_OVERLAP_PADDING_MS: u64 = 50;

/// Fuzzy line match used to find where a settled line started rolling in
///
/// Either text containing the other matches, as do texts of three or more
/// words whose first three words agree ignoring case. Empty text never matches.
pub fn is_text_match(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a.contains(b) || b.contains(a) {
        return true;
    }

    let a_lower = a.to_lowercase();
    let b_lower = b.to_lowercase();
    let words_a: Vec<&str> = a_lower.split_whitespace().collect();
    let words_b: Vec<&str> = b_lower.split_whitespace().collect();

    words_a.len() > 2 && words_b.len() > 2 && words_a[..3] == words_b[..3]
}

#[derive(Debug, Clone)]
struct Interval {
    text: String,
    start_ms: u64,
    end_ms: u64,
}

impl Interval {
    fn duration(&self) -> i64 {
        self.end_ms as i64 - self.start_ms as i64
    }
}

/// Rebuilds clean caption blocks from parsed cues
#[derive(Debug, Clone)]
pub struct TimelineReconstructor {
    overlap_padding_ms: u64,
}

impl Default for TimelineReconstructor {
    fn default() -> Self {
        Self::new(DEFAULT_OVERLAP_PADDING_MS)
    }
}

impl TimelineReconstructor {
    pub fn new(overlap_padding_ms: u64) -> Self {
        Self { overlap_padding_ms }
    }

    /// Turn cues into a deduplicated, sorted, non-overlapping block sequence
    pub fn reconstruct(&self, cues: &[Cue]) -> Vec<CaptionBlock> {
        let mut intervals: Vec<Interval> = Vec::new();
        let mut by_text: HashMap<String, usize> = HashMap::new();

        for (position, candidate) in cues.iter().enumerate().filter(|(_, c)| c.is_settled()) {
            let interval = self.locate(cues, position, candidate);

            // Keep the longest interval per text; first seen wins ties
            match by_text.get(&interval.text) {
                Some(&slot) => {
                    if interval.duration() > intervals[slot].duration() {
                        intervals[slot] = interval;
                    }
                }
                None => {
                    by_text.insert(interval.text.clone(), intervals.len());
                    intervals.push(interval);
                }
            }
        }

        intervals.sort_by_key(|i| i.start_ms);

        let mut blocks: Vec<CaptionBlock> = intervals.into_iter()
            .map(|i| CaptionBlock::new(0, i.start_ms, i.end_ms, i.text))
            .collect();
        resolve_overlaps(&mut blocks, self.overlap_padding_ms);
        renumber(&mut blocks);

        debug!("Reconstructed {} captions from {} cues", blocks.len(), cues.len());
        blocks
    }

    fn locate(&self, cues: &[Cue], position: usize, candidate: &Cue) -> Interval {
        let text = candidate.clean_text();

        let start_ms = cues[..position].iter().rev()
            .find(|earlier| is_text_match(&text, &earlier.clean_text()))
            .map_or(candidate.start_ms, |earlier| earlier.start_ms);

        let end_ms = cues[position + 1..].iter()
            .find(|later| !later.has_word_timing && later.clean_lines.first() == Some(&text))
            .map_or(candidate.end_ms, |later| later.start_ms);

        Interval {
            start_ms,
            end_ms: end_ms.max(start_ms),
            text,
        }
    }
}

/// Clamp each block's end to `padding_ms` before the next block's start
///
/// Blocks must already be sorted by start. A clamp may shrink a block down to
/// zero length but never inverts it; such a pair is left overlapping.
pub fn resolve_overlaps(blocks: &mut [CaptionBlock], padding_ms: u64) {
    for i in 0..blocks.len().saturating_sub(1) {
        let next_start = blocks[i + 1].start_ms;
        if blocks[i].end_ms > next_start {
            if let Some(adjusted) = next_start.checked_sub(padding_ms) {
                if adjusted >= blocks[i].start_ms {
                    blocks[i].end_ms = adjusted;
                }
            }
        }
    }
}
