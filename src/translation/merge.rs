/*!
 * Sentence merging.
 *
 * Rolling captions cut sentences at arbitrary points. Consecutive blocks are
 * glued back together while they follow each other closely, so the model sees
 * whole sentences. Each merged sentence remembers the contiguous run of blocks
 * it came from; translations are later split back over that run.
 */

use log::debug;
use std::ops::Range;

use crate::subtitle_processor::CaptionBlock;

/// Default largest silence between two blocks of one sentence
pub const DEFAULT_MERGE_GAP_MS: u64 = 200;

/// Default character count at which a sentence is closed
pub const DEFAULT_MERGE_MAX_CHARS: usize = 250;

/// A run of consecutive blocks translated as one unit
#[derive(Debug, Clone, PartialEq)]
pub struct MergedSentence {
    /// Trimmed origin texts of the run joined by single spaces
    pub text: String,
    /// Positions of the run in the block slice it was merged from
    pub blocks: Range<usize>,
}

impl MergedSentence {
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

/// Groups caption blocks into sentences
#[derive(Debug, Clone)]
pub struct SentenceMerger {
    gap_ms: u64,
    max_chars: usize,
}

impl Default for SentenceMerger {
    fn default() -> Self {
        Self::new(DEFAULT_MERGE_GAP_MS, DEFAULT_MERGE_MAX_CHARS)
    }
}

impl SentenceMerger {
    pub fn new(gap_ms: u64, max_chars: usize) -> Self {
        Self { gap_ms, max_chars }
    }

    /// Close the sentence after `current` when this returns true
    fn breaks_after(&self, current: &CaptionBlock, next: &CaptionBlock, run_chars: usize) -> bool {
        if run_chars >= self.max_chars {
            return true;
        }
        // Untimed blocks cannot be measured; keep them on their own
        match (current.times(), next.times()) {
            (Some((_, end)), Some((start, _))) => start.saturating_sub(end) > self.gap_ms,
            _ => true,
        }
    }

    /// Merge blocks into sentences covering every block exactly once, in order
    pub fn merge(&self, blocks: &[CaptionBlock]) -> Vec<MergedSentence> {
        let mut sentences = Vec::new();
        let mut run_start = 0;
        let mut run_chars = 0;

        for (i, block) in blocks.iter().enumerate() {
            run_chars += block.origin_text.chars().count();

            let last = i + 1 == blocks.len();
            if last || self.breaks_after(block, &blocks[i + 1], run_chars) {
                let text = blocks[run_start..=i]
                    .iter()
                    .map(|b| b.origin_text.trim())
                    .collect::<Vec<_>>()
                    .join(" ")
                    .trim()
                    .to_string();
                sentences.push(MergedSentence {
                    text,
                    blocks: run_start..i + 1,
                });
                run_start = i + 1;
                run_chars = 0;
            }
        }

        debug!("Merged {} blocks into {} sentences", blocks.len(), sentences.len());
        sentences
    }
}
