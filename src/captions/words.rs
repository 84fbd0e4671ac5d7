/*!
 * Word timeline extraction.
 *
 * Rolling caption lines look like `so<00:00:01.200><c> we</c><00:00:01.500><c> went</c>`.
 * Each marker closes the fragment before it, so a line with N markers yields
 * N+1 fragments whose times chain from the cue start to the cue end.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::captions::timecode;
use crate::errors::CaptionError;

static CUE_TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^((?:\d{2}:)?\d{2}:\d{2}\.\d{3})\s-->\s((?:\d{2}:)?\d{2}:\d{2}\.\d{3})").unwrap()
});

static WORD_MARKER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<((?:\d{2}:)?\d{2}:\d{2}\.\d{3})>").unwrap()
});

static STYLE_TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?c>").unwrap());

/// One timed token
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub start_ms: u64,
    pub end_ms: u64,
    /// Ordinal in order of appearance, starting at 0
    pub num: usize,
}

/// Extract the word timeline from VTT content
pub fn extract_words(content: &str) -> Vec<Word> {
    let mut words = Vec::new();
    let mut cue_start = 0u64;
    let mut cue_end = 0u64;

    for line in content.lines() {
        if let Some(caps) = CUE_TIMING_REGEX.captures(line) {
            // A cue with unreadable timing keeps the previous cue's bounds
            if let (Ok(start), Ok(end)) = (timecode::parse_timecode(&caps[1]), timecode::parse_timecode(&caps[2])) {
                cue_start = start;
                cue_end = end;
            }
            continue;
        }

        if line.trim().is_empty() || line.starts_with("WEBVTT") || line.starts_with("Kind:") || line.starts_with("Language:") {
            continue;
        }

        // Lines without markers are settled renders, not timed content
        if !WORD_MARKER_REGEX.is_match(line) {
            continue;
        }

        let content = STYLE_TAG_REGEX.replace_all(line, "");
        let mut previous = cue_start;
        let markers: Vec<u64> = WORD_MARKER_REGEX.captures_iter(&content)
            .map(|caps| {
                // An unreadable marker collapses onto the previous boundary
                let time = timecode::parse_timecode(&caps[1]).unwrap_or(previous);
                previous = time;
                time
            })
            .collect();

        let mut last_time = cue_start;
        for (i, fragment) in WORD_MARKER_REGEX.split(&content).enumerate() {
            let end = markers.get(i).copied().unwrap_or(cue_end);
            let text = fragment.trim();
            if !text.is_empty() {
                words.push(Word {
                    text: text.to_string(),
                    start_ms: last_time,
                    end_ms: end,
                    num: words.len(),
                });
            }
            last_time = end;
        }
    }

    debug!("Extracted {} timed words", words.len());
    words
}

/// Read a VTT file and extract its word timeline
pub fn extract_words_from_file(path: &Path) -> Result<Vec<Word>, CaptionError> {
    let content = std::fs::read_to_string(path)?;
    Ok(extract_words(&content))
}
