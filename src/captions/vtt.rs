/*!
 * WebVTT cue parsing.
 *
 * Auto-generated tracks contain two kinds of cues: "rolling" renders whose
 * lines carry inline `<HH:MM:SS.mmm>` word markers, and settled renders with
 * a single clean line. Both are kept here; telling them apart is the job of
 * the timeline reconstructor.
 */

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::captions::timecode;
use crate::errors::CaptionError;

static CUE_TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}:\d{2}:\d{2}\.\d{3})\s-->\s(\d{2}:\d{2}:\d{2}\.\d{3})").unwrap()
});

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

static WORD_TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<\d{2}:\d{2}:\d{2}\.\d{3}>").unwrap()
});

/// One raw caption unit as it appears in the file
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    /// Position among the parsed cues
    pub position: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    /// Trimmed text lines with markup intact
    pub lines: Vec<String>,
    /// Lines with every tag removed; blank results are dropped
    pub clean_lines: Vec<String>,
    /// True when any raw line carries an inline word timestamp
    pub has_word_timing: bool,
}

impl Cue {
    /// Clean lines joined with single spaces
    pub fn clean_text(&self) -> String {
        self.clean_lines.join(" ")
    }

    /// A settled render: one clean line and no word markers
    pub fn is_settled(&self) -> bool {
        !self.has_word_timing && self.clean_lines.len() == 1
    }
}

/// Strip every angle-bracket tag from a line
pub fn strip_tags(line: &str) -> String {
    TAG_REGEX.replace_all(line, "").trim().to_string()
}

/// Parse VTT content into cues
///
/// Header and metadata lines are skipped. Cues whose timing cannot be read or
/// that have no text are dropped with a warning; this never fails.
pub fn parse_cues(content: &str) -> Vec<Cue> {
    let lines: Vec<&str> = content.lines().collect();
    let mut cues = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim();
        if line.is_empty() || line.starts_with("WEBVTT") || line.starts_with("Kind:") || line.starts_with("Language:") {
            i += 1;
            continue;
        }

        let Some(caps) = CUE_TIMING_REGEX.captures(line) else {
            // Cue identifiers, NOTE and STYLE blocks
            i += 1;
            continue;
        };
        let timing_line = i + 1;
        i += 1;

        let mut text_lines = Vec::new();
        while i < lines.len() && !lines[i].trim().is_empty() {
            text_lines.push(lines[i].trim().to_string());
            i += 1;
        }

        let times = timecode::parse_timecode(&caps[1])
            .and_then(|start| timecode::parse_timecode(&caps[2]).map(|end| (start, end)));
        let (start_ms, end_ms) = match times {
            Ok(times) => times,
            Err(e) => {
                let err = CaptionError::BlockParse { line: timing_line, reason: e.to_string() };
                warn!("Skipping cue: {}", err);
                continue;
            }
        };

        if text_lines.is_empty() {
            continue;
        }

        let clean_lines: Vec<String> = text_lines.iter()
            .map(|l| strip_tags(l))
            .filter(|l| !l.is_empty())
            .collect();
        let has_word_timing = text_lines.iter().any(|l| WORD_TIMING_REGEX.is_match(l));

        cues.push(Cue {
            position: cues.len(),
            start_ms,
            end_ms,
            lines: text_lines,
            clean_lines,
            has_word_timing,
        });
    }

    cues
}

/// Read and parse a VTT file; only I/O failures are errors
pub fn parse_cue_file(path: &Path) -> Result<Vec<Cue>, CaptionError> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_cues(&content))
}
