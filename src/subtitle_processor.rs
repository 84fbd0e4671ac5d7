use std::fmt;
use std::fs;
use std::path::Path;
use anyhow::{Context, Result};
use log::{debug, warn};

use crate::captions::timecode;
use crate::errors::CaptionError;

// @module: Caption blocks and SRT reading/writing

// @struct: One finalized caption
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionBlock {
    // @field: 1-based sequence number
    pub index: usize,

    // @field: Start time in ms
    pub start_ms: u64,

    // @field: End time in ms
    pub end_ms: u64,

    // @field: Origin-language text
    pub origin_text: String,

    // @field: Target-language text, empty until translated
    pub target_text: String,

    // @field: Timestamp line kept verbatim when it could not be parsed
    pub raw_timing: Option<String>,
}

impl CaptionBlock {
    /// Creates a block with parsed times and no translation
    pub fn new(index: usize, start_ms: u64, end_ms: u64, origin_text: impl Into<String>) -> Self {
        CaptionBlock {
            index,
            start_ms,
            end_ms,
            origin_text: origin_text.into(),
            target_text: String::new(),
            raw_timing: None,
        }
    }

    /// Start and end, or None when the source timing was unreadable
    pub fn times(&self) -> Option<(u64, u64)> {
        match self.raw_timing {
            Some(_) => None,
            None => Some((self.start_ms, self.end_ms)),
        }
    }

    /// The `start --> end` line in SRT form
    pub fn timestamp_line(&self) -> String {
        match &self.raw_timing {
            Some(raw) => raw.clone(),
            None => format!("{} --> {}", timecode::format_srt(self.start_ms), timecode::format_srt(self.end_ms)),
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

// @enum: Which text lines a written SRT record carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SrtLayout {
    OriginOnly,
    TargetOnly,
    Bilingual { target_first: bool },
}

/// Render one record in the given layout
///
/// Empty text lines are left out, since a blank line ends an SRT record.
pub fn format_block(block: &CaptionBlock, layout: SrtLayout) -> String {
    let lines: [&str; 2] = match layout {
        SrtLayout::OriginOnly => [&block.origin_text, ""],
        SrtLayout::TargetOnly => [&block.target_text, ""],
        SrtLayout::Bilingual { target_first: true } => [&block.target_text, &block.origin_text],
        SrtLayout::Bilingual { target_first: false } => [&block.origin_text, &block.target_text],
    };
    let text: String = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| format!("{}\n", line))
        .collect();
    format!("{}\n{}\n{}\n", block.index, block.timestamp_line(), text)
}

/// Render a whole block sequence
pub fn format_srt(blocks: &[CaptionBlock], layout: SrtLayout) -> String {
    blocks.iter().map(|b| format_block(b, layout)).collect()
}

/// Write blocks to an SRT file, creating parent directories as needed
pub fn write_srt_file<P: AsRef<Path>>(path: P, blocks: &[CaptionBlock], layout: SrtLayout) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, format_srt(blocks, layout))
        .with_context(|| format!("Failed to write subtitle file: {}", path.display()))?;
    debug!("Wrote {} blocks to {}", blocks.len(), path.display());
    Ok(())
}

impl fmt::Display for CaptionBlock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format_block(self, SrtLayout::OriginOnly))
    }
}

/// Parse one blank-line separated block of trimmed lines
///
/// Three lines are a monolingual record; a fourth line is the translation.
fn parse_block(lines: &[&str], first_line: usize) -> Result<CaptionBlock, CaptionError> {
    let reject = |reason: &str| CaptionError::BlockParse { line: first_line, reason: reason.to_string() };

    if lines.len() < 3 {
        return Err(reject("need at least 3 lines"));
    }

    let index: usize = lines[0].parse().map_err(|_| reject("invalid index"))?;

    let timing = lines[1];
    if !timing.contains("-->") {
        return Err(reject("invalid timestamp line"));
    }

    let origin_text = lines[2].trim().to_string();
    if origin_text.is_empty() {
        return Err(reject("no origin text"));
    }
    let target_text = lines.get(3).map(|l| l.trim().to_string()).unwrap_or_default();

    let mut block = CaptionBlock { target_text, ..CaptionBlock::new(index, 0, 0, origin_text) };
    match timecode::parse_time_range(timing) {
        Ok((start, end)) if start <= end => {
            block.start_ms = start;
            block.end_ms = end;
        }
        Ok(_) | Err(_) => {
            warn!("Block {} at line {} has unreadable timing '{}'; keeping it untimed", index, first_line, timing);
            block.raw_timing = Some(timing.to_string());
        }
    }
    Ok(block)
}

/// Parse SRT content; malformed blocks are skipped with a warning
pub fn parse_srt_string(content: &str) -> Vec<CaptionBlock> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut block_start = 1;

    let mut flush = |current: &mut Vec<&str>, block_start: usize| {
        if current.len() >= 3 {
            match parse_block(&current[..], block_start) {
                Ok(block) => blocks.push(block),
                Err(e) => warn!("Skipping subtitle block: {}", e),
            }
        }
        current.clear();
    };

    for (number, line) in content.lines().enumerate() {
        let trimmed = line.trim().trim_start_matches('\u{feff}');
        if trimmed.is_empty() {
            flush(&mut current, block_start);
        } else {
            if current.is_empty() {
                block_start = number + 1;
            }
            current.push(trimmed);
        }
    }
    flush(&mut current, block_start);

    blocks
}

/// Read and parse an SRT file; only I/O failures are errors
pub fn parse_srt_file(path: &Path) -> Result<Vec<CaptionBlock>, CaptionError> {
    let content = fs::read_to_string(path)?;
    Ok(parse_srt_string(&content))
}

/// Renumber blocks 1..=n in their current order
pub fn renumber(blocks: &mut [CaptionBlock]) {
    for (i, block) in blocks.iter_mut().enumerate() {
        block.index = i + 1;
    }
}
