use anyhow::{anyhow, Context, Result};

// @module: Millisecond timecodes shared by the VTT and SRT code paths

/// Parse `HH:MM:SS.mmm`, `HH:MM:SS,mmm` or `MM:SS.mmm` to milliseconds
pub fn parse_timecode(timestamp: &str) -> Result<u64> {
    let trimmed = timestamp.trim();
    let (clock, millis) = trimmed
        .rsplit_once(['.', ','])
        .ok_or_else(|| anyhow!("Missing millisecond separator in timestamp: {}", timestamp))?;

    let parts: Vec<&str> = clock.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (
            h.parse::<u64>().context("Failed to parse hours")?,
            m.parse::<u64>().context("Failed to parse minutes")?,
            s.parse::<u64>().context("Failed to parse seconds")?,
        ),
        [m, s] => (
            0,
            m.parse::<u64>().context("Failed to parse minutes")?,
            s.parse::<u64>().context("Failed to parse seconds")?,
        ),
        _ => return Err(anyhow!("Invalid timestamp format: {}", timestamp)),
    };

    if millis.len() != 3 {
        return Err(anyhow!("Expected three millisecond digits in timestamp: {}", timestamp));
    }
    let millis: u64 = millis.parse().context("Failed to parse milliseconds")?;

    // Validate time components
    if minutes >= 60 || seconds >= 60 {
        return Err(anyhow!("Invalid time components in timestamp: {}", timestamp));
    }

    Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
}

/// Parse a `start --> end` line; anything after the end timestamp (cue settings) is ignored
pub fn parse_time_range(line: &str) -> Result<(u64, u64)> {
    let (start, rest) = line
        .split_once("-->")
        .ok_or_else(|| anyhow!("Missing '-->' in time range: {}", line))?;
    let end = rest.split_whitespace().next()
        .ok_or_else(|| anyhow!("Missing end timestamp in time range: {}", line))?;
    Ok((parse_timecode(start)?, parse_timecode(end)?))
}

fn split_ms(ms: u64) -> (u64, u64, u64, u64) {
    (ms / 3_600_000, (ms % 3_600_000) / 60_000, (ms % 60_000) / 1_000, ms % 1_000)
}

/// Format milliseconds as an SRT timestamp (HH:MM:SS,mmm)
pub fn format_srt(ms: u64) -> String {
    let (hours, minutes, seconds, millis) = split_ms(ms);
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Format milliseconds as a VTT timestamp (HH:MM:SS.mmm)
pub fn format_vtt(ms: u64) -> String {
    let (hours, minutes, seconds, millis) = split_ms(ms);
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parseTimecode_withAllSupportedForms_shouldAgree() {
        assert_eq!(parse_timecode("00:01:02.345").unwrap(), 62_345);
        assert_eq!(parse_timecode("00:01:02,345").unwrap(), 62_345);
        assert_eq!(parse_timecode("01:02.345").unwrap(), 62_345);
        assert_eq!(parse_timecode("10:00:00.000").unwrap(), 36_000_000);
    }

    #[test]
    fn test_parseTimecode_withGarbage_shouldFail() {
        assert!(parse_timecode("").is_err());
        assert!(parse_timecode("00:00:01").is_err());
        assert!(parse_timecode("00:61:00.000").is_err());
        assert!(parse_timecode("aa:bb:cc.ddd").is_err());
        assert!(parse_timecode("00:00:01.5").is_err());
    }

    #[test]
    fn test_parseTimeRange_withCueSettings_shouldIgnoreThem() {
        let (start, end) = parse_time_range("00:00:01.000 --> 00:00:03.500 align:start position:0%").unwrap();
        assert_eq!((start, end), (1_000, 3_500));
    }

    #[test]
    fn test_formatters_shouldUseTheirSeparators() {
        assert_eq!(format_srt(3_723_004), "01:02:03,004");
        assert_eq!(format_vtt(3_723_004), "01:02:03.004");
    }
}
