/*!
 * Tests for SRT reading and writing
 */

use anyhow::Result;

use rollsub::subtitle_processor::{format_srt, parse_srt_file, parse_srt_string, write_srt_file, CaptionBlock, SrtLayout};
use crate::common;

#[test]
fn test_srtRoundTrip_withBilingualLayout_shouldPreserveBlocks() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut first = CaptionBlock::new(1, 500, 2_010, "we went home");
    first.target_text = "nous sommes rentrés".to_string();
    let mut second = CaptionBlock::new(2, 2_010, 4_010, "and then slept");
    second.target_text = "puis dormi".to_string();
    let blocks = vec![first, second];

    let path = temp_dir.path().join("bilingual.srt");
    write_srt_file(&path, &blocks, SrtLayout::Bilingual { target_first: false })?;
    let parsed = parse_srt_file(&path)?;

    assert_eq!(parsed, blocks);
    Ok(())
}

#[test]
fn test_parseSrtFile_withSampleFile_shouldReadMonolingualBlocks() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_subtitle(temp_dir.path(), "sample.srt")?;

    let blocks = parse_srt_file(&path)?;
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[1].start_ms, 5_000);
    assert_eq!(blocks[2].origin_text, "For testing purposes.");
    assert!(blocks.iter().all(|b| b.target_text.is_empty()));
    Ok(())
}

#[test]
fn test_parseSrtString_withMalformedBlock_shouldSkipOnlyThatBlock() {
    let content = "1\n00:00:01,000 --> 00:00:02,000\nfirst\n\n\
                   two\n00:00:02,000 --> 00:00:03,000\nbad index\n\n\
                   3\n00:00:03,000 --> 00:00:04,000\nthird\n";
    let blocks = parse_srt_string(content);

    let texts: Vec<&str> = blocks.iter().map(|b| b.origin_text.as_str()).collect();
    assert_eq!(texts, vec!["first", "third"]);
}

#[test]
fn test_formatSrt_withTranslationOnTop_shouldPutTargetFirst() {
    let mut block = CaptionBlock::new(7, 61_000, 62_500, "Hello");
    block.target_text = "Bonjour".to_string();

    let rendered = format_srt(&[block], SrtLayout::Bilingual { target_first: true });
    assert_eq!(rendered, "7\n00:01:01,000 --> 00:01:02,500\nBonjour\nHello\n\n");
}

#[test]
fn test_parseSrtFile_withMissingFile_shouldFail() {
    let result = parse_srt_file(std::path::Path::new("/definitely/not/here.srt"));
    assert!(result.is_err());
}
