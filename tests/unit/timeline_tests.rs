/*!
 * Tests for timeline reconstruction from rolling captions
 */

use rollsub::captions::timecode::format_vtt;
use rollsub::captions::{extract_words, parse_cues, TimelineReconstructor};
use rollsub::subtitle_processor::CaptionBlock;
use crate::common::ROLLING_VTT;

fn assert_timeline_invariants(blocks: &[CaptionBlock]) {
    for (i, block) in blocks.iter().enumerate() {
        assert_eq!(block.index, i + 1, "indices must be contiguous from 1");
        assert!(block.start_ms <= block.end_ms, "block {} ends before it starts", block.index);
        assert!(!block.origin_text.is_empty());
    }
    for pair in blocks.windows(2) {
        assert!(pair[0].start_ms <= pair[1].start_ms, "blocks must be sorted by start");
        assert!(pair[0].end_ms <= pair[1].start_ms, "blocks {} and {} overlap", pair[0].index, pair[1].index);
    }
}

#[test]
fn test_reconstruct_withSettledLineRepeated_shouldYieldSingleBlock() {
    let vtt = "WEBVTT\n\n00:00:01.000 --> 00:00:03.000\nHello world\n\n00:00:02.000 --> 00:00:04.000\nHello world\n";
    let blocks = TimelineReconstructor::default().reconstruct(&parse_cues(vtt));

    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].start_ms, 1_000);
    assert_eq!(blocks[0].end_ms, 4_000);
    assert_eq!(blocks[0].origin_text, "Hello world");
}

#[test]
fn test_reconstruct_withRollingTrack_shouldProduceCleanTimeline() {
    let blocks = TimelineReconstructor::default().reconstruct(&parse_cues(ROLLING_VTT));

    let texts: Vec<&str> = blocks.iter().map(|b| b.origin_text.as_str()).collect();
    assert_eq!(texts, vec!["we went home", "and then slept"]);
    assert_eq!(blocks[0].start_ms, 500);
    assert_timeline_invariants(&blocks);
}

#[test]
fn test_reconstruct_withSyntheticTrack_shouldKeepInvariants() {
    let mut vtt = String::from("WEBVTT\n\n");
    for line in 0..40u64 {
        let start = line * 2_000;
        vtt.push_str(&format!(
            "{} --> {}\nline {} rolls<{}><c> in</c>\n\n",
            format_vtt(start), format_vtt(start + 1_500), line, format_vtt(start + 700)
        ));
        vtt.push_str(&format!(
            "{} --> {}\nline {} rolls in\n\n",
            format_vtt(start + 1_500), format_vtt(start + 2_500), line
        ));
    }
    let blocks = TimelineReconstructor::default().reconstruct(&parse_cues(&vtt));

    assert_eq!(blocks.len(), 40);
    assert_eq!(blocks[1].start_ms, 2_000);
    // The settled render overlaps the next line and is clamped with padding
    assert_eq!(blocks[0].end_ms, 1_950);
    assert_timeline_invariants(&blocks);
}

#[test]
fn test_extractWords_withRollingTrack_shouldChainFragmentTimes() {
    let words = extract_words(ROLLING_VTT);

    let texts: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
    assert_eq!(texts, vec!["we went", "home", "and then", "slept"]);
    assert_eq!((words[0].start_ms, words[0].end_ms), (500, 1_000));
    assert_eq!((words[1].start_ms, words[1].end_ms), (1_000, 2_000));
    assert_eq!((words[3].start_ms, words[3].end_ms), (3_000, 4_000));
    let nums: Vec<usize> = words.iter().map(|w| w.num).collect();
    assert_eq!(nums, vec![0, 1, 2, 3]);
}
