/*!
 * Tests for sentence merging, batch translation and splitting
 */

use std::sync::Arc;

use rollsub::providers::mock::MockProvider;
use rollsub::subtitle_processor::CaptionBlock;
use rollsub::translation::core::RetryPolicy;
use rollsub::translation::{split_by_ratio, BatchOptions, BatchTranslator, SentenceMerger, TranslationSplitter};
use crate::common::DelayedCapability;

fn options(max_parallel: usize, max_attempts: u32) -> BatchOptions {
    BatchOptions {
        max_parallel,
        retry: RetryPolicy::new(max_attempts, 1),
        context_sentences: 2,
    }
}

fn to_strings(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_translateSentences_withOutOfOrderCompletion_shouldKeepInputOrder() {
    let capability = Arc::new(DelayedCapability::new(&[("A", 60), ("B", 120), ("C", 0)]));
    let translator = BatchTranslator::new(capability.clone(), options(3, 1));

    let items = translator.translate_sentences(&to_strings(&["A", "B", "C"]), "French", |_, _| {}).await;

    assert_eq!(capability.completion_order(), vec!["C", "A", "B"]);
    let translated: Vec<&str> = items.iter().map(|i| i.translated_text.as_str()).collect();
    assert_eq!(translated, vec!["<A>", "<B>", "<C>"]);
}

#[tokio::test]
async fn test_translateSentences_withIntermittentProvider_shouldRetryAndSucceed() {
    let provider = MockProvider::intermittent(2);
    let translator = BatchTranslator::new(Arc::new(provider.clone()), options(1, 3));

    let items = translator.translate_sentences(&to_strings(&["one", "two"]), "German", |_, _| {}).await;

    assert!(items.iter().all(|i| !i.fell_back));
    assert_eq!(items[1].translated_text, "[TRANSLATED] two");
    // Every second request fails once and is retried
    assert_eq!(provider.request_count(), 3);
}

#[tokio::test]
async fn test_translateSentences_withDeadProvider_shouldKeepOriginText() {
    let translator = BatchTranslator::new(Arc::new(MockProvider::failing()), options(2, 2));

    let items = translator.translate_sentences(&to_strings(&["stay", "as is"]), "Japanese", |_, _| {}).await;

    let translated: Vec<&str> = items.iter().map(|i| i.translated_text.as_str()).collect();
    assert_eq!(translated, vec!["stay", "as is"]);
    assert!(items.iter().all(|i| i.fell_back));
}

#[test]
fn test_splitByRatio_withThreeFragments_shouldFollowLengthShares() {
    let parts = split_by_ratio(&["ab", "cd", "efgh"], "0123456789abcdef");
    assert_eq!(parts, vec!["0123", "4567", "89abcdef"]);
}

#[tokio::test]
async fn test_applyTranslations_withUnsplittableReply_shouldFallBackToRatio() {
    let blocks_source = vec![
        CaptionBlock::new(1, 0, 1_000, "ab"),
        CaptionBlock::new(2, 1_000, 2_000, "cd"),
        CaptionBlock::new(3, 2_000, 3_000, "efgh"),
    ];
    let sentences = SentenceMerger::default().merge(&blocks_source);
    assert_eq!(sentences.len(), 1);
    assert_eq!(sentences[0].text, "ab cd efgh");

    let translator = BatchTranslator::new(Arc::new(MockProvider::working()), options(1, 1));
    let mut items = translator.translate_sentences(&[sentences[0].text.clone()], "French", |_, _| {}).await;
    items[0].translated_text = "0123456789abcdef".to_string();

    // The default mock reply to a split prompt is not JSON
    let splitter = TranslationSplitter::new(Arc::new(MockProvider::working()), "French", 2);
    let mut blocks = blocks_source.clone();
    splitter.apply_translations(&mut blocks, &sentences, &items, "en", "fr").await;

    let targets: Vec<&str> = blocks.iter().map(|b| b.target_text.as_str()).collect();
    assert_eq!(targets, vec!["0123", "4567", "89abcdef"]);
    let origins: Vec<&str> = blocks.iter().map(|b| b.origin_text.as_str()).collect();
    assert_eq!(origins, vec!["ab", "cd", "efgh"]);
}

#[tokio::test]
async fn test_applyTranslations_withChineseTarget_shouldBeautify() {
    let blocks_source = vec![CaptionBlock::new(1, 0, 1_000, "hello there")];
    let sentences = SentenceMerger::default().merge(&blocks_source);

    let provider = MockProvider::working().with_custom_response(|_| "你好 ， 朋友。".to_string());
    let translator = BatchTranslator::new(Arc::new(provider.clone()), options(1, 1));
    let items = translator.translate_sentences(&[sentences[0].text.clone()], "Simplified Chinese", |_, _| {}).await;

    let splitter = TranslationSplitter::new(Arc::new(provider), "Simplified Chinese", 1);
    let mut blocks = blocks_source.clone();
    splitter.apply_translations(&mut blocks, &sentences, &items, "en", "zh_cn").await;

    assert_eq!(blocks[0].target_text, "你好，朋友");
    assert_eq!(blocks[0].origin_text, "hello there");
}
