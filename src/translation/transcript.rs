/*!
 * Whole-transcript translation.
 *
 * The full transcript goes to the model in one request and comes back as
 * sentences with their translations. Sentences are then timed against the
 * word timeline: origin tokens are matched to timed words with a cursor
 * that only moves forward. Sentences with no matched word share the gap
 * between their matched neighbours in proportion to their length. Long
 * sentences are cut into caption-sized chunks, and the translation is
 * split over the chunks like any merged sentence.
 */

use log::{debug, info};
use std::sync::Arc;

use crate::captions::{resolve_overlaps, Word};
use crate::errors::TranslationError;
use crate::subtitle_processor::{renumber, CaptionBlock};

use super::core::{RetryPolicy, TranslationCapability};
use super::formatting::TextFormatter;
use super::prompts::{TranscriptReply, TranscriptSentence, TranslationPromptBuilder};
use super::splitter::TranslationSplitter;

/// How far ahead of the cursor a token may be matched
const MATCH_WINDOW: usize = 30;

/// Lowercased alphanumeric core of a token
fn normalize_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// A sentence placed on the timeline
#[derive(Debug, Clone, PartialEq)]
pub struct TimedSentence {
    pub origin: String,
    pub target: String,
    pub start_ms: u64,
    pub end_ms: u64,
    /// Times of each whitespace token of `origin`, when it was matched
    pub token_times: Vec<Option<(u64, u64)>>,
}

impl TimedSentence {
    fn matched_span(&self) -> Option<(u64, u64)> {
        let first = self.token_times.iter().flatten().next()?;
        let last = self.token_times.iter().flatten().last()?;
        Some((first.0, last.1.max(first.0)))
    }
}

/// Place sentences on the word timeline
///
/// `bounds` is the interval used when the timeline is empty.
pub fn align_sentences(sentences: &[TranscriptSentence], words: &[Word], bounds: (u64, u64)) -> Vec<TimedSentence> {
    let timeline: Vec<(String, u64, u64)> = words
        .iter()
        .flat_map(|w| w.text.split_whitespace().map(move |t| (normalize_token(t), w.start_ms, w.end_ms)))
        .filter(|(token, _, _)| !token.is_empty())
        .collect();

    let mut cursor = 0;
    let mut timed: Vec<TimedSentence> = sentences
        .iter()
        .map(|sentence| {
            let token_times = sentence
                .origin
                .split_whitespace()
                .map(|token| {
                    let token = normalize_token(token);
                    if token.is_empty() {
                        return None;
                    }
                    let window_end = (cursor + MATCH_WINDOW).min(timeline.len());
                    let offset = timeline[cursor..window_end].iter().position(|(t, _, _)| *t == token)?;
                    let (_, start, end) = &timeline[cursor + offset];
                    cursor += offset + 1;
                    Some((*start, *end))
                })
                .collect();

            TimedSentence {
                origin: sentence.origin.trim().to_string(),
                target: sentence.target.trim().to_string(),
                start_ms: 0,
                end_ms: 0,
                token_times,
            }
        })
        .collect();

    let spans: Vec<Option<(u64, u64)>> = timed.iter().map(|s| s.matched_span()).collect();
    let (timeline_start, timeline_end) = match (words.first(), words.last()) {
        (Some(first), Some(last)) => (first.start_ms, last.end_ms.max(first.start_ms)),
        _ => bounds,
    };

    let mut i = 0;
    while i < timed.len() {
        if let Some((start, end)) = spans[i] {
            timed[i].start_ms = start;
            timed[i].end_ms = end;
            i += 1;
            continue;
        }

        // Run of unmatched sentences between two matched neighbours
        let run_end = (i..timed.len()).find(|&j| spans[j].is_some()).unwrap_or(timed.len());
        let gap_start = if i == 0 { timeline_start } else { timed[i - 1].end_ms };
        let gap_end = spans.get(run_end).copied().flatten().map_or(timeline_end, |(start, _)| start).max(gap_start);

        let weights: Vec<u64> = timed[i..run_end].iter().map(|s| s.origin.chars().count().max(1) as u64).collect();
        let total_weight: u64 = weights.iter().sum();
        let span = gap_end - gap_start;

        let mut consumed = 0;
        for (offset, weight) in weights.iter().enumerate() {
            let sentence = &mut timed[i + offset];
            sentence.start_ms = gap_start + span * consumed / total_weight;
            consumed += weight;
            sentence.end_ms = gap_start + span * consumed / total_weight;
        }
        i = run_end;
    }

    timed
}

/// Token ranges of `sentence` forming chunks of at most `max_chars` characters
///
/// A single token longer than the limit forms a chunk of its own.
fn chunk_tokens(tokens: &[&str], max_chars: usize) -> Vec<std::ops::Range<usize>> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut length = 0;

    for (i, token) in tokens.iter().enumerate() {
        let token_chars = token.chars().count();
        let with_token = if length == 0 { token_chars } else { length + 1 + token_chars };
        if length > 0 && with_token > max_chars {
            chunks.push(start..i);
            start = i;
            length = token_chars;
        } else {
            length = with_token;
        }
    }
    if start < tokens.len() {
        chunks.push(start..tokens.len());
    }
    chunks
}

/// Translates the whole transcript in one request
pub struct TranscriptTranslator {
    capability: Arc<dyn TranslationCapability>,
    retry: RetryPolicy,
    max_block_chars: usize,
    overlap_padding_ms: u64,
    max_parallel: usize,
}

impl TranscriptTranslator {
    pub fn new(
        capability: Arc<dyn TranslationCapability>,
        retry: RetryPolicy,
        max_block_chars: usize,
        overlap_padding_ms: u64,
        max_parallel: usize,
    ) -> Self {
        Self {
            capability,
            retry,
            max_block_chars: max_block_chars.max(1),
            overlap_padding_ms,
            max_parallel,
        }
    }

    async fn request_sentences(&self, transcript: &str, builder: &TranslationPromptBuilder) -> Result<Vec<TranscriptSentence>, TranslationError> {
        let prompt = builder.transcript_prompt(transcript);
        self.retry.run(self.capability.as_ref(), &prompt, |reply| {
            let cleaned = TextFormatter::clean_markdown_code_block(reply);
            let parsed: TranscriptReply = serde_json::from_str(&cleaned)
                .map_err(|e| TranslationError::MalformedResponse(e.to_string()))?;
            let sentences: Vec<TranscriptSentence> = parsed
                .sentences
                .into_iter()
                .filter(|s| !s.origin.trim().is_empty())
                .collect();
            if sentences.is_empty() {
                return Err(TranslationError::MalformedResponse("no sentences in reply".to_string()));
            }
            Ok(sentences)
        }).await
    }

    /// Translate `blocks` as one transcript and re-time the result on `words`
    ///
    /// `target_language_name` is used in prompts; the language codes select
    /// beautification. Errors mean the caller should fall back to
    /// per-sentence translation.
    pub async fn translate(
        &self,
        blocks: &[CaptionBlock],
        words: &[Word],
        target_language_name: &str,
        origin_language: &str,
        target_language: &str,
    ) -> Result<Vec<CaptionBlock>, TranslationError> {
        let transcript = blocks.iter().map(|b| b.origin_text.as_str()).collect::<Vec<_>>().join(" ");
        let builder = TranslationPromptBuilder::new(target_language_name);
        let sentences = self.request_sentences(&transcript, &builder).await?;

        let bounds = (
            blocks.first().map_or(0, |b| b.start_ms),
            blocks.last().map_or(0, |b| b.end_ms),
        );
        let timed = align_sentences(&sentences, words, bounds);
        info!("Transcript came back as {} sentences", timed.len());

        let splitter = TranslationSplitter::new(self.capability.clone(), target_language_name, self.max_parallel);
        let mut result = Vec::new();
        for sentence in &timed {
            result.extend(self.chunk_sentence(sentence, &splitter).await);
        }

        result.sort_by_key(|b| b.start_ms);
        resolve_overlaps(&mut result, self.overlap_padding_ms);
        renumber(&mut result);
        TextFormatter::beautify_blocks(&mut result, origin_language, target_language);

        debug!("Whole-transcript translation produced {} blocks", result.len());
        Ok(result)
    }

    /// Cut one timed sentence into caption-sized blocks
    async fn chunk_sentence(&self, sentence: &TimedSentence, splitter: &TranslationSplitter) -> Vec<CaptionBlock> {
        let tokens: Vec<&str> = sentence.origin.split_whitespace().collect();
        let ranges = chunk_tokens(&tokens, self.max_block_chars);

        if ranges.len() <= 1 {
            let mut block = CaptionBlock::new(0, sentence.start_ms, sentence.end_ms, sentence.origin.clone());
            block.target_text = sentence.target.clone();
            return vec![block];
        }

        let texts: Vec<String> = ranges.iter().map(|r| tokens[r.clone()].join(" ")).collect();
        let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let parts = splitter.split(&text_refs, &sentence.target).await;

        // Proportional placement inside the sentence, refined by matched words
        let total_chars: u64 = texts.iter().map(|t| t.chars().count() as u64).sum::<u64>().max(1);
        let span = sentence.end_ms.saturating_sub(sentence.start_ms);
        let mut consumed = 0u64;

        ranges
            .iter()
            .zip(texts)
            .enumerate()
            .map(|(i, (range, text))| {
                let chunk_chars = text.chars().count() as u64;
                let mut start = sentence.start_ms + span * consumed / total_chars;
                consumed += chunk_chars;
                let mut end = sentence.start_ms + span * consumed / total_chars;

                let matched: Vec<(u64, u64)> = sentence.token_times[range.clone()].iter().flatten().copied().collect();
                if let (Some(first), Some(last)) = (matched.first(), matched.last()) {
                    start = first.0;
                    end = last.1.max(first.0);
                }

                let mut block = CaptionBlock::new(0, start, end, text);
                block.target_text = parts.get(i).map(|p| p.trim().to_string()).unwrap_or_default();
                block
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockProvider;

    fn word(text: &str, start_ms: u64, end_ms: u64, num: usize) -> Word {
        Word { text: text.to_string(), start_ms, end_ms, num }
    }

    fn sentence(origin: &str, target: &str) -> TranscriptSentence {
        TranscriptSentence { origin: origin.to_string(), target: target.to_string() }
    }

    #[test]
    fn test_normalizeToken_shouldStripPunctuationAndCase() {
        assert_eq!(normalize_token("Hello,"), "hello");
        assert_eq!(normalize_token("it's"), "its");
        assert_eq!(normalize_token("..."), "");
    }

    #[test]
    fn test_alignSentences_withMatchingWords_shouldUseWordTimes() {
        let words = vec![
            word("so", 0, 300, 0),
            word("we", 300, 600, 1),
            word("went", 600, 900, 2),
            word("home", 1_000, 1_400, 3),
            word("again", 1_400, 2_000, 4),
        ];
        let sentences = vec![sentence("So we went.", "On y est allé."), sentence("Home again!", "Encore chez nous !")];
        let timed = align_sentences(&sentences, &words, (0, 0));

        assert_eq!((timed[0].start_ms, timed[0].end_ms), (0, 900));
        assert_eq!((timed[1].start_ms, timed[1].end_ms), (1_000, 2_000));
    }

    #[test]
    fn test_alignSentences_withUnmatchedSentence_shouldFillGapProportionally() {
        let words = vec![word("hello", 0, 1_000, 0), word("bye", 5_000, 6_000, 1)];
        let sentences = vec![
            sentence("hello", "salut"),
            sentence("xx", "a"),
            sentence("yyyyyy", "b"),
            sentence("bye", "adieu"),
        ];
        let timed = align_sentences(&sentences, &words, (0, 0));

        // Gap 1000..5000 shared 2:6
        assert_eq!((timed[1].start_ms, timed[1].end_ms), (1_000, 2_000));
        assert_eq!((timed[2].start_ms, timed[2].end_ms), (2_000, 5_000));
        assert_eq!(timed[3].start_ms, 5_000);
    }

    #[test]
    fn test_chunkTokens_shouldRespectMaxChars() {
        let tokens = vec!["aaaa", "bbbb", "cccc", "dddddddddddd"];
        let chunks = chunk_tokens(&tokens, 9);
        assert_eq!(chunks, vec![0..2, 2..3, 3..4]);
    }

    #[tokio::test]
    async fn test_translate_withTranscriptReply_shouldProduceTimedBlocks() {
        let provider = MockProvider::working().with_custom_response(|_| {
            r#"{"sentences":[{"origin":"so we went","target":"alors on est allés"},{"origin":"home again","target":"encore à la maison"}]}"#.to_string()
        });
        let translator = TranscriptTranslator::new(Arc::new(provider), RetryPolicy::new(2, 1), 80, 50, 2);

        let blocks = vec![
            CaptionBlock::new(1, 0, 1_000, "so we went home"),
            CaptionBlock::new(2, 1_000, 2_000, "again"),
        ];
        let words = vec![
            word("so", 0, 300, 0),
            word("we", 300, 600, 1),
            word("went", 600, 900, 2),
            word("home", 1_000, 1_400, 3),
            word("again", 1_400, 2_000, 4),
        ];

        let result = translator.translate(&blocks, &words, "French", "en", "fr").await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].index, 1);
        assert_eq!(result[0].origin_text, "so we went");
        assert_eq!(result[0].target_text, "alors on est allés");
        assert_eq!((result[1].start_ms, result[1].end_ms), (1_000, 2_000));
    }

    #[tokio::test]
    async fn test_translate_withUnparseableReply_shouldFail() {
        let provider = MockProvider::working().with_custom_response(|_| "not json".to_string());
        let translator = TranscriptTranslator::new(Arc::new(provider), RetryPolicy::new(2, 1), 80, 50, 2);
        let blocks = vec![CaptionBlock::new(1, 0, 1_000, "hello")];

        let result = translator.translate(&blocks, &[], "French", "en", "fr").await;
        assert!(matches!(result, Err(TranslationError::MalformedResponse(_))));
    }
}
