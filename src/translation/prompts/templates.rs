/*!
 * Prompt templates for subtitle translation.
 *
 * Three requests are sent to the model: a context-aware translation of one
 * sentence, a split of a translated sentence back into caption fragments,
 * and a whole-transcript translation. The last two ask for JSON.
 */

use serde::{Deserialize, Serialize};

/// Context-aware sentence translation.
pub const SENTENCE_TRANSLATION: &str = r#"Translate the text inside <text> into {target_language}.

The surrounding sentences are given only to help you understand the context. Do not translate them.

Previous sentences:
{previous}
<text>
{text}
</text>

Next sentences:
{next}

Reply with only the {target_language} translation of the text inside <text>, on a single line, without quotes or notes."#;

/// Split a translated sentence to match the original caption fragments.
pub const SPLIT_TRANSLATION: &str = r#"The following translated sentence must be divided into exactly {count} parts so that each part corresponds to one of the original fragments below, in order.

Translated sentence:
{translated}

Original fragments:
{parts}
Respond with JSON only, in the form {"parts": ["part 1", "part 2"]}. The array must contain exactly {count} strings. Do not drop, add or reorder any words of the translated sentence."#;

/// Whole-transcript translation with sentence segmentation.
pub const TRANSCRIPT_TRANSLATION: &str = r#"Below is the full transcript of a video, taken from automatic captions without reliable punctuation.

Split it into complete, natural sentences and translate each sentence into {target_language}.

Transcript:
{transcript}

Respond with JSON only, in the form {"sentences": [{"origin": "original sentence", "target": "translated sentence"}]}. The origin sentences, concatenated in order, must reproduce the transcript words without omissions."#;

/// Neighbouring sentences around the text being translated
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SentenceContext<'a> {
    pub previous: &'a [String],
    pub next: &'a [String],
}

impl<'a> SentenceContext<'a> {
    /// Take up to `width` sentences on each side of `position`
    pub fn around(sentences: &'a [String], position: usize, width: usize) -> Self {
        let start = position.saturating_sub(width);
        let end = (position + 1 + width).min(sentences.len());
        let next_start = (position + 1).min(end);
        Self {
            previous: &sentences[start..position.min(sentences.len())],
            next: &sentences[next_start..end],
        }
    }
}

/// Expected reply to a split request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SplitReply {
    pub parts: Vec<String>,
}

/// One sentence of a whole-transcript reply
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptSentence {
    pub origin: String,
    pub target: String,
}

/// Expected reply to a whole-transcript request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptReply {
    pub sentences: Vec<TranscriptSentence>,
}

/// Substitute `{name}` placeholders in one pass over `template`
///
/// Substituted values are never scanned again, so placeholder-like text
/// inside them is kept as is. Braces that do not name a known placeholder are
/// copied through.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut filled = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        filled.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            values.iter().find(|(key, _)| *key == name).map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                filled.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                filled.push('{');
                rest = after;
            }
        }
    }
    filled.push_str(rest);
    filled
}

/// Builds the prompts sent to the model
#[derive(Debug, Clone)]
pub struct TranslationPromptBuilder {
    /// Human-readable target language name, e.g. "Simplified Chinese"
    target_language: String,
}

impl TranslationPromptBuilder {
    pub fn new(target_language: impl Into<String>) -> Self {
        Self {
            target_language: target_language.into(),
        }
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// Prompt for one sentence with its neighbours
    pub fn sentence_prompt(&self, text: &str, context: &SentenceContext<'_>) -> String {
        let previous: String = context.previous.iter().map(|s| format!("{}\n", s)).collect();
        let next = context.next.join("\n");

        fill_template(
            SENTENCE_TRANSLATION,
            &[
                ("target_language", self.target_language.as_str()),
                ("previous", previous.as_str()),
                ("next", next.as_str()),
                ("text", text),
            ],
        )
    }

    /// Prompt asking to divide `translated` into one part per original fragment
    pub fn split_prompt(&self, translated: &str, original_parts: &[&str]) -> String {
        let parts: String = original_parts
            .iter()
            .enumerate()
            .map(|(i, part)| format!("{}. {}\n", i + 1, part))
            .collect();

        let count = original_parts.len().to_string();
        fill_template(
            SPLIT_TRANSLATION,
            &[("count", count.as_str()), ("parts", parts.as_str()), ("translated", translated)],
        )
    }

    /// Prompt for the whole transcript in one request
    pub fn transcript_prompt(&self, transcript: &str) -> String {
        fill_template(
            TRANSCRIPT_TRANSLATION,
            &[("target_language", self.target_language.as_str()), ("transcript", transcript)],
        )
    }
}
