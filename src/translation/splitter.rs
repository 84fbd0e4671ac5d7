/*!
 * Distributing sentence translations back over caption blocks.
 *
 * A merged sentence spanning several blocks is translated as a whole; the
 * translation then has to be cut into one piece per block. The model is
 * asked to do the cut first. When it fails or returns the wrong number of
 * pieces, the translation is cut proportionally to the origin text lengths.
 */

use futures::stream::{self, StreamExt};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::TranslationError;
use crate::subtitle_processor::CaptionBlock;

use super::batch::TranslatedItem;
use super::core::{RetryPolicy, TranslationCapability};
use super::formatting::TextFormatter;
use super::merge::MergedSentence;
use super::prompts::{SplitReply, TranslationPromptBuilder};

/// Cut `translated` into one part per original fragment, by length ratio
///
/// Lengths are counted in characters. Each cut lands at the running share of
/// the translation, rounded down; the last part takes whatever remains. Parts
/// are not trimmed, so joining them gives back `translated`. When the
/// fragments are all empty, the first part gets everything.
pub fn split_by_ratio(original_parts: &[&str], translated: &str) -> Vec<String> {
    if original_parts.is_empty() {
        return Vec::new();
    }

    let lengths: Vec<usize> = original_parts.iter().map(|p| p.chars().count()).collect();
    let total_original: usize = lengths.iter().sum();

    if total_original == 0 {
        let mut parts = vec![String::new(); original_parts.len()];
        parts[0] = translated.to_string();
        return parts;
    }

    let chars: Vec<char> = translated.chars().collect();
    let total_translated = chars.len();

    let mut parts = Vec::with_capacity(original_parts.len());
    let mut position = 0;
    for (i, length) in lengths.iter().enumerate() {
        if i + 1 == lengths.len() {
            parts.push(chars[position..].iter().collect::<String>());
            break;
        }
        let share = (*length as f64 / total_original as f64 * total_translated as f64).floor() as usize;
        let end = (position + share).min(total_translated);
        parts.push(chars[position..end].iter().collect::<String>());
        position = end;
    }
    parts
}

/// Splits translations over blocks, asking the model first
pub struct TranslationSplitter {
    capability: Arc<dyn TranslationCapability>,
    builder: TranslationPromptBuilder,
    max_parallel: usize,
}

impl TranslationSplitter {
    /// `target_language` is the human-readable language name used in prompts
    pub fn new(capability: Arc<dyn TranslationCapability>, target_language: &str, max_parallel: usize) -> Self {
        Self {
            capability,
            builder: TranslationPromptBuilder::new(target_language),
            max_parallel: max_parallel.max(1),
        }
    }

    async fn split_with_model(&self, original_parts: &[&str], translated: &str) -> Result<Vec<String>, TranslationError> {
        let prompt = self.builder.split_prompt(translated, original_parts);
        let expected = original_parts.len();

        RetryPolicy::once().run(self.capability.as_ref(), &prompt, |reply| {
            let cleaned = TextFormatter::clean_markdown_code_block(reply);
            let parsed: SplitReply = serde_json::from_str(&cleaned)
                .map_err(|e| TranslationError::MalformedResponse(e.to_string()))?;
            if parsed.parts.len() != expected {
                return Err(TranslationError::SplitMismatch { expected, got: parsed.parts.len() });
            }
            Ok(parsed.parts.into_iter().map(|p| p.trim().to_string()).collect())
        }).await
    }

    /// One translated part per original fragment, never failing
    pub async fn split(&self, original_parts: &[&str], translated: &str) -> Vec<String> {
        match original_parts.len() {
            0 => Vec::new(),
            1 => vec![translated.to_string()],
            _ => match self.split_with_model(original_parts, translated).await {
                Ok(parts) => parts,
                Err(e) => {
                    warn!("Model split failed ({}); splitting by length ratio", e);
                    split_by_ratio(original_parts, translated)
                }
            },
        }
    }

    /// Write translations into the blocks of each merged sentence
    ///
    /// Translations are looked up by trimmed sentence text. A sentence with no
    /// translation gives each of its blocks its own origin text. When a split
    /// comes back short, the remaining blocks get an empty translation.
    pub async fn apply_translations(
        &self,
        blocks: &mut [CaptionBlock],
        sentences: &[MergedSentence],
        items: &[TranslatedItem],
        origin_language: &str,
        target_language: &str,
    ) {
        let translations: HashMap<&str, &str> = items
            .iter()
            .map(|item| (item.origin_text.trim(), item.translated_text.as_str()))
            .collect();

        let split_results = {
            let blocks: &[CaptionBlock] = blocks;
            stream::iter(sentences.iter().enumerate())
                .map(|(position, sentence)| {
                    let translations = &translations;
                    async move {
                        let parts = match translations.get(sentence.text.trim()) {
                            Some(translated) => {
                                let originals: Vec<&str> = blocks[sentence.blocks.clone()]
                                    .iter()
                                    .map(|b| b.origin_text.as_str())
                                    .collect();
                                Some(self.split(&originals, translated).await)
                            }
                            None => None,
                        };
                        (position, parts)
                    }
                })
                .buffer_unordered(self.max_parallel)
                .collect::<Vec<_>>()
                .await
        };

        for (position, parts) in split_results {
            let range = sentences[position].blocks.clone();
            match parts {
                Some(parts) => {
                    for (offset, block) in blocks[range].iter_mut().enumerate() {
                        block.target_text = parts.get(offset).map(|p| p.trim().to_string()).unwrap_or_default();
                    }
                }
                None => {
                    debug!("No translation for sentence {}; using origin text", position + 1);
                    for block in blocks[range].iter_mut() {
                        block.target_text = block.origin_text.clone();
                    }
                }
            }
        }

        TextFormatter::beautify_blocks(blocks, origin_language, target_language);
    }
}
