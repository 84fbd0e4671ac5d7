/*!
 * Batch translation processing.
 *
 * Every merged sentence is translated in its own request, with neighbouring
 * sentences as context. Requests run concurrently up to a limit and may
 * complete in any order; each result is written into the slot of its input,
 * so the output order always matches the input order.
 */

use futures::stream::{self, StreamExt};
use log::{debug, warn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::app_config::TranslationCommonConfig;
use crate::errors::TranslationError;

use super::core::{RetryPolicy, TranslationCapability};
use super::prompts::{SentenceContext, TranslationPromptBuilder};

/// A sentence and its translation
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedItem {
    pub origin_text: String,
    pub translated_text: String,
    /// True when every attempt failed and the origin text was kept
    pub fell_back: bool,
}

/// Concurrency and retry settings for a batch
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Maximum number of concurrent requests
    pub max_parallel: usize,
    pub retry: RetryPolicy,
    /// Neighbouring sentences given as context on each side
    pub context_sentences: usize,
}

impl From<&TranslationCommonConfig> for BatchOptions {
    fn from(common: &TranslationCommonConfig) -> Self {
        Self {
            max_parallel: common.max_parallel.max(1),
            retry: RetryPolicy::from(common),
            context_sentences: common.context_sentences,
        }
    }
}

/// Batch translator for merged sentences
pub struct BatchTranslator {
    /// The capability every request goes through
    capability: Arc<dyn TranslationCapability>,

    options: BatchOptions,
}

impl BatchTranslator {
    /// Create a new batch translator
    pub fn new(capability: Arc<dyn TranslationCapability>, options: BatchOptions) -> Self {
        Self { capability, options }
    }

    /// Translate one sentence, retrying per the policy
    async fn translate_one(&self, prompt: &str) -> Result<String, TranslationError> {
        self.options.retry.run(self.capability.as_ref(), prompt, |reply| {
            let trimmed = reply.trim();
            if trimmed.is_empty() {
                Err(TranslationError::MalformedResponse("empty translation".to_string()))
            } else {
                Ok(trimmed.to_string())
            }
        }).await
    }

    /// Translate all sentences into `target_language` (a human-readable name)
    ///
    /// Never fails: a sentence whose attempts are all exhausted keeps its
    /// origin text. `progress_callback` receives (completed, total).
    pub async fn translate_sentences(
        &self,
        sentences: &[String],
        target_language: &str,
        progress_callback: impl Fn(usize, usize) + Send + Sync,
    ) -> Vec<TranslatedItem> {
        let total = sentences.len();
        let builder = TranslationPromptBuilder::new(target_language);

        let completed = AtomicUsize::new(0);

        let results = stream::iter(sentences.iter().enumerate())
            .map(|(index, text)| {
                let builder = &builder;
                let completed = &completed;
                let progress_callback = &progress_callback;

                async move {
                    let context = SentenceContext::around(sentences, index, self.options.context_sentences);
                    let prompt = builder.sentence_prompt(text, &context);

                    let item = match self.translate_one(&prompt).await {
                        Ok(translated_text) => TranslatedItem {
                            origin_text: text.clone(),
                            translated_text,
                            fell_back: false,
                        },
                        Err(e) => {
                            warn!("Keeping original text for sentence {}: {}", index + 1, e);
                            TranslatedItem {
                                origin_text: text.clone(),
                                translated_text: text.clone(),
                                fell_back: true,
                            }
                        }
                    };

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress_callback(done, total);
                    (index, item)
                }
            })
            // At most max_parallel requests are in flight
            .buffer_unordered(self.options.max_parallel)
            .collect::<Vec<_>>()
            .await;

        // Write results into their input slots to restore order
        let mut slots: Vec<Option<TranslatedItem>> = vec![None; total];
        for (index, item) in results {
            slots[index] = Some(item);
        }

        let items: Vec<TranslatedItem> = slots
            .into_iter()
            .zip(sentences)
            .map(|(slot, text)| {
                slot.unwrap_or_else(|| TranslatedItem {
                    origin_text: text.clone(),
                    translated_text: text.clone(),
                    fell_back: true,
                })
            })
            .collect();

        let fallbacks = items.iter().filter(|i| i.fell_back).count();
        debug!("Translated {} sentences ({} kept original)", total, fallbacks);
        items
    }
}
