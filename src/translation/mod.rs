/*!
 * Subtitle translation through language-model providers.
 *
 * This module is split into several submodules:
 *
 * - `core`: the translation capability seam, the provider-backed service and retry policy
 * - `merge`: grouping caption blocks into sentences
 * - `batch`: concurrent per-sentence translation with ordered results
 * - `splitter`: distributing sentence translations back over blocks
 * - `transcript`: whole-transcript translation re-timed on the word timeline
 * - `formatting`: text clean-up for model output and CJK captions
 * - `prompts`: prompt templates and reply shapes
 */

// Re-export main types for easier usage
pub use self::batch::{BatchOptions, BatchTranslator, TranslatedItem};
pub use self::core::{RetryPolicy, TranslationCapability, TranslationService};
pub use self::formatting::TextFormatter;
pub use self::merge::{MergedSentence, SentenceMerger};
pub use self::splitter::{split_by_ratio, TranslationSplitter};
pub use self::transcript::TranscriptTranslator;

// Submodules
pub mod batch;
pub mod core;
pub mod formatting;
pub mod merge;
pub mod prompts;
pub mod splitter;
pub mod transcript;
