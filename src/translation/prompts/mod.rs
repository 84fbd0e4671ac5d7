/*!
 * Prompt construction for subtitle translation.
 *
 * This module provides:
 * - Prompt templates for sentence, split and transcript requests
 * - The JSON reply shapes the model is asked to produce
 */

pub mod templates;

// Re-export main types
pub use templates::{
    SentenceContext, SplitReply, TranscriptReply, TranscriptSentence, TranslationPromptBuilder,
};
