/*!
 * # rollsub - bilingual subtitles from rolling auto-captions
 *
 * Auto-generated captions arrive as a rolling display: each cue repeats the
 * previous line while the next one is typed in. This library rebuilds a clean
 * caption timeline from such tracks and translates it with an LLM provider.
 *
 * ## Pipeline
 *
 * 1. Acquire a caption file (local path, or yt-dlp for YouTube links)
 * 2. Reconstruct non-overlapping blocks from rolling WebVTT cues
 * 3. Merge blocks into sentences
 * 4. Translate sentences concurrently, then split translations back onto blocks
 * 5. Write origin, target and bilingual SRT files
 *
 * ## Architecture
 *
 * - `captions`: WebVTT cues, word timings, timecodes and timeline reconstruction
 * - `subtitle_processor`: SRT blocks, parsing and formatting
 * - `translation`: sentence merging and AI-powered translation:
 *   - `translation::core`: provider selection and the retry policy
 *   - `translation::batch`: concurrent per-sentence translation
 *   - `translation::splitter`: distributing translations over blocks
 *   - `translation::transcript`: whole-transcript translation with re-timing
 *   - `translation::formatting`: clean-up for logographic languages
 * - `providers`: Ollama, OpenAI-compatible and Anthropic clients, plus a mock
 * - `acquisition`: caption sources
 * - `subtitle_writer`: output files and their manifest
 * - `app_controller`: the task pipeline, progress and cancellation
 * - `app_config`, `language_utils`, `file_utils`, `errors`: supporting pieces
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod acquisition;
pub mod app_config;
pub mod app_controller;
pub mod captions;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod subtitle_processor;
pub mod subtitle_writer;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{CancelFlag, Controller, PipelineOutput, TaskContext, TaskProgress};
pub use errors::{AppError, CaptionError, ProviderError, TranslationError};
pub use subtitle_processor::CaptionBlock;
pub use translation::{TranslationCapability, TranslationService};
