use log::{debug, info, warn};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::acquisition::{CaptionSource, LocalCaptionSource, YtDlpCaptionSource};
use crate::app_config::{Config, SubtitleResultType, TranslationMode, UiLanguage};
use crate::captions::{extract_words, parse_cues, TimelineReconstructor, Word};
use crate::errors::{AppError, CaptionError};
use crate::file_utils::{CaptionFormat, FileManager};
use crate::language_utils;
use crate::subtitle_processor::{parse_srt_file, write_srt_file, CaptionBlock, SrtLayout};
use crate::subtitle_writer::{SubtitleFileInfo, SubtitleWriter};
use crate::translation::{
    BatchOptions, BatchTranslator, MergedSentence, RetryPolicy, SentenceMerger, TranscriptTranslator,
    TranslationCapability, TranslationService, TranslationSplitter,
};

// @module: Pipeline controller for caption translation tasks

/// Intermediate SRT written after VTT reconstruction
pub const CONVERTED_SRT_FILE_NAME: &str = "converted_subtitle.srt";

/// Progress milestones, in pipeline order
pub mod milestones {
    pub const ACQUIRED: u8 = 20;
    pub const NORMALIZED: u8 = 30;
    pub const PARSED: u8 = 40;
    pub const MERGED: u8 = 50;
    pub const TRANSLATED: u8 = 80;
    pub const WRITTEN: u8 = 90;
}

// @struct: Shared completion percentage that only moves forward
#[derive(Default)]
pub struct TaskProgress {
    percent: AtomicU8,
    observer: Option<Box<dyn Fn(u8) + Send + Sync>>,
}

impl TaskProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress that calls `observer` whenever the percentage grows
    pub fn with_observer(observer: impl Fn(u8) + Send + Sync + 'static) -> Self {
        Self {
            percent: AtomicU8::new(0),
            observer: Some(Box::new(observer)),
        }
    }

    /// Raise the percentage to `percent`; lower values are ignored
    pub fn advance(&self, percent: u8) {
        let percent = percent.min(100);
        let previous = self.percent.fetch_max(percent, Ordering::SeqCst);
        if percent > previous {
            if let Some(observer) = &self.observer {
                observer(percent);
            }
        }
    }

    pub fn get(&self) -> u8 {
        self.percent.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for TaskProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskProgress").field("percent", &self.get()).finish()
    }
}

// @struct: Cooperative cancellation checked between stages
#[derive(Debug, Default)]
pub struct CancelFlag(AtomicBool);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// @struct: Everything a stage needs to know about the task it runs for
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub task_id: String,
    // @field: Directory receiving intermediate and output files
    pub work_dir: PathBuf,
    pub origin_language: String,
    pub target_language: String,
    pub result_type: SubtitleResultType,
    pub ui_language: UiLanguage,
    pub progress: Arc<TaskProgress>,
    pub cancel: Arc<CancelFlag>,
}

impl TaskContext {
    /// Context for a new task with a fresh id, using the configured languages
    pub fn new(work_dir: impl Into<PathBuf>, config: &Config) -> Self {
        Self {
            task_id: Uuid::new_v4().to_string(),
            work_dir: work_dir.into(),
            origin_language: config.origin_language.clone(),
            target_language: config.target_language.clone(),
            result_type: config.subtitle.result_type,
            ui_language: config.subtitle.ui_language,
            progress: Arc::new(TaskProgress::new()),
            cancel: Arc::new(CancelFlag::new()),
        }
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = task_id.into();
        self
    }

    pub fn with_progress(mut self, progress: Arc<TaskProgress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancel_flag(mut self, cancel: Arc<CancelFlag>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fail with `Cancelled` if the caller asked to stop
    fn ensure_active(&self, next_stage: &str) -> Result<(), AppError> {
        if self.cancel.is_cancelled() {
            info!("[{}] Cancelled before {}", self.task_id, next_stage);
            return Err(AppError::Cancelled(self.task_id.clone()));
        }
        Ok(())
    }

    /// Whether the target side needs a translation at all
    fn needs_translation(&self) -> bool {
        !language_utils::is_no_translation(&self.target_language)
            && !language_utils::language_codes_match(&self.target_language, &self.origin_language)
    }
}

// @struct: Result of a completed run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub blocks: Vec<CaptionBlock>,
    pub subtitle_infos: Vec<SubtitleFileInfo>,
    pub bilingual_path: PathBuf,
    pub tts_source_path: PathBuf,
}

// @struct: Normalized caption input
struct NormalizedCaptions {
    srt_path: PathBuf,
    words: Vec<Word>,
}

/// Main application controller for caption translation
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Completion backend shared by every translation stage
    capability: Arc<dyn TranslationCapability>,

    // @field: Overrides the source picked from the input reference
    caption_source: Option<Arc<dyn CaptionSource>>,
}

impl Controller {
    // @method: Create a controller backed by the configured provider
    pub fn with_config(config: Config) -> anyhow::Result<Self> {
        let service = TranslationService::new(config.translation.clone())?;
        Ok(Self::with_capability(config, Arc::new(service)))
    }

    /// Create a controller around an existing completion backend
    pub fn with_capability(config: Config, capability: Arc<dyn TranslationCapability>) -> Self {
        Self {
            config,
            capability,
            caption_source: None,
        }
    }

    /// Always acquire captions through `source`
    pub fn with_caption_source(mut self, source: Arc<dyn CaptionSource>) -> Self {
        self.caption_source = Some(source);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn source_for(&self, input: &str) -> Arc<dyn CaptionSource> {
        match &self.caption_source {
            Some(source) => source.clone(),
            None if input.starts_with("http://") || input.starts_with("https://") => {
                Arc::new(YtDlpCaptionSource::new(self.config.acquisition.clone()))
            }
            None => Arc::new(LocalCaptionSource),
        }
    }

    /// Run the whole pipeline for one caption input
    ///
    /// `input` is a local `.vtt`/`.srt` path or a video link. Only acquisition,
    /// format and file errors end the run; text-level failures degrade.
    pub async fn run(&self, input: &str, ctx: &TaskContext) -> Result<PipelineOutput, AppError> {
        let start_time = std::time::Instant::now();
        info!("[{}] Starting caption task for {}", ctx.task_id, input);
        FileManager::ensure_dir(&ctx.work_dir).map_err(|e| AppError::File(format!("{:#}", e)))?;

        ctx.ensure_active("acquisition")?;
        let caption_path = self.acquire(ctx, input).await?;

        ctx.ensure_active("normalization")?;
        let normalized = self.normalize(ctx, &caption_path)?;

        ctx.ensure_active("parsing")?;
        let blocks = self.parse(ctx, &normalized.srt_path)?;

        ctx.ensure_active("merging")?;
        let sentences = self.merge(ctx, &blocks);

        ctx.ensure_active("translation")?;
        let blocks = self.translate(ctx, blocks, &sentences, &normalized.words).await;

        ctx.ensure_active("writing")?;
        let output = self.write(ctx, blocks)?;

        info!("[{}] Finished in {:.1}s", ctx.task_id, start_time.elapsed().as_secs_f64());
        Ok(output)
    }

    async fn acquire(&self, ctx: &TaskContext, input: &str) -> Result<PathBuf, AppError> {
        let path = self
            .source_for(input)
            .fetch(input, &ctx.origin_language, &ctx.work_dir)
            .await?;
        ctx.progress.advance(milestones::ACQUIRED);
        info!("[{}] Captions acquired: {}", ctx.task_id, path.display());
        Ok(path)
    }

    /// Turn the acquired file into an SRT, reconstructing VTT timelines
    fn normalize(&self, ctx: &TaskContext, path: &Path) -> Result<NormalizedCaptions, AppError> {
        let normalized = match CaptionFormat::detect(path)? {
            CaptionFormat::Srt => NormalizedCaptions {
                srt_path: path.to_path_buf(),
                words: Vec::new(),
            },
            CaptionFormat::Vtt => {
                let content = fs::read_to_string(path).map_err(CaptionError::from)?;
                let reconstructor = TimelineReconstructor::new(self.config.subtitle.overlap_padding_ms);
                let blocks = reconstructor.reconstruct(&parse_cues(&content));
                if blocks.is_empty() {
                    return Err(CaptionError::NoContent(path.display().to_string()).into());
                }

                let srt_path = ctx.work_dir.join(CONVERTED_SRT_FILE_NAME);
                write_srt_file(&srt_path, &blocks, SrtLayout::OriginOnly)
                    .map_err(|e| AppError::File(format!("{:#}", e)))?;

                NormalizedCaptions {
                    srt_path,
                    words: extract_words(&content),
                }
            }
        };

        ctx.progress.advance(milestones::NORMALIZED);
        info!(
            "[{}] Normalized captions to {} ({} timed words)",
            ctx.task_id,
            normalized.srt_path.display(),
            normalized.words.len()
        );
        Ok(normalized)
    }

    fn parse(&self, ctx: &TaskContext, srt_path: &Path) -> Result<Vec<CaptionBlock>, AppError> {
        let blocks = parse_srt_file(srt_path)?;
        if blocks.is_empty() {
            return Err(CaptionError::NoContent(srt_path.display().to_string()).into());
        }
        ctx.progress.advance(milestones::PARSED);
        info!("[{}] Parsed {} caption blocks", ctx.task_id, blocks.len());
        Ok(blocks)
    }

    fn merge(&self, ctx: &TaskContext, blocks: &[CaptionBlock]) -> Vec<MergedSentence> {
        let merger = SentenceMerger::new(self.config.subtitle.merge_gap_ms, self.config.subtitle.merge_max_chars);
        let sentences = merger.merge(blocks);
        ctx.progress.advance(milestones::MERGED);
        info!("[{}] Merged into {} sentences", ctx.task_id, sentences.len());
        sentences
    }

    async fn translate(
        &self,
        ctx: &TaskContext,
        mut blocks: Vec<CaptionBlock>,
        sentences: &[MergedSentence],
        words: &[Word],
    ) -> Vec<CaptionBlock> {
        if !ctx.needs_translation() {
            info!("[{}] Target language {} needs no translation", ctx.task_id, ctx.target_language);
            ctx.progress.advance(milestones::TRANSLATED);
            return blocks;
        }
        if blocks.iter().all(|b| !b.target_text.is_empty()) {
            info!("[{}] Input is already bilingual; keeping its translations", ctx.task_id);
            ctx.progress.advance(milestones::TRANSLATED);
            return blocks;
        }

        let common = &self.config.translation.common;
        let target_name = language_utils::standard_language_name(&ctx.target_language);

        if common.mode == TranslationMode::WholeTranscript {
            if let Some(retimed) = self.translate_transcript(ctx, &blocks, words, &target_name).await {
                ctx.progress.advance(milestones::TRANSLATED);
                return retimed;
            }
        }

        let texts: Vec<String> = sentences.iter().map(|s| s.text.clone()).collect();
        let translator = BatchTranslator::new(self.capability.clone(), BatchOptions::from(common));
        let progress = ctx.progress.clone();
        let items = translator
            .translate_sentences(&texts, &target_name, |done, total| {
                let span = (milestones::TRANSLATED - milestones::MERGED - 1) as usize;
                progress.advance(milestones::MERGED + (span * done / total.max(1)) as u8);
            })
            .await;

        let splitter = TranslationSplitter::new(self.capability.clone(), &target_name, common.max_parallel);
        splitter
            .apply_translations(&mut blocks, sentences, &items, &ctx.origin_language, &ctx.target_language)
            .await;

        ctx.progress.advance(milestones::TRANSLATED);
        info!(
            "[{}] Translated {} sentences ({} kept original)",
            ctx.task_id,
            items.len(),
            items.iter().filter(|i| i.fell_back).count()
        );
        blocks
    }

    /// Whole-transcript translation, or None when per-sentence mode must take over
    async fn translate_transcript(
        &self,
        ctx: &TaskContext,
        blocks: &[CaptionBlock],
        words: &[Word],
        target_name: &str,
    ) -> Option<Vec<CaptionBlock>> {
        if words.is_empty() {
            warn!("[{}] No word timeline available; falling back to per-sentence translation", ctx.task_id);
            return None;
        }

        let common = &self.config.translation.common;
        let translator = TranscriptTranslator::new(
            self.capability.clone(),
            RetryPolicy::from(common),
            self.config.subtitle.max_block_chars,
            self.config.subtitle.overlap_padding_ms,
            common.max_parallel,
        );

        match translator
            .translate(blocks, words, target_name, &ctx.origin_language, &ctx.target_language)
            .await
        {
            Ok(retimed) if !retimed.is_empty() => {
                info!("[{}] Whole-transcript translation produced {} blocks", ctx.task_id, retimed.len());
                Some(retimed)
            }
            Ok(_) => {
                warn!("[{}] Whole-transcript translation was empty; falling back to per-sentence", ctx.task_id);
                None
            }
            Err(e) => {
                warn!("[{}] Whole-transcript translation failed ({}); falling back to per-sentence", ctx.task_id, e);
                None
            }
        }
    }

    fn write(&self, ctx: &TaskContext, blocks: Vec<CaptionBlock>) -> Result<PipelineOutput, AppError> {
        let writer = SubtitleWriter::new(&ctx.origin_language, &ctx.target_language, ctx.result_type, ctx.ui_language);
        let written = writer
            .write_all(&ctx.work_dir, &blocks)
            .map_err(|e| AppError::File(format!("{:#}", e)))?;

        ctx.progress.advance(milestones::WRITTEN);
        debug!("[{}] Manifest: {:?}", ctx.task_id, written.subtitle_infos);

        Ok(PipelineOutput {
            blocks,
            subtitle_infos: written.subtitle_infos,
            bilingual_path: written.bilingual_path,
            tts_source_path: written.tts_source_path,
        })
    }
}
