// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use rollsub::app_config::{self, Config, SubtitleResultType, TranslationMode, TranslationProvider};
use rollsub::app_controller::{Controller, TaskContext, TaskProgress};
use rollsub::subtitle_writer::BILINGUAL_SRT_FILE_NAME;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Ollama,
    OpenAI,
    Anthropic,
    LMStudio,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
            CliTranslationProvider::LMStudio => TranslationProvider::LMStudio,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum CliResultType {
    OriginOnly,
    TargetOnly,
    TranslationOnTop,
    TranslationOnBottom,
}

impl From<CliResultType> for SubtitleResultType {
    fn from(cli_type: CliResultType) -> Self {
        match cli_type {
            CliResultType::OriginOnly => SubtitleResultType::OriginOnly,
            CliResultType::TargetOnly => SubtitleResultType::TargetOnly,
            CliResultType::TranslationOnTop => SubtitleResultType::BilingualTranslationOnTop,
            CliResultType::TranslationOnBottom => SubtitleResultType::BilingualTranslationOnBottom,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationMode {
    PerSentence,
    WholeTranscript,
}

impl From<CliTranslationMode> for TranslationMode {
    fn from(cli_mode: CliTranslationMode) -> Self {
        match cli_mode {
            CliTranslationMode::PerSentence => TranslationMode::PerSentence,
            CliTranslationMode::WholeTranscript => TranslationMode::WholeTranscript,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a caption file or video link (default command)
    Translate(TranslateArgs),

    /// Generate shell completions for rollsub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Local .vtt/.srt file or YouTube link
    #[arg(value_name = "INPUT")]
    input: String,

    #[command(flatten)]
    options: TranslateOptions,
}

/// Options shared by the top-level command and `translate`
#[derive(Args, Debug, Clone)]
struct TranslateOptions {
    /// Directory receiving the subtitle files
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Caption language code (e.g., 'en', 'ja', 'zh_cn')
    #[arg(short = 's', long)]
    origin_language: Option<String>,

    /// Target language code, or 'none' to skip translation
    #[arg(short, long)]
    target_language: Option<String>,

    /// Primary subtitle variant
    #[arg(short, long, value_enum)]
    result_type: Option<CliResultType>,

    /// Translate sentence by sentence or as one transcript
    #[arg(long, value_enum)]
    mode: Option<CliTranslationMode>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// rollsub - bilingual subtitles from rolling auto-captions
///
/// Rebuilds clean caption blocks from rolling auto-generated captions and
/// translates them with an LLM provider (Ollama, OpenAI, Anthropic, LM Studio).
#[derive(Parser, Debug)]
#[command(name = "rollsub")]
#[command(version)]
#[command(about = "Bilingual subtitles from rolling auto-captions")]
#[command(long_about = "rollsub turns rolling auto-captions into clean SRT blocks and translates them with AI providers.

EXAMPLES:
    rollsub talk.en.vtt                                  # Translate using default config
    rollsub -f talk.en.vtt                               # Force overwrite existing files
    rollsub -p openai -m gpt-4o-mini talk.en.vtt         # Use specific provider and model
    rollsub -s en -t ja https://youtu.be/VIDEO_ID        # Fetch captions with yt-dlp and translate
    rollsub -r translation-on-top --mode whole-transcript talk.en.vtt
    rollsub completions bash > rollsub.bash              # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Local .vtt/.srt file or YouTube link
    #[arg(value_name = "INPUT")]
    input: Option<String>,

    #[command(flatten)]
    options: TranslateOptions,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    fn prefix_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "❌ "),
            Level::Warn => ("1;33", "🚧 "),
            Level::Info => ("1;32", " "),
            Level::Debug => ("1;36", "🔍 "),
            Level::Trace => ("1;35", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (colour, emoji) = Self::prefix_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                colour, now, emoji, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the max level is narrowed once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "rollsub", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args.input, args.options).await,
        None => {
            let input = cli
                .input
                .ok_or_else(|| anyhow!("INPUT is required when no subcommand is specified"))?;
            run_translate(input, cli.options).await
        }
    }
}

/// Apply command line overrides on top of the loaded configuration
fn apply_overrides(config: &mut Config, options: &TranslateOptions) {
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        match config.translation.get_active_provider_config_mut() {
            Some(provider_config) => provider_config.model = model.clone(),
            None => warn!(
                "No provider entry for {} in config; ignoring --model",
                config.translation.provider
            ),
        }
    }
    if let Some(origin) = &options.origin_language {
        config.origin_language = origin.clone();
    }
    if let Some(target) = &options.target_language {
        config.target_language = target.clone();
    }
    if let Some(result_type) = &options.result_type {
        config.subtitle.result_type = result_type.clone().into();
    }
    if let Some(mode) = &options.mode {
        config.translation.common.mode = mode.clone().into();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}%"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style.progress_chars("█▓▒░"));
    bar
}

async fn run_translate(input: String, options: TranslateOptions) -> Result<()> {
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config_path)?;
    apply_overrides(&mut config, &options);
    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    let bilingual_path = options.output_dir.join(BILINGUAL_SRT_FILE_NAME);
    if bilingual_path.exists() && !options.force_overwrite {
        warn!("Output file already exists: {:?}. Use -f to force overwrite.", bilingual_path);
        return Ok(());
    }

    info!(
        "rollsub: {} - {} ({} -> {})",
        config.translation.provider.display_name(),
        config.translation.get_model(),
        config.origin_language,
        config.target_language
    );

    let controller = Controller::with_config(config.clone())?;

    let bar = progress_bar();
    let observer_bar = bar.clone();
    let progress = Arc::new(TaskProgress::with_observer(move |percent| {
        observer_bar.set_position(u64::from(percent));
    }));
    let ctx = TaskContext::new(options.output_dir.clone(), &config).with_progress(progress);

    let result = controller.run(&input, &ctx).await;
    match result {
        Ok(output) => {
            bar.finish_with_message("done");
            for subtitle in &output.subtitle_infos {
                info!("{}: {}", subtitle.name, subtitle.path.display());
            }
            Ok(())
        }
        Err(e) => {
            bar.abandon_with_message("failed");
            Err(anyhow!(e)).context(format!("Task {} failed", ctx.task_id))
        }
    }
}
