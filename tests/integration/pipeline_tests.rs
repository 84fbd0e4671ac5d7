/*!
 * End-to-end pipeline tests against the mock provider
 */

use anyhow::Result;
use std::fs;
use std::sync::Arc;

use rollsub::app_config::{Config, SubtitleResultType, TranslationMode};
use rollsub::app_controller::{CancelFlag, Controller, TaskContext, CONVERTED_SRT_FILE_NAME};
use rollsub::errors::{AppError, CaptionError};
use rollsub::providers::mock::MockProvider;
use rollsub::subtitle_writer::{BILINGUAL_SRT_FILE_NAME, ORIGIN_SRT_FILE_NAME, TARGET_SRT_FILE_NAME};
use crate::common::{self, ROLLING_VTT};

fn test_config(target_language: &str) -> Config {
    let mut config = Config {
        origin_language: "en".to_string(),
        target_language: target_language.to_string(),
        ..Config::default()
    };
    config.translation.common.retry_backoff_ms = 1;
    config
}

#[tokio::test]
async fn test_run_withRollingVtt_shouldWriteAllSubtitleFiles() -> Result<()> {
    let input_dir = common::create_temp_dir()?;
    let work_dir = common::create_temp_dir()?;
    let input = common::create_test_file(input_dir.path(), "talk.en.vtt", ROLLING_VTT)?;

    let config = test_config("fr");
    let provider = MockProvider::working();
    let controller = Controller::with_capability(config.clone(), Arc::new(provider.clone()));
    let ctx = TaskContext::new(work_dir.path(), &config);

    let output = controller.run(input.to_str().unwrap(), &ctx).await?;

    assert_eq!(output.blocks.len(), 2);
    assert!(output.blocks.iter().all(|b| !b.target_text.is_empty()));
    assert_eq!(output.blocks[0].origin_text, "we went home");
    assert_eq!(ctx.progress.get(), 90);

    assert!(work_dir.path().join(CONVERTED_SRT_FILE_NAME).is_file());
    assert!(work_dir.path().join(ORIGIN_SRT_FILE_NAME).is_file());
    assert!(work_dir.path().join(TARGET_SRT_FILE_NAME).is_file());
    assert_eq!(output.bilingual_path, work_dir.path().join(BILINGUAL_SRT_FILE_NAME));
    assert_eq!(output.tts_source_path, output.bilingual_path);

    let identifiers: Vec<&str> = output.subtitle_infos.iter().map(|i| i.language_identifier.as_str()).collect();
    assert_eq!(identifiers, vec!["en", "fr", "bilingual"]);

    let bilingual = fs::read_to_string(&output.bilingual_path)?;
    assert!(bilingual.starts_with("1\n00:00:00,500 --> "));
    assert!(bilingual.contains("\nwe went home\n"));
    // One sentence translation plus one split request
    assert_eq!(provider.request_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_run_withWholeTranscriptMode_shouldRetimeOnWords() -> Result<()> {
    let input_dir = common::create_temp_dir()?;
    let work_dir = common::create_temp_dir()?;
    let input = common::create_test_file(input_dir.path(), "talk.en.vtt", ROLLING_VTT)?;

    let mut config = test_config("fr");
    config.translation.common.mode = TranslationMode::WholeTranscript;
    config.subtitle.result_type = SubtitleResultType::BilingualTranslationOnTop;
    let provider = MockProvider::working().with_custom_response(|_| {
        r#"```json
{"sentences": [
  {"origin": "We went home.", "target": "Nous sommes rentrés."},
  {"origin": "And then slept.", "target": "Puis dormi."}
]}
```"#
            .to_string()
    });
    let controller = Controller::with_capability(config.clone(), Arc::new(provider.clone()));
    let ctx = TaskContext::new(work_dir.path(), &config);

    let output = controller.run(input.to_str().unwrap(), &ctx).await?;

    assert_eq!(provider.request_count(), 1);
    assert_eq!(output.blocks.len(), 2);
    assert_eq!((output.blocks[0].start_ms, output.blocks[0].end_ms), (500, 2_000));
    assert_eq!((output.blocks[1].start_ms, output.blocks[1].end_ms), (2_010, 4_000));
    assert_eq!(output.blocks[1].target_text, "Puis dormi.");

    let bilingual = fs::read_to_string(&output.bilingual_path)?;
    assert!(bilingual.contains("Nous sommes rentrés.\nWe went home.\n"));
    Ok(())
}

#[tokio::test]
async fn test_run_withWholeTranscriptModeOnSrt_shouldFallBackToPerSentence() -> Result<()> {
    let input_dir = common::create_temp_dir()?;
    let work_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(input_dir.path(), "talk.srt")?;

    let mut config = test_config("de");
    config.translation.common.mode = TranslationMode::WholeTranscript;
    let provider = MockProvider::working();
    let controller = Controller::with_capability(config.clone(), Arc::new(provider.clone()));
    let ctx = TaskContext::new(work_dir.path(), &config);

    let output = controller.run(input.to_str().unwrap(), &ctx).await?;

    // SRT input has no word timeline, so each block is translated on its own
    assert_eq!(output.blocks.len(), 3);
    assert_eq!(output.blocks[0].target_text, "[TRANSLATED] This is a test subtitle.");
    assert_eq!(provider.request_count(), 3);
    assert!(!work_dir.path().join(CONVERTED_SRT_FILE_NAME).exists());
    Ok(())
}

#[tokio::test]
async fn test_run_withBilingualSrt_shouldKeepExistingTranslations() -> Result<()> {
    let input_dir = common::create_temp_dir()?;
    let work_dir = common::create_temp_dir()?;
    let input = common::create_test_file(
        input_dir.path(),
        "done.srt",
        "1\n00:00:01,000 --> 00:00:02,000\nHello\nHallo\n\n2\n00:00:03,000 --> 00:00:04,000\nWorld\nWelt\n",
    )?;

    let config = test_config("de");
    let provider = MockProvider::working();
    let controller = Controller::with_capability(config.clone(), Arc::new(provider.clone()));
    let ctx = TaskContext::new(work_dir.path(), &config);

    let output = controller.run(input.to_str().unwrap(), &ctx).await?;

    assert_eq!(provider.request_count(), 0);
    assert_eq!(output.blocks[1].target_text, "Welt");
    Ok(())
}

#[tokio::test]
async fn test_run_withNoTranslationTarget_shouldSkipProviderAndTargetFile() -> Result<()> {
    let input_dir = common::create_temp_dir()?;
    let work_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(input_dir.path(), "talk.srt")?;

    let config = test_config("none");
    let provider = MockProvider::working();
    let controller = Controller::with_capability(config.clone(), Arc::new(provider.clone()));
    let ctx = TaskContext::new(work_dir.path(), &config);

    let output = controller.run(input.to_str().unwrap(), &ctx).await?;

    assert_eq!(provider.request_count(), 0);
    assert!(output.blocks.iter().all(|b| b.target_text.is_empty()));
    assert!(!work_dir.path().join(TARGET_SRT_FILE_NAME).exists());
    Ok(())
}

#[tokio::test]
async fn test_run_withFailingProvider_shouldStillWriteOriginText() -> Result<()> {
    let input_dir = common::create_temp_dir()?;
    let work_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(input_dir.path(), "talk.srt")?;

    let config = test_config("fr");
    let controller = Controller::with_capability(config.clone(), Arc::new(MockProvider::failing()));
    let ctx = TaskContext::new(work_dir.path(), &config);

    let output = controller.run(input.to_str().unwrap(), &ctx).await?;

    for block in &output.blocks {
        assert_eq!(block.target_text, block.origin_text);
    }
    Ok(())
}

#[tokio::test]
async fn test_run_withCancelledTask_shouldStopBeforeAcquisition() -> Result<()> {
    let input_dir = common::create_temp_dir()?;
    let work_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(input_dir.path(), "talk.srt")?;

    let config = test_config("fr");
    let provider = MockProvider::working();
    let controller = Controller::with_capability(config.clone(), Arc::new(provider.clone()));
    let cancel = Arc::new(CancelFlag::new());
    cancel.cancel();
    let ctx = TaskContext::new(work_dir.path(), &config)
        .with_task_id("task-1")
        .with_cancel_flag(cancel);

    let result = controller.run(input.to_str().unwrap(), &ctx).await;

    assert!(matches!(result, Err(AppError::Cancelled(ref id)) if id == "task-1"));
    assert_eq!(provider.request_count(), 0);
    assert!(!work_dir.path().join(BILINGUAL_SRT_FILE_NAME).exists());
    Ok(())
}

#[tokio::test]
async fn test_run_withMissingOrUnsupportedInput_shouldReturnCaptionErrors() -> Result<()> {
    let input_dir = common::create_temp_dir()?;
    let work_dir = common::create_temp_dir()?;
    let config = test_config("fr");
    let controller = Controller::with_capability(config.clone(), Arc::new(MockProvider::working()));
    let ctx = TaskContext::new(work_dir.path(), &config);

    let missing = input_dir.path().join("nothing.vtt");
    let result = controller.run(missing.to_str().unwrap(), &ctx).await;
    assert!(matches!(result, Err(AppError::Caption(CaptionError::Acquisition { .. }))));

    let empty = common::create_test_file(input_dir.path(), "empty.vtt", "WEBVTT\n\n")?;
    let result = controller.run(empty.to_str().unwrap(), &ctx).await;
    assert!(matches!(result, Err(AppError::Caption(CaptionError::NoContent(_)))));
    Ok(())
}
