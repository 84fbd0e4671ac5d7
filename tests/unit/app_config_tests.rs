/*!
 * Tests for configuration loading
 */

use anyhow::Result;

use rollsub::app_config::{Config, SubtitleResultType, TranslationMode, TranslationProvider};
use crate::common;

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.is_file());
    assert_eq!(config.origin_language, "en");
    assert_eq!(config.translation.provider, TranslationProvider::Ollama);
    config.validate()?;
    Ok(())
}

#[test]
fn test_loadOrCreate_withExistingFile_shouldReadIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{
            "origin_language": "ja",
            "target_language": "none",
            "translation": { "provider": "lmstudio", "common": { "mode": "whole_transcript" } },
            "subtitle": { "result_type": "target_only" }
        }"#,
    )?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.origin_language, "ja");
    assert_eq!(config.translation.provider, TranslationProvider::LMStudio);
    assert_eq!(config.translation.common.mode, TranslationMode::WholeTranscript);
    assert_eq!(config.subtitle.result_type, SubtitleResultType::TargetOnly);
    assert_eq!(config.subtitle.merge_gap_ms, 200);
    config.validate()?;
    Ok(())
}

#[test]
fn test_loadOrCreate_withBrokenJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;

    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}

#[test]
fn test_validate_withUnknownLanguage_shouldFail() {
    let config = Config {
        target_language: "xx_yy".to_string(),
        ..Config::default()
    };
    assert!(config.validate().is_err());
}
