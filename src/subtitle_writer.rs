use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::app_config::{SubtitleResultType, UiLanguage};
use crate::language_utils;
use crate::subtitle_processor::{write_srt_file, CaptionBlock, SrtLayout};

// @module: Output subtitle files and their manifest

/// Bilingual output file name inside the task directory
pub const BILINGUAL_SRT_FILE_NAME: &str = "bilingual_srt.srt";

/// Origin-only output file name inside the task directory
pub const ORIGIN_SRT_FILE_NAME: &str = "origin_language_srt.srt";

/// Target-only output file name inside the task directory
pub const TARGET_SRT_FILE_NAME: &str = "target_language_srt.srt";

/// Manifest language identifier of the bilingual file
pub const BILINGUAL_IDENTIFIER: &str = "bilingual";

// @struct: One written subtitle file as shown to users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleFileInfo {
    // @field: Path of the written file
    pub path: PathBuf,

    // @field: Language code, or "bilingual"
    pub language_identifier: String,

    // @field: Display name in the UI language
    pub name: String,
}

// @struct: Files produced for one run
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenSubtitles {
    pub subtitle_infos: Vec<SubtitleFileInfo>,
    pub bilingual_path: PathBuf,
    // @field: Default input for a later speech synthesis step
    pub tts_source_path: PathBuf,
}

/// Display name of a single-language file
fn monolingual_name(language: &str, ui_language: UiLanguage) -> String {
    let language_name = language_utils::standard_language_name(language);
    match ui_language {
        UiLanguage::English => format!("{} Subtitle", language_name),
        UiLanguage::SimplifiedChinese => format!("{} 单语字幕", language_name),
    }
}

fn bilingual_name(ui_language: UiLanguage) -> String {
    match ui_language {
        UiLanguage::English => "Bilingual Subtitle".to_string(),
        UiLanguage::SimplifiedChinese => "双语字幕".to_string(),
    }
}

// @struct: Writes the origin, target and bilingual variants
#[derive(Debug, Clone)]
pub struct SubtitleWriter {
    origin_language: String,
    target_language: String,
    result_type: SubtitleResultType,
    ui_language: UiLanguage,
}

impl SubtitleWriter {
    pub fn new(
        origin_language: impl Into<String>,
        target_language: impl Into<String>,
        result_type: SubtitleResultType,
        ui_language: UiLanguage,
    ) -> Self {
        Self {
            origin_language: origin_language.into(),
            target_language: target_language.into(),
            result_type,
            ui_language,
        }
    }

    /// Whether a separate target-language file is produced
    pub fn writes_target_file(&self) -> bool {
        !language_utils::is_no_translation(&self.target_language)
            && !language_utils::language_codes_match(&self.target_language, &self.origin_language)
    }

    fn bilingual_layout(&self) -> SrtLayout {
        SrtLayout::Bilingual {
            target_first: self.result_type == SubtitleResultType::BilingualTranslationOnTop,
        }
    }

    /// Write every variant into `task_dir` and describe them
    ///
    /// The bilingual and origin files are always written. The manifest lists
    /// the origin file, then the target file when it was written and the
    /// result type wants it, then the bilingual file for bilingual result types.
    pub fn write_all(&self, task_dir: &Path, blocks: &[CaptionBlock]) -> Result<WrittenSubtitles> {
        let bilingual_path = task_dir.join(BILINGUAL_SRT_FILE_NAME);
        write_srt_file(&bilingual_path, blocks, self.bilingual_layout())?;

        let origin_path = task_dir.join(ORIGIN_SRT_FILE_NAME);
        write_srt_file(&origin_path, blocks, SrtLayout::OriginOnly)?;

        let target_path = if self.writes_target_file() {
            let path = task_dir.join(TARGET_SRT_FILE_NAME);
            write_srt_file(&path, blocks, SrtLayout::TargetOnly)?;
            Some(path)
        } else {
            None
        };

        let mut subtitle_infos = vec![SubtitleFileInfo {
            path: origin_path,
            language_identifier: self.origin_language.clone(),
            name: monolingual_name(&self.origin_language, self.ui_language),
        }];

        if self.result_type != SubtitleResultType::OriginOnly {
            if let Some(path) = target_path {
                subtitle_infos.push(SubtitleFileInfo {
                    path,
                    language_identifier: self.target_language.clone(),
                    name: monolingual_name(&self.target_language, self.ui_language),
                });
            }
        }

        if self.result_type.is_bilingual() {
            subtitle_infos.push(SubtitleFileInfo {
                path: bilingual_path.clone(),
                language_identifier: BILINGUAL_IDENTIFIER.to_string(),
                name: bilingual_name(self.ui_language),
            });
        }

        info!("Wrote {} subtitle files to {}", subtitle_infos.len(), task_dir.display());
        Ok(WrittenSubtitles {
            subtitle_infos,
            tts_source_path: bilingual_path.clone(),
            bilingual_path,
        })
    }
}
