use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::CaptionError;

// @module: File and directory utilities

// @enum: Caption file formats the pipeline can read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionFormat {
    Vtt,
    Srt,
}

impl CaptionFormat {
    // @detects: Format from the file extension, case-insensitively
    pub fn detect<P: AsRef<Path>>(path: P) -> Result<Self, CaptionError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "vtt" => Ok(Self::Vtt),
            "srt" => Ok(Self::Srt),
            _ => Err(CaptionError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// First caption file under `dir` whose name mentions `language`
    ///
    /// Only `.vtt` and `.srt` files qualify; the walk stops at the first hit.
    pub fn find_caption_file<P: AsRef<Path>>(dir: P, language: &str) -> Option<PathBuf> {
        WalkDir::new(dir.as_ref())
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .find(|entry| {
                let name = entry.file_name().to_string_lossy();
                name.contains(language) && (name.ends_with(".vtt") || name.ends_with(".srt"))
            })
            .map(|entry| entry.into_path())
    }

    /// Copy a file from one location to another, ensuring the target directory exists
    pub fn copy_file<P1: AsRef<Path>, P2: AsRef<Path>>(from: P1, to: P2) -> Result<()> {
        let from = from.as_ref();
        let to = to.as_ref();

        if !from.exists() {
            return Err(anyhow::anyhow!("Source file does not exist: {:?}", from));
        }

        if let Some(parent) = to.parent() {
            Self::ensure_dir(parent)?;
        }

        fs::copy(from, to).with_context(|| format!("Failed to copy {:?} to {:?}", from, to))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captionFormat_detect_shouldUseExtension() {
        assert_eq!(CaptionFormat::detect("talk.en.vtt").unwrap(), CaptionFormat::Vtt);
        assert_eq!(CaptionFormat::detect("talk.SRT").unwrap(), CaptionFormat::Srt);
        assert!(matches!(CaptionFormat::detect("talk.ass"), Err(CaptionError::UnsupportedFormat(_))));
        assert!(CaptionFormat::detect("no_extension").is_err());
    }

    #[test]
    fn test_findCaptionFile_shouldMatchLanguageAndExtension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("talk.en.json"), "{}").unwrap();
        fs::write(dir.path().join("talk.de.vtt"), "WEBVTT").unwrap();
        fs::write(dir.path().join("talk.en.vtt"), "WEBVTT").unwrap();

        let found = FileManager::find_caption_file(dir.path(), "en").unwrap();
        assert_eq!(found.file_name().unwrap(), "talk.en.vtt");
        assert!(FileManager::find_caption_file(dir.path(), "fr").is_none());
    }
}
