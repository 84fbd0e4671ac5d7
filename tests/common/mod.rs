/*!
 * Common test utilities for the rollsub test suite
 */

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

use rollsub::errors::ProviderError;
use rollsub::providers::mock::MockProvider;
use rollsub::translation::TranslationCapability;

/// Rolling auto-caption track with two settled lines
pub const ROLLING_VTT: &str = "WEBVTT
Kind: captions
Language: en

00:00:00.500 --> 00:00:02.000 align:start position:0%
we went<00:00:01.000><c> home</c>

00:00:02.000 --> 00:00:02.010 align:start position:0%
we went home

00:00:02.010 --> 00:00:04.000 align:start position:0%
we went home
and then<00:00:03.000><c> slept</c>

00:00:04.000 --> 00:00:04.010 align:start position:0%
and then slept

00:00:04.010 --> 00:00:06.000 align:start position:0%
and then slept
";

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a sample monolingual subtitle file for testing
pub fn create_test_subtitle(dir: &Path, filename: &str) -> Result<PathBuf> {
    let content = "1
00:00:01,000 --> 00:00:04,000
This is a test subtitle.

2
00:00:05,000 --> 00:00:09,000
It contains multiple entries.

3
00:00:10,000 --> 00:00:14,000
For testing purposes.
";
    create_test_file(dir, filename, content)
}

/// Capability that answers each sentence after its own delay
///
/// Records the order in which answers complete, so tests can check that
/// results are reassembled in input order regardless of completion order.
pub struct DelayedCapability {
    delays_ms: HashMap<String, u64>,
    completed: Mutex<Vec<String>>,
}

impl DelayedCapability {
    pub fn new(delays_ms: &[(&str, u64)]) -> Self {
        Self {
            delays_ms: delays_ms.iter().map(|(text, ms)| (text.to_string(), *ms)).collect(),
            completed: Mutex::new(Vec::new()),
        }
    }

    pub fn completion_order(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranslationCapability for DelayedCapability {
    async fn complete_text(&self, prompt: &str) -> Result<String, ProviderError> {
        let text = MockProvider::text_under_translation(prompt).unwrap_or(prompt).to_string();
        let delay = self.delays_ms.get(&text).copied().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.completed.lock().unwrap().push(text.clone());
        Ok(format!("<{}>", text))
    }
}
