/*!
 * Caption acquisition.
 *
 * A `CaptionSource` turns a video reference into a caption file inside the
 * task directory. Local files are copied in; YouTube links are fetched with
 * yt-dlp, retried with a linear backoff.
 */

use async_trait::async_trait;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use url::Url;

use crate::app_config::AcquisitionConfig;
use crate::errors::CaptionError;
use crate::file_utils::{CaptionFormat, FileManager};
use crate::language_utils;

/// Anything that can provide a raw caption file
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Place a caption file for `video_ref` in `work_dir` and return its path
    async fn fetch(&self, video_ref: &str, origin_language: &str, work_dir: &Path) -> Result<PathBuf, CaptionError>;
}

/// Caption file already on disk
#[derive(Debug, Clone, Default)]
pub struct LocalCaptionSource;

#[async_trait]
impl CaptionSource for LocalCaptionSource {
    async fn fetch(&self, video_ref: &str, _origin_language: &str, work_dir: &Path) -> Result<PathBuf, CaptionError> {
        let source = Path::new(video_ref);
        if !FileManager::file_exists(source) {
            return Err(CaptionError::Acquisition {
                attempts: 1,
                message: format!("caption file not found: {}", video_ref),
            });
        }
        CaptionFormat::detect(source)?;

        let file_name = source.file_name().ok_or_else(|| CaptionError::Acquisition {
            attempts: 1,
            message: format!("not a file path: {}", video_ref),
        })?;
        let destination = work_dir.join(file_name);
        if destination != source {
            FileManager::copy_file(source, &destination).map_err(|e| CaptionError::Acquisition {
                attempts: 1,
                message: e.to_string(),
            })?;
        }

        debug!("Using local caption file {}", destination.display());
        Ok(destination)
    }
}

/// Video id of a YouTube link, if it is one
pub fn youtube_video_id(link: &str) -> Option<String> {
    if !link.contains("youtube.com") && !link.contains("youtu.be") {
        return None;
    }
    let url = Url::parse(link).ok()?;

    if url.host_str()?.ends_with("youtu.be") {
        return url.path_segments()?.next().filter(|id| !id.is_empty()).map(str::to_string);
    }
    if let Some((_, id)) = url.query_pairs().find(|(key, _)| key == "v") {
        return Some(id.into_owned()).filter(|id| !id.is_empty());
    }
    // Shorts and embeds carry the id as the last path segment
    let mut segments = url.path_segments()?;
    match segments.next() {
        Some("shorts") | Some("embed") | Some("live") => segments.next().filter(|id| !id.is_empty()).map(str::to_string),
        _ => None,
    }
}

/// Auto-caption download through yt-dlp
#[derive(Debug, Clone)]
pub struct YtDlpCaptionSource {
    config: AcquisitionConfig,
    /// Attempt n waits n times this before retrying
    retry_delay: Duration,
}

impl YtDlpCaptionSource {
    pub fn new(config: AcquisitionConfig) -> Self {
        Self {
            config,
            retry_delay: Duration::from_secs(1),
        }
    }

    /// Override the backoff unit
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Command line arguments for one download
    pub fn build_args(&self, link: &str, platform_language: &str, work_dir: &Path) -> Vec<String> {
        let output_template = work_dir.join("%(title)s.%(ext)s");
        let mut args = vec![
            "--write-auto-subs".to_string(),
            "--sub-langs".to_string(),
            platform_language.to_string(),
            "--skip-download".to_string(),
            "-o".to_string(),
            output_template.to_string_lossy().into_owned(),
            link.to_string(),
        ];

        if let Some(proxy) = self.config.proxy.as_deref().filter(|p| !p.is_empty()) {
            args.extend(["--proxy".to_string(), proxy.to_string()]);
        }
        if let Some(cookies) = self.config.cookies_path.as_deref().filter(|c| !c.is_empty()) {
            args.extend(["--cookies".to_string(), cookies.to_string()]);
        }
        if let Some(ffmpeg) = self.config.ffmpeg_path.as_deref().filter(|f| !f.is_empty()) {
            args.extend(["--ffmpeg-location".to_string(), ffmpeg.to_string()]);
        }
        args
    }

    async fn run_once(&self, args: &[String]) -> Result<(), String> {
        let output = Command::new(&self.config.ytdlp_path)
            .args(args)
            .output()
            .await
            .map_err(|e| format!("failed to start {}: {}", self.config.ytdlp_path, e))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(format!(
                "{} exited with {}: {}",
                self.config.ytdlp_path,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ))
        }
    }
}

#[async_trait]
impl CaptionSource for YtDlpCaptionSource {
    async fn fetch(&self, video_ref: &str, origin_language: &str, work_dir: &Path) -> Result<PathBuf, CaptionError> {
        let video_id = youtube_video_id(video_ref).ok_or_else(|| CaptionError::Acquisition {
            attempts: 0,
            message: format!("not a YouTube link: {}", video_ref),
        })?;

        let platform_language = language_utils::map_language_for_platform(origin_language);
        let args = self.build_args(video_ref, &platform_language, work_dir);
        let max_attempts = self.config.max_attempts.max(1);

        let mut last_error = String::new();
        for attempt in 1..=max_attempts {
            match self.run_once(&args).await {
                Ok(()) => {
                    last_error.clear();
                    break;
                }
                Err(e) => {
                    warn!("Caption download for {} failed (attempt {}/{}): {}", video_id, attempt, max_attempts, e);
                    last_error = e;
                    if attempt < max_attempts {
                        tokio::time::sleep(self.retry_delay * attempt).await;
                    }
                }
            }
        }
        if !last_error.is_empty() {
            return Err(CaptionError::Acquisition { attempts: max_attempts, message: last_error });
        }

        let path = FileManager::find_caption_file(work_dir, &platform_language).ok_or_else(|| CaptionError::Acquisition {
            attempts: max_attempts,
            message: format!("no {} caption track was produced for {}", platform_language, video_id),
        })?;

        info!("Downloaded captions for {} to {}", video_id, path.display());
        Ok(path)
    }
}
