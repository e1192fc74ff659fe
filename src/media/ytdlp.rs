/*!
 * yt-dlp-backed video and caption retrieval.
 */

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use crate::errors::MediaError;
use crate::file_utils::FileManager;
use crate::subtitle_processor::{self, Cue};
use super::ffmpeg::FfmpegRunner;
use super::{FormatListing, SubtitleSource, VideoFormat, VideoSource};

const TOOL: &str = "yt-dlp";

// @const: "[download]  42.3% of 10.00MiB at ..." progress line
static PROGRESS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[download\]\s+(\d+(?:\.\d+)?)%").unwrap()
});

#[derive(Debug, Deserialize)]
struct RawInfo {
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    format_id: String,
    #[serde(default)]
    ext: String,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    acodec: Option<String>,
}

impl From<RawFormat> for VideoFormat {
    fn from(raw: RawFormat) -> Self {
        VideoFormat {
            id: raw.format_id,
            container: raw.ext,
            width: raw.width,
            height: raw.height,
            audio_codec: raw.acodec.filter(|codec| codec != "none"),
        }
    }
}

/// Parse the `--dump-json` document into a format listing
pub fn parse_format_listing(json: &str) -> Result<FormatListing, MediaError> {
    let info: RawInfo = serde_json::from_str(json)
        .map_err(|e| MediaError::Parse(format!("yt-dlp metadata: {}", e)))?;
    Ok(FormatListing::new(info.formats.into_iter().map(VideoFormat::from).collect()))
}

/// Download percentage from a yt-dlp `--newline` progress line
pub fn parse_progress(line: &str) -> Option<f32> {
    PROGRESS_REGEX
        .captures(line.trim())
        .and_then(|caps| caps[1].parse::<f32>().ok())
}

/// yt-dlp client; captions are converted to SRT with ffmpeg
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
    ffmpeg: FfmpegRunner,
    work_dir: PathBuf,
    timeout: Duration,
}

impl YtDlp {
    pub fn new(binary: impl Into<PathBuf>, ffmpeg: FfmpegRunner, work_dir: impl Into<PathBuf>, timeout_secs: u64) -> Self {
        Self {
            binary: binary.into(),
            ffmpeg,
            work_dir: work_dir.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Run yt-dlp to completion and return stdout
    async fn run(&self, args: &[String]) -> Result<String, MediaError> {
        debug!("Running: {} {}", self.binary.display(), args.join(" "));

        let ytdlp_future = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::select! {
            result = ytdlp_future => {
                result.map_err(|e| MediaError::ToolNotFound {
                    tool: TOOL.to_string(),
                    message: e.to_string(),
                })?
            },
            _ = tokio::time::sleep(self.timeout) => {
                return Err(MediaError::Timeout {
                    tool: TOOL.to_string(),
                    secs: self.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::CommandFailed {
                tool: TOOL.to_string(),
                message: stderr.trim().to_string(),
            });
        }

        String::from_utf8(output.stdout)
            .map_err(|e| MediaError::Parse(format!("yt-dlp output is not UTF-8: {}", e)))
    }

    /// Convert, parse and clean up a downloaded caption file
    async fn read_caption_file(&self, caption_file: &Path) -> Result<Vec<Cue>, MediaError> {
        let srt_file = caption_file.with_extension("converted.srt");
        let converted = self.ffmpeg.convert_subtitle(caption_file, &srt_file).await;

        let parsed = match converted {
            Ok(()) => subtitle_processor::parse_srt_file(&srt_file).map_err(|e| MediaError::Parse(e.to_string())),
            Err(e) => Err(e),
        };

        FileManager::remove_quietly(caption_file);
        FileManager::remove_quietly(&srt_file);
        parsed
    }
}

#[async_trait]
impl SubtitleSource for YtDlp {
    async fn fetch_cues(&self, source: &str, language: &str) -> Result<Vec<Cue>, MediaError> {
        FileManager::ensure_dir(&self.work_dir).map_err(|e| MediaError::Io(e.to_string()))?;

        let stem = FileManager::stamped_path(&self.work_dir, "-captions");
        let prefix = stem
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let args = vec![
            source.to_string(),
            "--skip-download".to_string(),
            "--write-subs".to_string(),
            "--write-auto-subs".to_string(),
            "--sub-langs".to_string(),
            language.to_string(),
            "--sub-format".to_string(),
            "vtt".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--output".to_string(),
            format!("{}.%(ext)s", stem.to_string_lossy()),
        ];
        self.run(&args).await?;

        let caption_file = FileManager::find_files_with_prefix(&self.work_dir, &prefix, "vtt")
            .map_err(|e| MediaError::Io(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| MediaError::NoCaptions {
                language: language.to_string(),
            })?;

        info!("Fetched {} captions: {}", language, caption_file.display());
        self.read_caption_file(&caption_file).await
    }
}

#[async_trait]
impl VideoSource for YtDlp {
    async fn formats(&self, source: &str) -> Result<FormatListing, MediaError> {
        let args = vec![
            source.to_string(),
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
        ];
        let json = self.run(&args).await?;
        let listing = parse_format_listing(&json)?;
        debug!("{} format(s) available", listing.formats.len());
        Ok(listing)
    }

    async fn download(&self, source: &str, format: &VideoFormat, dest_dir: &Path) -> Result<PathBuf, MediaError> {
        FileManager::ensure_dir(dest_dir).map_err(|e| MediaError::Io(e.to_string()))?;
        let file_path = FileManager::stamped_path(dest_dir, &format!(".{}", format.container));

        info!(
            "Downloading format {} ({}, {}) to {}",
            format.id,
            format.container,
            format.resolution(),
            file_path.display()
        );

        let mut child = Command::new(&self.binary)
            .arg(source)
            .arg("--format")
            .arg(&format.id)
            .arg("--output")
            .arg(&file_path)
            .arg("--newline")
            .arg("--no-playlist")
            .arg("--no-warnings")
            .arg("--no-part")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| MediaError::ToolNotFound {
                tool: TOOL.to_string(),
                message: e.to_string(),
            })?;

        let progress_bar = ProgressBar::new(1000);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        // stderr must be drained while stdout is read or yt-dlp can block on a full pipe
        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let _ = stderr.read_to_end(&mut buf).await;
                buf
            })
        });

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(percent) = parse_progress(&line) {
                    progress_bar.set_position((percent * 10.0) as u64);
                }
            }
        }

        let status = child.wait().await?;
        let stderr_bytes = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => Vec::new(),
        };
        progress_bar.finish_and_clear();

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            error!("Download failed: {}", stderr.trim());
            FileManager::remove_quietly(&file_path);
            return Err(MediaError::CommandFailed {
                tool: TOOL.to_string(),
                message: stderr.trim().to_string(),
            });
        }

        if !FileManager::file_exists(&file_path) {
            return Err(MediaError::Io(format!("download finished but {} is missing", file_path.display())));
        }

        info!("Download complete: {}", file_path.display());
        Ok(file_path)
    }
}
