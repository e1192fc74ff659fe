use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};

use crate::clip_assembler::{CropSpec, PadSpec, RenderPlan};
use crate::file_utils::FileManager;
use crate::interval::Interval;
use crate::overlay::{OverlayDescriptor, OverlayStyle};

/// Application configuration module
/// This module handles loading, validating and saving `conf.json`.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Video page URL handed to yt-dlp
    #[serde(default = "default_source_url")]
    pub source_url: String,

    /// Local video file; when set, nothing is downloaded
    #[serde(default)]
    pub local_source: Option<PathBuf>,

    /// Caption language code (ISO 639)
    #[serde(default = "default_subtitle_language")]
    pub subtitle_language: String,

    /// Source spans to keep, in output order
    #[serde(default = "default_intervals")]
    pub intervals: Vec<Interval>,

    /// Final video path
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Parent directory of the per-run scratch directory
    #[serde(default = "std::env::temp_dir")]
    pub work_dir: PathBuf,

    /// External tool settings
    #[serde(default)]
    pub tools: ToolConfig,

    /// Final render layout
    #[serde(default)]
    pub render: RenderConfig,

    /// Maximum number of clips extracted at once
    #[serde(default = "default_max_concurrent_extractions")]
    pub max_concurrent_extractions: usize,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// External tool configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolConfig {
    // @field: ffmpeg binary name or path
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    // @field: yt-dlp binary name or path
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: PathBuf,

    // @field: Per-invocation timeout, downloads excepted
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ytdlp_path: default_ytdlp_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Crop, pad and caption styling of the final render
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RenderConfig {
    #[serde(default)]
    pub crop: CropSpec,

    #[serde(default)]
    pub pad: PadSpec,

    #[serde(default)]
    pub overlay: OverlayStyle,
}

impl RenderConfig {
    /// Render plan for this layout with the given overlays
    pub fn plan(&self, overlays: Vec<OverlayDescriptor>) -> RenderPlan {
        RenderPlan {
            crop: self.crop.clone(),
            pad: self.pad.clone(),
            style: self.overlay.clone(),
            overlays,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_source_url() -> String {
    "https://www.youtube.com/watch?v=gBmnB7BwSRA".to_string()
}

fn default_subtitle_language() -> String {
    "pt".to_string()
}

fn default_intervals() -> Vec<Interval> {
    // Constant timecodes, always valid
    Interval::from_pairs(&[["00:01:19", "00:01:40"], ["00:04:30", "00:05:00"]]).unwrap_or_default()
}

fn default_output_path() -> PathBuf {
    PathBuf::from("final.mp4")
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_max_concurrent_extractions() -> usize {
    4
}

impl Config {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = FileManager::read_to_string(&path)?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        FileManager::write_to_file(path, &content)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_language_code(&self.subtitle_language)?;

        // Interval bounds are checked on deserialization, only emptiness is left
        if self.intervals.is_empty() {
            return Err(anyhow!("At least one interval is required"));
        }

        match &self.local_source {
            Some(path) => {
                if !FileManager::file_exists(path) {
                    return Err(anyhow!("Local source file not found: {:?}", path));
                }
            }
            None => {
                url::Url::parse(&self.source_url)
                    .with_context(|| format!("Invalid source URL: {}", self.source_url))?;
            }
        }

        if self.max_concurrent_extractions == 0 {
            return Err(anyhow!("max_concurrent_extractions must be at least 1"));
        }

        if self.tools.timeout_secs == 0 {
            return Err(anyhow!("tools.timeout_secs must be greater than 0"));
        }

        if self.render.overlay.wrap_search_chars == 0 {
            return Err(anyhow!("render.overlay.wrap_search_chars must be greater than 0"));
        }

        // A wrap window reaching the single-line limit can leave an empty second line
        let overlay = &self.render.overlay;
        if overlay.wrap_search_chars >= overlay.max_single_line_chars {
            return Err(anyhow!(
                "render.overlay.wrap_search_chars ({}) must be less than max_single_line_chars ({})",
                overlay.wrap_search_chars,
                overlay.max_single_line_chars
            ));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_url: default_source_url(),
            local_source: None,
            subtitle_language: default_subtitle_language(),
            intervals: default_intervals(),
            output_path: default_output_path(),
            work_dir: std::env::temp_dir(),
            tools: ToolConfig::default(),
            render: RenderConfig::default(),
            max_concurrent_extractions: default_max_concurrent_extractions(),
            log_level: LogLevel::default(),
        }
    }
}
