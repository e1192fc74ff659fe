/*!
 * External media collaborators.
 *
 * The caption pipeline and the clip assembler never touch the network or a
 * codec directly. They talk to these traits:
 * - `SubtitleSource`: raw cues for a source and language
 * - `VideoSource`: available encodings and downloads
 * - `VideoRenderer`: clip extraction, concatenation and the final render
 *
 * `ytdlp` and `ffmpeg` hold the real implementations, `mock` holds scripted
 * ones for tests.
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::MediaError;
use crate::interval::ClipSpan;
use crate::subtitle_processor::Cue;

pub mod ffmpeg;
pub mod mock;
pub mod ytdlp;

/// Provides raw subtitle cues
#[async_trait]
pub trait SubtitleSource: Send + Sync {
    /// Fetch the raw cue sequence for `source` in `language`
    ///
    /// # Returns
    /// * `Err(MediaError::NoCaptions)` when the source has no track in that language
    async fn fetch_cues(&self, source: &str, language: &str) -> Result<Vec<Cue>, MediaError>;
}

/// Provides video metadata and the video itself
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// List available encodings and pick the best one
    async fn formats(&self, source: &str) -> Result<FormatListing, MediaError>;

    /// Download `format` of `source` into `dest_dir`, returning the file path
    async fn download(&self, source: &str, format: &VideoFormat, dest_dir: &Path) -> Result<PathBuf, MediaError>;
}

/// Cuts, joins and renders video files
#[async_trait]
pub trait VideoRenderer: Send + Sync {
    /// Write the `span` of `input` to `output` as a standalone clip
    async fn extract_clip(&self, input: &Path, span: &ClipSpan, output: &Path) -> Result<(), MediaError>;

    /// Join `parts`, in order, into `output`
    async fn concat_clips(&self, parts: &[PathBuf], output: &Path) -> Result<(), MediaError>;

    /// Apply the video filter chain to `input`, writing `output`
    async fn render(&self, input: &Path, filters: &[String], output: &Path) -> Result<(), MediaError>;
}

/// One available encoding of a source video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoFormat {
    pub id: String,
    /// Container extension, e.g. "mp4"
    pub container: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Audio codec, `None` for video-only encodings
    pub audio_codec: Option<String>,
}

impl VideoFormat {
    pub fn has_audio(&self) -> bool {
        self.audio_codec.is_some()
    }

    /// Human readable resolution
    pub fn resolution(&self) -> String {
        match (self.width, self.height) {
            (Some(w), Some(h)) => format!("{}x{}", w, h),
            _ => "audio only".to_string(),
        }
    }
}

/// Encodings of a source, sorted by width, with the selected best one
#[derive(Debug, Clone)]
pub struct FormatListing {
    pub formats: Vec<VideoFormat>,
    pub best: Option<VideoFormat>,
}

impl FormatListing {
    pub fn new(mut formats: Vec<VideoFormat>) -> Self {
        let best = select_best_format(&formats).cloned();
        formats.sort_by_key(|f| f.width.unwrap_or(0));
        Self { formats, best }
    }

    /// The selected encoding, or `NoSuitableFormat`
    pub fn require_best(&self) -> Result<&VideoFormat, MediaError> {
        self.best.as_ref().ok_or(MediaError::NoSuitableFormat)
    }
}

/// Minimum width of a preferred mp4 encoding
pub const PREFERRED_MIN_WIDTH: u32 = 1280;

/// Prefer the first mp4 at least 1280 wide with audio; otherwise the widest
/// encoding with audio.
pub fn select_best_format(formats: &[VideoFormat]) -> Option<&VideoFormat> {
    formats
        .iter()
        .find(|f| f.container == "mp4" && f.width.unwrap_or(0) >= PREFERRED_MIN_WIDTH && f.has_audio())
        .or_else(|| {
            // Ties keep the earliest format
            formats
                .iter()
                .filter(|f| f.has_audio())
                .fold(None, |best: Option<&VideoFormat>, f| match best {
                    Some(b) if b.width.unwrap_or(0) >= f.width.unwrap_or(0) => Some(b),
                    _ => Some(f),
                })
        })
}
