/*!
 * Mock collaborators for testing.
 *
 * - `MockSubtitleSource` returns scripted cues, no captions, or a failure
 * - `MockVideoSource` returns a scripted format list and writes a fake download
 * - `MockRenderer` records every call, writes placeholder output files and can
 *   be told to fail at a given stage
 */

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::errors::MediaError;
use crate::interval::ClipSpan;
use crate::subtitle_processor::Cue;
use super::{FormatListing, SubtitleSource, VideoFormat, VideoRenderer, VideoSource};

/// Behavior mode for the mock subtitle source
#[derive(Debug, Clone)]
pub enum MockCaptions {
    /// Returns these cues
    Cues(Vec<Cue>),
    /// The source has no captions in the language
    Missing,
    /// The retrieval itself fails
    Failing,
}

#[derive(Debug, Clone)]
pub struct MockSubtitleSource {
    behavior: MockCaptions,
}

impl MockSubtitleSource {
    pub fn new(behavior: MockCaptions) -> Self {
        Self { behavior }
    }

    pub fn with_cues(cues: Vec<Cue>) -> Self {
        Self::new(MockCaptions::Cues(cues))
    }
}

#[async_trait]
impl SubtitleSource for MockSubtitleSource {
    async fn fetch_cues(&self, _source: &str, language: &str) -> Result<Vec<Cue>, MediaError> {
        match &self.behavior {
            MockCaptions::Cues(cues) => Ok(cues.clone()),
            MockCaptions::Missing => Err(MediaError::NoCaptions {
                language: language.to_string(),
            }),
            MockCaptions::Failing => Err(MediaError::CommandFailed {
                tool: "mock".to_string(),
                message: "simulated caption failure".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockVideoSource {
    formats: Vec<VideoFormat>,
    fail_formats: bool,
    fail_download: bool,
    downloads: Arc<Mutex<Vec<String>>>,
}

impl MockVideoSource {
    /// A source offering one 1280x720 mp4 with audio
    pub fn working() -> Self {
        Self::with_formats(vec![VideoFormat {
            id: "22".to_string(),
            container: "mp4".to_string(),
            width: Some(1280),
            height: Some(720),
            audio_codec: Some("mp4a.40.2".to_string()),
        }])
    }

    pub fn with_formats(formats: Vec<VideoFormat>) -> Self {
        Self {
            formats,
            fail_formats: false,
            fail_download: false,
            downloads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing_metadata() -> Self {
        Self {
            fail_formats: true,
            ..Self::working()
        }
    }

    pub fn failing_download() -> Self {
        Self {
            fail_download: true,
            ..Self::working()
        }
    }

    /// Format ids downloaded so far
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoSource for MockVideoSource {
    async fn formats(&self, _source: &str) -> Result<FormatListing, MediaError> {
        if self.fail_formats {
            return Err(MediaError::CommandFailed {
                tool: "mock".to_string(),
                message: "simulated metadata failure".to_string(),
            });
        }
        Ok(FormatListing::new(self.formats.clone()))
    }

    async fn download(&self, _source: &str, format: &VideoFormat, dest_dir: &Path) -> Result<PathBuf, MediaError> {
        if self.fail_download {
            return Err(MediaError::CommandFailed {
                tool: "mock".to_string(),
                message: "simulated download failure".to_string(),
            });
        }
        self.downloads.lock().unwrap().push(format.id.clone());
        let path = dest_dir.join(format!("source.{}", format.container));
        std::fs::write(&path, b"source")?;
        Ok(path)
    }
}

/// A call received by the mock renderer
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    Extract { span: ClipSpan, output: PathBuf },
    Concat { parts: Vec<PathBuf>, output: PathBuf },
    Render { input: PathBuf, filters: Vec<String>, output: PathBuf },
}

/// Where the mock renderer should fail
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailAt {
    Never,
    /// Extraction of the interval with this index
    Extract(usize),
    Concat,
    Render,
}

#[derive(Debug, Clone)]
pub struct MockRenderer {
    fail_at: FailAt,
    /// Extraction delay per interval index, to shuffle completion order
    extract_delays_ms: Vec<u64>,
    calls: Arc<Mutex<Vec<RenderCall>>>,
}

impl MockRenderer {
    pub fn working() -> Self {
        Self::new(FailAt::Never)
    }

    pub fn new(fail_at: FailAt) -> Self {
        Self {
            fail_at,
            extract_delays_ms: Vec::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_extract_delays(mut self, delays_ms: Vec<u64>) -> Self {
        self.extract_delays_ms = delays_ms;
        self
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().unwrap().clone()
    }

    fn failure(&self, stage: &str) -> MediaError {
        MediaError::CommandFailed {
            tool: "mock".to_string(),
            message: format!("simulated {} failure", stage),
        }
    }
}

#[async_trait]
impl VideoRenderer for MockRenderer {
    async fn extract_clip(&self, _input: &Path, span: &ClipSpan, output: &Path) -> Result<(), MediaError> {
        if let Some(delay) = self.extract_delays_ms.get(span.index) {
            tokio::time::sleep(Duration::from_millis(*delay)).await;
        }
        self.calls.lock().unwrap().push(RenderCall::Extract {
            span: span.clone(),
            output: output.to_path_buf(),
        });
        if self.fail_at == FailAt::Extract(span.index) {
            return Err(self.failure("extraction"));
        }
        std::fs::write(output, format!("clip {}", span.index))?;
        Ok(())
    }

    async fn concat_clips(&self, parts: &[PathBuf], output: &Path) -> Result<(), MediaError> {
        self.calls.lock().unwrap().push(RenderCall::Concat {
            parts: parts.to_vec(),
            output: output.to_path_buf(),
        });
        if self.fail_at == FailAt::Concat {
            return Err(self.failure("concatenation"));
        }
        std::fs::write(output, b"merged")?;
        Ok(())
    }

    async fn render(&self, input: &Path, filters: &[String], output: &Path) -> Result<(), MediaError> {
        self.calls.lock().unwrap().push(RenderCall::Render {
            input: input.to_path_buf(),
            filters: filters.to_vec(),
            output: output.to_path_buf(),
        });
        // A failed render may leave a partial file behind
        std::fs::write(output, b"rendered")?;
        if self.fail_at == FailAt::Render {
            return Err(self.failure("render"));
        }
        Ok(())
    }
}
