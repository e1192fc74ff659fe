use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::{Config, RenderConfig};
use crate::clip_assembler::ClipAssembler;
use crate::errors::{AppError, MediaError, Stage};
use crate::file_utils::FileManager;
use crate::interval::{plan_spans, remap_flattened, ClipSpan, Interval};
use crate::language_utils;
use crate::media::ffmpeg::{FfmpegRenderer, FfmpegRunner};
use crate::media::ytdlp::YtDlp;
use crate::media::{SubtitleSource, VideoFormat, VideoRenderer, VideoSource};
use crate::overlay::build_overlays;
use crate::subtitle_processor::{self, Cue};

// @module: Application controller for the clip pipeline

/// Result of the caption pipeline; only `Available` carries cues
#[derive(Debug, Clone, PartialEq)]
pub enum CaptionOutcome {
    /// Cues normalized and remapped onto the output timeline
    Available(Vec<Cue>),
    /// The source has no captions in the requested language
    Unavailable(String),
    /// Retrieval or processing failed
    Failed(String),
}

impl CaptionOutcome {
    /// Cues to burn in; empty unless captions are available
    pub fn into_cues(self) -> Vec<Cue> {
        match self {
            CaptionOutcome::Available(cues) => cues,
            CaptionOutcome::Unavailable(reason) => {
                warn!("No captions available, rendering without them: {}", reason);
                Vec::new()
            }
            CaptionOutcome::Failed(reason) => {
                error!("Captions pipeline failed, rendering without captions: {}", reason);
                Vec::new()
            }
        }
    }
}

/// What `preview` computed for a local subtitle file
#[derive(Debug, Clone)]
pub struct PreviewReport {
    pub spans: Vec<ClipSpan>,
    pub cues: Vec<Cue>,
    pub filters: Vec<String>,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    subtitles: Arc<dyn SubtitleSource>,
    video: Arc<dyn VideoSource>,
    renderer: Arc<dyn VideoRenderer>,
}

impl Controller {
    // @method: Create a controller backed by yt-dlp and ffmpeg
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        let ffmpeg = FfmpegRunner::new(&config.tools.ffmpeg_path, config.tools.timeout_secs);
        let ytdlp = Arc::new(YtDlp::new(
            &config.tools.ytdlp_path,
            ffmpeg.clone(),
            &config.work_dir,
            config.tools.timeout_secs,
        ));
        let renderer = Arc::new(FfmpegRenderer::new(ffmpeg));

        Ok(Self::with_collaborators(config, ytdlp.clone(), ytdlp, renderer))
    }

    // @method: Create a controller with explicit collaborators
    pub fn with_collaborators(
        config: Config,
        subtitles: Arc<dyn SubtitleSource>,
        video: Arc<dyn VideoSource>,
        renderer: Arc<dyn VideoRenderer>,
    ) -> Self {
        Self { config, subtitles, video, renderer }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the whole pipeline and return the path of the rendered video
    pub async fn run(&self, force_overwrite: bool) -> Result<PathBuf, AppError> {
        let start_time = Instant::now();
        let output_path = self.config.output_path.clone();
        let intervals = self.config.intervals.clone();

        if intervals.is_empty() {
            return Err(AppError::Config("At least one interval is required".to_string()));
        }

        if output_path.exists() && !force_overwrite {
            return Err(AppError::File(format!(
                "Output {} already exists (use -f to force overwrite)",
                output_path.display()
            )));
        }

        FileManager::ensure_dir(&self.config.work_dir)?;
        let work_dir = tempfile::Builder::new()
            .prefix("subclip-")
            .tempdir_in(&self.config.work_dir)?;
        debug!("Work directory: {}", work_dir.path().display());

        info!("Fetching captions and video metadata");
        let (captions, format) = tokio::join!(
            self.fetch_captions(&intervals),
            self.select_format()
        );
        let format = format?;
        let cues = captions.into_cues();
        info!("{} caption(s) on the output timeline", cues.len());

        let input = match (&self.config.local_source, format) {
            (Some(path), _) => {
                info!("Using local source {}", path.display());
                path.clone()
            }
            (None, Some(format)) => self
                .video
                .download(&self.config.source_url, &format, work_dir.path())
                .await
                .map_err(AppError::at(Stage::Download))?,
            (None, None) => return Err(AppError::at(Stage::Metadata)(MediaError::NoSuitableFormat)),
        };

        let overlays = build_overlays(&cues, &self.config.render.overlay);
        let plan = self.config.render.plan(overlays);

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                FileManager::ensure_dir(parent)?;
            }
        }

        let progress_bar = ProgressBar::new(intervals.len() as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} clips {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("#>-"));
        progress_bar.set_message("extracting");

        let pb = progress_bar.clone();
        let assembler = ClipAssembler::new(self.renderer.clone(), self.config.max_concurrent_extractions);
        let result = assembler
            .assemble(
                &input,
                &intervals,
                &plan,
                work_dir.path(),
                &output_path,
                move |completed, _total| pb.set_position(completed as u64),
            )
            .await;
        progress_bar.finish_and_clear();

        // The scratch directory goes away with `work_dir` in every outcome
        let output = result?;

        info!(
            "Success: {} ({})",
            output.display(),
            Self::format_duration(start_time.elapsed())
        );
        Ok(output)
    }

    /// Fetch, normalize and remap captions. Never fails the run.
    pub async fn fetch_captions(&self, intervals: &[Interval]) -> CaptionOutcome {
        let language = &self.config.subtitle_language;
        let language_name = language_utils::get_language_name(language)
            .unwrap_or_else(|_| language.clone());
        info!("Fetching {} captions", language_name);

        let raw = match self.subtitles.fetch_cues(&self.config.source_url, language).await {
            Ok(cues) => cues,
            Err(e @ MediaError::NoCaptions { .. }) => return CaptionOutcome::Unavailable(e.to_string()),
            Err(e) => return CaptionOutcome::Failed(e.to_string()),
        };
        debug!("Fetched {} raw cue(s)", raw.len());

        match subtitle_processor::normalize(&raw).and_then(|cues| remap_flattened(&cues, intervals)) {
            Ok(cues) => CaptionOutcome::Available(cues),
            Err(e) => CaptionOutcome::Failed(e.to_string()),
        }
    }

    /// Pick the encoding to download; `None` for a local source
    async fn select_format(&self) -> Result<Option<VideoFormat>, AppError> {
        if self.config.local_source.is_some() {
            return Ok(None);
        }

        let listing = self
            .video
            .formats(&self.config.source_url)
            .await
            .map_err(AppError::at(Stage::Metadata))?;
        let best = listing
            .require_best()
            .map_err(AppError::at(Stage::Metadata))?
            .clone();

        info!("Selected format {} ({}, {})", best.id, best.container, best.resolution());
        Ok(Some(best))
    }

    /// Run the caption and overlay pipeline on a local SRT file without
    /// touching any external tool
    pub fn preview(subtitle_file: &Path, intervals: &[Interval], render: &RenderConfig) -> Result<PreviewReport, AppError> {
        let raw = subtitle_processor::parse_srt_file(subtitle_file)
            .with_context(|| format!("Failed to read subtitles from {:?}", subtitle_file))?;
        let normalized = subtitle_processor::normalize(&raw)?;
        let cues = remap_flattened(&normalized, intervals)?;
        let plan = render.plan(build_overlays(&cues, &render.overlay));

        Ok(PreviewReport {
            spans: plan_spans(intervals),
            filters: plan.filter_chain(),
            cues,
        })
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
