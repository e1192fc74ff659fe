/*!
 * Clip assembly.
 *
 * Drives the video renderer through the three steps that produce the final
 * video: cut every interval out of the source (concurrently), join the clips
 * in interval order, then render the joined file with the crop, pad and
 * caption overlays applied. Temporary files are removed after their last
 * consumer whether or not the step succeeded.
 */

use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::{AppError, Stage};
use crate::file_utils::FileManager;
use crate::interval::{plan_spans, ClipSpan, Interval};
use crate::media::VideoRenderer;
use crate::overlay::{OverlayDescriptor, OverlayStyle};

/// Fixed crop applied before padding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropSpec {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

impl Default for CropSpec {
    fn default() -> Self {
        Self { width: 800, height: 720, x: 240, y: 0 }
    }
}

impl CropSpec {
    pub fn to_filter(&self) -> String {
        format!("crop={}:{}:{}:{}", self.width, self.height, self.x, self.y)
    }
}

/// Letterbox added around the cropped frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PadSpec {
    /// Rows added to the frame height
    pub extra_height: u32,
    /// Vertical offset of the picture inside the padded frame
    pub y_offset: u32,
    pub color: String,
}

impl Default for PadSpec {
    fn default() -> Self {
        Self {
            extra_height: 200,
            y_offset: 100,
            color: "#7159C1".to_string(),
        }
    }
}

impl PadSpec {
    pub fn to_filter(&self) -> String {
        format!("pad=iw:ih+{}:0:{}:{}", self.extra_height, self.y_offset, self.color)
    }
}

/// Everything the final render applies, in order
#[derive(Debug, Clone)]
pub struct RenderPlan {
    pub crop: CropSpec,
    pub pad: PadSpec,
    pub style: OverlayStyle,
    pub overlays: Vec<OverlayDescriptor>,
}

impl RenderPlan {
    /// Crop, then pad, then one drawtext per overlay
    pub fn filter_chain(&self) -> Vec<String> {
        let mut filters = Vec::with_capacity(self.overlays.len() + 2);
        filters.push(self.crop.to_filter());
        filters.push(self.pad.to_filter());
        filters.extend(self.overlays.iter().map(|o| o.to_drawtext(&self.style)));
        filters
    }
}

/// Sibling path the render is written to before being moved into place
pub fn partial_output_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "output.mp4".to_string());
    output.with_file_name(format!(".partial-{}", name))
}

/// Orchestrates extraction, concatenation and rendering
pub struct ClipAssembler {
    renderer: Arc<dyn VideoRenderer>,
    max_concurrent: usize,
}

impl ClipAssembler {
    pub fn new(renderer: Arc<dyn VideoRenderer>, max_concurrent: usize) -> Self {
        Self {
            renderer,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Cut every span out of `input` into `work_dir`, returning the clip
    /// paths in span order. The first failure aborts the remaining
    /// extractions and removes any clip already written.
    pub async fn extract_clips(
        &self,
        input: &Path,
        spans: &[ClipSpan],
        work_dir: &Path,
        progress_callback: impl Fn(usize, usize) + Clone + Send,
    ) -> Result<Vec<PathBuf>, AppError> {
        let total = spans.len();
        let completed = AtomicUsize::new(0);
        let part_path = |span: &ClipSpan| work_dir.join(format!("part-{}.mp4", span.index));

        info!("Extracting {} clip(s), up to {} at a time", total, self.max_concurrent);

        let result = stream::iter(spans)
            .map(|span| {
                let renderer = self.renderer.clone();
                let output = part_path(span);
                let progress_callback = progress_callback.clone();
                let completed = &completed;
                async move {
                    renderer.extract_clip(input, span, &output).await?;
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress_callback(done, total);
                    Ok::<_, crate::errors::MediaError>((span.index, output))
                }
            })
            .buffer_unordered(self.max_concurrent)
            .try_collect::<Vec<_>>()
            .await;

        match result {
            Ok(mut parts) => {
                // Completion order is arbitrary; concat order is interval order
                parts.sort_by_key(|(index, _)| *index);
                Ok(parts.into_iter().map(|(_, path)| path).collect())
            }
            Err(e) => {
                for span in spans {
                    FileManager::remove_quietly(part_path(span));
                }
                Err(AppError::at(Stage::Extraction)(e))
            }
        }
    }

    /// Join `parts` into `output`; the parts are removed afterwards either way
    pub async fn concatenate(&self, parts: &[PathBuf], output: &Path) -> Result<(), AppError> {
        let result = self.renderer.concat_clips(parts, output).await;

        for part in parts {
            FileManager::remove_quietly(part);
        }

        if result.is_err() {
            FileManager::remove_quietly(output);
        }
        result.map_err(AppError::at(Stage::Concatenation))
    }

    /// Render `merged` with the plan's filters into `output`.
    ///
    /// The render goes to a partial file that is moved onto `output` only on
    /// success, so a failed render never leaves an output behind. `merged`
    /// is removed either way.
    pub async fn render(&self, merged: &Path, plan: &RenderPlan, output: &Path) -> Result<(), AppError> {
        let filters = plan.filter_chain();
        debug!("Filter chain: {}", filters.join(","));

        let partial = partial_output_path(output);
        let result = self.renderer.render(merged, &filters, &partial).await;
        FileManager::remove_quietly(merged);

        if let Err(e) = result {
            FileManager::remove_quietly(&partial);
            return Err(AppError::at(Stage::Render)(e));
        }

        if let Err(e) = std::fs::rename(&partial, output) {
            FileManager::remove_quietly(&partial);
            return Err(AppError::File(format!(
                "Failed to move render into {}: {}",
                output.display(),
                e
            )));
        }
        Ok(())
    }

    /// Extract, concatenate and render in one go
    pub async fn assemble(
        &self,
        input: &Path,
        intervals: &[Interval],
        plan: &RenderPlan,
        work_dir: &Path,
        output: &Path,
        progress_callback: impl Fn(usize, usize) + Clone + Send,
    ) -> Result<PathBuf, AppError> {
        let spans = plan_spans(intervals);
        for span in &spans {
            debug!("Clip {}: seek {} duration {:.1}s", span.index + 1, span.seek, span.duration_secs);
        }

        let parts = self.extract_clips(input, &spans, work_dir, progress_callback).await?;

        let merged = work_dir.join("merged.mp4");
        self.concatenate(&parts, &merged).await?;
        info!("Merged {} clip(s)", parts.len());

        self.render(&merged, plan, output).await?;
        info!("Rendered {}", output.display());

        Ok(output.to_path_buf())
    }
}
