/*!
 * ffmpeg-backed rendering.
 *
 * `FfmpegCommand` builds argument lists, `FfmpegRunner` executes them with a
 * timeout, and `FfmpegRenderer` implements `VideoRenderer` on top of both.
 */

use async_trait::async_trait;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::errors::MediaError;
use crate::file_utils::FileManager;
use crate::interval::ClipSpan;
use super::VideoRenderer;

const TOOL: &str = "ffmpeg";

/// Builder for ffmpeg argument lists
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    input: PathBuf,
    output: PathBuf,
    // @field: Arguments placed before -i
    input_args: Vec<String>,
    // @field: Arguments placed after -i
    output_args: Vec<String>,
}

impl FfmpegCommand {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
        }
    }

    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Seek the input to a timecode or seconds value
    pub fn seek(self, position: impl Into<String>) -> Self {
        self.input_arg("-ss").input_arg(position)
    }

    /// Limit the amount of input read
    pub fn duration(self, seconds: f64) -> Self {
        self.input_arg("-t").input_arg(format!("{:.1}", seconds))
    }

    /// Read the input as an ffmpeg concat list
    pub fn concat_list(self) -> Self {
        self.input_arg("-f").input_arg("concat").input_arg("-safe").input_arg("0")
    }

    /// Comma-joined `-vf` chain
    pub fn video_filters(self, filters: &[String]) -> Self {
        self.output_arg("-vf").output_arg(filters.join(","))
    }

    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Copy all streams without re-encoding
    pub fn codec_copy(self) -> Self {
        self.output_arg("-c").output_arg("copy")
    }

    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec!["-y".to_string(), "-v".to_string(), "error".to_string()];
        args.extend(self.input_args.iter().cloned());
        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());
        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().to_string());
        args
    }
}

/// Executes ffmpeg with a timeout
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    binary: PathBuf,
    timeout: Duration,
}

impl FfmpegRunner {
    pub fn new(binary: impl Into<PathBuf>, timeout_secs: u64) -> Self {
        Self {
            binary: binary.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub async fn run(&self, cmd: &FfmpegCommand) -> Result<(), MediaError> {
        let args = cmd.build_args();
        debug!("Running: {} {}", self.binary.display(), args.join(" "));

        let ffmpeg_future = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::select! {
            result = ffmpeg_future => {
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
                message: filter_ffmpeg_stderr(&stderr),
            });
        }

        Ok(())
    }

    /// Convert a subtitle file to another format, chosen by extension
    pub async fn convert_subtitle(&self, input: &Path, output: &Path) -> Result<(), MediaError> {
        self.run(&FfmpegCommand::new(input, output)).await
    }
}

/// Filter ffmpeg stderr down to the lines that explain a failure, dropping
/// the version banner, build configuration and stream metadata noise.
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let noise_prefixes = [
        "ffmpeg version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Stream #",
        "Output #",
        "Stream mapping:",
        "Press [q]",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !noise_prefixes.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        format!("{} exited with an error and no diagnostics", TOOL)
    } else {
        meaningful.join("\n")
    }
}

/// Quote a path for an ffmpeg concat list
fn concat_list_entry(path: &Path) -> String {
    format!("file '{}'", path.to_string_lossy().replace('\'', "'\\''"))
}

/// `VideoRenderer` backed by the ffmpeg command line tool
#[derive(Debug, Clone)]
pub struct FfmpegRenderer {
    runner: FfmpegRunner,
}

impl FfmpegRenderer {
    pub fn new(runner: FfmpegRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl VideoRenderer for FfmpegRenderer {
    async fn extract_clip(&self, input: &Path, span: &ClipSpan, output: &Path) -> Result<(), MediaError> {
        debug!(
            "Extracting clip {}: seek {} for {:.1}s -> {}",
            span.index + 1,
            span.seek,
            span.duration_secs,
            output.display()
        );

        // Re-encode so every part has identical codec parameters for concat
        let cmd = FfmpegCommand::new(input, output)
            .seek(span.seek.clone())
            .duration(span.duration_secs)
            .video_codec("libx264")
            .audio_codec("aac");
        self.runner.run(&cmd).await
    }

    async fn concat_clips(&self, parts: &[PathBuf], output: &Path) -> Result<(), MediaError> {
        let list_path = output.with_extension("concat.txt");
        let list = parts
            .iter()
            .map(|p| concat_list_entry(p))
            .collect::<Vec<_>>()
            .join("\n");
        FileManager::write_to_file(&list_path, &list).map_err(|e| MediaError::Io(e.to_string()))?;

        info!("Concatenating {} clip(s) into {}", parts.len(), output.display());
        let cmd = FfmpegCommand::new(&list_path, output).concat_list().codec_copy();
        let result = self.runner.run(&cmd).await;

        if let Err(e) = std::fs::remove_file(&list_path) {
            warn!("Failed to remove concat list {}: {}", list_path.display(), e);
        }
        result
    }

    async fn render(&self, input: &Path, filters: &[String], output: &Path) -> Result<(), MediaError> {
        info!("Rendering {} with {} filter(s)", output.display(), filters.len());
        let cmd = FfmpegCommand::new(input, output)
            .video_filters(filters)
            .audio_codec("copy");
        self.runner.run(&cmd).await
    }
}
