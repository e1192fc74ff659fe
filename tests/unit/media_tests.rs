/*!
 * Tests for the media collaborators and their helpers
 */

use anyhow::Result;
use std::path::PathBuf;
use subclip::errors::MediaError;
use subclip::media::ffmpeg::{FfmpegCommand, FfmpegRenderer, FfmpegRunner};
use subclip::media::mock::{MockCaptions, MockSubtitleSource, MockVideoSource};
use subclip::media::ytdlp::{parse_format_listing, parse_progress};
use subclip::media::{SubtitleSource, VideoRenderer, VideoSource};
use crate::common;

#[test]
fn test_ffmpeg_concat_command_withListInput_shouldCopyStreams() {
    let args = FfmpegCommand::new("merged.concat.txt", "merged.mp4")
        .concat_list()
        .codec_copy()
        .build_args();

    assert_eq!(
        args,
        vec!["-y", "-v", "error", "-f", "concat", "-safe", "0", "-i", "merged.concat.txt", "-c", "copy", "merged.mp4"]
    );
}

#[test]
fn test_ffmpeg_extract_command_shouldReencodeWithSeekAndDuration() {
    let args = FfmpegCommand::new("source.mp4", "part-1.mp4")
        .seek("00:04:30")
        .duration(30.0)
        .video_codec("libx264")
        .audio_codec("aac")
        .build_args();

    assert_eq!(
        args,
        vec!["-y", "-v", "error", "-ss", "00:04:30", "-t", "30.0", "-i", "source.mp4", "-c:v", "libx264", "-c:a", "aac", "part-1.mp4"]
    );
}

#[tokio::test]
async fn test_ffmpeg_runner_withMissingBinary_shouldReturnToolNotFound() {
    let runner = FfmpegRunner::new("/nonexistent/bin/ffmpeg", 5);
    let result = runner.run(&FfmpegCommand::new("in.vtt", "out.srt")).await;
    assert!(matches!(result, Err(MediaError::ToolNotFound { .. })));
}

#[tokio::test]
async fn test_ffmpeg_concat_withMissingBinary_shouldRemoveListFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let renderer = FfmpegRenderer::new(FfmpegRunner::new("/nonexistent/bin/ffmpeg", 5));
    let output = temp_dir.path().join("merged.mp4");

    let result = renderer
        .concat_clips(&[PathBuf::from("part-0.mp4"), PathBuf::from("part-1.mp4")], &output)
        .await;

    assert!(result.is_err());
    assert!(!output.with_extension("concat.txt").exists());
    Ok(())
}

#[test]
fn test_parse_format_listing_withRealisticDump_shouldSortAndSelect() -> Result<()> {
    let json = r#"{
        "id": "gBmnB7BwSRA",
        "title": "Talk",
        "formats": [
            {"format_id": "22", "ext": "mp4", "width": 1280, "height": 720, "acodec": "mp4a.40.2", "vcodec": "avc1"},
            {"format_id": "18", "ext": "mp4", "width": 640, "height": 360, "acodec": "mp4a.40.2"},
            {"format_id": "251", "ext": "webm", "acodec": "opus", "vcodec": "none"},
            {"format_id": "248", "ext": "webm", "width": 1920, "height": 1080, "acodec": "none"}
        ]
    }"#;
    let listing = parse_format_listing(json)?;

    let ids: Vec<&str> = listing.formats.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["251", "18", "22", "248"]);
    assert_eq!(listing.require_best()?.id, "22");
    Ok(())
}

#[test]
fn test_parse_format_listing_withInvalidJson_shouldReturnParseError() {
    assert!(matches!(parse_format_listing("not json"), Err(MediaError::Parse(_))));
}

#[test]
fn test_parse_progress_withVariousLines_shouldExtractPercent() {
    assert_eq!(parse_progress("[download]   0.0% of ~  5.00MiB"), Some(0.0));
    assert_eq!(parse_progress("  [download]  57.1% of 5.00MiB at  2.00MiB/s ETA 00:01"), Some(57.1));
    assert_eq!(parse_progress("[download] Destination: video.mp4"), None);
}

#[tokio::test]
async fn test_mock_subtitle_source_withMissingCaptions_shouldReportNoCaptions() {
    let source = MockSubtitleSource::new(MockCaptions::Missing);
    match source.fetch_cues("https://example.com/v", "pt").await {
        Err(MediaError::NoCaptions { language }) => assert_eq!(language, "pt"),
        other => panic!("expected NoCaptions, got {:?}", other),
    }
}

#[tokio::test]
async fn test_mock_video_source_download_shouldRecordFormatAndWriteFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = MockVideoSource::working();

    let listing = source.formats("https://example.com/v").await?;
    let best = listing.require_best()?.clone();
    let path = source.download("https://example.com/v", &best, temp_dir.path()).await?;

    assert!(path.exists());
    assert_eq!(source.downloads(), vec!["22".to_string()]);
    Ok(())
}
