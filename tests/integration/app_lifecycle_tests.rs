/*!
 * Integration tests for application lifecycle
 */

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use subclip::app_config::Config;
use subclip::app_controller::{CaptionOutcome, Controller};
use subclip::errors::{AppError, Stage};
use subclip::media::mock::{FailAt, MockCaptions, MockRenderer, MockSubtitleSource, MockVideoSource, RenderCall};
use subclip::subtitle_processor::Cue;
use crate::common;

/// Captions that survive gap closing: one cue in the first interval, one at the end of the track
fn sparse_captions() -> Vec<Cue> {
    vec![
        Cue::new("Primeira", "00:01:25,000", "00:01:28,000"),
        Cue::new("Some no corte", "00:01:28,000", "00:01:35,000"),
        Cue::new("Segunda", "00:04:30,000", "00:04:40,000"),
    ]
}

fn controller(config: Config, captions: MockCaptions, video: MockVideoSource, renderer: MockRenderer) -> Controller {
    Controller::with_collaborators(
        config,
        Arc::new(MockSubtitleSource::new(captions)),
        Arc::new(video),
        Arc::new(renderer),
    )
}

fn render_filters(renderer: &MockRenderer) -> Vec<String> {
    renderer
        .calls()
        .into_iter()
        .find_map(|call| match call {
            RenderCall::Render { filters, .. } => Some(filters),
            _ => None,
        })
        .unwrap_or_default()
}

fn is_empty_dir(dir: &Path) -> bool {
    std::fs::read_dir(dir).map(|mut entries| entries.next().is_none()).unwrap_or(true)
}

#[tokio::test]
async fn test_run_withCaptions_shouldRenderRemappedOverlays() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    let output_path = config.output_path.clone();
    let work_dir = config.work_dir.clone();

    let video = MockVideoSource::working();
    let renderer = MockRenderer::working();
    let controller = controller(config, MockCaptions::Cues(sparse_captions()), video.clone(), renderer.clone());

    let output = controller.run(false).await?;

    assert_eq!(output, output_path);
    assert!(output.exists());
    assert!(is_empty_dir(&work_dir));
    assert_eq!(video.downloads(), vec!["22".to_string()]);

    let filters = render_filters(&renderer);
    assert_eq!(filters.len(), 4);
    assert!(filters[2].contains("text=Primeira"));
    assert!(filters[2].contains("between(t,6.0,9.0)"));
    assert!(filters[3].contains("text=Segunda"));
    assert!(filters[3].contains("between(t,21.0,31.0)"));
    Ok(())
}

#[tokio::test]
async fn test_fetch_captions_withSparseCaptions_shouldKeepOneCuePerInterval() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    let intervals = config.intervals.clone();
    let controller = controller(
        config,
        MockCaptions::Cues(sparse_captions()),
        MockVideoSource::working(),
        MockRenderer::working(),
    );

    match controller.fetch_captions(&intervals).await {
        CaptionOutcome::Available(cues) => {
            assert_eq!(cues.len(), 2);
            assert!(cues[1].start_time.as_seconds().unwrap() >= 21.0);
        }
        other => panic!("expected captions, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_run_withFailingCaptions_shouldStillProduceOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    let renderer = MockRenderer::working();
    let controller = controller(config, MockCaptions::Failing, MockVideoSource::working(), renderer.clone());

    let output = controller.run(false).await?;

    assert!(output.exists());
    assert_eq!(render_filters(&renderer), vec!["crop=800:720:240:0", "pad=iw:ih+200:0:100:#7159C1"]);
    Ok(())
}

#[test]
fn test_fetch_captions_withMissingOrBrokenCaptions_shouldClassifyOutcome() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let intervals = common::test_config(temp_dir.path()).intervals;

    let missing = controller(
        common::test_config(temp_dir.path()),
        MockCaptions::Missing,
        MockVideoSource::working(),
        MockRenderer::working(),
    );
    let outcome = tokio_test::block_on(missing.fetch_captions(&intervals));
    assert!(matches!(outcome, CaptionOutcome::Unavailable(_)));

    let broken = controller(
        common::test_config(temp_dir.path()),
        MockCaptions::Cues(vec![Cue::new("x", "1:2", "00:00:02")]),
        MockVideoSource::working(),
        MockRenderer::working(),
    );
    let outcome = tokio_test::block_on(broken.fetch_captions(&intervals));
    assert!(matches!(outcome, CaptionOutcome::Failed(_)));
    Ok(())
}

#[tokio::test]
async fn test_run_withFailingRender_shouldLeaveNoOutputAndNameStage() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    let output_path = config.output_path.clone();
    let work_dir = config.work_dir.clone();
    let controller = controller(
        config,
        MockCaptions::Cues(sparse_captions()),
        MockVideoSource::working(),
        MockRenderer::new(FailAt::Render),
    );

    let err = controller.run(false).await.unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Render));
    assert!(err.to_string().contains("render failed"));
    assert!(!output_path.exists());
    assert!(is_empty_dir(output_path.parent().unwrap()));
    assert!(is_empty_dir(&work_dir));
    Ok(())
}

#[tokio::test]
async fn test_run_withCollaboratorFailures_shouldNameFailedStage() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let cases = vec![
        (MockVideoSource::failing_metadata(), MockRenderer::working(), Stage::Metadata),
        (MockVideoSource::with_formats(Vec::new()), MockRenderer::working(), Stage::Metadata),
        (MockVideoSource::failing_download(), MockRenderer::working(), Stage::Download),
        (MockVideoSource::working(), MockRenderer::new(FailAt::Extract(1)), Stage::Extraction),
        (MockVideoSource::working(), MockRenderer::new(FailAt::Concat), Stage::Concatenation),
    ];

    for (video, renderer, stage) in cases {
        let config = common::test_config(temp_dir.path());
        let output_path = config.output_path.clone();
        let controller = controller(config, MockCaptions::Missing, video, renderer);

        let err = controller.run(false).await.unwrap_err();
        assert_eq!(err.stage(), Some(stage));
        assert!(!output_path.exists());
    }
    Ok(())
}

#[tokio::test]
async fn test_run_withExistingOutput_shouldRequireForce() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    std::fs::create_dir_all(config.output_path.parent().unwrap())?;
    std::fs::write(&config.output_path, b"previous")?;

    let renderer = MockRenderer::working();
    let controller = controller(config.clone(), MockCaptions::Missing, MockVideoSource::working(), renderer.clone());

    let err = controller.run(false).await.unwrap_err();
    assert!(matches!(err, AppError::File(_)));
    assert!(renderer.calls().is_empty());
    assert_eq!(std::fs::read(&config.output_path)?, b"previous");

    controller.run(true).await?;
    assert_eq!(std::fs::read(&config.output_path)?, b"rendered");
    Ok(())
}

#[tokio::test]
async fn test_run_withLocalSource_shouldSkipDownload() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "local.mp4", "video")?;
    let mut config = common::test_config(temp_dir.path());
    config.local_source = Some(source.clone());

    let video = MockVideoSource::failing_metadata();
    let renderer = MockRenderer::working();
    let controller = controller(config, MockCaptions::Missing, video.clone(), renderer.clone());

    controller.run(false).await?;

    assert!(video.downloads().is_empty());
    assert!(source.exists());
    assert!(renderer.calls().iter().any(|call| matches!(call, RenderCall::Render { .. })));
    Ok(())
}
