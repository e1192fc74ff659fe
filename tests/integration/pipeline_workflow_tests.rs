/*!
 * End-to-end tests of the caption pipeline: SRT text to drawtext filters
 */

use anyhow::Result;
use subclip::app_config::RenderConfig;
use subclip::app_controller::Controller;
use subclip::interval::{remap_cues, remap_flattened, Interval};
use subclip::overlay::build_overlays;
use subclip::subtitle_processor::{normalize, parse_srt_string, Cue, CueTime};
use crate::common;

fn default_intervals() -> Vec<Interval> {
    Interval::from_pairs(&[["00:01:19", "00:01:40"], ["00:04:30", "00:05:00"]]).unwrap()
}

#[test]
fn test_remap_withOneCueInsideEachInterval_shouldPlaceSecondAfterFirstClip() -> Result<()> {
    let cues: Vec<Cue> = common::cues_inside_default_intervals()
        .into_iter()
        .map(|cue| {
            let (start, end) = cue.window().unwrap();
            Cue::new(cue.text, start, end)
        })
        .collect();

    let remapped = remap_flattened(&cues, &default_intervals())?;

    assert_eq!(remapped.len(), 2);
    assert!(remapped[1].start_time.as_seconds().unwrap() >= 21.0);
    Ok(())
}

#[test]
fn test_caption_pipeline_fromSrt_shouldProduceFiltersOnOutputTimeline() -> Result<()> {
    let srt = "1
00:01:25,000 --> 00:01:27,000
Primeira legenda

2
00:01:27,000 --> 00:01:30,000
Primeira legenda
uma legenda que é longa demais para uma linha

3
00:04:35,000 --> 00:04:38,000
Terceira
";
    let raw = parse_srt_string(srt)?;
    let normalized = normalize(&raw)?;

    // Cue 2's end snaps to cue 3's start, so it straddles the first interval
    assert_eq!(normalized[1].end_time, CueTime::Seconds(275.0));

    let per_interval = remap_cues(&normalized, &default_intervals())?;
    assert_eq!(per_interval[0].len(), 1);
    assert_eq!(per_interval[1].len(), 1);
    assert_eq!(per_interval[0][0].start_time, CueTime::Seconds(6.0));
    assert_eq!(per_interval[0][0].end_time, CueTime::Seconds(8.0));
    assert_eq!(per_interval[1][0].start_time, CueTime::Seconds(26.0));

    let render = RenderConfig::default();
    let cues: Vec<Cue> = per_interval.into_iter().flatten().collect();
    let filters = render.plan(build_overlays(&cues, &render.overlay)).filter_chain();

    assert_eq!(filters.len(), 4);
    assert!(filters[2].contains("text=Primeira legenda"));
    assert!(filters[2].contains("between(t,6.0,8.0)"));
    assert!(filters[3].contains("text=Terceira"));
    assert!(filters[3].contains("between(t,26.0,29.0)"));
    Ok(())
}

#[test]
fn test_preview_withLocalSrt_shouldReportSpansCuesAndFilters() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_subtitle(temp_dir.path(), "captions.srt")?;
    let intervals = vec![Interval::new("00:00:00", "00:00:10")?];

    let report = Controller::preview(&path, &intervals, &RenderConfig::default())?;

    assert_eq!(report.spans.len(), 1);
    assert_eq!(report.spans[0].duration_secs, 10.0);
    assert_eq!(report.cues.len(), 3);
    assert_eq!(report.cues[2].text, "hoje vamos falar de Rust");
    // crop, pad, then one drawtext per short cue
    assert_eq!(report.filters.len(), 5);
    Ok(())
}

#[test]
fn test_preview_withMissingFile_shouldFail() {
    let intervals = default_intervals();
    let result = Controller::preview(
        std::path::Path::new("/nonexistent/captions.srt"),
        &intervals,
        &RenderConfig::default(),
    );
    assert!(result.is_err());
}
