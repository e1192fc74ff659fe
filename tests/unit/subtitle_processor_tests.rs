/*!
 * Tests for cue parsing and normalization
 */

use anyhow::Result;
use subclip::errors::SubtitleError;
use subclip::subtitle_processor::{
    drop_rolling_repeats, normalize, parse_srt_file, parse_srt_string, Cue, CueTime, CueTrack,
};
use crate::common;

fn seconds(time: &CueTime) -> f64 {
    time.as_seconds().expect("time should be converted to seconds")
}

#[test]
fn test_parse_srt_string_withMultilineCues_shouldJoinLines() -> Result<()> {
    let cues = parse_srt_string(common::ROLLING_SRT)?;

    assert_eq!(cues.len(), 4);
    assert_eq!(cues[0].text, "Olá pessoal");
    assert_eq!(cues[1].text, "Olá pessoal\nbem-vindos ao vídeo");
    assert_eq!(cues[1].start_time, CueTime::from("00:00:03,500"));
    assert_eq!(cues[3].end_time, CueTime::from("00:00:09,000"));
    Ok(())
}

#[test]
fn test_parse_srt_string_withBomAndCrlf_shouldParse() -> Result<()> {
    let content = "\u{feff}1\r\n00:00:01,000 --> 00:00:02,000\r\nHello\r\n\r\n";
    let cues = parse_srt_string(content)?;
    assert_eq!(cues, vec![Cue::new("Hello", "00:00:01,000", "00:00:02,000")]);
    Ok(())
}

#[test]
fn test_parse_srt_string_withNoCues_shouldFail() {
    assert!(parse_srt_string("").is_err());
    assert!(parse_srt_string("just some text\nwithout timing").is_err());
}

#[test]
fn test_parse_srt_string_withMalformedBlock_shouldSkipIt() -> Result<()> {
    let content = "1\nnot a timing line\nstray\n\n2\n00:00:05,000 --> 00:00:06,000\nKept\n";
    let cues = parse_srt_string(content)?;
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].text, "Kept");
    Ok(())
}

#[test]
fn test_cue_track_from_srt_file_withValidFile_shouldLoadCues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_subtitle(temp_dir.path(), "captions.srt")?;

    let track = CueTrack::from_srt_file(&path, "pt")?;
    assert_eq!(track.language, "pt");
    assert_eq!(track.cues.len(), 4);
    assert_eq!(track.cues, parse_srt_file(&path)?);
    Ok(())
}

#[test]
fn test_normalize_withRollingCaptions_shouldDedupStripAndCloseGaps() -> Result<()> {
    let raw = parse_srt_string(common::ROLLING_SRT)?;
    let cues = normalize(&raw)?;

    let texts: Vec<&str> = cues.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["Olá pessoal", "bem-vindos ao vídeo", "hoje vamos falar de Rust"]);

    assert_eq!((seconds(&cues[0].start_time), seconds(&cues[0].end_time)), (1.0, 3.5));
    assert_eq!((seconds(&cues[1].start_time), seconds(&cues[1].end_time)), (3.5, 7.0));
    assert_eq!((seconds(&cues[2].start_time), seconds(&cues[2].end_time)), (7.0, 9.0));
    Ok(())
}

#[test]
fn test_normalize_runTwice_shouldBeIdempotent() -> Result<()> {
    let raw = parse_srt_string(common::ROLLING_SRT)?;
    let once = normalize(&raw)?;
    let twice = normalize(&once)?;
    assert_eq!(once, twice);
    Ok(())
}

#[test]
fn test_normalize_runTwice_withStrippedLineInsidePreviousCue_shouldBeIdempotent() -> Result<()> {
    let raw = vec![
        Cue::new("hello world", "00:00:01", "00:00:02"),
        Cue::new("X\nworld", "00:00:03", "00:00:04"),
    ];
    let once = normalize(&raw)?;
    assert_eq!(once.len(), 2);
    assert_eq!(once[1].text, "world");

    let twice = normalize(&once)?;
    assert_eq!(once, twice);
    Ok(())
}

#[test]
fn test_normalize_withSecondsCues_shouldReturnThemUnchanged() -> Result<()> {
    let cues = vec![
        Cue::new("um dois", 1.0, 2.0),
        Cue::new("dois", 5.0, 6.0),
    ];
    assert_eq!(normalize(&cues)?, cues);
    Ok(())
}

#[test]
fn test_normalize_withRepeatInsideOriginalText_shouldCompareOriginalText() -> Result<()> {
    // "A" is inside the kept cue's original "A\nB" but not its stripped "B"
    let raw = vec![
        Cue::new("A\nB", "00:00:01", "00:00:02"),
        Cue::new("A", "00:00:02", "00:00:03"),
    ];
    let cues = normalize(&raw)?;
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].text, "B");

    let raw = vec![
        Cue::new("A\nB", "00:00:01", "00:00:02"),
        Cue::new("B\nC", "00:00:02", "00:00:03"),
    ];
    let cues = normalize(&raw)?;
    assert_eq!(cues.len(), 2);
    assert_eq!(cues[0].text, "B");
    assert_eq!(cues[1].text, "C");
    Ok(())
}

#[test]
fn test_normalize_output_shouldHaveNoGapsAndNoContainedNeighbours() -> Result<()> {
    let raw = vec![
        Cue::new("um", "00:00:01", "00:00:02"),
        Cue::new("um", "00:00:02", "00:00:03"),
        Cue::new("dois", "00:00:05", "00:00:06"),
        Cue::new("do", "00:00:06", "00:00:07"),
        Cue::new("três", "00:00:09", "00:00:10,500"),
    ];
    let cues = normalize(&raw)?;

    assert_eq!(cues.len(), 3);
    for pair in cues.windows(2) {
        assert_eq!(pair[0].end_time, pair[1].start_time);
        assert!(!pair[0].text.contains(pair[1].text.as_str()));
    }
    assert_eq!(seconds(&cues[2].end_time), 10.5);
    Ok(())
}

#[test]
fn test_drop_rolling_repeats_withChain_shouldCollapseToFirst() {
    let cues = vec![
        Cue::new("abc", "00:00:01", "00:00:02"),
        Cue::new("ab", "00:00:02", "00:00:03"),
        Cue::new("a", "00:00:03", "00:00:04"),
    ];
    let kept = drop_rolling_repeats(&cues);
    assert_eq!(kept, vec![cues[0].clone()]);
}

#[test]
fn test_normalize_withBadTimecode_shouldReturnInvalidTimecode() {
    let raw = vec![
        Cue::new("ok", "00:00:01", "00:00:02"),
        Cue::new("bad", "00:00", "00:00:04"),
    ];
    match normalize(&raw) {
        Err(SubtitleError::InvalidTimecode { timecode, .. }) => assert_eq!(timecode, "00:00"),
        other => panic!("expected InvalidTimecode, got {:?}", other),
    }
}

#[test]
fn test_normalize_withEmptyInput_shouldReturnEmpty() -> Result<()> {
    assert!(normalize(&[])?.is_empty());
    Ok(())
}
