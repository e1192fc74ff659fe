use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Result, Context, anyhow};
use log::{warn, debug};

use crate::errors::SubtitleError;
use crate::timecode;

// @module: Cue model, SRT parsing and cue normalization

// @const: SRT timing line regex, captures both timecodes verbatim
static TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}:\d{2}:\d{2}(?:[,.]\d{1,3})?)\s*-->\s*(\d{1,2}:\d{2}:\d{2}(?:[,.]\d{1,3})?)").unwrap()
});

// @enum: Cue time, either as parsed or converted to seconds
#[derive(Debug, Clone, PartialEq)]
pub enum CueTime {
    Timecode(String),
    Seconds(f64),
}

impl CueTime {
    /// Value in seconds, converting a timecode if needed
    pub fn seconds(&self) -> Result<f64, SubtitleError> {
        match self {
            CueTime::Timecode(tc) => timecode::to_seconds(tc),
            CueTime::Seconds(secs) => Ok(*secs),
        }
    }

    /// Seconds value if already converted
    pub fn as_seconds(&self) -> Option<f64> {
        match self {
            CueTime::Seconds(secs) => Some(*secs),
            CueTime::Timecode(_) => None,
        }
    }
}

impl From<&str> for CueTime {
    fn from(tc: &str) -> Self {
        CueTime::Timecode(tc.to_string())
    }
}

impl From<String> for CueTime {
    fn from(tc: String) -> Self {
        CueTime::Timecode(tc)
    }
}

impl From<f64> for CueTime {
    fn from(secs: f64) -> Self {
        CueTime::Seconds(secs)
    }
}

impl fmt::Display for CueTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CueTime::Timecode(tc) => write!(f, "{}", tc),
            CueTime::Seconds(secs) => write!(f, "{:.1}", secs),
        }
    }
}

// @struct: Single subtitle display unit
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    // @field: Caption text, lines separated by '\n'
    pub text: String,

    // @field: Start time
    pub start_time: CueTime,

    // @field: End time
    pub end_time: CueTime,
}

impl Cue {
    /// Creates a new cue
    pub fn new(text: impl Into<String>, start_time: impl Into<CueTime>, end_time: impl Into<CueTime>) -> Self {
        Cue {
            text: text.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }

    /// Start and end in seconds
    pub fn window(&self) -> Result<(f64, f64), SubtitleError> {
        Ok((self.start_time.seconds()?, self.end_time.seconds()?))
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{} --> {}] {}", self.start_time, self.end_time, self.text.replace('\n', " / "))
    }
}

/// Cues fetched for one source and language
#[derive(Debug)]
pub struct CueTrack {
    /// File the cues were read from
    pub source_file: PathBuf,

    /// Cues in track order
    pub cues: Vec<Cue>,

    /// Caption language code
    pub language: String,
}

impl CueTrack {
    /// Create an empty track
    pub fn new(source_file: PathBuf, language: String) -> Self {
        CueTrack {
            source_file,
            cues: Vec::new(),
            language,
        }
    }

    /// Read and parse an SRT file
    pub fn from_srt_file<P: AsRef<Path>>(path: P, language: &str) -> Result<Self> {
        let path = path.as_ref();
        let cues = parse_srt_file(path)?;
        Ok(CueTrack {
            source_file: path.to_path_buf(),
            cues,
            language: language.to_string(),
        })
    }
}

impl fmt::Display for CueTrack {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Cue Track")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Language: {}", self.language)?;
        writeln!(f, "Cues: {}", self.cues.len())?;
        Ok(())
    }
}

/// Parse an SRT file into raw, timecode-valued cues
pub fn parse_srt_file(path: &Path) -> Result<Vec<Cue>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;
    parse_srt_string(&content)
}

/// Parse SRT content into raw, timecode-valued cues in file order
pub fn parse_srt_string(content: &str) -> Result<Vec<Cue>> {
    let mut cues = Vec::new();

    // State for the block being read
    let mut current_times: Option<(String, String)> = None;
    let mut current_text = String::new();
    let mut expecting_index = true;

    let mut finish_block = |times: Option<(String, String)>, text: &mut String, line_no: usize| {
        if let Some((start, end)) = times {
            if text.trim().is_empty() {
                warn!("Skipping empty subtitle block ending at line {}", line_no);
            } else {
                cues.push(Cue::new(text.trim().to_string(), start, end));
            }
        }
        text.clear();
    };

    let content = content.trim_start_matches('\u{feff}');
    let mut line_no = 0;
    for line in content.lines() {
        line_no += 1;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            finish_block(current_times.take(), &mut current_text, line_no);
            expecting_index = true;
            continue;
        }

        // Sequence number opening a block
        if expecting_index && current_times.is_none() && trimmed.parse::<usize>().is_ok() {
            expecting_index = false;
            continue;
        }

        if current_times.is_none() {
            if let Some(caps) = TIMING_REGEX.captures(trimmed) {
                current_times = Some((caps[1].to_string(), caps[2].to_string()));
                expecting_index = false;
                continue;
            }
            warn!("Unexpected text at line {} before a timing line: {}", line_no, trimmed);
            continue;
        }

        if !current_text.is_empty() {
            current_text.push('\n');
        }
        current_text.push_str(trimmed);
    }
    finish_block(current_times.take(), &mut current_text, line_no);

    if cues.is_empty() {
        return Err(anyhow!("No valid subtitle entries were found in the SRT content"));
    }

    debug!("Parsed {} raw cues", cues.len());
    Ok(cues)
}

/// Normalize raw cues: dedup rolling repeats, drop carried-over lines,
/// close timing gaps and convert times to seconds.
///
/// The order of the steps matters; dedup and line stripping see the raw
/// text, gap closing sees the raw start times of the surviving cues.
///
/// Cues whose times are all in seconds are already normalized and come back
/// unchanged, since their raw text is gone.
pub fn normalize(cues: &[Cue]) -> Result<Vec<Cue>, SubtitleError> {
    if is_normalized(cues) {
        debug!("{} cues already normalized", cues.len());
        return Ok(cues.to_vec());
    }

    let kept = drop_rolling_repeats(cues);
    let stripped = kept.into_iter().map(strip_carried_line).collect::<Vec<_>>();
    let closed = close_gaps(stripped);
    let normalized = convert_times(closed)?;

    debug!("Normalized {} raw cues into {}", cues.len(), normalized.len());
    Ok(normalized)
}

fn is_normalized(cues: &[Cue]) -> bool {
    cues.iter().all(|cue| cue.start_time.as_seconds().is_some() && cue.end_time.as_seconds().is_some())
}

/// Keep a cue unless its text is contained in the previously kept cue's text
pub fn drop_rolling_repeats(cues: &[Cue]) -> Vec<Cue> {
    let mut kept: Vec<Cue> = Vec::with_capacity(cues.len());
    for cue in cues {
        let repeated = kept.last().is_some_and(|prev| prev.text.contains(cue.text.as_str()));
        if !repeated {
            kept.push(cue.clone());
        }
    }
    kept
}

/// Rolling captions repeat the previous line first; keep only the second line
pub fn strip_carried_line(mut cue: Cue) -> Cue {
    if let Some(after) = cue.text.split('\n').nth(1) {
        cue.text = after.to_string();
    }
    cue
}

/// Snap each cue's end to the next cue's start; the last cue is untouched
pub fn close_gaps(mut cues: Vec<Cue>) -> Vec<Cue> {
    for i in 1..cues.len() {
        let next_start = cues[i].start_time.clone();
        cues[i - 1].end_time = next_start;
    }
    cues
}

fn convert_times(cues: Vec<Cue>) -> Result<Vec<Cue>, SubtitleError> {
    cues.into_iter()
        .map(|cue| {
            let start = cue.start_time.seconds()?;
            let end = cue.end_time.seconds()?;
            Ok(Cue {
                text: cue.text,
                start_time: CueTime::Seconds(timecode::round_tenths(start)),
                end_time: CueTime::Seconds(timecode::round_tenths(end)),
            })
        })
        .collect()
}
