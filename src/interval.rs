/*!
 * Clip intervals and cue remapping.
 *
 * An ordered list of source intervals defines both which spans of the video
 * are cut out and the output timeline they are concatenated into: interval 1
 * starts at 0, interval 2 right after interval 1 ends, and so on. Cues are
 * selected per interval and rebased onto that timeline.
 */

use std::fmt;
use std::str::FromStr;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::SubtitleError;
use crate::subtitle_processor::{Cue, CueTime};
use crate::timecode::{self, round_tenths};

/// A `(from, to)` span of the source video, as timecodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "(String, String)", into = "(String, String)")]
pub struct Interval {
    from: String,
    to: String,
    from_secs: f64,
    to_secs: f64,
}

impl Interval {
    /// Create an interval; `to` must be strictly after `from`
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Result<Self, SubtitleError> {
        let from = from.into();
        let to = to.into();
        let from_secs = timecode::to_seconds(&from)?;
        let to_secs = timecode::to_seconds(&to)?;

        if to_secs <= from_secs {
            return Err(SubtitleError::InvalidInterval {
                from,
                to,
                reason: "end must be strictly after start".to_string(),
            });
        }

        Ok(Self { from, to, from_secs, to_secs })
    }

    /// Build a list of intervals from timecode pairs
    pub fn from_pairs<S: AsRef<str>>(pairs: &[[S; 2]]) -> Result<Vec<Self>, SubtitleError> {
        pairs
            .iter()
            .map(|[from, to]| Self::new(from.as_ref(), to.as_ref()))
            .collect()
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn from_secs(&self) -> f64 {
        self.from_secs
    }

    pub fn to_secs(&self) -> f64 {
        self.to_secs
    }

    /// Length of the interval on the output timeline
    pub fn duration(&self) -> f64 {
        round_tenths(self.to_secs - self.from_secs)
    }

    /// Whether a cue lies fully inside this interval
    pub fn contains(&self, start: f64, end: f64) -> bool {
        start >= self.from_secs && end <= self.to_secs
    }
}

impl TryFrom<(String, String)> for Interval {
    type Error = SubtitleError;

    fn try_from((from, to): (String, String)) -> Result<Self, Self::Error> {
        Self::new(from, to)
    }
}

impl From<Interval> for (String, String) {
    fn from(interval: Interval) -> Self {
        (interval.from, interval.to)
    }
}

/// Parses the CLI form `FROM-TO`, e.g. `00:01:19-00:01:40`
impl FromStr for Interval {
    type Err = SubtitleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (from, to) = s.split_once('-').ok_or_else(|| SubtitleError::InvalidInterval {
            from: s.to_string(),
            to: String::new(),
            reason: "expected FROM-TO".to_string(),
        })?;
        Self::new(from.trim(), to.trim())
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

/// Running output-timeline offset at which each interval starts
pub fn cumulative_offsets(intervals: &[Interval]) -> Vec<f64> {
    let mut offsets = Vec::with_capacity(intervals.len());
    let mut total = 0.0;
    for interval in intervals {
        offsets.push(round_tenths(total));
        total += interval.to_secs - interval.from_secs;
    }
    offsets
}

/// Select the cues inside each interval and rebase them onto the
/// concatenated output timeline. Returns one list per interval, in order.
///
/// Cues straddling an interval boundary are dropped, never truncated.
pub fn remap_cues(cues: &[Cue], intervals: &[Interval]) -> Result<Vec<Vec<Cue>>, SubtitleError> {
    let windows = cues
        .iter()
        .map(|cue| cue.window())
        .collect::<Result<Vec<_>, _>>()?;

    let offsets = cumulative_offsets(intervals);

    let remapped = intervals
        .iter()
        .zip(offsets)
        .enumerate()
        .map(|(index, (interval, offset))| {
            let selected: Vec<Cue> = cues
                .iter()
                .zip(&windows)
                .filter(|(_, (start, end))| interval.contains(*start, *end))
                .map(|(cue, (start, end))| Cue {
                    text: cue.text.clone(),
                    start_time: CueTime::Seconds(round_tenths(start - interval.from_secs + offset)),
                    end_time: CueTime::Seconds(round_tenths(end - interval.from_secs + offset)),
                })
                .collect();

            debug!(
                "Interval {} ({}): {} cue(s), output offset {:.1}s",
                index + 1,
                interval,
                selected.len(),
                offset
            );
            selected
        })
        .collect();

    Ok(remapped)
}

/// Remap and flatten into the single cue stream used for overlays
pub fn remap_flattened(cues: &[Cue], intervals: &[Interval]) -> Result<Vec<Cue>, SubtitleError> {
    Ok(remap_cues(cues, intervals)?.into_iter().flatten().collect())
}

/// Seek/duration instruction for cutting one interval out of the source
#[derive(Debug, Clone, PartialEq)]
pub struct ClipSpan {
    /// Interval position, which is also the concat position
    pub index: usize,
    /// Seek target, the interval's original `from` timecode
    pub seek: String,
    pub start_secs: f64,
    pub duration_secs: f64,
}

impl ClipSpan {
    pub fn from_interval(index: usize, interval: &Interval) -> Self {
        Self {
            index,
            seek: interval.from.clone(),
            start_secs: interval.from_secs,
            duration_secs: interval.duration(),
        }
    }
}

/// Seek/duration pairs for every interval, in order
pub fn plan_spans(intervals: &[Interval]) -> Vec<ClipSpan> {
    intervals
        .iter()
        .enumerate()
        .map(|(index, interval)| ClipSpan::from_interval(index, interval))
        .collect()
}
