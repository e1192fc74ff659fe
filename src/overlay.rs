/*!
 * Caption overlays.
 *
 * Turns remapped cues into positioned text overlays for ffmpeg's `drawtext`
 * filter. Short cues get a single line near the bottom of the frame; long
 * cues are wrapped into two smaller lines sharing the same visibility window.
 */

use std::path::PathBuf;
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::errors::SubtitleError;
use crate::subtitle_processor::Cue;

/// Layout and typography of burned-in captions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    /// Font file passed to drawtext (ffmpeg default font when absent)
    #[serde(default)]
    pub font_file: Option<PathBuf>,

    #[serde(default = "default_font_color")]
    pub font_color: String,

    /// Font size of single-line captions
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Font size of both lines of a wrapped caption
    #[serde(default = "default_multiline_font_size")]
    pub multiline_font_size: u32,

    /// Horizontal position expression
    #[serde(default = "default_x")]
    pub x: String,

    /// Vertical position of single-line captions
    #[serde(default = "default_baseline_y")]
    pub baseline_y: String,

    /// Vertical position of the first wrapped line
    #[serde(default = "default_head_y")]
    pub head_y: String,

    /// Vertical position of the second wrapped line
    #[serde(default = "default_tail_y")]
    pub tail_y: String,

    /// Captions longer than this many characters are wrapped
    #[serde(default = "default_max_single_line_chars")]
    pub max_single_line_chars: usize,

    /// Wrap point is the last space within this many leading characters
    #[serde(default = "default_wrap_search_chars")]
    pub wrap_search_chars: usize,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            font_file: None,
            font_color: default_font_color(),
            font_size: default_font_size(),
            multiline_font_size: default_multiline_font_size(),
            x: default_x(),
            baseline_y: default_baseline_y(),
            head_y: default_head_y(),
            tail_y: default_tail_y(),
            max_single_line_chars: default_max_single_line_chars(),
            wrap_search_chars: default_wrap_search_chars(),
        }
    }
}

fn default_font_color() -> String {
    "white".to_string()
}

fn default_font_size() -> u32 {
    48
}

fn default_multiline_font_size() -> u32 {
    36
}

fn default_x() -> String {
    "(main_w/2-text_w/2)".to_string()
}

fn default_baseline_y() -> String {
    "(main_h-70)".to_string()
}

fn default_head_y() -> String {
    "(main_h-86)".to_string()
}

fn default_tail_y() -> String {
    "(main_h-44)".to_string()
}

fn default_max_single_line_chars() -> usize {
    30
}

fn default_wrap_search_chars() -> usize {
    24
}

// @struct: One positioned, timed text draw
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayDescriptor {
    pub text: String,
    pub font_size: u32,
    pub x: String,
    pub y: String,
    // @field: Output-timeline seconds
    pub visible_from: f64,
    pub visible_to: f64,
}

impl OverlayDescriptor {
    /// Render as an ffmpeg `drawtext` filter
    pub fn to_drawtext(&self, style: &OverlayStyle) -> String {
        let mut options = Vec::with_capacity(9);
        if let Some(font_file) = &style.font_file {
            options.push(format!("fontfile={}", escape_filter_value(&font_file.to_string_lossy())));
        }
        options.push(format!("fontcolor={}", style.font_color));
        options.push(format!("fontsize={}", self.font_size));
        options.push(format!("x={}", self.x));
        options.push(format!("y={}", self.y));
        options.push("expansion=none".to_string());
        options.push(format!("text={}", escape_filter_value(&self.text.replace('\n', " "))));
        options.push(format!(
            "enable='between(t,{:.1},{:.1})'",
            self.visible_from, self.visible_to
        ));

        format!("drawtext={}", options.join(":"))
    }
}

/// Overlays produced for a single cue
#[derive(Debug, Clone, PartialEq)]
pub struct CueOverlay {
    pub primary: OverlayDescriptor,
    // @field: Second line of a wrapped caption
    pub secondary: Option<OverlayDescriptor>,
}

impl CueOverlay {
    /// Lay out one cue
    pub fn from_cue(index: usize, cue: &Cue, style: &OverlayStyle) -> Result<Self, SubtitleError> {
        if cue.text.trim().is_empty() {
            return Err(SubtitleError::InvalidCue {
                index,
                reason: "cue has no text".to_string(),
            });
        }

        let (visible_from, visible_to) = cue.window().map_err(|e| SubtitleError::InvalidCue {
            index,
            reason: e.to_string(),
        })?;
        if !visible_from.is_finite() || !visible_to.is_finite() || visible_to < visible_from {
            return Err(SubtitleError::InvalidCue {
                index,
                reason: format!("unusable visibility window {:.1}..{:.1}", visible_from, visible_to),
            });
        }

        let descriptor = |text: String, font_size: u32, y: &str| OverlayDescriptor {
            text,
            font_size,
            x: style.x.clone(),
            y: y.to_string(),
            visible_from,
            visible_to,
        };

        if cue.text.chars().count() <= style.max_single_line_chars {
            return Ok(Self {
                primary: descriptor(cue.text.clone(), style.font_size, &style.baseline_y),
                secondary: None,
            });
        }

        let (head, tail) = split_caption(&cue.text, style.wrap_search_chars);
        Ok(Self {
            primary: descriptor(head, style.multiline_font_size, &style.head_y),
            secondary: Some(descriptor(tail, style.multiline_font_size, &style.tail_y)),
        })
    }

    /// Descriptors in draw order
    pub fn descriptors(self) -> impl Iterator<Item = OverlayDescriptor> {
        std::iter::once(self.primary).chain(self.secondary)
    }
}

/// Split a long caption at the last space within the first `search_chars`
/// characters. The tail keeps the space it was split on.
///
/// Without such a space the caption is cut at `search_chars` itself.
pub fn split_caption(text: &str, search_chars: usize) -> (String, String) {
    let chars: Vec<char> = text.chars().collect();
    let window = search_chars.min(chars.len());

    let pos = match chars[..window].iter().rposition(|c| *c == ' ') {
        Some(pos) if pos > 0 => pos,
        _ => window,
    };

    (chars[..pos].iter().collect(), chars[pos..].iter().collect())
}

/// Build overlays for a remapped cue stream, in order.
///
/// A cue that cannot be laid out is logged and skipped; the rest of the
/// captions are still drawn.
pub fn build_overlays(cues: &[Cue], style: &OverlayStyle) -> Vec<OverlayDescriptor> {
    let mut overlays = Vec::with_capacity(cues.len());
    for (index, cue) in cues.iter().enumerate() {
        match CueOverlay::from_cue(index, cue, style) {
            Ok(cue_overlay) => overlays.extend(cue_overlay.descriptors()),
            Err(e) => error!("Skipping caption: {}", e),
        }
    }

    debug!("Built {} overlay(s) from {} cue(s)", overlays.len(), cues.len());
    overlays
}

/// Escape a drawtext option value so it survives both the option parser
/// and the filtergraph parser.
pub fn escape_filter_value(value: &str) -> String {
    let option_level = escape_chars(value, &['\\', '\'', ':']);
    escape_chars(&option_level, &['\\', '\'', ',', ';', '[', ']'])
}

fn escape_chars(value: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
