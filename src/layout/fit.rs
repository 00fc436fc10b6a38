//! Text-fit heuristic: pick a font size that keeps a value inside its box.
//!
//! The curve is empirical tuning for one document family, so every constant
//! lives in [`FitCurve`] and can be replaced per profile.

use serde::{Deserialize, Serialize};

/// Tuning constants for [`fit_font_size`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitCurve {
    /// Size used for empty text
    pub empty_size: f64,

    /// Assumed average glyph width when estimating wrapped lines
    pub avg_char_width: f64,
    /// Share of the per-line height used by the glyphs in multiline boxes
    pub multiline_fill: f64,
    /// Smallest multiline size
    pub multiline_min: f64,
    /// Largest multiline size
    pub multiline_max: f64,

    /// Longest value treated as "very short"
    pub tiny_max_len: usize,
    /// Height share for very short values
    pub tiny_height_ratio: f64,
    /// Cap for very short values
    pub tiny_max: f64,

    /// Longest value treated as "short"
    pub short_max_len: usize,
    /// Height share for short values
    pub short_height_ratio: f64,
    /// Cap for short values
    pub short_max: f64,

    /// Height share for long values
    pub long_height_ratio: f64,
    /// Multiplier on `width / length` for long values
    pub long_width_factor: f64,
    /// Smallest size for long values
    pub long_min: f64,
    /// Largest size for long values
    pub long_max: f64,
}

impl Default for FitCurve {
    fn default() -> Self {
        Self {
            empty_size: 10.0,
            avg_char_width: 5.0,
            multiline_fill: 0.85,
            multiline_min: 6.0,
            multiline_max: 11.0,
            tiny_max_len: 3,
            tiny_height_ratio: 0.65,
            tiny_max: 20.0,
            short_max_len: 6,
            short_height_ratio: 0.55,
            short_max: 16.0,
            long_height_ratio: 0.6,
            long_width_factor: 1.6,
            long_min: 7.0,
            long_max: 14.0,
        }
    }
}

/// Which rule of the curve produced a size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitBranch {
    /// Empty text
    Empty,
    /// Multiline box
    Multiline,
    /// Single line, very short value
    Tiny,
    /// Single line, short value
    Short,
    /// Single line, long value
    Long,
}

/// Branch of the curve that applies to a value.
pub fn fit_branch(text: &str, multiline: bool, curve: &FitCurve) -> FitBranch {
    let len = text.chars().count();
    if len == 0 {
        FitBranch::Empty
    } else if multiline {
        FitBranch::Multiline
    } else if len <= curve.tiny_max_len {
        FitBranch::Tiny
    } else if len <= curve.short_max_len {
        FitBranch::Short
    } else {
        FitBranch::Long
    }
}

/// Font size in points for `text` inside a `width` x `height` box.
///
/// Deterministic and pure; length is counted in characters.
pub fn fit_font_size(
    text: &str,
    width: f64,
    height: f64,
    multiline: bool,
    curve: &FitCurve,
) -> f64 {
    let len = text.chars().count();
    match fit_branch(text, multiline, curve) {
        FitBranch::Empty => curve.empty_size,
        FitBranch::Multiline => {
            let literal_lines = text.split('\n').count();
            let chars_per_line = width / curve.avg_char_width;
            let estimated_lines = if chars_per_line > 0.0 {
                (len as f64 / chars_per_line).ceil()
            } else {
                f64::INFINITY
            };
            let total_lines = (literal_lines as f64).max(estimated_lines);
            let size = (height / total_lines) * curve.multiline_fill;
            clamp(size, curve.multiline_min, curve.multiline_max)
        }
        FitBranch::Tiny => (height * curve.tiny_height_ratio).min(curve.tiny_max),
        FitBranch::Short => (height * curve.short_height_ratio).min(curve.short_max),
        FitBranch::Long => {
            let by_height = height * curve.long_height_ratio;
            let by_width = width / len as f64 * curve.long_width_factor;
            clamp(by_height.min(by_width), curve.long_min, curve.long_max)
        }
    }
}

fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}
