//! Document space to display space.
//!
//! Document space has its origin at the bottom-left of the page and uses
//! unscaled points. Display space has its origin at the top-left and uses
//! pixels at the current display scale.

use serde::{Deserialize, Serialize};

use crate::model::Geometry;

/// Rectangle in display space (pixels, origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayRect {
    /// Distance from the left edge of the page
    pub left: f64,
    /// Distance from the top edge of the page
    pub top: f64,
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
}

impl DisplayRect {
    /// Shift by a style offset given in points. Positive `y_offset` moves up.
    pub fn offset(self, x_offset: f64, y_offset: f64, scale: f64) -> Self {
        Self {
            left: self.left + x_offset * scale,
            top: self.top - y_offset * scale,
            ..self
        }
    }
}

/// Map a field rectangle into display space.
///
/// `top = (page_height - y - height) * scale`; the vertical flip is required
/// because the two spaces run in opposite directions.
pub fn to_display(geometry: &Geometry, page_height: f64, scale: f64) -> DisplayRect {
    DisplayRect {
        left: geometry.x * scale,
        top: (page_height - geometry.y - geometry.height) * scale,
        width: geometry.width * scale,
        height: geometry.height * scale,
    }
}

/// Scale that fits the first page into a container, or `None` if the
/// container is too narrow to measure.
pub fn fit_scale(
    container_width: f64,
    page_width: f64,
    margin: f64,
    min_container_width: f64,
) -> Option<f64> {
    if container_width > min_container_width && page_width > 0.0 {
        Some((container_width - margin) / page_width)
    } else {
        None
    }
}

/// Lowest zoom the slider offers, in percent.
pub const MIN_ZOOM_PERCENT: u32 = 10;
/// Highest zoom the slider offers, in percent.
pub const MAX_ZOOM_PERCENT: u32 = 300;

/// The single global display scale and how it is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomState {
    /// Current display scale (1.0 = one pixel per point)
    pub scale: f64,
    /// Recompute the scale from the container width on every render
    pub auto_fit: bool,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            auto_fit: true,
        }
    }
}

impl ZoomState {
    /// Set an explicit zoom in percent; disables auto-fit.
    pub fn set_percent(&mut self, percent: u32) {
        self.auto_fit = false;
        self.scale = f64::from(percent.clamp(MIN_ZOOM_PERCENT, MAX_ZOOM_PERCENT)) / 100.0;
    }

    /// Flip auto-fit on or off.
    pub fn toggle_auto_fit(&mut self) {
        self.auto_fit = !self.auto_fit;
    }

    /// Recompute the scale for a container if auto-fit is on.
    pub fn refit(&mut self, container_width: f64, page_width: f64, margin: f64, min_width: f64) {
        if !self.auto_fit {
            return;
        }
        if let Some(scale) = fit_scale(container_width, page_width, margin, min_width) {
            self.scale = scale;
        }
    }

    /// Zoom as shown on the label.
    pub fn percent(&self) -> u32 {
        (self.scale * 100.0).round().max(0.0) as u32
    }

    /// Zoom as positioned on the slider.
    pub fn slider_percent(&self) -> u32 {
        self.percent().clamp(MIN_ZOOM_PERCENT, MAX_ZOOM_PERCENT)
    }
}
