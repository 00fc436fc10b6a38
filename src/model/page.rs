//! Page geometry.

use serde::{Deserialize, Serialize};

/// Size of one page in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    /// Page width
    pub width: f64,
    /// Page height, needed to flip document space into display space
    pub height: f64,
}

impl PageGeometry {
    /// Create page geometry.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// US Letter (612 x 792), used when a page has no usable MediaBox.
    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }

    /// Whether the page is wider than tall.
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::letter()
    }
}
