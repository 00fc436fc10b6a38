//! Layout primitives shared by the overlay renderer and the generator.
//!
//! Everything here is pure and reentrant: coordinate transform, style
//! cascade, text-fit heuristic, font metrics and line wrapping.

mod cascade;
mod fit;
mod fonts;
mod transform;
mod wrap;

pub use cascade::{apply_style_edit, toggle_style, StyleCascade, StyleEdit, StyleToggle};
pub use fit::{fit_branch, fit_font_size, FitBranch, FitCurve};
pub use fonts::StandardFont;
pub use transform::{
    fit_scale, to_display, DisplayRect, ZoomState, MAX_ZOOM_PERCENT, MIN_ZOOM_PERCENT,
};
pub use wrap::wrap_lines;
