//! The two renderings of a filled form: the editable overlay and the
//! generated PDF.

mod flatten;
mod generate;
mod json;
mod options;
mod overlay;
mod resources;

pub use flatten::{flatten_form, FlattenReport};
pub use generate::{generate, GenerateReport, GeneratedDocument};
pub use json::{overlay_to_json, to_json, JsonFormat};
pub use options::{GenerateOptions, PageSelection, RenderOptions};
pub use overlay::{
    render_overlay, AttachedImage, CheckboxElement, DebugBox, ImageElement, OverlayElement,
    OverlayPage, TextElement, WrapMode,
};
