//! Data model shared by the overlay and generation paths.
//!
//! Field descriptors and page geometry describe the loaded template and stay
//! fixed until a new document replaces them. The value record and its style
//! overrides belong to the caller and are read fresh on every render.

mod attachment;
mod field;
mod page;
mod style;
mod value;

pub use attachment::{ImageAttachment, ImageStore};
pub use field::{FieldDescriptor, FieldKind, Geometry, WidgetType};
pub use page::PageGeometry;
pub use style::{
    Align, Color, EffectiveStyle, StyleOverride, StyleOverrides, StyleProperty, StyleValue,
};
pub use value::{FieldValue, ValueRecord, STYLES_KEY};
