//! # formfill
//!
//! Dual-rendering layout engine for filling PDF AcroForms.
//!
//! A flat record of named values is mapped onto the positioned fields of a
//! fixed-layout PDF and rendered two ways that line up with each other: an
//! overlay of editable elements in display pixels, and a final PDF with the
//! values drawn in as vector text and the native form flattened.
//!
//! ## Quick Start
//!
//! ```no_run
//! use formfill::{fill_bytes, FormProfile};
//!
//! fn main() -> formfill::Result<()> {
//!     let template = std::fs::read("sheet.pdf")?;
//!     let record = r#"{ "CharacterName": "Bree", "Inspiration": true }"#;
//!
//!     let filled = fill_bytes(&template, record, &FormProfile::dnd_5e())?;
//!     std::fs::write("filled.pdf", filled)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Field registry**: fields, widget geometry and pages read with `lopdf`
//! - **Page overrides**: per-field page corrections kept as profile data
//! - **Style cascade**: built-in defaults merged with user overrides
//! - **Text fitting**: font sizes chosen from box height and text length
//! - **Overlay**: positioned elements for a live editor, serializable to JSON
//! - **Generation**: text, check marks and images drawn, then flattened
//!
//! For interactive use, [`FormSession`] owns the loaded template and emits
//! [`events::SessionEvent`]s.

pub mod detect;
pub mod error;
pub mod events;
pub mod interact;
pub mod layout;
pub mod model;
pub mod parser;
pub mod profile;
pub mod raster;
pub mod render;
pub mod session;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use detect::{detect_format_from_bytes, detect_format_from_path, PdfFormat};
pub use error::{Error, Result};
pub use events::{FormObserver, SessionEvent};
pub use interact::{RecordStore, Refresh, StringRecordStore};
pub use model::{
    Align, EffectiveStyle, FieldDescriptor, FieldKind, FieldValue, Geometry, ImageAttachment,
    ImageStore, PageGeometry, StyleOverride, ValueRecord,
};
pub use parser::{ErrorMode, FieldRegistry, FormParser, LoadOptions};
pub use profile::FormProfile;
pub use raster::{DocumentId, PageCache, PageRasterizer, RasterPage};
pub use render::{
    GenerateOptions, GenerateReport, GeneratedDocument, JsonFormat, OverlayPage, PageSelection,
    RenderOptions,
};
pub use session::FormSession;

use std::path::Path;

/// Build the field registry of a PDF held in memory.
///
/// # Example
///
/// ```no_run
/// use formfill::{load_bytes, FormProfile};
///
/// let data = std::fs::read("sheet.pdf").unwrap();
/// let registry = load_bytes(&data, &FormProfile::default()).unwrap();
/// println!("Fields: {}", registry.len());
/// ```
pub fn load_bytes(data: &[u8], profile: &FormProfile) -> Result<FieldRegistry> {
    load_bytes_with_options(data, profile, LoadOptions::default())
}

/// Build the field registry with custom load options.
pub fn load_bytes_with_options(
    data: &[u8],
    profile: &FormProfile,
    options: LoadOptions,
) -> Result<FieldRegistry> {
    let parser = FormParser::from_bytes_with_options(data, options)?;
    FieldRegistry::build(&parser, profile)
}

/// Build the field registry of a PDF file.
///
/// # Example
///
/// ```no_run
/// use formfill::{load_file, FormProfile};
///
/// let registry = load_file("sheet.pdf", &FormProfile::dnd_5e()).unwrap();
/// for field in registry.iter() {
///     println!("{} on page {}", field.name, field.page_index + 1);
/// }
/// ```
pub fn load_file<P: AsRef<Path>>(path: P, profile: &FormProfile) -> Result<FieldRegistry> {
    let parser = FormParser::open(path)?;
    FieldRegistry::build(&parser, profile)
}

/// Fill a template with a textual value record and return flattened PDF
/// bytes.
pub fn fill_bytes(template: &[u8], record: &str, profile: &FormProfile) -> Result<Vec<u8>> {
    let record = ValueRecord::parse(record)?;
    let registry = load_bytes(template, profile)?;
    let generated = render::generate(
        template,
        &registry,
        &record,
        &ImageStore::new(),
        profile,
        &GenerateOptions::default(),
    )?;
    Ok(generated.bytes)
}

/// Fill a template file and write the result.
///
/// # Example
///
/// ```no_run
/// use formfill::{fill_file, FormProfile};
///
/// let record = std::fs::read_to_string("bree.json").unwrap();
/// fill_file("sheet.pdf", &record, "bree.pdf", &FormProfile::dnd_5e()).unwrap();
/// ```
pub fn fill_file<P: AsRef<Path>, Q: AsRef<Path>>(
    template: P,
    record: &str,
    output: Q,
    profile: &FormProfile,
) -> Result<()> {
    let data = std::fs::read(template)?;
    let filled = fill_bytes(&data, record, profile)?;
    std::fs::write(output, filled)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixtureField, FormFixture};

    #[test]
    fn test_fill_bytes_rejects_bad_record_first() {
        let err = fill_bytes(b"not a pdf", "[1, 2]", &FormProfile::default()).unwrap_err();
        assert!(matches!(err, Error::ValueRecordParse(_)));
    }

    #[test]
    fn test_fill_bytes_flattens() {
        let template = FormFixture::new()
            .field(FixtureField::text("Name", [50.0, 700.0, 250.0, 720.0], 0))
            .build();
        let filled = fill_bytes(&template, r#"{"Name": "Bree"}"#, &FormProfile::default()).unwrap();
        let registry = load_bytes(&filled, &FormProfile::default()).unwrap();
        assert!(registry.is_empty());
    }
}
