//! Error types for formfill library.

use std::io;
use thiserror::Error;

/// Result type alias for formfill operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading, rendering, or generating a form.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not recognized as a PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// The document loaded but cannot serve as a form template.
    #[error("Document load error: {0}")]
    DocumentLoad(String),

    /// The value record text is not a well-formed JSON object.
    #[error("Value record is not valid: {0}")]
    ValueRecordParse(String),

    /// A single field's geometry or type could not be read.
    #[error("Field '{name}': {reason}")]
    Field {
        /// Fully qualified field name
        name: String,
        /// What went wrong
        reason: String,
    },

    /// Drawing a single field into the output failed.
    #[error("Generation error for '{field}': {reason}")]
    Generation {
        /// Field being drawn
        field: String,
        /// What went wrong
        reason: String,
    },

    /// Image decoding or re-encoding failed.
    #[error("Image error: {0}")]
    Image(String),

    /// Text contains characters the selected font cannot encode.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Page index is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(usize, usize),

    /// No field with this name exists in the registry.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Image attachments are only accepted for image fields.
    #[error("Field '{0}' does not accept images")]
    NotImageField(String),

    /// An operation requires a loaded document.
    #[error("No document loaded")]
    NoDocument,

    /// A page cache was produced for a document that is no longer loaded.
    #[error("Stale page cache: built for document {built_for}, current is {current}")]
    StaleCache {
        /// Document the cache was built for
        built_for: u64,
        /// Document currently loaded
        current: u64,
    },

    /// The page rasterizer reported a failure.
    #[error("Rasterization error: {0}")]
    Raster(String),

    /// The form profile is malformed.
    #[error("Profile error: {0}")]
    Profile(String),

    /// Error during overlay serialization.
    #[error("Rendering error: {0}")]
    Render(String),
}

impl Error {
    /// Build a per-field error.
    pub fn field(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Field {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Build a per-field generation error.
    pub fn generation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Generation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is scoped to a single field and can be skipped.
    pub fn is_per_field(&self) -> bool {
        matches!(
            self,
            Error::Field { .. } | Error::Generation { .. } | Error::Image(_) | Error::Encoding(_)
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Render(format!("JSON serialization error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Encrypted;
        assert_eq!(err.to_string(), "Document is encrypted");

        let err = Error::PageOutOfRange(4, 3);
        assert_eq!(
            err.to_string(),
            "Page 4 is out of range (document has 3 pages)"
        );

        let err = Error::field("Age", "missing /Rect");
        assert_eq!(err.to_string(), "Field 'Age': missing /Rect");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_per_field_classification() {
        assert!(Error::generation("AC", "bad font").is_per_field());
        assert!(Error::Encoding("\u{4e2d}".into()).is_per_field());
        assert!(!Error::ValueRecordParse("eof".into()).is_per_field());
        assert!(!Error::UnknownFormat.is_per_field());
    }
}
