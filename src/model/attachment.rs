//! Image attachments for image-kind fields.

use std::io::Cursor;

use image::ImageFormat;
use indexmap::IndexMap;
use serde::Serialize;

use crate::detect::sniff_image_mime;
use crate::error::{Error, Result};

/// An image bound to one field, stored as PNG.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageAttachment {
    /// Field the image belongs to
    pub field: String,

    /// Canonical PNG bytes
    #[serde(skip_serializing)]
    pub png: Vec<u8>,

    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// MIME type of the bytes originally supplied, if recognized
    pub source_mime: Option<String>,
}

impl ImageAttachment {
    /// Decode any supported raster format and re-encode it as PNG.
    pub fn normalize(field: impl Into<String>, data: &[u8]) -> Result<Self> {
        let source_mime = sniff_image_mime(data).map(str::to_string);
        let decoded = image::load_from_memory(data)?;
        let (width, height) = (decoded.width(), decoded.height());
        if width == 0 || height == 0 {
            return Err(Error::Image("image has no pixels".to_string()));
        }

        let mut png = Vec::new();
        decoded.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        Ok(Self {
            field: field.into(),
            png,
            width,
            height,
            source_mime,
        })
    }

    /// Size of the stored PNG in bytes.
    pub fn size(&self) -> usize {
        self.png.len()
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// Attachments keyed by field name; they persist until replaced or removed.
#[derive(Debug, Clone, Default)]
pub struct ImageStore {
    images: IndexMap<String, ImageAttachment>,
}

impl ImageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the attachment for its field.
    pub fn insert(&mut self, attachment: ImageAttachment) -> Option<ImageAttachment> {
        self.images.insert(attachment.field.clone(), attachment)
    }

    /// Attachment for a field.
    pub fn get(&self, field: &str) -> Option<&ImageAttachment> {
        self.images.get(field)
    }

    /// Remove the attachment for a field.
    pub fn remove(&mut self, field: &str) -> Option<ImageAttachment> {
        self.images.shift_remove(field)
    }

    /// Whether a field has an attachment.
    pub fn contains(&self, field: &str) -> bool {
        self.images.contains_key(field)
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ImageAttachment> {
        self.images.values()
    }

    /// Number of attachments.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Drop all attachments.
    pub fn clear(&mut self) {
        self.images.clear();
    }
}
