//! Field descriptors: identity, geometry and kind of each form field.

use serde::{Deserialize, Serialize};

/// Rectangle in document space (points, origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    /// Left edge
    pub x: f64,
    /// Bottom edge
    pub y: f64,
    /// Width, never negative
    pub width: f64,
    /// Height, never negative
    pub height: f64,
}

impl Geometry {
    /// Create a geometry from origin and size.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from a PDF `/Rect` whose corners may come in any order.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x: x1.min(x2),
            y: y1.min(y2),
            width: (x2 - x1).abs(),
            height: (y2 - y1).abs(),
        }
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Top edge.
    pub fn top(&self) -> f64 {
        self.y + self.height
    }
}

/// How the engine treats a field when rendering and generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Free text, single line or multiline
    Text,
    /// Two-state toggle drawn as a check glyph
    Checkbox,
    /// Raster image slot filled from an attachment
    Image,
}

impl FieldKind {
    /// Label used in field listings.
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Text => "Text",
            FieldKind::Checkbox => "Checkbox",
            FieldKind::Image => "Image",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Widget type as declared by the document (`/FT` plus `/Ff` flags).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetType {
    /// `/Tx`
    Text,
    /// `/Btn` without radio or pushbutton flags
    Checkbox,
    /// `/Btn` with the radio flag
    Radio,
    /// `/Btn` with the pushbutton flag
    PushButton,
    /// `/Ch`
    Choice,
    /// `/Sig`
    Signature,
    /// Missing or unrecognized `/FT`
    #[default]
    Unknown,
}

const FLAG_RADIO: u32 = 1 << 15;
const FLAG_PUSHBUTTON: u32 = 1 << 16;

impl WidgetType {
    /// Classify from the (possibly inherited) `/FT` name and `/Ff` flags.
    pub fn from_pdf(field_type: Option<&[u8]>, flags: u32) -> Self {
        match field_type {
            Some(b"Tx") => WidgetType::Text,
            Some(b"Btn") if flags & FLAG_PUSHBUTTON != 0 => WidgetType::PushButton,
            Some(b"Btn") if flags & FLAG_RADIO != 0 => WidgetType::Radio,
            Some(b"Btn") => WidgetType::Checkbox,
            Some(b"Ch") => WidgetType::Choice,
            Some(b"Sig") => WidgetType::Signature,
            _ => WidgetType::Unknown,
        }
    }
}

/// One named field of the loaded form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Fully qualified field name (unique key)
    pub name: String,
    /// First widget rectangle
    pub geometry: Geometry,
    /// 0-based page the field is drawn on
    pub page_index: usize,
    /// Rendering kind, decided once at registry build
    pub kind: FieldKind,
    /// Widget type declared by the document
    pub widget: WidgetType,
    /// Tall enough to hold several lines
    pub is_multiline: bool,
}
