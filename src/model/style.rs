//! Per-field style overrides and the fully resolved style.

use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    /// Start 2 units inside the left edge
    #[default]
    Left,
    /// Centered on the measured width
    Center,
    /// End 2 units inside the right edge
    Right,
}

impl FromStr for Align {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Align::Left),
            "center" | "centre" => Ok(Align::Center),
            "right" => Ok(Align::Right),
            other => Err(format!("unknown alignment '{}'", other)),
        }
    }
}

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
}

impl Color {
    /// Black.
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn parse_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Color {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    /// Format as lowercase `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Components in `0.0..=1.0` for the PDF `rg` operator.
    pub fn to_unit_rgb(&self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

/// Optional subset of style properties for one field.
///
/// Absent properties fall through to the next tier of the cascade.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleOverride {
    /// Font size in points; accepts `12` or `"12"` on input
    #[serde(
        default,
        deserialize_with = "deserialize_font_size",
        skip_serializing_if = "Option::is_none"
    )]
    pub font_size: Option<f64>,

    /// Horizontal alignment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,

    /// Hex color (`#rrggbb`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Bold weight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,

    /// Oblique slant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,

    /// Horizontal shift in points, applied after alignment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_offset: Option<f64>,

    /// Vertical shift in points (positive moves up), applied after alignment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_offset: Option<f64>,
}

/// User style overrides keyed by field name, as stored under `_styles`.
pub type StyleOverrides = IndexMap<String, StyleOverride>;

impl StyleOverride {
    /// Create an empty override.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the font size.
    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }

    /// Set the alignment.
    pub fn with_align(mut self, align: Align) -> Self {
        self.align = Some(align);
        self
    }

    /// Set the color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Set bold.
    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = Some(bold);
        self
    }

    /// Set italic.
    pub fn with_italic(mut self, italic: bool) -> Self {
        self.italic = Some(italic);
        self
    }

    /// Set the horizontal offset.
    pub fn with_x_offset(mut self, offset: f64) -> Self {
        self.x_offset = Some(offset);
        self
    }

    /// Set the vertical offset.
    pub fn with_y_offset(mut self, offset: f64) -> Self {
        self.y_offset = Some(offset);
        self
    }

    /// True when no property is set.
    pub fn is_empty(&self) -> bool {
        self.font_size.is_none()
            && self.align.is_none()
            && self.color.is_none()
            && self.bold.is_none()
            && self.italic.is_none()
            && self.x_offset.is_none()
            && self.y_offset.is_none()
    }

    /// Shallow merge: properties set on `upper` replace ours, the rest stay.
    pub fn merged_with(&self, upper: &StyleOverride) -> StyleOverride {
        StyleOverride {
            font_size: upper.font_size.or(self.font_size),
            align: upper.align.or(self.align),
            color: upper.color.clone().or_else(|| self.color.clone()),
            bold: upper.bold.or(self.bold),
            italic: upper.italic.or(self.italic),
            x_offset: upper.x_offset.or(self.x_offset),
            y_offset: upper.y_offset.or(self.y_offset),
        }
    }

    /// Whether a property is set.
    pub fn has(&self, prop: StyleProperty) -> bool {
        match prop {
            StyleProperty::FontSize => self.font_size.is_some(),
            StyleProperty::Align => self.align.is_some(),
            StyleProperty::Color => self.color.is_some(),
            StyleProperty::Bold => self.bold.is_some(),
            StyleProperty::Italic => self.italic.is_some(),
            StyleProperty::XOffset => self.x_offset.is_some(),
            StyleProperty::YOffset => self.y_offset.is_some(),
        }
    }

    /// Remove one property.
    pub fn clear(&mut self, prop: StyleProperty) {
        match prop {
            StyleProperty::FontSize => self.font_size = None,
            StyleProperty::Align => self.align = None,
            StyleProperty::Color => self.color = None,
            StyleProperty::Bold => self.bold = None,
            StyleProperty::Italic => self.italic = None,
            StyleProperty::XOffset => self.x_offset = None,
            StyleProperty::YOffset => self.y_offset = None,
        }
    }

    /// Store one property value.
    pub fn set(&mut self, value: StyleValue) {
        match value {
            StyleValue::FontSize(v) => self.font_size = Some(v),
            StyleValue::Align(a) => self.align = Some(a),
            StyleValue::Color(c) => self.color = Some(c),
            StyleValue::Bold(b) => self.bold = Some(b),
            StyleValue::Italic(b) => self.italic = Some(b),
            StyleValue::XOffset(v) => self.x_offset = Some(v),
            StyleValue::YOffset(v) => self.y_offset = Some(v),
        }
    }
}

/// Name of a single style property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleProperty {
    /// `fontSize`
    FontSize,
    /// `align`
    Align,
    /// `color`
    Color,
    /// `bold`
    Bold,
    /// `italic`
    Italic,
    /// `xOffset`
    XOffset,
    /// `yOffset`
    YOffset,
}

impl StyleProperty {
    /// JSON key under `_styles`.
    pub fn key(&self) -> &'static str {
        match self {
            StyleProperty::FontSize => "fontSize",
            StyleProperty::Align => "align",
            StyleProperty::Color => "color",
            StyleProperty::Bold => "bold",
            StyleProperty::Italic => "italic",
            StyleProperty::XOffset => "xOffset",
            StyleProperty::YOffset => "yOffset",
        }
    }
}

impl FromStr for StyleProperty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fontSize" | "font-size" | "size" => Ok(StyleProperty::FontSize),
            "align" => Ok(StyleProperty::Align),
            "color" => Ok(StyleProperty::Color),
            "bold" => Ok(StyleProperty::Bold),
            "italic" => Ok(StyleProperty::Italic),
            "xOffset" | "x-offset" => Ok(StyleProperty::XOffset),
            "yOffset" | "y-offset" => Ok(StyleProperty::YOffset),
            other => Err(format!("unknown style property '{}'", other)),
        }
    }
}

/// A typed value for one style property.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    /// Font size in points
    FontSize(f64),
    /// Alignment
    Align(Align),
    /// Hex color
    Color(String),
    /// Bold flag
    Bold(bool),
    /// Italic flag
    Italic(bool),
    /// Horizontal offset
    XOffset(f64),
    /// Vertical offset
    YOffset(f64),
}

impl StyleValue {
    /// Property this value belongs to.
    pub fn property(&self) -> StyleProperty {
        match self {
            StyleValue::FontSize(_) => StyleProperty::FontSize,
            StyleValue::Align(_) => StyleProperty::Align,
            StyleValue::Color(_) => StyleProperty::Color,
            StyleValue::Bold(_) => StyleProperty::Bold,
            StyleValue::Italic(_) => StyleProperty::Italic,
            StyleValue::XOffset(_) => StyleProperty::XOffset,
            StyleValue::YOffset(_) => StyleProperty::YOffset,
        }
    }

    /// False for a numeric value that is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        match self {
            StyleValue::FontSize(v) | StyleValue::XOffset(v) | StyleValue::YOffset(v) => {
                v.is_finite()
            }
            _ => true,
        }
    }

    /// Parse a raw editor value for a property. Empty input yields `None`,
    /// which callers treat as "clear".
    pub fn parse(prop: StyleProperty, raw: &str) -> Result<Option<Self>, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        let number = || {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| format!("'{}' is not a number", raw))
        };
        let flag = || {
            raw.parse::<bool>()
                .map_err(|_| format!("'{}' is not true/false", raw))
        };
        let value = match prop {
            StyleProperty::FontSize => StyleValue::FontSize(number()?),
            StyleProperty::Align => StyleValue::Align(raw.parse()?),
            StyleProperty::Color => {
                Color::parse_hex(raw).ok_or_else(|| format!("'{}' is not a #rrggbb color", raw))?;
                StyleValue::Color(raw.to_string())
            }
            StyleProperty::Bold => StyleValue::Bold(flag()?),
            StyleProperty::Italic => StyleValue::Italic(flag()?),
            StyleProperty::XOffset => StyleValue::XOffset(number()?),
            StyleProperty::YOffset => StyleValue::YOffset(number()?),
        };
        Ok(Some(value))
    }
}

/// Fully resolved style for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveStyle {
    /// Font size in points
    pub font_size: f64,
    /// Horizontal alignment
    pub align: Align,
    /// Text color
    pub color: Color,
    /// Bold weight
    pub bold: bool,
    /// Oblique slant
    pub italic: bool,
    /// Horizontal shift in points
    pub x_offset: f64,
    /// Vertical shift in points
    pub y_offset: f64,
}

fn deserialize_font_size<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::Text(s)) => s.trim().parse::<f64>().ok(),
        None => None,
    }
    .filter(|n| n.is_finite()))
}
