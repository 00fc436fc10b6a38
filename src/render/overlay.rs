//! Overlay rendering: positioned, editable elements in display pixels.
//!
//! The overlay is a pure function of the registry, the value record, the
//! image store and the profile. A host draws each [`OverlayPage`] on top of
//! the rasterized page and wires the elements back to the interaction
//! functions in [`crate::interact`].

use serde::Serialize;

use crate::error::Result;
use crate::layout::{fit_font_size, to_display, DisplayRect, StyleCascade};
use crate::model::{
    Align, EffectiveStyle, FieldDescriptor, FieldKind, ImageStore, PageGeometry, ValueRecord,
};
use crate::parser::FieldRegistry;
use crate::profile::FormProfile;

use super::options::RenderOptions;

/// How a text element wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WrapMode {
    /// Keep line breaks and wrap at the box edge
    PreWrap,
    /// Single line, never wrap
    NoWrap,
}

/// An editable text box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextElement {
    /// Field name
    pub field: String,
    /// Position after style offsets
    pub rect: DisplayRect,
    /// Current value; empty when none is stored
    pub value: String,
    /// Shown while the value is empty
    pub placeholder: String,
    /// Resolved style, font size in points
    pub style: EffectiveStyle,
    /// Font size in display pixels
    pub font_size_px: f64,
    /// Line height as a multiple of the font size
    pub line_height: f64,
    /// Wrapping behavior
    pub wrap: WrapMode,
    /// Tall box holding several lines
    pub multiline: bool,
    /// Single-line centered text, laid out with flex centering
    pub flex_center: bool,
    /// Very short single-line value
    pub compact: bool,
}

/// A clickable checkbox.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckboxElement {
    /// Field name
    pub field: String,
    /// Position
    pub rect: DisplayRect,
    /// Whether the glyph is shown
    pub checked: bool,
    /// Glyph drawn when checked
    pub glyph: String,
    /// Glyph size in display pixels
    pub glyph_px: f64,
    /// Human-readable name
    pub label: String,
}

/// Attached image metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachedImage {
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
    /// PNG size in bytes
    pub bytes: usize,
}

/// An image upload slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageElement {
    /// Field name
    pub field: String,
    /// Position
    pub rect: DisplayRect,
    /// Human-readable name
    pub label: String,
    /// Upload hint such as an aspect ratio
    pub hint: String,
    /// Attached image, shown cover-fitted
    pub attachment: Option<AttachedImage>,
}

/// One positioned element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OverlayElement {
    /// Text input
    Text(TextElement),
    /// Checkbox
    Checkbox(CheckboxElement),
    /// Image slot
    Image(ImageElement),
}

impl OverlayElement {
    /// Field the element edits.
    pub fn field(&self) -> &str {
        match self {
            OverlayElement::Text(e) => &e.field,
            OverlayElement::Checkbox(e) => &e.field,
            OverlayElement::Image(e) => &e.field,
        }
    }

    /// Element position.
    pub fn rect(&self) -> DisplayRect {
        match self {
            OverlayElement::Text(e) => e.rect,
            OverlayElement::Checkbox(e) => e.rect,
            OverlayElement::Image(e) => e.rect,
        }
    }
}

/// Outline of a field's untransformed box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugBox {
    /// Field name, used as the label
    pub field: String,
    /// Field kind
    pub kind: FieldKind,
    /// Position without style offsets
    pub rect: DisplayRect,
}

/// Overlay for one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayPage {
    /// 0-based page index
    pub page_index: usize,
    /// Page width in display pixels
    pub width_px: f64,
    /// Page height in display pixels
    pub height_px: f64,
    /// Display scale the page was laid out at
    pub scale: f64,
    /// Elements in document order
    pub elements: Vec<OverlayElement>,
    /// Debug boxes, when enabled
    pub debug_boxes: Vec<DebugBox>,
}

impl OverlayPage {
    /// Element for a field, if it is on this page.
    pub fn element(&self, field: &str) -> Option<&OverlayElement> {
        self.elements.iter().find(|e| e.field() == field)
    }
}

/// Lay out every selected page.
pub fn render_overlay(
    registry: &FieldRegistry,
    record: &ValueRecord,
    images: &ImageStore,
    profile: &FormProfile,
    options: &RenderOptions,
) -> Result<Vec<OverlayPage>> {
    let cascade = StyleCascade::new(&profile.style_defaults, record.styles());
    let pages = registry
        .pages()
        .iter()
        .enumerate()
        .filter(|(index, _)| options.page_selection.includes_index(*index))
        .map(|(index, page)| {
            render_page(index, page, registry, record, images, profile, &cascade, options)
        })
        .collect();
    Ok(pages)
}

#[allow(clippy::too_many_arguments)]
fn render_page(
    page_index: usize,
    page: &PageGeometry,
    registry: &FieldRegistry,
    record: &ValueRecord,
    images: &ImageStore,
    profile: &FormProfile,
    cascade: &StyleCascade<'_>,
    options: &RenderOptions,
) -> OverlayPage {
    let scale = options.scale;
    let mut elements = Vec::new();
    let mut debug_boxes = Vec::new();

    for field in registry.fields_on_page(page_index) {
        let rect = to_display(&field.geometry, page.height, scale);
        if options.debug {
            debug_boxes.push(DebugBox {
                field: field.name.clone(),
                kind: field.kind,
                rect,
            });
        }
        let element = match field.kind {
            FieldKind::Text => text_element(field, rect, record, profile, cascade, scale),
            FieldKind::Checkbox => Some(checkbox_element(field, rect, record, profile)),
            FieldKind::Image => Some(image_element(field, rect, images, profile)),
        };
        elements.extend(element);
    }

    OverlayPage {
        page_index,
        width_px: page.width * scale,
        height_px: page.height * scale,
        scale,
        elements,
        debug_boxes,
    }
}

fn text_element(
    field: &FieldDescriptor,
    rect: DisplayRect,
    record: &ValueRecord,
    profile: &FormProfile,
    cascade: &StyleCascade<'_>,
    scale: f64,
) -> Option<OverlayElement> {
    let value = record.get(&field.name);
    if value.is_some_and(|v| v.is_boolean_like()) {
        return None;
    }
    let text = value.map(|v| v.display_text()).unwrap_or_default();

    let sample = if text.is_empty() {
        profile.layout.placeholder_sample.as_str()
    } else {
        text.as_str()
    };
    let g = &field.geometry;
    let fitted = fit_font_size(sample, g.width, g.height, field.is_multiline, &profile.fit);
    let style = cascade.effective(&field.name, fitted);
    let char_count = text.chars().count();

    Some(OverlayElement::Text(TextElement {
        field: field.name.clone(),
        rect: rect.offset(style.x_offset, style.y_offset, scale),
        placeholder: profile.display_name(&field.name).to_string(),
        font_size_px: style.font_size * scale,
        line_height: if field.is_multiline {
            profile.layout.line_height
        } else {
            1.0
        },
        wrap: if field.is_multiline {
            WrapMode::PreWrap
        } else {
            WrapMode::NoWrap
        },
        multiline: field.is_multiline,
        flex_center: !field.is_multiline && style.align == Align::Center,
        compact: !field.is_multiline && (1..=3).contains(&char_count),
        style,
        value: text,
    }))
}

fn checkbox_element(
    field: &FieldDescriptor,
    rect: DisplayRect,
    record: &ValueRecord,
    profile: &FormProfile,
) -> OverlayElement {
    OverlayElement::Checkbox(CheckboxElement {
        field: field.name.clone(),
        rect,
        checked: record.get(&field.name).is_some_and(|v| v.is_checked()),
        glyph: profile.layout.check_glyph.clone(),
        glyph_px: rect.height * profile.layout.check_scale,
        label: profile.display_name(&field.name).to_string(),
    })
}

fn image_element(
    field: &FieldDescriptor,
    rect: DisplayRect,
    images: &ImageStore,
    profile: &FormProfile,
) -> OverlayElement {
    OverlayElement::Image(ImageElement {
        field: field.name.clone(),
        rect,
        label: profile.display_name(&field.name).to_string(),
        hint: profile.image_hint(&field.name).to_string(),
        attachment: images.get(&field.name).map(|image| AttachedImage {
            width: image.width,
            height: image.height,
            bytes: image.size(),
        }),
    })
}
