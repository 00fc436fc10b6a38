//! JSON rendering for overlays and field catalogs.

use serde::Serialize;

use crate::error::{Error, Result};

use super::overlay::OverlayPage;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize any overlay-side value.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

/// Serialize laid-out overlay pages for a host to draw.
pub fn overlay_to_json(pages: &[OverlayPage], format: JsonFormat) -> Result<String> {
    to_json(pages, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::DisplayRect;
    use crate::model::FieldKind;
    use crate::render::overlay::{CheckboxElement, DebugBox, OverlayElement};

    fn page() -> OverlayPage {
        let rect = DisplayRect {
            left: 10.0,
            top: 20.0,
            width: 12.0,
            height: 12.0,
        };
        OverlayPage {
            page_index: 0,
            width_px: 612.0,
            height_px: 792.0,
            scale: 1.0,
            elements: vec![OverlayElement::Checkbox(CheckboxElement {
                field: "Inspiration".into(),
                rect,
                checked: true,
                glyph: "✔".into(),
                glyph_px: 9.6,
                label: "Inspiration".into(),
            })],
            debug_boxes: vec![DebugBox {
                field: "Inspiration".into(),
                kind: FieldKind::Checkbox,
                rect,
            }],
        }
    }

    #[test]
    fn test_overlay_json_pretty() {
        let json = overlay_to_json(&[page()], JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"type\""));
        assert!(json.contains("Inspiration"));
        assert!(json.contains('\n')); // Pretty has newlines
    }

    #[test]
    fn test_overlay_json_compact() {
        let json = overlay_to_json(&[page()], JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n')); // Compact has no newlines
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["elements"][0]["checked"], true);
    }
}
