//! Edits driven by overlay interaction.
//!
//! Every function reads the record text from a [`RecordStore`], parses it,
//! applies one change and writes the whole record back. If the stored text
//! does not parse, the edit is abandoned before anything is written.

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::layout::{apply_style_edit, toggle_style, StyleEdit, StyleToggle};
use crate::model::{
    FieldKind, ImageAttachment, ImageStore, StyleOverride, StyleProperty, StyleValue, ValueRecord,
};
use crate::parser::FieldRegistry;

/// What the host should redraw after an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// Rebuild the overlay
    Full,
    /// Keep the edited element and its focus; other views may update
    KeepFocus,
}

/// Where the textual value record lives.
pub trait RecordStore {
    /// Current record text.
    fn read(&self) -> Result<String>;

    /// Replace the record text.
    fn write(&mut self, text: String) -> Result<()>;
}

/// In-memory record text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringRecordStore {
    text: String,
}

impl StringRecordStore {
    /// Create a store holding `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Default for StringRecordStore {
    fn default() -> Self {
        Self::new("{}")
    }
}

impl RecordStore for StringRecordStore {
    fn read(&self) -> Result<String> {
        Ok(self.text.clone())
    }

    fn write(&mut self, text: String) -> Result<()> {
        self.text = text;
        Ok(())
    }
}

/// Parse the stored record.
pub fn load_record<S: RecordStore + ?Sized>(store: &S) -> Result<ValueRecord> {
    ValueRecord::parse(&store.read()?)
}

fn modify<S, T, F>(store: &mut S, change: F) -> Result<T>
where
    S: RecordStore + ?Sized,
    F: FnOnce(&mut ValueRecord) -> T,
{
    let mut record = load_record(store)?;
    let out = change(&mut record);
    store.write(record.to_text())?;
    Ok(out)
}

/// Store text typed into a field.
///
/// Whitespace-only input removes the key. Anything else is stored exactly
/// as typed, line breaks included.
pub fn edit_text<S: RecordStore + ?Sized>(store: &mut S, field: &str, raw: &str) -> Result<Refresh> {
    modify(store, |record| {
        if raw.trim().is_empty() {
            record.remove(field);
        } else {
            record.set(field, raw);
        }
    })?;
    Ok(Refresh::KeepFocus)
}

/// Check or uncheck a checkbox. Unchecking removes the key.
pub fn toggle_checkbox<S: RecordStore + ?Sized>(
    store: &mut S,
    field: &str,
    checked: bool,
) -> Result<Refresh> {
    modify(store, |record| {
        if checked {
            record.set(field, true);
        } else {
            record.remove(field);
        }
    })?;
    Ok(Refresh::Full)
}

/// Add an empty entry for a field. Returns whether the key was added.
pub fn add_field_key<S: RecordStore + ?Sized>(store: &mut S, field: &str) -> Result<bool> {
    modify(store, |record| {
        if record.contains(field) {
            false
        } else {
            record.set(field, "");
            true
        }
    })
}

/// Apply one style edit to a field's user override.
pub fn edit_style<S: RecordStore + ?Sized>(
    store: &mut S,
    field: &str,
    edit: StyleEdit,
) -> Result<Refresh> {
    modify(store, |record| apply_style_edit(record.styles_mut(), field, edit))?;
    Ok(Refresh::Full)
}

/// Apply raw style-panel input: empty input clears the property.
pub fn edit_style_input<S: RecordStore + ?Sized>(
    store: &mut S,
    field: &str,
    prop: StyleProperty,
    raw: &str,
) -> Result<StyleEdit> {
    let edit = match StyleValue::parse(prop, raw).map_err(|reason| Error::field(field, reason))? {
        Some(value) => StyleEdit::Set(value),
        None => StyleEdit::Clear(prop),
    };
    edit_style(store, field, edit.clone())?;
    Ok(edit)
}

/// Flip bold or italic against the resolved style.
pub fn toggle_field_style<S: RecordStore + ?Sized>(
    store: &mut S,
    defaults: &IndexMap<String, StyleOverride>,
    field: &str,
    toggle: StyleToggle,
) -> Result<StyleEdit> {
    modify(store, |record| {
        toggle_style(defaults, record.styles_mut(), field, toggle)
    })
}

/// Normalize and store an image for an Image-kind field.
pub fn attach_image(
    images: &mut ImageStore,
    registry: &FieldRegistry,
    field: &str,
    data: &[u8],
) -> Result<Refresh> {
    let descriptor = registry
        .get(field)
        .ok_or_else(|| Error::UnknownField(field.to_string()))?;
    if descriptor.kind != FieldKind::Image {
        return Err(Error::NotImageField(field.to_string()));
    }
    let attachment = ImageAttachment::normalize(field, data)?;
    log::debug!(
        "Attached {}x{} image to '{}'",
        attachment.width,
        attachment.height,
        field
    );
    images.insert(attachment);
    Ok(Refresh::Full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Align, FieldDescriptor, FieldValue, Geometry, PageGeometry, WidgetType};

    fn store(text: &str) -> StringRecordStore {
        StringRecordStore::new(text)
    }

    #[test]
    fn test_edit_text_keeps_raw_value() {
        let mut s = store("{}");
        assert_eq!(edit_text(&mut s, "Notes", "  line one\nline two ").unwrap(), Refresh::KeepFocus);
        let record = load_record(&s).unwrap();
        assert_eq!(
            record.get("Notes"),
            Some(&FieldValue::Text("  line one\nline two ".into()))
        );

        edit_text(&mut s, "Notes", " \n ").unwrap();
        assert!(!load_record(&s).unwrap().contains("Notes"));
    }

    #[test]
    fn test_checkbox_true_then_false_removes_key() {
        let mut s = store("{}");
        toggle_checkbox(&mut s, "Check Box 11", true).unwrap();
        assert_eq!(
            load_record(&s).unwrap().get("Check Box 11"),
            Some(&FieldValue::Flag(true))
        );
        assert_eq!(toggle_checkbox(&mut s, "Check Box 11", false).unwrap(), Refresh::Full);
        assert!(!load_record(&s).unwrap().contains("Check Box 11"));
    }

    #[test]
    fn test_corrupt_record_aborts_without_writing() {
        let mut s = store("{ not json");
        let err = edit_text(&mut s, "Name", "Bree").unwrap_err();
        assert!(matches!(err, Error::ValueRecordParse(_)));
        assert_eq!(s.text(), "{ not json");
    }

    #[test]
    fn test_add_field_key() {
        let mut s = store(r#"{"Name": "Bree"}"#);
        assert!(!add_field_key(&mut s, "Name").unwrap());
        assert!(add_field_key(&mut s, "Gold").unwrap());
        let record = load_record(&s).unwrap();
        assert_eq!(record.get("Name"), Some(&FieldValue::Text("Bree".into())));
        assert_eq!(record.get("Gold"), Some(&FieldValue::Text(String::new())));
    }

    #[test]
    fn test_style_input_and_clear() {
        let mut s = store("{}");
        let edit = edit_style_input(&mut s, "Name", StyleProperty::Align, "center").unwrap();
        assert_eq!(edit, StyleEdit::Set(StyleValue::Align(Align::Center)));
        assert_eq!(
            load_record(&s).unwrap().style_for("Name").unwrap().align,
            Some(Align::Center)
        );

        let edit = edit_style_input(&mut s, "Name", StyleProperty::Align, "").unwrap();
        assert_eq!(edit, StyleEdit::Clear(StyleProperty::Align));
        assert!(load_record(&s).unwrap().style_for("Name").is_none());
    }

    #[test]
    fn test_bad_style_input_is_rejected() {
        let mut s = store("{}");
        let err = edit_style_input(&mut s, "Name", StyleProperty::FontSize, "huge").unwrap_err();
        assert!(matches!(err, Error::Field { .. }));
        assert_eq!(s.text(), "{}");
    }

    #[test]
    fn test_non_finite_style_input_is_rejected() {
        let mut s = store(r#"{"Name": "Bree"}"#);
        for raw in ["NaN", "inf", "infinity"] {
            let err = edit_style_input(&mut s, "Name", StyleProperty::XOffset, raw).unwrap_err();
            assert!(matches!(err, Error::Field { .. }));
        }
        assert_eq!(s.text(), r#"{"Name": "Bree"}"#);

        edit_style(&mut s, "Name", StyleEdit::Set(StyleValue::YOffset(f64::NAN))).unwrap();
        let record = load_record(&s).unwrap();
        assert!(record.style_for("Name").is_none());
        assert_eq!(record, ValueRecord::parse(&record.to_text()).unwrap());
    }

    #[test]
    fn test_toggle_against_builtin_default() {
        let mut defaults = IndexMap::new();
        defaults.insert("AC".to_string(), StyleOverride::new().with_bold(true));
        let mut s = store("{}");
        let edit = toggle_field_style(&mut s, &defaults, "AC", StyleToggle::Bold).unwrap();
        assert_eq!(edit, StyleEdit::Clear(StyleProperty::Bold));
    }

    #[test]
    fn test_attach_image_requires_image_field() {
        let registry = FieldRegistry::from_parts(
            vec![FieldDescriptor {
                name: "Name".into(),
                geometry: Geometry::new(0.0, 0.0, 10.0, 10.0),
                page_index: 0,
                kind: FieldKind::Text,
                widget: WidgetType::Text,
                is_multiline: false,
            }],
            vec![PageGeometry::letter()],
        );
        let mut images = ImageStore::new();
        let err = attach_image(&mut images, &registry, "Name", b"").unwrap_err();
        assert!(matches!(err, Error::NotImageField(_)));
        let err = attach_image(&mut images, &registry, "Nope", b"").unwrap_err();
        assert!(matches!(err, Error::UnknownField(_)));
        assert!(images.is_empty());
    }
}
