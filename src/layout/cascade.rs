//! Style resolution cascade.
//!
//! Two tiers, low to high precedence:
//!
//! 1. built-in per-field defaults from the [`FormProfile`](crate::FormProfile)
//! 2. the user's overrides stored under `_styles` in the value record
//!
//! The merge is shallow per property. Whatever neither tier sets falls back
//! to left alignment, black, regular weight, no offsets, and a font size from
//! the text-fit heuristic.

use indexmap::IndexMap;

use crate::model::{
    Align, Color, EffectiveStyle, StyleOverride, StyleOverrides, StyleProperty, StyleValue,
};

/// Read-only view over both tiers for one render pass.
#[derive(Debug, Clone, Copy)]
pub struct StyleCascade<'a> {
    defaults: &'a IndexMap<String, StyleOverride>,
    user: &'a StyleOverrides,
}

impl<'a> StyleCascade<'a> {
    /// Combine built-in defaults with user overrides.
    pub fn new(defaults: &'a IndexMap<String, StyleOverride>, user: &'a StyleOverrides) -> Self {
        Self { defaults, user }
    }

    /// Merged override for a field; unset properties stay `None`.
    pub fn resolve(&self, field: &str) -> StyleOverride {
        let base = self.defaults.get(field).cloned().unwrap_or_default();
        match self.user.get(field) {
            Some(user) => base.merged_with(user),
            None => base,
        }
    }

    /// Fully resolved style. `fitted_size` is used when no tier sets a size.
    pub fn effective(&self, field: &str, fitted_size: f64) -> EffectiveStyle {
        let resolved = self.resolve(field);
        let color = match resolved.color.as_deref() {
            Some(hex) => Color::parse_hex(hex).unwrap_or_else(|| {
                log::warn!("Field '{}': ignoring invalid color '{}'", field, hex);
                Color::BLACK
            }),
            None => Color::BLACK,
        };
        EffectiveStyle {
            font_size: resolved
                .font_size
                .filter(|s| s.is_finite() && *s > 0.0)
                .unwrap_or(fitted_size),
            align: resolved.align.unwrap_or(Align::Left),
            color,
            bold: resolved.bold.unwrap_or(false),
            italic: resolved.italic.unwrap_or(false),
            x_offset: resolved.x_offset.unwrap_or(0.0),
            y_offset: resolved.y_offset.unwrap_or(0.0),
        }
    }

    /// Whether either tier fixes the font size.
    pub fn has_explicit_size(&self, field: &str) -> bool {
        self.resolve(field)
            .font_size
            .is_some_and(|s| s.is_finite() && s > 0.0)
    }
}

/// An edit to one property of one field's user override.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleEdit {
    /// Store a value
    Set(StyleValue),
    /// Remove the property so it falls through again
    Clear(StyleProperty),
}

/// Apply an edit to the user tier.
///
/// Clearing removes the property, and a field entry left empty is removed
/// as well, so overrides never accumulate empty residue. Setting a NaN or
/// infinite number acts as a clear.
pub fn apply_style_edit(user: &mut StyleOverrides, field: &str, edit: StyleEdit) {
    let edit = match edit {
        StyleEdit::Set(value) if !value.is_finite() => StyleEdit::Clear(value.property()),
        other => other,
    };
    match edit {
        StyleEdit::Set(value) => {
            user.entry(field.to_string()).or_default().set(value);
        }
        StyleEdit::Clear(prop) => {
            if let Some(entry) = user.get_mut(field) {
                entry.clear(prop);
                if entry.is_empty() {
                    user.shift_remove(field);
                }
            }
        }
    }
}

/// Boolean style properties that can be toggled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleToggle {
    /// Bold weight
    Bold,
    /// Oblique slant
    Italic,
}

/// Flip bold or italic based on the resolved value: set `true` when currently
/// off, clear the user override when currently on.
pub fn toggle_style(
    defaults: &IndexMap<String, StyleOverride>,
    user: &mut StyleOverrides,
    field: &str,
    toggle: StyleToggle,
) -> StyleEdit {
    let resolved = StyleCascade::new(defaults, user).resolve(field);
    let (current, prop) = match toggle {
        StyleToggle::Bold => (resolved.bold.unwrap_or(false), StyleProperty::Bold),
        StyleToggle::Italic => (resolved.italic.unwrap_or(false), StyleProperty::Italic),
    };
    let edit = if current {
        StyleEdit::Clear(prop)
    } else {
        StyleEdit::Set(match toggle {
            StyleToggle::Bold => StyleValue::Bold(true),
            StyleToggle::Italic => StyleValue::Italic(true),
        })
    };
    apply_style_edit(user, field, edit.clone());
    edit
}
