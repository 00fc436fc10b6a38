//! The field registry: one descriptor per named field of the loaded form.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{FieldDescriptor, FieldKind, PageGeometry, WidgetType};
use crate::profile::{FormProfile, NameRules};

use super::form_parser::{FormParser, RawField};
use super::options::ErrorMode;
use super::pages::{PageResolver, PageSource};

/// A field left out of the registry and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedField {
    /// Field name
    pub name: String,
    /// Reason it was skipped
    pub reason: String,
}

/// One row of the sorted field catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    /// Field name
    pub name: String,
    /// Human-readable name from the profile
    pub display_name: String,
    /// Rendering kind
    pub kind: FieldKind,
    /// 0-based page
    pub page_index: usize,
    /// Sort priority from the profile rules
    pub priority: i32,
}

/// Canonical `name -> FieldDescriptor` table for one loaded document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FieldRegistry {
    fields: IndexMap<String, FieldDescriptor>,
    pages: Vec<PageGeometry>,
    #[serde(skip)]
    sources: HashMap<String, PageSource>,
    skipped: Vec<SkippedField>,
}

impl FieldRegistry {
    /// Build the registry from a parsed document.
    ///
    /// In lenient mode a field whose geometry or page cannot be determined
    /// is logged and skipped; in strict mode the first such field aborts the
    /// build. Fields without any widget are always skipped.
    pub fn build(parser: &FormParser, profile: &FormProfile) -> Result<Self> {
        let rules = profile.name_rules()?;
        let pages = parser.page_geometries();
        let resolver = PageResolver::new(
            parser.annotation_sightings(),
            profile.page_overrides.clone(),
        );
        let error_mode = parser.options().error_mode;

        let mut registry = FieldRegistry {
            pages,
            ..Default::default()
        };

        for raw in parser.form_fields() {
            if registry.fields.contains_key(&raw.name) {
                log::warn!("Duplicate field name '{}'; keeping the first", raw.name);
                continue;
            }
            match registry.describe(&raw, &resolver, &rules, profile) {
                Ok(Some((descriptor, source))) => {
                    registry.sources.insert(raw.name.clone(), source);
                    registry.fields.insert(raw.name, descriptor);
                }
                Ok(None) => {
                    log::debug!("Field '{}' has no widget; skipped", raw.name);
                    registry.skipped.push(SkippedField {
                        name: raw.name,
                        reason: "no widget".to_string(),
                    });
                }
                Err(e) => {
                    if error_mode == ErrorMode::Strict {
                        return Err(e);
                    }
                    log::warn!("Skipping field: {}", e);
                    registry.skipped.push(SkippedField {
                        name: raw.name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        log::info!(
            "Registered {} field(s) across {} page(s), {} skipped",
            registry.fields.len(),
            registry.pages.len(),
            registry.skipped.len()
        );
        Ok(registry)
    }

    fn describe(
        &self,
        raw: &RawField,
        resolver: &PageResolver,
        rules: &NameRules,
        profile: &FormProfile,
    ) -> Result<Option<(FieldDescriptor, PageSource)>> {
        let Some(first) = raw.widgets.first() else {
            return Ok(None);
        };
        let geometry = first.ok_or_else(|| Error::field(&raw.name, "missing or invalid /Rect"))?;

        let assignment = resolver.resolve(&raw.name);
        if assignment.page_index >= self.pages.len() {
            return Err(Error::field(
                &raw.name,
                format!(
                    "page {} is out of range ({} page(s))",
                    assignment.page_index,
                    self.pages.len()
                ),
            ));
        }

        let widget = raw.widget_type();
        let kind = if profile.is_image_field(&raw.name) {
            FieldKind::Image
        } else if widget == WidgetType::Checkbox || rules.is_checkbox_name(&raw.name) {
            FieldKind::Checkbox
        } else {
            FieldKind::Text
        };

        let descriptor = FieldDescriptor {
            name: raw.name.clone(),
            geometry,
            page_index: assignment.page_index,
            kind,
            widget,
            is_multiline: geometry.height > profile.layout.multiline_threshold,
        };
        Ok(Some((descriptor, assignment.source)))
    }

    /// Assemble a registry from already-built descriptors.
    pub fn from_parts(fields: Vec<FieldDescriptor>, pages: Vec<PageGeometry>) -> Self {
        let mut registry = FieldRegistry {
            pages,
            ..Default::default()
        };
        for field in fields {
            registry.fields.entry(field.name.clone()).or_insert(field);
        }
        registry
    }

    /// Look up a field.
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// Whether a field is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Fields in document order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    /// Fields drawn on one page, in document order.
    pub fn fields_on_page(&self, page_index: usize) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields
            .values()
            .filter(move |f| f.page_index == page_index)
    }

    /// Number of registered fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field was registered.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Page sizes.
    pub fn pages(&self) -> &[PageGeometry] {
        &self.pages
    }

    /// Size of one page.
    pub fn page(&self, index: usize) -> Option<&PageGeometry> {
        self.pages.get(index)
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// How a field's page was decided; `None` for registries built from parts.
    pub fn page_source(&self, name: &str) -> Option<PageSource> {
        self.sources.get(name).copied()
    }

    /// Fields left out during the build.
    pub fn skipped(&self) -> &[SkippedField] {
        &self.skipped
    }

    /// Fields sorted by profile priority, then display name.
    pub fn catalog(&self, profile: &FormProfile) -> Result<Vec<CatalogEntry>> {
        let rules = profile.name_rules()?;
        let mut entries: Vec<CatalogEntry> = self
            .fields
            .values()
            .map(|field| CatalogEntry {
                name: field.name.clone(),
                display_name: profile.display_name(&field.name).to_string(),
                kind: field.kind,
                page_index: field.page_index,
                priority: rules.sort_priority(&field.name),
            })
            .collect();
        entries.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.display_name.cmp(&b.display_name))
        });
        Ok(entries)
    }

    /// CSV listing `Field ID,Type,Description`, sorted by field id.
    pub fn to_csv(&self, profile: &FormProfile) -> String {
        let mut names: Vec<&String> = self.fields.keys().collect();
        names.sort();

        let mut lines = vec!["Field ID,Type,Description".to_string()];
        for name in names {
            let Some(field) = self.fields.get(name.as_str()) else {
                continue;
            };
            lines.push(format!(
                "{},{},{}",
                csv_cell(name),
                field.kind.label(),
                csv_cell(profile.display_name(name))
            ));
        }
        lines.join("\n")
    }
}

fn csv_cell(value: &str) -> String {
    if value.contains(',') {
        format!("\"{}\"", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Geometry;
    use crate::parser::LoadOptions;
    use crate::testing::{FixtureField, FormFixture};

    fn build(fixture: FormFixture, profile: &FormProfile) -> Result<FieldRegistry> {
        let parser = FormParser::from_bytes(&fixture.build())?;
        FieldRegistry::build(&parser, profile)
    }

    #[test]
    fn test_kinds_and_multiline() {
        let mut profile = FormProfile::default();
        profile.image_fields.push("Portrait".to_string());
        profile.checkbox_patterns.push("^Check Box".to_string());

        let fixture = FormFixture::new()
            .field(FixtureField::text("Name", [50.0, 700.0, 200.0, 720.0], 0))
            .field(FixtureField::text("Notes", [50.0, 400.0, 300.0, 500.0], 0))
            .field(FixtureField::checkbox("Agree", [50.0, 650.0, 62.0, 662.0], 0))
            .field(FixtureField::text("Check Box 12", [80.0, 650.0, 92.0, 662.0], 0))
            .field(FixtureField::checkbox("Portrait", [300.0, 500.0, 400.0, 625.0], 0));
        let registry = build(fixture, &profile).unwrap();

        assert_eq!(registry.len(), 5);
        assert_eq!(registry.get("Name").unwrap().kind, FieldKind::Text);
        assert!(!registry.get("Name").unwrap().is_multiline);
        assert!(registry.get("Notes").unwrap().is_multiline);
        assert_eq!(registry.get("Agree").unwrap().kind, FieldKind::Checkbox);
        assert_eq!(registry.get("Check Box 12").unwrap().kind, FieldKind::Checkbox);
        assert_eq!(
            registry.get("Check Box 12").unwrap().widget,
            WidgetType::Text
        );
        assert_eq!(registry.get("Portrait").unwrap().kind, FieldKind::Image);
    }

    #[test]
    fn test_widgetless_field_skipped() {
        let fixture = FormFixture::new()
            .field(FixtureField::widgetless("Ghost"))
            .field(FixtureField::text("Name", [50.0, 700.0, 200.0, 720.0], 0));
        let registry = build(fixture, &FormProfile::default()).unwrap();
        assert!(!registry.contains("Ghost"));
        assert!(registry.contains("Name"));
        assert_eq!(registry.skipped()[0].name, "Ghost");
    }

    #[test]
    fn test_bad_field_skipped_in_lenient_mode() {
        let fixture = FormFixture::new()
            .field(FixtureField::text("Broken", [0.0; 4], 0).without_rect())
            .field(FixtureField::text("Name", [50.0, 700.0, 200.0, 720.0], 0));
        let registry = build(fixture, &FormProfile::default()).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.skipped()[0].reason.contains("/Rect"));
    }

    #[test]
    fn test_bad_field_aborts_in_strict_mode() {
        let bytes = FormFixture::new()
            .field(FixtureField::text("Broken", [0.0; 4], 0).without_rect())
            .build();
        let parser =
            FormParser::from_bytes_with_options(&bytes, LoadOptions::new().strict()).unwrap();
        let err = FieldRegistry::build(&parser, &FormProfile::default()).unwrap_err();
        assert!(matches!(err, Error::Field { ref name, .. } if name == "Broken"));
    }

    #[test]
    fn test_pages_and_overrides() {
        let mut profile = FormProfile::default();
        profile.page_overrides.insert("Backstory".to_string(), 1);
        profile.page_overrides.insert("Lost".to_string(), 7);

        let fixture = FormFixture::new()
            .pages(2)
            .field(FixtureField::text("Name", [50.0, 700.0, 200.0, 720.0], 0))
            .field(FixtureField::text("Backstory", [50.0, 100.0, 300.0, 400.0], 0))
            .field(FixtureField::text("Allies", [50.0, 100.0, 300.0, 400.0], 1))
            .field(FixtureField::text("Hidden", [10.0, 10.0, 20.0, 20.0], 1).unlisted())
            .field(FixtureField::text("Lost", [10.0, 10.0, 20.0, 20.0], 0));
        let registry = build(fixture, &profile).unwrap();

        assert_eq!(registry.get("Backstory").unwrap().page_index, 1);
        assert_eq!(registry.page_source("Backstory"), Some(PageSource::Override));
        assert_eq!(registry.get("Allies").unwrap().page_index, 1);
        assert_eq!(registry.page_source("Allies"), Some(PageSource::Detected));
        assert_eq!(registry.get("Hidden").unwrap().page_index, 0);
        assert_eq!(registry.page_source("Hidden"), Some(PageSource::Default));
        assert!(!registry.contains("Lost"));
        assert_eq!(registry.fields_on_page(1).count(), 2);
    }

    #[test]
    fn test_catalog_and_csv() {
        let fields = ["Gold", "Check Box 11", "CharacterName", "Items, misc"]
            .iter()
            .map(|name| FieldDescriptor {
                name: name.to_string(),
                geometry: Geometry::new(0.0, 0.0, 10.0, 10.0),
                page_index: 0,
                kind: if name.starts_with("Check") {
                    FieldKind::Checkbox
                } else {
                    FieldKind::Text
                },
                widget: WidgetType::Text,
                is_multiline: false,
            })
            .collect();
        let registry = FieldRegistry::from_parts(fields, vec![PageGeometry::letter()]);
        let profile = FormProfile::dnd_5e();

        let order: Vec<_> = registry
            .catalog(&profile)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(order, vec!["CharacterName", "Check Box 11", "Gold", "Items, misc"]);

        let csv = registry.to_csv(&profile);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "Field ID,Type,Description");
        assert_eq!(lines[1], "CharacterName,Text,CharacterName");
        assert_eq!(lines[2], "Check Box 11,Checkbox,\u{2610} STR Save Prof");
        assert_eq!(lines[4], "\"Items, misc\",Text,\"Items, misc\"");
    }
}
