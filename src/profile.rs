//! Form profiles: per-document-family configuration.
//!
//! A profile carries everything that is tuned to one family of templates
//! rather than derived from the PDF: which fields hold images, the page
//! override table for fields whose annotation placement is misleading,
//! built-in style defaults, human-readable names, field-list ordering and
//! the layout constants used by both render paths.
//!
//! Profiles are plain JSON:
//!
//! ```
//! use formfill::FormProfile;
//!
//! let profile = FormProfile::from_json_str(r#"{
//!     "name": "intake-form",
//!     "image_fields": ["Photo"],
//!     "page_overrides": {"Photo": 1},
//!     "style_defaults": {"Total": {"fontSize": 14, "align": "right"}}
//! }"#)?;
//! assert_eq!(profile.page_override("Photo"), Some(1));
//! # Ok::<(), formfill::Error>(())
//! ```

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::FitCurve;
use crate::model::{Align, StyleOverride};

/// Configuration for one family of form templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormProfile {
    /// Profile identifier
    pub name: String,

    /// Fields that receive image attachments instead of text
    pub image_fields: Vec<String>,

    /// Field name to 0-based page, taking precedence over detection
    pub page_overrides: IndexMap<String, usize>,

    /// Built-in per-field style defaults (lowest cascade tier)
    pub style_defaults: IndexMap<String, StyleOverride>,

    /// Human-readable names for fields, used as placeholders and labels
    pub display_names: IndexMap<String, String>,

    /// Upload hints for image fields
    pub image_hints: IndexMap<String, String>,

    /// Upload hint for image fields without an entry in `image_hints`
    pub default_image_hint: String,

    /// Regex patterns; a matching name is a checkbox whatever its widget
    pub checkbox_patterns: Vec<String>,

    /// Field-list ordering rules, first match wins
    pub sort_rules: Vec<SortRule>,

    /// Priority for names no rule matches
    pub default_sort_priority: i32,

    /// Text-fit curve
    pub fit: FitCurve,

    /// Layout constants shared by the overlay and the generator
    pub layout: LayoutConstants,
}

impl Default for FormProfile {
    fn default() -> Self {
        Self {
            name: "generic".to_string(),
            image_fields: Vec::new(),
            page_overrides: IndexMap::new(),
            style_defaults: IndexMap::new(),
            display_names: IndexMap::new(),
            image_hints: IndexMap::new(),
            default_image_hint: String::new(),
            checkbox_patterns: Vec::new(),
            sort_rules: Vec::new(),
            default_sort_priority: 80,
            fit: FitCurve::default(),
            layout: LayoutConstants::default(),
        }
    }
}

/// One field-list ordering rule.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SortRule {
    /// Lower sorts first
    pub priority: i32,
    /// Exact names matched by this rule
    pub names: Vec<String>,
    /// Regex matched against the field name
    pub pattern: Option<String>,
}

impl SortRule {
    fn names(priority: i32, names: &[&str]) -> Self {
        Self {
            priority,
            names: names.iter().map(|n| n.to_string()).collect(),
            pattern: None,
        }
    }

    fn pattern(priority: i32, pattern: &str) -> Self {
        Self {
            priority,
            names: Vec::new(),
            pattern: Some(pattern.to_string()),
        }
    }
}

/// Numbers both render paths must agree on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConstants {
    /// Fields taller than this (points) are multiline
    pub multiline_threshold: f64,
    /// Text inset from the left/right edge (points)
    pub text_inset: f64,
    /// Horizontal room lost to insets when wrapping (points)
    pub wrap_inset: f64,
    /// Vertical nudge for baselines (points)
    pub baseline_nudge: f64,
    /// Line height as a multiple of font size for multiline text
    pub line_height: f64,
    /// Check glyph drawn for checked boxes (ZapfDingbats)
    pub check_glyph: String,
    /// Glyph drawn in Helvetica when `check_glyph` cannot be encoded
    pub fallback_glyph: String,
    /// Extra rise applied to the fallback glyph (points)
    pub fallback_rise: f64,
    /// Check glyph size as a share of box height
    pub check_scale: f64,
    /// Sample text sized for empty text fields in the overlay
    pub placeholder_sample: String,
    /// Scale pages are rasterized at for the overlay background
    pub base_render_scale: f64,
    /// Horizontal margin subtracted before auto-fitting (pixels)
    pub fit_margin: f64,
    /// Narrowest container auto-fit will measure (pixels)
    pub min_container_width: f64,
}

impl Default for LayoutConstants {
    fn default() -> Self {
        Self {
            multiline_threshold: 25.0,
            text_inset: 2.0,
            wrap_inset: 4.0,
            baseline_nudge: 2.0,
            line_height: 1.15,
            check_glyph: "\u{2714}".to_string(),
            fallback_glyph: "X".to_string(),
            fallback_rise: 2.0,
            check_scale: 0.8,
            placeholder_sample: "placeholder".to_string(),
            base_render_scale: 1.5,
            fit_margin: 64.0,
            min_container_width: 100.0,
        }
    }
}

impl FormProfile {
    /// Create the generic profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a profile from JSON; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let profile: FormProfile =
            serde_json::from_str(json).map_err(|e| Error::Profile(e.to_string()))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load a profile from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Profile(e.to_string()))
    }

    /// Look up a built-in preset by name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "generic" => Some(Self::default()),
            "dnd-5e" | "dnd5e" => Some(Self::dnd_5e()),
            _ => None,
        }
    }

    /// Check that patterns compile and constants are usable.
    pub fn validate(&self) -> Result<()> {
        self.name_rules()?;
        let l = &self.layout;
        if !(l.line_height > 0.0 && l.check_scale > 0.0 && l.base_render_scale > 0.0) {
            return Err(Error::Profile(
                "line_height, check_scale and base_render_scale must be positive".to_string(),
            ));
        }
        if self.fit.avg_char_width <= 0.0 {
            return Err(Error::Profile("fit.avg_char_width must be positive".to_string()));
        }
        Ok(())
    }

    /// Compile the name-based rules.
    pub fn name_rules(&self) -> Result<NameRules> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| Error::Profile(format!("bad pattern '{}': {}", pattern, e)))
        };
        let checkbox = self
            .checkbox_patterns
            .iter()
            .map(|p| compile(p))
            .collect::<Result<Vec<_>>>()?;
        let sort = self
            .sort_rules
            .iter()
            .map(|rule| {
                Ok(CompiledSortRule {
                    priority: rule.priority,
                    names: rule.names.clone(),
                    pattern: rule.pattern.as_deref().map(compile).transpose()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(NameRules {
            checkbox,
            sort,
            default_priority: self.default_sort_priority,
        })
    }

    /// Whether a field takes image attachments.
    pub fn is_image_field(&self, name: &str) -> bool {
        self.image_fields.iter().any(|f| f == name)
    }

    /// Page override for a field.
    pub fn page_override(&self, name: &str) -> Option<usize> {
        self.page_overrides.get(name).copied()
    }

    /// Display name, falling back to the field name itself.
    pub fn display_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.display_names
            .get(name)
            .map(String::as_str)
            .unwrap_or(name)
    }

    /// Upload hint for an image field.
    pub fn image_hint(&self, name: &str) -> &str {
        self.image_hints
            .get(name)
            .map(String::as_str)
            .unwrap_or(&self.default_image_hint)
    }

    /// Preset for the fillable 5th-edition character sheet.
    pub fn dnd_5e() -> Self {
        let image_fields = vec![
            "CHARACTER IMAGE".to_string(),
            "Faction Symbol Image".to_string(),
        ];

        let page_overrides = [
            "CHARACTER IMAGE",
            "Faction Symbol Image",
            "Age",
            "Height",
            "Weight",
            "Eyes",
            "Skin",
            "Hair",
            "Backstory",
            "Allies",
            "FactionName",
            "Treasure",
            "CharacterName 2",
        ]
        .iter()
        .map(|name| (name.to_string(), 1))
        .collect();

        let mut style_defaults = IndexMap::new();
        let centered = |size: f64| StyleOverride::new().with_font_size(size).with_align(Align::Center);
        style_defaults.insert("AC".to_string(), centered(24.0).with_y_offset(10.0));
        for name in ["Initiative", "Speed", "Passive"] {
            style_defaults.insert(name.to_string(), centered(18.0).with_y_offset(0.0));
        }
        for name in ["STR", "DEX", "CON", "INT", "WIS", "CHA"] {
            style_defaults.insert(name.to_string(), centered(24.0).with_y_offset(2.0));
        }
        for name in ["STRmod", "DEXmod ", "CONmod", "INTmod", "WISmod", "CHamod"] {
            style_defaults.insert(name.to_string(), centered(12.0));
        }
        style_defaults.insert("ProfBonus".to_string(), centered(14.0).with_y_offset(1.0));
        style_defaults.insert("HPMax".to_string(), centered(12.0));
        style_defaults.insert("HPCurrent".to_string(), centered(24.0));

        let mut display_names = IndexMap::new();
        let saves = ["STR", "DEX", "CON", "INT", "WIS", "CHA"];
        for (i, ability) in saves.iter().enumerate() {
            display_names.insert(
                format!("Check Box {}", 11 + i),
                format!("\u{2610} {} Save Prof", ability),
            );
        }
        let death = ["\u{2713}1", "\u{2713}2", "\u{2713}3", "\u{2717}1", "\u{2717}2", "\u{2717}3"];
        for (i, mark) in death.iter().enumerate() {
            display_names.insert(
                format!("Check Box {}", 17 + i),
                format!("\u{2610} Death Save {}", mark),
            );
        }
        let skills = [
            "Acrobatics",
            "Animal Handling",
            "Arcana",
            "Athletics",
            "Deception",
            "History",
            "Insight",
            "Intimidation",
            "Investigation",
            "Medicine",
            "Nature",
            "Perception",
            "Performance",
            "Persuasion",
            "Religion",
            "Sleight of Hand",
            "Stealth",
            "Survival",
        ];
        for (i, skill) in skills.iter().enumerate() {
            display_names.insert(
                format!("Check Box {}", 23 + i),
                format!("\u{2610} {} Prof", skill),
            );
        }
        for (field, label) in [
            ("CHARACTER IMAGE", "\u{1F5BC}\u{FE0F} Character Portrait"),
            ("Faction Symbol Image", "\u{1F5BC}\u{FE0F} Faction Symbol"),
            ("Race ", "Race"),
            ("DEXmod ", "DEX Modifier"),
            ("Deception ", "Deception"),
            ("History ", "History"),
            ("Investigation ", "Investigation"),
            ("Perception ", "Perception"),
            ("Stealth ", "Stealth"),
            ("PersonalityTraits ", "Personality Traits"),
            ("CHamod", "CHA Modifier"),
        ] {
            display_names.insert(field.to_string(), label.to_string());
        }

        let mut image_hints = IndexMap::new();
        image_hints.insert("CHARACTER IMAGE".to_string(), "3:4 aspect ratio".to_string());

        let sort_rules = vec![
            SortRule::names(0, &["CharacterName", "ClassLevel"]),
            SortRule::names(1, &["Race ", "Background", "Alignment", "XP"]),
            SortRule::names(2, &["PlayerName"]),
            SortRule::pattern(10, "^(STR|DEX|CON|INT|WIS|CHA)$"),
            SortRule::pattern(11, "mod"),
            SortRule::names(
                20,
                &[
                    "AC",
                    "Initiative",
                    "Speed",
                    "HPMax",
                    "HPCurrent",
                    "HPTemp",
                    "HD",
                    "HDTotal",
                    "ProfBonus",
                ],
            ),
            SortRule::pattern(30, "^ST "),
            SortRule::pattern(31, "Check Box 1[1-6]"),
            SortRule::pattern(40, "Check Box (2[3-9]|3[0-9]|40)"),
            SortRule::names(41, &["Acrobatics", "Animal", "Arcana", "Athletics"]),
            SortRule::pattern(50, "Check Box (1[7-9]|2[0-2])"),
            SortRule::names(60, &["CHARACTER IMAGE", "Faction Symbol Image"]),
            SortRule::names(70, &["PersonalityTraits ", "Ideals", "Bonds", "Flaws"]),
            SortRule::names(
                71,
                &[
                    "Features and Traits",
                    "ProficienciesLang",
                    "Equipment",
                    "AttacksSpellcasting",
                ],
            ),
            SortRule::pattern(100, "Spell|Slots"),
        ];

        Self {
            name: "dnd-5e".to_string(),
            image_fields,
            page_overrides,
            style_defaults,
            display_names,
            image_hints,
            default_image_hint: "4:5 aspect ratio".to_string(),
            checkbox_patterns: vec!["Check Box".to_string()],
            sort_rules,
            default_sort_priority: 80,
            fit: FitCurve::default(),
            layout: LayoutConstants::default(),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledSortRule {
    priority: i32,
    names: Vec<String>,
    pattern: Option<Regex>,
}

/// Compiled name-based rules of a profile.
#[derive(Debug, Clone)]
pub struct NameRules {
    checkbox: Vec<Regex>,
    sort: Vec<CompiledSortRule>,
    default_priority: i32,
}

impl NameRules {
    /// Whether the name marks a checkbox regardless of widget type.
    pub fn is_checkbox_name(&self, name: &str) -> bool {
        self.checkbox.iter().any(|re| re.is_match(name))
    }

    /// Sort priority of a name: first matching rule, else the default.
    pub fn sort_priority(&self, name: &str) -> i32 {
        self.sort
            .iter()
            .find(|rule| {
                rule.names.iter().any(|n| n == name)
                    || rule.pattern.as_ref().is_some_and(|re| re.is_match(name))
            })
            .map(|rule| rule.priority)
            .unwrap_or(self.default_priority)
    }
}
