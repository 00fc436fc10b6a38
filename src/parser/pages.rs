//! Field to page association.
//!
//! Detection records the first page on which a widget annotation carrying a
//! field's name appears. Some templates place widgets in misleading spots, so
//! the profile's override table wins over detection. Fields seen nowhere fall
//! back to the first page.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;

/// Where a page assignment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSource {
    /// Found in a page's annotation list
    Detected,
    /// Taken from the override table
    Override,
    /// Neither detected nor overridden
    Default,
}

/// A resolved page index and its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageAssignment {
    /// 0-based page index
    pub page_index: usize,
    /// How the index was decided
    pub source: PageSource,
}

/// Resolves field names to page indices.
#[derive(Debug, Clone, Default)]
pub struct PageResolver {
    detected: HashMap<String, usize>,
    overrides: IndexMap<String, usize>,
}

impl PageResolver {
    /// Build from annotation sightings in walk order and an override table.
    ///
    /// When a name is sighted more than once the first sighting is kept.
    pub fn new<I>(sightings: I, overrides: IndexMap<String, usize>) -> Self
    where
        I: IntoIterator<Item = (String, usize)>,
    {
        let mut detected = HashMap::new();
        for (name, page) in sightings {
            detected.entry(name).or_insert(page);
        }
        Self {
            detected,
            overrides,
        }
    }

    /// Page for a field.
    pub fn resolve(&self, name: &str) -> PageAssignment {
        if let Some(&page_index) = self.overrides.get(name) {
            if let Some(&detected) = self.detected.get(name) {
                if detected != page_index {
                    log::debug!(
                        "Field '{}': override page {} replaces detected page {}",
                        name,
                        page_index,
                        detected
                    );
                }
            }
            return PageAssignment {
                page_index,
                source: PageSource::Override,
            };
        }
        match self.detected.get(name) {
            Some(&page_index) => PageAssignment {
                page_index,
                source: PageSource::Detected,
            },
            None => PageAssignment {
                page_index: 0,
                source: PageSource::Default,
            },
        }
    }

    /// Detected page, ignoring overrides.
    pub fn detected(&self, name: &str) -> Option<usize> {
        self.detected.get(name).copied()
    }

    /// Number of distinct names detected.
    pub fn detected_count(&self) -> usize {
        self.detected.len()
    }
}
