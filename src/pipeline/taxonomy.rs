use crate::error::Result;
use crate::types::CanonicalField;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// The alias table: canonical field → label substrings that identify it.
///
/// Entries keep the declaration order of the taxonomy file, and lookup is
/// first-match-wins in that order — even when a later field's alias would be
/// a more specific match. This is a bounded heuristic, not an ambiguity
/// resolver; the table author orders alias lists most-specific-first when
/// precision matters.
///
/// The table is constructed once and injected into the normalizer; it is
/// never process-wide mutable state.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyMap {
    entries: Vec<(CanonicalField, Vec<String>)>,
}

#[derive(Debug, Deserialize)]
struct TaxonomyFile {
    #[serde(default)]
    mappings: serde_json::Map<String, serde_json::Value>,
}

impl TaxonomyMap {
    /// Load the alias table from a taxonomy map JSON file.
    ///
    /// A missing file is non-fatal: the mapper then resolves every label to
    /// unmapped and all records are discarded downstream. A present but
    /// unreadable file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Taxonomy map not found: {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let file: TaxonomyFile = serde_json::from_str(&content)?;

        let mut entries: Vec<(CanonicalField, Vec<String>)> = Vec::new();
        for (name, value) in file.mappings {
            let Ok(field) = CanonicalField::from_str(&name) else {
                warn!("Skipping unknown canonical field in taxonomy map: {}", name);
                continue;
            };
            let aliases: Vec<String> = match value {
                serde_json::Value::Array(items) => items
                    .into_iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
                _ => {
                    warn!("Aliases for {} are not an array, skipping", name);
                    continue;
                }
            };
            // JSON object keys are unique, so no duplicate canonical field
            // can appear here
            entries.push((field, aliases));
        }

        debug!("Loaded taxonomy map with {} fields", entries.len());
        Ok(Self { entries })
    }

    /// Build a table directly from entries, preserving their order
    pub fn from_entries(entries: Vec<(CanonicalField, Vec<String>)>) -> Self {
        Self { entries }
    }

    /// Resolve a raw label to the first canonical field (in declaration
    /// order) with an alias occurring anywhere in the label
    pub fn map_label(&self, label: &str) -> Option<CanonicalField> {
        for (field, aliases) in &self.entries {
            if aliases.iter().any(|alias| label.contains(alias.as_str())) {
                return Some(*field);
            }
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
