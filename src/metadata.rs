//! Distribution metadata shim.
//!
//! The build-time dependency analyzer collects, for every bundled
//! distribution, its version, file manifest and declared top-level
//! package, and ships the table as a JSON resource. At run time two
//! generations of query APIs read it: the legacy handle-style form
//! (`get_distribution`) and the modern direct form (`version` /
//! `metadata`). Both read the same records and always agree.
//!
//! A table that does not parse, or a record with an empty name or
//! version, is a build-time defect and surfaces as `Malformed` —
//! distinct from the ordinary `NotFound`, and never silently
//! defaulted.

use crate::error::MetadataError;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

// =============================================================================
// Records
// =============================================================================

/// Build-time-collected metadata for one distribution. Immutable.
#[derive(Debug, Clone)]
pub struct DistributionRecord {
    name: Arc<str>,
    version: Arc<str>,
    files: Vec<Arc<str>>,
    top_level: Option<Arc<str>>,
}

impl DistributionRecord {
    /// Canonical display name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The distribution's file manifest.
    pub fn files(&self) -> &[Arc<str>] {
        &self.files
    }

    /// Declared top-level package name, if recorded.
    pub fn top_level(&self) -> Option<&str> {
        self.top_level.as_deref()
    }
}

/// Legacy query handle, shaped like the old API's distribution object.
#[derive(Debug, Clone)]
pub struct Distribution {
    name: Arc<str>,
    version: Arc<str>,
}

impl Distribution {
    /// Canonical project name.
    #[inline]
    pub fn project_name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn version(&self) -> &str {
        &self.version
    }
}

// =============================================================================
// Registry
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawRecord {
    version: String,
    #[serde(default)]
    files: Vec<String>,
    #[serde(default)]
    top_level: Option<String>,
    /// Display-name override; defaults to the table key.
    #[serde(default)]
    name: Option<String>,
}

/// Name-keyed registry of distribution records.
///
/// Fully immutable after construction; callable from any thread with
/// no locking.
#[derive(Debug, Default)]
pub struct DistRegistry {
    records: FxHashMap<String, DistributionRecord>,
}

impl DistRegistry {
    /// Parse the build-time JSON table.
    ///
    /// An unparsable table is fatal configuration damage.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, MetadataError> {
        let raw: HashMap<String, RawRecord> =
            serde_json::from_slice(bytes).map_err(|err| MetadataError::Malformed {
                name: "*".into(),
                reason: format!("metadata table does not parse: {}", err),
            })?;

        let mut records = FxHashMap::default();
        for (key, record) in raw {
            let normalized = normalize_name(&key);
            if normalized.is_empty() {
                return Err(MetadataError::Malformed {
                    name: key.into(),
                    reason: "empty distribution name".into(),
                });
            }
            let display = record.name.unwrap_or_else(|| key.clone());
            let entry = DistributionRecord {
                name: display.into(),
                version: record.version.into(),
                files: record.files.into_iter().map(Into::into).collect(),
                top_level: record.top_level.map(Into::into),
            };
            if records.insert(normalized, entry).is_some() {
                return Err(MetadataError::Malformed {
                    name: key.into(),
                    reason: "distribution recorded twice under equivalent names".into(),
                });
            }
        }

        Ok(Self { records })
    }

    /// Number of known distributions.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn record(&self, name: &str) -> Result<&DistributionRecord, MetadataError> {
        let record = self
            .records
            .get(&normalize_name(name))
            .ok_or_else(|| MetadataError::NotFound { name: name.into() })?;

        // Semantic damage is detected at lookup so both query forms
        // surface it identically.
        if record.version.is_empty() {
            return Err(MetadataError::Malformed {
                name: record.name.clone(),
                reason: "empty version".into(),
            });
        }
        if record.name.is_empty() {
            return Err(MetadataError::Malformed {
                name: name.into(),
                reason: "empty display name".into(),
            });
        }
        Ok(record)
    }

    /// Legacy query form: a handle exposing name and version.
    pub fn get_distribution(&self, name: &str) -> Result<Distribution, MetadataError> {
        let record = self.record(name)?;
        Ok(Distribution {
            name: record.name.clone(),
            version: record.version.clone(),
        })
    }

    /// Modern query form: direct version lookup.
    pub fn version(&self, name: &str) -> Result<Arc<str>, MetadataError> {
        Ok(self.record(name)?.version.clone())
    }

    /// Modern query form: full-record lookup.
    pub fn metadata(&self, name: &str) -> Result<&DistributionRecord, MetadataError> {
        self.record(name)
    }
}

/// Normalize a distribution name: case-insensitive, with runs of
/// `-`, `_` and `.` folded to a single `-`.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if matches!(ch, '-' | '_' | '.') {
            pending_dash = !out.is_empty();
        } else {
            if pending_dash {
                out.push('-');
                pending_dash = false;
            }
            out.extend(ch.to_lowercase());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{
        "demo-dist": {
            "version": "1.2",
            "files": ["demo/__init__.py", "demo/core.py"],
            "top_level": "demo"
        },
        "other": { "version": "0.3" }
    }"#;

    #[test]
    fn test_both_query_forms_agree() {
        let registry = DistRegistry::from_json_slice(TABLE.as_bytes()).unwrap();

        let dist = registry.get_distribution("demo-dist").unwrap();
        assert_eq!(dist.project_name(), "demo-dist");
        assert_eq!(dist.version(), "1.2");

        assert_eq!(registry.version("demo-dist").unwrap().as_ref(), "1.2");

        let record = registry.metadata("demo-dist").unwrap();
        assert_eq!(record.name(), "demo-dist");
        assert_eq!(record.version(), "1.2");
        assert_eq!(record.files().len(), 2);
        assert_eq!(record.top_level(), Some("demo"));
    }

    #[test]
    fn test_not_found_from_both_forms() {
        let registry = DistRegistry::from_json_slice(TABLE.as_bytes()).unwrap();

        assert!(matches!(
            registry.get_distribution("never-registered"),
            Err(MetadataError::NotFound { .. })
        ));
        assert!(matches!(
            registry.version("never-registered"),
            Err(MetadataError::NotFound { .. })
        ));
    }

    #[test]
    fn test_name_normalization() {
        let registry = DistRegistry::from_json_slice(TABLE.as_bytes()).unwrap();

        for spelling in ["Demo-Dist", "demo_dist", "DEMO.DIST"] {
            let dist = registry.get_distribution(spelling).unwrap();
            assert_eq!(dist.version(), "1.2");
        }
    }

    #[test]
    fn test_unparsable_table_is_fatal() {
        match DistRegistry::from_json_slice(b"{ not json") {
            Err(MetadataError::Malformed { .. }) => {}
            other => panic!("expected Malformed, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_version_is_malformed_not_notfound() {
        let table = r#"{ "broken": { "version": "" } }"#;
        let registry = DistRegistry::from_json_slice(table.as_bytes()).unwrap();

        match registry.version("broken") {
            Err(MetadataError::Malformed { reason, .. }) => {
                assert!(reason.contains("version"));
            }
            other => panic!("expected Malformed, got {:?}", other),
        }
        assert!(matches!(
            registry.get_distribution("broken"),
            Err(MetadataError::Malformed { .. })
        ));
    }

    #[test]
    fn test_equivalent_names_collide() {
        let table = r#"{
            "demo-dist": { "version": "1.0" },
            "demo_dist": { "version": "2.0" }
        }"#;
        assert!(matches!(
            DistRegistry::from_json_slice(table.as_bytes()),
            Err(MetadataError::Malformed { .. })
        ));
    }

    #[test]
    fn test_display_name_override() {
        let table = r#"{ "pyi_egg": { "version": "0.1", "name": "unzipped-egg" } }"#;
        let registry = DistRegistry::from_json_slice(table.as_bytes()).unwrap();
        assert_eq!(
            registry.metadata("pyi_egg").unwrap().name(),
            "unzipped-egg"
        );
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Foo__Bar..baz"), "foo-bar-baz");
        assert_eq!(normalize_name("simple"), "simple");
        assert_eq!(normalize_name("--x--"), "x");
    }
}
