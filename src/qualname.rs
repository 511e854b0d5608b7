//! Qualified (dotted) module names with pre-split components.
//!
//! Avoids re-splitting on each resolution attempt. The common case is
//! 2-3 components, so the parts live in a `SmallVec`.

use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// Parsed dotted module name (e.g., "pkg.sub.mod").
#[derive(Debug, Clone)]
pub struct QualName {
    /// The full dotted name.
    full: Arc<str>,
    /// Pre-split components.
    parts: SmallVec<[Arc<str>; 4]>,
}

impl QualName {
    /// Parse a dotted module name.
    ///
    /// Returns `None` for empty names or names with empty components
    /// (e.g., ".pkg" or "pkg..sub").
    pub fn parse(name: &str) -> Option<Self> {
        if name.is_empty() {
            return None;
        }

        let parts: SmallVec<[Arc<str>; 4]> = name.split('.').map(Arc::from).collect();
        if parts.iter().any(|p| p.is_empty()) {
            return None;
        }

        Some(Self {
            full: Arc::from(name),
            parts,
        })
    }

    /// Get the full dotted name.
    #[inline]
    pub fn full_name(&self) -> &str {
        &self.full
    }

    /// Get the components.
    #[inline]
    pub fn parts(&self) -> &[Arc<str>] {
        &self.parts
    }

    /// Check if this is a top-level (non-dotted) name.
    #[inline]
    pub fn is_top_level(&self) -> bool {
        self.parts.len() == 1
    }

    /// Get the first component.
    #[inline]
    pub fn top_level(&self) -> &str {
        &self.parts[0]
    }

    /// Get the last component.
    #[inline]
    pub fn leaf(&self) -> &str {
        &self.parts[self.parts.len() - 1]
    }

    /// Get the number of components.
    #[inline]
    pub fn depth(&self) -> usize {
        self.parts.len()
    }

    /// Build the name truncated to a given nesting depth.
    ///
    /// E.g., for "pkg.sub.mod", depth=2 → "pkg.sub".
    pub fn name_at_depth(&self, depth: usize) -> String {
        let depth = depth.min(self.parts.len());
        self.parts[..depth]
            .iter()
            .map(|p| p.as_ref())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Get the parent package name, or `None` for top-level names.
    pub fn parent(&self) -> Option<String> {
        if self.is_top_level() {
            None
        } else {
            Some(self.name_at_depth(self.parts.len() - 1))
        }
    }
}

impl fmt::Display for QualName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

/// Get the parent package of a dotted name, without parsing.
///
/// E.g., "pkg.sub" → "pkg"; "pkg" → `None`.
#[inline]
pub fn parent_name(name: &str) -> Option<&str> {
    name.rsplit_once('.').map(|(parent, _)| parent)
}

/// Get the leaf component of a dotted name, without parsing.
///
/// E.g., "pkg.sub" → "sub"; "pkg" → "pkg".
#[inline]
pub fn leaf_name(name: &str) -> &str {
    name.rsplit_once('.').map(|(_, leaf)| leaf).unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_top_level() {
        let qn = QualName::parse("math").unwrap();
        assert_eq!(qn.full_name(), "math");
        assert!(qn.is_top_level());
        assert_eq!(qn.depth(), 1);
        assert_eq!(qn.top_level(), "math");
        assert_eq!(qn.leaf(), "math");
        assert!(qn.parent().is_none());
    }

    #[test]
    fn test_parse_dotted() {
        let qn = QualName::parse("pkg.sub.mod").unwrap();
        assert!(!qn.is_top_level());
        assert_eq!(qn.depth(), 3);
        assert_eq!(qn.top_level(), "pkg");
        assert_eq!(qn.leaf(), "mod");
        assert_eq!(qn.parent().as_deref(), Some("pkg.sub"));
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(QualName::parse("").is_none());
        assert!(QualName::parse(".pkg").is_none());
        assert!(QualName::parse("pkg.").is_none());
        assert!(QualName::parse("pkg..sub").is_none());
    }

    #[test]
    fn test_name_at_depth() {
        let qn = QualName::parse("a.b.c.d").unwrap();
        assert_eq!(qn.name_at_depth(1), "a");
        assert_eq!(qn.name_at_depth(2), "a.b");
        assert_eq!(qn.name_at_depth(4), "a.b.c.d");
        // Clamped past the end.
        assert_eq!(qn.name_at_depth(100), "a.b.c.d");
    }

    #[test]
    fn test_free_helpers() {
        assert_eq!(parent_name("pkg.sub"), Some("pkg"));
        assert_eq!(parent_name("pkg"), None);
        assert_eq!(leaf_name("pkg.sub"), "sub");
        assert_eq!(leaf_name("pkg"), "pkg");
    }
}
