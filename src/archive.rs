//! The frozen archive: sealed, read-only container of module payloads.
//!
//! Produced once by the build-time bundler and memory-resident for the
//! whole process. Lookups are pure functions of the qualified name and
//! need no synchronization. A malformed container is fatal at open
//! time; a missing entry is an ordinary `None`.
//!
//! # Container format (little-endian)
//!
//! ```text
//! +0   magic        8 bytes  "PMFROZEN"
//! +8   version      u16      format version (currently 1)
//! +10  reserved     u16      zero
//! +12  entry count  u32
//! +16  data offset  u32      start of the payload region
//! +20  entry table  count records:
//!        name length  u16
//!        name         UTF-8 bytes (qualified dotted name)
//!        kind         u8   0=module 1=package 2=resource
//!        flags        u8   bit0 PACKAGE, bit1 NAMESPACE
//!        offset       u32  payload offset, relative to data offset
//!        length       u32  payload length
//! ...  payload region
//! ```
//!
//! Namespace portions are `Package` entries with the NAMESPACE flag and
//! an empty payload.

use crate::error::ArchiveError;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::Path;
use std::sync::Arc;

const MAGIC: &[u8; 8] = b"PMFROZEN";
const FORMAT_VERSION: u16 = 1;
const HEADER_LEN: usize = 20;

const FLAG_PACKAGE: u8 = 0b0000_0001;
const FLAG_NAMESPACE: u8 = 0b0000_0010;

// =============================================================================
// Entries
// =============================================================================

/// What an archive entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Compiled module code.
    Module,
    /// A package directory (regular with init payload, or namespace).
    Package,
    /// Raw data bytes (metadata tables, data files).
    Resource,
}

impl EntryKind {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Module),
            1 => Some(Self::Package),
            2 => Some(Self::Resource),
            _ => None,
        }
    }

    fn to_byte(self) -> u8 {
        match self {
            Self::Module => 0,
            Self::Package => 1,
            Self::Resource => 2,
        }
    }
}

/// One entry of the frozen archive. Immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    name: Arc<str>,
    kind: EntryKind,
    flags: u8,
    data: Arc<[u8]>,
}

impl ArchiveEntry {
    /// Qualified name of the entry.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Whether this entry defines a package.
    #[inline]
    pub fn is_package(&self) -> bool {
        self.flags & FLAG_PACKAGE != 0
    }

    /// Whether this entry is a namespace portion (no code of its own).
    #[inline]
    pub fn is_namespace(&self) -> bool {
        self.flags & FLAG_NAMESPACE != 0
    }

    /// The payload bytes.
    #[inline]
    pub fn data(&self) -> &Arc<[u8]> {
        &self.data
    }
}

// =============================================================================
// Reader
// =============================================================================

/// Read-only lookup of module payloads by qualified name.
#[derive(Debug)]
pub struct FrozenArchive {
    entries: FxHashMap<Arc<str>, ArchiveEntry>,
    /// Every proper dotted prefix of every entry name, for the
    /// namespace membership test.
    prefixes: FxHashSet<Arc<str>>,
}

impl FrozenArchive {
    /// Open an archive file. Any structural defect is fatal.
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Parse an archive from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArchiveError> {
        if bytes.len() < HEADER_LEN {
            return Err(malformed("container shorter than header"));
        }
        if &bytes[..8] != MAGIC {
            return Err(malformed("bad magic"));
        }

        let version = read_u16(bytes, 8);
        if version != FORMAT_VERSION {
            return Err(ArchiveError::UnsupportedVersion {
                found: version,
                supported: FORMAT_VERSION,
            });
        }

        let count = read_u32(bytes, 12) as usize;
        let data_off = read_u32(bytes, 16) as usize;
        if data_off > bytes.len() {
            return Err(malformed("data offset past end of container"));
        }

        let mut entries =
            FxHashMap::with_capacity_and_hasher(count, Default::default());
        let mut prefixes = FxHashSet::default();
        let mut pos = HEADER_LEN;

        for _ in 0..count {
            let name_len = take_u16(bytes, &mut pos)? as usize;
            if pos + name_len > data_off {
                return Err(malformed("entry table overlaps payload region"));
            }
            let name = std::str::from_utf8(&bytes[pos..pos + name_len])
                .map_err(|_| malformed("entry name is not UTF-8"))?;
            if name.is_empty() {
                return Err(malformed("empty entry name"));
            }
            let name: Arc<str> = Arc::from(name);
            pos += name_len;

            let kind = EntryKind::from_byte(take_u8(bytes, &mut pos)?)
                .ok_or_else(|| malformed("unknown entry kind"))?;
            let flags = take_u8(bytes, &mut pos)?;
            let offset = take_u32(bytes, &mut pos)? as usize;
            let length = take_u32(bytes, &mut pos)? as usize;

            let start = data_off
                .checked_add(offset)
                .ok_or_else(|| malformed("payload offset overflow"))?;
            let end = start
                .checked_add(length)
                .ok_or_else(|| malformed("payload length overflow"))?;
            if end > bytes.len() {
                return Err(malformed("payload range past end of container"));
            }

            let mut prefix = name.as_ref();
            while let Some((parent, _)) = prefix.rsplit_once('.') {
                prefixes.insert(Arc::from(parent));
                prefix = parent;
            }

            let entry = ArchiveEntry {
                name: Arc::clone(&name),
                kind,
                flags,
                data: Arc::from(&bytes[start..end]),
            };
            if entries.insert(name, entry).is_some() {
                return Err(malformed("duplicate entry name"));
            }
        }

        if pos > data_off {
            return Err(malformed("entry table overruns data offset"));
        }

        Ok(Self { entries, prefixes })
    }

    /// Create an archive with no entries.
    pub fn empty() -> Self {
        Self {
            entries: FxHashMap::default(),
            prefixes: FxHashSet::default(),
        }
    }

    /// Look up an entry by qualified name.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&ArchiveEntry> {
        self.entries.get(name)
    }

    /// Check whether a name is present.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Check whether a name denotes a package entry.
    pub fn is_package_dir(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .map(|e| e.kind() == EntryKind::Package)
            .unwrap_or(false)
    }

    /// Archive membership test for namespace contributions: whether
    /// the archive holds a directory-like node for `name` — either an
    /// explicit package entry or any entry nested below `name`.
    pub fn contains_dir(&self, name: &str) -> bool {
        self.is_package_dir(name) || self.prefixes.contains(name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entry names.
    pub fn names(&self) -> impl Iterator<Item = &Arc<str>> {
        self.entries.keys()
    }
}

fn malformed(reason: &str) -> ArchiveError {
    ArchiveError::Malformed {
        reason: reason.to_string(),
    }
}

#[inline]
fn read_u16(bytes: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([bytes[pos], bytes[pos + 1]])
}

#[inline]
fn read_u32(bytes: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]])
}

fn take_u8(bytes: &[u8], pos: &mut usize) -> Result<u8, ArchiveError> {
    if *pos + 1 > bytes.len() {
        return Err(malformed("truncated entry table"));
    }
    let v = bytes[*pos];
    *pos += 1;
    Ok(v)
}

fn take_u16(bytes: &[u8], pos: &mut usize) -> Result<u16, ArchiveError> {
    if *pos + 2 > bytes.len() {
        return Err(malformed("truncated entry table"));
    }
    let v = read_u16(bytes, *pos);
    *pos += 2;
    Ok(v)
}

fn take_u32(bytes: &[u8], pos: &mut usize) -> Result<u32, ArchiveError> {
    if *pos + 4 > bytes.len() {
        return Err(malformed("truncated entry table"));
    }
    let v = read_u32(bytes, *pos);
    *pos += 4;
    Ok(v)
}

// =============================================================================
// Builder
// =============================================================================

/// Canonical writer for the container format.
///
/// The real bundler drives this at build time; tests use it to
/// assemble fixtures.
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    entries: Vec<(String, EntryKind, u8, Vec<u8>)>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plain module with compiled code.
    pub fn add_module(&mut self, name: &str, code: &[u8]) -> &mut Self {
        self.entries
            .push((name.to_string(), EntryKind::Module, 0, code.to_vec()));
        self
    }

    /// Add a regular package; `init_code` is the package body.
    pub fn add_package(&mut self, name: &str, init_code: &[u8]) -> &mut Self {
        self.entries.push((
            name.to_string(),
            EntryKind::Package,
            FLAG_PACKAGE,
            init_code.to_vec(),
        ));
        self
    }

    /// Add a namespace portion (no code).
    pub fn add_namespace(&mut self, name: &str) -> &mut Self {
        self.entries.push((
            name.to_string(),
            EntryKind::Package,
            FLAG_PACKAGE | FLAG_NAMESPACE,
            Vec::new(),
        ));
        self
    }

    /// Add a raw data resource.
    pub fn add_resource(&mut self, name: &str, data: &[u8]) -> &mut Self {
        self.entries
            .push((name.to_string(), EntryKind::Resource, 0, data.to_vec()));
        self
    }

    /// Serialize the container.
    pub fn build(&self) -> Result<Vec<u8>, ArchiveError> {
        let mut seen = FxHashSet::default();
        let mut table_len = 0usize;
        let mut data_len = 0usize;

        for (name, _, _, data) in &self.entries {
            if name.is_empty() {
                return Err(malformed("empty entry name"));
            }
            if name.len() > u16::MAX as usize {
                return Err(malformed("entry name too long"));
            }
            if !seen.insert(name.as_str()) {
                return Err(malformed("duplicate entry name"));
            }
            table_len += 2 + name.len() + 1 + 1 + 4 + 4;
            data_len += data.len();
        }

        let data_off = HEADER_LEN + table_len;
        if data_off + data_len > u32::MAX as usize {
            return Err(malformed("container too large"));
        }

        let mut out = Vec::with_capacity(data_off + data_len);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&(self.entries.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data_off as u32).to_le_bytes());

        let mut offset = 0u32;
        for (name, kind, flags, data) in &self.entries {
            out.extend_from_slice(&(name.len() as u16).to_le_bytes());
            out.extend_from_slice(name.as_bytes());
            out.push(kind.to_byte());
            out.push(*flags);
            out.extend_from_slice(&offset.to_le_bytes());
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            offset += data.len() as u32;
        }

        for (_, _, _, data) in &self.entries {
            out.extend_from_slice(data);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FrozenArchive {
        let mut builder = ArchiveBuilder::new();
        builder
            .add_package("pkg", b"init-code")
            .add_module("pkg.sub", b"sub-code")
            .add_module("plain", b"plain-code")
            .add_namespace("nspkg")
            .add_module("nspkg.part", b"part-code")
            .add_resource("assets.logo", b"\x89PNG");
        FrozenArchive::from_bytes(&builder.build().unwrap()).unwrap()
    }

    #[test]
    fn test_roundtrip_lookup() {
        let archive = sample();
        assert_eq!(archive.len(), 6);

        let entry = archive.get("pkg.sub").unwrap();
        assert_eq!(entry.kind(), EntryKind::Module);
        assert_eq!(entry.data().as_ref(), b"sub-code");
        assert!(!entry.is_package());

        let pkg = archive.get("pkg").unwrap();
        assert!(pkg.is_package());
        assert!(!pkg.is_namespace());
        assert_eq!(pkg.data().as_ref(), b"init-code");

        let ns = archive.get("nspkg").unwrap();
        assert!(ns.is_namespace());
        assert!(ns.data().is_empty());
    }

    #[test]
    fn test_missing_entry_is_none() {
        let archive = sample();
        assert!(archive.get("nonexistent").is_none());
        assert!(!archive.contains("nonexistent"));
    }

    #[test]
    fn test_lookup_is_pure() {
        let archive = sample();
        let a = archive.get("plain").unwrap().data().clone();
        let b = archive.get("plain").unwrap().data().clone();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_contains_dir() {
        let archive = sample();
        // Explicit package entries.
        assert!(archive.contains_dir("pkg"));
        assert!(archive.contains_dir("nspkg"));
        // Implicit via nested entry.
        assert!(archive.contains_dir("assets"));
        // Plain modules are not directories.
        assert!(!archive.contains_dir("plain"));
        assert!(!archive.contains_dir("pkg.sub"));
    }

    #[test]
    fn test_bad_magic_is_fatal() {
        let mut bytes = ArchiveBuilder::new()
            .add_module("m", b"x")
            .build()
            .unwrap();
        bytes[0] = b'X';
        match FrozenArchive::from_bytes(&bytes) {
            Err(ArchiveError::Malformed { .. }) => {}
            other => panic!("expected Malformed, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = ArchiveBuilder::new()
            .add_module("m", b"x")
            .build()
            .unwrap();
        bytes[8] = 0xff;
        bytes[9] = 0xff;
        match FrozenArchive::from_bytes(&bytes) {
            Err(ArchiveError::UnsupportedVersion { found, .. }) => {
                assert_eq!(found, 0xffff);
            }
            other => panic!("expected UnsupportedVersion, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_container() {
        let bytes = ArchiveBuilder::new()
            .add_module("m", b"payload")
            .build()
            .unwrap();
        match FrozenArchive::from_bytes(&bytes[..bytes.len() - 4]) {
            Err(ArchiveError::Malformed { .. }) => {}
            other => panic!("expected Malformed, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_entry_rejected() {
        let mut builder = ArchiveBuilder::new();
        builder.add_module("m", b"a").add_module("m", b"b");
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_empty_archive() {
        let bytes = ArchiveBuilder::new().build().unwrap();
        let archive = FrozenArchive::from_bytes(&bytes).unwrap();
        assert!(archive.is_empty());
        assert!(!archive.contains_dir("anything"));
    }

    #[test]
    fn test_open_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.pmf");
        let bytes = ArchiveBuilder::new()
            .add_module("m", b"code")
            .build()
            .unwrap();
        std::fs::write(&path, &bytes).unwrap();

        let archive = FrozenArchive::open(&path).unwrap();
        assert!(archive.contains("m"));
    }
}
