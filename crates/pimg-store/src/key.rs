use std::fmt;
use std::str::FromStr;

use crate::error::{StoreError, StoreResult};

/// Maximum number of digits accepted in a collection id segment.
const MAX_ID_DIGITS: usize = 20;

/// Length of the lowercase extension in a stored filename.
const EXTENSION_LEN: usize = 3;

// ---------------------------------------------------------------------------
// CollectionId
// ---------------------------------------------------------------------------

/// Numeric collection an object belongs to. Rendered as one directory under
/// the storage root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionId(u64);

impl CollectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Parse a URL segment. Only ASCII digits are accepted: no sign, no
    /// whitespace, no overflow.
    pub fn parse(segment: &str) -> StoreResult<Self> {
        if segment.is_empty()
            || segment.len() > MAX_ID_DIGITS
            || !segment.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(StoreError::InvalidPath(format!(
                "collection id must be decimal digits, got {segment:?}"
            )));
        }
        segment
            .parse::<u64>()
            .map(Self)
            .map_err(|_| StoreError::InvalidPath(format!("collection id out of range: {segment}")))
    }
}

impl From<u64> for CollectionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for CollectionId {
    type Err = StoreError;

    fn from_str(s: &str) -> StoreResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Filename
// ---------------------------------------------------------------------------

/// A filename that matches `^[A-Za-z]+\.[a-z]{3}$`.
///
/// The grammar excludes `/`, `\` and any second `.`, so a parsed filename is
/// always a single normal path component. Containment in the storage root is
/// still checked separately by [`PathResolver`](crate::PathResolver).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Filename(String);

impl Filename {
    pub fn parse(name: &str) -> StoreResult<Self> {
        if Self::is_valid(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(StoreError::InvalidPath(format!(
                "filename must match [A-Za-z]+.[a-z]{{3}}, got {name:?}"
            )))
        }
    }

    /// Check the filename grammar without allocating.
    pub fn is_valid(name: &str) -> bool {
        let Some((stem, ext)) = name.split_once('.') else {
            return false;
        };
        !stem.is_empty()
            && stem.bytes().all(|b| b.is_ascii_alphabetic())
            && ext.len() == EXTENSION_LEN
            && ext.bytes().all(|b| b.is_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The three-letter extension.
    pub fn extension(&self) -> &str {
        &self.0[self.0.len() - EXTENSION_LEN..]
    }
}

impl FromStr for Filename {
    type Err = StoreError;

    fn from_str(s: &str) -> StoreResult<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for Filename {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Filename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ObjectKey
// ---------------------------------------------------------------------------

/// Logical address of a stored object: `{collection}/{filename}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub collection: CollectionId,
    pub filename: Filename,
}

impl ObjectKey {
    pub fn new(collection: CollectionId, filename: Filename) -> Self {
        Self { collection, filename }
    }

    /// Parse both URL segments, collection id first.
    pub fn parse(collection: &str, filename: &str) -> StoreResult<Self> {
        Ok(Self {
            collection: CollectionId::parse(collection)?,
            filename: Filename::parse(filename)?,
        })
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.filename)
    }
}
