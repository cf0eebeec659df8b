//! Title fingerprints and the dedup watermark
//!
//! A fingerprint is a hex-encoded SHA-256 digest of a title. It is only ever
//! compared for equality; nothing relies on it being secret.

use sha2::{Digest, Sha256};
use std::fmt;

/// Deterministic content hash of an announcement title
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprints the UTF-8 bytes of a title
    pub fn of(title: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(title.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Parses a stored hex digest; None unless it decodes to 32 bytes
    pub fn from_hex(digest: &str) -> Option<Self> {
        let bytes = hex::decode(digest.trim()).ok()?;
        if bytes.len() != 32 {
            return None;
        }
        Some(Self(hex::encode(bytes)))
    }

    /// Hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint of the most recently persisted title
///
/// Starts empty. An empty watermark matches nothing, so the first poll
/// treats every entry on the page as new.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watermark {
    current: Option<Fingerprint>,
}

impl Watermark {
    /// The empty watermark used at process start
    pub fn empty() -> Self {
        Self::default()
    }

    /// Watermark pointing at the given title
    pub fn at_title(title: &str) -> Self {
        Self {
            current: Some(Fingerprint::of(title)),
        }
    }

    /// Watermark restored from a previously saved fingerprint
    pub fn from_fingerprint(fingerprint: Fingerprint) -> Self {
        Self {
            current: Some(fingerprint),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        self.current.as_ref()
    }

    /// Returns true if `title` hashes to the watermark's fingerprint
    pub fn matches(&self, title: &str) -> bool {
        match &self.current {
            Some(fp) => Fingerprint::of(title) == *fp,
            None => false,
        }
    }

    /// Moves the watermark to the given title
    pub fn advance_to(&mut self, title: &str) {
        self.current = Some(Fingerprint::of(title));
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.current {
            Some(fp) => fp.fmt(f),
            None => f.write_str("<empty>"),
        }
    }
}
