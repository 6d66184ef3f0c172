//! Deterministic structural content hashing.
//!
//! This module provides [`ContentHash`], a 64-bit digest used everywhere identity
//! must be structural rather than instance-based. Two schema types built
//! independently (possibly in different binding files) hash identically when
//! their shape is identical, which is what lets the registries collapse them
//! into a single generated artifact.
//!
//! # Hash Computation
//!
//! Uses XXHash64 over a canonical string serialization produced by the caller.
//! The serialization is owned by the type and struct layers; this module only
//! guarantees that equal strings produce equal digests across runs and hosts.
//!
//! # Examples
//!
//! ```
//! use hostabi_core::ContentHash;
//!
//! let a = ContentHash::of_str("dictionary:a:false:123");
//! let b = ContentHash::of_str("dictionary:a:false:123");
//! assert_eq!(a, b);
//!
//! let c = ContentHash::of_str("dictionary:a:true:123");
//! assert_ne!(a, c);
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// A deterministic 64-bit content digest.
///
/// Displayed in decimal, which is the form embedded into generated
/// identifiers such as `anon_dictionary_<hash>`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ContentHash(pub u64);

impl ContentHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: ContentHash = ContentHash(0);

    /// Digest a canonical string serialization.
    #[inline]
    pub fn of_str(repr: &str) -> Self {
        Self::of_bytes(repr.as_bytes())
    }

    /// Digest raw bytes.
    #[inline]
    pub fn of_bytes(bytes: &[u8]) -> Self {
        ContentHash(xxh64(bytes, 0))
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:#018x})", self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ContentHash> for u64 {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}
