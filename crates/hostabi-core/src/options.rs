//! Build options.
//!
//! [`BuildOptions`] configures how binding declaration files are attributed to
//! native modules and how struct fields are ordered.
//!
//! # Example
//!
//! ```
//! use hostabi_core::{BuildOptions, FieldOrder};
//!
//! let options = BuildOptions::default()
//!     .with_source_root("src")
//!     .with_field_order(FieldOrder::DescendingAlignment);
//! assert_eq!(options.binding_suffix, ".bind.ts");
//! ```

use std::path::PathBuf;

/// Field ordering used by struct reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldOrder {
    /// Ascending `(alignment, size, name)`.
    ///
    /// Matches previously generated artifacts bit for bit. It does not
    /// minimize padding in general.
    #[default]
    AscendingAlignment,
    /// Descending `(alignment, size)`, ties by ascending name.
    ///
    /// The conventional padding-minimal order. Changes struct hashes and
    /// layouts relative to [`FieldOrder::AscendingAlignment`].
    DescendingAlignment,
}

/// Options for one schema build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Directory binding paths are made relative to.
    pub source_root: PathBuf,
    /// Suffix identifying binding declaration files.
    pub binding_suffix: String,
    /// Extension of the native module a binding file targets.
    pub native_extension: String,
    /// Struct field ordering.
    pub field_order: FieldOrder,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("src"),
            binding_suffix: ".bind.ts".to_string(),
            native_extension: "zig".to_string(),
            field_order: FieldOrder::default(),
        }
    }
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = root.into();
        self
    }

    pub fn with_binding_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.binding_suffix = suffix.into();
        self
    }

    pub fn with_native_extension(mut self, extension: impl Into<String>) -> Self {
        self.native_extension = extension.into();
        self
    }

    pub fn with_field_order(mut self, order: FieldOrder) -> Self {
        self.field_order = order;
        self
    }
}
