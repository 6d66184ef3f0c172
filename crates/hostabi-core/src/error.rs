//! Error types for schema building.
//!
//! Every error is fatal to the build: a single invalid declaration aborts the
//! whole generation run so that no partial artifact is ever emitted.
//!
//! ## Error Categories
//!
//! ```text
//! SchemaError
//! ├── flag derivation    - ModifierConflict, InvalidRange
//! ├── default values     - InvalidDefault, DefaultPrecisionLoss,
//! │                        DefaultOutOfRange, MissingDictionaryKey
//! ├── argument ordering  - RequiredAfterOptional, DuplicateArgument
//! ├── unsupported kinds  - Unsupported
//! ├── virtual arguments  - VirtualArgumentMisuse
//! ├── structure          - DuplicateField, UnionMemberDefault,
//! │                        UnknownRepresentation, LayoutFrozen
//! ├── files              - NoDeclaringFile, InvalidBindingFile,
//! │                        FileNameCollision
//! └── InFile             - any of the above, attributed to a binding file
//! ```

use thiserror::Error;

/// Result alias for schema building.
pub type SchemaResult<T> = Result<T, SchemaError>;

fn at_path(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!(" at '{path}'")
    }
}

/// Errors raised while building a schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// A modifier cannot be derived on this type.
    #[error("cannot derive {modifier} on {ty}: {reason}")]
    ModifierConflict {
        /// The modifier being derived (e.g. "optional").
        modifier: &'static str,
        /// Description of the type it was derived on.
        ty: String,
        /// Why the derivation is rejected.
        reason: &'static str,
    },

    /// A range modifier has invalid bounds.
    #[error("invalid range on {ty}: {reason}")]
    InvalidRange { ty: String, reason: String },

    /// A default value has the wrong host type.
    #[error("invalid default value{}: expected {expected}, got {found}", at_path(.path))]
    InvalidDefault {
        expected: &'static str,
        found: String,
        /// Dotted path into a dictionary default, empty at the top level.
        path: String,
    },

    /// A plain number default cannot be represented losslessly.
    #[error(
        "default {kind} value {value} is outside the safe integer range{}; specify it as a big integer literal to avoid precision loss",
        at_path(.path)
    )]
    DefaultPrecisionLoss {
        kind: &'static str,
        value: String,
        path: String,
    },

    /// An integer default falls outside the declared range.
    #[error("expected integer in range [{min}, {max}]{}, got {value}", at_path(.path))]
    DefaultOutOfRange {
        min: i128,
        max: i128,
        value: String,
        path: String,
    },

    /// A dictionary default omits a required key.
    #[error("missing key '{key}' in dictionary default{}", at_path(.path))]
    MissingDictionaryKey { key: String, path: String },

    /// A required argument follows an optional one.
    #[error("required argument '{argument}' cannot follow an optional argument in function '{function}'")]
    RequiredAfterOptional { function: String, argument: String },

    /// An argument name is declared twice in one variant.
    #[error("duplicate argument '{argument}' in function '{function}'")]
    DuplicateArgument { function: String, argument: String },

    /// A kind reached an operation with no defined rule for it.
    #[error("{operation} is not supported for type kind '{kind}'")]
    Unsupported {
        operation: &'static str,
        kind: &'static str,
    },

    /// A virtual argument was used outside a top-level argument position.
    #[error("t.{kind} can only be used as a function argument type, not {position}")]
    VirtualArgumentMisuse {
        kind: &'static str,
        position: String,
    },

    /// A dictionary declares the same key twice.
    #[error("duplicate key '{key}' in dictionary")]
    DuplicateField { key: String },

    /// A union member carries a default value.
    #[error(
        "union member of kind '{kind}' cannot include a default value; set the default on the union type itself"
    )]
    UnionMemberDefault { kind: &'static str },

    /// A struct field refers to a representation that does not exist.
    #[error("unknown C-ABI representation for struct field '{field}'")]
    UnknownRepresentation { field: String },

    /// A struct was reordered after its hash was taken.
    #[error("struct with hash {hash} is already hashed; its field order is frozen")]
    LayoutFrozen { hash: String },

    /// A declaration was made without an active binding file.
    #[error("no binding file is being declared")]
    NoDeclaringFile,

    /// A path is not a binding declaration file.
    #[error("'{path}' is not a binding file (expected suffix '{suffix}')")]
    InvalidBindingFile { path: String, suffix: String },

    /// Two native modules share a namespace name.
    #[error("file name collision: '{first}' and '{second}' both map to namespace '{namespace}'")]
    FileNameCollision {
        namespace: String,
        first: String,
        second: String,
    },

    /// An error attributed to the binding file that caused it.
    #[error("{file}: {source}")]
    InFile {
        file: String,
        #[source]
        source: Box<SchemaError>,
    },
}

impl SchemaError {
    /// Attribute this error to a binding file.
    ///
    /// Errors that already carry a file are returned unchanged.
    pub fn in_file(self, file: impl Into<String>) -> Self {
        match self {
            SchemaError::InFile { .. } => self,
            other => SchemaError::InFile {
                file: file.into(),
                source: Box::new(other),
            },
        }
    }

    /// The underlying error, with any file attribution removed.
    pub fn root(&self) -> &SchemaError {
        match self {
            SchemaError::InFile { source, .. } => source.root(),
            other => other,
        }
    }

    /// The binding file this error is attributed to, if any.
    pub fn file(&self) -> Option<&str> {
        match self {
            SchemaError::InFile { file, .. } => Some(file),
            _ => None,
        }
    }
}
