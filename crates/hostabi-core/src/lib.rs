//! Core vocabulary for the host ABI schema compiler.
//!
//! This crate holds the leaf types shared by every part of the schema build:
//!
//! - [`ContentHash`] - structural digest used for canonicalization
//! - [`TypeId`], [`StructId`], [`FunctionId`] - arena handles
//! - [`TypeKind`] - the closed set of schema type kinds with their data
//! - [`TypeFlags`] - the modifier set (`optional`, `nullable`, `required`, `default`, ...)
//! - [`DefaultValue`] - host literals attached as defaults
//! - [`CAbiPrimitive`], [`AbiType`] - the fixed native representation table
//! - [`BuildOptions`] - configuration of a build
//! - [`SchemaError`] - the error taxonomy

mod abi;
mod content_hash;
mod default_value;
mod error;
mod flags;
mod ids;
mod options;
mod type_kind;

pub use abi::{AbiType, CAbiPrimitive, MAX_SAFE_INTEGER, align_forward, integer_limits};
pub use content_hash::ContentHash;
pub use default_value::DefaultValue;
pub use error::{SchemaError, SchemaResult};
pub use flags::{Modifiers, NodeValidator, RangeBounds, RangeMode, RangeModifier, TypeFlags};
pub use ids::{FunctionId, StructId, TypeId};
pub use options::{BuildOptions, FieldOrder};
pub use type_kind::{DictionaryField, TypeKind};
