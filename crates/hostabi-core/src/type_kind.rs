//! Schema type kinds.
//!
//! [`TypeKind`] is the closed set of variants a schema type can take, together
//! with the variant-specific payload. Composite kinds refer to their
//! constituents by [`TypeId`] so that structurally shared sub-types are stored
//! once in the build context's arena.
//!
//! # Categories
//!
//! - **Scalars**: `any`, the string kinds, `boolean`, `strictBoolean`, `f64`,
//!   the fixed-width integers, `usize` and `undefined`.
//! - **Virtual arguments**: `globalObject` and `zigVirtualMachine` stand for
//!   implicit call context and may only appear as top-level function arguments.
//! - **Deferred**: `externalClass` and `ref` are placeholders that have not been
//!   lowered yet. Operations without a rule for them fail loudly.
//! - **Enums**: `stringEnum` (closed literal list) and `zigEnum` (a native enum
//!   identified by declaring file + symbol).
//! - **Composites**: `sequence`, `record`, `oneOf` and `dictionary`.

use std::fmt;

use crate::TypeId;

/// One field of a dictionary type, in declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryField {
    /// Field key as written in the schema.
    pub key: String,
    /// Field type.
    pub ty: TypeId,
    /// Whether the field type carried the `required` modifier.
    pub required: bool,
}

impl DictionaryField {
    /// Create a new dictionary field.
    pub fn new(key: impl Into<String>, ty: TypeId, required: bool) -> Self {
        Self {
            key: key.into(),
            ty,
            required,
        }
    }
}

/// The kind of a schema type, with its variant-specific data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// Any host value, passed through as an opaque handle.
    Any,
    /// Latin-1 byte string.
    ByteString,
    /// UTF-16 string.
    DomString,
    /// UTF-16 string with lone surrogates replaced.
    UsvString,
    /// UTF-8 byte slice (variable length on the native side).
    Utf8String,
    /// Boolean with host truthiness coercion.
    Boolean,
    /// Boolean that rejects non-boolean inputs.
    StrictBoolean,
    /// 64-bit float.
    F64,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    /// Pointer-sized unsigned integer.
    Usize,
    /// The undefined value; zero-sized on the native side.
    Undefined,
    /// The calling engine's global object (virtual argument).
    GlobalObject,
    /// The native virtual machine handle (virtual argument).
    ZigVirtualMachine,
    /// Externally defined class. Not lowered yet.
    ExternalClass,
    /// Reference to a named type. Not lowered yet.
    Ref(String),
    /// Closed list of string literals.
    StringEnum(Vec<String>),
    /// Native enum defined in `file` under `symbol`.
    ZigEnum { file: String, symbol: String },
    /// Homogeneous sequence of the element type.
    Sequence(TypeId),
    /// String-keyed map to the value type.
    Record(TypeId),
    /// Tagged union of member types.
    OneOf(Vec<TypeId>),
    /// Ordered named fields.
    Dictionary(Vec<DictionaryField>),
}

impl TypeKind {
    /// The kind tag, as used in hashes and generated names.
    pub fn tag(&self) -> &'static str {
        match self {
            TypeKind::Any => "any",
            TypeKind::ByteString => "ByteString",
            TypeKind::DomString => "DOMString",
            TypeKind::UsvString => "USVString",
            TypeKind::Utf8String => "UTF8String",
            TypeKind::Boolean => "boolean",
            TypeKind::StrictBoolean => "strictBoolean",
            TypeKind::F64 => "f64",
            TypeKind::I8 => "i8",
            TypeKind::I16 => "i16",
            TypeKind::I32 => "i32",
            TypeKind::I64 => "i64",
            TypeKind::U8 => "u8",
            TypeKind::U16 => "u16",
            TypeKind::U32 => "u32",
            TypeKind::U64 => "u64",
            TypeKind::Usize => "usize",
            TypeKind::Undefined => "undefined",
            TypeKind::GlobalObject => "globalObject",
            TypeKind::ZigVirtualMachine => "zigVirtualMachine",
            TypeKind::ExternalClass => "externalClass",
            TypeKind::Ref(_) => "ref",
            TypeKind::StringEnum(_) => "stringEnum",
            TypeKind::ZigEnum { .. } => "zigEnum",
            TypeKind::Sequence(_) => "sequence",
            TypeKind::Record(_) => "record",
            TypeKind::OneOf(_) => "oneOf",
            TypeKind::Dictionary(_) => "dictionary",
        }
    }

    /// True only for kinds that stand for implicit call context.
    pub fn is_virtual_argument(&self) -> bool {
        matches!(self, TypeKind::GlobalObject | TypeKind::ZigVirtualMachine)
    }

    /// True for composite kinds that are boxed or structured on the native side.
    pub fn lowers_to_struct(&self) -> bool {
        matches!(
            self,
            TypeKind::Sequence(_) | TypeKind::Record(_) | TypeKind::OneOf(_) | TypeKind::Dictionary(_)
        )
    }

    /// True for kinds that lower to a named native declaration (struct, union or enum).
    pub fn lowers_to_named_type(&self) -> bool {
        self.lowers_to_struct() || matches!(self, TypeKind::StringEnum(_) | TypeKind::ZigEnum { .. })
    }

    pub fn is_string_type(&self) -> bool {
        matches!(
            self,
            TypeKind::ByteString | TypeKind::DomString | TypeKind::UsvString | TypeKind::Utf8String
        )
    }

    pub fn is_integer_type(&self) -> bool {
        matches!(
            self,
            TypeKind::I8
                | TypeKind::I16
                | TypeKind::I32
                | TypeKind::I64
                | TypeKind::U8
                | TypeKind::U16
                | TypeKind::U32
                | TypeKind::U64
                | TypeKind::Usize
        )
    }

    pub fn is_number_type(&self) -> bool {
        self.is_integer_type() || matches!(self, TypeKind::F64)
    }

    pub fn is_object_type(&self) -> bool {
        matches!(self, TypeKind::ExternalClass | TypeKind::Dictionary(_))
    }

    /// The `undefined` kind is skipped by argument lowering.
    pub fn is_ignored_undefined(&self) -> bool {
        matches!(self, TypeKind::Undefined)
    }

    /// Directly nested constituent types, in declared order.
    ///
    /// Empty for every non-composite kind.
    pub fn constituents(&self) -> Vec<TypeId> {
        match self {
            TypeKind::Sequence(element) => vec![*element],
            TypeKind::Record(value) => vec![*value],
            TypeKind::OneOf(members) => members.clone(),
            TypeKind::Dictionary(fields) => fields.iter().map(|f| f.ty).collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}
