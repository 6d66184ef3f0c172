//! C-ABI representations.
//!
//! This module holds the fixed primitive representation table used by struct
//! layout: every representation a field can take has a known size and natural
//! alignment, plus the spellings the emission driver uses for it.
//!
//! | Representation       | Size | Align |
//! |----------------------|------|-------|
//! | `u0` (void)          | 0    | 0     |
//! | `bool`, `u8`, `i8`   | 1    | 1     |
//! | `u16`, `i16`         | 2    | 2     |
//! | `u32`, `i32`         | 4    | 4     |
//! | 64-bit ints, `f64`   | 8    | 8     |
//! | handles and pointers | 8    | 8     |
//! | string handle        | 24   | 8     |

use std::fmt;

use crate::{StructId, TypeKind};

/// Largest integer a plain host number represents without precision loss.
pub const MAX_SAFE_INTEGER: i128 = (1 << 53) - 1;

/// A fixed-size primitive representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CAbiPrimitive {
    /// Zero-sized.
    Void,
    Bool,
    U8,
    U16,
    U32,
    U64,
    Usize,
    I8,
    I16,
    I32,
    I64,
    F64,
    /// Fixed-size string handle.
    StringHandle,
    /// Boxed host value handle.
    JsValue,
    /// Calling-context pointer.
    GlobalObjectPtr,
    /// Untyped pointer.
    OpaquePtr,
}

impl CAbiPrimitive {
    /// `(size, natural alignment)` in bytes.
    pub const fn size_align(self) -> (u32, u32) {
        match self {
            CAbiPrimitive::Void => (0, 0),
            CAbiPrimitive::Bool | CAbiPrimitive::U8 | CAbiPrimitive::I8 => (1, 1),
            CAbiPrimitive::U16 | CAbiPrimitive::I16 => (2, 2),
            CAbiPrimitive::U32 | CAbiPrimitive::I32 => (4, 4),
            CAbiPrimitive::Usize | CAbiPrimitive::U64 | CAbiPrimitive::I64 | CAbiPrimitive::F64 => (8, 8),
            CAbiPrimitive::JsValue | CAbiPrimitive::GlobalObjectPtr | CAbiPrimitive::OpaquePtr => (8, 8),
            CAbiPrimitive::StringHandle => (24, 8),
        }
    }

    /// Native-side spelling, also used in struct hashes.
    pub const fn as_str(self) -> &'static str {
        match self {
            CAbiPrimitive::Void => "u0",
            CAbiPrimitive::Bool => "bool",
            CAbiPrimitive::U8 => "u8",
            CAbiPrimitive::U16 => "u16",
            CAbiPrimitive::U32 => "u32",
            CAbiPrimitive::U64 => "u64",
            CAbiPrimitive::Usize => "usize",
            CAbiPrimitive::I8 => "i8",
            CAbiPrimitive::I16 => "i16",
            CAbiPrimitive::I32 => "i32",
            CAbiPrimitive::I64 => "i64",
            CAbiPrimitive::F64 => "f64",
            CAbiPrimitive::StringHandle => "String",
            CAbiPrimitive::JsValue => "JSValue",
            CAbiPrimitive::GlobalObjectPtr => "*JSGlobalObject",
            CAbiPrimitive::OpaquePtr => "*anyopaque",
        }
    }

    /// C spelling for generated headers.
    pub const fn c_name(self) -> &'static str {
        match self {
            CAbiPrimitive::Void => "void",
            CAbiPrimitive::Bool => "bool",
            CAbiPrimitive::U8 => "uint8_t",
            CAbiPrimitive::U16 => "uint16_t",
            CAbiPrimitive::U32 => "uint32_t",
            CAbiPrimitive::U64 => "uint64_t",
            CAbiPrimitive::Usize => "size_t",
            CAbiPrimitive::I8 => "int8_t",
            CAbiPrimitive::I16 => "int16_t",
            CAbiPrimitive::I32 => "int32_t",
            CAbiPrimitive::I64 => "int64_t",
            CAbiPrimitive::F64 => "double",
            CAbiPrimitive::StringHandle => "HostString",
            CAbiPrimitive::JsValue => "JSValue",
            CAbiPrimitive::GlobalObjectPtr => "JSGlobalObject*",
            CAbiPrimitive::OpaquePtr => "void*",
        }
    }

    /// Smallest unsigned tag able to index `count` enum literals.
    pub const fn for_enum_tag(count: usize) -> Self {
        if count <= 1 << 8 {
            CAbiPrimitive::U8
        } else if count <= 1 << 16 {
            CAbiPrimitive::U16
        } else {
            CAbiPrimitive::U32
        }
    }
}

impl fmt::Display for CAbiPrimitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directly mappable native representation: a primitive or a finalized struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbiType {
    Primitive(CAbiPrimitive),
    Struct(StructId),
}

impl AbiType {
    pub fn as_struct(self) -> Option<StructId> {
        match self {
            AbiType::Struct(id) => Some(id),
            AbiType::Primitive(_) => None,
        }
    }

    pub fn as_primitive(self) -> Option<CAbiPrimitive> {
        match self {
            AbiType::Primitive(p) => Some(p),
            AbiType::Struct(_) => None,
        }
    }
}

impl From<CAbiPrimitive> for AbiType {
    fn from(primitive: CAbiPrimitive) -> Self {
        AbiType::Primitive(primitive)
    }
}

/// Round `size` up to the next multiple of `alignment`.
///
/// Zero alignment (zero-sized fields) leaves the size unchanged.
#[inline]
pub const fn align_forward(size: u32, alignment: u32) -> u32 {
    if alignment == 0 {
        return size;
    }
    size.div_ceil(alignment) * alignment
}

/// Inclusive `[min, max]` limits of an integer kind.
///
/// `f64` reports the safe-integer range. Every other kind returns `None`.
pub fn integer_limits(kind: &TypeKind) -> Option<(i128, i128)> {
    let limits = match kind {
        TypeKind::U8 => (0, u8::MAX as i128),
        TypeKind::U16 => (0, u16::MAX as i128),
        TypeKind::U32 => (0, u32::MAX as i128),
        TypeKind::U64 | TypeKind::Usize => (0, u64::MAX as i128),
        TypeKind::I8 => (i8::MIN as i128, i8::MAX as i128),
        TypeKind::I16 => (i16::MIN as i128, i16::MAX as i128),
        TypeKind::I32 => (i32::MIN as i128, i32::MAX as i128),
        TypeKind::I64 => (i64::MIN as i128, i64::MAX as i128),
        TypeKind::F64 => (-MAX_SAFE_INTEGER, MAX_SAFE_INTEGER),
        _ => return None,
    };
    Some(limits)
}
