//! Type modifier flags.
//!
//! Flags are orthogonal to a type's kind and data: they never participate in
//! the structural hash, so `oneOf(A, B)` and `oneOf(A, B).optional` share one
//! generated declaration. Their purpose is to inform receivers such as
//! dictionaries and function signatures how a use site treats the type.

use bitflags::bitflags;

use crate::DefaultValue;

bitflags! {
    /// Boolean modifiers applied to a type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// The value may be absent.
        const OPTIONAL = 1 << 0;
        /// The value may be null.
        const NULLABLE = 1 << 1;
        /// The value must be present (dictionary fields).
        const REQUIRED = 1 << 2;
        /// The value is checked to be non-null on entry.
        const NON_NULL = 1 << 3;
        /// The float is checked to be finite on entry.
        const FINITE = 1 << 4;
    }
}

/// How an integer range modifier treats out-of-range values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeMode {
    /// Saturate to the nearest bound.
    Clamp,
    /// Reject with a range error.
    Enforce,
}

/// Bounds of an integer range modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeBounds {
    /// The full range of the native integer type.
    Abi,
    /// A narrower inclusive range.
    Explicit { min: i128, max: i128 },
}

/// A range modifier attached to an integer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeModifier {
    pub mode: RangeMode,
    pub bounds: RangeBounds,
}

/// Extra host-side validation emitted for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeValidator {
    ValidateInteger,
}

/// The immutable modifier set of a type node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeFlags {
    pub modifiers: Modifiers,
    pub default: Option<DefaultValue>,
    pub range: Option<RangeModifier>,
    pub node_validator: Option<NodeValidator>,
}

impl TypeFlags {
    #[inline]
    pub fn is_optional(&self) -> bool {
        self.modifiers.contains(Modifiers::OPTIONAL)
    }

    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.modifiers.contains(Modifiers::NULLABLE)
    }

    #[inline]
    pub fn is_required(&self) -> bool {
        self.modifiers.contains(Modifiers::REQUIRED)
    }

    #[inline]
    pub fn is_non_null(&self) -> bool {
        self.modifiers.contains(Modifiers::NON_NULL)
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.modifiers.contains(Modifiers::FINITE)
    }

    #[inline]
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Optional or defaulted: a caller may omit the value.
    pub fn may_be_omitted(&self) -> bool {
        self.is_optional() || self.has_default()
    }

    /// Optional without a default: the native side needs a presence bit.
    pub fn is_optional_without_default(&self) -> bool {
        self.is_optional() && !self.has_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_flags_are_empty() {
        let flags = TypeFlags::default();
        assert!(!flags.is_optional());
        assert!(!flags.is_required());
        assert!(!flags.may_be_omitted());
    }

    #[test]
    fn default_implies_omittable() {
        let flags = TypeFlags {
            default: Some(DefaultValue::Boolean(true)),
            ..TypeFlags::default()
        };
        assert!(flags.may_be_omitted());
        assert!(!flags.is_optional_without_default());
    }

    #[test]
    fn optional_without_default() {
        let flags = TypeFlags {
            modifiers: Modifiers::OPTIONAL | Modifiers::NULLABLE,
            ..TypeFlags::default()
        };
        assert!(flags.is_optional_without_default());
        assert!(flags.is_nullable());
    }
}
