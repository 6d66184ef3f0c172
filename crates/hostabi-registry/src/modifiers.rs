//! Modifier derivation.
//!
//! Every modifier returns a new [`TypeId`] whose node shares kind, data and
//! hash with its source but carries an updated [`TypeFlags`] set. The source
//! node is never touched.

use tracing::trace;

use hostabi_core::{
    DefaultValue, MAX_SAFE_INTEGER, Modifiers, NodeValidator, RangeBounds, RangeMode,
    RangeModifier, SchemaError, SchemaResult, TypeFlags, TypeId, TypeKind, integer_limits,
};

use crate::SchemaBuildContext;

impl SchemaBuildContext {
    fn derive_type(&mut self, id: TypeId, flags: TypeFlags) -> TypeId {
        let node = self.type_node(id).derive(flags);
        let derived = self.alloc_type(node);
        trace!(target: "hostabi::types", from = %id, to = %derived, "derived modifier");
        derived
    }

    fn conflict(&self, modifier: &'static str, id: TypeId, reason: &'static str) -> SchemaError {
        SchemaError::ModifierConflict {
            modifier,
            ty: self.describe(id),
            reason,
        }
    }

    fn set_modifier(
        &mut self,
        id: TypeId,
        name: &'static str,
        modifier: Modifiers,
        check: impl FnOnce(&TypeFlags) -> Option<&'static str>,
    ) -> SchemaResult<TypeId> {
        let flags = self.type_node(id).flags();
        if let Some(reason) = check(flags) {
            let err = self.conflict(name, id, reason);
            return self.attribute(Err(err));
        }
        let mut flags = flags.clone();
        flags.modifiers.insert(modifier);
        Ok(self.derive_type(id, flags))
    }

    /// The value may be absent.
    pub fn optional(&mut self, id: TypeId) -> SchemaResult<TypeId> {
        self.set_modifier(id, "optional", Modifiers::OPTIONAL, |flags| {
            if flags.is_required() {
                Some("the type is required")
            } else if flags.has_default() {
                Some("a default value already implies optional")
            } else {
                None
            }
        })
    }

    /// The value may be null.
    pub fn nullable(&mut self, id: TypeId) -> SchemaResult<TypeId> {
        self.set_modifier(id, "nullable", Modifiers::NULLABLE, |flags| {
            flags.is_nullable().then_some("the type is already nullable")
        })
    }

    /// The value must be present.
    pub fn required(&mut self, id: TypeId) -> SchemaResult<TypeId> {
        self.set_modifier(id, "required", Modifiers::REQUIRED, |flags| {
            if flags.is_required() {
                Some("the type is already required")
            } else if flags.is_optional() {
                Some("the type is optional")
            } else {
                None
            }
        })
    }

    /// The value is checked to be non-null on entry.
    pub fn non_null(&mut self, id: TypeId) -> SchemaResult<TypeId> {
        self.set_modifier(id, "nonNull", Modifiers::NON_NULL, |flags| {
            flags.is_non_null().then_some("the type is already nonNull")
        })
    }

    /// The float is checked to be finite on entry. Only valid on `f64`.
    pub fn finite(&mut self, id: TypeId) -> SchemaResult<TypeId> {
        let is_f64 = matches!(self.type_node(id).kind(), TypeKind::F64);
        self.set_modifier(id, "finite", Modifiers::FINITE, |flags| {
            if !is_f64 {
                Some("finite can only be used on f64")
            } else if flags.is_finite() {
                Some("the type is already finite")
            } else {
                None
            }
        })
    }

    /// Attach a default value, validated against the type's shape first.
    pub fn with_default(&mut self, id: TypeId, value: DefaultValue) -> SchemaResult<TypeId> {
        let flags = self.type_node(id).flags();
        if flags.has_default() {
            let err = self.conflict("default", id, "the type already has a default value");
            return self.attribute(Err(err));
        }
        if flags.is_required() {
            let err = self.conflict("default", id, "the type is required");
            return self.attribute(Err(err));
        }
        let checked = self.assert_default_is_valid(id, &value);
        self.attribute(checked)?;

        let mut flags = self.type_node(id).flags().clone();
        flags.default = Some(value);
        Ok(self.derive_type(id, flags))
    }

    /// Saturate out-of-range integers to `[min, max]`, or to the native
    /// type's limits when both bounds are omitted.
    pub fn clamp(&mut self, id: TypeId, min: Option<i128>, max: Option<i128>) -> SchemaResult<TypeId> {
        let flags = self.range_flags(id, RangeMode::Clamp, min, max);
        let flags = self.attribute(flags)?;
        Ok(self.derive_type(id, flags))
    }

    /// Reject out-of-range integers, see [`clamp`](Self::clamp).
    pub fn enforce_range(
        &mut self,
        id: TypeId,
        min: Option<i128>,
        max: Option<i128>,
    ) -> SchemaResult<TypeId> {
        let flags = self.range_flags(id, RangeMode::Enforce, min, max);
        let flags = self.attribute(flags)?;
        Ok(self.derive_type(id, flags))
    }

    /// Enforce an integral value in `[min, max]`, defaulting to the host's
    /// safe-integer range, validated on the host side.
    pub fn validate_integer(
        &mut self,
        id: TypeId,
        min: Option<i128>,
        max: Option<i128>,
    ) -> SchemaResult<TypeId> {
        let min = min.unwrap_or(-MAX_SAFE_INTEGER);
        let max = max.unwrap_or(MAX_SAFE_INTEGER);
        let flags = self.range_flags(id, RangeMode::Enforce, Some(min), Some(max));
        let mut flags = self.attribute(flags)?;
        flags.node_validator = Some(NodeValidator::ValidateInteger);
        Ok(self.derive_type(id, flags))
    }

    fn range_flags(
        &self,
        id: TypeId,
        mode: RangeMode,
        min: Option<i128>,
        max: Option<i128>,
    ) -> SchemaResult<TypeFlags> {
        let modifier = match mode {
            RangeMode::Clamp => "clamp",
            RangeMode::Enforce => "enforceRange",
        };
        let node = self.type_node(id);
        if node.flags().range.is_some() {
            return Err(self.conflict(modifier, id, "the type already has a range modifier"));
        }
        let Some((abi_min, abi_max)) = integer_limits(node.kind()) else {
            return Err(self.conflict(modifier, id, "range modifiers apply only to numeric kinds"));
        };

        let bounds = match (min, max) {
            (None, None) => RangeBounds::Abi,
            (Some(min), Some(max)) => {
                for bound in [min, max] {
                    if bound < abi_min || bound > abi_max {
                        return Err(SchemaError::InvalidRange {
                            ty: self.describe(id),
                            reason: format!(
                                "expected integer in range [{abi_min}, {abi_max}], got {bound}"
                            ),
                        });
                    }
                }
                if min > max {
                    return Err(SchemaError::InvalidRange {
                        ty: self.describe(id),
                        reason: format!("expected min <= max, got {min} > {max}"),
                    });
                }
                if min == abi_min && max == abi_max {
                    RangeBounds::Abi
                } else {
                    RangeBounds::Explicit { min, max }
                }
            }
            _ => {
                return Err(SchemaError::InvalidRange {
                    ty: self.describe(id),
                    reason: "expected min and max to be both set or both unset".to_string(),
                });
            }
        };

        let mut flags = node.flags().clone();
        flags.range = Some(RangeModifier { mode, bounds });
        Ok(flags)
    }
}
