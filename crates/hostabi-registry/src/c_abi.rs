//! Direct C-ABI mapping.
//!
//! Decides whether a type has a fixed-size native form. Scalars use the fixed
//! primitive table; sequences, records, unions and variable-length strings are
//! boxed behind a host value handle; dictionaries lower to a [`StructLayout`]
//! when every field maps directly and none is optional without a default.
//!
//! [`StructLayout`]: crate::StructLayout

use tracing::debug;

use hostabi_core::{AbiType, CAbiPrimitive, SchemaError, SchemaResult, TypeId, TypeKind};

use crate::SchemaBuildContext;

/// How a kind crosses the ABI boundary.
pub(crate) enum Lowering {
    Direct(CAbiPrimitive),
    Boxed,
    Dictionary,
}

pub(crate) fn lowering(kind: &TypeKind) -> SchemaResult<Lowering> {
    let primitive = match kind {
        TypeKind::Any => CAbiPrimitive::JsValue,
        TypeKind::ByteString | TypeKind::DomString | TypeKind::UsvString => CAbiPrimitive::StringHandle,
        TypeKind::Boolean | TypeKind::StrictBoolean => CAbiPrimitive::Bool,
        TypeKind::F64 => CAbiPrimitive::F64,
        TypeKind::I8 => CAbiPrimitive::I8,
        TypeKind::I16 => CAbiPrimitive::I16,
        TypeKind::I32 => CAbiPrimitive::I32,
        TypeKind::I64 => CAbiPrimitive::I64,
        TypeKind::U8 => CAbiPrimitive::U8,
        TypeKind::U16 => CAbiPrimitive::U16,
        TypeKind::U32 => CAbiPrimitive::U32,
        TypeKind::U64 => CAbiPrimitive::U64,
        TypeKind::Usize => CAbiPrimitive::Usize,
        TypeKind::Undefined => CAbiPrimitive::Void,
        TypeKind::GlobalObject | TypeKind::ZigVirtualMachine => CAbiPrimitive::GlobalObjectPtr,
        TypeKind::StringEnum(literals) => CAbiPrimitive::for_enum_tag(literals.len()),
        TypeKind::Utf8String | TypeKind::Sequence(_) | TypeKind::Record(_) | TypeKind::OneOf(_) => {
            return Ok(Lowering::Boxed);
        }
        TypeKind::Dictionary(_) => return Ok(Lowering::Dictionary),
        TypeKind::ZigEnum { .. } | TypeKind::ExternalClass | TypeKind::Ref(_) => {
            return Err(SchemaError::Unsupported {
                operation: "C-ABI mapping",
                kind: kind.tag(),
            });
        }
    };
    Ok(Lowering::Direct(primitive))
}

impl SchemaBuildContext {
    /// The fixed native representation of a type, or `None` when it must be
    /// passed as a boxed host value.
    ///
    /// For dictionaries this builds, reorders, registers and names the struct
    /// layout, memoized by the dictionary's hash.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn can_directly_map_to_c_abi(&mut self, id: TypeId) -> SchemaResult<Option<AbiType>> {
        match lowering(self.type_node(id).kind())? {
            Lowering::Direct(primitive) => Ok(Some(primitive.into())),
            Lowering::Boxed => Ok(None),
            Lowering::Dictionary => self.map_dictionary(id),
        }
    }

    fn map_dictionary(&mut self, id: TypeId) -> SchemaResult<Option<AbiType>> {
        let TypeKind::Dictionary(fields) = self.type_node(id).kind().clone() else {
            return Ok(None);
        };

        // The type hash ignores field flags, so omittable fields are checked
        // before the memoized struct is consulted.
        let mut mapped = Vec::with_capacity(fields.len());
        for field in fields {
            if self.type_node(field.ty).flags().is_optional_without_default() {
                return Ok(None);
            }
            match self.can_directly_map_to_c_abi(field.ty)? {
                Some(representation) => mapped.push((field.key, representation)),
                None => return Ok(None),
            }
        }

        let hash = self.type_hash(id)?;
        if let Some(existing) = self.struct_for_type_hash(hash) {
            return Ok(Some(AbiType::Struct(existing)));
        }

        let layout = self.new_struct();
        for (key, representation) in mapped {
            self.add_struct_field(layout, key, representation)?;
        }
        self.reorder_struct(layout)?;
        self.register_struct(layout);
        let name = self.type_name(id)?;
        self.assign_struct_name(layout, name);
        self.struct_by_type_hash.insert(hash, layout);

        debug!(
            target: "hostabi::layout",
            ty = %id,
            %layout,
            size = self.struct_layout(layout).abi_info().0,
            "lowered dictionary to struct"
        );
        Ok(Some(AbiType::Struct(layout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostabi_core::DefaultValue;

    #[test]
    fn scalar_table() {
        let mut ctx = SchemaBuildContext::new();
        let cases = [
            (ctx.any(), CAbiPrimitive::JsValue),
            (ctx.dom_string(), CAbiPrimitive::StringHandle),
            (ctx.boolean(), CAbiPrimitive::Bool),
            (ctx.strict_boolean(), CAbiPrimitive::Bool),
            (ctx.f64(), CAbiPrimitive::F64),
            (ctx.usize(), CAbiPrimitive::Usize),
            (ctx.i16(), CAbiPrimitive::I16),
            (ctx.undefined(), CAbiPrimitive::Void),
            (ctx.global_object(), CAbiPrimitive::GlobalObjectPtr),
            (ctx.zig_virtual_machine(), CAbiPrimitive::GlobalObjectPtr),
        ];
        for (id, expected) in cases {
            assert_eq!(ctx.can_directly_map_to_c_abi(id).unwrap(), Some(expected.into()));
        }
    }

    #[test]
    fn string_enum_uses_smallest_tag() {
        let mut ctx = SchemaBuildContext::new();
        let small = ctx.string_enum(["a", "b", "c"]);
        let large = ctx.string_enum((0..300).map(|i| format!("v{i}")));
        assert_eq!(
            ctx.can_directly_map_to_c_abi(small).unwrap(),
            Some(CAbiPrimitive::U8.into())
        );
        assert_eq!(
            ctx.can_directly_map_to_c_abi(large).unwrap(),
            Some(CAbiPrimitive::U16.into())
        );
    }

    #[test]
    fn boxed_kinds_do_not_map() {
        let mut ctx = SchemaBuildContext::new();
        let f = ctx.f64();
        let b = ctx.boolean();
        let boxed = [
            ctx.utf8_string(),
            ctx.sequence(f).unwrap(),
            ctx.record(f).unwrap(),
            ctx.one_of([f, b]).unwrap(),
        ];
        for id in boxed {
            assert_eq!(ctx.can_directly_map_to_c_abi(id).unwrap(), None);
        }
    }

    #[test]
    fn deferred_kinds_fail_loudly() {
        let mut ctx = SchemaBuildContext::new();
        let deferred = [ctx.zig_enum("node/os.zig", "Mode"), ctx.external_class(), ctx.reference("X")];
        for id in deferred {
            assert!(matches!(
                ctx.can_directly_map_to_c_abi(id),
                Err(SchemaError::Unsupported { .. })
            ));
        }
    }

    #[test]
    fn dictionary_lowers_to_struct() {
        let mut ctx = SchemaBuildContext::new();
        let a = ctx.f64();
        let a = ctx.required(a).unwrap();
        let b = ctx.boolean();
        let b = ctx.with_default(b, true.into()).unwrap();
        let d = ctx.dictionary([("a", a), ("b", b)]).unwrap();

        let sid = ctx
            .can_directly_map_to_c_abi(d)
            .unwrap()
            .and_then(AbiType::as_struct)
            .unwrap();
        let layout = ctx.struct_layout(sid);
        assert_eq!(layout.len(), 2);
        assert_eq!(layout.fields()[0].name, "b");
        assert_eq!(layout.abi_info(), (16, 8));

        let hash = ctx.type_hash(d).unwrap();
        assert_eq!(ctx.struct_for_type_hash(hash), Some(sid));
        assert_eq!(ctx.canonical_struct(ctx.struct_hash(sid)), Some(sid));
    }

    #[test]
    fn optional_field_without_default_blocks_mapping() {
        let mut ctx = SchemaBuildContext::new();
        let a = ctx.f64();
        let b = ctx.boolean();
        let c = ctx.u32();
        let c = ctx.optional(c).unwrap();
        let d = ctx.dictionary([("a", a), ("b", b), ("c", c)]).unwrap();
        assert_eq!(ctx.can_directly_map_to_c_abi(d).unwrap(), None);
        assert_eq!(ctx.struct_count(), 0);
    }

    #[test]
    fn boxed_field_blocks_mapping() {
        let mut ctx = SchemaBuildContext::new();
        let f = ctx.f64();
        let seq = ctx.sequence(f).unwrap();
        let d = ctx.dictionary([("items", seq)]).unwrap();
        assert_eq!(ctx.can_directly_map_to_c_abi(d).unwrap(), None);
    }

    #[test]
    fn memoized_by_type_hash() {
        let mut ctx = SchemaBuildContext::new();
        let a = ctx.u8();
        let d1 = ctx.dictionary([("a", a)]).unwrap();
        let d2 = ctx.dictionary([("a", a)]).unwrap();
        let s1 = ctx.can_directly_map_to_c_abi(d1).unwrap();
        let s2 = ctx.can_directly_map_to_c_abi(d2).unwrap();
        assert_eq!(s1, s2);
        assert_eq!(ctx.struct_count(), 1);
    }

    #[test]
    fn memoized_struct_not_reused_for_optional_field() {
        let mut ctx = SchemaBuildContext::new();
        let a = ctx.f64();
        let plain = ctx.dictionary([("a", a)]).unwrap();
        let omittable = ctx.optional(a).unwrap();
        let loose = ctx.dictionary([("a", omittable)]).unwrap();
        assert_eq!(ctx.type_hash(plain).unwrap(), ctx.type_hash(loose).unwrap());

        assert!(ctx.can_directly_map_to_c_abi(plain).unwrap().is_some());
        assert_eq!(ctx.can_directly_map_to_c_abi(loose).unwrap(), None);
    }

    #[test]
    fn optional_field_first_does_not_block_later_mapping() {
        let mut ctx = SchemaBuildContext::new();
        let a = ctx.f64();
        let omittable = ctx.optional(a).unwrap();
        let loose = ctx.dictionary([("a", omittable)]).unwrap();
        let plain = ctx.dictionary([("a", a)]).unwrap();

        assert_eq!(ctx.can_directly_map_to_c_abi(loose).unwrap(), None);
        assert!(ctx.can_directly_map_to_c_abi(plain).unwrap().is_some());
        assert_eq!(ctx.struct_count(), 1);
    }

    #[test]
    fn nested_dictionary_nests_struct() {
        let mut ctx = SchemaBuildContext::new();
        let x = ctx.i32();
        let inner = ctx.dictionary([("x", x)]).unwrap();
        let flag = ctx.boolean();
        let outer = ctx.dictionary([("inner", inner), ("flag", flag)]).unwrap();

        let sid = ctx.can_directly_map_to_c_abi(outer).unwrap().and_then(AbiType::as_struct).unwrap();
        let inner_sid = ctx
            .struct_for_type_hash(ctx.type_hash(inner).unwrap())
            .unwrap();
        let layout = ctx.struct_layout(sid);
        assert_eq!(layout.fields()[0].name, "flag");
        assert_eq!(layout.fields()[1].representation, AbiType::Struct(inner_sid));
    }

    #[test]
    fn struct_takes_dictionary_name() {
        let mut ctx = SchemaBuildContext::new();
        let a = ctx.f64();
        let d = ctx.dictionary([("a", a)]).unwrap();
        ctx.assign_name(d, "Point").unwrap();
        let sid = ctx.can_directly_map_to_c_abi(d).unwrap().and_then(AbiType::as_struct).unwrap();
        assert_eq!(ctx.struct_layout(sid).name(), Some("Point"));
    }

    #[test]
    fn defaulted_dictionary_field_maps() {
        let mut ctx = SchemaBuildContext::new();
        let n = ctx.u32();
        let n = ctx.with_default(n, DefaultValue::Number(4.0)).unwrap();
        let d = ctx.dictionary([("n", n)]).unwrap();
        assert!(ctx.can_directly_map_to_c_abi(d).unwrap().is_some());
    }
}
