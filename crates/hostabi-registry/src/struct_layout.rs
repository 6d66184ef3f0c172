//! C-ABI struct layouts.
//!
//! A [`StructLayout`] is an ordered field list with per-field size and natural
//! alignment. Offsets, total size and alignment follow purely from the current
//! field order, so reordering must happen before the layout is hashed. After
//! hashing the order is frozen.
//!
//! ```text
//! fields added: x: f64 (8/8), flag: bool (1/1), n: u32 (4/4)
//! ascending:    flag @0, n @4, x @8      -> size 16, align 8
//! ```

use std::cell::OnceCell;
use std::cmp::Reverse;
use std::fmt;

use tracing::{debug, trace};

use hostabi_core::{
    AbiType, ContentHash, FieldOrder, SchemaError, SchemaResult, StructId, align_forward,
};

use crate::SchemaBuildContext;

/// One field of a struct layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    pub name: String,
    pub representation: AbiType,
    pub size: u32,
    pub natural_alignment: u32,
}

/// A finalized C-ABI compatible field layout.
#[derive(Debug, Clone, Default)]
pub struct StructLayout {
    fields: Vec<StructField>,
    hash: OnceCell<ContentHash>,
    name: Option<String>,
    namespace: Option<String>,
}

impl StructLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &[StructField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The struct hash, if it has been computed.
    pub fn hash(&self) -> Option<ContentHash> {
        self.hash.get().copied()
    }

    pub fn is_frozen(&self) -> bool {
        self.hash.get().is_some()
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    pub(crate) fn set_namespace(&mut self, namespace: String) {
        self.namespace = Some(namespace);
    }

    pub(crate) fn push_field(&mut self, field: StructField) -> SchemaResult<()> {
        self.ensure_unfrozen()?;
        self.fields.push(field);
        Ok(())
    }

    fn ensure_unfrozen(&self) -> SchemaResult<()> {
        match self.hash.get() {
            Some(hash) => Err(SchemaError::LayoutFrozen {
                hash: hash.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// `(size, alignment)` from sequential, alignment-respecting placement.
    ///
    /// The size is not rounded up to the alignment; see [`stride`](Self::stride).
    pub fn abi_info(&self) -> (u32, u32) {
        let mut size = 0;
        let mut align = 0;
        for field in &self.fields {
            size = align_forward(size, field.natural_alignment);
            size += field.size;
            align = align.max(field.natural_alignment);
        }
        (size, align)
    }

    /// Size rounded up to the alignment: the distance between array elements.
    pub fn stride(&self) -> u32 {
        let (size, align) = self.abi_info();
        align_forward(size, align)
    }

    /// Byte offset of every field, in field order.
    pub fn field_offsets(&self) -> Vec<u32> {
        let mut offset = 0;
        self.fields
            .iter()
            .map(|field| {
                offset = align_forward(offset, field.natural_alignment);
                let at = offset;
                offset += field.size;
                at
            })
            .collect()
    }

    /// Sort fields by `(alignment, size, name)` in the given direction.
    ///
    /// Names always break ties ascending.
    pub fn reorder_for_smallest_size(&mut self, order: FieldOrder) -> SchemaResult<()> {
        self.ensure_unfrozen()?;
        match order {
            FieldOrder::AscendingAlignment => self
                .fields
                .sort_by(|a, b| {
                    (a.natural_alignment, a.size, &a.name).cmp(&(b.natural_alignment, b.size, &b.name))
                }),
            FieldOrder::DescendingAlignment => self.fields.sort_by(|a, b| {
                (Reverse(a.natural_alignment), Reverse(a.size), &a.name).cmp(&(
                    Reverse(b.natural_alignment),
                    Reverse(b.size),
                    &b.name,
                ))
            }),
        }
        Ok(())
    }
}

impl fmt::Display for StructLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match (&self.name, self.hash.get()) {
            (Some(name), _) => name.clone(),
            (None, Some(hash)) => anonymous_struct_name(*hash),
            (None, None) => "anon_extern_struct".to_string(),
        };
        match &self.namespace {
            Some(namespace) => write!(f, "{namespace}.{name}"),
            None => write!(f, "{name}"),
        }
    }
}

fn anonymous_struct_name(hash: ContentHash) -> String {
    format!("anon_extern_struct_{hash}")
}

/// Struct hash over `name:representation` per field, recursing into nested
/// structs.
pub(crate) fn hash_struct(structs: &[StructLayout], id: StructId) -> ContentHash {
    let layout = &structs[id.index()];
    if let Some(hash) = layout.hash.get() {
        return *hash;
    }
    let repr = layout
        .fields
        .iter()
        .map(|field| match field.representation {
            AbiType::Primitive(primitive) => format!("{}:{}", field.name, primitive.as_str()),
            AbiType::Struct(nested) => format!("{}:{}", field.name, hash_struct(structs, nested)),
        })
        .collect::<Vec<_>>()
        .join(",");
    let hash = ContentHash::of_str(&repr);
    trace!(target: "hostabi::layout", %repr, %hash, "hashed struct");
    *layout.hash.get_or_init(|| hash)
}

impl SchemaBuildContext {
    /// Allocate an empty struct layout.
    pub fn new_struct(&mut self) -> StructId {
        self.alloc_struct(StructLayout::new())
    }

    /// `(size, alignment)` of a representation.
    ///
    /// Nested structs report their unpadded size, not their stride.
    pub fn representation_info(&self, representation: AbiType) -> Option<(u32, u32)> {
        match representation {
            AbiType::Primitive(primitive) => Some(primitive.size_align()),
            AbiType::Struct(nested) => self.structs.get(nested.index()).map(StructLayout::abi_info),
        }
    }

    /// Append a field, looking up its size and alignment.
    pub fn add_struct_field(
        &mut self,
        id: StructId,
        name: impl Into<String>,
        representation: AbiType,
    ) -> SchemaResult<()> {
        let name = name.into();
        let Some((size, natural_alignment)) = self.representation_info(representation) else {
            return Err(SchemaError::UnknownRepresentation { field: name });
        };
        self.struct_layout_mut(id).push_field(StructField {
            name,
            representation,
            size,
            natural_alignment,
        })
    }

    /// Reorder a struct's fields using the configured [`FieldOrder`].
    pub fn reorder_struct(&mut self, id: StructId) -> SchemaResult<()> {
        let order = self.options.field_order;
        self.struct_layout_mut(id).reorder_for_smallest_size(order)
    }

    /// Struct hash, memoized. Freezes the field order.
    pub fn struct_hash(&self, id: StructId) -> ContentHash {
        hash_struct(&self.structs, id)
    }

    /// Resolve a struct's display name.
    ///
    /// Reuses the name of a different canonical struct with the same hash,
    /// otherwise `anon_extern_struct_<hash>`.
    pub fn struct_name(&mut self, id: StructId) -> String {
        if let Some(name) = self.struct_layout(id).name() {
            return name.to_string();
        }
        let hash = self.struct_hash(id);
        let name = match self.canonical_struct(hash) {
            Some(canonical) if canonical != id => self.struct_name(canonical),
            _ => anonymous_struct_name(hash),
        };
        self.struct_layout_mut(id).set_name(name.clone());
        name
    }

    /// Force a struct's name. First registered wins, as for types.
    pub fn assign_struct_name(&mut self, id: StructId, name: impl Into<String>) {
        if self.struct_layout(id).name().is_some() {
            return;
        }
        let hash = self.struct_hash(id);
        let mut name = name.into();
        if let Some(canonical) = self.canonical_struct(hash) {
            let layout = self.struct_layout_mut(canonical);
            match layout.name() {
                Some(existing) => name = existing.to_string(),
                None => layout.set_name(name.clone()),
            }
        }
        debug!(target: "hostabi::layout", %id, %name, "named struct");
        self.struct_layout_mut(id).set_name(name);
    }

    /// Register a struct as canonical for its hash unless one exists.
    pub(crate) fn register_struct(&mut self, id: StructId) -> StructId {
        let hash = self.struct_hash(id);
        if self.structs_by_hash.insert_if_absent(hash, id) {
            debug!(target: "hostabi::layout", %id, %hash, "registered canonical struct");
            id
        } else {
            self.canonical_struct(hash).unwrap_or(id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostabi_core::{BuildOptions, CAbiPrimitive};

    fn build(ctx: &mut SchemaBuildContext, fields: &[(&str, CAbiPrimitive)]) -> StructId {
        let id = ctx.new_struct();
        for (name, primitive) in fields {
            ctx.add_struct_field(id, *name, (*primitive).into()).unwrap();
        }
        id
    }

    fn names(layout: &StructLayout) -> Vec<&str> {
        layout.fields().iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn abi_info_follows_field_order() {
        let mut ctx = SchemaBuildContext::new();
        let id = build(
            &mut ctx,
            &[("x", CAbiPrimitive::F64), ("flag", CAbiPrimitive::Bool), ("n", CAbiPrimitive::U32)],
        );
        let layout = ctx.struct_layout(id);
        assert_eq!(layout.abi_info(), (16, 8));
        assert_eq!(layout.field_offsets(), vec![0, 8, 12]);
        assert_eq!(layout.stride(), 16);
    }

    #[test]
    fn ascending_reorder() {
        let mut ctx = SchemaBuildContext::new();
        let id = build(
            &mut ctx,
            &[("x", CAbiPrimitive::F64), ("flag", CAbiPrimitive::Bool), ("n", CAbiPrimitive::U32)],
        );
        ctx.reorder_struct(id).unwrap();
        let layout = ctx.struct_layout(id);
        assert_eq!(names(layout), vec!["flag", "n", "x"]);
        assert_eq!(layout.field_offsets(), vec![0, 4, 8]);
        assert_eq!(layout.abi_info(), (16, 8));
    }

    #[test]
    fn ties_broken_by_size_then_name() {
        let mut ctx = SchemaBuildContext::new();
        let id = build(
            &mut ctx,
            &[
                ("s", CAbiPrimitive::StringHandle),
                ("b", CAbiPrimitive::U64),
                ("a", CAbiPrimitive::F64),
            ],
        );
        ctx.reorder_struct(id).unwrap();
        assert_eq!(names(ctx.struct_layout(id)), vec!["a", "b", "s"]);
    }

    #[test]
    fn descending_reorder_packs_tighter() {
        let options = BuildOptions::default().with_field_order(FieldOrder::DescendingAlignment);
        let mut ctx = SchemaBuildContext::with_options(options);
        let id = build(
            &mut ctx,
            &[("a", CAbiPrimitive::Bool), ("b", CAbiPrimitive::F64), ("c", CAbiPrimitive::U16)],
        );
        ctx.reorder_struct(id).unwrap();
        let layout = ctx.struct_layout(id);
        assert_eq!(names(layout), vec!["b", "c", "a"]);
        assert_eq!(layout.abi_info(), (11, 8));
        assert_eq!(layout.stride(), 16);
    }

    #[test]
    fn zero_sized_fields_take_no_space() {
        let mut ctx = SchemaBuildContext::new();
        let id = build(&mut ctx, &[("a", CAbiPrimitive::U8), ("v", CAbiPrimitive::Void), ("b", CAbiPrimitive::U8)]);
        let layout = ctx.struct_layout(id);
        assert_eq!(layout.field_offsets(), vec![0, 1, 1]);
        assert_eq!(layout.abi_info(), (2, 1));
    }

    #[test]
    fn hash_depends_on_order() {
        let mut ctx = SchemaBuildContext::new();
        let a = build(&mut ctx, &[("x", CAbiPrimitive::U8), ("y", CAbiPrimitive::U32)]);
        let b = build(&mut ctx, &[("y", CAbiPrimitive::U32), ("x", CAbiPrimitive::U8)]);
        let c = build(&mut ctx, &[("x", CAbiPrimitive::U8), ("y", CAbiPrimitive::U32)]);
        assert_ne!(ctx.struct_hash(a), ctx.struct_hash(b));
        assert_eq!(ctx.struct_hash(a), ctx.struct_hash(c));
    }

    #[test]
    fn nested_struct_field() {
        let mut ctx = SchemaBuildContext::new();
        let inner = build(&mut ctx, &[("x", CAbiPrimitive::U32), ("y", CAbiPrimitive::U8)]);
        let outer = ctx.new_struct();
        ctx.add_struct_field(outer, "flag", CAbiPrimitive::Bool.into()).unwrap();
        ctx.add_struct_field(outer, "inner", AbiType::Struct(inner)).unwrap();
        let layout = ctx.struct_layout(outer);
        assert_eq!(layout.fields()[1].size, 5);
        assert_eq!(layout.fields()[1].natural_alignment, 4);
        assert_eq!(layout.abi_info(), (9, 4));

        let inner_hash = ctx.struct_hash(inner);
        let expected = ContentHash::of_str(&format!("flag:bool,inner:{inner_hash}"));
        assert_eq!(ctx.struct_hash(outer), expected);
    }

    #[test]
    fn unknown_representation() {
        let mut ctx = SchemaBuildContext::new();
        let id = ctx.new_struct();
        let err = ctx
            .add_struct_field(id, "ghost", AbiType::Struct(StructId::new(99)))
            .unwrap_err();
        assert_eq!(err, SchemaError::UnknownRepresentation { field: "ghost".into() });
    }

    #[test]
    fn hashed_layout_is_frozen() {
        let mut ctx = SchemaBuildContext::new();
        let id = build(&mut ctx, &[("x", CAbiPrimitive::U8)]);
        ctx.struct_hash(id);
        assert!(ctx.struct_layout(id).is_frozen());
        assert!(matches!(ctx.reorder_struct(id), Err(SchemaError::LayoutFrozen { .. })));
        assert!(ctx.add_struct_field(id, "y", CAbiPrimitive::U8.into()).is_err());
    }

    #[test]
    fn struct_names_first_wins() {
        let mut ctx = SchemaBuildContext::new();
        let a = build(&mut ctx, &[("x", CAbiPrimitive::U8)]);
        let b = build(&mut ctx, &[("x", CAbiPrimitive::U8)]);
        assert_eq!(ctx.register_struct(a), a);
        assert_eq!(ctx.register_struct(b), a);

        ctx.assign_struct_name(a, "Point");
        ctx.assign_struct_name(b, "Other");
        assert_eq!(ctx.struct_name(b), "Point");
    }

    #[test]
    fn anonymous_struct_name_and_display() {
        let mut ctx = SchemaBuildContext::new();
        let a = build(&mut ctx, &[("x", CAbiPrimitive::U8)]);
        let hash = ctx.struct_hash(a);
        assert_eq!(ctx.struct_name(a), format!("anon_extern_struct_{hash}"));

        ctx.struct_layout_mut(a).set_namespace("os".into());
        assert_eq!(
            ctx.struct_layout(a).to_string(),
            format!("os.anon_extern_struct_{hash}")
        );
    }
}
