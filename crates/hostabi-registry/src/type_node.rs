//! Type nodes: construction, structural hashing, naming and reachability.
//!
//! A [`TypeNode`] is one schema type: its [`TypeKind`] (with data), its
//! modifier [`TypeFlags`], the binding file that declared it and two lazily
//! derived values, the structural hash and the deduplicated display name.
//!
//! # Structural identity
//!
//! The hash covers kind and data only. Two nodes with equal kind and
//! recursively equal data hash identically regardless of their flags or of
//! which node instance is asked, which is what lets structurally identical
//! declarations from different files collapse into one generated artifact.
//!
//! # Naming
//!
//! Names are resolved first-registered-wins against the canonical-type-by-hash
//! registry: once a reachable type owns a name, every structurally identical
//! type shares it.

use std::cell::OnceCell;
use std::fmt::Write as _;

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use hostabi_core::{
    ContentHash, DictionaryField, SchemaError, SchemaResult, TypeFlags, TypeId, TypeKind,
};

use crate::SchemaBuildContext;
use crate::files::DeclaringFile;

/// One schema type.
#[derive(Debug, Clone)]
pub struct TypeNode {
    kind: TypeKind,
    flags: TypeFlags,
    owner_file: Option<String>,
    binding_file: Option<String>,
    hash: OnceCell<ContentHash>,
    name: Option<String>,
    reachable: bool,
}

impl TypeNode {
    pub(crate) fn new(kind: TypeKind, declared_in: Option<&DeclaringFile>) -> Self {
        Self {
            kind,
            flags: TypeFlags::default(),
            owner_file: declared_in.map(|f| f.stem.clone()),
            binding_file: declared_in.map(|f| f.binding_path.clone()),
            hash: OnceCell::new(),
            name: None,
            reachable: false,
        }
    }

    /// A copy sharing kind, data and hash, with new flags and no name.
    pub(crate) fn derive(&self, flags: TypeFlags) -> Self {
        Self {
            kind: self.kind.clone(),
            flags,
            owner_file: self.owner_file.clone(),
            binding_file: self.binding_file.clone(),
            hash: self.hash.clone(),
            name: None,
            reachable: false,
        }
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn flags(&self) -> &TypeFlags {
        &self.flags
    }

    /// Stem of the binding file that constructed this type.
    pub fn owner_file(&self) -> Option<&str> {
        self.owner_file.as_deref()
    }

    /// Path of the binding file that constructed this type.
    pub fn binding_file(&self) -> Option<&str> {
        self.binding_file.as_deref()
    }

    /// The assigned display name, if one has been resolved.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    /// Whether [`SchemaBuildContext::mark_reachable`] has visited this node.
    pub fn is_reachable(&self) -> bool {
        self.reachable
    }

    pub fn is_virtual_argument(&self) -> bool {
        self.kind.is_virtual_argument()
    }

    pub fn lowers_to_struct(&self) -> bool {
        self.kind.lowers_to_struct()
    }

    /// Name synthesized for a canonical type that was never given one.
    fn generated_name(&self, hash: ContentHash) -> String {
        match &self.owner_file {
            Some(stem) => format!("bindgen_{stem}_{hash}"),
            None => format!("bindgen_{hash}"),
        }
    }
}

fn anonymous_name(kind: &TypeKind, hash: ContentHash) -> String {
    format!("anon_{}_{}", kind.tag(), hash)
}

/// Structural hash of a type, memoized on the node.
pub(crate) fn hash_type(types: &[TypeNode], id: TypeId) -> SchemaResult<ContentHash> {
    let node = &types[id.index()];
    if let Some(hash) = node.hash.get() {
        return Ok(*hash);
    }

    let mut repr = format!("{}:", node.kind.tag());
    match &node.kind {
        TypeKind::Ref(_) => {
            return Err(SchemaError::Unsupported {
                operation: "structural hashing",
                kind: node.kind.tag(),
            });
        }
        TypeKind::Sequence(element) => {
            let _ = write!(repr, "{}", hash_type(types, *element)?);
        }
        TypeKind::Record(value) => {
            let _ = write!(repr, "{}", hash_type(types, *value)?);
        }
        TypeKind::ZigEnum { file, symbol } => {
            let _ = write!(repr, "{file}:{symbol}");
        }
        TypeKind::StringEnum(literals) => repr.push_str(&literals.join(",")),
        TypeKind::OneOf(members) => {
            let hashes = members
                .iter()
                .map(|m| hash_type(types, *m).map(|h| h.to_string()))
                .collect::<SchemaResult<Vec<_>>>()?;
            repr.push_str(&hashes.join(","));
        }
        TypeKind::Dictionary(fields) => {
            let parts = fields
                .iter()
                .map(|f| hash_type(types, f.ty).map(|h| format!("{}:{}:{}", f.key, f.required, h)))
                .collect::<SchemaResult<Vec<_>>>()?;
            repr.push_str(&parts.join(","));
        }
        TypeKind::Any
        | TypeKind::ByteString
        | TypeKind::DomString
        | TypeKind::UsvString
        | TypeKind::Utf8String
        | TypeKind::Boolean
        | TypeKind::StrictBoolean
        | TypeKind::F64
        | TypeKind::I8
        | TypeKind::I16
        | TypeKind::I32
        | TypeKind::I64
        | TypeKind::U8
        | TypeKind::U16
        | TypeKind::U32
        | TypeKind::U64
        | TypeKind::Usize
        | TypeKind::Undefined
        | TypeKind::GlobalObject
        | TypeKind::ZigVirtualMachine
        | TypeKind::ExternalClass => {}
    }

    let hash = ContentHash::of_str(&repr);
    trace!(target: "hostabi::types", %repr, %hash, "hashed type");
    Ok(*node.hash.get_or_init(|| hash))
}

macro_rules! scalar_constructors {
    ($($(#[$meta:meta])* $method:ident => $kind:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            pub fn $method(&mut self) -> TypeId {
                self.new_type(TypeKind::$kind)
            }
        )*
    };
}

impl SchemaBuildContext {
    pub(crate) fn new_type(&mut self, kind: TypeKind) -> TypeId {
        let node = TypeNode::new(kind, self.current_file.as_ref());
        self.alloc_type(node)
    }

    // ==========================================================================
    // Constructors
    // ==========================================================================

    scalar_constructors! {
        any => Any,
        byte_string => ByteString,
        dom_string => DomString,
        usv_string => UsvString,
        utf8_string => Utf8String,
        boolean => Boolean,
        strict_boolean => StrictBoolean,
        f64 => F64,
        i8 => I8,
        i16 => I16,
        i32 => I32,
        i64 => I64,
        u8 => U8,
        u16 => U16,
        u32 => U32,
        u64 => U64,
        usize => Usize,
        undefined => Undefined,
        /// The calling engine's global object. Only valid as a function argument.
        global_object => GlobalObject,
        /// The native VM handle. Only valid as a function argument.
        zig_virtual_machine => ZigVirtualMachine,
        /// Placeholder for an external class; most operations reject it.
        external_class => ExternalClass,
    }

    /// Placeholder reference to a named type; most operations reject it.
    pub fn reference(&mut self, name: impl Into<String>) -> TypeId {
        self.new_type(TypeKind::Ref(name.into()))
    }

    /// Closed list of string literals.
    pub fn string_enum<S: Into<String>>(&mut self, literals: impl IntoIterator<Item = S>) -> TypeId {
        let literals = literals.into_iter().map(Into::into).collect();
        self.new_type(TypeKind::StringEnum(literals))
    }

    /// Native enum declared in `file` as `symbol`.
    pub fn zig_enum(&mut self, file: impl Into<String>, symbol: impl Into<String>) -> TypeId {
        self.new_type(TypeKind::ZigEnum {
            file: file.into(),
            symbol: symbol.into(),
        })
    }

    /// Homogeneous sequence of `element`.
    pub fn sequence(&mut self, element: TypeId) -> SchemaResult<TypeId> {
        let checked = self.reject_virtual(element, "a sequence element");
        self.attribute(checked)?;
        Ok(self.new_type(TypeKind::Sequence(element)))
    }

    /// String-keyed map to `value`.
    pub fn record(&mut self, value: TypeId) -> SchemaResult<TypeId> {
        let checked = self.reject_virtual(value, "a record value");
        self.attribute(checked)?;
        Ok(self.new_type(TypeKind::Record(value)))
    }

    /// Tagged union of `members`. Nested unions are flattened.
    pub fn one_of(&mut self, members: impl IntoIterator<Item = TypeId>) -> SchemaResult<TypeId> {
        let flattened = self.flatten_union(members);
        let flattened = self.attribute(flattened)?;
        Ok(self.new_type(TypeKind::OneOf(flattened)))
    }

    fn flatten_union(&self, members: impl IntoIterator<Item = TypeId>) -> SchemaResult<Vec<TypeId>> {
        let mut out = Vec::new();
        for member in members {
            let node = self.type_node(member);
            if let TypeKind::OneOf(nested) = node.kind() {
                out.extend(nested.iter().copied());
                continue;
            }
            if node.flags().has_default() {
                return Err(SchemaError::UnionMemberDefault {
                    kind: node.kind().tag(),
                });
            }
            self.reject_virtual(member, "a oneOf member")?;
            out.push(member);
        }
        Ok(out)
    }

    /// Dictionary with fields in the given order.
    pub fn dictionary<K: Into<String>>(
        &mut self,
        fields: impl IntoIterator<Item = (K, TypeId)>,
    ) -> SchemaResult<TypeId> {
        let built = self.dictionary_fields(fields);
        let built = self.attribute(built)?;
        Ok(self.new_type(TypeKind::Dictionary(built)))
    }

    fn dictionary_fields<K: Into<String>>(
        &self,
        fields: impl IntoIterator<Item = (K, TypeId)>,
    ) -> SchemaResult<Vec<DictionaryField>> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        for (key, ty) in fields {
            let key = key.into();
            self.reject_virtual(ty, &format!("dictionary field '{key}'"))?;
            if !seen.insert(key.clone()) {
                return Err(SchemaError::DuplicateField { key });
            }
            let required = self.type_node(ty).flags().is_required();
            out.push(DictionaryField::new(key, ty, required));
        }
        Ok(out)
    }

    pub(crate) fn reject_virtual(&self, id: TypeId, position: &str) -> SchemaResult<()> {
        let node = self.type_node(id);
        if node.is_virtual_argument() {
            return Err(SchemaError::VirtualArgumentMisuse {
                kind: node.kind().tag(),
                position: position.to_string(),
            });
        }
        Ok(())
    }

    // ==========================================================================
    // Hashing and naming
    // ==========================================================================

    /// Structural hash of a type's kind and data.
    pub fn type_hash(&self, id: TypeId) -> SchemaResult<ContentHash> {
        hash_type(&self.types, id)
    }

    /// Resolve the display name of a type.
    ///
    /// Reuses the canonical type's name when a structurally identical type is
    /// registered (generating `bindgen_<file>_<hash>` for it if it has none),
    /// otherwise falls back to `anon_<kind>_<hash>`.
    pub fn type_name(&mut self, id: TypeId) -> SchemaResult<String> {
        if let Some(name) = self.type_node(id).name() {
            return Ok(name.to_string());
        }
        let hash = self.type_hash(id)?;
        let name = match self.canonical_type(hash) {
            Some(canonical) => {
                let node = self.type_node_mut(canonical);
                match node.name() {
                    Some(name) => name.to_string(),
                    None => {
                        let generated = node.generated_name(hash);
                        node.set_name(generated.clone());
                        generated
                    }
                }
            }
            None => anonymous_name(self.type_node(id).kind(), hash),
        };
        trace!(target: "hostabi::types", %id, %name, "resolved type name");
        self.type_node_mut(id).set_name(name.clone());
        Ok(name)
    }

    /// Force a display name, used when a type is the value of a named
    /// declaration.
    ///
    /// No-op if the type already has a name. If a canonical type with the
    /// same hash exists, its name wins (and it adopts `name` if it had none).
    pub fn assign_name(&mut self, id: TypeId, name: impl Into<String>) -> SchemaResult<()> {
        if self.type_node(id).name().is_some() {
            return Ok(());
        }
        let hash = self.attribute(self.type_hash(id))?;
        let mut name = name.into();
        if let Some(canonical) = self.canonical_type(hash) {
            let node = self.type_node_mut(canonical);
            match node.name() {
                Some(existing) => name = existing.to_string(),
                None => node.set_name(name.clone()),
            }
        }
        self.type_node_mut(id).set_name(name);
        Ok(())
    }

    /// Mark a type and everything it contains as reachable.
    ///
    /// Only struct-lowering kinds participate. The first reachable node for a
    /// hash becomes canonical; every visited node gets a name. Each node is
    /// walked at most once, so shared sub-types cost nothing extra.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn mark_reachable(&mut self, id: TypeId) -> SchemaResult<()> {
        let node = self.type_node(id);
        if !node.lowers_to_struct() || node.reachable {
            return Ok(());
        }
        let hash = self.type_hash(id)?;
        let existing = self.canonical_type(hash);

        if self.type_node(id).name().is_none() {
            let name = match existing {
                Some(canonical) => self.type_name(canonical)?,
                None => anonymous_name(self.type_node(id).kind(), hash),
            };
            self.type_node_mut(id).set_name(name);
        }
        self.type_node_mut(id).reachable = true;
        if existing.is_none() {
            self.reachable_types.insert_if_absent(hash, id);
            debug!(
                target: "hostabi::reachability",
                %id,
                %hash,
                name = self.type_node(id).name().unwrap_or_default(),
                "registered canonical type"
            );
        }

        for child in self.type_node(id).kind().constituents() {
            self.mark_reachable(child)?;
        }
        Ok(())
    }
}
