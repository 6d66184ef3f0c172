//! Declarations and the finishing pass.
//!
//! [`SchemaBuildContext::finish`] runs once after every binding file has been
//! loaded. It walks files in first-declaration order, derives each module's
//! namespace, marks every signature type reachable and resolves the C-ABI
//! struct of every reachable dictionary. The result is a [`SchemaRegistry`]: the
//! same state, frozen behind shared references.

use std::ops::Deref;

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use hostabi_core::{AbiType, ContentHash, SchemaError, SchemaResult, StructId, TypeId, TypeKind};

use crate::SchemaBuildContext;
use crate::c_abi::{Lowering, lowering};
use crate::files::TypeDef;

impl SchemaBuildContext {
    /// Declare `ty` as the value of the top-level declaration `name`.
    ///
    /// The type takes `name` (unless a structurally identical type already
    /// owns one), becomes reachable and is recorded on the current file.
    pub fn declare_type(&mut self, name: impl Into<String>, ty: TypeId) -> SchemaResult<()> {
        let file = self.require_file()?;
        let name = name.into();
        let declared = self.name_and_mark(&name, ty);
        self.attribute(declared)?;
        debug!(target: "hostabi::reachability", %name, %ty, module = %file.native_module, "declared type");
        self.file_entry(&file).typedefs.push(TypeDef { name, ty });
        Ok(())
    }

    fn name_and_mark(&mut self, name: &str, ty: TypeId) -> SchemaResult<()> {
        self.assign_name(ty, name)?;
        self.mark_reachable(ty)
    }

    /// Run the finishing pass and freeze the registries.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn finish(mut self) -> SchemaResult<SchemaRegistry> {
        self.current_file = None;

        let mut modules_by_namespace: FxHashMap<String, String> = FxHashMap::default();
        for index in 0..self.files.len() {
            let file = &self.files[index];
            if file.functions.is_empty() {
                continue;
            }
            let namespace = file.namespace().to_string();
            let module = file.native_module.clone();
            let binding = file.binding_path.clone();
            let typedefs: Vec<TypeId> = file.typedefs.iter().map(|td| td.ty).collect();
            let signature_types: Vec<TypeId> = file
                .functions
                .iter()
                .flat_map(|&id| &self.functions[id.index()].variants)
                .flat_map(|variant| variant.args.iter().map(|arg| arg.ty).chain([variant.ret]))
                .collect();

            if let Some(first) = modules_by_namespace.get(&namespace) {
                return Err(SchemaError::FileNameCollision {
                    namespace,
                    first: first.clone(),
                    second: module,
                });
            }
            modules_by_namespace.insert(namespace.clone(), module);

            for ty in typedefs {
                let hash = self.type_hash(ty).map_err(|e| e.in_file(&binding))?;
                self.set_namespace(hash, namespace.clone());
            }
            for ty in signature_types {
                self.mark_reachable(ty).map_err(|e| e.in_file(&binding))?;
            }
        }

        let dictionaries: Vec<TypeId> = self
            .reachable_types()
            .map(|(_, id)| id)
            .filter(|&id| matches!(self.type_node(id).kind(), TypeKind::Dictionary(_)))
            .collect();
        for id in dictionaries {
            if let Err(err) = self.can_directly_map_to_c_abi(id) {
                return Err(match self.type_node(id).binding_file() {
                    Some(file) => err.in_file(file),
                    None => err,
                });
            }
        }

        let lowered: Vec<(ContentHash, StructId)> = self
            .reachable_types()
            .filter_map(|(hash, _)| self.struct_for_type_hash(hash).map(|sid| (hash, sid)))
            .collect();
        for (hash, sid) in lowered {
            if let Some(namespace) = self.namespace_for(hash).map(str::to_string) {
                let layout = self.struct_layout_mut(sid);
                if layout.namespace().is_none() {
                    layout.set_namespace(namespace);
                }
            }
        }
        let canonical: Vec<StructId> = self.canonical_structs().map(|(_, sid)| sid).collect();
        for sid in canonical {
            self.struct_name(sid);
        }

        info!(
            target: "hostabi::reachability",
            files = modules_by_namespace.len(),
            functions = self.function_count(),
            reachable = self.reachable_types.len(),
            structs = self.structs_by_hash.len(),
            "schema finished"
        );
        Ok(SchemaRegistry { ctx: self })
    }
}

/// The frozen result of a schema-loading pass.
///
/// Dereferences to the read-only surface of [`SchemaBuildContext`]: the four
/// registries, files, functions, type nodes and struct layouts.
#[derive(Debug)]
pub struct SchemaRegistry {
    ctx: SchemaBuildContext,
}

impl Deref for SchemaRegistry {
    type Target = SchemaBuildContext;

    fn deref(&self) -> &Self::Target {
        &self.ctx
    }
}

impl SchemaRegistry {
    /// The resolved native representation of a type.
    ///
    /// Dictionaries report the struct resolved during [`finish`](SchemaBuildContext::finish),
    /// or `None` when they are boxed or were never reachable.
    pub fn abi_type(&self, id: TypeId) -> SchemaResult<Option<AbiType>> {
        match lowering(self.type_node(id).kind())? {
            Lowering::Direct(primitive) => Ok(Some(primitive.into())),
            Lowering::Boxed => Ok(None),
            Lowering::Dictionary => {
                let hash = self.type_hash(id)?;
                Ok(self.struct_for_type_hash(hash).map(AbiType::Struct))
            }
        }
    }

    /// The generated identifier of a named type, `namespace.Name` when a
    /// namespace is registered for its hash.
    pub fn qualified_name(&self, id: TypeId) -> SchemaResult<Option<String>> {
        let Some(name) = self.type_node(id).name() else {
            return Ok(None);
        };
        let hash = self.type_hash(id)?;
        Ok(Some(match self.namespace_for(hash) {
            Some(namespace) => format!("{namespace}.{name}"),
            None => name.to_string(),
        }))
    }

    /// Give back the underlying context.
    pub fn into_inner(self) -> SchemaBuildContext {
        self.ctx
    }
}
