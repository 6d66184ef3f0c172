//! SchemaBuildContext - the state of one schema-loading pass.
//!
//! This module provides [`SchemaBuildContext`], which owns every type node,
//! struct layout and function descriptor created while binding declaration
//! files are loaded, together with the registries that make canonicalization
//! possible:
//!
//! - **canonical-type-by-hash**: first reachable type node per structural hash
//! - **canonical-struct-by-hash**: first struct layout per struct hash
//! - **struct-by-type-hash**: memoized layout for a dictionary type's hash
//! - **namespace-by-type-hash**: optional name prefix per type hash
//! - **files**: per-native-module function and declaration lists
//!
//! # Lifecycle
//!
//! The context is append-only while files are loaded. [`SchemaBuildContext::finish`]
//! consumes it and returns the read-only [`SchemaRegistry`](crate::SchemaRegistry)
//! consumed by the emission driver.
//!
//! # Thread Safety
//!
//! The context is **not thread-safe**. Schema loading is one synchronous pass;
//! determinism relies on files being loaded in a stable order.

use std::path::Path;

use rustc_hash::FxHashMap;
use tracing::debug;

use hostabi_core::{BuildOptions, ContentHash, FunctionId, SchemaError, SchemaResult, StructId, TypeId};

use crate::canonical::CanonicalMap;
use crate::files::{BindingFile, DeclaringFile};
use crate::functions::FunctionDescriptor;
use crate::struct_layout::StructLayout;
use crate::type_node::TypeNode;

/// Mutable state of a schema-loading pass.
#[derive(Debug, Default)]
pub struct SchemaBuildContext {
    pub(crate) options: BuildOptions,

    pub(crate) types: Vec<TypeNode>,
    pub(crate) structs: Vec<StructLayout>,
    pub(crate) functions: Vec<FunctionDescriptor>,

    pub(crate) reachable_types: CanonicalMap<TypeId>,
    pub(crate) structs_by_hash: CanonicalMap<StructId>,
    pub(crate) struct_by_type_hash: FxHashMap<ContentHash, StructId>,
    pub(crate) namespace_by_type_hash: FxHashMap<ContentHash, String>,

    /// Files in first-declaration order.
    pub(crate) files: Vec<BindingFile>,
    /// Native module path -> index into `files`.
    pub(crate) file_index: FxHashMap<String, usize>,

    pub(crate) current_file: Option<DeclaringFile>,
}

impl SchemaBuildContext {
    /// Create a context with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with the given options.
    pub fn with_options(options: BuildOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    // ==========================================================================
    // Declaring files
    // ==========================================================================

    /// Start declaring from a binding file.
    ///
    /// Types constructed afterwards record the file's stem, and functions and
    /// declarations are attributed to its native module.
    pub fn begin_file(&mut self, path: impl AsRef<Path>) -> SchemaResult<&DeclaringFile> {
        let file = DeclaringFile::resolve(path, &self.options)?;
        debug!(
            target: "hostabi::files",
            binding = %file.binding_path,
            module = %file.native_module,
            "begin binding file"
        );
        let file = self.current_file.insert(file);
        Ok(&*file)
    }

    /// Stop attributing declarations to the current binding file.
    pub fn end_file(&mut self) {
        self.current_file = None;
    }

    pub fn current_file(&self) -> Option<&DeclaringFile> {
        self.current_file.as_ref()
    }

    /// The current declaring file, or `NoDeclaringFile`.
    pub(crate) fn require_file(&self) -> SchemaResult<DeclaringFile> {
        self.current_file.clone().ok_or(SchemaError::NoDeclaringFile)
    }

    /// Attribute an error to the current binding file.
    pub(crate) fn attribute<T>(&self, result: SchemaResult<T>) -> SchemaResult<T> {
        match (&self.current_file, result) {
            (Some(file), Err(err)) => Err(err.in_file(file.binding_path.clone())),
            (_, result) => result,
        }
    }

    /// The file entry for a native module, created on first use.
    pub(crate) fn file_entry(&mut self, file: &DeclaringFile) -> &mut BindingFile {
        let index = match self.file_index.get(&file.native_module) {
            Some(&index) => index,
            None => {
                let index = self.files.len();
                self.files
                    .push(BindingFile::new(&file.native_module, &file.binding_path));
                self.file_index.insert(file.native_module.clone(), index);
                index
            }
        };
        &mut self.files[index]
    }

    /// Files in first-declaration order.
    pub fn files(&self) -> impl Iterator<Item = &BindingFile> + '_ {
        self.files.iter()
    }

    /// Look up a file by native module path.
    pub fn file(&self, native_module: &str) -> Option<&BindingFile> {
        self.file_index.get(native_module).map(|&i| &self.files[i])
    }

    // ==========================================================================
    // Arenas
    // ==========================================================================

    pub(crate) fn alloc_type(&mut self, node: TypeNode) -> TypeId {
        let id = TypeId::new(self.types.len() as u32);
        self.types.push(node);
        id
    }

    pub(crate) fn alloc_struct(&mut self, layout: StructLayout) -> StructId {
        let id = StructId::new(self.structs.len() as u32);
        self.structs.push(layout);
        id
    }

    pub(crate) fn alloc_function(&mut self, descriptor: FunctionDescriptor) -> FunctionId {
        let id = FunctionId::new(self.functions.len() as u32);
        self.functions.push(descriptor);
        id
    }

    /// Get a type node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not created by this context.
    pub fn type_node(&self, id: TypeId) -> &TypeNode {
        &self.types[id.index()]
    }

    pub(crate) fn type_node_mut(&mut self, id: TypeId) -> &mut TypeNode {
        &mut self.types[id.index()]
    }

    /// Get a struct layout.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not created by this context.
    pub fn struct_layout(&self, id: StructId) -> &StructLayout {
        &self.structs[id.index()]
    }

    pub(crate) fn struct_layout_mut(&mut self, id: StructId) -> &mut StructLayout {
        &mut self.structs[id.index()]
    }

    /// Get a function descriptor.
    pub fn function(&self, id: FunctionId) -> &FunctionDescriptor {
        &self.functions[id.index()]
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn struct_count(&self) -> usize {
        self.structs.len()
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    // ==========================================================================
    // Registries
    // ==========================================================================

    /// The canonical reachable type registered for a hash.
    pub fn canonical_type(&self, hash: ContentHash) -> Option<TypeId> {
        self.reachable_types.get(&hash).copied()
    }

    /// The canonical struct registered for a struct hash.
    pub fn canonical_struct(&self, hash: ContentHash) -> Option<StructId> {
        self.structs_by_hash.get(&hash).copied()
    }

    /// The memoized struct for a dictionary type hash.
    pub fn struct_for_type_hash(&self, hash: ContentHash) -> Option<StructId> {
        self.struct_by_type_hash.get(&hash).copied()
    }

    /// The namespace override registered for a type hash.
    pub fn namespace_for(&self, hash: ContentHash) -> Option<&str> {
        self.namespace_by_type_hash.get(&hash).map(String::as_str)
    }

    /// Register a namespace prefix for a type hash. The first registration wins.
    pub fn set_namespace(&mut self, hash: ContentHash, namespace: impl Into<String>) {
        self.namespace_by_type_hash
            .entry(hash)
            .or_insert_with(|| namespace.into());
    }

    /// Reachable canonical types in registration order.
    pub fn reachable_types(&self) -> impl Iterator<Item = (ContentHash, TypeId)> + '_ {
        self.reachable_types.iter().map(|(hash, id)| (hash, *id))
    }

    /// Canonical structs in registration order.
    pub fn canonical_structs(&self) -> impl Iterator<Item = (ContentHash, StructId)> + '_ {
        self.structs_by_hash.iter().map(|(hash, id)| (hash, *id))
    }

    /// Human-readable description of a type for error messages.
    pub(crate) fn describe(&self, id: TypeId) -> String {
        let node = self.type_node(id);
        match node.name() {
            Some(name) => format!("{} '{}'", node.kind().tag(), name),
            None => node.kind().tag().to_string(),
        }
    }
}
