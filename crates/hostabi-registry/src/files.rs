//! Binding file attribution.
//!
//! Every type, declaration and function is attributed to the binding
//! declaration file that created it. A binding file `<dir>/<name><suffix>`
//! targets the native module `<dir>/<name>.<native_extension>`, relative to the
//! configured source root, and its `<name>` stem feeds generated type names.

use std::path::Path;

use hostabi_core::{BuildOptions, FunctionId, SchemaError, SchemaResult, TypeId};

/// The binding file currently being declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaringFile {
    /// Binding file path relative to the source root, `/`-separated.
    pub binding_path: String,
    /// Native module path relative to the source root, `/`-separated.
    pub native_module: String,
    /// File name without directory and binding suffix.
    pub stem: String,
}

impl DeclaringFile {
    /// Resolve a binding file path against the build options.
    pub fn resolve(path: impl AsRef<Path>, options: &BuildOptions) -> SchemaResult<Self> {
        let path = path.as_ref();
        let relative = path.strip_prefix(&options.source_root).unwrap_or(path);
        let binding_path = relative.to_string_lossy().replace('\\', "/");

        let Some(without_suffix) = binding_path.strip_suffix(options.binding_suffix.as_str()) else {
            return Err(SchemaError::InvalidBindingFile {
                path: binding_path,
                suffix: options.binding_suffix.clone(),
            });
        };
        let stem = without_suffix
            .rsplit('/')
            .next()
            .unwrap_or(without_suffix)
            .to_string();
        if stem.is_empty() {
            return Err(SchemaError::InvalidBindingFile {
                path: binding_path,
                suffix: options.binding_suffix.clone(),
            });
        }
        let native_module = format!("{without_suffix}.{}", options.native_extension);

        Ok(Self {
            binding_path,
            native_module,
            stem,
        })
    }
}

/// A named top-level type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    pub name: String,
    pub ty: TypeId,
}

/// Everything declared against one native module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingFile {
    /// Native module path, `/`-separated.
    pub native_module: String,
    /// The binding file that declared into this module.
    pub binding_path: String,
    /// Registered functions, in registration order.
    pub functions: Vec<FunctionId>,
    /// Named type declarations, in declaration order.
    pub typedefs: Vec<TypeDef>,
}

impl BindingFile {
    pub fn new(native_module: impl Into<String>, binding_path: impl Into<String>) -> Self {
        Self {
            native_module: native_module.into(),
            binding_path: binding_path.into(),
            ..Self::default()
        }
    }

    /// Namespace name of the module: its file name without extension.
    pub fn namespace(&self) -> &str {
        module_namespace(&self.native_module)
    }
}

fn module_namespace(native_module: &str) -> &str {
    let file_name = native_module.rsplit('/').next().unwrap_or(native_module);
    match file_name.rfind('.') {
        Some(dot) if dot > 0 => &file_name[..dot],
        _ => file_name,
    }
}
