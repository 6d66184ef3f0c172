//! Schema build context and registries.
//!
//! This crate turns binding declarations into a canonical, deduplicated type
//! registry plus fixed-layout C-ABI struct descriptions:
//!
//! - [`SchemaBuildContext`] - arenas, the four canonical registries and the
//!   per-file function lists of one loading pass
//! - [`TypeNode`] - one schema type with its modifiers, hash and name
//! - [`StructLayout`] - an ordered C-ABI field layout
//! - [`FunctionDescriptor`] - a registered entry point with validated variants
//! - [`SchemaRegistry`] - the frozen result of [`SchemaBuildContext::finish`]
//!
//! # Example
//!
//! ```
//! use hostabi_registry::{FunctionOptions, SchemaBuildContext};
//!
//! let mut ctx = SchemaBuildContext::new();
//! ctx.begin_file("src/node/os.bind.ts")?;
//!
//! let a = ctx.f64();
//! let a = ctx.required(a)?;
//! let b = ctx.boolean();
//! let b = ctx.with_default(b, true.into())?;
//! let options = ctx.dictionary([("a", a), ("b", b)])?;
//! ctx.declare_type("Options", options)?;
//!
//! let ret = ctx.f64();
//! ctx.register_function(FunctionOptions::new("foo", [("arg", options)], ret))?;
//!
//! let registry = ctx.finish()?;
//! assert_eq!(registry.qualified_name(options)?.as_deref(), Some("os.Options"));
//! # Ok::<(), hostabi_core::SchemaError>(())
//! ```

mod c_abi;
mod canonical;
mod context;
mod defaults;
mod files;
mod functions;
mod modifiers;
mod schema;
mod struct_layout;
mod type_node;

pub use canonical::CanonicalMap;
pub use context::SchemaBuildContext;
pub use files::{BindingFile, DeclaringFile, TypeDef};
pub use functions::{
    Arg, ContextArg, FunctionDescriptor, FunctionOptions, Signature, Variant, VariantDecl,
};
pub use schema::SchemaRegistry;
pub use struct_layout::{StructField, StructLayout};
pub use type_node::TypeNode;
