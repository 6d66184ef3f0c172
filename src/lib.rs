//! Build-time compiler from binding schemas to canonical type registries and
//! C-ABI struct layouts.
//!
//! Binding declaration files construct types, chain modifiers and register
//! functions against a [`SchemaBuildContext`](registry::SchemaBuildContext).
//! Structurally identical types declared across files collapse into one
//! canonical, named artifact; dictionaries whose fields all have a fixed
//! native form lower to deterministic [`StructLayout`](registry::StructLayout)s.
//! [`finish`](registry::SchemaBuildContext::finish) freezes everything into a
//! [`SchemaRegistry`](registry::SchemaRegistry) for the emission driver.
//!
//! ```
//! use hostabi::prelude::*;
//!
//! let mut ctx = SchemaBuildContext::new();
//! ctx.begin_file("src/node/os.bind.ts")?;
//! let x = ctx.f64();
//! let flag = ctx.boolean();
//! let point = ctx.dictionary([("x", x), ("flag", flag)])?;
//! ctx.declare_type("Point", point)?;
//! let ret = ctx.undefined();
//! ctx.register_function(FunctionOptions::new("draw", [("at", point)], ret))?;
//!
//! let registry = ctx.finish()?;
//! let layout = registry
//!     .abi_type(point)?
//!     .and_then(AbiType::as_struct)
//!     .map(|id| registry.struct_layout(id))
//!     .expect("dictionary lowers to a struct");
//! assert_eq!(layout.abi_info(), (16, 8));
//! assert_eq!(layout.to_string(), "os.Point");
//! # Ok::<(), SchemaError>(())
//! ```

pub use hostabi_core as core;
pub use hostabi_registry as registry;

pub mod prelude {
    pub use hostabi_core::{
        AbiType, BuildOptions, CAbiPrimitive, ContentHash, DefaultValue, FieldOrder, FunctionId,
        SchemaError, SchemaResult, StructId, TypeId, TypeKind,
    };
    pub use hostabi_registry::{
        ContextArg, FunctionDescriptor, FunctionOptions, SchemaBuildContext, SchemaRegistry,
        StructLayout, TypeNode, Variant, VariantDecl,
    };
}
