//! Function signature registration.
//!
//! Each exported native function is registered once per binding file, either
//! as a single implicit variant or as an explicit list of call variants. Every
//! variant is validated independently for argument ordering, and its minimum
//! required argument count is derived.
//!
//! # Example
//!
//! ```ignore
//! ctx.begin_file("src/node/os.bind.ts")?;
//! let global = ctx.global_object();
//! let pid = ctx.i32();
//! let pid = ctx.optional(pid)?;
//! let ret = ctx.i32();
//! ctx.register_function(
//!     FunctionOptions::new("getPriority", [("global", global), ("pid", pid)], ret)
//!         .with_impl_namespace("os"),
//! )?;
//! ```

use rustc_hash::FxHashSet;
use tracing::debug;

use hostabi_core::{FunctionId, SchemaError, SchemaResult, TypeId};

use crate::SchemaBuildContext;

/// A named function argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    pub name: String,
    pub ty: TypeId,
}

impl Arg {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// One declared call shape: arguments and return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDecl {
    pub args: Vec<Arg>,
    pub ret: TypeId,
}

impl VariantDecl {
    pub fn new<K: Into<String>>(args: impl IntoIterator<Item = (K, TypeId)>, ret: TypeId) -> Self {
        Self {
            args: args.into_iter().map(|(name, ty)| Arg::new(name, ty)).collect(),
            ret,
        }
    }
}

/// The declared shape of a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signature {
    /// One implicit variant, implemented by the function's own name.
    Single(VariantDecl),
    /// Numbered variants, implemented by `name1`, `name2`, ...
    Variants(Vec<VariantDecl>),
}

/// Registration input for one exported function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionOptions {
    pub name: String,
    pub signature: Signature,
    /// Namespace of the native implementation, if not the module itself.
    pub impl_namespace: Option<String>,
}

impl FunctionOptions {
    /// A function with a single implicit variant.
    pub fn new<K: Into<String>>(
        name: impl Into<String>,
        args: impl IntoIterator<Item = (K, TypeId)>,
        ret: TypeId,
    ) -> Self {
        Self {
            name: name.into(),
            signature: Signature::Single(VariantDecl::new(args, ret)),
            impl_namespace: None,
        }
    }

    /// A function with explicit call variants.
    pub fn with_variants(name: impl Into<String>, variants: impl IntoIterator<Item = VariantDecl>) -> Self {
        Self {
            name: name.into(),
            signature: Signature::Variants(variants.into_iter().collect()),
            impl_namespace: None,
        }
    }

    pub fn with_impl_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.impl_namespace = Some(namespace.into());
        self
    }
}

/// Where the calling context pointer comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextArg {
    /// Index of the first virtual argument.
    Index(usize),
    /// No virtual argument; the context is passed implicitly.
    Hidden,
}

/// A validated call variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// `""` for the implicit variant, `"1"`, `"2"`, ... otherwise.
    pub suffix: String,
    /// Native implementation symbol: function name plus suffix.
    pub impl_symbol: String,
    pub args: Vec<Arg>,
    pub ret: TypeId,
    pub min_required_args: usize,
    pub context_arg: ContextArg,
}

impl Variant {
    /// Arguments that carry caller-supplied data.
    pub fn data_args<'a>(&'a self, ctx: &'a SchemaBuildContext) -> impl Iterator<Item = &'a Arg> + 'a {
        self.args
            .iter()
            .filter(move |arg| !ctx.type_node(arg.ty).is_virtual_argument())
    }
}

/// One declared entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDescriptor {
    pub name: String,
    /// `"<namespace>."` or empty.
    pub impl_prefix: String,
    pub native_module: String,
    pub binding_file: String,
    pub variants: Vec<Variant>,
}

struct ValidatedArgs {
    min_required_args: usize,
    context_arg: ContextArg,
}

impl SchemaBuildContext {
    /// Validate and record a function against the current binding file.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn register_function(&mut self, options: FunctionOptions) -> SchemaResult<FunctionId> {
        let file = self.require_file()?;
        let descriptor = self.build_descriptor(options, &file.native_module, &file.binding_path);
        let descriptor = self.attribute(descriptor)?;

        debug!(
            target: "hostabi::functions",
            name = %descriptor.name,
            module = %descriptor.native_module,
            variants = descriptor.variants.len(),
            "registered function"
        );
        let id = self.alloc_function(descriptor);
        self.file_entry(&file).functions.push(id);
        Ok(id)
    }

    fn build_descriptor(
        &self,
        options: FunctionOptions,
        native_module: &str,
        binding_file: &str,
    ) -> SchemaResult<FunctionDescriptor> {
        let FunctionOptions {
            name,
            signature,
            impl_namespace,
        } = options;

        let numbered: Vec<(String, VariantDecl)> = match signature {
            Signature::Single(decl) => vec![(String::new(), decl)],
            Signature::Variants(decls) => decls
                .into_iter()
                .enumerate()
                .map(|(i, decl)| ((i + 1).to_string(), decl))
                .collect(),
        };

        let mut variants = Vec::with_capacity(numbered.len());
        for (suffix, decl) in numbered {
            let validated = self.validate_variant(&name, &decl)?;
            variants.push(Variant {
                impl_symbol: format!("{name}{suffix}"),
                suffix,
                args: decl.args,
                ret: decl.ret,
                min_required_args: validated.min_required_args,
                context_arg: validated.context_arg,
            });
        }

        Ok(FunctionDescriptor {
            impl_prefix: impl_namespace.map(|ns| format!("{ns}.")).unwrap_or_default(),
            name,
            native_module: native_module.to_string(),
            binding_file: binding_file.to_string(),
            variants,
        })
    }

    /// Check argument ordering and derive the minimum argument count.
    ///
    /// Virtual arguments are skipped. Among the rest, once an optional or
    /// defaulted argument is seen every later argument must be one too.
    fn validate_variant(&self, function: &str, decl: &VariantDecl) -> SchemaResult<ValidatedArgs> {
        let mut min_required_args = 0;
        let mut seen_optional = false;
        let mut context_arg = ContextArg::Hidden;
        let mut names = FxHashSet::default();

        for (index, arg) in decl.args.iter().enumerate() {
            if !names.insert(arg.name.as_str()) {
                return Err(SchemaError::DuplicateArgument {
                    function: function.to_string(),
                    argument: arg.name.clone(),
                });
            }
            let node = self.type_node(arg.ty);
            if node.is_virtual_argument() {
                if context_arg == ContextArg::Hidden {
                    context_arg = ContextArg::Index(index);
                }
                continue;
            }
            if node.flags().may_be_omitted() {
                seen_optional = true;
            } else {
                if seen_optional {
                    return Err(SchemaError::RequiredAfterOptional {
                        function: function.to_string(),
                        argument: arg.name.clone(),
                    });
                }
                min_required_args += 1;
            }
        }

        self.reject_virtual(decl.ret, &format!("the return type of '{function}'"))?;

        Ok(ValidatedArgs {
            min_required_args,
            context_arg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_in_file() -> SchemaBuildContext {
        let mut ctx = SchemaBuildContext::new();
        ctx.begin_file("src/node/os.bind.ts").unwrap();
        ctx
    }

    #[test]
    fn requires_declaring_file() {
        let mut ctx = SchemaBuildContext::new();
        let ret = ctx.undefined();
        let err = ctx
            .register_function(FunctionOptions::new("f", Vec::<(&str, TypeId)>::new(), ret))
            .unwrap_err();
        assert_eq!(err, SchemaError::NoDeclaringFile);
    }

    #[test]
    fn single_variant() {
        let mut ctx = ctx_in_file();
        let a = ctx.f64();
        let b = ctx.boolean();
        let b = ctx.optional(b).unwrap();
        let ret = ctx.f64();
        let id = ctx
            .register_function(FunctionOptions::new("foo", [("a", a), ("b", b)], ret))
            .unwrap();

        let func = ctx.function(id);
        assert_eq!(func.native_module, "node/os.zig");
        assert_eq!(func.binding_file, "node/os.bind.ts");
        assert_eq!(func.impl_prefix, "");
        assert_eq!(func.variants.len(), 1);
        let variant = &func.variants[0];
        assert_eq!(variant.suffix, "");
        assert_eq!(variant.impl_symbol, "foo");
        assert_eq!(variant.min_required_args, 1);
        assert_eq!(variant.context_arg, ContextArg::Hidden);
        assert_eq!(ctx.file("node/os.zig").unwrap().functions, vec![id]);
    }

    #[test]
    fn numbered_variants() {
        let mut ctx = ctx_in_file();
        let s = ctx.dom_string();
        let n = ctx.f64();
        let ret = ctx.undefined();
        let id = ctx
            .register_function(
                FunctionOptions::with_variants(
                    "write",
                    [VariantDecl::new([("s", s)], ret), VariantDecl::new([("n", n)], ret)],
                )
                .with_impl_namespace("Writer"),
            )
            .unwrap();
        let func = ctx.function(id);
        assert_eq!(func.impl_prefix, "Writer.");
        let symbols: Vec<&str> = func.variants.iter().map(|v| v.impl_symbol.as_str()).collect();
        assert_eq!(symbols, vec!["write1", "write2"]);
    }

    #[test]
    fn required_after_optional_fails() {
        let mut ctx = ctx_in_file();
        let a = ctx.f64();
        let opt = ctx.optional(a).unwrap();
        let ret = ctx.undefined();
        let err = ctx
            .register_function(FunctionOptions::new("f", [("x", a), ("y", opt), ("z", a)], ret))
            .unwrap_err();
        assert_eq!(
            err.root(),
            &SchemaError::RequiredAfterOptional {
                function: "f".into(),
                argument: "z".into()
            }
        );
        assert_eq!(err.file(), Some("node/os.bind.ts"));
        assert_eq!(ctx.function_count(), 0);
    }

    #[test]
    fn defaulted_counts_as_optional() {
        let mut ctx = ctx_in_file();
        let a = ctx.f64();
        let d = ctx.with_default(a, 1.0.into()).unwrap();
        let ret = ctx.undefined();
        assert!(
            ctx.register_function(FunctionOptions::new("f", [("d", d), ("a", a)], ret))
                .is_err()
        );
    }

    #[test]
    fn virtual_args_are_skipped() {
        let mut ctx = ctx_in_file();
        let global = ctx.global_object();
        let a = ctx.f64();
        let b = ctx.boolean();
        let b = ctx.optional(b).unwrap();
        let ret = ctx.undefined();
        let id = ctx
            .register_function(FunctionOptions::new(
                "f",
                [("global", global), ("a", a), ("b", b)],
                ret,
            ))
            .unwrap();
        let variant = &ctx.function(id).variants[0];
        assert_eq!(variant.min_required_args, 1);
        assert_eq!(variant.context_arg, ContextArg::Index(0));
        let data: Vec<&str> = variant.data_args(&ctx).map(|a| a.name.as_str()).collect();
        assert_eq!(data, vec!["a", "b"]);
    }

    #[test]
    fn virtual_after_optional_is_allowed() {
        let mut ctx = ctx_in_file();
        let a = ctx.f64();
        let a = ctx.optional(a).unwrap();
        let vm = ctx.zig_virtual_machine();
        let ret = ctx.undefined();
        let id = ctx
            .register_function(FunctionOptions::new("f", [("a", a), ("vm", vm)], ret))
            .unwrap();
        let variant = &ctx.function(id).variants[0];
        assert_eq!(variant.min_required_args, 0);
        assert_eq!(variant.context_arg, ContextArg::Index(1));
    }

    #[test]
    fn virtual_return_rejected() {
        let mut ctx = ctx_in_file();
        let global = ctx.global_object();
        let err = ctx
            .register_function(FunctionOptions::new("f", Vec::<(&str, TypeId)>::new(), global))
            .unwrap_err();
        assert!(matches!(err.root(), SchemaError::VirtualArgumentMisuse { .. }));
    }

    #[test]
    fn duplicate_argument_rejected() {
        let mut ctx = ctx_in_file();
        let a = ctx.f64();
        let ret = ctx.undefined();
        let err = ctx
            .register_function(FunctionOptions::new("f", [("a", a), ("a", a)], ret))
            .unwrap_err();
        assert!(matches!(err.root(), SchemaError::DuplicateArgument { .. }));
    }

    #[test]
    fn each_variant_validated() {
        let mut ctx = ctx_in_file();
        let a = ctx.f64();
        let opt = ctx.optional(a).unwrap();
        let ret = ctx.undefined();
        let options = FunctionOptions::with_variants(
            "f",
            [
                VariantDecl::new([("a", a)], ret),
                VariantDecl::new([("o", opt), ("a", a)], ret),
            ],
        );
        assert!(ctx.register_function(options).is_err());
    }
}
