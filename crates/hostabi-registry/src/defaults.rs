//! Default-value validation.
//!
//! A literal is checked against the declared shape of a type before the
//! `default` modifier accepts it. Validation recurses into dictionary fields,
//! tracking a dotted path so errors point at the offending key.

use hostabi_core::{
    DefaultValue, MAX_SAFE_INTEGER, RangeBounds, SchemaError, SchemaResult, TypeId, TypeKind,
    integer_limits,
};

use crate::SchemaBuildContext;

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn mismatch(expected: &'static str, found: &DefaultValue, path: &str) -> SchemaError {
    SchemaError::InvalidDefault {
        expected,
        found: found.to_string(),
        path: path.to_string(),
    }
}

impl SchemaBuildContext {
    /// Check that `value` is an acceptable default for the type `id`.
    pub fn assert_default_is_valid(&self, id: TypeId, value: &DefaultValue) -> SchemaResult<()> {
        self.check_default(id, value, "")
    }

    fn check_default(&self, id: TypeId, value: &DefaultValue, path: &str) -> SchemaResult<()> {
        let node = self.type_node(id);
        match node.kind() {
            TypeKind::ByteString | TypeKind::DomString | TypeKind::UsvString | TypeKind::Utf8String => {
                match value {
                    DefaultValue::String(_) => Ok(()),
                    other => Err(mismatch("string", other, path)),
                }
            }
            TypeKind::Boolean | TypeKind::StrictBoolean => match value {
                DefaultValue::Boolean(_) => Ok(()),
                other => Err(mismatch("boolean", other, path)),
            },
            TypeKind::F64 => match value {
                DefaultValue::Number(_) => Ok(()),
                other => Err(mismatch("number", other, path)),
            },
            TypeKind::I8
            | TypeKind::I16
            | TypeKind::I32
            | TypeKind::I64
            | TypeKind::U8
            | TypeKind::U16
            | TypeKind::U32
            | TypeKind::U64
            | TypeKind::Usize => self.check_integer_default(id, value, path),
            TypeKind::Dictionary(fields) => {
                if !matches!(value, DefaultValue::Object(_)) {
                    return Err(mismatch("object", value, path));
                }
                for field in fields {
                    let field_path = join_path(path, &field.key);
                    match value.get(&field.key) {
                        Some(inner) => self.check_default(field.ty, inner, &field_path)?,
                        None if self.type_node(field.ty).flags().is_required() => {
                            return Err(SchemaError::MissingDictionaryKey {
                                key: field.key.clone(),
                                path: path.to_string(),
                            });
                        }
                        None => {}
                    }
                }
                Ok(())
            }
            TypeKind::Undefined => match value {
                DefaultValue::Undefined => Ok(()),
                other => Err(mismatch("undefined", other, path)),
            },
            TypeKind::Any
            | TypeKind::GlobalObject
            | TypeKind::ZigVirtualMachine
            | TypeKind::ExternalClass
            | TypeKind::Ref(_)
            | TypeKind::StringEnum(_)
            | TypeKind::ZigEnum { .. }
            | TypeKind::Sequence(_)
            | TypeKind::Record(_)
            | TypeKind::OneOf(_) => Err(SchemaError::Unsupported {
                operation: "setting a default value",
                kind: node.kind().tag(),
            }),
        }
    }

    fn check_integer_default(&self, id: TypeId, value: &DefaultValue, path: &str) -> SchemaResult<()> {
        let node = self.type_node(id);
        let (min, max) = match node.flags().range.map(|r| r.bounds) {
            Some(RangeBounds::Explicit { min, max }) => (min, max),
            Some(RangeBounds::Abi) | None => match integer_limits(node.kind()) {
                Some(limits) => limits,
                None => {
                    return Err(SchemaError::Unsupported {
                        operation: "integer default validation",
                        kind: node.kind().tag(),
                    });
                }
            },
        };
        let out_of_range = || SchemaError::DefaultOutOfRange {
            min,
            max,
            value: value.to_string(),
            path: path.to_string(),
        };

        match value {
            DefaultValue::Number(n) => {
                if n.fract() != 0.0 {
                    return Err(mismatch("integer", value, path));
                }
                if n.abs() >= MAX_SAFE_INTEGER as f64 {
                    return Err(SchemaError::DefaultPrecisionLoss {
                        kind: node.kind().tag(),
                        value: value.to_string(),
                        path: path.to_string(),
                    });
                }
                let n = *n as i128;
                if n < min || n > max {
                    return Err(out_of_range());
                }
                Ok(())
            }
            DefaultValue::BigInt(n) => {
                if *n < min || *n > max {
                    return Err(out_of_range());
                }
                Ok(())
            }
            other => Err(mismatch("integer", other, path)),
        }
    }
}
