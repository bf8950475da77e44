use std::fmt;

use crate::{codegen::Backend, types::Type};

/// A typed compile-time literal.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    I32(i32),
    I64(i64),
    F64(f64),
    /// The raw literal content, escape sequences not yet processed.
    Literal(Box<str>),
}

impl Value {
    pub fn ty(&self) -> Type {
        match self {
            Value::I32(_) => Type::I32,
            Value::I64(_) => Type::I64,
            Value::F64(_) => Type::F64,
            Value::Literal(_) => Type::Literal,
        }
    }

    /// Converts this value into an equivalent value of type `target`, if the
    /// value is representable in it. Used to fold literal initializers.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn convert(&self, target: &Type) -> Option<Value> {
        let converted = match (self, target) {
            (value, target) if value.ty() == *target => value.clone(),
            (Value::I32(v), Type::I64) => Value::I64(i64::from(*v)),
            (Value::I32(v), Type::F64) => Value::F64(f64::from(*v)),
            (Value::I64(v), Type::I32) => Value::I32(i32::try_from(*v).ok()?),
            (Value::I64(v), Type::F64) => {
                let float = *v as f64;
                // Past 2^53 not every integer has an exact float.
                if float as i128 != i128::from(*v) {
                    return None;
                }
                Value::F64(float)
            }
            _ => return None,
        };
        Some(converted)
    }

    /// Lowers this value into a backend constant.
    pub fn lower<B: Backend>(&self, backend: &mut B) -> B::Value {
        match self {
            Value::I32(v) => {
                let ty = backend.int_ty(32, true);
                backend.const_int(ty, i64::from(*v))
            }
            Value::I64(v) => {
                let ty = backend.int_ty(64, true);
                backend.const_int(ty, *v)
            }
            Value::F64(v) => {
                let ty = backend.float_ty(64);
                backend.const_float(ty, *v)
            }
            Value::Literal(raw) => backend.const_literal(&unescape(raw)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            // Debug keeps the `.0` of whole floats.
            Value::F64(v) => write!(f, "{v:?}"),
            Value::Literal(raw) => write!(f, "\"{raw}\""),
        }
    }
}

/// Processes the escape sequences of a raw literal. Unknown escapes yield the
/// escaped character itself.
pub fn unescape(raw: &str) -> String {
    let mut buf = String::with_capacity(raw.len());
    let mut escaped = false;
    for char in raw.chars() {
        let char = match (escaped, char) {
            (true, 'n') => '\n',
            (true, 't') => '\t',
            (true, 'r') => '\r',
            (true, '0') => '\0',
            (false, '\\') => {
                escaped = true;
                continue;
            }
            (_, char) => char,
        };
        escaped = false;
        buf.push(char);
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_types() {
        assert_eq!(Value::I32(1).ty(), Type::I32);
        assert_eq!(Value::I64(1).ty(), Type::I64);
        assert_eq!(Value::F64(1.0).ty(), Type::F64);
        assert_eq!(Value::Literal("a".into()).ty(), Type::Literal);
    }

    #[test]
    fn conversions() {
        assert_eq!(Value::I64(5).convert(&Type::I32), Some(Value::I32(5)));
        assert_eq!(Value::I64(5).convert(&Type::F64), Some(Value::F64(5.0)));
        assert_eq!(Value::I32(-3).convert(&Type::I64), Some(Value::I64(-3)));
        assert_eq!(Value::I64(1 << 40).convert(&Type::I32), None);
        assert_eq!(Value::F64(1.5).convert(&Type::I64), None);
        assert_eq!(Value::Literal("x".into()).convert(&Type::I64), None);
        assert_eq!(Value::I64(7).convert(&Type::I64), Some(Value::I64(7)));
        assert_eq!(
            Value::I64(1 << 60).convert(&Type::F64),
            Some(Value::F64(1_152_921_504_606_846_976.0))
        );
        assert_eq!(Value::I64((1 << 53) + 1).convert(&Type::F64), None);
        assert_eq!(Value::I64(i64::MAX).convert(&Type::F64), None);
    }

    #[test]
    fn display() {
        assert_eq!(Value::I64(42).to_string(), "42");
        assert_eq!(Value::F64(3.0).to_string(), "3.0");
        assert_eq!(Value::F64(0.25).to_string(), "0.25");
        assert_eq!(Value::Literal(r"a\n".into()).to_string(), r#""a\n""#);
    }

    #[test]
    fn escapes() {
        assert_eq!(unescape(r"a\nb\tc"), "a\nb\tc");
        assert_eq!(unescape(r#"\"q\" \\ \0 \r"#), "\"q\" \\ \0 \r");
        assert_eq!(unescape(r"\q"), "q");
        assert_eq!(unescape("plain"), "plain");
    }
}
