use std::fmt;

use crate::codegen::Backend;

/// A Lynx type.
///
/// Equality is structural: variant tags are compared first, then the
/// payloads of `Pointer`, `Reference` and `Function` recursively. No coercion
/// happens here; that is the analyzer's job.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    U8,
    I32,
    I64,
    F64,
    Pointer(Box<Type>),
    Reference(Box<Type>),
    Function { ret: Box<Type>, params: Vec<Type> },
    /// A string literal.
    Literal,
    /// Placeholder which must be unified with a concrete type before code
    /// generation.
    Auto,
}

/// The fixed table of type names.
pub static TYPE_NAMES: phf::Map<&'static str, Type> = phf::phf_map! {
    "void" => Type::Void,
    "u8" => Type::U8,
    "i32" => Type::I32,
    "i64" => Type::I64,
    "f64" => Type::F64,
    "literal" => Type::Literal,
    "auto" => Type::Auto,
};

impl Type {
    /// Resolves a type name, as written in a type annotation.
    pub fn from_name(name: &str) -> Option<Type> {
        TYPE_NAMES.get(name).cloned()
    }

    pub fn pointer_to(self) -> Type {
        Type::Pointer(Box::new(self))
    }

    pub fn reference_to(self) -> Type {
        Type::Reference(Box::new(self))
    }

    pub fn function(ret: Type, params: Vec<Type>) -> Type {
        Type::Function {
            ret: Box::new(ret),
            params,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::U8 | Type::I32 | Type::I64)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::F64)
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, Type::I32 | Type::I64 | Type::F64)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Reference(_))
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Type::Function { .. })
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Type::Auto)
    }

    /// Returns the type seen when a value of this type is read: references
    /// are transparent.
    pub fn value_type(&self) -> &Type {
        match self {
            Type::Reference(referee) => referee,
            other => other,
        }
    }

    /// The type obtained by dereferencing, if this is a pointer or reference.
    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Pointer(inner) | Type::Reference(inner) => Some(inner),
            _ => None,
        }
    }

    /// Whether a value of this type can be implicitly widened to `target`:
    /// integers to wider integers, and integers to floats.
    pub fn widens_to(&self, target: &Type) -> bool {
        match (self.numeric_rank(), target.numeric_rank()) {
            (Some(from), Some(to)) => from < to,
            _ => false,
        }
    }

    fn numeric_rank(&self) -> Option<u8> {
        match self {
            Type::U8 => Some(1),
            Type::I32 => Some(2),
            Type::I64 => Some(3),
            Type::F64 => Some(4),
            _ => None,
        }
    }

    /// Lowers this type into a backend type. Returns `None` for `Auto`,
    /// which has no backend representation.
    pub fn lower<B: Backend>(&self, backend: &mut B) -> Option<B::Ty> {
        let ty = match self {
            Type::Void => backend.void_ty(),
            Type::U8 => backend.int_ty(8, false),
            Type::I32 => backend.int_ty(32, true),
            Type::I64 => backend.int_ty(64, true),
            Type::F64 => backend.float_ty(64),
            Type::Pointer(inner) | Type::Reference(inner) => {
                let inner = inner.lower(backend)?;
                backend.pointer_to(inner)
            }
            Type::Function { ret, params } => {
                let ret = ret.lower(backend)?;
                let params = params
                    .iter()
                    .map(|param| param.lower(backend))
                    .collect::<Option<Vec<_>>>()?;
                backend.function_ty(ret, params)
            }
            Type::Literal => {
                let byte = backend.int_ty(8, false);
                backend.pointer_to(byte)
            }
            Type::Auto => return None,
        };
        Some(ty)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => f.write_str("void"),
            Type::U8 => f.write_str("u8"),
            Type::I32 => f.write_str("i32"),
            Type::I64 => f.write_str("i64"),
            Type::F64 => f.write_str("f64"),
            Type::Pointer(inner) => write!(f, "{inner}*"),
            Type::Reference(referee) => write!(f, "&{referee}"),
            Type::Function { ret, params } => {
                f.write_str("(")?;
                for (idx, param) in params.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ") -> {ret}")
            }
            Type::Literal => f.write_str("literal"),
            Type::Auto => f.write_str("auto"),
        }
    }
}
