use crate::{
    ast::Root,
    token::Spanned,
    util::intern::{Interner, Name},
};

mod backend;
mod generator;
#[cfg(test)]
pub(crate) mod test_utils;

pub use backend::{Backend, NumericClass};
pub use generator::Generator;

/// Emits an analyzed tree through `backend`, stopping at the first error.
pub fn generate<B: Backend>(
    backend: &mut B,
    idents: &Interner,
    root: &Root,
) -> Result<(), Spanned<Error>> {
    Generator::new(backend, idents).generate(root)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// An `auto` type survived the analysis.
    UnresolvedType,
    UnknownSymbol(Name),
    NotAssignable,
    /// A `void` expression used as a value.
    VoidValue,
}
