/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into an AST.
pub mod parser;

/// The analyzer resolves the symbols and types of a parsed AST in place,
/// inserting the implicit conversions.
pub mod analyzer;

/// The code generator walks an analyzed AST, emitting it through a
/// [`codegen::Backend`].
pub mod codegen;

pub mod ast;
pub mod diagnostic;
pub mod pipeline;
pub mod token;
pub mod types;
pub mod value;

pub mod util {
    pub mod fmt;
    pub mod intern;
    #[cfg(test)]
    pub(crate) mod test_utils;
}
