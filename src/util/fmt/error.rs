#![allow(clippy::items_after_statements)]

use std::fmt::{self, Formatter};

use crate::{
    analyzer, codegen,
    lexer::{self, MalformedNumber as Malformed},
    parser,
    token::Spanned,
    util::fmt::Show,
};

impl Show for Spanned<lexer::Error> {
    fn show(&self, f: &mut Formatter<'_>, _: &super::Context<'_>) -> fmt::Result {
        let Spanned { span, inner: error } = self;

        if f.alternate() {
            write!(f, "{span}: ")?;
        }
        show_lexer_error(f, error)
    }
}

fn show_lexer_error(f: &mut Formatter<'_>, error: &lexer::Error) -> fmt::Result {
    use lexer::Error::*;
    match error {
        InvalidCharacter(c) => write!(f, "invalid character `{c}` (code {})", u32::from(*c)),
        UnterminatedString => write!(f, "unterminated string literal"),
        UnterminatedComment => write!(f, "unterminated block comment"),
        MalformedNumber(malformed) => match malformed {
            Malformed::TrailingDot => write!(f, "malformed number: trailing `.`"),
            Malformed::DoubleDot => write!(f, "malformed number: repeated `.`"),
        },
    }
}

impl Show for Spanned<parser::Error> {
    fn show(&self, f: &mut Formatter<'_>, ctx: &super::Context<'_>) -> fmt::Result {
        let Spanned { span, inner: error } = self;

        if f.alternate() {
            write!(f, "{span}: ")?;
        }

        use parser::Error::*;
        match error {
            Lexer(error) => show_lexer_error(f, error),
            UnexpectedToken { actual } => write!(f, "unexpected token {actual}"),
            Unexpected { actual, expected } => {
                write!(f, "expected {expected}, but got {actual}")
            }
            UnexpectedAny { actual, expected } => {
                f.write_str("expected one of ")?;
                for (idx, kind) in expected.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{kind}")?;
                }
                write!(f, ", but got {actual}")
            }
            UnbalancedDelimiter { expected } => {
                write!(f, "unbalanced delimiter, missing {expected}")
            }
            ParseNumber => write!(f, "number literal out of bounds"),
            UnknownType(name) => write!(f, "unknown type `{}`", ctx.idents.get(*name)),
        }
    }
}

impl Show for Spanned<analyzer::Error> {
    fn show(&self, f: &mut Formatter<'_>, ctx: &super::Context<'_>) -> fmt::Result {
        let i = ctx.idents;
        let Spanned { span, inner: error } = self;

        if f.alternate() {
            write!(f, "{span}: ")?;
        }

        use analyzer::Error::*;
        match error {
            UnresolvedSymbol(name) => write!(f, "unresolved symbol `{}`", i.get(*name)),
            TypeMismatch { expected, actual } => {
                write!(f, "type mismatch: expected {expected}, but got {actual}")
            }
            Redeclaration { name, previous } => {
                let name = i.get(*name);
                write!(f, "`{name}` redeclared, previously declared at {previous}")
            }
            UnresolvedAuto(name) => {
                write!(f, "could not infer the type of `{}`", i.get(*name))
            }
            ArgumentCountMismatch { expected, actual } => write!(
                f,
                "wrong number of arguments: expected {expected}, but got {actual}"
            ),
            NotCallable(ty) => write!(f, "cannot call a value of type {ty}"),
        }
    }
}

impl Show for Spanned<codegen::Error> {
    fn show(&self, f: &mut Formatter<'_>, ctx: &super::Context<'_>) -> fmt::Result {
        let Spanned { span, inner: error } = self;

        if f.alternate() {
            write!(f, "{span}: ")?;
        }

        use codegen::Error::*;
        match error {
            UnresolvedType => write!(f, "unresolved type reached code generation"),
            UnknownSymbol(name) => write!(f, "unknown symbol `{}`", ctx.idents.get(*name)),
            NotAssignable => write!(f, "expression is not assignable"),
            VoidValue => write!(f, "expression has no value"),
        }
    }
}
