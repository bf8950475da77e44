use std::fmt;

use crate::{
    analyzer, codegen, lexer, parser,
    token::Spanned,
    util::fmt::{Context, Show},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A positioned message, ready to be reported by a driver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub line: u32,
    pub start_col: u32,
    /// Exclusive.
    pub end_col: u32,
    pub message: String,
}

impl Diagnostic {
    pub fn new<E: Classify>(error: &Spanned<E>, ctx: &Context<'_>) -> Diagnostic
    where
        Spanned<E>: Show,
    {
        Diagnostic {
            severity: error.inner.severity(),
            line: error.span.line,
            start_col: error.span.col,
            end_col: error.span.end_col(),
            // Not alternate, the position is kept apart.
            message: error.to_string_with(ctx),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Diagnostic {
            severity,
            line,
            start_col,
            end_col,
            message,
        } = self;
        write!(f, "{line}:{start_col}..{end_col}: {severity}: {message}")
    }
}

/// Errors know whether they are fatal.
pub trait Classify {
    fn severity(&self) -> Severity;
}

impl Classify for lexer::Error {
    fn severity(&self) -> Severity {
        Severity::Error
    }
}

impl Classify for parser::Error {
    fn severity(&self) -> Severity {
        match self {
            parser::Error::Lexer(error) => error.severity(),
            parser::Error::UnknownType(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl Classify for analyzer::Error {
    fn severity(&self) -> Severity {
        match self {
            analyzer::Error::UnresolvedSymbol(_) => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

impl Classify for codegen::Error {
    fn severity(&self) -> Severity {
        Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{token::Span, util::intern::Interner};

    #[test]
    fn severities() {
        let mut i = Interner::default();
        let name = i.intern("x");
        assert_eq!(
            parser::Error::Lexer(lexer::Error::UnterminatedString).severity(),
            Severity::Error
        );
        assert_eq!(parser::Error::ParseNumber.severity(), Severity::Error);
        assert_eq!(parser::Error::UnknownType(name).severity(), Severity::Warning);
        assert_eq!(
            analyzer::Error::UnresolvedSymbol(name).severity(),
            Severity::Error
        );
        assert_eq!(
            analyzer::Error::UnresolvedAuto(name).severity(),
            Severity::Warning
        );
        assert_eq!(codegen::Error::NotAssignable.severity(), Severity::Error);
    }

    #[test]
    fn from_spanned_error() {
        let mut i = Interner::default();
        let name = i.intern("y");
        let error = Span::new(9, 1, 2, 5).wrap(analyzer::Error::UnresolvedSymbol(name));
        let diagnostic = Diagnostic::new(&error, &Context::new(&i));
        assert_eq!(
            diagnostic,
            Diagnostic {
                severity: Severity::Error,
                line: 2,
                start_col: 5,
                end_col: 6,
                message: "unresolved symbol `y`".to_owned(),
            }
        );
        assert_eq!(
            diagnostic.to_string(),
            "2:5..6: error: unresolved symbol `y`"
        );
    }
}
