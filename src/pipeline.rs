use crate::{
    analyzer::{self, Options},
    ast::Root,
    codegen::{self, Backend},
    diagnostic::Diagnostic,
    lexer::SUGGESTED_TOKENS_CAPACITY,
    parser,
    util::{fmt::Context, intern::Interner},
};

pub struct FrontEnd {
    pub root: Root,
    /// Parser diagnostics first, then the analyzer's.
    pub diagnostics: Vec<Diagnostic>,
    /// Whether an error was reported, in which case the tree must not reach
    /// code generation.
    pub fatal: bool,
}

/// Lexes, parses and analyzes `src`. The analysis is skipped if parsing
/// reported an error.
pub fn front_end(src: &str, idents: &mut Interner, options: Options) -> FrontEnd {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);
    let (mut root, errors) = match parser::parse_root(src, &mut tokens, idents) {
        Ok(root) => (root, Vec::new()),
        Err((root, errors)) => (root, errors),
    };

    let idents: &Interner = idents;
    let ctx = Context::new(idents);
    let mut diagnostics: Vec<_> = errors.iter().map(|e| Diagnostic::new(e, &ctx)).collect();
    let mut fatal = diagnostics.iter().any(Diagnostic::is_error);

    if !fatal {
        let errors = match analyzer::analyze(&mut root, idents, options) {
            Ok(warnings) => warnings,
            Err(errors) => {
                fatal = true;
                errors
            }
        };
        diagnostics.extend(errors.iter().map(|e| Diagnostic::new(e, &ctx)));
    }

    FrontEnd {
        root,
        diagnostics,
        fatal,
    }
}

/// Runs the front end and, if it reported no error, emits the program
/// through `backend`. Returns every diagnostic; `Err` if any is an error.
pub fn compile<B: Backend>(
    src: &str,
    idents: &mut Interner,
    options: Options,
    backend: &mut B,
) -> Result<Vec<Diagnostic>, Vec<Diagnostic>> {
    let FrontEnd {
        root,
        mut diagnostics,
        fatal,
    } = front_end(src, idents, options);
    if fatal {
        return Err(diagnostics);
    }
    if let Err(error) = codegen::generate(backend, idents, &root) {
        diagnostics.push(Diagnostic::new(&error, &Context::new(idents)));
        return Err(diagnostics);
    }
    Ok(diagnostics)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{codegen::test_utils::Recorder, diagnostic::Severity};

    fn run(src: &str) -> FrontEnd {
        front_end(src, &mut Interner::with_capacity(16), Options::default())
    }

    fn messages(front_end: &FrontEnd) -> Vec<String> {
        front_end.diagnostics.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn clean_program() {
        let result = run("x: i64 = 5; ret x + 1;");
        assert!(!result.fatal);
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.root.stmts.len(), 2);
    }

    #[test]
    fn warnings_are_not_fatal() {
        let result = run("x: i64 = 1.5; y: int = 2;");
        assert!(!result.fatal);
        assert_eq!(
            messages(&result),
            [
                "1:18..21: warning: unknown type `int`",
                "1:10..13: warning: type mismatch: expected i64, but got f64",
            ]
        );
    }

    #[test]
    fn parse_errors_skip_the_analysis() {
        let result = run("ret z; x: i64 = (1;");
        assert!(result.fatal);
        assert!(result.diagnostics.iter().all(|d| d.severity == Severity::Error));
        assert!(!messages(&result).iter().any(|m| m.contains("unresolved")));
    }

    #[test]
    fn unresolved_symbol_is_fatal() {
        let result = run("ret z;");
        assert!(result.fatal);
        assert_eq!(messages(&result), ["1:5..6: error: unresolved symbol `z`"]);
    }

    #[test]
    fn compile_reaches_the_backend() {
        let mut idents = Interner::default();
        let mut recorder = Recorder::default();
        let result = compile("ret 1;", &mut idents, Options::default(), &mut recorder);
        assert_eq!(result, Ok(vec![]));
        assert_eq!(recorder.log, ["ret i64 1"]);
    }

    #[test]
    fn compile_stops_before_the_backend() {
        let mut idents = Interner::default();
        let mut recorder = Recorder::default();
        let result = compile("ret z;", &mut idents, Options::default(), &mut recorder);
        assert!(result.is_err());
        assert!(recorder.log.is_empty());
    }
}
