use std::collections::HashMap;

use crate::{
    ast::{Expr, ExprKind, Function, Ident, Prototype, Root, Stmt, StmtKind, UnaryOp, Variable},
    token::{Span, Spanned},
    types::Type,
    util::{
        fmt::{Context, Show},
        intern::{Interner, Name},
    },
};

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// Analysis outcome. Both variants carry every recorded diagnostic; the
/// `Err` variant ends with the fatal one that aborted the pass.
pub type AnalyzeResult = Result<Vec<Spanned<Error>>, Vec<Spanned<Error>>>;

/// Resolves names and types of `root` in place.
pub fn analyze(root: &mut Root, idents: &Interner, options: Options) -> AnalyzeResult {
    let mut analyzer = Analyzer::new(idents, options);
    match analyzer.analyze(root) {
        Ok(()) => Ok(analyzer.errors),
        Err(fatal) => {
            let mut errors = analyzer.errors;
            errors.push(fatal);
            Err(errors)
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct Options {
    /// Prints an indented trace of the walk to stderr.
    pub trace: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub name: Name,
    pub ty: Type,
    pub kind: SymbolKind,
    /// Where the symbol was declared.
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function {
        params: Vec<Option<Name>>,
        /// `false` for a bare prototype.
        defined: bool,
    },
}

impl Symbol {
    pub fn variable(ident: Ident, ty: Type) -> Symbol {
        Symbol {
            name: ident.name,
            ty,
            kind: SymbolKind::Variable,
            span: ident.span,
        }
    }

    /// Panics if `ty` is not a function type with one parameter per name.
    pub fn function(ident: Ident, ty: Type, params: Vec<Option<Name>>, defined: bool) -> Symbol {
        let Type::Function {
            params: param_tys, ..
        } = &ty
        else {
            panic!("function symbol with non-function type `{ty}`");
        };
        assert_eq!(params.len(), param_tys.len(), "parameter count mismatch");
        Symbol {
            name: ident.name,
            ty,
            kind: SymbolKind::Function { params, defined },
            span: ident.span,
        }
    }

    pub fn is_prototype(&self) -> bool {
        matches!(self.kind, SymbolKind::Function { defined: false, .. })
    }
}

type Scope = HashMap<Name, Symbol>;

pub struct Analyzer<'ident> {
    idents: &'ident Interner,
    globals: Scope,
    /// Innermost last.
    scopes: Vec<Scope>,
    /// Declared return types of the functions being analyzed.
    returns: Vec<Type>,
    errors: Vec<Spanned<Error>>,
    options: Options,
    depth: usize,
}

impl<'ident> Analyzer<'ident> {
    pub fn new(idents: &'ident Interner, options: Options) -> Analyzer<'ident> {
        Analyzer {
            idents,
            globals: Scope::with_capacity(32),
            scopes: Vec::with_capacity(8),
            returns: Vec::new(),
            errors: Vec::new(),
            options,
            depth: 0,
        }
    }

    /// Analyzes every statement in order. An unresolved symbol aborts the
    /// pass; the other findings are recorded in [`Analyzer::errors`] and the
    /// analysis goes on.
    pub fn analyze(&mut self, root: &mut Root) -> Result<()> {
        for stmt in &mut root.stmts {
            self.analyze_stmt(stmt)?;
        }
        Ok(())
    }

    pub fn errors(&self) -> &[Spanned<Error>] {
        &self.errors
    }

    /// Searches the open scopes, innermost first, and then the globals.
    pub fn lookup(&self, ident: Ident) -> Result<&Symbol> {
        self.scopes
            .iter()
            .rev()
            .chain(std::iter::once(&self.globals))
            .find_map(|scope| scope.get(&ident.name))
            .ok_or_else(|| ident.span.wrap(Error::UnresolvedSymbol(ident.name)))
    }

    /// Declares `symbol` in the innermost scope. Redeclaring a name in the
    /// same scope is reported but still shadows the previous symbol, except
    /// for the definition of a previously declared prototype.
    pub fn insert(&mut self, symbol: Symbol) {
        if let Some(previous) = self.innermost().get(&symbol.name) {
            let defines_prototype = previous.is_prototype()
                && matches!(symbol.kind, SymbolKind::Function { .. })
                && previous.ty == symbol.ty;
            if !defines_prototype {
                let error = Error::Redeclaration {
                    name: symbol.name,
                    previous: previous.span,
                };
                self.warn(symbol.span.wrap(error));
            }
        }
        self.bind(symbol);
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    pub fn pop_scope(&mut self) {
        let popped = self.scopes.pop();
        debug_assert!(popped.is_some(), "no scope to pop");
    }

    /// Computes the type of `expr` from its already analyzed children.
    pub fn get_type(&self, expr: &Expr) -> Type {
        match &expr.kind {
            ExprKind::Assignment { target, .. } => target.ty.value_type().clone(),
            ExprKind::Block(stmts) => match stmts.last() {
                Some(Stmt {
                    kind: StmtKind::Return(Some(ret)),
                    ..
                }) => ret.ty.value_type().clone(),
                _ => Type::Void,
            },
            ExprKind::Call { callee, .. } => match callee.ty.value_type() {
                Type::Function { ret, .. } => (**ret).clone(),
                _ => Type::Auto,
            },
            ExprKind::Binary { lhs, rhs, .. } => {
                let (l, r) = (lhs.ty.value_type(), rhs.ty.value_type());
                if l.widens_to(r) {
                    r.clone()
                } else {
                    l.clone()
                }
            }
            ExprKind::Unary { op, expr: inner } => {
                let ty = inner.ty.value_type();
                match op {
                    UnaryOp::AddressOf => ty.clone().pointer_to(),
                    UnaryOp::Deref => ty.pointee().cloned().unwrap_or(Type::Auto),
                    _ => ty.clone(),
                }
            }
            ExprKind::Cast(_) => expr.ty.clone(),
            ExprKind::Symbol(ident) => self
                .lookup(*ident)
                .map_or(Type::Auto, |symbol| symbol.ty.clone()),
            ExprKind::Value(value) => value.ty(),
        }
    }

    fn analyze_stmt(&mut self, stmt: &mut Stmt) -> Result<()> {
        if self.options.trace {
            let ctx = Context::new(self.idents);
            self.trace(format_args!("stmt {}", stmt.display(&ctx)));
        }
        self.depth += 1;
        let result = match &mut stmt.kind {
            StmtKind::Prototype(proto) => {
                self.declare_function(proto, false);
                Ok(())
            }
            StmtKind::Function(function) => self.analyze_function(function),
            StmtKind::Variable(variable) => self.analyze_variable(variable),
            StmtKind::Return(expr) => self.analyze_return(expr.as_mut()),
            StmtKind::Expr(expr) => self.analyze_expr(expr),
        };
        self.depth -= 1;
        result
    }

    fn declare_function(&mut self, proto: &Prototype, defined: bool) {
        let params = proto.params.iter().map(|p| p.name.map(|n| n.name)).collect();
        self.insert(Symbol::function(proto.name, proto.fn_type(), params, defined));
    }

    fn analyze_function(&mut self, function: &mut Function) -> Result<()> {
        let Function { proto, body } = function;
        // Declared before the body, so that it may recurse.
        self.declare_function(proto, true);
        for param in &proto.params {
            if param.ty.value_type().is_auto() {
                let name = param.name.unwrap_or(proto.name).name;
                self.warn(param.span.wrap(Error::UnresolvedAuto(name)));
            }
        }

        self.returns.push(proto.ret.clone());
        let result = self.scoped(|this| {
            for param in &proto.params {
                if let Some(name) = param.name {
                    this.insert(Symbol::variable(name, param.effective_ty()));
                }
            }
            this.analyze_body(body)
        });
        self.returns.pop();
        result?;

        if proto.ret.is_auto() {
            let ret = body_type(body);
            if ret.is_auto() {
                self.warn(proto.name.span.wrap(Error::UnresolvedAuto(proto.name.name)));
            } else {
                self.trace(format_args!("inferred return type {ret}"));
                proto.ret = ret;
                let params = proto.params.iter().map(|p| p.name.map(|n| n.name)).collect();
                self.bind(Symbol::function(proto.name, proto.fn_type(), params, true));
            }
        }
        Ok(())
    }

    /// A block body's trailing return leaves the function, unlike the one of
    /// a nested block.
    fn analyze_body(&mut self, body: &mut Stmt) -> Result<()> {
        match &mut body.kind {
            StmtKind::Expr(expr) if matches!(expr.kind, ExprKind::Block(_)) => {
                if let ExprKind::Block(stmts) = &mut expr.kind {
                    self.analyze_block(stmts, true)?;
                }
                expr.ty = self.get_type(expr);
                Ok(())
            }
            _ => self.analyze_stmt(body),
        }
    }

    /// Analyzes `stmts` in a new scope. Outside of a function body, the
    /// trailing return yields the value of the block, so it is left for the
    /// receiver of that value to coerce.
    fn analyze_block(&mut self, stmts: &mut [Stmt], body: bool) -> Result<()> {
        self.scoped(|this| {
            let Some((last, init)) = stmts.split_last_mut() else {
                return Ok(());
            };
            for stmt in init {
                this.analyze_stmt(stmt)?;
            }
            match &mut last.kind {
                StmtKind::Return(Some(expr)) if !body => {
                    this.trace(format_args!("yield"));
                    this.analyze_expr(expr)
                }
                _ => this.analyze_stmt(last),
            }
        })
    }

    fn analyze_variable(&mut self, variable: &mut Variable) -> Result<()> {
        let Variable { name, ty, init } = variable;
        if let Some(init) = init {
            self.analyze_expr(init)?;
            if ty.value_type().is_auto() {
                let inferred = init.ty.value_type().clone();
                *ty = if ty.is_reference() {
                    inferred.reference_to()
                } else {
                    inferred
                };
            } else {
                self.coerce(init, ty);
            }
        }
        if ty.value_type().is_auto() {
            self.warn(name.span.wrap(Error::UnresolvedAuto(name.name)));
        }
        self.insert(Symbol::variable(*name, ty.clone()));
        Ok(())
    }

    fn analyze_return(&mut self, expr: Option<&mut Expr>) -> Result<()> {
        let Some(expr) = expr else {
            return Ok(());
        };
        self.analyze_expr(expr)?;
        if let Some(ret) = self.returns.last().cloned() {
            if !ret.is_auto() {
                self.coerce(expr, &ret);
            }
        }
        Ok(())
    }

    fn analyze_expr(&mut self, expr: &mut Expr) -> Result<()> {
        match &mut expr.kind {
            ExprKind::Assignment { target, value } => {
                self.analyze_expr(target)?;
                self.analyze_expr(value)?;
                let target_ty = target.ty.value_type().clone();
                self.coerce(value, &target_ty);
            }
            ExprKind::Block(stmts) => self.analyze_block(stmts, false)?,
            ExprKind::Call { callee, args } => {
                self.analyze_expr(callee)?;
                for arg in args.iter_mut() {
                    self.analyze_expr(arg)?;
                }
                self.check_call(callee, args, expr.span);
            }
            ExprKind::Binary { lhs, rhs, .. } => {
                self.analyze_expr(lhs)?;
                self.analyze_expr(rhs)?;
                self.unify_operands(lhs, rhs);
            }
            ExprKind::Unary { expr: inner, .. } | ExprKind::Cast(inner) => {
                self.analyze_expr(inner)?;
            }
            ExprKind::Symbol(ident) => {
                self.lookup(*ident)?;
            }
            ExprKind::Value(_) => {}
        }
        expr.ty = self.get_type(expr);
        Ok(())
    }

    fn check_call(&mut self, callee: &Expr, args: &mut [Expr], span: Span) {
        let Type::Function { params, .. } = callee.ty.value_type().clone() else {
            if !callee.ty.is_auto() {
                self.warn(callee.span.wrap(Error::NotCallable(callee.ty.clone())));
            }
            return;
        };
        if params.len() != args.len() {
            let error = Error::ArgumentCountMismatch {
                expected: params.len(),
                actual: args.len(),
            };
            self.warn(span.wrap(error));
        }
        for (arg, param) in args.iter_mut().zip(&params) {
            // Pointers are passed as the place they point to.
            if arg.ty.value_type().is_pointer() && !param.value_type().is_pointer() {
                arg.rewrite(|arg| {
                    let ty = arg.ty.value_type().pointee().cloned().unwrap_or(Type::Auto);
                    Expr {
                        span: arg.span,
                        kind: ExprKind::Unary {
                            op: UnaryOp::Deref,
                            expr: Box::new(arg),
                        },
                        ty,
                    }
                });
            }
            self.coerce(arg, param);
        }
    }

    /// Brings both operands of a binary expression to a common type.
    fn unify_operands(&mut self, lhs: &mut Expr, rhs: &mut Expr) {
        let l = lhs.ty.value_type().clone();
        let r = rhs.ty.value_type().clone();
        if l == r || l.is_auto() || r.is_auto() {
            return;
        }
        if fold_value(rhs, &l) || fold_value(lhs, &r) {
            return;
        }
        if l.widens_to(&r) {
            self.coerce(lhs, &r);
        } else if r.widens_to(&l) {
            self.coerce(rhs, &l);
        } else if !(l.is_pointer() && r.is_integer()) {
            let error = Error::TypeMismatch {
                expected: l,
                actual: r,
            };
            self.warn(rhs.span.wrap(error));
        }
    }

    /// Converts `expr` to `target`, folding constants and inserting a cast
    /// where the conversion widens. Anything else is a mismatch.
    fn coerce(&mut self, expr: &mut Expr, target: &Type) {
        let wanted = target.value_type();
        let actual = expr.ty.value_type();
        if actual == wanted || actual.is_auto() || wanted.is_auto() {
            return;
        }
        if fold_value(expr, wanted) {
            return;
        }
        if !target.is_reference() && expr.ty.value_type().widens_to(wanted) {
            self.trace(format_args!("cast {} to {wanted}", expr.ty));
            let wanted = wanted.clone();
            expr.rewrite(|inner| Expr {
                span: inner.span,
                kind: ExprKind::Cast(Box::new(inner)),
                ty: wanted,
            });
            return;
        }
        let error = Error::TypeMismatch {
            expected: target.clone(),
            actual: expr.ty.clone(),
        };
        self.warn(expr.span.wrap(error));
    }

    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.push_scope();
        let result = f(self);
        self.pop_scope();
        result
    }

    fn innermost(&self) -> &Scope {
        self.scopes.last().unwrap_or(&self.globals)
    }

    /// Inserts without the redeclaration check.
    fn bind(&mut self, symbol: Symbol) {
        self.trace(format_args!(
            "bind {}: {}",
            self.idents.get(symbol.name),
            symbol.ty
        ));
        let scope = match self.scopes.last_mut() {
            Some(scope) => scope,
            None => &mut self.globals,
        };
        scope.insert(symbol.name, symbol);
    }

    fn warn(&mut self, error: Spanned<Error>) {
        if self.options.trace {
            let ctx = Context::new(self.idents);
            self.trace(format_args!("warning {:#}", error.display(&ctx)));
        }
        self.errors.push(error);
    }

    fn trace(&self, message: std::fmt::Arguments<'_>) {
        if self.options.trace {
            eprintln!("{}{message}", ".  ".repeat(self.depth));
        }
    }
}

/// The type a function body evaluates to.
fn body_type(body: &Stmt) -> Type {
    match &body.kind {
        StmtKind::Expr(expr @ Expr {
            kind: ExprKind::Block(_),
            ..
        }) => expr.ty.clone(),
        StmtKind::Return(Some(expr)) => expr.ty.value_type().clone(),
        _ => Type::Void,
    }
}

/// Replaces a constant by its conversion to `target`, if it has one.
fn fold_value(expr: &mut Expr, target: &Type) -> bool {
    let ExprKind::Value(value) = &expr.kind else {
        return false;
    };
    let Some(folded) = value.convert(target) else {
        return false;
    };
    expr.kind = ExprKind::Value(folded);
    expr.ty = target.clone();
    true
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Aborts the analysis.
    UnresolvedSymbol(Name),
    TypeMismatch {
        expected: Type,
        actual: Type,
    },
    Redeclaration {
        name: Name,
        previous: Span,
    },
    /// A type left as `auto` which could not be inferred.
    UnresolvedAuto(Name),
    ArgumentCountMismatch {
        expected: usize,
        actual: usize,
    },
    NotCallable(Type),
}
