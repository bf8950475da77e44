use crate::{
    ast::{
        BinaryOp, Expr, ExprKind, Function, Ident, Prototype, Root, Stmt, StmtKind, UnaryOp,
        Variable,
    },
    codegen::{Backend, Error, NumericClass},
    token::{Span, Spanned},
    types::Type,
    util::intern::Interner,
};

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

pub struct Generator<'a, B> {
    backend: &'a mut B,
    idents: &'a Interner,
    /// Return types of the functions being emitted.
    returns: Vec<Type>,
}

impl<'a, B: Backend> Generator<'a, B> {
    pub fn new(backend: &'a mut B, idents: &'a Interner) -> Generator<'a, B> {
        Generator {
            backend,
            idents,
            returns: Vec::new(),
        }
    }

    pub fn generate(mut self, root: &Root) -> Result<()> {
        for stmt in &root.stmts {
            self.g_stmt(stmt)?;
        }
        Ok(())
    }

    fn g_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match &stmt.kind {
            StmtKind::Prototype(proto) => {
                self.g_prototype(proto)?;
            }
            StmtKind::Function(function) => self.g_function(function)?,
            StmtKind::Variable(variable) => self.g_variable(variable)?,
            StmtKind::Return(expr) => self.g_return(expr.as_ref())?,
            StmtKind::Expr(expr) => {
                self.g_expr(expr)?;
            }
        }
        Ok(())
    }

    fn g_prototype(&mut self, proto: &Prototype) -> Result<B::Value> {
        let ty = self.lower(&proto.fn_type(), proto.name.span)?;
        let name = self.idents.get(proto.name.name);
        Ok(self.backend.declare_function(name, ty))
    }

    fn g_function(&mut self, function: &Function) -> Result<()> {
        let Function { proto, body } = function;
        let callee = self.g_prototype(proto)?;
        let args = self.backend.begin_function(&callee, proto.params.len());
        self.backend.enter_scope();
        self.returns.push(proto.ret.clone());

        let result = self.g_params(proto, args).and_then(|()| self.g_body(body));

        self.returns.pop();
        self.backend.exit_scope();
        self.backend.finish_function(&callee);
        result
    }

    fn g_body(&mut self, body: &Stmt) -> Result<()> {
        match &body.kind {
            StmtKind::Expr(Expr {
                kind: ExprKind::Block(stmts),
                ..
            }) => self.g_block(stmts, true).map(drop),
            _ => self.g_stmt(body),
        }
    }

    /// Emits `stmts` in a new scope. Unless the block is a function body, its
    /// trailing return yields the value of the block instead of returning.
    fn g_block(&mut self, stmts: &[Stmt], body: bool) -> Result<Option<B::Value>> {
        self.backend.enter_scope();
        let result = self.g_block_stmts(stmts, body);
        self.backend.exit_scope();
        result
    }

    fn g_block_stmts(&mut self, stmts: &[Stmt], body: bool) -> Result<Option<B::Value>> {
        let Some((last, init)) = stmts.split_last() else {
            return Ok(None);
        };
        for stmt in init {
            self.g_stmt(stmt)?;
        }
        match &last.kind {
            StmtKind::Return(Some(expr)) if !body => self.g_expr(expr),
            _ => self.g_stmt(last).map(|()| None),
        }
    }

    /// Reference parameters alias the incoming address; the others get a
    /// local copy.
    fn g_params(&mut self, proto: &Prototype, args: Vec<B::Value>) -> Result<()> {
        for (param, arg) in proto.params.iter().zip(args) {
            let Some(name) = param.name else {
                continue;
            };
            let name = self.idents.get(name.name);
            let ty = param.effective_ty();
            if ty.is_reference() {
                self.backend.bind(name, arg);
            } else {
                let ty = self.lower(&ty, param.span)?;
                let address = self.backend.declare_variable(name, ty);
                self.backend.store(arg, address);
            }
        }
        Ok(())
    }

    fn g_variable(&mut self, variable: &Variable) -> Result<()> {
        let Variable { name, ty, init } = variable;
        let name_str = self.idents.get(name.name);
        match init {
            Some(init) if ty.is_reference() => {
                let address = self.g_reference(init)?;
                self.backend.bind(name_str, address);
            }
            _ => {
                let value = init.as_ref().map(|init| self.g_value(init)).transpose()?;
                let lowered = self.lower(ty.value_type(), name.span)?;
                let address = self.backend.declare_variable(name_str, lowered);
                if let Some(value) = value {
                    self.backend.store(value, address);
                }
            }
        }
        Ok(())
    }

    fn g_return(&mut self, expr: Option<&Expr>) -> Result<()> {
        let returns_reference = self.returns.last().is_some_and(Type::is_reference);
        let value = match expr {
            Some(expr) if returns_reference => Some(self.g_address(expr)?),
            Some(expr) => Some(self.g_value(expr)?),
            None => None,
        };
        self.backend.ret(value);
        Ok(())
    }

    /// Emits `expr`, which must produce a value.
    fn g_value(&mut self, expr: &Expr) -> Result<B::Value> {
        self.g_expr(expr)?
            .ok_or_else(|| expr.span.wrap(Error::VoidValue))
    }

    fn g_expr(&mut self, expr: &Expr) -> Result<Option<B::Value>> {
        let value = match &expr.kind {
            ExprKind::Assignment { target, value } => {
                let address = self.g_address(target)?;
                let value = self.g_value(value)?;
                self.backend.store(value.clone(), address);
                value
            }
            ExprKind::Block(stmts) => return self.g_block(stmts, false),
            ExprKind::Call { callee, args } => {
                let result = self.g_call(callee, args)?;
                match &expr.ty {
                    Type::Void => return Ok(None),
                    Type::Reference(referee) => {
                        let ty = self.lower(referee, expr.span)?;
                        self.backend.load(ty, result)
                    }
                    _ => result,
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let class = self.class(&expr.ty, expr.span)?;
                let lhs = self.g_value(lhs)?;
                let rhs = self.g_value(rhs)?;
                self.backend.binary(*op, class, lhs, rhs)
            }
            ExprKind::Unary { op, expr: inner } => self.g_unary(expr, *op, inner)?,
            ExprKind::Cast(inner) => {
                let from = self.class(&inner.ty, inner.span)?;
                let to = self.class(&expr.ty, expr.span)?;
                let value = self.g_value(inner)?;
                let to_ty = self.lower(&expr.ty, expr.span)?;
                self.backend.cast(value, from, to_ty, to)
            }
            ExprKind::Symbol(ident) => {
                let resolved = self.resolve(*ident)?;
                if expr.ty.is_function() {
                    resolved
                } else {
                    let ty = self.lower(expr.ty.value_type(), expr.span)?;
                    self.backend.load(ty, resolved)
                }
            }
            ExprKind::Value(value) => value.lower(&mut *self.backend),
        };
        Ok(Some(value))
    }

    fn g_unary(&mut self, expr: &Expr, op: UnaryOp, inner: &Expr) -> Result<B::Value> {
        match op {
            UnaryOp::AddressOf => self.g_address(inner),
            UnaryOp::Deref => {
                let pointer = self.g_value(inner)?;
                let ty = self.lower(&expr.ty, expr.span)?;
                Ok(self.backend.load(ty, pointer))
            }
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
                let address = self.g_address(inner)?;
                let value_ty = inner.ty.value_type();
                let class = self.class(value_ty, inner.span)?;
                let ty = self.lower(value_ty, inner.span)?;
                let old = self.backend.load(ty.clone(), address.clone());
                let one = match class {
                    NumericClass::Float => self.backend.const_float(ty, 1.0),
                    NumericClass::Pointer => {
                        let offset = self.backend.int_ty(64, true);
                        self.backend.const_int(offset, 1)
                    }
                    NumericClass::SignedInt | NumericClass::UnsignedInt => {
                        self.backend.const_int(ty, 1)
                    }
                };
                let arith = match op {
                    UnaryOp::PreInc | UnaryOp::PostInc => BinaryOp::Add,
                    _ => BinaryOp::Sub,
                };
                let new = self.backend.binary(arith, class, old.clone(), one);
                self.backend.store(new.clone(), address);
                Ok(if op.is_postfix() { old } else { new })
            }
        }
    }

    /// Emits the call and returns its raw result, which is an address for
    /// functions returning a reference.
    fn g_call(&mut self, callee: &Expr, args: &[Expr]) -> Result<B::Value> {
        let params = match callee.ty.value_type() {
            Type::Function { params, .. } => params.as_slice(),
            _ => &[],
        };
        let function = self.g_value(callee)?;
        let mut values = Vec::with_capacity(args.len());
        for (idx, arg) in args.iter().enumerate() {
            let value = if params.get(idx).is_some_and(Type::is_reference) {
                self.g_reference(arg)?
            } else {
                self.g_value(arg)?
            };
            values.push(value);
        }
        Ok(self.backend.call(function, values))
    }

    /// Emits the address of a place expression.
    fn g_address(&mut self, expr: &Expr) -> Result<B::Value> {
        match &expr.kind {
            ExprKind::Symbol(ident) if !expr.ty.is_function() => self.resolve(*ident),
            ExprKind::Unary {
                op: UnaryOp::Deref,
                expr: inner,
            } => self.g_value(inner),
            ExprKind::Call { callee, args } if expr.ty.is_reference() => self.g_call(callee, args),
            _ => Err(expr.span.wrap(Error::NotAssignable)),
        }
    }

    /// Like [`Generator::g_address`], but values that are not places are
    /// spilled to an anonymous slot.
    fn g_reference(&mut self, expr: &Expr) -> Result<B::Value> {
        if is_place(expr) {
            return self.g_address(expr);
        }
        let value = self.g_value(expr)?;
        let ty = self.lower(expr.ty.value_type(), expr.span)?;
        let slot = self.backend.declare_variable("", ty);
        self.backend.store(value, slot.clone());
        Ok(slot)
    }

    fn resolve(&mut self, ident: Ident) -> Result<B::Value> {
        let name = self.idents.get(ident.name);
        self.backend
            .resolve(name)
            .ok_or_else(|| ident.span.wrap(Error::UnknownSymbol(ident.name)))
    }

    fn lower(&mut self, ty: &Type, span: Span) -> Result<B::Ty> {
        ty.lower(&mut *self.backend)
            .ok_or_else(|| span.wrap(Error::UnresolvedType))
    }

    #[allow(clippy::unused_self)]
    fn class(&self, ty: &Type, span: Span) -> Result<NumericClass> {
        match ty.value_type() {
            Type::U8 => Ok(NumericClass::UnsignedInt),
            Type::I32 | Type::I64 => Ok(NumericClass::SignedInt),
            Type::F64 => Ok(NumericClass::Float),
            Type::Pointer(_) | Type::Literal | Type::Function { .. } => Ok(NumericClass::Pointer),
            Type::Void => Err(span.wrap(Error::VoidValue)),
            Type::Reference(_) | Type::Auto => Err(span.wrap(Error::UnresolvedType)),
        }
    }
}

fn is_place(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Symbol(_) => !expr.ty.is_function(),
        ExprKind::Unary {
            op: UnaryOp::Deref,
            ..
        } => true,
        ExprKind::Call { .. } => expr.ty.is_reference(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        analyzer::{self, Options},
        codegen::{generate, test_utils::Recorder},
        parser::test_utils::parse_root,
    };

    fn emit(src: &str, analyze: bool) -> Result<String> {
        let (i, mut root) = parse_root(src);
        if analyze {
            analyzer::analyze(&mut root, &i, Options::default()).expect("fatal analysis error");
        }
        let mut recorder = Recorder::default();
        generate(&mut recorder, &i, &root)?;
        let mut log = recorder.log.join("\n");
        log.push('\n');
        Ok(log)
    }

    #[test]
    fn variables_and_return() {
        let log = emit("x: i64 = 5; ret x + 1;", true);
        let expected = indoc! {"
            %x.addr = alloca i64
            store i64 5, %x.addr
            %0 = load i64, %x.addr
            %1 = Add SignedInt %0, i64 1
            ret %1
        "};
        assert_eq!(log.as_deref(), Ok(expected));
    }

    #[test]
    fn reference_parameters_alias_arguments() {
        let log = emit("inc(n: i64) -> void { n = n + 1; } v: i64 = 1; inc(v); inc(2);", true);
        let expected = indoc! {"
            declare @inc: fn(i64*) -> void
            begin @inc
            %0 = load i64, %arg0
            %1 = Add SignedInt %0, i64 1
            store %1, %arg0
            end @inc
            %v.addr = alloca i64
            store i64 1, %v.addr
            %2 = call @inc(%v.addr)
            %3 = alloca i64
            store i64 2, %3
            %4 = call @inc(%3)
        "};
        assert_eq!(log.as_deref(), Ok(expected));
    }

    #[test]
    fn by_value_parameters_are_copied() {
        let log = emit("id(n: i64!) -> i64 { ret n; }", true);
        let expected = indoc! {"
            declare @id: fn(i64) -> i64
            begin @id
            %n.addr = alloca i64
            store %arg0, %n.addr
            %0 = load i64, %n.addr
            ret %0
            end @id
        "};
        assert_eq!(log.as_deref(), Ok(expected));
    }

    #[test]
    fn pointers_and_increments() {
        let log = emit("v: i32 = 1; p: i32* = &v; *p = v++;", true);
        let expected = indoc! {"
            %v.addr = alloca i32
            store i32 1, %v.addr
            %p.addr = alloca i32*
            store %v.addr, %p.addr
            %0 = load i32*, %p.addr
            %1 = load i32, %v.addr
            %2 = Add SignedInt %1, i32 1
            store %2, %v.addr
            store %1, %0
        "};
        assert_eq!(log.as_deref(), Ok(expected));
    }

    #[test]
    fn widening_casts() {
        let log = emit("a: i32 = 1; b: f64 = a;", true);
        let expected = indoc! {"
            %a.addr = alloca i32
            store i32 1, %a.addr
            %0 = load i32, %a.addr
            %1 = cast %0 SignedInt to f64 Float
            %b.addr = alloca f64
            store %1, %b.addr
        "};
        assert_eq!(log.as_deref(), Ok(expected));
    }

    #[test]
    fn literals_are_unescaped() {
        let log = emit("s: literal = \"a\\tb\";", true);
        let expected = indoc! {r#"
            %s.addr = alloca u8*
            store "a\tb", %s.addr
        "#};
        assert_eq!(log.as_deref(), Ok(expected));
    }

    #[test]
    fn value_blocks_yield_their_trailing_expression() {
        let log = emit("f() -> i64 { x: i64 = { 5 }; ret x; }", true);
        let expected = indoc! {"
            declare @f: fn() -> i64
            begin @f
            %x.addr = alloca i64
            store i64 5, %x.addr
            %0 = load i64, %x.addr
            ret %0
            end @f
        "};
        assert_eq!(log.as_deref(), Ok(expected));
    }

    #[test]
    fn statement_blocks_discard_their_value() {
        let log = emit("g() -> void { { 1 } ret; }", true);
        let expected = indoc! {"
            declare @g: fn() -> void
            begin @g
            ret
            end @g
        "};
        assert_eq!(log.as_deref(), Ok(expected));
    }

    #[test]
    fn errors() {
        let error = |src, analyze| emit(src, analyze).map_err(|error| error.inner);
        assert_eq!(error("u: auto;", true), Err(Error::UnresolvedType));
        assert_eq!(error("1 = 2;", true), Err(Error::NotAssignable));
        assert_eq!(
            error("f() -> void { } x: i64 = f();", true),
            Err(Error::VoidValue)
        );
        assert!(matches!(error("y;", false), Err(Error::UnknownSymbol(_))));
    }
}
