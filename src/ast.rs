// root      ::= (stmt)*
// stmt      ::= function | variable | return | expr
// function  ::= IDENT '(' [param (',' param)*] ')' (':' | '->') type (';' | stmt)
// param     ::= [IDENT (':' | '->')] type ['!']
// variable  ::= IDENT (':' | '->') type ['=' expr]
// return    ::= 'ret' [expr]
// expr      ::= additive ['=' expr]
// additive  ::= mult (('+' | '-') mult)*
// mult      ::= power (('*' | '/') power)*
// power     ::= unary ('^' unary)*
// unary     ::= '&' unary | '*' unary | ('++' | '--') unary | postfix
// postfix   ::= call ('++' | '--')*
// call      ::= primary ('(' [expr (',' expr)*] ')')*
// primary   ::= IDENT | NUMBER | LITERAL | '(' expr ')' | '{' (stmt)* '}'
// type      ::= ['&'] [IDENT ('*')*]

use crate::{
    token::Span,
    types::Type,
    util::{
        fmt::{Context, Show},
        intern::Name,
    },
    value::Value,
};

#[derive(Debug, PartialEq, Default)]
pub struct Root {
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub enum StmtKind {
    Prototype(Prototype),
    Function(Function),
    Variable(Variable),
    Return(Option<Expr>),
    Expr(Expr),
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Stmt {
        Stmt { kind, span }
    }

    /// Whether this statement ends with a block, in which case no `;` is
    /// required after it.
    pub fn is_block_like(&self) -> bool {
        match &self.kind {
            StmtKind::Expr(expr) => matches!(expr.kind, ExprKind::Block(_)),
            StmtKind::Function(function) => function.body.is_block_like(),
            _ => false,
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Prototype {
    pub name: Ident,
    pub params: Vec<Param>,
    pub ret: Type,
}

impl Prototype {
    /// The function type, with the effective parameter types.
    pub fn fn_type(&self) -> Type {
        let params = self.params.iter().map(Param::effective_ty).collect();
        Type::function(self.ret.clone(), params)
    }
}

#[derive(Debug, PartialEq)]
pub struct Function {
    pub proto: Prototype,
    pub body: Box<Stmt>,
}

#[derive(Debug, PartialEq)]
pub struct Param {
    pub name: Option<Ident>,
    /// The type as written.
    pub ty: Type,
    /// Set by a trailing `!`.
    pub by_value: bool,
    pub span: Span,
}

impl Param {
    /// Parameters are passed by reference unless marked by-value.
    pub fn effective_ty(&self) -> Type {
        if self.by_value || self.ty.is_reference() {
            self.ty.clone()
        } else {
            self.ty.clone().reference_to()
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Variable {
    pub name: Ident,
    pub ty: Type,
    pub init: Option<Expr>,
}

#[derive(Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    /// `Auto` until the analyzer resolves it.
    pub ty: Type,
}

#[derive(Debug, PartialEq)]
pub enum ExprKind {
    Assignment {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Block(Vec<Stmt>),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    /// Implicit conversion to the expression's own `ty`.
    Cast(Box<Expr>),
    Symbol(Ident),
    Value(Value),
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Expr {
        Expr {
            kind,
            span,
            ty: Type::Auto,
        }
    }

    /// An empty block, used where a node is needed but none could be parsed.
    pub fn empty(span: Span) -> Expr {
        Expr::new(ExprKind::Block(Vec::new()), span)
    }

    /// Replaces this node by the one returned from `f`, which receives the
    /// current node by value.
    pub fn rewrite(&mut self, f: impl FnOnce(Expr) -> Expr) {
        let span = self.span;
        let old = std::mem::replace(self, Expr::empty(span));
        *self = f(old);
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    AddressOf,
    Deref,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl UnaryOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            UnaryOp::AddressOf => "&",
            UnaryOp::Deref => "*",
            UnaryOp::PreInc | UnaryOp::PostInc => "++",
            UnaryOp::PreDec | UnaryOp::PostDec => "--",
        }
    }

    pub const fn is_postfix(self) -> bool {
        matches!(self, UnaryOp::PostInc | UnaryOp::PostDec)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Ident {
    pub name: Name,
    pub span: Span,
}

// Canonical textual forms.

impl Show for Root {
    fn show(&self, f: &mut std::fmt::Formatter<'_>, ctx: &Context<'_>) -> std::fmt::Result {
        for (idx, stmt) in self.stmts.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            stmt.show(f, ctx)?;
        }
        Ok(())
    }
}

impl Show for Stmt {
    fn show(&self, f: &mut std::fmt::Formatter<'_>, ctx: &Context<'_>) -> std::fmt::Result {
        match &self.kind {
            StmtKind::Prototype(proto) => proto.show(f, ctx),
            StmtKind::Function(Function { proto, body }) => {
                proto.show(f, ctx)?;
                f.write_str(" ")?;
                body.show(f, ctx)
            }
            StmtKind::Variable(Variable { name, ty, init }) => {
                write!(f, "{}: {ty}", ctx.idents.get(name.name))?;
                if let Some(init) = init {
                    f.write_str(" = ")?;
                    init.show(f, ctx)?;
                }
                Ok(())
            }
            StmtKind::Return(Some(expr)) => {
                f.write_str("ret ")?;
                expr.show(f, ctx)
            }
            StmtKind::Return(None) => f.write_str("ret"),
            StmtKind::Expr(expr) => expr.show(f, ctx),
        }
    }
}

impl Show for Prototype {
    fn show(&self, f: &mut std::fmt::Formatter<'_>, ctx: &Context<'_>) -> std::fmt::Result {
        write!(f, "{}(", ctx.idents.get(self.name.name))?;
        for (idx, param) in self.params.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            if let Some(name) = param.name {
                write!(f, "{}: ", ctx.idents.get(name.name))?;
            }
            write!(f, "{}", param.ty)?;
            if param.by_value {
                f.write_str("!")?;
            }
        }
        write!(f, ") -> {}", self.ret)
    }
}

impl Show for Expr {
    fn show(&self, f: &mut std::fmt::Formatter<'_>, ctx: &Context<'_>) -> std::fmt::Result {
        match &self.kind {
            ExprKind::Assignment { target, value } => {
                f.write_str("(")?;
                target.show(f, ctx)?;
                f.write_str(" = ")?;
                value.show(f, ctx)?;
                f.write_str(")")
            }
            ExprKind::Block(stmts) => {
                f.write_str("{ ")?;
                for stmt in stmts {
                    stmt.show(f, ctx)?;
                    f.write_str("; ")?;
                }
                f.write_str("}")
            }
            ExprKind::Call { callee, args } => {
                callee.show(f, ctx)?;
                f.write_str("(")?;
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    arg.show(f, ctx)?;
                }
                f.write_str(")")
            }
            ExprKind::Binary { op, lhs, rhs } => {
                f.write_str("(")?;
                lhs.show(f, ctx)?;
                write!(f, " {} ", op.as_str())?;
                rhs.show(f, ctx)?;
                f.write_str(")")
            }
            ExprKind::Unary { op, expr } if op.is_postfix() => {
                f.write_str("(")?;
                expr.show(f, ctx)?;
                write!(f, "{})", op.as_str())
            }
            ExprKind::Unary { op, expr } => {
                write!(f, "({}", op.as_str())?;
                expr.show(f, ctx)?;
                f.write_str(")")
            }
            ExprKind::Cast(expr) => {
                f.write_str("(")?;
                expr.show(f, ctx)?;
                write!(f, " as {})", self.ty)
            }
            ExprKind::Symbol(ident) => f.write_str(ctx.idents.get(ident.name)),
            ExprKind::Value(value) => write!(f, "{value}"),
        }
    }
}
