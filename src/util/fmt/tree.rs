use std::io::Write;

use crate::{
    ast::*,
    token::Span,
    util::{
        fmt::{Context, Show},
        intern::Interner,
    },
};

const INDENT_WIDTH: usize = 2;

pub fn print_root_string(idents: &Interner, root: &Root) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_root(&mut buf, idents, root).expect("writing to a vec can't fail");
    String::from_utf8(buf).expect("tree is valid utf-8")
}

pub fn print_expr_string(idents: &Interner, expr: &Expr) -> String {
    let mut buf = Vec::with_capacity(512);
    print_expr(&mut buf, idents, 0, expr).expect("writing to a vec can't fail");
    String::from_utf8(buf).expect("tree is valid utf-8")
}

pub fn print_root(w: &mut impl Write, idents: &Interner, root: &Root) -> std::io::Result<()> {
    for stmt in &root.stmts {
        print_stmt(w, idents, 0, stmt)?;
    }
    Ok(())
}

pub fn print_stmt(
    w: &mut impl Write,
    idents: &Interner,
    i: usize,
    stmt: &Stmt,
) -> std::io::Result<()> {
    let ctx = Context::new(idents);
    let span = Range(stmt.span);
    match &stmt.kind {
        StmtKind::Prototype(proto) => {
            sp(w, i)?;
            writeln!(w, "prototype {} ({span})", proto.display(&ctx))?;
        }
        StmtKind::Function(Function { proto, body }) => {
            sp(w, i)?;
            writeln!(w, "function {} ({span})", proto.display(&ctx))?;
            print_stmt(w, idents, i + 1, body)?;
        }
        StmtKind::Variable(Variable { name, ty, init }) => {
            sp(w, i)?;
            writeln!(w, "variable {}: {ty} ({span})", idents.get(name.name))?;
            if let Some(init) = init {
                print_expr(w, idents, i + 1, init)?;
            }
        }
        StmtKind::Return(expr) => {
            sp(w, i)?;
            writeln!(w, "return ({span})")?;
            if let Some(expr) = expr {
                print_expr(w, idents, i + 1, expr)?;
            }
        }
        StmtKind::Expr(expr) => print_expr(w, idents, i, expr)?,
    }
    Ok(())
}

pub fn print_expr(
    w: &mut impl Write,
    idents: &Interner,
    i: usize,
    expr: &Expr,
) -> std::io::Result<()> {
    sp(w, i)?;
    let span = Range(expr.span);
    // Inferred type, for analyzed trees.
    let info = if expr.ty.is_auto() {
        String::new()
    } else {
        format!(" %: {}", expr.ty)
    };
    match &expr.kind {
        ExprKind::Assignment { target, value } => {
            writeln!(w, "assignment ({span}{info})")?;
            print_expr(w, idents, i + 1, target)?;
            print_expr(w, idents, i + 1, value)?;
        }
        ExprKind::Block(stmts) => {
            writeln!(w, "block ({span}{info})")?;
            for stmt in stmts {
                print_stmt(w, idents, i + 1, stmt)?;
            }
        }
        ExprKind::Call { callee, args } => {
            writeln!(w, "call ({span}{info})")?;
            print_expr(w, idents, i + 1, callee)?;
            if !args.is_empty() {
                sp(w, i + 1)?;
                writeln!(w, "arguments")?;
                for arg in args {
                    print_expr(w, idents, i + 2, arg)?;
                }
            }
        }
        ExprKind::Binary { op, lhs, rhs } => {
            writeln!(w, "binary {op:?} ({span}{info})")?;
            print_expr(w, idents, i + 1, lhs)?;
            print_expr(w, idents, i + 1, rhs)?;
        }
        ExprKind::Unary {
            op,
            expr: inner_expr,
        } => {
            writeln!(w, "unary {op:?} ({span}{info})")?;
            print_expr(w, idents, i + 1, inner_expr)?;
        }
        ExprKind::Cast(inner_expr) => {
            writeln!(w, "cast ({span}{info})")?;
            print_expr(w, idents, i + 1, inner_expr)?;
        }
        ExprKind::Symbol(ident) => {
            writeln!(w, "ident {} ({span}{info})", idents.get(ident.name))?;
        }
        ExprKind::Value(value) => {
            writeln!(w, "value {value} ({span}{info})")?;
        }
    }
    Ok(())
}

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}

/// Byte range of a span, as printed in trees.
struct Range(Span);

impl std::fmt::Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.0.lo, self.0.hi())
    }
}
