use crate::{
    ast::{
        BinaryOp, Expr, ExprKind, Function, Ident, Param, Prototype, Root, Stmt, StmtKind,
        UnaryOp, Variable,
    },
    lexer::{self, extract},
    token::{Keyword, Span, Spanned, Token, TokenKind, KEYWORDS},
    types::Type,
    util::intern::{Interner, Name},
    value::Value,
};

type Result<T, E = ()> = std::result::Result<T, E>;

pub type ParseResult<T> = Result<T, (T, Vec<Spanned<Error>>)>;

pub fn parse_root(src: &str, tokens: &mut Vec<Token>, idents: &mut Interner) -> ParseResult<Root> {
    parse(src, tokens, idents, Parser::parse_root, |_| Root::default())
}

pub fn parse_expr(src: &str, tokens: &mut Vec<Token>, idents: &mut Interner) -> ParseResult<Expr> {
    parse(src, tokens, idents, Parser::parse_lone_expr, Expr::empty)
}

fn parse<'src, 'tok, 'ident, T>(
    src: &'src str,
    tokens: &'tok mut Vec<Token>,
    idents: &'ident mut Interner,
    f: impl for<'a> FnOnce(&'a mut Parser<'src, 'tok, 'ident>) -> Result<T>,
    default: impl FnOnce(Span) -> T,
) -> ParseResult<T> {
    assert!(tokens.is_empty(), "must pass clean tokens buffer");

    // Lex and parse
    let mut lex_errors = Vec::new();
    lexer::lex(src, tokens, &mut lex_errors);
    let mut p = Parser::new(src, tokens, idents);
    p.errors.extend(
        lex_errors
            .into_iter()
            .map(|Spanned { span, inner }| span.wrap(Error::Lexer(inner))),
    );
    let parse_result = f(&mut p);

    // Error handling
    let success = parse_result.is_ok();
    let el = parse_result.unwrap_or_else(|()| default(p.peek().span));
    if p.errors.is_empty() {
        assert!(success);
        Ok(el)
    } else {
        Err((el, p.errors))
    }
}

struct Parser<'src, 'tok, 'ident> {
    src: &'src str,
    tokens: &'tok [Token],
    idents: &'ident mut Interner,
    cursor: usize,
    errors: Vec<Spanned<Error>>,
}

impl Parser<'_, '_, '_> {
    fn parse_root(&mut self) -> Result<Root> {
        let mut stmts = Vec::with_capacity(16);
        while self.except([]) {
            if self.take(TokenKind::Semicolon) {
                continue;
            }
            if let Ok(stmt) =
                self.synchronize(&[TokenKind::Semicolon], &[], Parser::parse_terminated_stmt)
            {
                stmts.push(stmt);
            }
        }
        self.consume(TokenKind::Eof)?;
        Ok(Root { stmts })
    }

    /// Parses an expression which must span the whole input.
    fn parse_lone_expr(&mut self) -> Result<Expr> {
        let expr = self.parse_expr()?;
        self.consume(TokenKind::Eof)?;
        Ok(expr)
    }

    /// Parses a statement and the `;` which must follow it, unless it ends
    /// with a block.
    fn parse_terminated_stmt(&mut self) -> Result<Stmt> {
        let stmt = self.parse_stmt()?;
        if !stmt.is_block_like() {
            self.consume(TokenKind::Semicolon)?;
        }
        Ok(stmt)
    }

    fn parse_stmt(&mut self) -> Result<Stmt> {
        let token = self.peek();
        if token.kind == TokenKind::Identifier {
            if self.keyword(token) == Some(Keyword::Ret) {
                return self.parse_return();
            }
            match self.peek_nth(1).kind {
                TokenKind::LParen if self.is_function_decl() => return self.parse_function(),
                TokenKind::Colon | TokenKind::Arrow => return self.parse_variable(),
                _ => {}
            }
        }
        let expr = self.parse_expr()?;
        let span = expr.span;
        Ok(Stmt::new(StmtKind::Expr(expr), span))
    }

    /// Decides whether the `IDENT (` at the cursor starts a function
    /// declaration or a call expression. Scans through the balanced
    /// parentheses and inspects the following token: `:` or `->` mark a
    /// declaration. The cursor is always rewound to where it started; this is
    /// the only backtracking point of the grammar.
    fn is_function_decl(&mut self) -> bool {
        let start = self.mark();
        self.advance(); // Name
        let mut depth = 0_usize;
        let is_decl = loop {
            match self.advance().kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        break matches!(self.peek().kind, TokenKind::Colon | TokenKind::Arrow);
                    }
                }
                TokenKind::Eof => break false,
                _ => {}
            }
        };
        self.rewind(start);
        is_decl
    }

    fn parse_function(&mut self) -> Result<Stmt> {
        let name = self.parse_ident()?;
        let open = self.consume(TokenKind::LParen)?;
        let params = self.parse_list(TokenKind::RParen, TokenKind::Comma, Parser::parse_param)?;
        self.consume_closing(TokenKind::RParen, open)?;
        self.consume_any(&[TokenKind::Colon, TokenKind::Arrow])?;
        let ret = self.parse_type()?;
        let proto = Prototype { name, params, ret };

        // A prototype; the caller consumes the `;`.
        if self.is(TokenKind::Semicolon) {
            let span = name.span.to(self.prev_span());
            return Ok(Stmt::new(StmtKind::Prototype(proto), span));
        }

        let body = self.parse_stmt()?;
        let span = name.span.to(body.span);
        let function = Function {
            proto,
            body: Box::new(body),
        };
        Ok(Stmt::new(StmtKind::Function(function), span))
    }

    fn parse_param(&mut self) -> Result<Param> {
        let start = self.peek().span;
        let name = if self.is(TokenKind::Identifier)
            && matches!(self.peek_nth(1).kind, TokenKind::Colon | TokenKind::Arrow)
        {
            let name = self.parse_ident()?;
            self.advance(); // `:` or `->`
            Some(name)
        } else {
            None
        };
        // A nameless parameter must at least spell its type.
        if name.is_none() && !self.is(TokenKind::BitAnd) && !self.is(TokenKind::Identifier) {
            let c = self.peek();
            self.error(c.span.wrap(Error::Unexpected {
                actual: c.kind,
                expected: TokenKind::Identifier,
            }));
            return Err(());
        }
        let ty = self.parse_type()?;
        let by_value = self.take(TokenKind::Exclamation);
        Ok(Param {
            name,
            ty,
            by_value,
            span: start.to(self.prev_span()),
        })
    }

    fn parse_variable(&mut self) -> Result<Stmt> {
        let name = self.parse_ident()?;
        let marker = self.consume_any(&[TokenKind::Colon, TokenKind::Arrow])?;
        let mut ty = self.parse_type()?;
        if marker.kind == TokenKind::Arrow && !ty.is_reference() {
            ty = ty.reference_to();
        }
        let init = if self.take(TokenKind::Equals) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let span = name.span.to(self.prev_span());
        Ok(Stmt::new(StmtKind::Variable(Variable { name, ty, init }), span))
    }

    fn parse_return(&mut self) -> Result<Stmt> {
        let keyword = self.advance();
        let expr = match self.peek().kind {
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof => None,
            _ => Some(self.parse_expr()?),
        };
        let span = keyword.span.to(self.prev_span());
        Ok(Stmt::new(StmtKind::Return(expr), span))
    }

    /// Parses `['&'] [IDENT ('*')*]`. If no type is spelled at all, the type
    /// is left to be inferred.
    fn parse_type(&mut self) -> Result<Type> {
        let is_ref = self.take(TokenKind::BitAnd);
        if !is_ref && !self.is(TokenKind::Identifier) {
            return Ok(Type::Auto);
        }
        let token = self.consume(TokenKind::Identifier)?;
        let lexeme = token.lexeme(self.src);
        let mut ty = if let Some(ty) = Type::from_name(lexeme) {
            ty
        } else {
            let name = self.idents.intern(lexeme);
            self.error(token.span.wrap(Error::UnknownType(name)));
            Type::Auto
        };
        while self.take(TokenKind::Star) {
            ty = ty.pointer_to();
        }
        Ok(if is_ref { ty.reference_to() } else { ty })
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        let token = self.consume(TokenKind::Identifier)?;
        Ok(self.ident(token))
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_assignment()
    }

    /// Assignment is right-associative: `a = b = 1` is `a = (b = 1)`.
    fn parse_assignment(&mut self) -> Result<Expr> {
        let target = self.parse_additive()?;
        if !self.take(TokenKind::Equals) {
            return Ok(target);
        }
        let value = self.parse_assignment()?;
        let span = target.span.to(value.span);
        let assignment = ExprKind::Assignment {
            target: Box::new(target),
            value: Box::new(value),
        };
        Ok(Expr::new(assignment, span))
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        self.parse_binary(
            &[
                (TokenKind::Plus, BinaryOp::Add),
                (TokenKind::Minus, BinaryOp::Sub),
            ],
            Parser::parse_multiplicative,
        )
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        self.parse_binary(
            &[
                (TokenKind::Star, BinaryOp::Mul),
                (TokenKind::Slash, BinaryOp::Div),
            ],
            Parser::parse_power,
        )
    }

    fn parse_power(&mut self) -> Result<Expr> {
        self.parse_binary(&[(TokenKind::Caret, BinaryOp::Pow)], Parser::parse_unary)
    }

    /// Parses a left-associative chain of the provided operators, delegating
    /// operands to the next (tighter) level.
    fn parse_binary(
        &mut self,
        ops: &[(TokenKind, BinaryOp)],
        next: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut lhs = next(self)?;
        while let Some(&(_, op)) = ops.iter().find(|(kind, _)| self.is(*kind)) {
            self.advance(); // Operator
            let rhs = next(self)?;
            let span = lhs.span.to(rhs.span);
            let binary = ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
            lhs = Expr::new(binary, span);
        }
        Ok(lhs)
    }

    /// Prefix operators: `&`, `*`, `++` and `--`.
    fn parse_unary(&mut self) -> Result<Expr> {
        let token = self.peek();
        let op = match token.kind {
            TokenKind::BitAnd => UnaryOp::AddressOf,
            TokenKind::Star => UnaryOp::Deref,
            TokenKind::PlusPlus => UnaryOp::PreInc,
            TokenKind::MinusMinus => UnaryOp::PreDec,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let expr = self.parse_unary()?;
        let span = token.span.to(expr.span);
        let unary = ExprKind::Unary {
            op,
            expr: Box::new(expr),
        };
        Ok(Expr::new(unary, span))
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_call()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::PlusPlus => UnaryOp::PostInc,
                TokenKind::MinusMinus => UnaryOp::PostDec,
                _ => break,
            };
            let end = self.advance();
            let span = expr.span.to(end.span);
            let unary = ExprKind::Unary {
                op,
                expr: Box::new(expr),
            };
            expr = Expr::new(unary, span);
        }
        Ok(expr)
    }

    fn parse_call(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        // A block is never called; a `(` after it starts the next statement.
        while self.is(TokenKind::LParen) && !matches!(expr.kind, ExprKind::Block(_)) {
            let open = self.advance();
            let args = self.parse_list(TokenKind::RParen, TokenKind::Comma, Parser::parse_expr)?;
            let close = self.consume_closing(TokenKind::RParen, open)?;
            let span = expr.span.to(close.span);
            let call = ExprKind::Call {
                callee: Box::new(expr),
                args,
            };
            expr = Expr::new(call, span);
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.peek();
        let kind = match token.kind {
            TokenKind::Identifier => {
                self.advance();
                ExprKind::Symbol(self.ident(token))
            }
            TokenKind::Number => {
                self.advance();
                let Some(value) = extract::number(token, self.src) else {
                    self.error(token.span.wrap(Error::ParseNumber));
                    return Err(());
                };
                ExprKind::Value(value)
            }
            TokenKind::Literal => {
                self.advance();
                ExprKind::Value(Value::Literal(extract::literal(token, self.src)))
            }

            // Grouping: ( expr ). No node of its own, only a wider span.
            TokenKind::LParen => {
                self.advance();
                let mut expr = self.parse_expr()?;
                let close = self.consume_closing(TokenKind::RParen, token)?;
                expr.span = token.span.to(close.span);
                return Ok(expr);
            }

            TokenKind::LBrace => {
                self.advance();
                return self.parse_block(token);
            }

            actual => {
                // Synchronization tokens are left for the caller to recover on.
                if !matches!(
                    actual,
                    TokenKind::Semicolon | TokenKind::RParen | TokenKind::RBrace | TokenKind::Eof
                ) {
                    self.advance();
                }
                self.error(token.span.wrap(Error::UnexpectedToken { actual }));
                return Err(());
            }
        };
        Ok(Expr::new(kind, token.span))
    }

    /// Parses the statements of a block whose `{` was already consumed.
    fn parse_block(&mut self, open: Token) -> Result<Expr> {
        let mut stmts = Vec::new();
        while self.except([TokenKind::RBrace]) {
            if self.take(TokenKind::Semicolon) {
                continue;
            }
            if let Ok(stmt) = self.synchronize(
                &[TokenKind::Semicolon],
                &[TokenKind::RBrace],
                Parser::parse_block_stmt,
            ) {
                stmts.push(stmt);
            }
        }
        let close = self.consume_closing(TokenKind::RBrace, open)?;
        Ok(Expr::new(ExprKind::Block(stmts), open.span.to(close.span)))
    }

    /// Like [`Parser::parse_terminated_stmt`], but a trailing expression
    /// right before the closing `}` becomes the block's return.
    fn parse_block_stmt(&mut self) -> Result<Stmt> {
        let Stmt { kind, span } = self.parse_stmt()?;
        match kind {
            StmtKind::Expr(expr) if self.is(TokenKind::RBrace) => {
                Ok(Stmt::new(StmtKind::Return(Some(expr)), span))
            }
            kind => {
                let stmt = Stmt::new(kind, span);
                if !stmt.is_block_like() {
                    self.consume(TokenKind::Semicolon)?;
                }
                Ok(stmt)
            }
        }
    }

    /// Parses `item (separator item)*` until `end_delim` is found. Does
    /// **NOT** consume the end delimiter. A `;` also ends the list, leaving
    /// the missing delimiter to be reported by the caller.
    fn parse_list<T>(
        &mut self,
        end_delim: TokenKind,
        separator: TokenKind,
        parse_item: impl Fn(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        debug_assert_ne!(end_delim, separator);

        let mut items = Vec::new();
        while self.except([end_delim, TokenKind::Semicolon]) {
            let item = self.synchronize(
                &[separator],
                &[end_delim, TokenKind::Semicolon],
                |p| parse_item(p),
            )?;
            items.push(item);

            // After consuming an item, we must consume the separator.
            if !self.take(separator) {
                if self.is(end_delim) || self.is(TokenKind::Semicolon) {
                    break;
                }
                let c = self.peek();
                self.error(c.span.wrap(Error::UnexpectedAny {
                    actual: c.kind,
                    expected: Box::from([separator, end_delim]),
                }));
            }
        }
        Ok(items)
    }
}

impl Parser<'_, '_, '_> {
    fn new<'src, 'tok, 'ident>(
        src: &'src str,
        tokens: &'tok [Token],
        idents: &'ident mut Interner,
    ) -> Parser<'src, 'tok, 'ident> {
        assert!(
            tokens.last().is_some_and(Token::is_eof),
            "token stream must end with eof"
        );
        Parser {
            src,
            tokens,
            idents,
            cursor: 0,
            errors: Vec::with_capacity(8),
        }
    }

    fn error(&mut self, error: Spanned<Error>) {
        self.errors.push(error);
    }

    fn ident(&mut self, token: Token) -> Ident {
        Ident {
            name: self.idents.intern(token.lexeme(self.src)),
            span: token.span,
        }
    }

    fn keyword(&self, token: Token) -> Option<Keyword> {
        KEYWORDS.get(token.lexeme(self.src)).copied()
    }

    /// Returns the current token.
    fn peek(&self) -> Token {
        self.peek_nth(0)
    }

    /// Returns the token `n` positions ahead of the current one, or the final
    /// [`TokenKind::Eof`].
    fn peek_nth(&self, n: usize) -> Token {
        let last = self.tokens.len() - 1;
        self.tokens[(self.cursor + n).min(last)]
    }

    /// Returns the span of the last consumed token.
    fn prev_span(&self) -> Span {
        self.tokens[self.cursor.saturating_sub(1)].span
    }

    /// Returns the current token and advances. Never advances past the
    /// [`TokenKind::Eof`].
    fn advance(&mut self) -> Token {
        let c = self.peek();
        if !c.is_eof() {
            self.cursor += 1;
        }
        c
    }

    fn mark(&self) -> usize {
        self.cursor
    }

    fn rewind(&mut self, mark: usize) {
        self.cursor = mark;
    }

    /// Checks whether the current token matches the given one.
    fn is(&self, expect: TokenKind) -> bool {
        self.peek().kind == expect
    }

    /// Advances if the current token matches the provided one, returning true.
    /// If not, returns false and doesn't advance.
    fn take(&mut self, expect: TokenKind) -> bool {
        if self.is(expect) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advances if the current token matches the provided one. If not,
    /// records an error.
    fn consume(&mut self, expect: TokenKind) -> Result<Token> {
        let c = self.peek();
        if self.is(expect) {
            self.advance();
            Ok(c)
        } else {
            self.error(c.span.wrap(Error::Unexpected {
                actual: c.kind,
                expected: expect,
            }));
            Err(())
        }
    }

    /// Advances if the current token matches any of the provided tokens. If
    /// not, records an error.
    fn consume_any(&mut self, expect: &'static [TokenKind]) -> Result<Token> {
        for t in expect {
            if self.is(*t) {
                return Ok(self.advance());
            }
        }
        let c = self.peek();
        self.error(c.span.wrap(Error::UnexpectedAny {
            actual: c.kind,
            expected: Box::from(expect),
        }));
        Err(())
    }

    /// Consumes the delimiter closing `open`. If it is missing, the error
    /// points at the opening delimiter.
    fn consume_closing(&mut self, close: TokenKind, open: Token) -> Result<Token> {
        if self.is(close) {
            return Ok(self.advance());
        }
        self.error(open.span.wrap(Error::UnbalancedDelimiter { expected: close }));
        Err(())
    }

    /// Returns true while the current token does *not* match one of the
    /// provided ones. [`TokenKind::Eof`] is implicitly included in the list.
    ///
    /// This won't advance the cursor.
    fn except(&self, except: impl IntoIterator<Item = TokenKind>) -> bool {
        let c = self.peek();
        for e in except {
            if c.kind == e {
                return false;
            }
        }
        c.kind != TokenKind::Eof
    }

    fn synchronize<T>(
        &mut self,
        cont_cond: &[TokenKind],
        stop_cond: &[TokenKind],
        mut f: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<T> {
        'outer: loop {
            if let Ok(val) = f(self) {
                break Ok(val);
            }
            // In the case of an error, try to advance until find a token
            // specified in `cont_cond` (in which case we retry) or in
            // `stop_cond` (in which case we stop).
            loop {
                let c = self.peek().kind;
                if c == TokenKind::Eof || stop_cond.contains(&c) {
                    break 'outer Err(());
                }
                // The token advancement must be AFTER stopping. If we break
                // out, the caller should advance (to follow the convention).
                self.advance();
                if cont_cond.contains(&c) {
                    // Retry, unless nothing is left to be parsed.
                    if self.except(stop_cond.iter().copied()) {
                        continue 'outer;
                    }
                    break 'outer Err(());
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Lexer(lexer::Error),
    UnexpectedToken {
        actual: TokenKind,
    },
    Unexpected {
        actual: TokenKind,
        expected: TokenKind,
    },
    UnexpectedAny {
        actual: TokenKind,
        expected: Box<[TokenKind]>,
    },
    /// Missing closing delimiter; spans the opening one.
    UnbalancedDelimiter {
        expected: TokenKind,
    },
    ParseNumber,
    /// Unknown type name. The type falls back to `auto`.
    UnknownType(Name),
}
