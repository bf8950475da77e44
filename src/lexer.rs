use crate::{
    token::{Span, Spanned, Token, TokenKind},
    value::Value,
};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 8_192;

/// Lexes the provided string, producing the tokens into the provided buffer.
/// Errors are pushed into `errors`; scanning never stops before the end of
/// the input, and the last produced token is always [`TokenKind::Eof`].
pub fn lex(src: &str, tokens: &mut Vec<Token>, errors: &mut Vec<Spanned<Error>>) {
    Lexer::new(src, tokens, errors).lex();
}

/// A convenience function that allocates new buffers per lexed input and
/// returns them.
pub fn lex_in_new(src: &str) -> (Vec<Token>, Vec<Spanned<Error>>) {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);
    let mut errors = Vec::new();
    lex(src, &mut tokens, &mut errors);
    (tokens, errors)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    InvalidCharacter(char),
    UnterminatedString,
    UnterminatedComment,
    MalformedNumber(MalformedNumber),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MalformedNumber {
    /// `1.` with no digit after the dot.
    TrailingDot,
    /// `1..`
    DoubleDot,
}

/// The Lynx lexer
struct Lexer<'src, 'out> {
    src: &'src str,
    cursor: usize,
    line: u32,
    col: u32,
    current_lo: usize,
    current_line: u32,
    current_col: u32,
    tokens: &'out mut Vec<Token>,
    errors: &'out mut Vec<Spanned<Error>>,
}

impl Lexer<'_, '_> {
    /// Scans the source string until the input is exhausted.
    fn lex(mut self) {
        assert_eq!(self.tokens.len(), 0, "must pass clean tokens buffer");
        loop {
            self.mark();
            let Some(kind) = self.scan_token_kind() else {
                continue;
            };
            self.produce(kind);
            if kind == TokenKind::Eof {
                break;
            }
        }
    }

    /// Tries to scan the current character. Returns `None` if nothing is to
    /// be produced (trivia or a reported error).
    fn scan_token_kind(&mut self) -> Option<TokenKind> {
        use TokenKind::*;
        let Some(c) = self.advance() else {
            return Some(Eof);
        };
        let kind = match c {
            '(' => LParen,
            ')' => RParen,
            '[' => LBracket,
            ']' => RBracket,
            '{' => LBrace,
            '}' => RBrace,
            ':' => Colon,
            ';' => Semicolon,
            ',' => Comma,
            '@' => At,
            '?' => Question,
            '~' => BitNot,
            '.' => match self.peek() {
                Some(d) if d.is_ascii_digit() => self.number(),
                _ => Dot,
            },
            '=' => match (self.peek(), self.peek_nth(1)) {
                (Some('='), Some('=')) => self.advance_n_with(2, TripleEquals),
                (Some('='), _) => self.advance_with(EqualsEquals),
                _ => Equals,
            },
            '<' => match (self.peek(), self.peek_nth(1)) {
                (Some('<'), Some('=')) => self.advance_n_with(2, LshEquals),
                (Some('<'), _) => self.advance_with(BitLshift),
                (Some('='), _) => self.advance_with(LessEq),
                (Some('>'), _) => self.advance_with(Swap),
                _ => Less,
            },
            '>' => match (self.peek(), self.peek_nth(1)) {
                (Some('>'), Some('=')) => self.advance_n_with(2, RshEquals),
                (Some('>'), _) => self.advance_with(BitRshift),
                (Some('='), _) => self.advance_with(GreaterEq),
                (Some('<'), _) => self.advance_with(BitXor),
                _ => Greater,
            },
            '-' => match self.peek() {
                Some('>') => self.advance_with(Arrow),
                Some('-') => self.advance_with(MinusMinus),
                Some('=') => self.advance_with(MinusEquals),
                _ => Minus,
            },
            '+' => match self.peek() {
                Some('+') => self.advance_with(PlusPlus),
                Some('=') => self.advance_with(PlusEquals),
                _ => Plus,
            },
            '*' => match self.peek() {
                Some('=') => self.advance_with(StarEquals),
                _ => Star,
            },
            '/' => match self.peek() {
                Some('/') => return self.line_comment(),
                Some('*') => return self.block_comment(),
                Some('=') => self.advance_with(SlashEquals),
                _ => Slash,
            },
            '^' => match self.peek() {
                Some('=') => self.advance_with(CaretEquals),
                _ => Caret,
            },
            '%' => match self.peek() {
                Some('=') => self.advance_with(PercentEquals),
                _ => Percent,
            },
            '|' => match self.peek() {
                Some('|') => self.advance_with(Or),
                Some('=') => self.advance_with(OrEquals),
                _ => BitOr,
            },
            '&' => match self.peek() {
                Some('&') => self.advance_with(And),
                Some('=') => self.advance_with(AndEquals),
                _ => BitAnd,
            },
            '!' => match self.peek() {
                Some('=') => self.advance_with(NotEquals),
                _ => Exclamation,
            },
            '"' => return self.literal(),
            ' ' | '\t' | '\r' | '\n' => return None,
            c if c.is_ascii_digit() => self.number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
            c => {
                self.error(Error::InvalidCharacter(c));
                return None;
            }
        };
        Some(kind)
    }

    /// Lexes a number: a run of digits, optionally followed by a dot and
    /// another run of digits. The leading run may be empty if the token
    /// started with the dot (`.5`). Underscores are accepted as separators.
    fn number(&mut self) -> TokenKind {
        self.digits();
        let started_with_dot = self.substr().starts_with('.');
        if !started_with_dot && self.peek() == Some('.') {
            match self.peek_nth(1) {
                Some(c) if c.is_ascii_digit() => {
                    self.advance();
                    self.digits();
                }
                // The second dot is left for the next token.
                Some('.') => {
                    self.advance();
                    self.error(Error::MalformedNumber(MalformedNumber::DoubleDot));
                }
                _ => {
                    self.advance();
                    self.error(Error::MalformedNumber(MalformedNumber::TrailingDot));
                }
            }
        }
        TokenKind::Number
    }

    fn digits(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '_') {
            self.advance();
        }
    }

    fn identifier(&mut self) -> TokenKind {
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.advance();
        }
        TokenKind::Identifier
    }

    /// Lexes a string literal. The content is kept raw; a backslash only
    /// prevents the following character from closing the literal. Escape
    /// sequences are processed when the value is lowered.
    fn literal(&mut self) -> Option<TokenKind> {
        let mut is_escaping = false;
        loop {
            match (is_escaping, self.advance()) {
                (_, None) => {
                    self.error(Error::UnterminatedString);
                    return None;
                }
                (false, Some('"')) => return Some(TokenKind::Literal),
                (false, Some('\\')) => is_escaping = true,
                (_, Some(_)) => is_escaping = false,
            }
        }
    }

    fn line_comment(&mut self) -> Option<TokenKind> {
        while !matches!(self.peek(), Some('\n') | None) {
            self.advance();
        }
        None
    }

    /// Skips a block comment. Nesting is not supported: the first `*/` closes.
    fn block_comment(&mut self) -> Option<TokenKind> {
        assert_eq!(self.advance(), Some('*'));
        loop {
            match self.advance() {
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    return None;
                }
                Some(_) => continue,
                None => {
                    self.error(Error::UnterminatedComment);
                    return None;
                }
            }
        }
    }
}

impl Lexer<'_, '_> {
    /// Constructs a new lexer with the default state.
    fn new<'src, 'out>(
        src: &'src str,
        tokens: &'out mut Vec<Token>,
        errors: &'out mut Vec<Spanned<Error>>,
    ) -> Lexer<'src, 'out> {
        Lexer {
            src,
            cursor: 0,
            line: 1,
            col: 1,
            current_lo: 0,
            current_line: 1,
            current_col: 1,
            tokens,
            errors,
        }
    }

    /// Starts a new token "mark" at the current position.
    fn mark(&mut self) {
        self.current_lo = self.cursor;
        self.current_line = self.line;
        self.current_col = self.col;
    }

    /// Returns the next character and advances, keeping track of the line
    /// and column.
    fn advance(&mut self) -> Option<char> {
        let c = self.src[self.cursor..].chars().next()?;
        self.cursor += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += u32::try_from(c.len_utf8()).unwrap_or(1);
        }
        Some(c)
    }

    /// Advances and returns the provided value.
    fn advance_with<T>(&mut self, value: T) -> T {
        self.advance();
        value
    }

    fn advance_n_with<T>(&mut self, n: usize, value: T) -> T {
        for _ in 0..n {
            self.advance();
        }
        value
    }

    /// Returns the next character without advancing.
    fn peek(&self) -> Option<char> {
        self.peek_nth(0)
    }

    /// Returns the character `n` positions ahead of the next one.
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.src[self.cursor..].chars().nth(n)
    }

    /// Returns the span of the current mark.
    fn span(&self) -> Span {
        let len = u32::try_from(self.cursor - self.current_lo).unwrap_or(u32::MAX);
        Span::new(self.current_lo, len, self.current_line, self.current_col)
    }

    /// Returns the substring of the current marked bounds.
    fn substr(&self) -> &str {
        self.span().substr(self.src)
    }

    fn produce(&mut self, kind: TokenKind) {
        self.tokens.push(Token::new(kind, self.span()));
    }

    /// Reports an error spanning the current mark.
    fn error(&mut self, error: Error) {
        self.errors.push(self.span().wrap(error));
    }
}

pub mod extract {
    use super::*;

    /// Extracts the value of a number token. Integers become `i64`, anything
    /// with a dot becomes `f64`. Returns `None` if out of bounds.
    pub fn number(token: Token, src: &str) -> Option<Value> {
        debug_assert_eq!(token.kind, TokenKind::Number);
        let raw: String = token.lexeme(src).chars().filter(|&c| c != '_').collect();
        if raw.contains('.') {
            raw.parse().ok().map(Value::F64)
        } else {
            raw.parse().ok().map(Value::I64)
        }
    }

    /// Extracts the raw content of a literal token, without the quotes.
    pub fn literal(token: Token, src: &str) -> Box<str> {
        debug_assert_eq!(token.kind, TokenKind::Literal);
        let lexeme = token.lexeme(src);
        Box::from(&lexeme[1..lexeme.len() - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tests_with_span() {
        use TokenKind::*;
        let cases = cases!(match .. {
            "+-*/" => [
                (Plus, 0..1),
                (Minus, 1..2),
                (Star, 2..3),
                (Slash, 3..4),
                (Eof, 4..4),
            ],
            "=== == =" => [
                (TripleEquals, 0..3),
                (EqualsEquals, 4..6),
                (Equals, 7..8),
                (Eof, 8..8),
            ],
            "====" => [(TripleEquals, 0..3), (Equals, 3..4), (Eof, 4..4)],
            "<<= << <= <> < >>= >> >= >< >" => [
                (LshEquals, 0..3),
                (BitLshift, 4..6),
                (LessEq, 7..9),
                (Swap, 10..12),
                (Less, 13..14),
                (RshEquals, 15..18),
                (BitRshift, 19..21),
                (GreaterEq, 22..24),
                (BitXor, 25..27),
                (Greater, 28..29),
                (Eof, 29..29),
            ],
            "->--+=++-=*=/=^=%=|=&=" => [
                (Arrow, 0..2),
                (MinusMinus, 2..4),
                (PlusEquals, 4..6),
                (PlusPlus, 6..8),
                (MinusEquals, 8..10),
                (StarEquals, 10..12),
                (SlashEquals, 12..14),
                (CaretEquals, 14..16),
                (PercentEquals, 16..18),
                (OrEquals, 18..20),
                (AndEquals, 20..22),
                (Eof, 22..22),
            ],
            "|| && ! != ? ~ | & ^ %" => [
                (Or, 0..2),
                (And, 3..5),
                (Exclamation, 6..7),
                (NotEquals, 8..10),
                (Question, 11..12),
                (BitNot, 13..14),
                (BitOr, 15..16),
                (BitAnd, 17..18),
                (Caret, 19..20),
                (Percent, 21..22),
                (Eof, 22..22),
            ],
            "()[]{}:;.,@" => [
                (LParen, 0..1),
                (RParen, 1..2),
                (LBracket, 2..3),
                (RBracket, 3..4),
                (LBrace, 4..5),
                (RBrace, 5..6),
                (Colon, 6..7),
                (Semicolon, 7..8),
                (Dot, 8..9),
                (Comma, 9..10),
                (At, 10..11),
                (Eof, 11..11),
            ],
            "42 3.14 .5 1_000" => [
                (Number, 0..2),
                (Number, 3..7),
                (Number, 8..10),
                (Number, 11..16),
                (Eof, 16..16),
            ],
            "f/fo_o/_B/a123z/ret" => [
                (Identifier, 0..1),
                (Slash, 1..2),
                (Identifier, 2..6),
                (Slash, 6..7),
                (Identifier, 7..9),
                (Slash, 9..10),
                (Identifier, 10..15),
                (Slash, 15..16),
                (Identifier, 16..19),
                (Eof, 19..19),
            ],
            r#"""/"hello world"/"a\"b""# => [
                (Literal, 0..2),
                (Slash, 2..3),
                (Literal, 3..16),
                (Slash, 16..17),
                (Literal, 17..23),
                (Eof, 23..23),
            ],
            "a // comment\n/* block\n * still */b" => [
                (Identifier, 0..1),
                (Identifier, 33..34),
                (Eof, 34..34),
            ],
        });

        for (input, tokens) in cases {
            let (lexed, errors) = lex_in_new(input);
            assert!(errors.is_empty(), "{errors:?}");
            let lexed: Vec<_> = lexed.iter().map(|t| (t.kind, t.span.lo..t.span.hi())).collect();
            assert_eq!(lexed, tokens.as_slice());
        }
    }

    #[test]
    fn lexemes_match_source() {
        let src = "add(x: i64, y: i64) -> i64 { ret x + y; }\nz: f64 = 3.14;";
        let (tokens, errors) = lex_in_new(src);
        assert!(errors.is_empty());
        let lexemes: Vec<_> = tokens.iter().map(|t| t.lexeme(src)).collect();
        assert_eq!(
            lexemes,
            [
                "add", "(", "x", ":", "i64", ",", "y", ":", "i64", ")", "->", "i64", "{", "ret",
                "x", "+", "y", ";", "}", "z", ":", "f64", "=", "3.14", ";", "",
            ]
        );
    }

    #[test]
    fn lines_and_columns() {
        let src = "a\n  bc /* x\ny */ d\n\"s\ntr\" e";
        let (tokens, errors) = lex_in_new(src);
        assert!(errors.is_empty());
        let positions: Vec<_> = tokens
            .iter()
            .map(|t| (t.lexeme(src), t.line(), t.start_col(), t.end_col()))
            .collect();
        assert_eq!(
            positions,
            [
                ("a", 1, 1, 2),
                ("bc", 2, 3, 5),
                ("d", 3, 6, 7),
                ("\"s\ntr\"", 4, 1, 7),
                ("e", 5, 5, 6),
                ("", 5, 6, 6),
            ]
        );
    }

    #[test]
    fn invalid_characters_are_skipped() {
        let src = "a $ b\n#";
        let (tokens, errors) = lex_in_new(src);
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            [TokenKind::Identifier, TokenKind::Identifier, TokenKind::Eof]
        );
        assert_eq!(
            errors,
            [
                Span::new(2, 1, 1, 3).wrap(Error::InvalidCharacter('$')),
                Span::new(6, 1, 2, 1).wrap(Error::InvalidCharacter('#')),
            ]
        );
    }

    #[test]
    fn malformed_numbers() {
        let src = "1. 2..3";
        let (tokens, errors) = lex_in_new(src);
        let lexed: Vec<_> = tokens.iter().map(|t| (t.kind, t.lexeme(src))).collect();
        assert_eq!(
            lexed,
            [
                (TokenKind::Number, "1."),
                (TokenKind::Number, "2."),
                (TokenKind::Number, ".3"),
                (TokenKind::Eof, ""),
            ]
        );
        assert_eq!(
            errors,
            [
                Span::new(0, 2, 1, 1).wrap(Error::MalformedNumber(MalformedNumber::TrailingDot)),
                Span::new(3, 2, 1, 4).wrap(Error::MalformedNumber(MalformedNumber::DoubleDot)),
            ]
        );
        assert_eq!(extract::number(tokens[0], src), Some(Value::F64(1.0)));
    }

    #[test]
    fn unterminated_string_and_comment() {
        let (tokens, errors) = lex_in_new("a \"oops");
        assert_eq!(tokens.len(), 2);
        assert_eq!(errors, [Span::new(2, 5, 1, 3).wrap(Error::UnterminatedString)]);

        let (tokens, errors) = lex_in_new("/* never closed");
        assert_eq!(tokens.len(), 1);
        assert_eq!(errors, [Span::new(0, 15, 1, 1).wrap(Error::UnterminatedComment)]);
    }

    #[test]
    fn extract_values() {
        let src = r#"42 1_000 0.25 "raw\n""#;
        let (tokens, _) = lex_in_new(src);
        assert_eq!(extract::number(tokens[0], src), Some(Value::I64(42)));
        assert_eq!(extract::number(tokens[1], src), Some(Value::I64(1000)));
        assert_eq!(extract::number(tokens[2], src), Some(Value::F64(0.25)));
        assert_eq!(&*extract::literal(tokens[3], src), r"raw\n");

        let src = "99999999999999999999";
        let (tokens, _) = lex_in_new(src);
        assert_eq!(extract::number(tokens[0], src), None);
    }

    macro_rules! cases {
        (match .. {
            $($str:expr => [$(($kind:expr, $range:expr)),* $(,)?]),* $(,)?
        }) => {{
            &[$((
                $str,
                vec![$(($kind, $range)),*],
            )),*]
        }};
    }
    use cases;
}
