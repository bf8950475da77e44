use std::fmt;

/// A single lexeme. The lexeme text itself is not stored; it is the source
/// substring addressed by the token span (see [`Token::lexeme`]).
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Token {
        Token { kind, span }
    }

    /// Returns the exact source substring this token was scanned from.
    pub fn lexeme<'src>(&self, src: &'src str) -> &'src str {
        self.span.substr(src)
    }

    pub fn line(&self) -> u32 {
        self.span.line
    }

    pub fn start_col(&self) -> u32 {
        self.span.col
    }

    pub fn end_col(&self) -> u32 {
        self.span.end_col()
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, {:?})", self.kind, self.span)
    }
}

/// A source region.
///
/// `lo` and `len` address the byte range in the source string. `line` and
/// `col` locate `lo` (both 1-based); the column span is the half-open byte
/// range `[col, col + len)` on that line.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub struct Span {
    pub lo: usize,
    pub len: u32,
    pub line: u32,
    pub col: u32,
}

impl Span {
    pub fn new(lo: usize, len: u32, line: u32, col: u32) -> Span {
        Span { lo, len, line, col }
    }

    pub fn hi(&self) -> usize {
        self.lo + self.len as usize
    }

    pub fn end_col(&self) -> u32 {
        self.col + self.len
    }

    /// Returns a span starting at `self` and ending where `other` ends.
    pub fn to(self, other: Span) -> Span {
        let len = u32::try_from(other.hi().saturating_sub(self.lo)).unwrap_or(u32::MAX);
        Span { len, ..self }
    }

    pub fn substr<'src>(&self, src: &'src str) -> &'src str {
        &src[self.lo..self.hi()]
    }

    pub fn wrap<T>(self, inner: T) -> Spanned<T> {
        Spanned { span: self, inner }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({}..{} @ {self})", self.lo, self.hi())
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}..{}", self.line, self.col, self.end_col())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub span: Span,
    pub inner: T,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Structure
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Colon,
    Semicolon,
    Dot,
    Comma,
    /// `->`
    Arrow,
    At,

    // Assignment
    Equals,
    TripleEquals,
    PlusPlus,
    MinusMinus,
    PlusEquals,
    MinusEquals,
    StarEquals,
    SlashEquals,
    CaretEquals,
    PercentEquals,
    OrEquals,
    AndEquals,
    LshEquals,
    RshEquals,
    /// `<>`
    Swap,

    // Comparison and logic
    EqualsEquals,
    NotEquals,
    LessEq,
    GreaterEq,
    Less,
    Greater,
    Exclamation,
    Question,
    Or,
    And,

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,

    // Bitwise
    BitNot,
    BitOr,
    /// `><`
    BitXor,
    BitAnd,
    BitLshift,
    BitRshift,

    Identifier,
    Number,
    /// A string literal, quotes included in the lexeme.
    Literal,

    Eof,
}

impl TokenKind {
    /// The canonical source form of fixed tokens, or a class name for
    /// variable ones.
    pub const fn as_str(self) -> &'static str {
        use TokenKind::*;
        match self {
            LParen => "(",
            RParen => ")",
            LBracket => "[",
            RBracket => "]",
            LBrace => "{",
            RBrace => "}",
            Colon => ":",
            Semicolon => ";",
            Dot => ".",
            Comma => ",",
            Arrow => "->",
            At => "@",
            Equals => "=",
            TripleEquals => "===",
            PlusPlus => "++",
            MinusMinus => "--",
            PlusEquals => "+=",
            MinusEquals => "-=",
            StarEquals => "*=",
            SlashEquals => "/=",
            CaretEquals => "^=",
            PercentEquals => "%=",
            OrEquals => "|=",
            AndEquals => "&=",
            LshEquals => "<<=",
            RshEquals => ">>=",
            Swap => "<>",
            EqualsEquals => "==",
            NotEquals => "!=",
            LessEq => "<=",
            GreaterEq => ">=",
            Less => "<",
            Greater => ">",
            Exclamation => "!",
            Question => "?",
            Or => "||",
            And => "&&",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Caret => "^",
            Percent => "%",
            BitNot => "~",
            BitOr => "|",
            BitXor => "><",
            BitAnd => "&",
            BitLshift => "<<",
            BitRshift => ">>",
            Identifier => "identifier",
            Number => "number",
            Literal => "literal",
            Eof => "end of input",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier | TokenKind::Number | TokenKind::Literal | TokenKind::Eof => {
                f.write_str(self.as_str())
            }
            _ => write!(f, "`{}`", self.as_str()),
        }
    }
}

/// Keywords are not tokens of their own: they are identifiers recognized by
/// comparing the lexeme.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Keyword {
    Ret,
}

pub static KEYWORDS: phf::Map<&'static str, Keyword> = phf::phf_map! {
    "ret" => Keyword::Ret,
};
