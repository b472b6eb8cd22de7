#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(f64),
    StringLit(String),
    Ident(String),

    // Keywords
    Let,
    Const,
    Var,
    Return,
    If,
    Else,
    Throw,
    True,
    False,

    // Arithmetic
    Plus,     // +
    Minus,    // -
    Star,     // *
    Slash,    // /
    Percent,  // %
    StarStar, // **

    // Comparison
    Lt,        // <
    LtEq,      // <=
    Gt,        // >
    GtEq,      // >=
    EqEq,      // == or ===
    BangEq,    // != or !==

    // Logic
    AndAnd,   // &&
    OrOr,     // ||
    Bang,     // !
    Question, // ?
    Colon,    // :

    // Assignment
    Eq,        // =
    PlusEq,    // +=
    MinusEq,   // -=
    StarEq,    // *=
    SlashEq,   // /=
    PercentEq, // %=

    // Punctuation
    Dot,       // .
    Comma,     // ,
    Semicolon, // ;
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }

    // Structural
    Newline,
    Comment(String),
    EOF,
}

impl Token {
    /// True when a line ending in this token cannot be a complete statement,
    /// so a following newline continues the expression.
    pub fn continues_line(&self) -> bool {
        matches!(
            self,
            Token::Plus
                | Token::Minus
                | Token::Star
                | Token::Slash
                | Token::Percent
                | Token::StarStar
                | Token::Lt
                | Token::LtEq
                | Token::Gt
                | Token::GtEq
                | Token::EqEq
                | Token::BangEq
                | Token::AndAnd
                | Token::OrOr
                | Token::Bang
                | Token::Question
                | Token::Colon
                | Token::Eq
                | Token::PlusEq
                | Token::MinusEq
                | Token::StarEq
                | Token::SlashEq
                | Token::PercentEq
                | Token::Dot
                | Token::Comma
                | Token::LParen
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub span: Span,
}

/// Convert a token back to its approximate source representation.
pub fn token_to_string(token: &Token) -> String {
    match token {
        Token::Number(n) => {
            if *n == (*n as i64) as f64 {
                format!("{}", *n as i64)
            } else {
                format!("{n}")
            }
        }
        Token::StringLit(s) => format!("\"{s}\""),
        Token::Ident(s) => s.clone(),
        Token::Let => "let".into(),
        Token::Const => "const".into(),
        Token::Var => "var".into(),
        Token::Return => "return".into(),
        Token::If => "if".into(),
        Token::Else => "else".into(),
        Token::Throw => "throw".into(),
        Token::True => "true".into(),
        Token::False => "false".into(),
        Token::Plus => "+".into(),
        Token::Minus => "-".into(),
        Token::Star => "*".into(),
        Token::Slash => "/".into(),
        Token::Percent => "%".into(),
        Token::StarStar => "**".into(),
        Token::Lt => "<".into(),
        Token::LtEq => "<=".into(),
        Token::Gt => ">".into(),
        Token::GtEq => ">=".into(),
        Token::EqEq => "==".into(),
        Token::BangEq => "!=".into(),
        Token::AndAnd => "&&".into(),
        Token::OrOr => "||".into(),
        Token::Bang => "!".into(),
        Token::Question => "?".into(),
        Token::Colon => ":".into(),
        Token::Eq => "=".into(),
        Token::PlusEq => "+=".into(),
        Token::MinusEq => "-=".into(),
        Token::StarEq => "*=".into(),
        Token::SlashEq => "/=".into(),
        Token::PercentEq => "%=".into(),
        Token::Dot => ".".into(),
        Token::Comma => ",".into(),
        Token::Semicolon => ";".into(),
        Token::LParen => "(".into(),
        Token::RParen => ")".into(),
        Token::LBrace => "{".into(),
        Token::RBrace => "}".into(),
        Token::Newline => "\n".into(),
        Token::Comment(s) => format!("// {s}"),
        Token::EOF => "end of input".into(),
    }
}
