use std::fmt::{self, Display, Formatter};

use cursor::Line;
use strum_macros::{EnumCount, EnumIter};

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Exact source text; empty for `EndOfFile`.
    pub lexeme: &'a str,
    /// Only set for identifiers, strings and numbers.
    pub literal: Option<Literal<'a>>,
    /// Line of the token's first character.
    pub line: Line,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, lexeme: &'a str, line: Line) -> Self {
        Self { kind, lexeme, literal: None, line }
    }

    pub fn with_literal(kind: TokenKind, lexeme: &'a str, literal: Literal<'a>, line: Line) -> Self {
        Self { kind, lexeme, literal: Some(literal), line }
    }

    pub fn eof(line: Line) -> Self {
        Self::new(TokenKind::EndOfFile, "", line)
    }
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.literal {
            Some(literal) => write!(f, "{} {} {}", self.kind, self.lexeme, literal),
            None => write!(f, "{} {}", self.kind, self.lexeme),
        }
    }
}

/// Decoded payload of an identifier, string or number token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal<'a> {
    Identifier(&'a str),
    /// Contents between the quotes, escapes are not processed.
    Str(&'a str),
    Number(f64),
}

impl Display for Literal<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Identifier(name) => write!(f, "{name}"),
            Literal::Str(s) => write!(f, "{s}"),
            Literal::Number(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, strum_macros::Display, EnumIter, EnumCount, Clone, Copy, PartialEq, Eq, Hash)]
#[strum(serialize_all = "UPPERCASE")]
pub enum TokenKind {
    // Single-character tokens.
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Asterisk,

    // One or two character tokens.
    Not,
    NotEq,
    Eq,
    EqEq,
    Gt,
    GtEq,
    Lt,
    LtEq,

    // Literals.
    Identifier,
    #[strum(serialize = "STRING")]
    Str,
    Number,

    // Keywords.
    And,
    Class,
    Else,
    False,
    Fun,
    For,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,

    #[strum(serialize = "EOF")]
    EndOfFile,
}

impl TokenKind {
    /// Source text that always scans back to this kind. `None` for the
    /// literal kinds and `EndOfFile`, whose text varies.
    pub fn lexeme(self) -> Option<&'static str> {
        use TokenKind::*;
        Some(match self {
            LParen => "(",
            RParen => ")",
            LBrace => "{",
            RBrace => "}",
            Comma => ",",
            Dot => ".",
            Minus => "-",
            Plus => "+",
            Semicolon => ";",
            Slash => "/",
            Asterisk => "*",
            Not => "!",
            NotEq => "!=",
            Eq => "=",
            EqEq => "==",
            Gt => ">",
            GtEq => ">=",
            Lt => "<",
            LtEq => "<=",
            And => "and",
            Class => "class",
            Else => "else",
            False => "false",
            Fun => "fun",
            For => "for",
            If => "if",
            Nil => "nil",
            Or => "or",
            Print => "print",
            Return => "return",
            Super => "super",
            This => "this",
            True => "true",
            Var => "var",
            While => "while",
            Identifier | Str | Number | EndOfFile => return None,
        })
    }

    pub fn keyword(text: &str) -> Option<TokenKind> {
        use TokenKind::*;
        Some(match text {
            "and" => And,
            "class" => Class,
            "else" => Else,
            "false" => False,
            "fun" => Fun,
            "for" => For,
            "if" => If,
            "nil" => Nil,
            "or" => Or,
            "print" => Print,
            "return" => Return,
            "super" => Super,
            "this" => This,
            "true" => True,
            "var" => Var,
            "while" => While,
            _ => return None,
        })
    }
}
