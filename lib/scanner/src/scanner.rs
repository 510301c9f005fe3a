use cursor::{Cursor, Line};
use errors::{Diagnostic, Diagnostics};

pub mod token;
pub use token::{Literal, Token, TokenKind};
use TokenKind::*;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ScanErrorKind {
    #[error("Unexpected character '{0}'.")]
    UnexpectedCharacter(char),
    #[error("Unterminated string.")]
    UnterminatedString,
    #[error("Unterminated block comment.")]
    UnterminatedBlockComment,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("[line {line}] {kind}")]
pub struct ScanError {
    pub kind: ScanErrorKind,
    pub line: Line,
}

impl ScanError {
    fn new(kind: ScanErrorKind, line: Line) -> Self {
        Self { kind, line }
    }
}

impl From<ScanError> for Diagnostic {
    fn from(error: ScanError) -> Self {
        Diagnostic::new(error.line, error.kind.to_string())
    }
}

/// Lazily scans a source string.
///
/// Errors are yielded in place of the offending span and scanning resumes
/// right after it. The stream always ends with exactly one `EndOfFile` token.
#[derive(Debug, Clone)]
pub struct TokenStream<'a> {
    cursor: Cursor<'a>,
    finished: bool,
}

impl<'a> TokenStream<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { cursor: Cursor::new(source), finished: false }
    }

    fn token(&self, kind: TokenKind, start: &Cursor<'a>) -> Token<'a> {
        Token::new(kind, start.slice_until(&self.cursor), start.line())
    }

    fn one_or_two(
        &mut self,
        second: char,
        two: TokenKind,
        one: TokenKind,
        start: &Cursor<'a>,
    ) -> Token<'a> {
        if self.cursor.next_if_eq(second) {
            self.token(two, start)
        } else {
            self.token(one, start)
        }
    }

    fn consume_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.cursor.peek().is_some_and(&pred) {
            self.cursor.next();
        }
    }

    /// Returns `None` for input that produces no token (whitespace, comments).
    fn scan_token(&mut self, c: char, start: &Cursor<'a>) -> Option<Result<Token<'a>, ScanError>> {
        let token = match c {
            '(' => self.token(LParen, start),
            ')' => self.token(RParen, start),
            '{' => self.token(LBrace, start),
            '}' => self.token(RBrace, start),
            ',' => self.token(Comma, start),
            '.' => self.token(Dot, start),
            '-' => self.token(Minus, start),
            '+' => self.token(Plus, start),
            ';' => self.token(Semicolon, start),
            '*' => self.token(Asterisk, start),

            '!' => self.one_or_two('=', NotEq, Not, start),
            '=' => self.one_or_two('=', EqEq, Eq, start),
            '<' => self.one_or_two('=', LtEq, Lt, start),
            '>' => self.one_or_two('=', GtEq, Gt, start),

            '/' => {
                if self.cursor.next_if_eq('/') {
                    self.consume_while(|c| c != '\n');
                    return None;
                }
                #[cfg(not(feature = "strict"))]
                if self.cursor.next_if_eq('*') {
                    return self.block_comment().err().map(Err);
                }
                self.token(Slash, start)
            }

            ' ' | '\r' | '\t' | '\n' => return None,

            '"' => return Some(self.string(start)),

            d if d.is_ascii_digit() => self.number(start),

            a if a.is_ascii_alphabetic() || a == '_' => self.identifier(start),

            c => {
                return Some(Err(ScanError::new(
                    ScanErrorKind::UnexpectedCharacter(c),
                    start.line(),
                )))
            }
        };

        Some(Ok(token))
    }

    /// Called after the opening `/*`. Comments nest, so every `/*` needs its own `*/`.
    #[cfg(not(feature = "strict"))]
    fn block_comment(&mut self) -> Result<(), ScanError> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.cursor.next() {
                Some('/') if self.cursor.next_if_eq('*') => depth += 1,
                Some('*') if self.cursor.next_if_eq('/') => depth -= 1,
                Some(_) => (),
                None => {
                    return Err(ScanError::new(
                        ScanErrorKind::UnterminatedBlockComment,
                        self.cursor.line(),
                    ))
                }
            }
        }
        Ok(())
    }

    fn string(&mut self, start: &Cursor<'a>) -> Result<Token<'a>, ScanError> {
        loop {
            match self.cursor.next() {
                Some('"') => break,
                Some(_) => (),
                None => {
                    return Err(ScanError::new(ScanErrorKind::UnterminatedString, start.line()))
                }
            }
        }

        let lexeme = start.slice_until(&self.cursor);
        let contents = &lexeme[1..lexeme.len() - 1];
        Ok(Token::with_literal(Str, lexeme, Literal::Str(contents), start.line()))
    }

    fn number(&mut self, start: &Cursor<'a>) -> Token<'a> {
        self.consume_while(|c| c.is_ascii_digit());

        // A trailing '.' is only part of the number if a digit follows it.
        if self.cursor.peek() == Some('.')
            && self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.next();
            self.consume_while(|c| c.is_ascii_digit());
        }

        let lexeme = start.slice_until(&self.cursor);
        // Digits with an optional fraction always parse.
        let value = lexeme.parse().unwrap_or_default();
        Token::with_literal(Number, lexeme, Literal::Number(value), start.line())
    }

    fn identifier(&mut self, start: &Cursor<'a>) -> Token<'a> {
        self.consume_while(|c| c.is_ascii_alphanumeric() || c == '_');

        let lexeme = start.slice_until(&self.cursor);
        match TokenKind::keyword(lexeme) {
            Some(keyword) => self.token(keyword, start),
            None => Token::with_literal(
                Identifier,
                lexeme,
                Literal::Identifier(lexeme),
                start.line(),
            ),
        }
    }
}

impl<'a> Iterator for TokenStream<'a> {
    type Item = Result<Token<'a>, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let start = self.cursor.clone();
            let Some(c) = self.cursor.next() else {
                if self.finished {
                    return None;
                }
                self.finished = true;
                return Some(Ok(Token::eof(self.cursor.line())));
            };

            if let Some(result) = self.scan_token(c, &start) {
                match &result {
                    Ok(token) => log::trace!("Scanned {token} (line {})", token.line),
                    Err(e) => log::debug!("Scan error: {e}"),
                }
                return Some(result);
            }
        }
    }
}

/// Every token of a source string together with the errors found on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Scan<'a> {
    pub tokens: Vec<Token<'a>>,
    pub errors: Diagnostics,
}

impl<'a> Scan<'a> {
    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<Vec<Token<'a>>, Diagnostics> {
        if self.had_error() {
            Err(self.errors)
        } else {
            Ok(self.tokens)
        }
    }
}

pub fn scan(source: &str) -> Scan<'_> {
    let mut tokens = Vec::new();
    let mut errors = Diagnostics::default();

    for result in TokenStream::new(source) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e.into()),
        }
    }

    Scan { tokens, errors }
}
