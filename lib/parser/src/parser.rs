mod expr;

pub use expr::{Expr, LiteralValue};

use cursor::Line;
use errors::{Diagnostic, Diagnostics, Location};
use scanner::{Literal, Token, TokenKind};

use TokenKind::*;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum ParseErrorKind {
    #[error("Expect ')' after expression.")]
    MissingRightParen,
    #[error("Expect expression.")]
    ExpectedExpression,
    #[error("Expect end of expression.")]
    ExpectedEndOfExpression,
    #[error("Expression nested too deeply.")]
    TooDeeplyNested,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{kind}")]
pub struct ParseError<'a> {
    pub kind: ParseErrorKind,
    pub token: Token<'a>,
}

impl<'a> ParseError<'a> {
    fn new(kind: ParseErrorKind, token: Token<'a>) -> Self {
        Self { kind, token }
    }
}

impl<'a> From<ParseError<'a>> for Diagnostic {
    fn from(error: ParseError<'a>) -> Self {
        let location = match error.token.kind {
            EndOfFile => Location::AtEnd,
            _ => Location::Lexeme(error.token.lexeme.to_string()),
        };
        Diagnostic::new(error.token.line, error.kind.to_string()).at(location)
    }
}

type Result<'a, T> = std::result::Result<T, ParseError<'a>>;

/// Deepest allowed chain of groupings and unary operators.
pub const MAX_NESTING: usize = 256;

/// Recursive descent parser for a single expression.
///
/// ```text
/// expression  → equality
/// equality    → comparison ( ( "!=" | "==" ) comparison )*
/// comparison  → term ( ( ">" | ">=" | "<" | "<=" ) term )*
/// term        → unary ( ( "-" | "+" ) unary )*
/// unary       → ( "!" | "-" ) unary | primary
/// primary     → NUMBER | STRING | "true" | "false" | "nil" | "(" expression ")"
/// ```
#[derive(Debug)]
pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    current: usize,
    depth: usize,
    errors: Diagnostics,
}

impl<'a> Parser<'a> {
    pub fn new(mut tokens: Vec<Token<'a>>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(EndOfFile) {
            let line = tokens.last().map_or(Line(1), |t| t.line);
            tokens.push(Token::eof(line));
        }
        Self { tokens, current: 0, depth: 0, errors: Diagnostics::default() }
    }

    /// Parses exactly one expression followed by the end of input.
    ///
    /// A missing `)` is recorded without unwinding, so the rest of the
    /// expression is still checked; any recorded error makes the whole
    /// parse fail.
    pub fn parse(mut self) -> std::result::Result<Expr<'a>, Diagnostics> {
        let result = match self.expression() {
            Ok(expr) if self.errors.is_empty() => self
                .consume_or_error(EndOfFile, ParseErrorKind::ExpectedEndOfExpression)
                .map(|_| expr),
            other => other,
        };

        match result {
            Ok(expr) if self.errors.is_empty() => Ok(expr),
            Ok(_) => Err(self.errors),
            Err(e) => {
                self.report(e);
                Err(self.errors)
            }
        }
    }

    fn expression(&mut self) -> Result<'a, Expr<'a>> {
        self.equality()
    }

    fn equality(&mut self) -> Result<'a, Expr<'a>> {
        log::trace!("equality @ {}", self.peek_token());
        let mut expr = self.comparison()?;

        while let NotEq | EqEq = self.peek() {
            let operator = self.advance();
            let right = self.comparison()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<'a, Expr<'a>> {
        log::trace!("comparison @ {}", self.peek_token());
        let mut expr = self.term()?;

        while let Gt | GtEq | Lt | LtEq = self.peek() {
            let operator = self.advance();
            let right = self.term()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<'a, Expr<'a>> {
        log::trace!("term @ {}", self.peek_token());
        let mut expr = self.unary()?;

        while let Minus | Plus = self.peek() {
            let operator = self.advance();
            let right = self.unary()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<'a, Expr<'a>> {
        if let Not | Minus = self.peek() {
            let operator = self.advance();
            let right = self.nested(&operator, Self::unary)?;
            return Ok(Expr::unary(operator, right));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<'a, Expr<'a>> {
        let token = self.advance();
        log::trace!("primary {token}");

        match token.kind {
            False => Ok(Expr::Literal(LiteralValue::Boolean(false))),
            True => Ok(Expr::Literal(LiteralValue::Boolean(true))),
            Nil => Ok(Expr::Literal(LiteralValue::Nil)),
            Number => match token.literal {
                Some(Literal::Number(n)) => Ok(Expr::Literal(LiteralValue::Number(n))),
                _ => Err(ParseError::new(ParseErrorKind::ExpectedExpression, token)),
            },
            Str => match token.literal {
                Some(Literal::Str(s)) => Ok(Expr::Literal(LiteralValue::Str(s))),
                _ => Err(ParseError::new(ParseErrorKind::ExpectedExpression, token)),
            },
            LParen => {
                let expr = self.nested(&token, Self::expression)?;

                if let Err(e) = self.consume_or_error(RParen, ParseErrorKind::MissingRightParen) {
                    self.report(e);
                }

                Ok(Expr::grouping(expr))
            }
            _ => Err(ParseError::new(ParseErrorKind::ExpectedExpression, token)),
        }
    }

    /// Runs `rule` one level deeper, failing once `MAX_NESTING` is reached.
    fn nested<T>(
        &mut self,
        token: &Token<'a>,
        rule: impl FnOnce(&mut Self) -> Result<'a, T>,
    ) -> Result<'a, T> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::new(ParseErrorKind::TooDeeplyNested, token.clone()));
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    fn report(&mut self, error: ParseError<'a>) {
        log::debug!("Parse error at {}: {}", error.token, error.kind);
        self.errors.push(error.into());
    }
}

// Helpers
impl<'a> Parser<'a> {
    fn consume(&mut self, kind: TokenKind) -> Option<Token<'a>> {
        (self.peek() == kind).then(|| self.advance())
    }

    fn consume_or_error(&mut self, kind: TokenKind, error: ParseErrorKind) -> Result<'a, Token<'a>> {
        match self.consume(kind) {
            Some(token) => Ok(token),
            None => Err(ParseError::new(error, self.peek_token().clone())),
        }
    }

    fn peek_token(&self) -> &Token<'a> {
        &self.tokens[self.current]
    }

    fn peek(&self) -> TokenKind {
        self.peek_token().kind
    }

    /// Never moves past `EndOfFile`.
    fn advance(&mut self) -> Token<'a> {
        let token = self.tokens[self.current].clone();
        if token.kind != EndOfFile {
            self.current += 1;
        }
        token
    }
}

/// Scans and parses `source`. Scan errors are returned without parsing.
pub fn parse_source(source: &str) -> std::result::Result<Expr<'_>, Diagnostics> {
    let tokens = scanner::scan(source).into_result()?;
    Parser::new(tokens).parse()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use scanner::ScanErrorKind;

    use super::*;

    #[ctor::ctor]
    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn number(n: f64) -> Expr<'static> {
        Expr::Literal(LiteralValue::Number(n))
    }

    fn op(kind: TokenKind, lexeme: &'static str) -> Token<'static> {
        Token::new(kind, lexeme, Line(1))
    }

    fn ast(source: &str) -> String {
        parse_source(source).unwrap().to_string()
    }

    fn error(source: &str) -> Diagnostics {
        parse_source(source).unwrap_err()
    }

    #[test]
    fn left_associative() {
        assert_eq!(
            parse_source("1 - 2 - 3").unwrap(),
            Expr::binary(
                Expr::binary(number(1.0), op(Minus, "-"), number(2.0)),
                op(Minus, "-"),
                number(3.0),
            )
        );
        assert_eq!(ast("1 + 2 - 3 + 4"), "(+ (- (+ 1 2) 3) 4)");
        assert_eq!(ast("1 == 2 != 3"), "(!= (== 1 2) 3)");
        assert_eq!(ast("1 < 2 < 3"), "(< (< 1 2) 3)");
    }

    #[test]
    fn grouping() {
        assert_eq!(
            parse_source("(1 + 2)").unwrap(),
            Expr::grouping(Expr::binary(number(1.0), op(Plus, "+"), number(2.0)))
        );
        assert_eq!(ast("1 - (2 - 3)"), "(- 1 (group (- 2 3)))");
        assert_eq!(ast("((nil))"), "(group (group nil))");
    }

    #[test]
    fn precedence() {
        assert_eq!(ast("1 + 2 > 3"), "(> (+ 1 2) 3)");
        assert_eq!(ast("1 < 2 == 3 >= 4"), "(== (< 1 2) (>= 3 4))");
        assert_eq!(ast("-1 + 2"), "(+ (- 1) 2)");
        assert_eq!(ast("!true == false"), "(== (! true) false)");
    }

    #[test]
    fn unary() {
        assert_eq!(
            parse_source("-5").unwrap(),
            Expr::unary(op(Minus, "-"), number(5.0))
        );
        assert_eq!(ast("!!true"), "(! (! true))");
        assert_eq!(ast("-1 - -2"), "(- (- 1) (- 2))");
    }

    #[test]
    fn literals() {
        assert_eq!(parse_source("nil").unwrap(), Expr::Literal(LiteralValue::Nil));
        assert_eq!(parse_source("true").unwrap(), Expr::Literal(LiteralValue::Boolean(true)));
        assert_eq!(parse_source("false").unwrap(), Expr::Literal(LiteralValue::Boolean(false)));
        assert_eq!(parse_source("\"hi\"").unwrap(), Expr::Literal(LiteralValue::Str("hi")));
        assert_eq!(parse_source("2.5").unwrap(), number(2.5));
        assert_eq!(ast("\"a\" == \"b\""), "(== a b)");
    }

    #[test]
    fn tokens_without_eof() {
        let tokens = vec![Token::with_literal(Number, "7", Literal::Number(7.0), Line(1))];
        assert_eq!(Parser::new(tokens).parse().unwrap(), number(7.0));

        assert_eq!(
            Parser::new(Vec::new()).parse().unwrap_err(),
            Diagnostics(vec![Diagnostic::new(
                Line(1),
                ParseErrorKind::ExpectedExpression.to_string()
            )
            .at(Location::AtEnd)])
        );
    }

    #[test]
    fn expected_expression() {
        assert_eq!(
            error(""),
            Diagnostics(vec![Diagnostic::new(
                Line(1),
                ParseErrorKind::ExpectedExpression.to_string()
            )
            .at(Location::AtEnd)])
        );
        assert_eq!(error("1 +\n").to_string(), "[line 2] Error at end: Expect expression.");
        assert_eq!(error(")").to_string(), "[line 1] Error at ')': Expect expression.");
        assert_eq!(error("foo").to_string(), "[line 1] Error at 'foo': Expect expression.");
        assert_eq!(error("1 == +").to_string(), "[line 1] Error at '+': Expect expression.");
    }

    #[test]
    fn missing_right_paren() {
        assert_eq!(
            error("(1 + 2"),
            Diagnostics(vec![Diagnostic::new(
                Line(1),
                ParseErrorKind::MissingRightParen.to_string()
            )
            .at(Location::AtEnd)])
        );

        // Reported once, without a follow-up complaint about the trailing token.
        assert_eq!(
            error("(1 2").to_string(),
            "[line 1] Error at '2': Expect ')' after expression."
        );

        assert_eq!(
            error("((1)").to_string(),
            "[line 1] Error at end: Expect ')' after expression."
        );
    }

    #[test]
    fn trailing_tokens() {
        // There is no factor level, so `*` can't continue an expression.
        assert_eq!(error("1 + 2 * 3").to_string(), "[line 1] Error at '*': Expect end of expression.");
        assert_eq!(error("1 2").to_string(), "[line 1] Error at '2': Expect end of expression.");
        assert_eq!(error("(1) )").to_string(), "[line 1] Error at ')': Expect end of expression.");
    }

    #[test]
    fn scan_errors_skip_parsing() {
        assert_eq!(
            error("1 @ 2"),
            Diagnostics(vec![Diagnostic::new(
                Line(1),
                ScanErrorKind::UnexpectedCharacter('@').to_string()
            )])
        );
    }

    #[test]
    fn multi_line() {
        let expr = parse_source("1\n+\n2").unwrap();
        match expr {
            Expr::Binary { operator, .. } => assert_eq!(operator.line, Line(2)),
            other => panic!("Expected binary expression, got {other:?}"),
        }
    }

    #[test]
    fn nesting_limit() {
        let deepest = format!("{}1{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert!(parse_source(&deepest).is_ok());
        assert!(parse_source(&format!("{}1", "-".repeat(MAX_NESTING))).is_ok());

        let too_deep = format!("{}1{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert_eq!(
            error(&too_deep),
            Diagnostics(vec![Diagnostic::new(
                Line(1),
                ParseErrorKind::TooDeeplyNested.to_string()
            )
            .at(Location::Lexeme("(".into()))])
        );

        assert_eq!(
            error(&format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000))).to_string(),
            "[line 1] Error at '(': Expression nested too deeply."
        );
        assert_eq!(
            error(&format!("{}1", "-".repeat(10_000))).to_string(),
            "[line 1] Error at '-': Expression nested too deeply."
        );
        assert_eq!(
            error(&format!("{}true", "!(".repeat(5_000))).to_string(),
            "[line 1] Error at '!': Expression nested too deeply."
        );
    }

    #[test]
    fn literal_must_match_token_kind() {
        let tokens = vec![Token::with_literal(Number, "x", Literal::Identifier("x"), Line(1))];
        assert_eq!(
            Parser::new(tokens).parse().unwrap_err().to_string(),
            "[line 1] Error at 'x': Expect expression."
        );

        let tokens = vec![Token::with_literal(Str, "\"1\"", Literal::Number(1.0), Line(1))];
        assert_eq!(
            Parser::new(tokens).parse().unwrap_err().to_string(),
            "[line 1] Error at '\"1\"': Expect expression."
        );

        let tokens = vec![Token::new(Number, "1", Line(1))];
        assert!(Parser::new(tokens).parse().is_err());
    }
}
