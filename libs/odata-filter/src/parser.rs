//! Recursive-descent parser for `$filter` expressions.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! or_expr    := and_expr ("or" and_expr)*
//! and_expr   := unary ("and" unary)*
//! unary      := "not" unary | comparison
//! comparison := primary (CMP primary | "in" "(" value ("," value)* ")")?
//! primary    := "(" or_expr ")" | IDENT "(" args? ")" | IDENT | LITERAL
//! ```
//!
//! Keywords and operators match case-insensitively. Function names are kept
//! as written; run [`crate::normalize_function_names`] first if the catalog
//! lookup should not depend on the caller's casing.

use tracing::trace;

use crate::ast::{FilterNode, FunctionCall, LogicalOperator};
use crate::error::SyntaxError;
use crate::literal::is_literal;

/// Deepest nesting of groups, calls and `not` the parser accepts.
pub const MAX_DEPTH: usize = 64;

const COMPARISON_OPERATORS: [&str; 6] = ["eq", "ne", "gt", "ge", "lt", "le"];
const RESERVED: [&str; 4] = ["and", "or", "not", "in"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TokenKind {
    Word,
    Literal,
    LParen,
    RParen,
    Comma,
}

#[derive(Clone, Copy, Debug)]
struct Token<'a> {
    kind: TokenKind,
    text: &'a str,
    start: usize,
    end: usize,
}

impl Token<'_> {
    fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(keyword)
    }

    fn comparison_operator(&self) -> Option<&'static str> {
        if self.kind != TokenKind::Word {
            return None;
        }
        COMPARISON_OPERATORS
            .iter()
            .copied()
            .find(|op| self.text.eq_ignore_ascii_case(op))
    }
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.input[self.pos..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token<'a>>, SyntaxError> {
        let mut tokens = Vec::new();
        loop {
            self.eat_while(char::is_whitespace);
            let start = self.pos;
            let Some(c) = self.peek() else {
                break;
            };
            let kind = match c {
                '(' => {
                    self.bump();
                    TokenKind::LParen
                }
                ')' => {
                    self.bump();
                    TokenKind::RParen
                }
                ',' => {
                    self.bump();
                    TokenKind::Comma
                }
                '\'' => {
                    self.quoted()?;
                    TokenKind::Literal
                }
                c if c.is_ascii_digit()
                    || ((c == '-' || c == '+')
                        && self.peek_second().is_some_and(|n| n.is_ascii_digit())) =>
                {
                    self.bump();
                    self.eat_while(is_number_char);
                    let text = &self.input[start..self.pos];
                    if !is_literal(text) {
                        return Err(SyntaxError::UnexpectedToken(text.to_owned()));
                    }
                    TokenKind::Literal
                }
                c if c.is_alphabetic() || c == '_' => {
                    self.eat_while(is_word_char);
                    let word = &self.input[start..self.pos];
                    if self.peek() == Some('\'') && is_spatial_prefix(word) {
                        self.quoted()?;
                        TokenKind::Literal
                    } else {
                        TokenKind::Word
                    }
                }
                _ => return Err(SyntaxError::UnexpectedToken(self.rest_of_word(start))),
            };
            tokens.push(Token {
                kind,
                text: &self.input[start..self.pos],
                start,
                end: self.pos,
            });
        }
        Ok(tokens)
    }

    /// Consume a single-quoted string; `''` is an escaped quote.
    fn quoted(&mut self) -> Result<(), SyntaxError> {
        let start = self.pos;
        self.bump();
        loop {
            match self.bump() {
                Some('\'') if self.peek() == Some('\'') => {
                    self.bump();
                }
                Some('\'') => return Ok(()),
                Some(_) => {}
                None => return Err(SyntaxError::UnexpectedToken(self.input[start..].to_owned())),
            }
        }
    }

    fn rest_of_word(&self, start: usize) -> String {
        let rest = &self.input[start..];
        let first = rest.chars().next().map_or(0, char::len_utf8);
        let end = rest[first..]
            .find(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | ',' | '\''))
            .map_or(rest.len(), |i| i + first);
        rest[..end].to_owned()
    }
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | ':' | '+' | '-')
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '/'
}

fn is_spatial_prefix(word: &str) -> bool {
    word.eq_ignore_ascii_case("geography") || word.eq_ignore_ascii_case("geometry")
}

/// Drop leading whitespace and a `$filter=` prefix in any case.
#[must_use]
pub fn strip_filter_prefix(input: &str) -> &str {
    let trimmed = input.trim_start();
    match trimmed.get(..8) {
        Some(head) if head.eq_ignore_ascii_case("$filter=") => &trimmed[8..],
        _ => trimmed,
    }
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| t.kind)
    }

    fn advance(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_keyword(keyword)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>, SyntaxError> {
        match self.advance() {
            Some(token) if token.kind == kind => Ok(token),
            Some(token) => Err(SyntaxError::UnexpectedToken(token.text.to_owned())),
            None => Err(SyntaxError::FailedToParse),
        }
    }

    fn enter(&mut self) -> Result<(), SyntaxError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(SyntaxError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn or_expr(&mut self) -> Result<FilterNode, SyntaxError> {
        let mut left = self.and_expr()?;
        while self.eat_keyword("or") {
            let right = self.and_expr()?;
            left = FilterNode::Logical {
                op: LogicalOperator::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<FilterNode, SyntaxError> {
        let mut left = self.unary()?;
        while self.eat_keyword("and") {
            let right = self.unary()?;
            left = FilterNode::Logical {
                op: LogicalOperator::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<FilterNode, SyntaxError> {
        if self.eat_keyword("not") {
            self.enter()?;
            let inner = self.unary()?;
            self.leave();
            return Ok(FilterNode::Not(Box::new(inner)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<FilterNode, SyntaxError> {
        let left = self.primary()?;

        if let Some(op) = self.peek().and_then(Token::comparison_operator) {
            self.pos += 1;
            let right = self.primary()?;
            return Ok(FilterNode::Comparison {
                op: op.to_owned(),
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        if self.eat_keyword("in") {
            let values = self.in_list()?;
            return Ok(FilterNode::In {
                left: Box::new(left),
                values,
            });
        }

        Ok(left)
    }

    fn in_list(&mut self) -> Result<Vec<String>, SyntaxError> {
        self.expect(TokenKind::LParen)?;
        if self.peek_kind(0) == Some(TokenKind::RParen) {
            return Err(SyntaxError::FailedToParse);
        }
        let mut values = Vec::new();
        loop {
            let value = self.advance().ok_or(SyntaxError::FailedToParse)?;
            if !matches!(value.kind, TokenKind::Word | TokenKind::Literal) {
                return Err(SyntaxError::UnexpectedToken(value.text.to_owned()));
            }
            values.push(value.text.to_owned());
            match self.advance() {
                Some(t) if t.kind == TokenKind::Comma => {}
                Some(t) if t.kind == TokenKind::RParen => return Ok(values),
                Some(t) => return Err(SyntaxError::UnexpectedToken(t.text.to_owned())),
                None => return Err(SyntaxError::FailedToParse),
            }
        }
    }

    fn primary(&mut self) -> Result<FilterNode, SyntaxError> {
        let token = self.advance().ok_or(SyntaxError::FailedToParse)?;
        match token.kind {
            TokenKind::LParen => {
                self.enter()?;
                let inner = self.or_expr()?;
                self.expect(TokenKind::RParen)?;
                self.leave();
                Ok(FilterNode::Group(Box::new(inner)))
            }
            TokenKind::Literal => Ok(FilterNode::Primary(token.text.to_owned())),
            TokenKind::Word if RESERVED.iter().any(|k| token.is_keyword(k)) => {
                Err(SyntaxError::UnexpectedToken(token.text.to_owned()))
            }
            TokenKind::Word if self.peek_kind(0) == Some(TokenKind::LParen) => {
                self.call(token)
            }
            TokenKind::Word => Ok(FilterNode::Primary(token.text.to_owned())),
            TokenKind::RParen | TokenKind::Comma => {
                Err(SyntaxError::UnexpectedToken(token.text.to_owned()))
            }
        }
    }

    fn call(&mut self, name: Token<'a>) -> Result<FilterNode, SyntaxError> {
        self.enter()?;
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        let close = if self.peek_kind(0) == Some(TokenKind::RParen) {
            self.expect(TokenKind::RParen)?
        } else {
            loop {
                args.push(self.or_expr()?);
                let next = self.advance().ok_or(SyntaxError::FailedToParse)?;
                match next.kind {
                    TokenKind::Comma => {}
                    TokenKind::RParen => break next,
                    _ => return Err(SyntaxError::UnexpectedToken(next.text.to_owned())),
                }
            }
        };
        self.leave();
        Ok(FilterNode::Function(FunctionCall {
            name: name.text.to_owned(),
            args,
            raw: self.source[name.start..close.end].to_owned(),
        }))
    }
}

/// Parse a `$filter` expression. A leading `$filter=` is accepted.
///
/// # Errors
/// - [`SyntaxError::UnexpectedToken`] naming the first token that does not fit.
/// - [`SyntaxError::FailedToParse`] when the input ends early or is empty.
/// - [`SyntaxError::TooDeep`] beyond [`MAX_DEPTH`] levels of nesting.
pub fn parse_filter(input: &str) -> Result<FilterNode, SyntaxError> {
    let body = strip_filter_prefix(input);
    let tokens = Lexer::new(body).tokenize()?;
    trace!(tokens = tokens.len(), "filter tokenized");
    if tokens.is_empty() {
        return Err(SyntaxError::FailedToParse);
    }

    let mut parser = Parser {
        source: body,
        tokens,
        pos: 0,
        depth: 0,
    };
    let node = parser.or_expr()?;
    if let Some(extra) = parser.peek() {
        return Err(SyntaxError::UnexpectedToken(extra.text.to_owned()));
    }
    Ok(node)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn p(s: &str) -> FilterNode {
        parse_filter(s).unwrap()
    }

    fn prim(s: &str) -> FilterNode {
        FilterNode::primary(s)
    }

    #[test]
    fn simple_comparison() {
        assert_eq!(
            p("Name eq '123'"),
            FilterNode::comparison("eq", prim("Name"), prim("'123'"))
        );
    }

    #[test]
    fn operators_and_keywords_ignore_case() {
        assert_eq!(
            p("Price GT 10 AND Name Eq 'x'"),
            FilterNode::comparison("gt", prim("Price"), prim("10"))
                .and(FilterNode::comparison("eq", prim("Name"), prim("'x'")))
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let tree = p("A eq 1 or B eq 2 and C eq 3");
        let expected = FilterNode::comparison("eq", prim("A"), prim("1")).or(
            FilterNode::comparison("eq", prim("B"), prim("2"))
                .and(FilterNode::comparison("eq", prim("C"), prim("3"))),
        );
        assert_eq!(tree, expected);
    }

    #[test]
    fn not_applies_to_comparison() {
        assert_eq!(
            p("not Name eq 'a' and Price lt 2"),
            FilterNode::comparison("eq", prim("Name"), prim("'a'"))
                .negate()
                .and(FilterNode::comparison("lt", prim("Price"), prim("2")))
        );
    }

    #[test]
    fn parentheses_become_groups() {
        assert_eq!(
            p("(Price eq null)"),
            FilterNode::comparison("eq", prim("Price"), prim("null")).grouped()
        );
    }

    #[test]
    fn function_keeps_raw_text() {
        let FilterNode::Function(call) = p("startswith(Name,  'it''s')") else {
            panic!("expected a call");
        };
        assert_eq!(call.name, "startswith");
        assert_eq!(call.args, vec![prim("Name"), prim("'it''s'")]);
        assert_eq!(call.raw, "startswith(Name,  'it''s')");
    }

    #[test]
    fn zero_argument_call() {
        let tree = p("Time lt now()");
        let FilterNode::Comparison { right, .. } = tree else {
            panic!("expected a comparison");
        };
        let FilterNode::Function(call) = *right else {
            panic!("expected a call");
        };
        assert!(call.args.is_empty());
        assert_eq!(call.raw, "now()");
    }

    #[test]
    fn in_list_keeps_raw_values() {
        assert_eq!(
            p("Price in (123.456, 234.56)"),
            FilterNode::In {
                left: Box::new(prim("Price")),
                values: vec!["123.456".to_owned(), "234.56".to_owned()],
            }
        );
    }

    #[test]
    fn literal_forms() {
        for (input, literal) in [
            ("T gt 2025-01-01T12:00:00Z", "2025-01-01T12:00:00Z"),
            ("T gt -12.5e3", "-12.5e3"),
            ("G eq geography'POINT(1 2)'", "geography'POINT(1 2)'"),
            ("B eq true", "true"),
        ] {
            let FilterNode::Comparison { right, .. } = p(input) else {
                panic!("expected a comparison for {input}");
            };
            assert_eq!(*right, prim(literal));
        }
    }

    #[test]
    fn filter_prefix_is_optional() {
        assert_eq!(p("$filter=Name eq 'a'"), p("Name eq 'a'"));
    }

    #[test]
    fn syntax_errors_name_the_token() {
        let cases = [
            ("Name bla '123'", "Unexpected token found: 'bla'."),
            ("Bla.Name eq 'Test'", "Unexpected token found: '.Name'."),
            ("Price in ()", "Failed to parse filter query."),
            ("Name eq", "Failed to parse filter query."),
            ("Name eq 'abc", "Unexpected token found: ''abc'."),
            ("Price gt 12abc", "Unexpected token found: '12abc'."),
            ("Name eq and", "Unexpected token found: 'and'."),
            ("(Name eq 'a'", "Failed to parse filter query."),
            ("Name eq 'a')", "Unexpected token found: ')'."),
            ("", "Failed to parse filter query."),
        ];
        for (input, message) in cases {
            let err = parse_filter(input).unwrap_err();
            assert_eq!(err.to_string(), message, "input: {input}");
        }
    }

    #[test]
    fn nesting_is_bounded() {
        let deep = format!("{}A eq 1{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert_eq!(parse_filter(&deep), Err(SyntaxError::TooDeep(MAX_DEPTH)));
    }
}
