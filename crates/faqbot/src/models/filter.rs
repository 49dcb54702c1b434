//! Search filter expressions
//!
//! A small OData subset understood by every index backend: `field eq 'value'`,
//! `field ne 'value'`, `and`, `or`, `not` and parentheses. Expressions are
//! parsed once into a [`Filter`] tree, evaluated in memory by the in-process
//! index, and rendered back to OData or SQL for the remote backends.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::models::document::Document;

/// Filterable document fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  Id,
  Type,
  Content,
}

impl Field {
  pub fn as_str(&self) -> &'static str {
    match self {
      Field::Id => "id",
      Field::Type => "type",
      Field::Content => "content",
    }
  }

  fn parse(name: &str) -> Result<Self> {
    match name {
      "id" => Ok(Field::Id),
      "type" => Ok(Field::Type),
      "content" => Ok(Field::Content),
      other => Err(Error::Validation(format!(
        "field '{other}' is not filterable (expected id, type or content)"
      ))),
    }
  }

  fn value_of<'a>(&self, document: &'a Document) -> &'a str {
    match self {
      Field::Id => &document.id,
      Field::Type => document.kind.as_str(),
      Field::Content => &document.content,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
  Eq,
  Ne,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
  Compare { field: Field, op: Comparison, value: String },
  And(Box<Filter>, Box<Filter>),
  Or(Box<Filter>, Box<Filter>),
  Not(Box<Filter>),
}

impl Filter {
  /// `type eq '<kind>'`
  pub fn type_eq(kind: impl Into<String>) -> Self {
    Filter::Compare { field: Field::Type, op: Comparison::Eq, value: kind.into() }
  }

  pub fn and(self, other: Filter) -> Self {
    Filter::And(Box::new(self), Box::new(other))
  }

  pub fn or(self, other: Filter) -> Self {
    Filter::Or(Box::new(self), Box::new(other))
  }

  pub fn negate(self) -> Self {
    Filter::Not(Box::new(self))
  }

  pub fn matches(&self, document: &Document) -> bool {
    match self {
      Filter::Compare { field, op, value } => {
        let actual = field.value_of(document);
        match op {
          Comparison::Eq => actual == value,
          Comparison::Ne => actual != value,
        }
      }
      Filter::And(left, right) => left.matches(document) && right.matches(document),
      Filter::Or(left, right) => left.matches(document) || right.matches(document),
      Filter::Not(inner) => !inner.matches(document),
    }
  }

  /// Render as an OData `$filter` expression
  pub fn to_odata(&self) -> String {
    self.render(&Dialect::OData, 0)
  }

  /// Render as a SQL predicate for embedded table scans
  pub fn to_sql(&self) -> String {
    self.render(&Dialect::Sql, 0)
  }

  fn precedence(&self) -> u8 {
    match self {
      Filter::Or(..) => 1,
      Filter::And(..) => 2,
      Filter::Not(_) | Filter::Compare { .. } => 3,
    }
  }

  fn render(&self, dialect: &Dialect, parent: u8) -> String {
    let own = self.precedence();
    let rendered = match self {
      Filter::Compare { field, op, value } => {
        let escaped = value.replace('\'', "''");
        match dialect {
          Dialect::OData => {
            let op = match op {
              Comparison::Eq => "eq",
              Comparison::Ne => "ne",
            };
            format!("{} {op} '{escaped}'", field.as_str())
          }
          Dialect::Sql => {
            let op = match op {
              Comparison::Eq => "=",
              Comparison::Ne => "<>",
            };
            format!("`{}` {op} '{escaped}'", field.as_str())
          }
        }
      }
      Filter::And(left, right) => format!(
        "{} {} {}",
        left.render(dialect, own),
        dialect.and(),
        right.render(dialect, own)
      ),
      Filter::Or(left, right) => format!(
        "{} {} {}",
        left.render(dialect, own),
        dialect.or(),
        right.render(dialect, own)
      ),
      Filter::Not(inner) => format!("{} ({})", dialect.not(), inner.render(dialect, 0)),
    };

    if own < parent {
      format!("({rendered})")
    } else {
      rendered
    }
  }
}

enum Dialect {
  OData,
  Sql,
}

impl Dialect {
  fn and(&self) -> &'static str {
    match self {
      Dialect::OData => "and",
      Dialect::Sql => "AND",
    }
  }

  fn or(&self) -> &'static str {
    match self {
      Dialect::OData => "or",
      Dialect::Sql => "OR",
    }
  }

  fn not(&self) -> &'static str {
    match self {
      Dialect::OData => "not",
      Dialect::Sql => "NOT",
    }
  }
}

impl fmt::Display for Filter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.to_odata())
  }
}

impl FromStr for Filter {
  type Err = Error;

  fn from_str(input: &str) -> Result<Self> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, position: 0 };
    let filter = parser.parse_or()?;
    match parser.peek() {
      None => Ok(filter),
      Some(token) => Err(Error::Validation(format!("unexpected {token} in filter '{input}'"))),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
  Word(String),
  Literal(String),
  Open,
  Close,
}

impl fmt::Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Token::Word(word) => write!(f, "'{word}'"),
      Token::Literal(value) => write!(f, "literal '{value}'"),
      Token::Open => f.write_str("'('"),
      Token::Close => f.write_str("')'"),
    }
  }
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
  let mut tokens = Vec::new();
  let mut chars = input.chars().peekable();

  while let Some(&c) = chars.peek() {
    if c.is_whitespace() {
      chars.next();
    } else if c == '(' {
      chars.next();
      tokens.push(Token::Open);
    } else if c == ')' {
      chars.next();
      tokens.push(Token::Close);
    } else if c == '\'' {
      chars.next();
      let mut value = String::new();
      loop {
        match chars.next() {
          Some('\'') if chars.peek() == Some(&'\'') => {
            chars.next();
            value.push('\'');
          }
          Some('\'') => break,
          Some(other) => value.push(other),
          None => {
            return Err(Error::Validation(format!("unterminated string literal in filter '{input}'")))
          }
        }
      }
      tokens.push(Token::Literal(value));
    } else if c.is_alphanumeric() || c == '_' {
      let mut word = String::new();
      while let Some(&next) = chars.peek() {
        if next.is_alphanumeric() || next == '_' {
          word.push(next);
          chars.next();
        } else {
          break;
        }
      }
      tokens.push(Token::Word(word));
    } else {
      return Err(Error::Validation(format!("unexpected character '{c}' in filter '{input}'")));
    }
  }

  if tokens.is_empty() {
    return Err(Error::Validation("filter expression is empty".to_string()));
  }
  Ok(tokens)
}

struct Parser {
  tokens: Vec<Token>,
  position: usize,
}

impl Parser {
  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.position)
  }

  fn next(&mut self) -> Option<Token> {
    let token = self.tokens.get(self.position).cloned();
    self.position += 1;
    token
  }

  fn eat_keyword(&mut self, keyword: &str) -> bool {
    match self.peek() {
      Some(Token::Word(word)) if word.eq_ignore_ascii_case(keyword) => {
        self.position += 1;
        true
      }
      _ => false,
    }
  }

  fn parse_or(&mut self) -> Result<Filter> {
    let mut left = self.parse_and()?;
    while self.eat_keyword("or") {
      let right = self.parse_and()?;
      left = left.or(right);
    }
    Ok(left)
  }

  fn parse_and(&mut self) -> Result<Filter> {
    let mut left = self.parse_unary()?;
    while self.eat_keyword("and") {
      let right = self.parse_unary()?;
      left = left.and(right);
    }
    Ok(left)
  }

  fn parse_unary(&mut self) -> Result<Filter> {
    if self.eat_keyword("not") {
      return Ok(self.parse_unary()?.negate());
    }

    match self.next() {
      Some(Token::Open) => {
        let inner = self.parse_or()?;
        match self.next() {
          Some(Token::Close) => Ok(inner),
          _ => Err(Error::Validation("missing ')' in filter".to_string())),
        }
      }
      Some(Token::Word(name)) => {
        let field = Field::parse(&name)?;
        let op = match self.next() {
          Some(Token::Word(op)) if op.eq_ignore_ascii_case("eq") => Comparison::Eq,
          Some(Token::Word(op)) if op.eq_ignore_ascii_case("ne") => Comparison::Ne,
          other => {
            return Err(Error::Validation(format!(
              "expected 'eq' or 'ne' after '{name}', found {}",
              describe(other.as_ref())
            )))
          }
        };
        match self.next() {
          Some(Token::Literal(value)) => Ok(Filter::Compare { field, op, value }),
          other => Err(Error::Validation(format!(
            "expected a quoted literal after '{name}', found {}",
            describe(other.as_ref())
          ))),
        }
      }
      other => Err(Error::Validation(format!(
        "expected a comparison, found {}",
        describe(other.as_ref())
      ))),
    }
  }
}

fn describe(token: Option<&Token>) -> String {
  match token {
    Some(token) => token.to_string(),
    None => "end of input".to_string(),
  }
}
