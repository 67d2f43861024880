//! Type expressions and their compact textual form.
//!
//! Grammar:
//!
//! ```text
//! union    := array ('|' array)*
//! array    := atom ('[' ']')*
//! atom     := '?' bounds | path ('<' union (',' union)* '>')?
//! bounds   := ('extends' array ('&' array)*)? ('super' array ('&' array)*)?
//! path     := ident ('.' ident)*
//! ```
//!
//! Parsing yields `Named` for every identifier; type parameters are resolved
//! afterwards against the declaring type (see [`TypeExpr::resolve_params`]).

use crate::types::Primitive;
use std::{fmt, str::FromStr};
use thiserror::Error as ThisError;

///
/// ParseExprError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("invalid type expression '{input}': {message}")]
pub struct ParseExprError {
    pub input: String,
    pub message: String,
}

///
/// TypeExpr
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeExpr {
    Named(String),
    Parametrized { base: String, args: Vec<Self> },
    Param(String),
    Wildcard { upper: Vec<Self>, lower: Vec<Self> },
    Array(Box<Self>),
    Union(Vec<Self>),
}

impl TypeExpr {
    #[must_use]
    pub fn named(path: impl Into<String>) -> Self {
        Self::Named(path.into())
    }

    #[must_use]
    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }

    #[must_use]
    pub fn array(element: Self) -> Self {
        Self::Array(Box::new(element))
    }

    /// The unconstrained type; what an unbound parameter substitutes to.
    #[must_use]
    pub const fn top() -> Self {
        Self::Wildcard {
            upper: Vec::new(),
            lower: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_top(&self) -> bool {
        matches!(self, Self::Wildcard { upper, lower } if upper.is_empty() && lower.is_empty())
    }

    /// Path of the named type at the head of this expression, if any.
    #[must_use]
    pub fn base_path(&self) -> Option<&str> {
        match self {
            Self::Named(path) | Self::Parametrized { base: path, .. } => Some(path),
            _ => None,
        }
    }

    #[must_use]
    pub fn args(&self) -> &[Self] {
        match self {
            Self::Parametrized { args, .. } => args,
            _ => &[],
        }
    }

    #[must_use]
    pub fn primitive(&self) -> Option<Primitive> {
        match self {
            Self::Named(name) => Primitive::from_name(name),
            _ => None,
        }
    }

    /// Rewrite bare names that match one of `params` into parameter references.
    #[must_use]
    pub fn resolve_params(self, params: &[&str]) -> Self {
        let resolve_all =
            |exprs: Vec<Self>| exprs.into_iter().map(|e| e.resolve_params(params)).collect();

        match self {
            Self::Named(name) if params.contains(&name.as_str()) => Self::Param(name),
            Self::Parametrized { base, args } => Self::Parametrized {
                base,
                args: resolve_all(args),
            },
            Self::Wildcard { upper, lower } => Self::Wildcard {
                upper: resolve_all(upper),
                lower: resolve_all(lower),
            },
            Self::Array(element) => Self::Array(Box::new(element.resolve_params(params))),
            Self::Union(members) => Self::Union(resolve_all(members)),
            other => other,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, exprs: &[TypeExpr], sep: &str) -> fmt::Result {
            for (i, expr) in exprs.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "{expr}")?;
            }
            Ok(())
        }

        match self {
            Self::Named(name) | Self::Param(name) => f.write_str(name),
            Self::Parametrized { base, args } => {
                write!(f, "{base}<")?;
                join(f, args, ", ")?;
                f.write_str(">")
            }
            Self::Wildcard { upper, lower } => {
                f.write_str("?")?;
                if !upper.is_empty() {
                    f.write_str(" extends ")?;
                    join(f, upper, " & ")?;
                }
                if !lower.is_empty() {
                    f.write_str(" super ")?;
                    join(f, lower, " & ")?;
                }
                Ok(())
            }
            Self::Array(element) => write!(f, "{element}[]"),
            Self::Union(members) => join(f, members, " | "),
        }
    }
}

impl FromStr for TypeExpr {
    type Err = ParseExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser::new(s);
        let expr = parser.union()?;
        parser.skip_ws();
        if parser.peek().is_some() {
            return Err(parser.error("unexpected trailing input"));
        }

        Ok(expr)
    }
}

impl TryFrom<String> for TypeExpr {
    type Error = ParseExprError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeExpr> for String {
    fn from(expr: TypeExpr) -> Self {
        expr.to_string()
    }
}

///
/// Parser
///

struct Parser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseExprError {
        ParseExprError {
            input: self.input.to_string(),
            message: format!("{} at offset {}", message.into(), self.pos),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), ParseExprError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{c}'")))
        }
    }

    fn eat_keyword(&mut self, word: &str) -> bool {
        self.skip_ws();
        let end = self.pos + word.len();
        if end > self.chars.len() {
            return false;
        }
        let matches = self.chars[self.pos..end].iter().copied().eq(word.chars());
        let boundary = self
            .chars
            .get(end)
            .is_none_or(|c| !(c.is_alphanumeric() || *c == '_'));
        if matches && boundary {
            self.pos = end;
            true
        } else {
            false
        }
    }

    fn union(&mut self) -> Result<TypeExpr, ParseExprError> {
        let mut members = vec![self.array()?];
        while self.eat('|') {
            members.push(self.array()?);
        }

        Ok(if members.len() == 1 {
            members.remove(0)
        } else {
            TypeExpr::Union(members)
        })
    }

    fn array(&mut self) -> Result<TypeExpr, ParseExprError> {
        let mut expr = self.atom()?;
        while self.eat('[') {
            self.expect(']')?;
            expr = TypeExpr::array(expr);
        }

        Ok(expr)
    }

    fn bound_list(&mut self) -> Result<Vec<TypeExpr>, ParseExprError> {
        let mut bounds = vec![self.array()?];
        while self.eat('&') {
            bounds.push(self.array()?);
        }

        Ok(bounds)
    }

    fn atom(&mut self) -> Result<TypeExpr, ParseExprError> {
        if self.eat('?') {
            let upper = if self.eat_keyword("extends") {
                self.bound_list()?
            } else {
                Vec::new()
            };
            let lower = if self.eat_keyword("super") {
                self.bound_list()?
            } else {
                Vec::new()
            };
            return Ok(TypeExpr::Wildcard { upper, lower });
        }

        let path = self.path()?;
        if self.eat('<') {
            let mut args = vec![self.union()?];
            while self.eat(',') {
                args.push(self.union()?);
            }
            self.expect('>')?;
            return Ok(TypeExpr::Parametrized { base: path, args });
        }

        Ok(TypeExpr::Named(path))
    }

    fn path(&mut self) -> Result<String, ParseExprError> {
        let mut path = self.ident()?;
        loop {
            let save = self.pos;
            if self.eat('.') {
                path.push('.');
                path.push_str(&self.ident()?);
            } else {
                self.pos = save;
                break;
            }
        }

        Ok(path)
    }

    fn ident(&mut self) -> Result<String, ParseExprError> {
        self.skip_ws();
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_alphabetic() || c == '_' => self.pos += 1,
            _ => return Err(self.error("expected identifier")),
        }
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.pos += 1;
        }

        Ok(self.chars[start..self.pos].iter().collect())
    }
}
