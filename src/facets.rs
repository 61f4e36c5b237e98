//! Facets: named constraints attached with `@( id = value, ... )`.
use std::fmt;
use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde_json::Value;
use tracing::trace;

use crate::diagnostics::Category;
use crate::ir::{BaseType, Primitive, TypeNode};
use crate::lexer::{Step, TokenKind};
use crate::parser::Parser;

/// Source order; a repeated facet keeps its first position and takes the new value.
pub type Facets = IndexMap<FacetId, FacetValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacetId {
    Minimum,
    Maximum,
    ExclusiveMinimum,
    ExclusiveMaximum,
    Pattern,
    MinLength,
    MaxLength,
    MinItems,
    MaxItems,
    MinProperties,
    MaxProperties,
}

/// What literal a facet takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Number,
    Text,
    Count,
}

impl FacetId {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "minimum" => Self::Minimum,
            "maximum" => Self::Maximum,
            "exclusiveMinimum" => Self::ExclusiveMinimum,
            "exclusiveMaximum" => Self::ExclusiveMaximum,
            "pattern" => Self::Pattern,
            "minLength" => Self::MinLength,
            "maxLength" => Self::MaxLength,
            "minItems" => Self::MinItems,
            "maxItems" => Self::MaxItems,
            "minProperties" => Self::MinProperties,
            "maxProperties" => Self::MaxProperties,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::ExclusiveMinimum => "exclusiveMinimum",
            Self::ExclusiveMaximum => "exclusiveMaximum",
            Self::Pattern => "pattern",
            Self::MinLength => "minLength",
            Self::MaxLength => "maxLength",
            Self::MinItems => "minItems",
            Self::MaxItems => "maxItems",
            Self::MinProperties => "minProperties",
            Self::MaxProperties => "maxProperties",
        }
    }

    fn value_kind(self) -> ValueKind {
        match self {
            Self::Minimum | Self::Maximum | Self::ExclusiveMinimum | Self::ExclusiveMaximum => {
                ValueKind::Number
            }
            Self::Pattern => ValueKind::Text,
            _ => ValueKind::Count,
        }
    }

    pub fn applies_to(self, base: BaseType) -> bool {
        use Primitive::*;
        match self {
            Self::Minimum | Self::Maximum | Self::ExclusiveMinimum | Self::ExclusiveMaximum => {
                matches!(base, BaseType::Primitive(Integer | Number))
            }
            Self::Pattern | Self::MinLength | Self::MaxLength => {
                base == BaseType::Primitive(String)
            }
            Self::MinItems | Self::MaxItems => base == BaseType::Array,
            Self::MinProperties | Self::MaxProperties => base == BaseType::Object,
        }
    }

    fn mismatch_message(self) -> String {
        let target = match self {
            Self::Minimum | Self::Maximum | Self::ExclusiveMinimum | Self::ExclusiveMaximum => {
                "numeric types"
            }
            Self::Pattern => "string",
            Self::MinLength | Self::MaxLength => "string types",
            Self::MinItems | Self::MaxItems => "array types",
            Self::MinProperties | Self::MaxProperties => "object types",
        };
        format!("facet {self} only applicable to {target}")
    }
}

impl fmt::Display for FacetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetValue {
    Integer(i64),
    Float(OrderedFloat<f64>),
    Text(String),
}

impl FacetValue {
    /// Integer when the literal fits an `i64`, floating-point otherwise.
    /// Literals beyond the `f64` range have no JSON form and yield `None`.
    pub fn parse_number(lexeme: &str) -> Option<Self> {
        if let Ok(i) = lexeme.parse::<i64>() {
            return Some(Self::Integer(i));
        }
        lexeme
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| Self::Float(OrderedFloat(f)))
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Integer(i) => Value::from(*i),
            Self::Float(f) => Value::from(f.0),
            Self::Text(s) => Value::from(s.as_str()),
        }
    }
}

// ------------------------------- Grammar --------------------------------- //

const FACET_RECOVERY: &[TokenKind] = &[TokenKind::Comma, TokenKind::CloseParen];

impl Parser<'_> {
    /// `facets = "@" "(" facetId "=" value ("," facetId "=" value)* ")"`
    ///
    /// No-op unless the current token is `@`. Facets that do not apply to the
    /// node's base type are reported and still attached.
    pub(crate) fn parse_facets(&mut self, node: &mut TypeNode) -> Step<()> {
        if !self.tokens.at(TokenKind::At) {
            return Ok(());
        }
        trace!(token = %self.tokens.current(), "parse_facets");
        self.tokens.advance()?;
        if !self.tokens.eat(TokenKind::OpenParen)? {
            return self.reporter.syntax_error(
                &mut self.tokens,
                "open parenthesis expected at the start of a facet",
                &[TokenKind::Ident, TokenKind::Str],
            );
        }
        let base = node.base_type();

        while !self.tokens.at(TokenKind::CloseParen) {
            if !self.tokens.at_any(&[TokenKind::Ident, TokenKind::Str]) {
                self.reporter.syntax_error(
                    &mut self.tokens,
                    "identifier expected in facet",
                    &[TokenKind::CloseParen],
                )?;
                break;
            }
            let name = self.tokens.current().clone();
            let Some(id) = FacetId::from_name(name.value()) else {
                let message = format!("unrecognized facet:{}", name.value());
                self.reporter.error(
                    &mut self.tokens,
                    Category::Semantic,
                    &message,
                    &[TokenKind::CloseParen],
                )?;
                break;
            };
            self.tokens.advance()?;

            if let Some(value) = self.parse_facet_value(id)? {
                node.facets.insert(id, value);
                if base.is_some_and(|b| !id.applies_to(b)) {
                    self.reporter.record(&name, Category::Semantic, id.mismatch_message());
                }
            }
            self.tokens.eat(TokenKind::Comma)?;
        }
        // closing paren; only end of file can be current otherwise
        self.tokens.advance()?;
        Ok(())
    }

    /// `"=" value`, the value literal checked against what `id` takes.
    fn parse_facet_value(&mut self, id: FacetId) -> Step<Option<FacetValue>> {
        if !self.tokens.eat(TokenKind::Equal)? {
            self.reporter.syntax_error(&mut self.tokens, "= expected in facet", FACET_RECOVERY)?;
            return Ok(None);
        }
        let expected = match id.value_kind() {
            ValueKind::Number | ValueKind::Count => TokenKind::Number,
            ValueKind::Text => TokenKind::Str,
        };
        if !self.tokens.at(expected) {
            let message = match expected {
                TokenKind::Str => "string expected as pattern facet".to_string(),
                _ => format!("number expected in facet {id}"),
            };
            self.reporter.syntax_error(&mut self.tokens, &message, FACET_RECOVERY)?;
            return Ok(None);
        }

        let value = match id.value_kind() {
            ValueKind::Text => Some(FacetValue::Text(self.tokens.current().value().to_string())),
            ValueKind::Number => FacetValue::parse_number(self.tokens.current().value()),
            ValueKind::Count => match self.tokens.current().value().parse::<i64>() {
                Ok(n) if n >= 0 => Some(FacetValue::Integer(n)),
                _ => None,
            },
        };
        if value.is_none() {
            let message = match id.value_kind() {
                ValueKind::Count => format!("non-negative integer expected in facet {id}"),
                _ => format!("number expected in facet {id}"),
            };
            self.reporter.error(&mut self.tokens, Category::Semantic, &message, &[])?;
        }
        self.tokens.advance()?;
        Ok(value)
    }
}
