//! Recursive-descent parser for JSON-RNC.
//!
//! One procedure per nonterminal:
//!
//! ```text
//! definitions = (definition)*
//! definition  = (IDENT | STRING | "start") ["=" types]
//! types       = type ("," type)* | type ("|" type)*
//! type        = primitive facets? | (IDENT | STRING) facets? | REGEX facets?
//!             | "{" properties? "}" facets? | "[" types? "]" facets? | "(" types ")"
//! properties  = property (","? property)*
//! property    = (IDENT | STRING) "?"? ":" type | "*" ":" type | "(" properties ")"
//! ```
//!
//! All state lives in the [`Parser`], one per compilation. Procedures return
//! `Ok(None)` for a construct that failed after its diagnostic was recorded,
//! and `Err(UnexpectedEof)` only when input ran out mid-construct.
use indexmap::{IndexMap, IndexSet};
use tracing::trace;

use crate::diagnostics::{Category, Reporter};
use crate::ir::{Primitive, PropertyRule, Ty, TypeNode};
use crate::lexer::{Step, Token, TokenKind, TokenStream};

use TokenKind::*;

/// Tokens that can open a definition.
const DEFINITION_START: &[TokenKind] = &[Ident, Str, KwStart];

/// Where a broken property resumes: the next name or the end of the list.
const PROPERTY_RECOVERY: &[TokenKind] = &[Ident, Str, CloseBrace, CloseParen];

/// Everything one pass over the input produced.
pub struct Parsed<'src> {
    pub definitions: IndexMap<String, TypeNode>,
    /// Type of the `start` definition, if one was declared and parsed.
    pub start: Option<TypeNode>,
    /// Every name used as a reference, in first-use order.
    pub references: IndexSet<String>,
    pub reporter: Reporter<'src>,
    /// The token current when parsing stopped (end of file).
    pub end: Token,
}

pub struct Parser<'src> {
    pub(crate) tokens: TokenStream<'src>,
    pub(crate) reporter: Reporter<'src>,
    definitions: IndexMap<String, TypeNode>,
    start: Option<TypeNode>,
    start_declared: bool,
    references: IndexSet<String>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            tokens: TokenStream::new(source),
            reporter: Reporter::new(source),
            definitions: IndexMap::new(),
            start: None,
            start_declared: false,
            references: IndexSet::new(),
        }
    }

    /// Parse every definition. A premature end of file is reported once and
    /// ends the pass; whatever was parsed before it is kept.
    pub fn run(mut self) -> Parsed<'src> {
        if self.parse_definitions().is_err() {
            let at = self.tokens.current().clone();
            self.reporter.record(&at, Category::Syntax, "unexpected end of file");
        }
        Parsed {
            definitions: self.definitions,
            start: self.start,
            references: self.references,
            end: self.tokens.current().clone(),
            reporter: self.reporter,
        }
    }

    fn parse_definitions(&mut self) -> Step<()> {
        while !self.tokens.at(Eof) {
            self.parse_definition()?;
        }
        Ok(())
    }

    /// `definition = (IDENT | STRING | "start") ["=" types]`
    fn parse_definition(&mut self) -> Step<()> {
        trace!(token = %self.tokens.current(), "parse_definition");
        let head = self.tokens.current().clone();
        if !DEFINITION_START.contains(&head.kind) {
            // resume with whatever definition head the skip landed on
            return self.reporter.syntax_error(
                &mut self.tokens,
                "identifier expected at start of definition",
                DEFINITION_START,
            );
        }
        let name = head.value().to_string();
        let is_start = head.kind == KwStart;
        self.tokens.advance()?;

        if !self.tokens.eat(Equal)? {
            self.reporter.syntax_error(&mut self.tokens, "equal expected in a definition", &[])?;
        }
        let node = self.parse_types()?;

        let redeclared = if is_start {
            std::mem::replace(&mut self.start_declared, true)
        } else {
            self.definitions.contains_key(&name)
        };
        if redeclared {
            let at = self.tokens.current().clone();
            self.reporter.record(&at, Category::Semantic, format!("double definition for {name}"));
        }
        if let Some(node) = node {
            if is_start {
                self.start = Some(node);
            } else {
                self.definitions.insert(name, node);
            }
        }
        Ok(())
    }

    /// `types = type ("," type)* | type ("|" type)*`
    ///
    /// Commas fold into [`Ty::Merge`], bars collect into [`Ty::OneOf`]; the two
    /// are not mixed at one level, the first separator decides.
    pub(crate) fn parse_types(&mut self) -> Step<Option<TypeNode>> {
        trace!(token = %self.tokens.current(), "parse_types");
        let first = self.parse_type()?;
        match self.tokens.kind() {
            Comma => {
                let mut merged = first;
                while self.tokens.eat(Comma)? {
                    let next = self.parse_type()?;
                    merged = match (merged, next) {
                        (Some(a), Some(b)) => Some(Ty::Merge(Box::new(a), Box::new(b)).into()),
                        (a, b) => a.or(b),
                    };
                }
                Ok(merged)
            }
            VertBar => {
                let mut arms: Vec<TypeNode> = first.into_iter().collect();
                while self.tokens.eat(VertBar)? {
                    arms.extend(self.parse_type()?);
                }
                Ok(Some(Ty::OneOf(arms).into()))
            }
            _ => Ok(first),
        }
    }

    /// A single type, followed by its facets where the grammar allows them.
    pub(crate) fn parse_type(&mut self) -> Step<Option<TypeNode>> {
        trace!(token = %self.tokens.current(), "parse_type");
        let token = self.tokens.current().clone();
        let mut node = match token.kind {
            kind if kind.is_primitive_keyword() => {
                self.tokens.advance()?;
                Primitive::from_token(kind).map(|p| TypeNode::new(Ty::Primitive(p)))
            }
            Ident | Str => {
                self.tokens.advance()?;
                let name = token.value().to_string();
                self.references.insert(name.clone());
                Some(TypeNode::new(Ty::Reference(name)))
            }
            Regex => {
                self.tokens.advance()?;
                Some(TypeNode::new(Ty::Pattern(token.value().to_string())))
            }
            OpenBrace => {
                self.tokens.advance()?;
                if self.tokens.eat(CloseBrace)? {
                    Some(TypeNode::new(Ty::Object(None)))
                } else {
                    let rules = self.parse_properties()?;
                    let shape = crate::properties::assemble(rules, &mut self.reporter);
                    let node = TypeNode::new(Ty::Object(Some(shape)));
                    if !self.close(CloseBrace, "closing brace expected")? {
                        return Ok(Some(node));
                    }
                    Some(node)
                }
            }
            OpenBracket => {
                self.tokens.advance()?;
                if self.tokens.eat(CloseBracket)? {
                    Some(TypeNode::new(Ty::Array(None)))
                } else {
                    let items = self.parse_types()?;
                    let node = TypeNode::new(Ty::Array(items.map(Box::new)));
                    if !self.close(CloseBracket, "closing bracket expected")? {
                        return Ok(Some(node));
                    }
                    Some(node)
                }
            }
            OpenParen => {
                self.tokens.advance()?;
                let inner = self.parse_types()?;
                self.close(CloseParen, "closing parenthesis expected")?;
                // grouping takes no facets
                return Ok(inner);
            }
            _ => {
                self.reporter.syntax_error(
                    &mut self.tokens,
                    "ident or json type expected",
                    DEFINITION_START,
                )?;
                return Ok(None);
            }
        };
        if let Some(node) = node.as_mut() {
            self.parse_facets(node)?;
        }
        Ok(node)
    }

    /// Consume the closer `kind`, or report `message` and resynchronize on it.
    /// Returns whether the closer was present in place.
    fn close(&mut self, kind: TokenKind, message: &str) -> Step<bool> {
        if self.tokens.eat(kind)? {
            return Ok(true);
        }
        self.reporter.syntax_error(&mut self.tokens, message, &[kind])?;
        self.tokens.eat(kind)?;
        Ok(false)
    }

    /// `properties = property (","? property)*`
    fn parse_properties(&mut self) -> Step<Vec<PropertyRule>> {
        trace!(token = %self.tokens.current(), "parse_properties");
        let mut rules: Vec<PropertyRule> = self.parse_property()?.into_iter().collect();
        while self.tokens.at_any(&[Comma, Ident, Str, Star, OpenParen]) {
            self.tokens.eat(Comma)?;
            rules.extend(self.parse_property()?);
        }
        Ok(rules)
    }

    /// `property = (IDENT | STRING) "?"? ":" type | "*" ":" type | "(" properties ")"`
    fn parse_property(&mut self) -> Step<Option<PropertyRule>> {
        trace!(token = %self.tokens.current(), "parse_property");
        let at = self.tokens.current().clone();
        match at.kind {
            Ident | Str => {
                self.tokens.advance()?;
                let optional = self.tokens.eat(Question)?;
                let ty = if self.tokens.eat(Colon)? {
                    self.parse_type()?
                } else {
                    self.reporter.syntax_error(
                        &mut self.tokens,
                        "colon expected after property name",
                        &[],
                    )?;
                    None
                };
                let name = at.value().to_string();
                Ok(Some(PropertyRule::Named { name, optional, ty, at }))
            }
            Star => {
                self.tokens.advance()?;
                if !self.tokens.eat(Colon)? {
                    self.reporter.syntax_error(
                        &mut self.tokens,
                        "colon expected after *",
                        &[Ident, Str],
                    )?;
                    return Ok(None);
                }
                let ty = self.parse_type()?;
                Ok(Some(PropertyRule::Additional { ty, at }))
            }
            OpenParen => {
                self.tokens.advance()?;
                let rules = self.parse_properties()?;
                self.close(CloseParen, "closing paren expected")?;
                Ok(Some(PropertyRule::Group(rules)))
            }
            _ => {
                self.reporter.syntax_error(
                    &mut self.tokens,
                    "ident, string or open parenthesis expected at the start of a prop",
                    PROPERTY_RECOVERY,
                )?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ObjectShape;
    use pretty_assertions::assert_eq;

    fn prim(p: Primitive) -> TypeNode {
        TypeNode::new(Ty::Primitive(p))
    }

    fn messages(parsed: &Parsed<'_>) -> Vec<String> {
        parsed.reporter.diagnostics().iter().map(|d| d.message.clone()).collect()
    }

    #[test]
    fn start_is_kept_apart_from_definitions() {
        let parsed = Parser::new("start = person\nperson = { name: string }").run();
        assert!(messages(&parsed).is_empty());
        assert_eq!(parsed.start, Some(TypeNode::new(Ty::Reference("person".into()))));
        assert_eq!(parsed.definitions.keys().collect::<Vec<_>>(), vec!["person"]);
        assert!(parsed.references.contains("person"));
    }

    #[test]
    fn quoted_names_are_plain_names() {
        let parsed = Parser::new("\"first name\" = 'other thing'\n'other thing' = null").run();
        assert!(messages(&parsed).is_empty());
        assert_eq!(
            parsed.definitions["first name"],
            TypeNode::new(Ty::Reference("other thing".into()))
        );
    }

    #[test]
    fn union_and_merge_nodes() {
        let parsed = Parser::new("a = string | integer | null\nb = (x, y)").run();
        assert_eq!(
            parsed.definitions["a"].ty,
            Ty::OneOf(vec![
                prim(Primitive::String),
                prim(Primitive::Integer),
                prim(Primitive::Null)
            ])
        );
        assert_eq!(
            parsed.definitions["b"].ty,
            Ty::Merge(
                Box::new(TypeNode::new(Ty::Reference("x".into()))),
                Box::new(TypeNode::new(Ty::Reference("y".into())))
            )
        );
    }

    #[test]
    fn object_with_optional_and_additional() {
        let parsed = Parser::new("start = { a: string, b?: integer, *: boolean }").run();
        assert!(messages(&parsed).is_empty());
        let Some(TypeNode { ty: Ty::Object(Some(shape)), .. }) = parsed.start else {
            panic!("expected an object");
        };
        assert_eq!(
            shape,
            ObjectShape {
                properties: IndexMap::from([
                    ("a".to_string(), prim(Primitive::String)),
                    ("b".to_string(), prim(Primitive::Integer)),
                ]),
                required: vec!["a".to_string()],
                additional: Some(Box::new(prim(Primitive::Boolean))),
            }
        );
    }

    #[test]
    fn empty_containers() {
        let parsed = Parser::new("o = {}\na = []").run();
        assert_eq!(parsed.definitions["o"].ty, Ty::Object(None));
        assert_eq!(parsed.definitions["a"].ty, Ty::Array(None));
    }

    #[test]
    fn redefinition_is_reported_and_replaces() {
        let parsed = Parser::new("a = string\nb = null\na = integer").run();
        assert_eq!(messages(&parsed), vec!["double definition for a"]);
        assert_eq!(parsed.definitions.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(parsed.definitions["a"], prim(Primitive::Integer));
    }

    #[test]
    fn second_start_is_reported() {
        let parsed = Parser::new("start = string\nstart = integer").run();
        assert_eq!(messages(&parsed), vec!["double definition for start"]);
        assert_eq!(parsed.start, Some(prim(Primitive::Integer)));
    }

    #[test]
    fn missing_equal_keeps_going() {
        let parsed = Parser::new("a string\nb = integer").run();
        assert_eq!(messages(&parsed), vec!["equal expected in a definition"]);
        assert_eq!(parsed.definitions.len(), 2);
    }

    #[test]
    fn missing_brace_recovers_at_next_brace() {
        let parsed = Parser::new("a = { x: string ] }\nb = null").run();
        assert_eq!(messages(&parsed), vec!["closing brace expected"]);
        assert!(parsed.definitions.contains_key("b"));
    }

    #[test]
    fn unfinished_construct_reports_end_of_file() {
        let parsed = Parser::new("start = { a: string").run();
        assert_eq!(messages(&parsed), vec!["unexpected end of file"]);
        assert_eq!(parsed.end.kind, Eof);
    }

    #[test]
    fn stray_tokens_between_definitions() {
        let parsed = Parser::new("a = string\n} ]\nb = null").run();
        assert_eq!(messages(&parsed), vec!["identifier expected at start of definition"]);
        assert_eq!(parsed.definitions.len(), 2);
    }

    #[test]
    fn unrecognized_character_in_type_position() {
        let parsed = Parser::new("a = $\nb = null").run();
        let diagnostics = parsed.reporter.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].category, Category::Lexical);
        assert_eq!((diagnostics[0].line, diagnostics[0].column), (1, 4));
    }

    #[test]
    fn property_without_colon() {
        let parsed = Parser::new("a = { x y: string }").run();
        assert_eq!(messages(&parsed), vec!["colon expected after property name"]);
    }

    #[test]
    fn stray_token_before_start_definition() {
        for src in ["a = string\n}\nstart = a", "a = string $\nstart = a"] {
            let parsed = Parser::new(src).run();
            assert_eq!(parsed.reporter.diagnostics().len(), 1, "{src}");
            assert_eq!(parsed.start, Some(TypeNode::new(Ty::Reference("a".into()))), "{src}");
        }
    }

    #[test]
    fn bad_type_resumes_at_start_definition() {
        let parsed = Parser::new("a = $\nstart = string").run();
        assert_eq!(parsed.reporter.diagnostics().len(), 1);
        assert_eq!(parsed.start, Some(prim(Primitive::String)));
    }

    #[test]
    fn stray_token_before_quoted_definition() {
        let parsed = Parser::new("start = x\n]\n\"x\" = null").run();
        assert_eq!(messages(&parsed), vec!["identifier expected at start of definition"]);
        assert_eq!(parsed.definitions["x"], prim(Primitive::Null));
    }

    #[test]
    fn keyword_property_name_must_be_quoted() {
        let parsed = Parser::new("start = { number: string, id: integer }").run();
        assert_eq!(
            messages(&parsed),
            vec!["ident, string or open parenthesis expected at the start of a prop"]
        );
        let Some(TypeNode { ty: Ty::Object(Some(shape)), .. }) = parsed.start else {
            panic!("expected an object");
        };
        assert_eq!(shape.properties.keys().collect::<Vec<_>>(), vec!["id"]);

        let parsed = Parser::new("start = { \"number\": string }").run();
        assert!(messages(&parsed).is_empty());
    }
}
