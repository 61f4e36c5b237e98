// Strongly-typed IR for parsed schema fragments. No serde_json::Value here;
// see `lower` for the JSON Schema rendering.
use indexmap::IndexMap;
use crate::facets::Facets;
use crate::lexer::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Integer,
    Number,
    String,
    Boolean,
    Null,
}

impl Primitive {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::KwInteger => Some(Self::Integer),
            TokenKind::KwNumber => Some(Self::Number),
            TokenKind::KwString => Some(Self::String),
            TokenKind::KwBoolean => Some(Self::Boolean),
            TokenKind::KwNull => Some(Self::Null),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Null => "null",
        }
    }
}

/// The JSON Schema `type` a node declares, used to check facet applicability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    Primitive(Primitive),
    Object,
    Array,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ty {
    Primitive(Primitive),
    /// Name of a definition, resolved after the whole input is parsed.
    Reference(String),
    /// Inline `/regex/`: a string constrained by a pattern.
    Pattern(String),
    /// `None` for `{}`: any object.
    Object(Option<ObjectShape>),
    /// `None` for `[]`: any array.
    Array(Option<Box<TypeNode>>),
    OneOf(Vec<TypeNode>),
    /// Comma-combination: constraints of both sides in one type, right side
    /// winning on conflicting keys.
    Merge(Box<TypeNode>, Box<TypeNode>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNode {
    pub ty: Ty,
    pub facets: Facets,
}

impl TypeNode {
    pub fn new(ty: Ty) -> Self {
        Self { ty, facets: Facets::default() }
    }

    pub fn base_type(&self) -> Option<BaseType> {
        match &self.ty {
            Ty::Primitive(p) => Some(BaseType::Primitive(*p)),
            Ty::Pattern(_) => Some(BaseType::Primitive(Primitive::String)),
            Ty::Object(_) => Some(BaseType::Object),
            Ty::Array(_) => Some(BaseType::Array),
            Ty::Reference(_) | Ty::OneOf(_) | Ty::Merge(..) => None,
        }
    }
}

impl From<Ty> for TypeNode {
    fn from(ty: Ty) -> Self {
        Self::new(ty)
    }
}

/// Assembled body of a non-empty `{ ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectShape {
    pub properties: IndexMap<String, TypeNode>, // first-seen order
    pub required: Vec<String>,
    /// `None` renders as `additionalProperties: false`.
    pub additional: Option<Box<TypeNode>>,
}

/// One entry of a property list, before assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyRule {
    Named {
        name: String,
        optional: bool,
        ty: Option<TypeNode>,
        at: Token,
    },
    /// `*: type`
    Additional { ty: Option<TypeNode>, at: Token },
    /// `( properties )`, flattened into the enclosing object.
    Group(Vec<PropertyRule>),
}
