//! Compiler from JSON-RNC, a compact RelaxNG-Compact-like notation, to JSON
//! Schema draft-07.
//!
//! Pipeline: [`lexer`] → [`parser`] (with [`facets`] and [`properties`]) →
//! [`schema`] assembly via [`lower`]. [`compile`] runs it end to end and
//! returns either the document or every [`diagnostics::Diagnostic`] found.
pub mod lexer;
pub mod diagnostics;
pub mod ir;
pub mod facets;
pub mod parser;
pub mod properties;
pub mod lower;
pub mod schema;
pub mod compiler;
pub mod error;
pub mod settings;

pub use compiler::compile;
pub use error::{Error, SchemaErrors};
pub use schema::SchemaDocument;
