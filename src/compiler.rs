//! Compiler entry point: source text in, schema document or diagnostics out.
use tracing::debug;

use crate::error::SchemaErrors;
use crate::parser::Parser;
use crate::schema::{self, SchemaDocument};

/// Compile JSON-RNC source. Any diagnostic at all fails the compilation;
/// the partially assembled document is dropped.
///
/// Each call owns its own parser state, so calls may run concurrently.
pub fn compile(source: &str) -> Result<SchemaDocument, SchemaErrors> {
    let parsed = Parser::new(source).run();
    let (document, reporter) = schema::assemble(parsed);
    debug!(errors = reporter.error_count(), "compilation finished");
    if reporter.error_count() == 0 {
        Ok(document)
    } else {
        Err(SchemaErrors { diagnostics: reporter.into_diagnostics() })
    }
}
