//! Final document assembly and the checks that need the whole input.
use serde::Serialize;
use serde_json::{Map, Value};

use crate::diagnostics::{Category, Reporter};
use crate::lower::lower_to_json;
use crate::parser::Parsed;

pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// Top-level keys that make a document usable as an entry point.
const ENTRY_KEYS: [&str; 3] = ["type", "oneOf", "$ref"];

/// A compiled JSON Schema draft-07 document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SchemaDocument(Map<String, Value>);

impl SchemaDocument {
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Descriptive metadata attached by drivers after compilation.
    pub fn set_annotation(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), Value::String(value.into()));
    }
}

/// Build the document from a finished parse and run the whole-input checks:
/// an entry point must exist, and every referenced name must be defined
/// (one diagnostic per name).
pub fn assemble<'src>(parsed: Parsed<'src>) -> (SchemaDocument, Reporter<'src>) {
    let Parsed { definitions, start, references, mut reporter, end } = parsed;

    let mut doc = Map::new();
    doc.insert("$schema".into(), Value::from(DRAFT_07));
    let defs: Map<String, Value> = definitions
        .iter()
        .map(|(name, node)| (name.clone(), Value::Object(lower_to_json(node))))
        .collect();
    doc.insert("definitions".into(), Value::Object(defs));
    if let Some(start) = &start {
        doc.extend(lower_to_json(start));
    }

    let has_entry = ENTRY_KEYS.iter().any(|k| doc.contains_key(*k));
    if !has_entry && !definitions.contains_key("start") {
        reporter.record(&end, Category::Semantic, "no start definition");
    }
    for name in references.iter().filter(|name| !definitions.contains_key(*name)) {
        reporter.record(&end, Category::Semantic, format!("no definition found for {name}"));
    }

    (SchemaDocument(doc), reporter)
}
