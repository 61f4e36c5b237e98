//! Driver settings: how a compiled document is annotated and printed.
use std::fmt::Write as _;
use std::path::Path;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

use crate::error::{Error, Result};
use crate::schema::SchemaDocument;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Prepended to the source name to form `title`.
    pub title_prefix: String,
    /// chrono format string for `description`.
    pub description_format: String,
    /// Spaces per nesting level.
    pub indent: usize,
    /// Attach the `description` timestamp at all.
    pub timestamp: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title_prefix: "Created from JSON-RNC: ".to_string(),
            description_format: "Written: %Y-%m-%d %H:%M".to_string(),
            indent: 3,
            timestamp: true,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let settings = Self::decode(&text).map_err(|message| Error::Settings {
            path: path.display().to_string(),
            message,
        })?;
        if StrftimeItems::new(&settings.description_format).any(|item| matches!(item, Item::Error)) {
            return Err(Error::Settings {
                path: path.display().to_string(),
                message: format!("bad description_format: {:?}", settings.description_format),
            });
        }
        Ok(settings)
    }

    /// Decode with the JSON path of the offending value in the error message.
    pub fn decode(text: &str) -> std::result::Result<Self, String> {
        let de = &mut serde_json::Deserializer::from_str(text);
        serde_path_to_error::deserialize(de)
            .map_err(|err| format!("at JSON path {} → {}", err.path(), err.inner()))
    }

    pub fn annotate(&self, doc: &mut SchemaDocument, source_name: &str, now: DateTime<Local>) {
        doc.set_annotation("title", format!("{}{source_name}", self.title_prefix));
        if self.timestamp {
            let mut description = String::new();
            if write!(description, "{}", now.format(&self.description_format)).is_ok() {
                doc.set_annotation("description", description);
            }
        }
    }

    pub fn render(&self, doc: &SchemaDocument) -> Result<String> {
        let indent = " ".repeat(self.indent);
        let mut buf = Vec::new();
        let mut ser =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(indent.as_bytes()));
        doc.serialize(&mut ser)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_settings_fill_defaults() {
        let settings = Settings::decode(r#"{ "indent": 2 }"#).unwrap();
        assert_eq!(settings.indent, 2);
        assert_eq!(settings.title_prefix, Settings::default().title_prefix);
    }

    #[test]
    fn decoding_errors_name_the_field() {
        let err = Settings::decode(r#"{ "timestamp": "yes" }"#).unwrap_err();
        assert!(err.starts_with("at JSON path timestamp"), "{err}");
    }

    #[test]
    fn annotate_and_render() {
        let mut doc = crate::compile("start = null").unwrap();
        let now = Local.with_ymd_and_hms(2024, 3, 5, 9, 7, 0).unwrap();
        Settings { indent: 1, ..Settings::default() }.annotate(&mut doc, "x.jsonrnc", now);
        let text = Settings { indent: 1, ..Settings::default() }.render(&doc).unwrap();
        assert_eq!(
            text,
            "{\n \"$schema\": \"http://json-schema.org/draft-07/schema#\",\n \"definitions\": {},\n \
             \"type\": \"null\",\n \"title\": \"Created from JSON-RNC: x.jsonrnc\",\n \
             \"description\": \"Written: 2024-03-05 09:07\"\n}"
        );
    }

    #[test]
    fn timestamp_can_be_disabled() {
        let mut doc = crate::compile("start = null").unwrap();
        let settings = Settings { timestamp: false, ..Settings::default() };
        settings.annotate(&mut doc, "stdin", Local::now());
        assert!(doc.as_map().get("description").is_none());
        assert_eq!(doc.as_map()["title"], "Created from JSON-RNC: stdin");
    }
}
