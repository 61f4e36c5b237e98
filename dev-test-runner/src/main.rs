//! Golden-file runner: compiles every `fixtures/*.jsonrnc` and compares the
//! result with `<stem>.json` (expected document) or `<stem>.errors`
//! (expected diagnostic count).
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use serde_json::Value;

enum Expectation {
    Document(Value),
    Errors(usize),
}

fn expectation_for(source: &Path) -> Result<Expectation> {
    let json = source.with_extension("json");
    if json.exists() {
        let text = std::fs::read_to_string(&json)?;
        let value = serde_json::from_str(&text).with_context(|| format!("parsing {}", json.display()))?;
        return Ok(Expectation::Document(value));
    }
    let errors = source.with_extension("errors");
    if errors.exists() {
        let count = std::fs::read_to_string(&errors)?.trim().parse()?;
        return Ok(Expectation::Errors(count));
    }
    bail!("no .json or .errors file next to {}", source.display())
}

fn check(source: &Path) -> Result<()> {
    let text = std::fs::read_to_string(source)?;
    match (jsonrnc::compile(&text), expectation_for(source)?) {
        (Ok(doc), Expectation::Document(expected)) => {
            let actual = doc.into_value();
            check_meta_schema(&actual)?;
            if actual != expected {
                bail!(
                    "document differs:\n{}",
                    serde_json::to_string_pretty(&actual).unwrap_or_default()
                );
            }
        }
        (Err(errors), Expectation::Errors(expected)) => {
            if errors.count() != expected {
                let listing: Vec<String> = errors.diagnostics.iter().map(|d| d.to_string()).collect();
                bail!("expected {expected} errors, got {}:\n{}", errors.count(), listing.join("\n"));
            }
        }
        (Ok(_), Expectation::Errors(expected)) => bail!("expected {expected} errors, compiled cleanly"),
        (Err(errors), Expectation::Document(_)) => {
            let listing: Vec<String> = errors.diagnostics.iter().map(|d| d.to_string()).collect();
            bail!("unexpected errors:\n{}", listing.join("\n"))
        }
    }
    Ok(())
}

/// Every compiled document must itself be a valid draft-07 schema.
fn check_meta_schema(doc: &Value) -> Result<()> {
    let meta = serde_json::json!({ "$ref": jsonrnc::schema::DRAFT_07 });
    let validator = jsonschema::validator_for(&meta).map_err(|e| anyhow::anyhow!("{e}"))?;
    let violations: Vec<String> = validator
        .iter_errors(doc)
        .map(|e| format!("{}: {}", e.instance_path, e))
        .collect();
    if !violations.is_empty() {
        bail!("not a valid draft-07 schema:\n{}", violations.join("\n"));
    }
    Ok(())
}

fn main() -> ExitCode {
    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures"));
    let pattern = dir.join("*.jsonrnc");
    let sources: Vec<PathBuf> = match glob::glob(&pattern.to_string_lossy()) {
        Ok(paths) => paths.filter_map(|p| p.ok()).collect(),
        Err(error) => {
            eprintln!("bad fixture directory: {error}");
            return ExitCode::FAILURE;
        }
    };

    let mut failed = 0usize;
    for source in &sources {
        match check(source) {
            Ok(()) => eprintln!("✅ {}", source.display()),
            Err(error) => {
                failed += 1;
                eprintln!("❌ {}: {}", source.display(), format!("{error:#}").red());
            }
        }
    }
    eprintln!("{} fixtures, {} failed", sources.len(), failed);
    if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
