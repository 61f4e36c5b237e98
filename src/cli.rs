//! Minimal CLI: JSON-RNC → JSON Schema
use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::Local;
use clap::Parser;
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use jsonrnc::error::Error;
use jsonrnc::settings::Settings;
use jsonrnc::{compile, SchemaDocument, SchemaErrors};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile JSON-RNC schemas to JSON Schema (draft-07); reads standard input when no file is given
#[derive(Parser, Debug)]
#[command(name = "jsonrnc", version)]
pub struct CommandLineInterface {
    /// JSON-RNC files or quoted glob patterns; '-' for stdin
    inputs: Vec<String>,

    /// output .json file (stdout if omitted); single input only
    #[arg(short, long, conflicts_with = "out_dir")]
    out: Option<PathBuf>,

    /// write `<stem>.json` per input into this directory
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// JSON settings file (title prefix, timestamp format, indent)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// trace every grammar procedure
    #[arg(long)]
    debug: bool,

    /// plain diagnostics
    #[arg(long)]
    no_color: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Input {
    Stdin,
    File(PathBuf),
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Input {
    fn name(&self) -> String {
        match self {
            Self::Stdin => "standard input".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }

    fn read(&self) -> jsonrnc::error::Result<String> {
        match self {
            Self::Stdin => Ok(std::io::read_to_string(std::io::stdin().lock())?),
            Self::File(path) if !path.exists() => Err(Error::NotFound(path.clone())),
            Self::File(path) => {
                let mut text = String::new();
                std::fs::File::open(path)?.read_to_string(&mut text)?;
                Ok(text)
            }
        }
    }

    fn out_file_in(&self, dir: &Path) -> PathBuf {
        let mut name: OsString = match self {
            Self::Stdin => "stdin".into(),
            Self::File(path) => path.file_stem().map_or_else(|| "schema".into(), |s| s.to_os_string()),
        };
        name.push(".json");
        dir.join(name)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn init_tracing(&self) {
        let filter = if self.debug {
            EnvFilter::new("jsonrnc=trace")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
        };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .without_time()
            .try_init();
    }

    /// Compile every input. `Ok(false)` when at least one schema had errors.
    pub fn run(&self) -> anyhow::Result<bool> {
        if self.no_color {
            colored::control::set_override(false);
        }
        let settings = match &self.settings {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        let inputs = resolve_inputs(&self.inputs)?;
        if self.out.is_some() && inputs.len() > 1 {
            bail!("--out takes a single input, use --out-dir for {} inputs", inputs.len());
        }

        // 1) read everything up front (stdin at most once)
        let sources = inputs
            .into_iter()
            .map(|input| input.read().map(|text| (input, text)))
            .collect::<Result<Vec<_>, _>>()?;

        // 2) compile independently
        let results: Vec<Result<SchemaDocument, SchemaErrors>> =
            sources.par_iter().map(|(_, text)| compile(text)).collect();

        // 3) report in input order
        let now = Local::now();
        let mut all_ok = true;
        for ((input, _), result) in sources.iter().zip(results) {
            match result {
                Ok(mut doc) => {
                    settings.annotate(&mut doc, &input.name(), now);
                    let text = settings.render(&doc)?;
                    self.emit(input, &text)?;
                }
                Err(errors) => {
                    all_ok = false;
                    for diagnostic in &errors.diagnostics {
                        eprintln!("{}", diagnostic.render_colored());
                    }
                    eprintln!("{}", Error::Schema { source_name: input.name(), errors });
                }
            }
        }
        Ok(all_ok)
    }

    fn emit(&self, input: &Input, text: &str) -> anyhow::Result<()> {
        let target = match (&self.out, &self.out_dir) {
            (Some(out), _) => out.clone(),
            (None, Some(dir)) => input.out_file_in(dir),
            (None, None) => {
                println!("{text}");
                return Ok(());
            }
        };
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        std::fs::write(&target, format!("{text}\n"))
            .with_context(|| format!("writing {}", target.display()))?;
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_inputs(patterns: &[String]) -> jsonrnc::error::Result<Vec<Input>> {
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    if patterns.is_empty() {
        return Ok(vec![Input::Stdin]);
    }
    let mut out = Vec::<Input>::new();
    for pattern in patterns {
        if pattern == "-" {
            if !out.contains(&Input::Stdin) {
                out.push(Input::Stdin);
            }
        } else if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                let path = entry.map_err(|e| Error::Io(e.into_error()))?;
                matched_any = true;
                out.push(Input::File(path));
            }
            if !matched_any {
                return Err(Error::NoMatch(pattern.clone()));
            }
        } else {
            out.push(Input::File(PathBuf::from(pattern)));
        }
    }
    Ok(out)
}
