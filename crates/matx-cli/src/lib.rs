//! Command implementations behind the `matx` binary.
//!
//! Every command returns a [`Report`] instead of printing, so tests can drive
//! them directly and the binary decides where output goes.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use serde_json::json;
use tracing::{debug, info};

use matx_lang::{Diagnostic, EnvNamespace, LibraryRegistry, Options, Session, Value};

/// Sources larger than this are rejected before lexing.
pub const MAX_SOURCE_SIZE: usize = 1_000_000;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Rendered command output.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub output: String,
    /// True when an error diagnostic was produced.
    pub failed: bool,
}

impl Report {
    fn ok(output: String) -> Self {
        Self { output, failed: false }
    }

    fn failed(output: String) -> Self {
        Self { output, failed: true }
    }
}

// ─── Session setup ───────────────────────────────────────────────────────────

/// Parse a `name=value` pair given to `--env`.
pub fn parse_env_pair(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, found `{s}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in `{s}`"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("`{}` is not a number", value.trim()))?;
    Ok((name.to_string(), value))
}

/// Read `Options` from a JSON file. Missing keys keep their defaults.
pub fn load_options(path: Option<&Path>) -> Result<Options> {
    let Some(path) = path else {
        return Ok(Options::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let options: Options = serde_json::from_str(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;
    debug!(?options, "loaded config");
    Ok(options)
}

/// Standard libraries plus an `env` namespace filled from `--env-file`
/// first and then `--env` pairs, so pairs win.
pub fn build_session(
    options: Options,
    env_file: Option<&Path>,
    env_pairs: &[(String, f64)],
) -> Result<Session> {
    let mut env = EnvNamespace::default();

    if let Some(path) = env_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read env file {}", path.display()))?;
        let values: BTreeMap<String, f64> = serde_json::from_str(&text)
            .with_context(|| format!("env file {} must be an object of numbers", path.display()))?;
        for (name, value) in &values {
            env.set(name, *value)
                .with_context(|| format!("in env file {}", path.display()))?;
        }
    }
    for (name, value) in env_pairs {
        env.set(name, *value).context("invalid --env value")?;
    }

    let mut libraries = LibraryRegistry::standard();
    libraries.register(Box::new(env));
    Ok(Session::new(libraries, options))
}

pub fn read_source(path: &Path) -> Result<String> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if source.len() > MAX_SOURCE_SIZE {
        bail!(
            "{} exceeds the {} byte source limit ({} bytes)",
            path.display(),
            MAX_SOURCE_SIZE,
            source.len()
        );
    }
    Ok(source)
}

// ─── Commands ────────────────────────────────────────────────────────────────

/// Compile and evaluate, printing the root result.
pub fn cmd_run(session: &Session, path: &Path, format: OutputFormat) -> Result<Report> {
    let source = read_source(path)?;
    let name = path.display().to_string();

    let program = match session.compile(&source) {
        Ok(program) => program,
        Err(errors) => return Ok(diagnostics_report(&name, &source, &errors, format)),
    };
    info!(file = %name, warnings = program.warnings.len(), "compiled");

    match session.evaluate(&program) {
        Ok(value) => Ok(match format {
            OutputFormat::Text => {
                let mut out = render_all(&name, &source, &program.warnings);
                out.push_str(&format!("{value}\n"));
                Report::ok(out)
            }
            OutputFormat::Json => Report::ok(json_line(json!({
                "result": value_json(&value),
                "type": value.ty().name(),
                "diagnostics": program.warnings,
            }))),
        }),
        Err(errors) => {
            let mut all = program.warnings;
            all.extend(errors);
            Ok(diagnostics_report(&name, &source, &all, format))
        }
    }
}

/// Compile only and print diagnostics.
pub fn cmd_check(session: &Session, path: &Path, format: OutputFormat) -> Result<Report> {
    let source = read_source(path)?;
    let name = path.display().to_string();

    match session.compile(&source) {
        Ok(program) => {
            let out = match format {
                OutputFormat::Text => {
                    let mut out = render_all(&name, &source, &program.warnings);
                    let ty = program.result_type().map(|t| t.name()).unwrap_or("?");
                    out.push_str(&format!("{name}: ok ({ty})\n"));
                    out
                }
                OutputFormat::Json => json_line(json!({
                    "ok": true,
                    "type": program.result_type().map(|t| t.name()),
                    "diagnostics": program.warnings,
                })),
            };
            Ok(Report::ok(out))
        }
        Err(errors) => Ok(diagnostics_report(&name, &source, &errors, format)),
    }
}

/// Dump the token stream, one token per line.
pub fn cmd_tokens(session: &Session, path: &Path, format: OutputFormat) -> Result<Report> {
    let source = read_source(path)?;
    let name = path.display().to_string();

    match session.tokenize(&source) {
        Ok(tokens) => Ok(Report::ok(match format {
            OutputFormat::Text => tokens
                .iter()
                .map(|t| format!("{}:{}\t{:?}\n", t.line, t.column, t.kind))
                .collect(),
            OutputFormat::Json => json_line(serde_json::to_value(&tokens)?),
        })),
        Err(errors) => Ok(diagnostics_report(&name, &source, &errors, format)),
    }
}

/// Dump the parsed statement tree.
pub fn cmd_ast(session: &Session, path: &Path, format: OutputFormat) -> Result<Report> {
    let source = read_source(path)?;
    let name = path.display().to_string();

    match session.parse(&source) {
        Ok(statements) => Ok(Report::ok(match format {
            OutputFormat::Text => format!("{statements:#?}\n"),
            OutputFormat::Json => json_line(serde_json::to_value(&statements)?),
        })),
        Err(errors) => Ok(diagnostics_report(&name, &source, &errors, format)),
    }
}

// ─── Rendering ───────────────────────────────────────────────────────────────

fn diagnostics_report(name: &str, source: &str, diagnostics: &[Diagnostic], format: OutputFormat) -> Report {
    let output = match format {
        OutputFormat::Text => render_all(name, source, diagnostics),
        OutputFormat::Json => json_line(json!({ "ok": false, "diagnostics": diagnostics })),
    };
    if diagnostics.iter().any(Diagnostic::is_error) {
        Report::failed(output)
    } else {
        Report::ok(output)
    }
}

fn render_all(name: &str, source: &str, diagnostics: &[Diagnostic]) -> String {
    diagnostics.iter().map(|d| render_diagnostic(name, source, d)).collect()
}

/// `file:line:col: error[CODE]: message` followed by the source line and a
/// caret underline.
pub fn render_diagnostic(name: &str, source: &str, d: &Diagnostic) -> String {
    let severity = if d.is_error() { "error" } else { "warning" };
    let mut out = format!("{name}:{}:{}: {severity}[{}]: {}\n", d.line, d.column, d.code, d.message);

    if let Some(text) = source.lines().nth(d.line.saturating_sub(1)) {
        let gutter = d.line.to_string();
        let pad = " ".repeat(gutter.len());
        // multi-line spans are underlined to the end of the first line
        let last = if d.end_line == d.line { d.end_column } else { text.chars().count() };
        let start = d.column.max(1);
        let width = last.saturating_add(1).saturating_sub(start).max(1);
        out.push_str(&format!("{pad} |\n{gutter} | {text}\n{pad} | "));
        out.push_str(&" ".repeat(start - 1));
        out.push_str(&"^".repeat(width));
        out.push('\n');
    }
    out
}

fn value_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Int(i) => json!(i),
        Value::Num(n) => json!(n),
        Value::Bool(b) => json!(b),
        other => json!(other.components()),
    }
}

fn json_line(value: serde_json::Value) -> String {
    format!("{value}\n")
}
