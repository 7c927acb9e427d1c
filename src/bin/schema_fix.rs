//! schema-fix: 离线修复请求体中的工具 schema（dry run）
//!
//! Usage:
//!   schema-fix [<file>|-] [--pretty]     Normalize a chat-completions request body
//!
//! Reads a JSON request body from a file (or stdin), prints the body exactly as the
//! schema-fixing transport would forward it, and a summary on stderr. Output is the body
//! bytes only; no trailing newline is added.

use ai_schema_fix::{normalize_tool_schemas, NormalizeReport};
use anyhow::Context;
use std::io::{Read, Write};

fn print_usage() {
    println!(
        r#"schema-fix: repair tool parameter schemas in a request body

USAGE:
    schema-fix [<file>|-] [--pretty]

OPTIONS:
    --pretty        Pretty-print the normalized JSON
    -h, --help      Show this help message

ENVIRONMENT:
    RUST_LOG        Log filter (e.g. "ai_schema_fix=debug")"#
    );
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut path: Option<String> = None;
    let mut pretty = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--pretty" => pretty = true,
            "help" | "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            "-" => path = None,
            other if other.starts_with("--") => {
                eprintln!("Unknown option: {other}");
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
            other => path = Some(other.to_string()),
        }
    }

    let input = match &path {
        Some(p) => std::fs::read(p).with_context(|| format!("reading {p}"))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };

    let (output, report) = render(&input, pretty)?;
    std::io::stdout().lock().write_all(&output)?;

    match report {
        Some(report) => eprintln!(
            "tools: {}, schemas fixed: {}",
            report.tools_seen, report.schemas_fixed
        ),
        None => eprintln!("input is not a JSON object; forwarded unchanged"),
    }
    Ok(())
}

/// The bytes to print plus the repair report. `None` means the input is not a JSON object.
fn render(input: &[u8], pretty: bool) -> anyhow::Result<(Vec<u8>, Option<NormalizeReport>)> {
    // Same rule as the transport: anything that is not a JSON object goes out untouched.
    let mut document = match serde_json::from_slice::<serde_json::Value>(input) {
        Ok(v) if v.is_object() => v,
        Ok(_) | Err(_) => return Ok((input.to_vec(), None)),
    };

    let report = normalize_tool_schemas(&mut document);
    let output = if pretty {
        serde_json::to_vec_pretty(&document)?
    } else if report.changed() {
        serde_json::to_vec(&document)?
    } else {
        input.to_vec()
    };
    Ok((output, Some(report)))
}
