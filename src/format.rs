//! Serialization of extraction results to JSON, CSV and HTML.
//!
//! CSV has two shapes. Link and image results are tables with one row per
//! item. Everything else is flattened to dotted key paths and written as a
//! single header row plus a single value row.

use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde_json::{Map, Value};

use crate::error::ExtractionError;
use crate::models::{ExtractionResult, ImageItem, LinkItem, OutputFormat};

const EXPORT_PREFIX: &str = "web-parser-results";
const HTML_TITLE: &str = "Web Parser Results";
const HTML_HEADING: &str = "Extraction results";

// ── Public API ───────────────────────────────────────────────────────────────

pub fn format(result: &ExtractionResult, fmt: OutputFormat) -> Result<String, ExtractionError> {
    match (fmt, result) {
        (OutputFormat::Json, _) => Ok(serde_json::to_string_pretty(result)?),
        (OutputFormat::Csv, ExtractionResult::Links(r)) => table_csv(&LinkItem::COLUMNS, &r.links),
        (OutputFormat::Csv, ExtractionResult::Images(r)) => {
            table_csv(&ImageItem::COLUMNS, &r.images)
        }
        _ => format_value(&serde_json::to_value(result)?, fmt),
    }
}

/// Format by name. Unknown names are an error rather than a JSON fallback.
pub fn format_named(result: &ExtractionResult, fmt: &str) -> Result<String, ExtractionError> {
    format(result, fmt.parse()?)
}

/// Format an arbitrary record. CSV output is always the flattened shape here.
pub fn format_value(value: &Value, fmt: OutputFormat) -> Result<String, ExtractionError> {
    match fmt {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Csv => flat_csv(value),
        OutputFormat::Html => Ok(html_document(value)),
    }
}

/// Download name for a result, `web-parser-results-<millis>.<ext>`.
pub fn export_filename(fmt: OutputFormat, timestamp_millis: u128) -> String {
    format!("{}-{}.{}", EXPORT_PREFIX, timestamp_millis, fmt.extension())
}

// ── CSV ──────────────────────────────────────────────────────────────────────

fn table_csv<T: serde::Serialize>(
    columns: &[&str],
    items: &[T],
) -> Result<String, ExtractionError> {
    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        let value = serde_json::to_value(item)?;
        rows.push(
            columns
                .iter()
                .map(|c| value.get(*c).map(leaf_text).unwrap_or_default())
                .collect::<Vec<_>>(),
        );
    }
    write_csv(columns, &rows)
}

fn flat_csv(value: &Value) -> Result<String, ExtractionError> {
    let mut leaves = Vec::new();
    match value {
        Value::Object(map) => flatten_into(None, map, &mut leaves),
        other => leaves.push(("value".to_string(), leaf_text(other))),
    }
    if leaves.is_empty() {
        return Ok(String::new());
    }

    let (header, row): (Vec<String>, Vec<String>) = leaves.into_iter().unzip();
    write_csv(&header, &[row])
}

/// Flatten nested objects into `(dotted.path, text)` pairs in key order.
/// Arrays and primitives are leaves.
pub fn flatten(value: &Value) -> Vec<(String, String)> {
    let mut leaves = Vec::new();
    if let Value::Object(map) = value {
        flatten_into(None, map, &mut leaves);
    }
    leaves
}

fn flatten_into(prefix: Option<&str>, map: &Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, value) in map {
        let path = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(nested) => flatten_into(Some(&path), nested, out),
            leaf => out.push((path, leaf_text(leaf))),
        }
    }
}

fn leaf_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // Arrays stay whole; nested objects only reach here inside arrays.
        other => other.to_string(),
    }
}

/// Header cells are quoted only when needed, value cells always.
fn write_csv<H: AsRef<[u8]>>(header: &[H], rows: &[Vec<String>]) -> Result<String, ExtractionError> {
    let mut head = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    head.write_record(header)?;
    let buf = head
        .into_inner()
        .map_err(|e| ExtractionError::Csv(e.to_string()))?;

    let mut body = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(buf);
    for row in rows {
        body.write_record(row)?;
    }
    let buf = body
        .into_inner()
        .map_err(|e| ExtractionError::Csv(e.to_string()))?;

    String::from_utf8(buf).map_err(|e| ExtractionError::Csv(e.to_string()))
}

// ── HTML ─────────────────────────────────────────────────────────────────────

fn html_document(value: &Value) -> String {
    let mut out = String::from(
        "<!DOCTYPE html><html><head><meta charset=\"UTF-8\"><title>",
    );
    out.push_str(HTML_TITLE);
    out.push_str("</title></head><body><h1>");
    out.push_str(HTML_HEADING);
    out.push_str("</h1>");
    render_html(value, &mut out);
    out.push_str("</body></html>");
    out
}

/// Objects become definition lists, arrays unordered lists, leaves text.
fn render_html(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            out.push_str("<dl>");
            for (key, v) in map {
                out.push_str("<dt>");
                out.push_str(&escape_html(key));
                out.push_str("</dt><dd>");
                render_html(v, out);
                out.push_str("</dd>");
            }
            out.push_str("</dl>");
        }
        Value::Array(items) => {
            out.push_str("<ul>");
            for item in items {
                out.push_str("<li>");
                render_html(item, out);
                out.push_str("</li>");
            }
            out.push_str("</ul>");
        }
        leaf => out.push_str(&escape_html(&leaf_text(leaf))),
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
