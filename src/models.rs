use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// Placeholder for metadata fields the page does not declare.
pub const NOT_SPECIFIED: &str = "not specified";

// ── Modes and formats ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    Metadata,
    Links,
    Headings,
    Images,
    Text,
}

impl ExtractionMode {
    pub const ALL: [ExtractionMode; 5] = [
        ExtractionMode::Metadata,
        ExtractionMode::Links,
        ExtractionMode::Headings,
        ExtractionMode::Images,
        ExtractionMode::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMode::Metadata => "metadata",
            ExtractionMode::Links => "links",
            ExtractionMode::Headings => "headings",
            ExtractionMode::Images => "images",
            ExtractionMode::Text => "text",
        }
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionMode {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExtractionMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| ExtractionError::UnsupportedMode(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Csv,
    Html,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Html => "html",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Json => "application/json",
            OutputFormat::Csv => "text/csv; charset=utf-8",
            OutputFormat::Html => "text/html; charset=utf-8",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "html" => Ok(OutputFormat::Html),
            _ => Err(ExtractionError::UnsupportedFormat(s.to_string())),
        }
    }
}

// ── Extraction results ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractionResult {
    Metadata(MetadataResult),
    Links(LinksResult),
    Headings(HeadingsResult),
    Images(ImagesResult),
    Text(TextResult),
    Unsupported(UnsupportedResult),
}

impl ExtractionResult {
    pub fn count(&self) -> usize {
        match self {
            ExtractionResult::Metadata(r) => r.count,
            ExtractionResult::Links(r) => r.count,
            ExtractionResult::Headings(r) => r.count,
            ExtractionResult::Images(r) => r.count,
            ExtractionResult::Text(r) => r.count,
            ExtractionResult::Unsupported(r) => r.count,
        }
    }

    pub fn mode(&self) -> Option<ExtractionMode> {
        match self {
            ExtractionResult::Metadata(_) => Some(ExtractionMode::Metadata),
            ExtractionResult::Links(_) => Some(ExtractionMode::Links),
            ExtractionResult::Headings(_) => Some(ExtractionMode::Headings),
            ExtractionResult::Images(_) => Some(ExtractionMode::Images),
            ExtractionResult::Text(_) => Some(ExtractionMode::Text),
            ExtractionResult::Unsupported(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataResult {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub charset: String,
    pub language: String,
    pub viewport: String,
    pub robots: String,
    pub author: String,
    pub og: OpenGraph,
    /// Number of fields the page actually declared.
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenGraph {
    pub title: String,
    pub description: String,
    pub image: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkItem {
    pub text: String,
    pub href: String,
    pub is_external: bool,
    pub rel: String,
    pub target: String,
}

impl LinkItem {
    pub const COLUMNS: [&'static str; 5] = ["text", "href", "isExternal", "rel", "target"];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinksResult {
    pub links: Vec<LinkItem>,
    pub total: usize,
    pub internal: usize,
    pub external: usize,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadingItem {
    pub text: String,
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeadingLevel {
    pub count: usize,
    pub items: Vec<HeadingItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadingsResult {
    pub h1: HeadingLevel,
    pub h2: HeadingLevel,
    pub h3: HeadingLevel,
    pub h4: HeadingLevel,
    pub h5: HeadingLevel,
    pub h6: HeadingLevel,
    pub count: usize,
}

impl HeadingsResult {
    pub fn levels(&self) -> [&HeadingLevel; 6] {
        [&self.h1, &self.h2, &self.h3, &self.h4, &self.h5, &self.h6]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageItem {
    pub src: String,
    pub alt: String,
    pub width: Option<String>,
    pub height: Option<String>,
    pub loading: String,
}

impl ImageItem {
    pub const COLUMNS: [&'static str; 5] = ["src", "alt", "width", "height", "loading"];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagesResult {
    pub images: Vec<ImageItem>,
    pub total: usize,
    pub with_alt: usize,
    pub without_alt: usize,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextResult {
    pub sentences: Vec<String>,
    pub sample: String,
    pub word_count: usize,
    pub unique_words: usize,
    pub sentence_count: usize,
    pub character_count: usize,
    pub average_words_per_sentence: f64,
    /// Minutes.
    pub reading_time: usize,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnsupportedResult {
    pub error: String,
    pub count: usize,
}

// ── HTTP request / response ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub url: Option<String>,
    pub html: Option<String>,
    pub base_url: Option<String>,
    pub mode: String,
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    OutputFormat::Json.as_str().to_string()
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub mode: String,
    pub format: OutputFormat,
    pub count: usize,
    pub output: String,
    pub filename: String,
    pub content_type: &'static str,
}
