//! Structured data extraction from HTML pages.
//!
//! A page is parsed once into a [`ParsedDocument`], one view of it is
//! extracted according to an [`ExtractionMode`]:
//! - metadata (title, meta tags, OpenGraph)
//! - links with internal/external classification
//! - headings grouped by level
//! - images with alt-text coverage
//! - text statistics
//!
//! and the result is serialized as JSON, CSV or HTML by [`format()`].

pub mod api;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod format;
pub mod models;

pub use config::{Config, ExtractLimits};
pub use document::ParsedDocument;
pub use error::ExtractionError;
pub use extract::{extract, extract_named, Extractor};
pub use format::{format, format_named, format_value};
pub use models::{ExtractionMode, ExtractionResult, OutputFormat};
