use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::config::ExtractLimits;
use crate::document::{normalize_text, ParsedDocument};
use crate::error::ExtractionError;
use crate::models::{
    ExtractionMode, ExtractionResult, HeadingItem, HeadingLevel, HeadingsResult, ImageItem,
    ImagesResult, LinkItem, LinksResult, MetadataResult, OpenGraph, TextResult,
    UnsupportedResult, NOT_SPECIFIED,
};

// ── Constants ────────────────────────────────────────────────────────────────

const NO_LINK_TEXT: &str = "[no text]";
const DEFAULT_LINK_TARGET: &str = "_self";
const DEFAULT_IMAGE_LOADING: &str = "eager";
const TRUNCATION_MARKER: &str = "...";
/// Sentences of this many characters or fewer are dropped as noise.
const MIN_SENTENCE_CHARS: usize = 10;

// ── Lazy static regexes ──────────────────────────────────────────────────────

static SENTENCE_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[\w']+\b").unwrap());

// ── Public API ───────────────────────────────────────────────────────────────

/// Extract with the default limits.
pub fn extract(doc: &ParsedDocument, mode: ExtractionMode, base_url: &str) -> ExtractionResult {
    Extractor::default().extract(doc, mode, base_url)
}

/// Extract by mode name. Unknown names produce an `Unsupported` result with a
/// zero count instead of falling back to some other mode.
pub fn extract_named(doc: &ParsedDocument, mode: &str, base_url: &str) -> ExtractionResult {
    Extractor::default().extract_named(doc, mode, base_url)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Extractor {
    limits: ExtractLimits,
}

impl Extractor {
    pub fn new(limits: ExtractLimits) -> Self {
        Self { limits }
    }

    pub fn extract(
        &self,
        doc: &ParsedDocument,
        mode: ExtractionMode,
        base_url: &str,
    ) -> ExtractionResult {
        let base = Url::parse(base_url).ok();
        if base.is_none() {
            tracing::debug!(base_url, "base URL does not parse; relative references will be skipped");
        }

        let result = match mode {
            ExtractionMode::Metadata => ExtractionResult::Metadata(extract_metadata(doc)),
            ExtractionMode::Links => {
                ExtractionResult::Links(self.extract_links(doc, base.as_ref()))
            }
            ExtractionMode::Headings => ExtractionResult::Headings(self.extract_headings(doc)),
            ExtractionMode::Images => {
                ExtractionResult::Images(self.extract_images(doc, base.as_ref()))
            }
            ExtractionMode::Text => ExtractionResult::Text(self.extract_text(doc)),
        };

        tracing::debug!(%mode, count = result.count(), "extraction finished");
        result
    }

    pub fn extract_named(
        &self,
        doc: &ParsedDocument,
        mode: &str,
        base_url: &str,
    ) -> ExtractionResult {
        match mode.parse::<ExtractionMode>() {
            Ok(mode) => self.extract(doc, mode, base_url),
            Err(e) => {
                tracing::warn!(mode, "unsupported extraction mode requested");
                ExtractionResult::Unsupported(UnsupportedResult {
                    error: e.to_string(),
                    count: 0,
                })
            }
        }
    }

    // ── Links ────────────────────────────────────────────────────────────────

    fn extract_links(&self, doc: &ParsedDocument, base: Option<&Url>) -> LinksResult {
        let resolve_base = resolution_base(doc, base);
        let base_host = base.and_then(|b| b.host_str());

        let mut links = Vec::new();
        let (mut total, mut external) = (0usize, 0usize);

        for anchor in &doc.anchors {
            let href = anchor.href.trim();
            if !is_followable_href(href) {
                continue;
            }

            let resolved = match resolve_reference(resolve_base.as_ref(), href) {
                Ok(u) => u,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping link");
                    continue;
                }
            };
            // The URL parser drops tabs, newlines and leading control
            // characters, so the raw-text check alone is not enough.
            if resolved.scheme() == "javascript" {
                continue;
            }

            let is_external = resolved.host_str() != base_host;
            total += 1;
            if is_external {
                external += 1;
            }

            if links.len() >= self.limits.max_links {
                continue;
            }

            let text = truncate_chars(&normalize_text(&anchor.text), self.limits.link_text_chars);
            links.push(LinkItem {
                text: if text.is_empty() {
                    NO_LINK_TEXT.to_string()
                } else {
                    text
                },
                href: resolved.to_string(),
                is_external,
                rel: anchor.rel.clone().unwrap_or_default(),
                target: anchor
                    .target
                    .clone()
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_LINK_TARGET.to_string()),
            });
        }

        LinksResult {
            links,
            total,
            internal: total - external,
            external,
            count: total,
        }
    }

    // ── Headings ─────────────────────────────────────────────────────────────

    fn extract_headings(&self, doc: &ParsedDocument) -> HeadingsResult {
        let mut levels: [HeadingLevel; 6] = Default::default();

        for heading in &doc.headings {
            let Some(bucket) = (heading.level as usize)
                .checked_sub(1)
                .and_then(|i| levels.get_mut(i))
            else {
                continue;
            };
            bucket.count += 1;
            if bucket.items.len() < self.limits.max_headings_per_level {
                bucket.items.push(HeadingItem {
                    text: heading.text.clone(),
                    id: heading.id.clone().filter(|id| !id.trim().is_empty()),
                });
            }
        }

        let count = levels.iter().map(|l| l.count).sum();
        let [h1, h2, h3, h4, h5, h6] = levels;
        HeadingsResult {
            h1,
            h2,
            h3,
            h4,
            h5,
            h6,
            count,
        }
    }

    // ── Images ───────────────────────────────────────────────────────────────

    fn extract_images(&self, doc: &ParsedDocument, base: Option<&Url>) -> ImagesResult {
        let resolve_base = resolution_base(doc, base);

        let mut images = Vec::new();
        let (mut total, mut with_alt) = (0usize, 0usize);

        for image in &doc.images {
            let Some(src) = image.src.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
                continue;
            };

            let resolved = match resolve_reference(resolve_base.as_ref(), src) {
                Ok(u) => u,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping image");
                    continue;
                }
            };

            let alt = image.alt.clone().unwrap_or_default();
            total += 1;
            if !alt.trim().is_empty() {
                with_alt += 1;
            }

            if images.len() >= self.limits.max_images {
                continue;
            }

            images.push(ImageItem {
                src: resolved.to_string(),
                alt,
                width: non_empty(image.width.as_deref()),
                height: non_empty(image.height.as_deref()),
                loading: non_empty(image.loading.as_deref())
                    .unwrap_or_else(|| DEFAULT_IMAGE_LOADING.to_string()),
            });
        }

        ImagesResult {
            images,
            total,
            with_alt,
            without_alt: total - with_alt,
            count: total,
        }
    }

    // ── Text ─────────────────────────────────────────────────────────────────

    fn extract_text(&self, doc: &ParsedDocument) -> TextResult {
        let text = normalize_text(&doc.body_text);

        let all_sentences: Vec<&str> = SENTENCE_SPLIT_RE
            .split(&text)
            .map(str::trim)
            .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
            .collect();
        let sentence_count = all_sentences.len();

        let lower = text.to_lowercase();
        let words: Vec<&str> = WORD_RE.find_iter(&lower).map(|m| m.as_str()).collect();
        let word_count = words.len();
        let unique_words = words.iter().collect::<HashSet<_>>().len();

        let average = word_count as f64 / sentence_count.max(1) as f64;

        TextResult {
            sentences: all_sentences
                .iter()
                .take(self.limits.max_sentences)
                .map(|s| s.to_string())
                .collect(),
            sample: truncate_with_marker(&text, self.limits.text_sample_chars),
            word_count,
            unique_words,
            sentence_count,
            character_count: text.chars().count(),
            average_words_per_sentence: (average * 10.0).round() / 10.0,
            reading_time: word_count.div_ceil(self.limits.words_per_minute.max(1)),
            count: sentence_count,
        }
    }
}

// ── Metadata ─────────────────────────────────────────────────────────────────

fn extract_metadata(doc: &ParsedDocument) -> MetadataResult {
    let mut specified = 0usize;
    let mut field = |value: Option<&str>| match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => {
            specified += 1;
            v.to_string()
        }
        None => NOT_SPECIFIED.to_string(),
    };

    let title = field(doc.title.as_deref());
    let description = field(doc.meta_content("description"));
    let keywords = field(doc.meta_content("keywords"));
    let charset = field(doc.charset.as_deref());
    let language = field(doc.language.as_deref());
    let viewport = field(doc.meta_content("viewport"));
    let robots = field(doc.meta_content("robots"));
    let author = field(doc.meta_content("author"));
    let og = OpenGraph {
        title: field(doc.meta_content("og:title")),
        description: field(doc.meta_content("og:description")),
        image: field(doc.meta_content("og:image")),
        kind: field(doc.meta_content("og:type")),
    };

    MetadataResult {
        title,
        description,
        keywords,
        charset,
        language,
        viewport,
        robots,
        author,
        og,
        count: specified,
    }
}

// ── URL helpers ──────────────────────────────────────────────────────────────

/// The document's `<base href>` wins over the request URL when it resolves.
fn resolution_base(doc: &ParsedDocument, base: Option<&Url>) -> Option<Url> {
    match (doc.base_href.as_deref(), base) {
        (Some(href), Some(b)) => b.join(href).ok().or_else(|| Some(b.clone())),
        (Some(href), None) => Url::parse(href).ok(),
        (None, b) => b.cloned(),
    }
}

fn resolve_reference(base: Option<&Url>, reference: &str) -> Result<Url, ExtractionError> {
    let resolved = match base {
        Some(b) => b.join(reference),
        None => Url::parse(reference),
    };
    resolved.map_err(|e| ExtractionError::MalformedReference(format!("{reference}: {e}")))
}

fn is_followable_href(href: &str) -> bool {
    if href.is_empty() || href.starts_with('#') {
        return false;
    }
    let scheme_prefix = href.get(..11).unwrap_or(href);
    !scheme_prefix.eq_ignore_ascii_case("javascript:")
}

// ── String helpers ───────────────────────────────────────────────────────────

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn truncate_with_marker(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}{}", truncate_chars(text, max_chars), TRUNCATION_MARKER)
    } else {
        text.to_string()
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
