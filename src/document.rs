use once_cell::sync::Lazy;
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

// ── Lazy statics ─────────────────────────────────────────────────────────────

static TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static META_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("meta").unwrap());
static ANCHOR_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static HEADING_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3, h4, h5, h6").unwrap());
static IMG_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
static BODY_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());
static BASE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("base[href]").unwrap());

static CONTENT_TYPE_CHARSET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^\s;"']+)"#).unwrap());

/// Elements whose text never counts as readable body text.
const NON_TEXT_TAGS: &[&str] = &["script", "style", "noscript", "template"];

// ── Document model ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaTag {
    pub name: Option<String>,
    pub property: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Anchor {
    pub href: String,
    pub text: String,
    pub rel: Option<String>,
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    /// 1 through 6.
    pub level: u8,
    pub text: String,
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Image {
    pub src: Option<String>,
    pub alt: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub loading: Option<String>,
}

/// Everything the extractor reads from a page, captured in one pass over the
/// parsed tree. Malformed HTML still yields a document, possibly empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDocument {
    pub title: Option<String>,
    pub meta: Vec<MetaTag>,
    pub anchors: Vec<Anchor>,
    pub headings: Vec<Heading>,
    pub images: Vec<Image>,
    pub body_text: String,
    pub charset: Option<String>,
    pub language: Option<String>,
    pub base_href: Option<String>,
}

impl ParsedDocument {
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);

        let title = document
            .select(&TITLE_SEL)
            .next()
            .map(|el| normalize_text(&collect_text(el)))
            .filter(|s| !s.is_empty());

        let mut meta = Vec::new();
        let mut charset = None;
        for el in document.select(&META_SEL) {
            let v = el.value();
            if charset.is_none() {
                charset = v
                    .attr("charset")
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .or_else(|| {
                        let equiv = v.attr("http-equiv")?;
                        if !equiv.eq_ignore_ascii_case("content-type") {
                            return None;
                        }
                        CONTENT_TYPE_CHARSET_RE
                            .captures(v.attr("content")?)
                            .map(|cap| cap[1].to_string())
                    });
            }
            meta.push(MetaTag {
                name: v.attr("name").map(str::to_string),
                property: v.attr("property").map(str::to_string),
                content: v.attr("content").map(str::to_string),
            });
        }

        let anchors = document
            .select(&ANCHOR_SEL)
            .map(|el| {
                let v = el.value();
                Anchor {
                    href: v.attr("href").unwrap_or("").to_string(),
                    text: collect_text(el),
                    rel: v.attr("rel").map(str::to_string),
                    target: v.attr("target").map(str::to_string),
                }
            })
            .collect();

        let headings = document
            .select(&HEADING_SEL)
            .filter_map(|el| {
                let level = el.value().name()[1..].parse::<u8>().ok()?;
                Some(Heading {
                    level,
                    text: normalize_text(&collect_text(el)),
                    id: el.value().id().map(str::to_string),
                })
            })
            .collect();

        let images = document
            .select(&IMG_SEL)
            .map(|el| {
                let v = el.value();
                Image {
                    src: v.attr("src").map(str::to_string),
                    alt: v.attr("alt").map(str::to_string),
                    width: v.attr("width").map(str::to_string),
                    height: v.attr("height").map(str::to_string),
                    loading: v.attr("loading").map(str::to_string),
                }
            })
            .collect();

        let body_text = document
            .select(&BODY_SEL)
            .next()
            .map(collect_readable_text)
            .unwrap_or_default();

        let language = document
            .root_element()
            .value()
            .attr("lang")
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());

        let base_href = document
            .select(&BASE_SEL)
            .next()
            .and_then(|el| el.value().attr("href"))
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());

        ParsedDocument {
            title,
            meta,
            anchors,
            headings,
            images,
            body_text,
            charset: charset.map(|c| c.to_uppercase()),
            language,
            base_href,
        }
    }

    /// Content of the first meta tag whose `name` or `property` equals `key`.
    pub fn meta_content(&self, key: &str) -> Option<&str> {
        self.meta
            .iter()
            .find(|m| m.name.as_deref() == Some(key) || m.property.as_deref() == Some(key))
            .and_then(|m| m.content.as_deref())
    }
}

// ── DOM utility helpers ──────────────────────────────────────────────────────

/// Recursively collect all text from an element and its descendants.
fn collect_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    for text in el.text() {
        out.push_str(text);
    }
    out
}

/// Like `collect_text`, but skips script-like subtrees.
fn collect_readable_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_readable_text(el, &mut out);
    out
}

fn push_readable_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&*text.text),
            Node::Element(child_el) => {
                if NON_TEXT_TAGS.contains(&child_el.name()) {
                    continue;
                }
                if let Some(child_ref) = ElementRef::wrap(child) {
                    push_readable_text(child_ref, out);
                }
            }
            _ => {}
        }
    }
}

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_head() {
        let doc = ParsedDocument::parse(
            r#"<html lang="en"><head>
                <meta charset="utf-8">
                <title>  Example
                  Domain </title>
                <meta name="description" content="An example">
                <meta property="og:title" content="OG Example">
                <base href="/docs/">
            </head><body></body></html>"#,
        );
        assert_eq!(doc.title.as_deref(), Some("Example Domain"));
        assert_eq!(doc.charset.as_deref(), Some("UTF-8"));
        assert_eq!(doc.language.as_deref(), Some("en"));
        assert_eq!(doc.base_href.as_deref(), Some("/docs/"));
        assert_eq!(doc.meta_content("description"), Some("An example"));
        assert_eq!(doc.meta_content("og:title"), Some("OG Example"));
        assert_eq!(doc.meta_content("keywords"), None);
    }

    #[test]
    fn test_charset_from_http_equiv() {
        let doc = ParsedDocument::parse(
            r#"<head><meta http-equiv="Content-Type" content="text/html; charset=windows-1251"></head>"#,
        );
        assert_eq!(doc.charset.as_deref(), Some("WINDOWS-1251"));
    }

    #[test]
    fn test_first_meta_wins() {
        let doc = ParsedDocument::parse(
            r#"<head><meta name="robots" content="noindex"><meta name="robots" content="all"></head>"#,
        );
        assert_eq!(doc.meta_content("robots"), Some("noindex"));
    }

    #[test]
    fn test_body_text_skips_scripts() {
        let doc = ParsedDocument::parse(
            "<body><p>Visible text.</p><script>var hidden = 1;</script><style>p{}</style></body>",
        );
        assert!(doc.body_text.contains("Visible text."));
        assert!(!doc.body_text.contains("hidden"));
        assert!(!doc.body_text.contains("p{}"));
    }

    #[test]
    fn test_headings_in_document_order() {
        let doc = ParsedDocument::parse(
            r#"<body><h2>Second</h2><h1 id="top">First</h1><h6>  Deep
            one </h6></body>"#,
        );
        let levels: Vec<u8> = doc.headings.iter().map(|h| h.level).collect();
        assert_eq!(levels, vec![2, 1, 6]);
        assert_eq!(doc.headings[1].id.as_deref(), Some("top"));
        assert_eq!(doc.headings[2].text, "Deep one");
    }

    #[test]
    fn test_empty_input() {
        let doc = ParsedDocument::parse("");
        assert!(doc.title.is_none());
        assert!(doc.anchors.is_empty());
        assert!(doc.images.is_empty());
        assert!(doc.headings.is_empty());
        assert!(doc.body_text.trim().is_empty());
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  a \n\t b  c "), "a b c");
        assert_eq!(normalize_text("   "), "");
    }
}
