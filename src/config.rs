use std::str::FromStr;
use std::time::Duration;

// ── Defaults ─────────────────────────────────────────────────────────────────
//
// The caps only bound response size for arbitrarily large pages. Counts in the
// results still reflect everything found.

pub const DEFAULT_MAX_LINKS: usize = 100;
pub const DEFAULT_MAX_HEADINGS_PER_LEVEL: usize = 20;
pub const DEFAULT_MAX_IMAGES: usize = 50;
pub const DEFAULT_MAX_SENTENCES: usize = 50;
pub const DEFAULT_TEXT_SAMPLE_CHARS: usize = 1000;
pub const DEFAULT_LINK_TEXT_CHARS: usize = 100;
pub const DEFAULT_WORDS_PER_MINUTE: usize = 200;

const DEFAULT_BIND: &str = "0.0.0.0:8000";
const DEFAULT_PARSE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Output caps applied by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractLimits {
    pub max_links: usize,
    pub max_headings_per_level: usize,
    pub max_images: usize,
    pub max_sentences: usize,
    pub text_sample_chars: usize,
    pub link_text_chars: usize,
    pub words_per_minute: usize,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            max_links: DEFAULT_MAX_LINKS,
            max_headings_per_level: DEFAULT_MAX_HEADINGS_PER_LEVEL,
            max_images: DEFAULT_MAX_IMAGES,
            max_sentences: DEFAULT_MAX_SENTENCES,
            text_sample_chars: DEFAULT_TEXT_SAMPLE_CHARS,
            link_text_chars: DEFAULT_LINK_TEXT_CHARS,
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
        }
    }
}

impl ExtractLimits {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            max_links: env_or("WEB_PARSER_MAX_LINKS", d.max_links),
            max_headings_per_level: env_or("WEB_PARSER_MAX_HEADINGS", d.max_headings_per_level),
            max_images: env_or("WEB_PARSER_MAX_IMAGES", d.max_images),
            max_sentences: env_or("WEB_PARSER_MAX_SENTENCES", d.max_sentences),
            text_sample_chars: env_or("WEB_PARSER_TEXT_SAMPLE_CHARS", d.text_sample_chars),
            link_text_chars: env_or("WEB_PARSER_LINK_TEXT_CHARS", d.link_text_chars),
            // Zero would make the reading-time estimate divide by zero.
            words_per_minute: env_or("WEB_PARSER_WORDS_PER_MINUTE", d.words_per_minute).max(1),
        }
    }
}

/// Service configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub parse_timeout: Duration,
    pub insecure_ssl: bool,
    /// Request body cap; inline HTML counts against it.
    pub max_body_bytes: usize,
    pub limits: ExtractLimits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            parse_timeout: Duration::from_secs(DEFAULT_PARSE_TIMEOUT_SECS),
            insecure_ssl: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            limits: ExtractLimits::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind: std::env::var("WEB_PARSER_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string()),
            parse_timeout: Duration::from_secs(env_or(
                "WEB_PARSER_PARSE_TIMEOUT_SECS",
                DEFAULT_PARSE_TIMEOUT_SECS,
            )),
            insecure_ssl: std::env::var("WEB_PARSER_INSECURE_SSL").as_deref() == Ok("1"),
            max_body_bytes: env_or("WEB_PARSER_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES),
            limits: ExtractLimits::from_env(),
        }
    }
}

fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => parse_or(key, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T: FromStr + Copy>(key: &str, raw: &str, default: T) -> T {
    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            tracing::warn!(key, value = raw, "ignoring unparseable setting, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = ExtractLimits::default();
        assert_eq!(limits.max_links, 100);
        assert_eq!(limits.max_headings_per_level, 20);
        assert_eq!(limits.max_images, 50);
        assert_eq!(limits.max_sentences, 50);
        assert_eq!(limits.text_sample_chars, 1000);
        assert_eq!(limits.words_per_minute, 200);
    }

    #[test]
    fn test_parse_or_falls_back() {
        assert_eq!(parse_or("K", " 42 ", 7usize), 42);
        assert_eq!(parse_or("K", "lots", 7usize), 7);
        assert_eq!(parse_or("K", "-1", 7usize), 7);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.bind, "0.0.0.0:8000");
        assert_eq!(config.parse_timeout, Duration::from_secs(30));
        assert!(!config.insecure_ssl);
        assert_eq!(config.max_body_bytes, 10 * 1024 * 1024);
    }
}
