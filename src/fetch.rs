use std::time::Duration;

use url::Url;

use crate::error::ExtractionError;

const USER_AGENT: &str = "web-parser-api/0.1 (compatible)";
/// Bodies shorter than this are treated as a failed fetch.
const MIN_BODY_LEN: usize = 100;

// ── URL validation ───────────────────────────────────────────────────────────

pub fn validate_url(url: &str) -> Result<Url, ExtractionError> {
    let parsed = Url::parse(url.trim())
        .map_err(|_| ExtractionError::InvalidUrl("Invalid URL".to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(ExtractionError::InvalidUrl(
            "Only http and https URLs are allowed".to_string(),
        )),
    }
}

// ── HTTP fetch ───────────────────────────────────────────────────────────────

pub fn build_client(insecure: bool) -> Result<reqwest::Client, ExtractionError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("text/html,application/xhtml+xml"),
    );
    headers.insert(
        reqwest::header::CACHE_CONTROL,
        reqwest::header::HeaderValue::from_static("no-cache"),
    );

    let mut builder = reqwest::ClientBuilder::new()
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(10))
        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent(USER_AGENT)
        .default_headers(headers);

    if insecure {
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder
        .build()
        .map_err(|e| ExtractionError::Request(e.to_string()))
}

pub async fn fetch_html(client: &reqwest::Client, url: &Url) -> Result<String, ExtractionError> {
    let response = client.get(url.as_str()).send().await.map_err(|e| {
        tracing::warn!(%url, error = %e, "fetch failed");
        if e.is_timeout() {
            ExtractionError::Request(format!("TimeoutError: {}", e))
        } else if e.is_connect() {
            ExtractionError::Request(format!("ConnectError: {}", e))
        } else {
            ExtractionError::Request(format!("RequestError: {}", e))
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(%url, status = status.as_u16(), "upstream returned an error");
        return Err(ExtractionError::Upstream(status.as_u16()));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_lowercase();

    if !is_html_content_type(&content_type) {
        return Err(ExtractionError::NotHtml);
    }

    let body = response
        .text()
        .await
        .map_err(|e| ExtractionError::Request(e.to_string()))?;

    check_body(body)
}

fn is_html_content_type(content_type: &str) -> bool {
    content_type.contains("html")
}

fn check_body(body: String) -> Result<String, ExtractionError> {
    if body.trim().len() < MIN_BODY_LEN {
        return Err(ExtractionError::EmptyResponse);
    }
    Ok(body)
}
