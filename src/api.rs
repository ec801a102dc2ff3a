use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::sync::Semaphore;

use crate::config::Config;
use crate::document::ParsedDocument;
use crate::error::ExtractionError;
use crate::extract::Extractor;
use crate::fetch::{build_client, fetch_html, validate_url};
use crate::format::{export_filename, format};
use crate::models::{ExtractRequest, ExtractResponse, OutputFormat};

#[derive(Clone)]
pub struct AppState {
    extractor: Extractor,
    parse_timeout: Duration,
    client: reqwest::Client,
    max_body_bytes: usize,
    /// One permit: a second extraction is refused while one is running.
    in_flight: Arc<Semaphore>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, ExtractionError> {
        Ok(Self {
            extractor: Extractor::new(config.limits),
            parse_timeout: config.parse_timeout,
            client: build_client(config.insecure_ssl)?,
            max_body_bytes: config.max_body_bytes,
            in_flight: Arc::new(Semaphore::new(1)),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/extract", post(extract_endpoint))
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn extract_endpoint(
    State(state): State<AppState>,
    Json(req): Json<ExtractRequest>,
) -> Response {
    match run_extraction(&state, req).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "extraction request failed");
            e.into_response()
        }
    }
}

async fn run_extraction(
    state: &AppState,
    req: ExtractRequest,
) -> Result<ExtractResponse, ExtractionError> {
    let fmt: OutputFormat = req.format.parse()?;

    // Owned so it can move into the blocking task: a parse that outlives its
    // request still holds the slot until it finishes.
    let permit = state
        .in_flight
        .clone()
        .try_acquire_owned()
        .map_err(|_| ExtractionError::Busy)?;

    let (html, base_url) = match (req.url, req.html) {
        (Some(url), None) => {
            let url = validate_url(&url)?;
            let html = fetch_html(&state.client, &url).await?;
            (html, url.to_string())
        }
        (None, Some(html)) => {
            let base = req.base_url.ok_or_else(|| {
                ExtractionError::BadRequest("base_url is required with inline html".to_string())
            })?;
            (html, validate_url(&base)?.to_string())
        }
        _ => {
            return Err(ExtractionError::BadRequest(
                "exactly one of url or html is required".to_string(),
            ))
        }
    };

    let extractor = state.extractor;
    let mode = req.mode;
    let task = tokio::task::spawn_blocking(move || {
        let doc = ParsedDocument::parse(&html);
        let result = extractor.extract_named(&doc, &mode, &base_url);
        drop(permit);
        (mode, result)
    });

    // The blocking task cannot be interrupted; on timeout it finishes unobserved
    // and releases the permit itself.
    let (mode, result) = match tokio::time::timeout(state.parse_timeout, task).await {
        Ok(Ok(done)) => done,
        Ok(Err(e)) => return Err(ExtractionError::Internal(e.to_string())),
        Err(_) => return Err(ExtractionError::Timeout(state.parse_timeout)),
    };

    let output = format(&result, fmt)?;
    let count = result.count();
    tracing::info!(mode = %mode, format = %fmt, count, "extraction complete");

    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();

    Ok(ExtractResponse {
        mode,
        format: fmt,
        count,
        output,
        filename: export_filename(fmt, millis),
        content_type: fmt.content_type(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState::new(&Config::default()).unwrap()
    }

    async fn post_extract(state: AppState, body: Value) -> (StatusCode, Value) {
        let response = router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/extract")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let response = router(test_state())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_extract_inline_links_csv() {
        let (status, body) = post_extract(
            test_state(),
            json!({
                "html": r##"<a href="#top">top</a><a href="/a">A</a><a href="https://x.com/b">B</a>"##,
                "base_url": "https://example.com",
                "mode": "links",
                "format": "csv"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["mode"], "links");
        assert_eq!(body["format"], "csv");
        assert_eq!(body["content_type"], "text/csv; charset=utf-8");
        let output = body["output"].as_str().unwrap();
        assert!(output.starts_with("text,href,isExternal,rel,target\n"));
        assert!(output.contains("https://example.com/a"));
        assert!(!output.contains("#top"));
        let filename = body["filename"].as_str().unwrap();
        assert!(filename.starts_with("web-parser-results-"));
        assert!(filename.ends_with(".csv"));
    }

    #[tokio::test]
    async fn test_unsupported_mode_is_zero_count_result() {
        let (status, body) = post_extract(
            test_state(),
            json!({"html": "<p>x</p>", "base_url": "https://example.com", "mode": "forms"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 0);
        let output: Value = serde_json::from_str(body["output"].as_str().unwrap()).unwrap();
        assert!(output["error"].as_str().unwrap().contains("forms"));
    }

    #[tokio::test]
    async fn test_unsupported_format_rejected() {
        let (status, body) = post_extract(
            test_state(),
            json!({"html": "<p>x</p>", "base_url": "https://example.com", "mode": "text", "format": "xml"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("xml"));
    }

    #[tokio::test]
    async fn test_requires_exactly_one_source() {
        let (status, _) = post_extract(test_state(), json!({"mode": "text"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post_extract(
            test_state(),
            json!({"url": "https://example.com", "html": "<p></p>", "mode": "text"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post_extract(test_state(), json!({"html": "<p></p>", "mode": "text"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rejects_non_http_url() {
        let (status, _) =
            post_extract(test_state(), json!({"url": "ftp://example.com", "mode": "links"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_busy_while_extraction_in_flight() {
        let state = test_state();
        let _held = state.in_flight.try_acquire().unwrap();
        let (status, _) = post_extract(
            state.clone(),
            json!({"html": "<p>x</p>", "base_url": "https://example.com", "mode": "text"}),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_timed_out_parse_keeps_slot() {
        let mut state = test_state();
        state.parse_timeout = Duration::ZERO;
        let html = "<p>Some sentence goes here.</p>".repeat(200_000);
        let (status, _) = post_extract(
            state.clone(),
            json!({"html": html, "base_url": "https://example.com", "mode": "text"}),
        )
        .await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);

        let (status, _) = post_extract(
            state,
            json!({"html": "<p>x</p>", "base_url": "https://example.com", "mode": "text"}),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_body_limit_from_config() {
        let config = Config {
            max_body_bytes: 1024,
            ..Config::default()
        };
        let state = AppState::new(&config).unwrap();
        let html = "<p>x</p>".repeat(1000);
        let response = router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/extract")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({"html": html, "base_url": "https://example.com", "mode": "text"})
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_parse_timeout() {
        let mut state = test_state();
        state.parse_timeout = Duration::ZERO;
        let html = "<p>Some sentence goes here.</p>".repeat(20_000);
        let (status, _) = post_extract(
            state,
            json!({"html": html, "base_url": "https://example.com", "mode": "text"}),
        )
        .await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    }
}
