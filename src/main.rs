use web_parser::api::{router, AppState};
use web_parser::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env();
    let app = router(AppState::new(&config)?);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!(
        parse_timeout_secs = config.parse_timeout.as_secs(),
        "listening on {}",
        listener.local_addr()?
    );
    axum::serve(listener, app).await?;
    Ok(())
}
