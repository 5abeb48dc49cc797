//! rest-core server: serves `/api/rest`, `/health` and `/version`.
//!
//! Run from repo root: `cargo run -p rest-core-server`
//! Configure with `REST_CORE_*` variables (or a `.env` file).

use rest_core::{app, load_schema, AppState, Settings};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("rest_core=info")),
        )
        .init();

    let settings = Settings::load()?;
    if settings.api_key_red.is_empty() && settings.api_key_blue.is_empty() {
        tracing::warn!("no API keys configured; every /api/rest request will be rejected");
    }
    let schema = load_schema(&settings).await?;
    let state = AppState::from_settings(&settings, schema)?;
    let router = app(state, &settings);

    let listener = TcpListener::bind(settings.bind_addr()).await?;
    tracing::info!("rest-core listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
