//! Keep-alive HTTP endpoint.
//!
//! Hosting platforms that sleep idle processes ping a public URL; serving a
//! trivial page keeps the bot's long-polling loop alive. Shares no state
//! with the moderation pipeline.

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use tracing::info;

pub async fn serve(port: u16) -> Result<()> {
    let app = Router::new().route("/", get(|| async { "Moderation bot is running" }));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind health endpoint on port {}", port))?;

    info!("Health endpoint listening on port {}", port);

    axum::serve(listener, app)
        .await
        .context("Health endpoint server failed")?;

    Ok(())
}
