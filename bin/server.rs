// University Budget - Web Server
// JSON API + CSV download over the in-memory record store

use anyhow::{Context, Result};
use university_budget::api::{router, AppState};
use university_budget::logging::{init_logging, LogTarget};
use university_budget::{DashboardConfig, RecordStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = DashboardConfig::load_default().context("Failed to load configuration")?;
    init_logging(&config, LogTarget::Console)?;

    let state = AppState::new(RecordStore::new());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server_addr))?;

    tracing::info!(addr = %config.server_addr, "budget server listening");
    println!("🚀 Server running on http://{}", config.server_addr);
    println!("   API: http://{}/api/records", config.server_addr);
    println!("   CSV: http://{}/api/export.csv", config.server_addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
