//! bizmate server binary.
//!
//! Startup order matters: configuration first (fatal on a missing token
//! secret), then the store with every tree created up front, then the
//! router. Nothing is lazily initialized on the request path.

use std::process::ExitCode;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use bizmate::config::Config;
use bizmate::routes::create_router;
use bizmate::state::AppState;
use bizmate::store::Store;
use bizmate::token::TokenCodec;
use bizmate::upstream::{Advisor, ImageHost};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "server exited");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    let store = Store::open(&config.data_dir)?;
    let tokens = TokenCodec::new(
        &config.token_secret,
        config.token_algorithm,
        config.token_expiry_minutes,
    );

    let advisor = match &config.advisor {
        Some(cfg) => Some(Advisor::new(cfg)?),
        None => {
            tracing::warn!("advisor not configured; chat endpoints will answer 502");
            None
        }
    };
    let image_host = match &config.image_host {
        Some(cfg) => Some(ImageHost::new(cfg)?),
        None => {
            tracing::warn!("image host not configured; logo uploads will answer 502");
            None
        }
    };

    let state = Arc::new(AppState {
        store,
        tokens,
        advisor,
        image_host,
    });
    let app = create_router(state);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, data_dir = %config.data_dir, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
