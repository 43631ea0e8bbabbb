pub mod clients { pub mod metadata; }
pub mod config;
pub mod telemetry;
pub mod state;
pub mod error;
pub mod domain { pub mod bookmark; pub mod url; }
pub mod services { pub mod persist; pub mod store; }
pub mod web { pub mod router; pub mod handlers; pub mod auth; pub mod utils; }

use std::sync::Arc;
use std::time::Duration;

use crate::clients::metadata::HttpMetadataClient;
use crate::error::PersistenceError;
use crate::services::store::BookmarkStore;
use crate::state::{AppState, AuthSettings};

/// Builds the store, loads it from disk and wires the router around it.
/// A corrupt bookmark file is copied aside and the service starts empty.
pub async fn build_app(cfg: crate::config::Config) -> anyhow::Result<(axum::Router, u16)> {
    let timeout = Duration::from_secs(cfg.fetch_timeout_secs);
    let fetcher = Arc::new(HttpMetadataClient::new(timeout)?);
    let store = BookmarkStore::with_page_fetcher(&cfg.file, fetcher).with_fetch_timeout(timeout);

    if let Err(e) = store.load().await {
        tracing::error!(error = %e, "could not load bookmarks, starting empty");
        if let PersistenceError::Corrupt { path, .. } = &e {
            let backup = path.with_extension("corrupt");
            match tokio::fs::copy(path, &backup).await {
                Ok(_) => tracing::warn!(backup = %backup.display(), "kept a copy of the unreadable file"),
                Err(err) => tracing::warn!(error = %err, "could not back up unreadable file"),
            }
        }
    }

    let state = AppState {
        store: Arc::new(store),
        auth: Arc::new(AuthSettings { secret: cfg.secret, cookie_domain: cfg.host }),
    };

    Ok((crate::web::router::build_router(state), cfg.port))
}
