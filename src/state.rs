use crate::services::store::BookmarkStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<BookmarkStore>,
    pub auth: Arc<AuthSettings>,
}

/// Shared secret carried in the `bookmark` cookie.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub secret: String,
    pub cookie_domain: String,
}
