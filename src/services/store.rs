//! The bookmark collection and everything that mutates it.
//!
//! All state lives behind one `RwLock`. Readers share it; `add` and `remove`
//! hold the write guard for the whole check, fetch, insert, reindex and
//! persist sequence, so two adds of the same URL can never both insert and a
//! reader never sees the map and the index disagree.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::clients::metadata::{IconFetcher, PageFetcher, PageLookup, SplitFetcher, TitleFetcher};
use crate::domain::bookmark::{Bookmark, KeyGenerator, StoreKey, DEFAULT_CATEGORY};
use crate::domain::url::normalize;
use crate::error::{FetchError, PersistenceError, ValidationError};
use crate::services::persist::{self, BookmarkMap};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// `degraded` is set when the title or icon fell back to its default.
    Added { key: StoreKey, degraded: bool },
    Duplicate { existing: StoreKey },
    Rejected(ValidationError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed(Bookmark),
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Fresh,
    Loaded(usize),
}

/// Result of a mutation. The in-memory change stands even when `persisted`
/// is an error; the file catches up on the next successful write.
#[derive(Debug)]
#[must_use]
pub struct Committed<T> {
    pub outcome: T,
    pub persisted: Result<(), PersistenceError>,
}

impl<T> Committed<T> {
    fn unchanged(outcome: T) -> Self { Self { outcome, persisted: Ok(()) } }
}

/// Consistent copy of the store taken under one read guard.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub sorted: Vec<StoreKey>,
    pub bookmarks: BookmarkMap,
}

impl Listing {
    /// Bookmarks in display order, newest first.
    pub fn iter(&self) -> impl Iterator<Item = (&StoreKey, &Bookmark)> {
        self.sorted.iter().filter_map(|k| self.bookmarks.get_key_value(k))
    }

    pub fn len(&self) -> usize { self.sorted.len() }

    pub fn is_empty(&self) -> bool { self.sorted.is_empty() }
}

#[derive(Default)]
struct Inner {
    bookmarks: BookmarkMap,
    sorted: Vec<StoreKey>,
    keys: KeyGenerator,
}

impl Inner {
    /// Descending key order; generated keys are fixed-width so this is newest first.
    fn reindex(&mut self) {
        self.sorted = self.bookmarks.keys().rev().cloned().collect();
    }

    fn key_for_url(&self, url: &str) -> Option<&StoreKey> {
        self.bookmarks.iter().find(|(_, b)| b.url == url).map(|(k, _)| k)
    }
}

struct Metadata {
    title: String,
    icon: String,
    degraded: bool,
}

pub struct BookmarkStore {
    path: PathBuf,
    inner: RwLock<Inner>,
    pages: Arc<dyn PageFetcher>,
    fetch_timeout: Duration,
}

impl BookmarkStore {
    pub fn new(path: impl Into<PathBuf>, titles: Arc<dyn TitleFetcher>, icons: Arc<dyn IconFetcher>) -> Self {
        Self::with_page_fetcher(path, Arc::new(SplitFetcher { titles, icons }))
    }

    /// Uses one lookup for both title and icon, e.g. a client that downloads the page once.
    pub fn with_page_fetcher(path: impl Into<PathBuf>, pages: Arc<dyn PageFetcher>) -> Self {
        Self {
            path: path.into(),
            inner: RwLock::new(Inner::default()),
            pages,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Replaces the in-memory state with the file's contents. A missing file is
    /// a fresh start; an unreadable or corrupt one leaves the store empty and
    /// is returned so the caller can report it.
    pub async fn load(&self) -> Result<LoadOutcome, PersistenceError> {
        let loaded = persist::read(&self.path).await;
        let mut inner = self.inner.write().await;
        *inner = Inner::default();
        let outcome = match loaded? {
            None => LoadOutcome::Fresh,
            Some(bookmarks) => {
                for key in bookmarks.keys() {
                    inner.keys.observe(key);
                }
                inner.bookmarks = bookmarks;
                LoadOutcome::Loaded(inner.bookmarks.len())
            }
        };
        inner.reindex();
        info!(path = %self.path.display(), ?outcome, "bookmarks loaded");
        Ok(outcome)
    }

    pub async fn add(&self, raw: &str) -> Committed<AddOutcome> {
        let url = match normalize(raw) {
            Ok(url) => url,
            Err(e) => {
                debug!(%raw, reason = %e, "input rejected");
                return Committed::unchanged(AddOutcome::Rejected(e));
            }
        };

        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.key_for_url(&url) {
            debug!(%url, key = %existing, "already bookmarked");
            return Committed::unchanged(AddOutcome::Duplicate { existing: existing.clone() });
        }

        let meta = self.fetch_metadata(&url).await;
        let now = OffsetDateTime::now_utc();
        let key = inner.keys.next(now);
        inner.bookmarks.insert(key.clone(), Bookmark {
            url: url.clone(),
            icon: meta.icon,
            category: DEFAULT_CATEGORY.to_string(),
            title: meta.title,
            modified: now,
        });
        inner.reindex();
        let persisted = persist::write(&self.path, &inner.bookmarks).await;
        info!(%url, %key, degraded = meta.degraded, "bookmark added");
        Committed { outcome: AddOutcome::Added { key, degraded: meta.degraded }, persisted }
    }

    pub async fn remove(&self, key: &str) -> Committed<RemoveOutcome> {
        let mut inner = self.inner.write().await;
        let Some(removed) = inner.bookmarks.remove(&StoreKey::from(key)) else {
            debug!(%key, "nothing to remove");
            return Committed::unchanged(RemoveOutcome::NotFound);
        };
        inner.reindex();
        let persisted = persist::write(&self.path, &inner.bookmarks).await;
        info!(%key, url = %removed.url, "bookmark removed");
        Committed { outcome: RemoveOutcome::Removed(removed), persisted }
    }

    pub async fn list(&self) -> Listing {
        let inner = self.inner.read().await;
        Listing { sorted: inner.sorted.clone(), bookmarks: inner.bookmarks.clone() }
    }

    /// Exact match on the stored URL; no normalization.
    pub async fn exists(&self, url: &str) -> bool {
        self.inner.read().await.key_for_url(url).is_some()
    }

    pub async fn get(&self, key: &str) -> Option<Bookmark> {
        self.inner.read().await.bookmarks.get(&StoreKey::from(key)).cloned()
    }

    pub async fn len(&self) -> usize { self.inner.read().await.bookmarks.len() }

    pub async fn is_empty(&self) -> bool { self.len().await == 0 }

    async fn fetch_metadata(&self, url: &str) -> Metadata {
        let PageLookup { title, icon } = tokio::time::timeout(self.fetch_timeout, self.pages.fetch_page(url))
            .await
            .unwrap_or_else(|_| PageLookup {
                title: Err(FetchError::Timeout(self.fetch_timeout)),
                icon: Err(FetchError::Timeout(self.fetch_timeout)),
            });
        let mut degraded = false;
        let title = match title {
            Ok(t) if !t.trim().is_empty() => t,
            Ok(_) => { degraded = true; url.to_string() }
            Err(e) => {
                warn!(%url, error = %e, "title lookup failed, using url");
                degraded = true;
                url.to_string()
            }
        };
        let icon = icon.unwrap_or_else(|e| {
            debug!(%url, error = %e, "no icon");
            degraded = true;
            String::new()
        });
        Metadata { title, icon, degraded }
    }
}
