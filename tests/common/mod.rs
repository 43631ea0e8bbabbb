#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bookmark_web::clients::metadata::{FetchFuture, IconFetcher, TitleFetcher};
use bookmark_web::error::FetchError;
use bookmark_web::services::store::BookmarkStore;

/// Answers every lookup after `delay` and counts how often it was asked.
pub struct StubFetcher {
    pub title: Option<String>,
    pub icon: Option<String>,
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl StubFetcher {
    pub fn new(title: &str, icon: &str) -> Arc<Self> {
        Arc::new(Self {
            title: Some(title.to_string()),
            icon: Some(icon.to_string()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self { title: None, icon: None, delay, calls: AtomicUsize::new(0) })
    }

    fn answer<'a>(&'a self, value: &'a Option<String>, what: &'static str) -> FetchFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            value.clone().ok_or(FetchError::Missing(what))
        })
    }
}

impl TitleFetcher for StubFetcher {
    fn fetch_title<'a>(&'a self, _url: &'a str) -> FetchFuture<'a> { self.answer(&self.title, "title") }
}

impl IconFetcher for StubFetcher {
    fn fetch_icon<'a>(&'a self, _url: &'a str) -> FetchFuture<'a> { self.answer(&self.icon, "icon") }
}

pub fn store_with(dir: &tempfile::TempDir, fetcher: Arc<StubFetcher>) -> BookmarkStore {
    BookmarkStore::new(dir.path().join("bookmark.json"), fetcher.clone(), fetcher)
}
