//! Best-effort page metadata: the `<title>` text and a favicon reference.
//!
//! The store only sees the capability traits, so tests can swap in stubs
//! and the HTTP client stays out of the locking logic. `PageFetcher` is the
//! combined lookup; `SplitFetcher` builds one from a separate title and icon
//! source, while `HttpMetadataClient` answers both from a single download.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use reqwest::redirect::Policy;

use crate::error::FetchError;

/// Some sites refuse anything that does not look like a browser.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.1; rv:6.0) Gecko/20110814 Firefox/6.0";
pub const MAX_REDIRECTS: usize = 5;
/// Pages are scanned from their head; the rest is never downloaded.
const MAX_BODY_BYTES: usize = 512 * 1024;

pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<String, FetchError>> + Send + 'a>>;

pub trait TitleFetcher: Send + Sync {
    fn fetch_title<'a>(&'a self, url: &'a str) -> FetchFuture<'a>;
}

/// Resolves to an absolute icon URL.
pub trait IconFetcher: Send + Sync {
    fn fetch_icon<'a>(&'a self, url: &'a str) -> FetchFuture<'a>;
}

/// Title and icon of one page, each with its own fallback reason.
#[derive(Debug)]
pub struct PageLookup {
    pub title: Result<String, FetchError>,
    pub icon: Result<String, FetchError>,
}

pub type PageFuture<'a> = Pin<Box<dyn Future<Output = PageLookup> + Send + 'a>>;

pub trait PageFetcher: Send + Sync {
    fn fetch_page<'a>(&'a self, url: &'a str) -> PageFuture<'a>;
}

/// Runs independent title and icon sources side by side.
pub struct SplitFetcher {
    pub titles: Arc<dyn TitleFetcher>,
    pub icons: Arc<dyn IconFetcher>,
}

impl PageFetcher for SplitFetcher {
    fn fetch_page<'a>(&'a self, url: &'a str) -> PageFuture<'a> {
        Box::pin(async move {
            let (title, icon) = tokio::join!(self.titles.fetch_title(url), self.icons.fetch_icon(url));
            PageLookup { title, icon }
        })
    }
}

#[derive(Clone)]
pub struct HttpMetadataClient {
    client: reqwest::Client,
}

impl HttpMetadataClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { client })
    }

    async fn scan(&self, url: &str) -> Result<PageMeta, FetchError> {
        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
            if body.len() >= MAX_BODY_BYTES { break; }
        }
        Ok(scan_page(&String::from_utf8_lossy(&body)))
    }
}

impl TitleFetcher for HttpMetadataClient {
    fn fetch_title<'a>(&'a self, url: &'a str) -> FetchFuture<'a> {
        Box::pin(async move {
            self.scan(url).await?.title.ok_or(FetchError::Missing("title"))
        })
    }
}

impl IconFetcher for HttpMetadataClient {
    fn fetch_icon<'a>(&'a self, url: &'a str) -> FetchFuture<'a> {
        Box::pin(async move {
            let href = self.scan(url).await?.icon.ok_or(FetchError::Missing("icon"))?;
            Ok(resolve_icon(url, &href))
        })
    }
}

impl PageFetcher for HttpMetadataClient {
    fn fetch_page<'a>(&'a self, url: &'a str) -> PageFuture<'a> {
        Box::pin(async move {
            match self.scan(url).await {
                Ok(meta) => PageLookup {
                    title: meta.title.ok_or(FetchError::Missing("title")),
                    icon: meta.icon.map(|href| resolve_icon(url, &href)).ok_or(FetchError::Missing("icon")),
                },
                Err(e) => {
                    let shared = FetchError::Page(e.to_string());
                    PageLookup { title: Err(e), icon: Err(shared) }
                }
            }
        })
    }
}

/// Absolute references pass through; anything else is appended to the page URL.
pub fn resolve_icon(page_url: &str, href: &str) -> String {
    if href.contains("http") { href.to_string() } else { format!("{page_url}{href}") }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub title: Option<String>,
    pub icon: Option<String>,
}

/// Runs the html5ever tokenizer over `html` and keeps the first non-empty
/// `<title>` text and the first `<link rel="...icon...">` href.
pub fn scan_page(html: &str) -> PageMeta {
    let mut queue = BufferQueue::default();
    queue.push_back(StrTendril::from_slice(html));
    let mut tokenizer = Tokenizer::new(MetaSink::default(), TokenizerOpts::default());
    let _ = tokenizer.feed(&mut queue);
    tokenizer.end();
    tokenizer.sink.meta
}

#[derive(Default)]
struct MetaSink {
    meta: PageMeta,
    in_title: bool,
    title_done: bool,
    title_buf: String,
}

impl MetaSink {
    fn on_tag(&mut self, tag: &Tag) -> TokenSinkResult<()> {
        match (&*tag.name, tag.kind) {
            ("title", TagKind::StartTag) => {
                if !self.title_done {
                    self.in_title = true;
                }
                return TokenSinkResult::RawData(RawKind::Rcdata);
            }
            ("title", TagKind::EndTag) if self.in_title => self.finish_title(),
            ("link", TagKind::StartTag) if self.meta.icon.is_none() => {
                let attr = |name: &str| {
                    tag.attrs.iter().find(|a| &*a.name.local == name).map(|a| a.value.to_string())
                };
                let is_icon = attr("rel").is_some_and(|rel| {
                    rel.split_ascii_whitespace().any(|r| r.eq_ignore_ascii_case("icon") || r.eq_ignore_ascii_case("apple-touch-icon"))
                });
                if is_icon {
                    self.meta.icon = attr("href").filter(|h| !h.trim().is_empty());
                }
            }
            // same switches the html5ever tree builder makes
            ("textarea", TagKind::StartTag) => return TokenSinkResult::RawData(RawKind::Rcdata),
            ("script", TagKind::StartTag) => return TokenSinkResult::RawData(RawKind::ScriptData),
            ("style" | "xmp" | "iframe" | "noembed" | "noframes", TagKind::StartTag) => {
                return TokenSinkResult::RawData(RawKind::Rawtext);
            }
            _ => {}
        }
        TokenSinkResult::Continue
    }

    /// Also runs at end of input, so an unclosed or truncated title still counts.
    fn finish_title(&mut self) {
        self.in_title = false;
        self.title_done = true;
        let text = self.title_buf.trim();
        if !text.is_empty() {
            self.meta.title = Some(text.to_string());
        }
    }
}

impl TokenSink for MetaSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => return self.on_tag(&tag),
            Token::CharacterTokens(text) if self.in_title => self.title_buf.push_str(&text),
            Token::EOFToken if self.in_title => self.finish_title(),
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_title_and_icon() {
        let page = r#"<html><head>
            <title> Example &amp; Co </title>
            <link rel="stylesheet" href="/s.css">
            <link rel="shortcut icon" href="/static/fav.png">
            <title>second</title>
        </head><body></body></html>"#;
        let meta = scan_page(page);
        assert_eq!(meta.title.as_deref(), Some("Example & Co"));
        assert_eq!(meta.icon.as_deref(), Some("/static/fav.png"));
    }

    #[test]
    fn empty_title_counts_as_missing() {
        let meta = scan_page("<html><head><title>  </title></head></html>");
        assert_eq!(meta, PageMeta::default());
    }

    #[test]
    fn garbage_does_not_panic() {
        let meta = scan_page("<<<>>><title<link rel=icon \u{0}</");
        assert!(meta.title.is_none());
    }

    #[test]
    fn markup_inside_script_and_style_is_ignored() {
        let page = r#"<head><script>var t = "<title>fake</title><link rel=icon href=/x.png>";</script>
            <style>/* <title>css</title> */</style>
            <title>Real</title></head>"#;
        let meta = scan_page(page);
        assert_eq!(meta.title.as_deref(), Some("Real"));
        assert!(meta.icon.is_none());
    }

    #[test]
    fn tags_inside_title_are_text() {
        let meta = scan_page("<title>a <b>bold</b> move</title>");
        assert_eq!(meta.title.as_deref(), Some("a <b>bold</b> move"));
    }

    #[test]
    fn unclosed_title_is_kept() {
        let meta = scan_page("<html><head><title>Only Title");
        assert_eq!(meta.title.as_deref(), Some("Only Title"));
    }

    #[tokio::test]
    async fn split_fetcher_reports_each_side() {
        struct Titles;
        impl TitleFetcher for Titles {
            fn fetch_title<'a>(&'a self, url: &'a str) -> FetchFuture<'a> {
                Box::pin(async move { Ok(format!("t:{url}")) })
            }
        }
        struct NoIcons;
        impl IconFetcher for NoIcons {
            fn fetch_icon<'a>(&'a self, _url: &'a str) -> FetchFuture<'a> {
                Box::pin(async { Err(FetchError::Missing("icon")) })
            }
        }
        let split = SplitFetcher { titles: Arc::new(Titles), icons: Arc::new(NoIcons) };
        let lookup = split.fetch_page("http://a.com").await;
        assert_eq!(lookup.title.unwrap(), "t:http://a.com");
        assert!(matches!(lookup.icon, Err(FetchError::Missing("icon"))));
    }

    #[test]
    fn icon_resolution() {
        assert_eq!(resolve_icon("http://a.com", "/i.png"), "http://a.com/i.png");
        assert_eq!(resolve_icon("http://a.com", "https://cdn.b.com/i.png"), "https://cdn.b.com/i.png");
    }
}
