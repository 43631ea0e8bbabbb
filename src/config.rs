use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "bookmark-web", version, about = "Visit /<url> to bookmark it")]
pub struct Config {
    /// port the webserver listens on
    #[arg(long, env = "BOOKMARK_PORT", default_value_t = default_port())]
    pub port: u16,
    /// file to save bookmarks in
    #[arg(long, env = "BOOKMARK_FILE", default_value = "bookmark.json")]
    pub file: PathBuf,
    /// hostname the auth cookie is issued for
    #[arg(long, env = "BOOKMARK_HOST", default_value = "localhost")]
    pub host: String,
    /// visiting /<secret> sets the auth cookie
    #[arg(long, env = "BOOKMARK_SECRET", default_value = "secret")]
    pub secret: String,
    /// upper bound for fetching a page's title and icon
    #[arg(long, env = "BOOKMARK_FETCH_TIMEOUT_SECS", default_value_t = default_fetch_timeout())]
    pub fetch_timeout_secs: u64,
}
fn default_port() -> u16 { 8080 }
fn default_fetch_timeout() -> u64 { 5 }

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let cfg = Self::try_parse()?;
        anyhow::ensure!(!cfg.secret.is_empty(), "secret must not be empty");
        anyhow::ensure!(cfg.fetch_timeout_secs > 0, "fetch timeout must be at least one second");
        Ok(cfg)
    }
}
