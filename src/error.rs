use axum::{http::StatusCode, response::{IntoResponse, Html}};
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

/// Input the normalizer refuses to turn into a bookmark.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("not a domain-like input: {0:?}")]
    MissingDot(String),
    #[error("favicon requests are never bookmarked")]
    Favicon,
}

/// Why a title or icon lookup fell back to its default.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("remote answered {0}")]
    Status(reqwest::StatusCode),
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("page has no {0}")]
    Missing(&'static str),
    #[error("page lookup failed: {0}")]
    Page(String),
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("reading {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("{path} is not a valid bookmark file: {source}")]
    Corrupt { path: PathBuf, source: serde_json::Error },
    #[error("encoding bookmarks: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("writing {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Access Denied!!!")]
    AccessDenied,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::AccessDenied => StatusCode::FORBIDDEN,
        };
        let safe = html_escape::encode_text(&self.to_string()).into_owned();
        (status, Html(format!(r#"<!doctype html>
<html><head><meta charset="utf-8"><title>bm</title></head>
<body><p>{safe}</p></body></html>"#))).into_response()
    }
}
