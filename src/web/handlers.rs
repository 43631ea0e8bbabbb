use axum::{extract::{OriginalUri, State}, http::{header, StatusCode}, response::{Html, IntoResponse, Response}};
use axum_extra::extract::CookieJar;
use percent_encoding::percent_decode_str;
use time::OffsetDateTime;

use crate::error::{AppError, Result};
use crate::services::store::{AddOutcome, Committed};
use crate::state::AppState;
use crate::web::{auth, utils::bookmarks_page};

const LIST_PATH: &str = "/bookmarks";

pub async fn health() -> &'static str { "ok" }

/// Everything after the leading `/` is the command: the secret logs in,
/// `remove/<key>` deletes, `bookmarks` lists, anything else is bookmarked.
/// The path is percent-decoded; the query string is kept as sent.
pub async fn dispatch(State(state): State<AppState>, jar: CookieJar, OriginalUri(uri): OriginalUri) -> Result<Response> {
    let path = uri.path().strip_prefix('/').unwrap_or(uri.path());
    let mut target = decode(path);
    if let Some(query) = uri.query() {
        target.push('?');
        target.push_str(query);
    }

    if target.starts_with(state.auth.secret.as_str()) {
        tracing::info!("auth cookie issued");
        return Ok((auth::issue(jar, &state.auth), found(LIST_PATH)).into_response());
    }
    if !auth::is_authorized(&jar, &state.auth) {
        return Err(AppError::AccessDenied);
    }

    if let Some(rest) = path.strip_prefix("remove/") {
        let key = decode(rest.split('/').next().unwrap_or_default());
        report(&state.store.remove(&key).await);
        return Ok(found(LIST_PATH));
    }

    if target.starts_with("bookmarks") {
        let listing = state.store.list().await;
        return Ok(Html(bookmarks_page(&listing, OffsetDateTime::now_utc())).into_response());
    }

    let added = state.store.add(&target).await;
    match &added.outcome {
        AddOutcome::Added { key, .. } => tracing::debug!(%key, "added via gateway"),
        AddOutcome::Duplicate { existing } => tracing::debug!(key = %existing, "duplicate ignored"),
        AddOutcome::Rejected(reason) => tracing::debug!(%reason, "input ignored"),
    }
    report(&added);
    Ok(found(LIST_PATH))
}

fn decode(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

fn report<T>(committed: &Committed<T>) {
    if let Err(e) = &committed.persisted {
        tracing::error!(error = %e, "bookmark file is behind memory");
    }
}

fn found(location: &'static str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}
