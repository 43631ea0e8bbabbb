//! Turns whatever followed the leading `/` of a request into a bookmarkable URL.
//!
//! The checks are substring heuristics, not URL parsing: anything with a dot
//! looks like a host, anything mentioning `http` already has a scheme.

use crate::error::ValidationError;

const FAVICON: &str = "favicon.ico";

pub fn normalize(raw: &str) -> Result<String, ValidationError> {
    if !raw.contains('.') {
        return Err(ValidationError::MissingDot(raw.to_string()));
    }
    // browsers ask for /favicon.ico on every page load
    if raw.contains(FAVICON) {
        return Err(ValidationError::Favicon);
    }
    if !raw.contains("http") {
        return Ok(format!("http://{raw}"));
    }
    Ok(raw.to_string())
}
