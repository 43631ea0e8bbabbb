use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use time::OffsetDateTime;

use crate::services::store::Listing;

const BOOTSTRAP: &str = "https://maxcdn.bootstrapcdn.com/bootstrap/3.3.5";

pub fn bookmarks_page(listing: &Listing, now: OffsetDateTime) -> String {
    let mut rows = String::new();
    for (key, bm) in listing.iter() {
        let url = html_escape::encode_double_quoted_attribute(&bm.url);
        let title = html_escape::encode_text(&bm.title);
        let icon = html_escape::encode_double_quoted_attribute(&bm.icon);
        // legacy keys carry spaces and `+`
        let key = utf8_percent_encode(key.as_str(), NON_ALPHANUMERIC);
        let age = humanize(bm.modified, now);
        rows.push_str(&format!(
            r#"<tr><td><a href="{url}">{title}</a></td><td><img class="customImage" src="{icon}"></td><td>{age}</td><td><a href="/remove/{key}">remove</a></td></tr>
"#
        ));
    }
    format!(r#"<!DOCTYPE html>
<html lang="en"><head><meta charset="UTF-8"><title>bm</title>
<link rel="stylesheet" href="{BOOTSTRAP}/css/bootstrap.min.css">
<link rel="stylesheet" href="{BOOTSTRAP}/css/bootstrap-theme.min.css">
<style>.bookmark{{margin:20px}} .customImage{{width:50px;height:50px}}</style>
</head><body><div class="bookmark"><table class="table table-hover">
<thead><tr><th>URL</th><th>Icon</th><th>Last modified</th><th>Actions</th></tr></thead>
<tbody>
{rows}</tbody></table></div></body></html>"#)
}

/// Coarse relative age: "now", "5 minutes ago", "2 years ago".
pub fn humanize(then: OffsetDateTime, now: OffsetDateTime) -> String {
    const UNITS: [(i64, &str); 6] = [
        (365 * 86_400, "year"),
        (30 * 86_400, "month"),
        (7 * 86_400, "week"),
        (86_400, "day"),
        (3_600, "hour"),
        (60, "minute"),
    ];
    let secs = (now - then).whole_seconds();
    let (secs, suffix) = if secs < 0 { (-secs, "from now") } else { (secs, "ago") };
    if secs == 0 {
        return "now".to_string();
    }
    let (n, unit) = UNITS.iter()
        .find(|(size, _)| secs >= *size)
        .map(|(size, unit)| (secs / size, *unit))
        .unwrap_or((secs, "second"));
    let plural = if n == 1 { "" } else { "s" };
    format!("{n} {unit}{plural} {suffix}")
}
