use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

pub const DEFAULT_CATEGORY: &str = "default";

/// Width of generated keys; zero padding keeps string order equal to numeric order.
const KEY_WIDTH: usize = 20;

/// Field names match the files written by the first version of the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    #[serde(rename = "Url")]
    pub url: String,
    #[serde(rename = "Icon", default)]
    pub icon: String,
    #[serde(rename = "Category", default = "default_category")]
    pub category: String,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Modified", with = "time::serde::rfc3339")]
    pub modified: OffsetDateTime,
}

fn default_category() -> String { DEFAULT_CATEGORY.to_string() }

/// Opaque identifier of a stored bookmark.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreKey(String);

impl StoreKey {
    pub fn as_str(&self) -> &str { &self.0 }

    fn numeric(&self) -> Option<u64> {
        if self.0.len() == KEY_WIDTH { self.0.parse().ok() } else { None }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for StoreKey {
    fn from(s: &str) -> Self { Self(s.to_string()) }
}

/// Issues keys from the wall clock in nanoseconds, bumped past the last issued
/// value so two inserts in the same instant (or a clock step back) never collide.
#[derive(Debug, Default)]
pub struct KeyGenerator {
    last: u64,
}

impl KeyGenerator {
    pub fn next(&mut self, now: OffsetDateTime) -> StoreKey {
        let nanos = u64::try_from(now.unix_timestamp_nanos()).unwrap_or(0);
        let value = nanos.max(self.last.saturating_add(1));
        self.last = value;
        StoreKey(format!("{value:0width$}", width = KEY_WIDTH))
    }

    /// Keys that did not come from this generator (older files) are ignored.
    pub fn observe(&mut self, key: &StoreKey) {
        if let Some(n) = key.numeric() {
            self.last = self.last.max(n);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn keys_in_same_instant_are_distinct_and_ordered() {
        let mut keys = KeyGenerator::default();
        let now = datetime!(2024-05-01 12:00:00 UTC);
        let a = keys.next(now);
        let b = keys.next(now);
        assert_ne!(a, b);
        assert!(b > a);
        assert_eq!(a.as_str().len(), KEY_WIDTH);
    }

    #[test]
    fn clock_going_backwards_still_yields_larger_key() {
        let mut keys = KeyGenerator::default();
        let later = keys.next(datetime!(2024-05-01 12:00:00 UTC));
        let earlier = keys.next(datetime!(2023-01-01 00:00:00 UTC));
        assert!(earlier > later);
    }

    #[test]
    fn observe_skips_foreign_keys() {
        let mut keys = KeyGenerator::default();
        keys.observe(&StoreKey::from("2016-01-02 15:04:05 +0100 CET"));
        keys.observe(&StoreKey::from("99999999999999999999"));
        // overflows u64
        keys.observe(&StoreKey::from("00000000000000000042"));
        let next = keys.next(datetime!(1970-01-01 00:00:00 UTC));
        assert_eq!(next.as_str(), "00000000000000000043");
    }

    #[test]
    fn legacy_record_without_category_gets_default() {
        let json = r#"{"Url":"http://a.com","Icon":"","Title":"A","Modified":"2016-01-02T15:04:05.123456789+01:00"}"#;
        let bm: Bookmark = serde_json::from_str(json).unwrap();
        assert_eq!(bm.category, DEFAULT_CATEGORY);
        assert_eq!(bm.modified.nanosecond(), 123_456_789);
    }
}
