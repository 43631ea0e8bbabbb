use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::bookmark::{Bookmark, StoreKey};
use crate::error::PersistenceError;

pub type BookmarkMap = BTreeMap<StoreKey, Bookmark>;

/// `Ok(None)` when there is nothing to load yet: no file, or an empty one.
pub async fn read(path: &Path) -> Result<Option<BookmarkMap>, PersistenceError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(PersistenceError::Read { path: path.to_path_buf(), source }),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| PersistenceError::Corrupt { path: path.to_path_buf(), source })
}

/// Writes a sibling temp file and renames it over `path`, so a crash mid-write
/// leaves the previous file intact.
pub async fn write(path: &Path, bookmarks: &BookmarkMap) -> Result<(), PersistenceError> {
    let data = serde_json::to_vec_pretty(bookmarks)?;
    let tmp = tmp_path(path);
    let wrap = |source: std::io::Error| PersistenceError::Write { path: path.to_path_buf(), source };
    tokio::fs::write(&tmp, &data).await.map_err(wrap)?;
    tokio::fs::rename(&tmp, path).await.map_err(wrap)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample() -> BookmarkMap {
        let mut map = BookmarkMap::new();
        map.insert(StoreKey::from("00000000000000000001"), Bookmark {
            url: "http://a.com".into(),
            icon: "http://a.com/favicon.png".into(),
            category: "default".into(),
            title: "A <b>".into(),
            modified: datetime!(2024-02-29 23:59:59.123456789 +02:00),
        });
        map
    }

    #[tokio::test]
    async fn missing_and_empty_files_load_as_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bm.json");
        assert!(read(&path).await.unwrap().is_none());
        std::fs::write(&path, "\n").unwrap();
        assert!(read(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bm.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(read(&path).await, Err(PersistenceError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn write_then_read_keeps_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bm.json");
        write(&path, &sample()).await.unwrap();
        assert_eq!(read(&path).await.unwrap().unwrap(), sample());
        assert!(!tmp_path(&path).exists());
    }

    #[tokio::test]
    async fn write_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("bm.json");
        assert!(matches!(write(&path, &sample()).await, Err(PersistenceError::Write { .. })));
    }
}
