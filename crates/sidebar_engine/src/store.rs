use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("bookmark store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("bookmark store malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Per-host persistence of bookmarked turn ids.
///
/// Failures are reported to the caller, which degrades to in-memory
/// bookmarks rather than aborting.
pub trait BookmarkStore {
    fn load(&self, host: &str) -> Result<Vec<String>, StoreError>;
    fn save(&self, host: &str, ids: &[String]) -> Result<(), StoreError>;
}

/// One JSON file per host under a spool directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `bookmarks-{host}-{hash}.json`, with the host sanitized for the
    /// filesystem and a short digest to keep distinct hosts from colliding
    /// after sanitization.
    fn path_for(&self, host: &str) -> PathBuf {
        let sanitized: String = host
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        let digest = Sha256::digest(host.as_bytes());
        let short = digest[..4]
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<String>();
        self.dir.join(format!("bookmarks-{sanitized}-{short}.json"))
    }
}

impl BookmarkStore for JsonFileStore {
    fn load(&self, host: &str) -> Result<Vec<String>, StoreError> {
        let path = self.path_for(host);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, host: &str, ids: &[String]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(host);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(serde_json::to_string(ids)?.as_bytes())?;
        // Persist atomically so a crash mid-save never truncates the file.
        if path.exists() {
            fs::remove_file(&path)?;
        }
        tmp.persist(&path).map_err(|err| err.error)?;
        Ok(())
    }
}

/// In-memory store for tests and incognito-style sessions.
#[derive(Default)]
pub struct MemoryBookmarkStore {
    entries: RefCell<HashMap<String, Vec<String>>>,
}

impl MemoryBookmarkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BookmarkStore for MemoryBookmarkStore {
    fn load(&self, host: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.borrow().get(host).cloned().unwrap_or_default())
    }

    fn save(&self, host: &str, ids: &[String]) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(host.to_string(), ids.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{BookmarkStore, JsonFileStore};

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let ids = vec!["msg_0_Hello".to_string(), "msg_3_World".to_string()];
        store.save("chatgpt.com", &ids).unwrap();
        assert_eq!(store.load("chatgpt.com").unwrap(), ids);
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load("gemini.google.com").unwrap().is_empty());
    }

    #[test]
    fn hosts_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.save("a/b", &["one".to_string()]).unwrap();
        store.save("a_b", &["two".to_string()]).unwrap();
        assert_eq!(store.load("a/b").unwrap(), vec!["one".to_string()]);
        assert_eq!(store.load("a_b").unwrap(), vec!["two".to_string()]);
    }
}
