use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{TaggingError, TaggingResult};

/// Key under which the session bearer token is stored.
pub const TOKEN_KEY: &str = "token";

/// Local persistent key-value storage.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}

/// Bearer token for authenticated calls. Absent, blank or unreadable
/// tokens are all reported as [`TaggingError::Auth`].
pub fn bearer_token(store: &dyn TokenStore) -> TaggingResult<String> {
    match store.get(TOKEN_KEY) {
        Ok(Some(token)) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Ok(_) => {
            warn!("no bearer token stored");
            Err(TaggingError::Auth("no session token stored".to_string()))
        }
        Err(err) => {
            warn!(error = %err, "failed reading bearer token");
            Err(TaggingError::Auth(format!("{err:#}")))
        }
    }
}

/// JSON object file holding string values, rewritten atomically on change.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let path = data_dir.join("credentials.json");
        if !path.exists() {
            save_entries_atomic(&path, &BTreeMap::new())?;
        }

        info!(path = %path.display(), "opened credential store");
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let _guard = self.lock.lock();
        let entries = load_entries(&self.path)?;
        Ok(entries.get(key).cloned())
    }

    #[tracing::instrument(skip(self, value))]
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let _guard = self.lock.lock();
        let mut entries = load_entries(&self.path)?;
        entries.insert(key.to_string(), value.to_string());
        save_entries_atomic(&self.path, &entries)
    }

    #[tracing::instrument(skip(self))]
    fn remove(&self, key: &str) -> anyhow::Result<()> {
        let _guard = self.lock.lock();
        let mut entries = load_entries(&self.path)?;
        if entries.remove(key).is_none() {
            debug!(key, "nothing stored under key");
            return Ok(());
        }
        save_entries_atomic(&self.path, &entries)
    }
}

/// Process-local store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        let store = Self::new();
        store.entries.lock().insert(TOKEN_KEY.to_string(), token.to_string());
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

fn load_entries(path: &Path) -> anyhow::Result<BTreeMap<String, String>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    if text.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&text).with_context(|| format!("invalid credentials file {}", path.display()))
}

#[tracing::instrument(skip(path, entries))]
fn save_entries_atomic(path: &Path, entries: &BTreeMap<String, String>) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = entries.len(), "saving credentials atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut temp, entries)?;
    writeln!(temp)?;
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}
