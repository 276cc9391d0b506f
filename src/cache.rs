//! Hand-off of one selected file result from the bulk listing to the detail view.

use crate::client::AnalysisError;
use crate::models::FileAnalysisResult;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

pub const HANDOFF_KEY: &str = "fileAnalysisData";
const CACHE_DIR: &str = "repo2score";

pub trait HandoffStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&self, key: &str, value: &str) -> Result<()>;
    fn clear(&self, key: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`, overwriting on every `put`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/.cache/repo2score` or the platform equivalent.
    pub fn default_location() -> Result<Self> {
        let base = dirs::cache_dir().ok_or_else(|| anyhow!("no cache directory on this platform"))?;
        Ok(Self::new(base.join(CACHE_DIR)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl HandoffStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        // write then rename so a reader never sees half a record
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        debug!("hand-off record written to {}", path.display());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl HandoffStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let slots = self.slots.lock().map_err(|_| anyhow!("memory store poisoned"))?;
        Ok(slots.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut slots = self.slots.lock().map_err(|_| anyhow!("memory store poisoned"))?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        let mut slots = self.slots.lock().map_err(|_| anyhow!("memory store poisoned"))?;
        slots.remove(key);
        Ok(())
    }
}

/// What the list view leaves behind for the detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffRecord {
    pub file_result: FileAnalysisResult,
    pub repo_url: String,
    pub branch: String,
}

impl HandoffRecord {
    pub fn matches(&self, repo_url: &str, branch: &str, file: &str) -> bool {
        self.repo_url == repo_url
            && self.branch == branch
            && self.file_result.file_info.relative_path == file
    }
}

pub struct HandoffCache<S> {
    store: S,
}

impl<S: HandoffStore> HandoffCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replaces whatever record was there before.
    pub fn put(&self, record: &HandoffRecord) -> Result<()> {
        let serialized = serde_json::to_string(record)?;
        self.store.put(HANDOFF_KEY, &serialized)
    }

    /// Missing and unreadable records both come back as `None`.
    pub fn get(&self) -> Option<HandoffRecord> {
        let raw = match self.store.get(HANDOFF_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("hand-off store unreadable: {}", e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("discarding corrupt hand-off record: {}", e);
                None
            }
        }
    }

    pub fn clear(&self) -> Result<()> {
        self.store.clear(HANDOFF_KEY)
    }

    /// Returns the cached result only if it belongs to exactly this
    /// repository, branch and file.
    pub fn resolve(
        &self,
        repo_url: &str,
        branch: &str,
        file: &str,
    ) -> Result<FileAnalysisResult, AnalysisError> {
        match self.get() {
            Some(record) if record.matches(repo_url, branch, file) => Ok(record.file_result),
            Some(record) => {
                debug!(
                    "hand-off record is for {}@{}:{}, wanted {}@{}:{}",
                    record.repo_url,
                    record.branch,
                    record.file_result.file_info.relative_path,
                    repo_url,
                    branch,
                    file
                );
                Err(AnalysisError::DetailsUnavailable(file.to_string()))
            }
            None => Err(AnalysisError::DetailsUnavailable(file.to_string())),
        }
    }
}
