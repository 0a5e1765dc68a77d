//! Local progress persistence.
//!
//! Progress is one JSON blob under [`PROGRESS_KEY`], written whole after every
//! mutation, so a mutation is either fully persisted or not at all.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::error::AppError;
use crate::models::progress::UserProgress;

pub const PROGRESS_KEY: &str = "progress_data";
pub const PENDING_KEY: &str = "progress_pending";

/// String key-value storage the progress blob lives in.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    fn remove(&self, key: &str) -> Result<(), AppError>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, AppError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(AppError::Storage(format!("invalid storage key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(format!("failed to read {}: {}", path.display(), e))),
        }
    }

    /// Writes to a temp file and renames it over the target.
    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, value).map_err(|e| {
            AppError::Storage(format!("failed to write {}: {}", tmp_path.display(), e))
        })?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            AppError::Storage(format!("failed to replace {}: {}", path.display(), e))
        })?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Volatile store, for tests and guest sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, AppError> {
        self.entries
            .lock()
            .map_err(|_| AppError::Storage("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        self.entries()?.remove(key);
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        (**self).remove(key)
    }
}

/// Source of "today" for streaks and weekly XP buckets.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

pub fn local_clock() -> Clock {
    Arc::new(|| chrono::Local::now().date_naive())
}

/// Typed access to the progress blob and the unsynced-mutation counter.
pub struct ProgressStore<S: KeyValueStore> {
    kv: S,
    clock: Clock,
}

impl<S: KeyValueStore> ProgressStore<S> {
    pub fn new(kv: S) -> Self {
        Self::with_clock(kv, local_clock())
    }

    pub fn with_clock(kv: S, clock: Clock) -> Self {
        Self { kv, clock }
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    /// Reads the stored progress. Missing or unreadable data yields zero
    /// defaults; it is never an error.
    pub fn load(&self) -> UserProgress {
        let raw = match self.kv.get(PROGRESS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return UserProgress::default(),
            Err(e) => {
                tracing::warn!("Failed to read local progress, using defaults: {}", e);
                return UserProgress::default();
            }
        };

        match serde_json::from_str::<UserProgress>(&raw) {
            Ok(mut progress) => {
                progress.normalize();
                progress
            }
            Err(e) => {
                tracing::warn!("Local progress is unreadable, using defaults: {}", e);
                UserProgress::default()
            }
        }
    }

    /// Whether a progress blob exists at all.
    pub fn has_progress(&self) -> bool {
        matches!(self.kv.get(PROGRESS_KEY), Ok(Some(_)))
    }

    pub fn save(&self, progress: &UserProgress) -> Result<(), AppError> {
        let raw = serde_json::to_string(progress).map_err(|e| AppError::Storage(e.to_string()))?;
        self.kv.set(PROGRESS_KEY, &raw)
    }

    /// Overwrites the local copy with an authoritative one and forgets the
    /// pending local mutations it already includes.
    pub fn replace(&self, mut progress: UserProgress) -> Result<UserProgress, AppError> {
        progress.normalize();
        self.save(&progress)?;
        self.clear_pending()?;
        Ok(progress)
    }

    /// Local mutations recorded since the last successful sync.
    pub fn pending(&self) -> u32 {
        match self.kv.get(PENDING_KEY) {
            Ok(Some(raw)) => raw.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    pub fn clear_pending(&self) -> Result<(), AppError> {
        self.kv.remove(PENDING_KEY)
    }

    fn bump_pending(&self) -> Result<(), AppError> {
        let next = self.pending().saturating_add(1);
        self.kv.set(PENDING_KEY, &next.to_string())
    }

    /// Read, transform, re-derive, persist. Returns the stored progress and
    /// whatever `apply` returned.
    pub fn update<R>(
        &self,
        apply: impl FnOnce(&mut UserProgress, NaiveDate) -> R,
    ) -> Result<(UserProgress, R), AppError> {
        let mut progress = self.load();
        let outcome = apply(&mut progress, self.today());
        progress.normalize();
        self.save(&progress)?;
        self.bump_pending()?;
        Ok((progress, outcome))
    }

    /// Deletes the local copy, e.g. on sign-out.
    pub fn clear(&self) -> Result<(), AppError> {
        self.kv.remove(PROGRESS_KEY)?;
        self.clear_pending()
    }
}
