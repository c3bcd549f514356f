//! Run state persistence.

use async_trait::async_trait;
use reelsmith_core::RunState;
use reelsmith_error::{
    JsonError, ReelsmithError, ReelsmithResult, RunError, RunErrorKind, StorageError,
    StorageErrorKind,
};
use reelsmith_interface::RunStore;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// Stores each run as `{runs_dir}/{run_id}.json`.
///
/// Saves are atomic: the JSON is written to a temp file in the same
/// directory and renamed over the previous state.
#[derive(Debug, Clone)]
pub struct FileSystemRunStore {
    runs_dir: PathBuf,
}

impl FileSystemRunStore {
    /// Creates the store, creating its directory if needed.
    pub fn new(runs_dir: impl AsRef<Path>) -> ReelsmithResult<Self> {
        let runs_dir = runs_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&runs_dir).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                runs_dir.display(),
                e
            )))
        })?;

        debug!(path = %runs_dir.display(), "Initialized run store");
        Ok(Self { runs_dir })
    }

    /// Directory holding the run files.
    pub fn runs_dir(&self) -> &Path {
        &self.runs_dir
    }

    fn run_path(&self, run_id: Uuid) -> PathBuf {
        self.runs_dir.join(format!("{}.json", run_id))
    }
}

#[async_trait]
impl RunStore for FileSystemRunStore {
    #[tracing::instrument(skip(self, run), fields(run_id = %run.run_id(), status = %run.status()))]
    async fn save(&self, run: &RunState) -> ReelsmithResult<()> {
        let path = self.run_path(*run.run_id());
        let contents = serde_json::to_vec_pretty(run)
            .map_err(|e| JsonError::new(format!("Failed to serialize run state: {}", e)))?;

        let temp_path = self
            .runs_dir
            .join(format!(".{}.{}.tmp", run.run_id(), Uuid::new_v4().simple()));
        let written = match tokio::fs::write(&temp_path, &contents).await {
            Ok(()) => tokio::fs::rename(&temp_path, &path).await.map_err(|e| {
                StorageErrorKind::FileWrite(format!(
                    "rename {} to {}: {}",
                    temp_path.display(),
                    path.display(),
                    e
                ))
            }),
            Err(e) => Err(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            ))),
        };
        if let Err(kind) = written {
            if let Err(e) = tokio::fs::remove_file(&temp_path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %temp_path.display(), error = %e, "Failed to remove temporary run file");
                }
            }
            return Err(StorageError::new(kind).into());
        }

        debug!(bytes = contents.len(), "Saved run state");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn load(&self, run_id: Uuid) -> ReelsmithResult<RunState> {
        let path = self.run_path(run_id);
        let contents = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ReelsmithError::from(RunError::new(RunErrorKind::NotFound(run_id.to_string())))
            } else {
                ReelsmithError::from(StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                ))))
            }
        })?;

        let run: RunState = serde_json::from_slice(&contents).map_err(|e| {
            JsonError::new(format!("Failed to parse run state {}: {}", path.display(), e))
        })?;
        debug!(status = %run.status(), "Loaded run state");
        Ok(run)
    }

    async fn list(&self) -> ReelsmithResult<Vec<Uuid>> {
        let mut entries = tokio::fs::read_dir(&self.runs_dir).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                self.runs_dir.display(),
                e
            )))
        })?;

        let mut ids = Vec::new();
        loop {
            let entry = entries.next_entry().await.map_err(|e| {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    self.runs_dir.display(),
                    e
                )))
            })?;
            let Some(entry) = entry else { break };
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| Uuid::parse_str(s).ok())
            {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// In-memory run store, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryRunStore {
    runs: Mutex<BTreeMap<Uuid, RunState>>,
    saves: Mutex<usize>,
}

impl MemoryRunStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `save` calls so far.
    pub async fn save_count(&self) -> usize {
        *self.saves.lock().await
    }
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn save(&self, run: &RunState) -> ReelsmithResult<()> {
        self.runs.lock().await.insert(*run.run_id(), run.clone());
        *self.saves.lock().await += 1;
        Ok(())
    }

    async fn load(&self, run_id: Uuid) -> ReelsmithResult<RunState> {
        self.runs
            .lock()
            .await
            .get(&run_id)
            .cloned()
            .ok_or_else(|| RunError::new(RunErrorKind::NotFound(run_id.to_string())).into())
    }

    async fn list(&self) -> ReelsmithResult<Vec<Uuid>> {
        Ok(self.runs.lock().await.keys().copied().collect())
    }
}
