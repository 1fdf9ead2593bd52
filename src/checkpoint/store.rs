use super::{Checkpoint, CheckpointError};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Durable checkpoint persistence
///
/// `load` never fails: a missing or unreadable checkpoint is reported as
/// `None` and the run starts fresh. `save` must replace the previous
/// checkpoint atomically.
pub trait CheckpointStore: Send {
    /// Loads the saved checkpoint, or `None` if absent or corrupt
    fn load(&self) -> Option<Checkpoint>;

    /// Atomically replaces the saved checkpoint
    fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError>;
}

/// Checkpoint stored as a JSON file
///
/// Saves write `<path>.tmp`, fsync it, then rename it over `<path>`, so a
/// crash at any point leaves either the old or the new file in place.
#[derive(Debug, Clone)]
pub struct JsonCheckpointStore {
    path: PathBuf,
}

impl JsonCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Loads the checkpoint, distinguishing a missing file from a corrupt one
    pub fn load_checked(&self) -> Result<Option<Checkpoint>, CheckpointError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let checkpoint: Checkpoint = serde_json::from_slice(&bytes)?;
        checkpoint.validate()?;
        Ok(Some(checkpoint))
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn load(&self) -> Option<Checkpoint> {
        match self.load_checked() {
            Ok(checkpoint) => checkpoint,
            Err(e) => {
                warn!(
                    "Ignoring unusable checkpoint at {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let bytes = serde_json::to_vec_pretty(checkpoint)?;
        let tmp = self.tmp_path();

        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }

        fs::rename(&tmp, &self.path)?;
        debug!(
            "Saved checkpoint: {} items at ({}, {})",
            checkpoint.total_items, checkpoint.current_keyword, checkpoint.current_page
        );
        Ok(())
    }
}
