use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::foundation::error::{AvmixError, AvmixResult};

/// Polls a file's modification time and hands back its contents when it changes.
#[derive(Clone, Debug)]
pub struct FileWatch {
    path: PathBuf,
    seen: Option<SystemTime>,
}

impl FileWatch {
    /// Watch `path`; the first [`poll`](Self::poll) reports the current contents.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seen: None,
        }
    }

    /// Watch `path` treating its current state as already seen.
    pub fn primed(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let seen = modified(&path);
        Self { path, seen }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// New contents if the file changed since the last poll. A missing file is not a change.
    pub fn poll(&mut self) -> AvmixResult<Option<String>> {
        let Some(mtime) = modified(&self.path) else {
            return Ok(None);
        };
        if self.seen == Some(mtime) {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            AvmixError::resource(format!("read '{}': {e}", self.path.display()))
        })?;
        self.seen = Some(mtime);
        Ok(Some(text))
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
#[path = "../../tests/unit/playlist/watch.rs"]
mod tests;
