use std::path::PathBuf;

use tracing::debug;
use unrealscope_pipeline::StageSender;
use walkdir::WalkDir;

use crate::error::{IndexError, Result};

/// Single producer enumerating every directory under a root, root included.
///
/// Runs on the blocking pool. Any directory that cannot be listed fails the
/// walk; nothing is skipped.
pub struct DirectoryWalker {
    root: PathBuf,
}

impl DirectoryWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn directories(&self) -> impl Iterator<Item = Result<PathBuf>> + '_ {
        WalkDir::new(&self.root)
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) if entry.file_type().is_dir() => Some(Ok(entry.into_path())),
                Ok(_) => None,
                Err(err) => {
                    let path = err.path().unwrap_or(&self.root).to_path_buf();
                    Some(Err(IndexError::io(path, err.into())))
                }
            })
    }

    /// Feeds every directory into `out`. Returns how many were sent.
    pub fn run(self, out: StageSender<PathBuf>) -> Result<usize> {
        let mut sent = 0usize;
        for dir in self.directories() {
            out.send_blocking(dir?)?;
            sent += 1;
        }
        debug!("Walked {} directories under {}", sent, self.root.display());
        Ok(sent)
    }
}
