use std::path::{Path, PathBuf};

use unrealscope_pipeline::{StageReceiver, StageSender};

use crate::error::{IndexError, Result};

/// Lists the immediate entries of one directory and keeps the non-directories.
/// Subdirectories are left to the walker.
pub async fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|err| IndexError::io(dir, err))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|err| IndexError::io(dir, err))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|err| IndexError::io(entry.path(), err))?;
        if file_type.is_dir() {
            continue;
        }
        files.push(entry.path());
    }

    Ok(files)
}

/// One scanner worker: directories in, candidate files out.
pub async fn scan_worker(dirs: StageReceiver<PathBuf>, files: StageSender<PathBuf>) -> Result<()> {
    while let Some(dir) = dirs.recv().await? {
        for file in list_files(&dir).await? {
            files.send(file).await?;
        }
    }
    Ok(())
}
