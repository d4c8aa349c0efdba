use std::fmt;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use crate::error::{IndexError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    pub len: u64,
    pub modified: SystemTime,
}

impl FileMetadata {
    /// `Ok(None)` when the file does not exist.
    pub fn stat(path: &Path) -> Result<Option<Self>> {
        match std::fs::metadata(path) {
            Ok(meta) => Ok(Some(FileMetadata {
                len: meta.len(),
                modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            })),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(IndexError::io(path, err)),
        }
    }
}

/// A single file looked up against an index. Built on demand, never stored
/// in bulk.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Owning module name; `None` for intermediate output.
    pub module: Option<String>,
    /// Base directory of the owning module.
    pub module_dir: Option<PathBuf>,
    pub metadata: Option<FileMetadata>,
    pub intermediate: bool,
}

impl SourceFile {
    /// Generated build output lives under an `Intermediate` directory and
    /// never belongs to a module.
    pub fn is_intermediate(path: &Path) -> bool {
        path.components()
            .any(|c| matches!(c, Component::Normal(name) if name == "Intermediate"))
    }

    /// File name without its extension.
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Path relative to the owning module, `/`-separated.
    pub fn module_path(&self) -> Option<String> {
        let base = self.module_dir.as_deref()?;
        let relative = self.path.strip_prefix(base).ok()?;
        let parts: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        Some(parts.join("/"))
    }

    pub fn exists(&self) -> bool {
        self.metadata.is_some()
    }

    /// Latest modification time, or the epoch for files that do not exist.
    pub fn modified(&self) -> SystemTime {
        self.metadata
            .map(|m| m.modified)
            .unwrap_or(SystemTime::UNIX_EPOCH)
    }
}

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        if let Some(module) = &self.module {
            write!(f, " [module:{module}]")?;
        }
        if let Some(meta) = &self.metadata {
            write!(f, " [mod:{:?}]", meta.modified)?;
        }
        write!(f, " [path:{}]", self.path.display())
    }
}
