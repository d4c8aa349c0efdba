use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{IndexError, Result};
use crate::model::{FileMetadata, Module, SourceFile};

/// Module name to module, for one indexing run.
///
/// Only produced by a fully successful index build; nothing is added or
/// removed afterwards.
#[derive(Debug, Clone, Default)]
pub struct ProjectIndex {
    source_dir: PathBuf,
    modules: BTreeMap<String, Module>,
}

impl ProjectIndex {
    pub fn new(source_dir: impl Into<PathBuf>, modules: BTreeMap<String, Module>) -> Self {
        Self {
            source_dir: source_dir.into(),
            modules,
        }
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    /// Mutable access is limited to a module's own generated file cache.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Module> {
        self.modules.get_mut(name)
    }

    /// Modules in name order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    pub fn modules_mut(&mut self) -> impl Iterator<Item = &mut Module> {
        self.modules.values_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Total file count across modules.
    pub fn file_count(&self) -> usize {
        self.modules.values().map(|m| m.files.len()).sum()
    }

    /// The module owning `path`: the one with the longest base directory
    /// that is a path prefix of it.
    pub fn identify_owner(&self, path: &Path) -> Result<&Module> {
        self.modules
            .values()
            .filter(|module| module.contains(path))
            .max_by_key(|module| module.base_dir.as_os_str().len())
            .ok_or_else(|| IndexError::NotFound(path.to_path_buf()))
    }

    /// Looks `path` up against the index. Intermediate output gets no module;
    /// anything else must have an owner.
    pub fn source_file(&self, path: &Path) -> Result<SourceFile> {
        let intermediate = SourceFile::is_intermediate(path);
        let (module, module_dir) = if intermediate {
            (None, None)
        } else {
            let owner = self.identify_owner(path)?;
            (Some(owner.name.clone()), Some(owner.base_dir.clone()))
        };

        Ok(SourceFile {
            path: path.to_path_buf(),
            module,
            module_dir,
            metadata: FileMetadata::stat(path)?,
            intermediate,
        })
    }
}
