use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use super::platform::Platform;
use crate::error::{IndexError, Result};

/// A build file found during classification, waiting to be assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildFileDescriptor {
    /// Name captured from the build rules declaration; empty when the
    /// detector had nothing to capture.
    pub module_hint: String,
    pub path: PathBuf,
}

impl BuildFileDescriptor {
    pub fn new(module_hint: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            module_hint: module_hint.into(),
            path: path.into(),
        }
    }
}

/// An Unreal module: a build file plus every source file beneath its directory.
#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub base_dir: PathBuf,
    pub build_file: PathBuf,
    /// Sorted by full path string.
    pub files: Vec<PathBuf>,

    uht: UhtFileCache,
}

impl Module {
    /// `build_file` is expected to be absolute and normalized; its parent
    /// becomes the module base directory.
    pub fn new(name: impl Into<String>, build_file: PathBuf, files: Vec<PathBuf>) -> Self {
        let base_dir = build_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Self {
            name: name.into(),
            base_dir,
            build_file,
            files,
            uht: UhtFileCache::default(),
        }
    }

    /// Whether `path` lies under this module's base directory.
    ///
    /// Component-wise, so `Source/CoreExtra` is not inside `Source/Core`.
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.base_dir)
    }

    /// Generated (UHT) files for `platform`, walking the intermediate
    /// directory on first use or when `reload` is set.
    ///
    /// `project_dir` is the root holding `Intermediate/`; the module keeps no
    /// reference to its project.
    pub fn load_generated_files(
        &mut self,
        project_dir: &Path,
        platform: Platform,
        reload: bool,
    ) -> Result<&[PathBuf]> {
        let dir = UhtFileCache::generated_dir(project_dir, platform, &self.name);
        self.uht.load(&dir, platform, reload)
    }

    /// Previously loaded generated files, without touching the filesystem.
    pub fn cached_generated_files(&self, platform: Platform) -> Option<&[PathBuf]> {
        self.uht.get(platform)
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir_name = self
            .base_dir
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        write!(f, "{} ({})", dir_name, self.base_dir.display())
    }
}

/// Per-platform cache of reflection output belonging to one module.
#[derive(Debug, Clone, Default)]
pub struct UhtFileCache {
    entries: HashMap<Platform, Vec<PathBuf>>,
}

impl UhtFileCache {
    pub fn generated_dir(project_dir: &Path, platform: Platform, module: &str) -> PathBuf {
        project_dir
            .join("Intermediate")
            .join("Build")
            .join(platform.dir_name())
            .join("UnrealEditor")
            .join("Inc")
            .join(module)
            .join("UHT")
    }

    pub fn get(&self, platform: Platform) -> Option<&[PathBuf]> {
        self.entries.get(&platform).map(Vec::as_slice)
    }

    /// A missing directory caches an empty list. Any other failure leaves the
    /// previous entry (or its absence) untouched so a later call can retry.
    pub fn load(&mut self, dir: &Path, platform: Platform, reload: bool) -> Result<&[PathBuf]> {
        if reload || !self.entries.contains_key(&platform) {
            let files = Self::walk(dir)?;
            debug!(
                "Loaded {} generated files for {} from {}",
                files.len(),
                platform,
                dir.display()
            );
            self.entries.insert(platform, files);
        }

        Ok(self.get(platform).unwrap_or_default())
    }

    fn walk(dir: &Path) -> Result<Vec<PathBuf>> {
        match std::fs::metadata(dir) {
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(IndexError::io(dir, err)),
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(dir) {
            let entry = entry.map_err(|err| {
                let path = err.path().unwrap_or(dir).to_path_buf();
                IndexError::io(path, err.into())
            })?;
            if entry.file_type().is_dir() {
                continue;
            }
            files.push(entry.into_path());
        }
        files.sort_unstable_by(|a, b| a.as_os_str().cmp(b.as_os_str()));

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn module_at(root: &Path, name: &str) -> Module {
        let build_file = root.join("Source").join(name).join(format!("{name}.Build.cs"));
        Module::new(name, build_file.clone(), vec![build_file])
    }

    #[test]
    fn test_contains_is_component_wise() {
        let module = module_at(Path::new("/project"), "Core");

        assert!(module.contains(Path::new("/project/Source/Core/Foo.cpp")));
        assert!(module.contains(Path::new("/project/Source/Core/Sub/Bar.cpp")));
        assert!(!module.contains(Path::new("/project/Source/CoreExtra/Foo.cpp")));
        assert!(!module.contains(Path::new("/project/Source/Game/Baz.cpp")));
    }

    #[test]
    fn test_display() {
        let module = module_at(Path::new("/project"), "Core");
        assert_eq!(module.to_string(), "Core (/project/Source/Core)");
    }

    #[test]
    fn test_missing_generated_dir_is_cached_empty() {
        let temp = tempfile::tempdir().unwrap();
        let mut module = module_at(temp.path(), "Core");

        assert!(module.cached_generated_files(Platform::Win64).is_none());
        let files = module
            .load_generated_files(temp.path(), Platform::Win64, false)
            .unwrap();
        assert!(files.is_empty());
        assert_eq!(module.cached_generated_files(Platform::Win64), Some(&[][..]));
    }

    #[test]
    fn test_reload_rewalks_generated_dir() {
        let temp = tempfile::tempdir().unwrap();
        let mut module = module_at(temp.path(), "Core");

        assert!(
            module
                .load_generated_files(temp.path(), Platform::Win64, false)
                .unwrap()
                .is_empty()
        );

        let uht_dir = UhtFileCache::generated_dir(temp.path(), Platform::Win64, "Core");
        fs::create_dir_all(uht_dir.join("Nested")).unwrap();
        fs::write(uht_dir.join("Core.init.gen.cpp"), "").unwrap();
        fs::write(uht_dir.join("Nested").join("Foo.gen.cpp"), "").unwrap();

        // Cached result wins without reload.
        assert!(
            module
                .load_generated_files(temp.path(), Platform::Win64, false)
                .unwrap()
                .is_empty()
        );

        let files = module
            .load_generated_files(temp.path(), Platform::Win64, true)
            .unwrap();
        assert_eq!(
            files,
            &[
                uht_dir.join("Core.init.gen.cpp"),
                uht_dir.join("Nested").join("Foo.gen.cpp"),
            ][..]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_walk_does_not_poison_cache() {
        let temp = tempfile::tempdir().unwrap();
        let mut module = module_at(temp.path(), "Core");

        // A regular file where a directory is expected makes the stat of the
        // generated dir fail with something other than NotFound.
        let build_dir = temp.path().join("Intermediate").join("Build");
        fs::create_dir_all(&build_dir).unwrap();
        fs::write(build_dir.join("Win64"), "not a directory").unwrap();

        let err = module
            .load_generated_files(temp.path(), Platform::Win64, false)
            .unwrap_err();
        assert!(matches!(err, IndexError::Io { .. }));
        assert!(module.cached_generated_files(Platform::Win64).is_none());

        fs::remove_file(build_dir.join("Win64")).unwrap();
        let uht_dir = UhtFileCache::generated_dir(temp.path(), Platform::Win64, "Core");
        fs::create_dir_all(&uht_dir).unwrap();
        fs::write(uht_dir.join("Core.gen.cpp"), "").unwrap();

        let files = module
            .load_generated_files(temp.path(), Platform::Win64, false)
            .unwrap();
        assert_eq!(files.len(), 1);
    }
}
