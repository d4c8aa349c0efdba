use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use unrealscope_pipeline::Reducer;

use crate::error::IndexError;
use crate::model::BuildFileDescriptor;

/// Orders paths by their full string, byte by byte.
///
/// `PathBuf`'s own `Ord` compares component-wise, which is not the order the
/// registry is searched in.
pub fn path_order(a: &Path, b: &Path) -> Ordering {
    a.as_os_str().cmp(b.as_os_str())
}

/// Every file under the source root, sorted by full path string.
///
/// Immutable once built; assembler workers share it read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRegistry {
    files: Vec<PathBuf>,
}

impl FileRegistry {
    pub fn from_unsorted(mut files: Vec<PathBuf>) -> Self {
        files.sort_unstable_by(|a, b| path_order(a, b));
        files.dedup();
        Self { files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn position(&self, path: &Path) -> Option<usize> {
        self.files
            .binary_search_by(|probe| path_order(probe, path))
            .ok()
    }

    /// The contiguous run around `anchor` whose entries all satisfy `belongs`,
    /// anchor included. Expansion stops at the first entry on each side that
    /// fails the test; entries beyond it are never considered.
    pub fn run_around<F>(&self, anchor: usize, belongs: F) -> &[PathBuf]
    where
        F: Fn(&Path) -> bool,
    {
        let mut start = anchor;
        while start > 0 && belongs(&self.files[start - 1]) {
            start -= 1;
        }

        let mut end = anchor + 1;
        while end < self.files.len() && belongs(&self.files[end]) {
            end += 1;
        }

        &self.files[start..end]
    }
}

/// Collects every scanned path; sorting happens once the stream closes.
#[derive(Default)]
pub struct FileRegistryReducer {
    files: Vec<PathBuf>,
}

impl Reducer<PathBuf> for FileRegistryReducer {
    type Output = FileRegistry;
    type Error = IndexError;

    fn accept(&mut self, item: PathBuf) -> Result<(), IndexError> {
        self.files.push(item);
        Ok(())
    }

    fn finish(self) -> FileRegistry {
        FileRegistry::from_unsorted(self.files)
    }
}

#[derive(Default)]
pub struct BuildFileReducer {
    build_files: Vec<BuildFileDescriptor>,
}

impl Reducer<BuildFileDescriptor> for BuildFileReducer {
    type Output = Vec<BuildFileDescriptor>;
    type Error = IndexError;

    fn accept(&mut self, item: BuildFileDescriptor) -> Result<(), IndexError> {
        self.build_files.push(item);
        Ok(())
    }

    fn finish(self) -> Vec<BuildFileDescriptor> {
        self.build_files
    }
}
