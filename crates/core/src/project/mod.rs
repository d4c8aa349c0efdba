pub mod index;

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::{ProjectConfig, section_header};
use crate::editor::Editor;
use crate::error::{IndexError, Result};
use crate::indexing::{IndexOptions, build_index_with_cancel};
use crate::model::{Module, Platform, SourceFile};

pub use index::ProjectIndex;

/// An Unreal project: its configuration, the optional editor it builds with
/// and, once indexed, its modules.
#[derive(Debug)]
pub struct Project {
    config: ProjectConfig,
    editor: Option<Editor>,
    index: Option<ProjectIndex>,
}

impl Project {
    /// Fails when `<project_dir>/Source` is missing or the configured editor
    /// cannot be read.
    pub fn open(config: ProjectConfig) -> Result<Self> {
        let source_dir = config.source_dir();
        match std::fs::metadata(&source_dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(IndexError::Config(format!(
                    "source dir {source_dir:?} is not a directory"
                )));
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(IndexError::Config(format!(
                    "source dir {source_dir:?} does not exist"
                )));
            }
            Err(err) => return Err(IndexError::io(&source_dir, err)),
        }

        let editor = config
            .editor_dir
            .as_deref()
            .map(Editor::detect)
            .transpose()?;

        Ok(Self {
            config,
            editor,
            index: None,
        })
    }

    pub fn from_project_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::open(ProjectConfig::from_project_dir(dir)?)
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn editor(&self) -> Option<&Editor> {
        self.editor.as_ref()
    }

    pub fn project_dir(&self) -> &Path {
        &self.config.project_dir
    }

    pub fn source_dir(&self) -> PathBuf {
        self.config.source_dir()
    }

    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }

    pub fn index(&self) -> Result<&ProjectIndex> {
        self.index.as_ref().ok_or(IndexError::NotIndexed)
    }

    pub fn index_mut(&mut self) -> Result<&mut ProjectIndex> {
        self.index.as_mut().ok_or(IndexError::NotIndexed)
    }

    /// Rebuilds the module index from scratch. On failure the previous index,
    /// if any, is kept.
    pub async fn index_modules(&mut self, options: &IndexOptions) -> Result<&ProjectIndex> {
        self.index_modules_with_cancel(options, &CancellationToken::new())
            .await
    }

    pub async fn index_modules_with_cancel(
        &mut self,
        options: &IndexOptions,
        cancel: &CancellationToken,
    ) -> Result<&ProjectIndex> {
        let index = build_index_with_cancel(&self.source_dir(), options, cancel).await?;
        Ok(&*self.index.insert(index))
    }

    pub fn identify_owner(&self, path: &Path) -> Result<&Module> {
        self.index()?.identify_owner(path)
    }

    pub fn source_file(&self, path: &Path) -> Result<SourceFile> {
        self.index()?.source_file(path)
    }

    /// Every module and generated file whose file name ends with one of
    /// `extensions`, sorted. Generated files are loaded through each
    /// module's cache.
    ///
    /// A parent module also lists the files of modules nested below it;
    /// those are reported once, for their owner.
    pub fn search_files_by_extension(
        &mut self,
        platform: Platform,
        extensions: &[&str],
    ) -> Result<Vec<PathBuf>> {
        if extensions.is_empty() {
            return Err(IndexError::Config("no extension given to search".into()));
        }

        let project_dir = self.config.project_dir.clone();
        let index = self.index_mut()?;
        for module in index.modules_mut() {
            module.load_generated_files(&project_dir, platform, false)?;
        }
        let index = &*index;

        let mut found = BTreeSet::new();
        for module in index.modules() {
            let generated = module.cached_generated_files(platform).unwrap_or_default();

            for file in module.files.iter() {
                if has_extension(file, extensions)
                    && index.identify_owner(file)?.name == module.name
                {
                    found.insert(file.clone());
                }
            }

            for file in generated {
                if has_extension(file, extensions) && !found.insert(file.clone()) {
                    return Err(IndexError::Consistency(format!(
                        "file {file:?} found more than once"
                    )));
                }
            }
        }

        debug!(
            "Found {} files matching {:?} for {}",
            found.len(),
            extensions,
            platform
        );
        Ok(found.into_iter().collect())
    }

    pub fn describe(&self) -> String {
        let mut out = self.config.describe();
        out.push('\n');

        if let Some(editor) = &self.editor {
            out.push_str(&editor.describe());
            out.push('\n');
        }

        let _ = writeln!(out, "{}", section_header("MODULES"));
        let _ = writeln!(out);
        if let Some(index) = &self.index {
            for (i, module) in index.modules().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                let _ = writeln!(out, "- MODULE: {}", module.name);
                let _ = writeln!(out, "  - BASE DIR: {}", module.base_dir.display());
                let _ = writeln!(out, "  - BUILD FILE: {}", module.build_file.display());
                let _ = writeln!(out, "  - FILES: {}", module.files.len());
            }
        }
        out
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| extensions.iter().any(|ext| name.ends_with(ext)))
}
