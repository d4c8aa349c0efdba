//! Project configuration file (`gunreal.yml`).

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{IndexError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "gunreal.yml";

/// On-disk shape. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    project_name: String,
    /// Path to the `.uproject` file.
    #[serde(default)]
    uproject: Option<PathBuf>,
    /// Defaults to the directory holding the `.uproject` file.
    #[serde(default)]
    project_dir: Option<PathBuf>,
    #[serde(default)]
    editor_dir: Option<PathBuf>,
    /// Explicit build tool path; derived from the editor when unset.
    #[serde(default)]
    ubt: Option<PathBuf>,
}

/// Resolved project configuration. Every path is absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    /// File this configuration was loaded from, `None` when built on the fly.
    pub path: Option<PathBuf>,
    pub project_name: String,
    pub uproject: Option<PathBuf>,
    pub project_dir: PathBuf,
    pub editor_dir: Option<PathBuf>,
    pub ubt: Option<PathBuf>,
}

impl ProjectConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = absolute(path.as_ref())?;
        let content =
            std::fs::read_to_string(&path).map_err(|err| IndexError::io(&path, err))?;
        Self::from_yaml(&content, path)
    }

    /// Parses `content` as if it had been read from `path`. Relative paths
    /// resolve against the directory holding `path`.
    pub fn from_yaml(content: &str, path: PathBuf) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(content)?;
        Self::resolve(raw, path)
    }

    /// Configuration for a project directory without a config file.
    pub fn from_project_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let project_dir = absolute(dir.as_ref())?;
        let project_name = project_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let uproject = find_uproject(&project_dir)?;

        Ok(Self {
            path: None,
            project_name,
            uproject,
            project_dir,
            editor_dir: None,
            ubt: None,
        })
    }

    fn resolve(raw: RawConfig, path: PathBuf) -> Result<Self> {
        if raw.project_name.is_empty() {
            return Err(IndexError::Config("project_name not set".into()));
        }

        let base = path.parent().unwrap_or(Path::new("/")).to_path_buf();

        let uproject = raw
            .uproject
            .map(|p| resolve_against(&base, &p))
            .ok_or_else(|| IndexError::Config("uproject not set".into()))?;
        if !uproject.is_file() {
            return Err(IndexError::Config(format!(
                "uproject {uproject:?} does not exist"
            )));
        }

        let project_dir = match raw.project_dir {
            Some(dir) => resolve_against(&base, &dir),
            None => uproject
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| base.clone()),
        };

        Ok(Self {
            path: Some(path),
            project_name: raw.project_name,
            uproject: Some(uproject),
            project_dir,
            editor_dir: raw.editor_dir.map(|p| resolve_against(&base, &p)),
            ubt: raw.ubt.map(|p| resolve_against(&base, &p)),
        })
    }

    pub fn source_dir(&self) -> PathBuf {
        self.project_dir.join("Source")
    }

    pub fn describe(&self) -> String {
        let mut out = String::new();
        let path = self
            .path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<none>".to_string());
        let uproject = self
            .uproject
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        let _ = writeln!(out, "CONFIG PATH: {path}");
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", section_header("PROJECT"));
        let _ = writeln!(out);
        let _ = writeln!(out, "- NAME: {}", self.project_name);
        let _ = writeln!(out, "- UPROJECT: {uproject}");
        let _ = writeln!(out, "- PROJECT DIR: {}", self.project_dir.display());
        if let Some(editor_dir) = &self.editor_dir {
            let _ = writeln!(out, "- EDITOR DIR: {}", editor_dir.display());
        }
        out
    }
}

/// `NAME ----...` padded to a fixed width.
pub(crate) fn section_header(name: &str) -> String {
    format!("{name} {}", "-".repeat(74usize.saturating_sub(name.len())))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|err| IndexError::io(path, err))
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn find_uproject(dir: &Path) -> Result<Option<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(IndexError::io(dir, err)),
    };

    let mut found = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| IndexError::io(dir, err))?.path();
        if path.extension().is_some_and(|ext| ext == "uproject") {
            found.push(path);
        }
    }
    found.sort();
    Ok(found.into_iter().next())
}
