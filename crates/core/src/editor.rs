use std::fmt;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::section_header;
use crate::error::{IndexError, Result};

/// `Engine/Build/Build.version`, as shipped with every engine build.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct BuildVersion {
    pub major_version: u32,
    pub minor_version: u32,
    pub patch_version: u32,
    #[serde(default)]
    pub changelist: u64,
    #[serde(default)]
    pub compatible_changelist: u64,
    #[serde(default)]
    pub is_licensee_version: u32,
    #[serde(default, rename = "IsPromotedBuild", alias = "IsPromotedbuild")]
    pub is_promoted_build: u32,
    #[serde(default)]
    pub branch_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EngineVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl EngineVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Compares major and minor only.
    pub fn same_minor(&self, other: &EngineVersion) -> bool {
        self.major == other.major && self.minor == other.minor
    }
}

impl From<&BuildVersion> for EngineVersion {
    fn from(bv: &BuildVersion) -> Self {
        EngineVersion::new(bv.major_version, bv.minor_version, bv.patch_version)
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// An Unreal Editor installation or source build.
#[derive(Debug, Clone)]
pub struct Editor {
    pub dir: PathBuf,
    pub version: EngineVersion,
    /// Installed through the launcher rather than built from source.
    pub installed: bool,
    pub build_version: BuildVersion,
}

impl Editor {
    pub fn detect(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = std::path::absolute(dir.as_ref())
            .map_err(|err| IndexError::io(dir.as_ref(), err))?;

        let engine_dir = dir.join("Engine");
        if !engine_dir.is_dir() {
            return Err(IndexError::Config(format!(
                "{dir:?} does not have an Engine directory. Is it an Unreal Editor installation?"
            )));
        }

        let version_path = engine_dir.join("Build").join("Build.version");
        let data =
            std::fs::read_to_string(&version_path).map_err(|err| IndexError::io(&version_path, err))?;
        let build_version: BuildVersion = serde_json::from_str(&data)?;

        let marker = engine_dir.join("Build").join("InstalledBuild.txt");
        let installed = match std::fs::metadata(&marker) {
            Ok(_) => true,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => false,
            Err(err) => return Err(IndexError::io(&marker, err)),
        };

        Ok(Self {
            version: EngineVersion::from(&build_version),
            dir,
            installed,
            build_version,
        })
    }

    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", section_header("EDITOR"));
        let _ = writeln!(out);
        let _ = writeln!(out, "- DIR: {}", self.dir.display());
        let _ = writeln!(out, "- VERSION: {}", self.version);
        let _ = writeln!(out, "- INSTALLED: {}", self.installed);
        out
    }
}
