//! Build file detection.
//!
//! Detection is a two-step heuristic: a cheap, case-insensitive suffix check
//! on the path, then a pattern match over the content for a build rules
//! class declaration. The policy lives behind [`BuildFileMatcher`] so the
//! pipeline never hardcodes it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use unrealscope_pipeline::{StageReceiver, StageSender};

use crate::error::{IndexError, Result};
use crate::model::BuildFileDescriptor;

pub const UNREAL_BUILD_FILE_EXTENSION: &str = ".build.cs";

/// Name of the capture group holding the declared module name.
pub const MODULE_NAME_GROUP: &str = "name";

static MODULE_RULES_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"public\s+class\s+(?P<name>[a-zA-Z0-9_]+)\s*:\s*ModuleRules")
        .expect("module rules pattern is valid")
});

pub trait BuildFileMatcher: Send + Sync {
    /// Manifest suffix, compared case-insensitively.
    fn extension(&self) -> &str;

    /// `Some(hint)` when `content` declares a build rules class. The hint is
    /// the captured module name, or empty when nothing was captured.
    fn detect(&self, content: &str) -> Option<String>;

    fn supports_path(&self, path: &Path) -> bool {
        let ext = self.extension().as_bytes();
        let name = path.as_os_str().as_encoded_bytes();
        name.len() >= ext.len() && name[name.len() - ext.len()..].eq_ignore_ascii_case(ext)
    }

    /// Module name derived from the build file name by stripping the suffix.
    fn module_name_from_file(&self, path: &Path) -> Option<String> {
        let file_name = path.file_name()?.to_str()?;
        let ext = self.extension();
        if file_name.len() <= ext.len() || !file_name.is_char_boundary(file_name.len() - ext.len())
        {
            return None;
        }
        let (stem, suffix) = file_name.split_at(file_name.len() - ext.len());
        suffix.eq_ignore_ascii_case(ext).then(|| stem.to_string())
    }
}

/// Regex-backed matcher. The default recognizes Unreal `*.Build.cs` files
/// declaring `public class <Name> : ModuleRules`.
#[derive(Debug, Clone)]
pub struct RegexBuildFileMatcher {
    extension: String,
    pattern: Regex,
}

impl RegexBuildFileMatcher {
    /// The module name is taken from the `name` capture group when present.
    pub fn new(extension: impl Into<String>, pattern: Regex) -> Self {
        Self {
            extension: extension.into(),
            pattern,
        }
    }

    pub fn unreal() -> Self {
        Self::new(UNREAL_BUILD_FILE_EXTENSION, MODULE_RULES_REGEX.clone())
    }
}

impl Default for RegexBuildFileMatcher {
    fn default() -> Self {
        Self::unreal()
    }
}

impl BuildFileMatcher for RegexBuildFileMatcher {
    fn extension(&self) -> &str {
        &self.extension
    }

    fn detect(&self, content: &str) -> Option<String> {
        let captures = self.pattern.captures(content)?;
        let hint = captures
            .name(MODULE_NAME_GROUP)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        Some(hint)
    }
}

/// Per-file classification step run by every classifier worker.
#[derive(Clone)]
pub struct BuildFileClassifier {
    matcher: Arc<dyn BuildFileMatcher>,
}

impl BuildFileClassifier {
    pub fn new(matcher: Arc<dyn BuildFileMatcher>) -> Self {
        Self { matcher }
    }

    /// Unreadable candidates are errors, never "not a build file".
    pub async fn classify(&self, path: &Path) -> Result<Option<BuildFileDescriptor>> {
        if !self.matcher.supports_path(path) {
            return Ok(None);
        }

        let data = tokio::fs::read(path)
            .await
            .map_err(|err| IndexError::io(path, err))?;
        let content = String::from_utf8_lossy(&data);

        Ok(self
            .matcher
            .detect(&content)
            .map(|hint| BuildFileDescriptor::new(hint, path)))
    }
}

/// One classifier worker. Every candidate goes to `files`; build files are
/// additionally sent to `build_files`.
pub async fn classify_worker(
    classifier: BuildFileClassifier,
    candidates: StageReceiver<PathBuf>,
    files: StageSender<PathBuf>,
    build_files: StageSender<BuildFileDescriptor>,
) -> Result<()> {
    while let Some(path) = candidates.recv().await? {
        files.send(path.clone()).await?;
        if let Some(descriptor) = classifier.classify(&path).await? {
            build_files.send(descriptor).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_is_case_insensitive() {
        let matcher = RegexBuildFileMatcher::unreal();
        assert!(matcher.supports_path(Path::new("/p/Source/Core/Core.Build.cs")));
        assert!(matcher.supports_path(Path::new("/p/Source/Core/core.BUILD.CS")));
        assert!(!matcher.supports_path(Path::new("/p/Source/Core/Core.Target.cs")));
        assert!(!matcher.supports_path(Path::new("/p/Source/Core/Core.cpp")));
    }

    #[test]
    fn test_detect_captures_name() {
        let matcher = RegexBuildFileMatcher::unreal();
        let source = r#"
using UnrealBuildTool;

public class Core : ModuleRules
{
    public Core(ReadOnlyTargetRules Target) : base(Target) {}
}
"#;
        assert_eq!(matcher.detect(source).as_deref(), Some("Core"));
        assert_eq!(matcher.detect("public class Core : TargetRules {}"), None);
    }

    #[test]
    fn test_detect_without_name_group_yields_empty_hint() {
        let matcher = RegexBuildFileMatcher::new(
            ".build.cs",
            Regex::new(r"class\s+\w+\s*:\s*ModuleRules").unwrap(),
        );
        assert_eq!(
            matcher.detect("public class Foo : ModuleRules {}").as_deref(),
            Some("")
        );
    }

    #[test]
    fn test_module_name_from_file() {
        let matcher = RegexBuildFileMatcher::unreal();
        assert_eq!(
            matcher
                .module_name_from_file(Path::new("/p/Game/Game.Build.cs"))
                .as_deref(),
            Some("Game")
        );
        assert_eq!(
            matcher
                .module_name_from_file(Path::new("/p/Game/game.build.CS"))
                .as_deref(),
            Some("game")
        );
        assert_eq!(
            matcher.module_name_from_file(Path::new("/p/Game/.Build.cs")),
            None
        );
        assert_eq!(
            matcher.module_name_from_file(Path::new("/p/Game/Game.cpp")),
            None
        );
    }

    #[tokio::test]
    async fn test_classify_reads_only_suffix_matches() {
        let temp = tempfile::tempdir().unwrap();
        let classifier = BuildFileClassifier::new(Arc::new(RegexBuildFileMatcher::unreal()));

        let build_file = temp.path().join("Core.Build.cs");
        std::fs::write(&build_file, "public class Core : ModuleRules {}").unwrap();
        let plain = temp.path().join("Helper.Build.cs");
        std::fs::write(&plain, "// not a module").unwrap();

        assert_eq!(
            classifier.classify(&build_file).await.unwrap(),
            Some(BuildFileDescriptor::new("Core", build_file.clone()))
        );
        assert_eq!(classifier.classify(&plain).await.unwrap(), None);

        // Never opened: the suffix check rejects it first.
        let missing_cpp = temp.path().join("Missing.cpp");
        assert_eq!(classifier.classify(&missing_cpp).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unreadable_build_file_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let classifier = BuildFileClassifier::new(Arc::new(RegexBuildFileMatcher::unreal()));

        let missing = temp.path().join("Gone.Build.cs");
        let err = classifier.classify(&missing).await.unwrap_err();
        assert!(matches!(err, IndexError::Io { path, .. } if path == missing));
    }
}
