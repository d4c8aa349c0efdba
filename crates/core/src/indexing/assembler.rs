use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::Path;
use std::sync::Arc;

use unrealscope_pipeline::{Reducer, StageReceiver, StageSender};

use super::classifier::BuildFileMatcher;
use super::registry::FileRegistry;
use crate::error::{IndexError, Result};
use crate::model::{BuildFileDescriptor, Module};

/// Turns build file descriptors into modules using the sorted registry.
///
/// A module's files are the contiguous registry run around its build file
/// whose entries lie under the build file's directory. No subtree is walked.
#[derive(Clone)]
pub struct ModuleAssembler {
    registry: Arc<FileRegistry>,
    matcher: Arc<dyn BuildFileMatcher>,
}

impl ModuleAssembler {
    pub fn new(registry: Arc<FileRegistry>, matcher: Arc<dyn BuildFileMatcher>) -> Self {
        Self { registry, matcher }
    }

    pub fn assemble(&self, descriptor: BuildFileDescriptor) -> Result<Module> {
        let BuildFileDescriptor { module_hint, path } = descriptor;

        let base_dir = path.parent().ok_or_else(|| {
            IndexError::Consistency(format!("build file {path:?} has no parent directory"))
        })?;

        let anchor = self.registry.position(&path).ok_or_else(|| {
            IndexError::Consistency(format!("build file {path:?} missing from file registry"))
        })?;

        // Already in registry order, which is the order modules keep.
        let files = self
            .registry
            .run_around(anchor, |candidate: &Path| candidate.starts_with(base_dir))
            .to_vec();

        let name = self.resolve_name(module_hint, &path)?;
        Ok(Module::new(name, path, files))
    }

    fn resolve_name(&self, hint: String, path: &Path) -> Result<String> {
        if !hint.is_empty() {
            return Ok(hint);
        }
        self.matcher
            .module_name_from_file(path)
            .ok_or_else(|| IndexError::Parse {
                path: path.to_path_buf(),
                pattern: format!("<Name>{}", self.matcher.extension()),
            })
    }
}

/// One assembler worker: descriptors in, modules out.
pub async fn assemble_worker(
    assembler: ModuleAssembler,
    descriptors: StageReceiver<BuildFileDescriptor>,
    modules: StageSender<Module>,
) -> Result<()> {
    while let Some(descriptor) = descriptors.recv().await? {
        modules.send(assembler.assemble(descriptor)?).await?;
    }
    Ok(())
}

/// Sole writer of the name to module mapping.
#[derive(Default)]
pub struct ModuleRegistryReducer {
    modules: BTreeMap<String, Module>,
}

impl Reducer<Module> for ModuleRegistryReducer {
    type Output = BTreeMap<String, Module>;
    type Error = IndexError;

    fn accept(&mut self, module: Module) -> Result<()> {
        match self.modules.entry(module.name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(module);
                Ok(())
            }
            Entry::Occupied(existing) => Err(IndexError::DuplicateModule {
                name: module.name,
                first: existing.get().build_file.clone(),
                second: module.build_file,
            }),
        }
    }

    fn finish(self) -> BTreeMap<String, Module> {
        self.modules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexing::classifier::RegexBuildFileMatcher;
    use std::path::PathBuf;

    fn assembler(paths: &[&str]) -> ModuleAssembler {
        let registry = FileRegistry::from_unsorted(paths.iter().map(PathBuf::from).collect());
        ModuleAssembler::new(
            Arc::new(registry),
            Arc::new(RegexBuildFileMatcher::unreal()),
        )
    }

    #[test]
    fn test_assemble_collects_run_under_base_dir() {
        let assembler = assembler(&[
            "/S/Core/Core.Build.cs",
            "/S/Core/Foo.cpp",
            "/S/Core/Sub/Bar.cpp",
            "/S/CoreExtra/Extra.cpp",
            "/S/Game/Game.Build.cs",
            "/S/Game/Baz.cpp",
        ]);

        let module = assembler
            .assemble(BuildFileDescriptor::new("Core", "/S/Core/Core.Build.cs"))
            .unwrap();

        assert_eq!(module.name, "Core");
        assert_eq!(module.base_dir, PathBuf::from("/S/Core"));
        assert_eq!(
            module.files,
            vec![
                PathBuf::from("/S/Core/Core.Build.cs"),
                PathBuf::from("/S/Core/Foo.cpp"),
                PathBuf::from("/S/Core/Sub/Bar.cpp"),
            ]
        );
    }

    #[test]
    fn test_empty_hint_falls_back_to_file_name() {
        let assembler = assembler(&["/S/Game/Game.Build.cs"]);
        let module = assembler
            .assemble(BuildFileDescriptor::new("", "/S/Game/Game.Build.cs"))
            .unwrap();
        assert_eq!(module.name, "Game");
    }

    #[test]
    fn test_unparseable_file_name_is_a_parse_error() {
        let assembler = assembler(&["/S/Game/.Build.cs"]);
        let err = assembler
            .assemble(BuildFileDescriptor::new("", "/S/Game/.Build.cs"))
            .unwrap_err();
        assert!(matches!(err, IndexError::Parse { .. }));
    }

    #[test]
    fn test_missing_from_registry_is_a_consistency_error() {
        let assembler = assembler(&["/S/Game/Baz.cpp"]);
        let err = assembler
            .assemble(BuildFileDescriptor::new("Game", "/S/Game/Game.Build.cs"))
            .unwrap_err();
        assert!(matches!(err, IndexError::Consistency(_)));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut reducer = ModuleRegistryReducer::default();
        let first = PathBuf::from("/S/A/Core.Build.cs");
        let second = PathBuf::from("/S/B/Core.Build.cs");

        reducer
            .accept(Module::new("Core", first.clone(), Vec::new()))
            .unwrap();
        let err = reducer
            .accept(Module::new("Core", second.clone(), Vec::new()))
            .unwrap_err();

        match err {
            IndexError::DuplicateModule {
                name,
                first: f,
                second: s,
            } => {
                assert_eq!(name, "Core");
                assert_eq!(f, first);
                assert_eq!(s, second);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
