//! Module indexing pipeline.
//!
//! Phase one walks the source tree and builds the sorted file registry plus
//! the list of build files. Phase two assembles one module per build file
//! against that registry. Phase two never starts before phase one has fully
//! joined and sorted.

pub mod assembler;
pub mod classifier;
pub mod registry;
pub mod scanner;
pub mod walker;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use unrealscope_pipeline::{FlowControlConfig, TaskGroup, drain, handoff};

use crate::error::{IndexError, Result};
use crate::model::{BuildFileDescriptor, Module};
use crate::project::ProjectIndex;

pub use assembler::{ModuleAssembler, ModuleRegistryReducer, assemble_worker};
pub use classifier::{
    BuildFileClassifier, BuildFileMatcher, RegexBuildFileMatcher, UNREAL_BUILD_FILE_EXTENSION,
    classify_worker,
};
pub use registry::{BuildFileReducer, FileRegistry, FileRegistryReducer, path_order};
pub use scanner::{list_files, scan_worker};
pub use walker::DirectoryWalker;

pub const DEFAULT_SCAN_WORKERS: usize = 100;
pub const DEFAULT_CLASSIFY_WORKERS: usize = 100;
pub const DEFAULT_ASSEMBLE_WORKERS: usize = 100;

#[derive(Clone)]
pub struct IndexOptions {
    pub flow_control: FlowControlConfig,
    pub scan_workers: usize,
    pub classify_workers: usize,
    pub assemble_workers: usize,
    /// Whole-operation deadline. Hitting it cancels every stage.
    pub timeout: Option<Duration>,
    pub matcher: Arc<dyn BuildFileMatcher>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            flow_control: FlowControlConfig::default(),
            scan_workers: DEFAULT_SCAN_WORKERS,
            classify_workers: DEFAULT_CLASSIFY_WORKERS,
            assemble_workers: DEFAULT_ASSEMBLE_WORKERS,
            timeout: None,
            matcher: Arc::new(RegexBuildFileMatcher::unreal()),
        }
    }
}

impl IndexOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets every pool to the same width.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.scan_workers = workers;
        self.classify_workers = workers;
        self.assemble_workers = workers;
        self
    }

    pub fn with_matcher(mut self, matcher: Arc<dyn BuildFileMatcher>) -> Self {
        self.matcher = matcher;
        self
    }
}

/// Output of phase one.
#[derive(Debug)]
pub struct CollectedFiles {
    pub registry: FileRegistry,
    pub build_files: Vec<BuildFileDescriptor>,
}

/// Indexes every module under `source_root`. All or nothing.
pub async fn build_index(source_root: &Path, options: &IndexOptions) -> Result<ProjectIndex> {
    build_index_with_cancel(source_root, options, &CancellationToken::new()).await
}

/// Like [`build_index`], stopping early with `Cancelled` once `cancel` fires.
pub async fn build_index_with_cancel(
    source_root: &Path,
    options: &IndexOptions,
    cancel: &CancellationToken,
) -> Result<ProjectIndex> {
    let token = cancel.child_token();
    let started = Instant::now();

    let indexing = run_phases(source_root, options, &token);
    let modules = match options.timeout {
        Some(limit) => match tokio::time::timeout(limit, indexing).await {
            Ok(result) => result?,
            Err(_) => {
                token.cancel();
                return Err(IndexError::Timeout(limit));
            }
        },
        None => indexing.await?,
    };

    let index = ProjectIndex::new(source_root, modules);
    info!(
        "Indexed {} modules under {} in {:?}",
        index.len(),
        source_root.display(),
        started.elapsed()
    );
    Ok(index)
}

async fn run_phases(
    source_root: &Path,
    options: &IndexOptions,
    cancel: &CancellationToken,
) -> Result<BTreeMap<String, Module>> {
    let collected = collect_files(source_root, options, cancel).await?;
    if collected.build_files.is_empty() {
        return Err(IndexError::NoBuildFiles {
            source_dir: source_root.to_path_buf(),
        });
    }

    assemble_modules(collected, options, cancel).await
}

/// Phase one: walk, scan, classify, then reduce and sort.
pub async fn collect_files(
    source_root: &Path,
    options: &IndexOptions,
    cancel: &CancellationToken,
) -> Result<CollectedFiles> {
    let started = Instant::now();
    let mut group = TaskGroup::<IndexError>::new(cancel);
    let token = group.token();
    let flow = &options.flow_control;

    let (dirs_tx, dirs_rx) = handoff::<PathBuf>(flow, &token);
    let (candidates_tx, candidates_rx) = handoff::<PathBuf>(flow, &token);
    let (files_tx, files_rx) = handoff::<PathBuf>(flow, &token);
    let (build_files_tx, build_files_rx) = handoff::<BuildFileDescriptor>(flow, &token);

    let walker = DirectoryWalker::new(source_root);
    group.spawn_blocking("walker", move || walker.run(dirs_tx).map(|_| ()));

    for _ in 0..options.scan_workers.max(1) {
        group.spawn(
            "scanner",
            scan_worker(dirs_rx.clone(), candidates_tx.clone()),
        );
    }
    drop(dirs_rx);
    drop(candidates_tx);

    let classifier = BuildFileClassifier::new(Arc::clone(&options.matcher));
    for _ in 0..options.classify_workers.max(1) {
        group.spawn(
            "classifier",
            classify_worker(
                classifier.clone(),
                candidates_rx.clone(),
                files_tx.clone(),
                build_files_tx.clone(),
            ),
        );
    }
    drop(candidates_rx);
    drop(files_tx);
    drop(build_files_tx);

    let registry = group.spawn_output(
        "file registry",
        drain(files_rx, FileRegistryReducer::default()),
    );
    let build_files = group.spawn_output(
        "build file registry",
        drain(build_files_rx, BuildFileReducer::default()),
    );

    group.wait().await?;
    let collected = CollectedFiles {
        registry: registry.take().await?,
        build_files: build_files.take().await?,
    };

    debug!(
        "Collected {} files and {} build files in {:?}",
        collected.registry.len(),
        collected.build_files.len(),
        started.elapsed()
    );
    Ok(collected)
}

/// Phase two: one module per build file, reduced into the name mapping.
pub async fn assemble_modules(
    collected: CollectedFiles,
    options: &IndexOptions,
    cancel: &CancellationToken,
) -> Result<BTreeMap<String, Module>> {
    let started = Instant::now();
    let CollectedFiles {
        registry,
        build_files,
    } = collected;

    let mut group = TaskGroup::<IndexError>::new(cancel);
    let token = group.token();
    let flow = &options.flow_control;

    let (descriptors_tx, descriptors_rx) = handoff::<BuildFileDescriptor>(flow, &token);
    let (modules_tx, modules_rx) = handoff::<Module>(flow, &token);

    group.spawn("build file feeder", async move {
        for descriptor in build_files {
            descriptors_tx.send(descriptor).await?;
        }
        Ok(())
    });

    let assembler = ModuleAssembler::new(Arc::new(registry), Arc::clone(&options.matcher));
    for _ in 0..options.assemble_workers.max(1) {
        group.spawn(
            "assembler",
            assemble_worker(assembler.clone(), descriptors_rx.clone(), modules_tx.clone()),
        );
    }
    drop(descriptors_rx);
    drop(modules_tx);

    let modules = group.spawn_output(
        "module registry",
        drain(modules_rx, ModuleRegistryReducer::default()),
    );

    group.wait().await?;
    let modules = modules.take().await?;

    debug!(
        "Assembled {} modules in {:?}",
        modules.len(),
        started.elapsed()
    );
    Ok(modules)
}
