use std::path::Path;
use std::time::Instant;

use tracing::info;
use unrealscope_core::IndexOptions;

pub struct Widths {
    pub scan: usize,
    pub classify: usize,
    pub assemble: usize,
}

pub async fn run(config_path: &Path, widths: Widths) -> Result<(), Box<dyn std::error::Error>> {
    let mut project = crate::open_project(config_path)?;

    let options = IndexOptions {
        scan_workers: widths.scan,
        classify_workers: widths.classify,
        assemble_workers: widths.assemble,
        ..IndexOptions::default()
    };

    info!("Indexing project at: {}...", project.source_dir().display());
    let started = Instant::now();
    let index = project.index_modules(&options).await?;

    info!("Indexing complete in {:?}", started.elapsed());
    info!("Modules: {}", index.len());
    info!("Files: {}", index.file_count());
    for name in index.names().take(10) {
        info!(" - {}", name);
    }

    Ok(())
}
