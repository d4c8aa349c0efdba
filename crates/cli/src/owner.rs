use std::path::{Path, PathBuf};

use unrealscope_core::IndexOptions;

pub async fn run(config_path: &Path, path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let path = std::path::absolute(&path)?;

    let mut project = crate::open_project(config_path)?;
    project.index_modules(&IndexOptions::default()).await?;

    let file = project.source_file(&path)?;
    match (&file.module, file.module_path()) {
        (Some(module), Some(relative)) => println!("{module}\t{relative}"),
        _ => println!("{file}"),
    }

    Ok(())
}
