use std::path::Path;
use std::time::{Duration, Instant};

use unrealscope_core::IndexOptions;

const DESCRIBE_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let started = Instant::now();

    let mut project = crate::open_project(config_path)?;
    project
        .index_modules(&IndexOptions::default().with_timeout(DESCRIBE_TIMEOUT))
        .await?;

    println!("Indexing took {:?} to execute.\n", started.elapsed());
    println!("{}", project.describe());

    Ok(())
}
