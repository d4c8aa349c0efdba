use std::path::Path;

use unrealscope_core::BuildToolRunner;

pub async fn run(config_path: &Path, args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let project = crate::open_project(config_path)?;
    let runner = BuildToolRunner::new(project.config(), project.editor())?;

    println!("> Running: {} {:?}", runner.program().display(), runner.arguments(&args));
    runner.run(&args).await?;

    Ok(())
}
