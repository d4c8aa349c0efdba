mod describe;
mod index;
mod owner;
mod ubt;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use unrealscope_core::config::DEFAULT_CONFIG_FILE;
use unrealscope_core::{Project, ProjectConfig};

#[derive(Parser, Debug)]
#[command(
    name = "unrealscope",
    version,
    about = "Indexes the modules of an Unreal project",
    long_about = "Unrealscope walks an Unreal project's Source directory, finds every module build \
                  file and assigns each source file to its owning module, without invoking the \
                  engine's build tool."
)]
pub struct Cli {
    /// Path to the project config file
    #[arg(long, global = true, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config_path: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index the project and print its configuration, editor and modules
    Describe,
    /// Index the project and report module and file totals
    Index {
        #[arg(long, default_value_t = unrealscope_core::indexing::DEFAULT_SCAN_WORKERS)]
        scan_workers: usize,
        #[arg(long, default_value_t = unrealscope_core::indexing::DEFAULT_CLASSIFY_WORKERS)]
        classify_workers: usize,
        #[arg(long, default_value_t = unrealscope_core::indexing::DEFAULT_ASSEMBLE_WORKERS)]
        assemble_workers: usize,
    },
    /// Print the module owning a file
    Owner {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Run UnrealBuildTool against the project
    Ubt {
        /// Arguments passed through to the build tool
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
        args: Vec<String>,
    },
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let _guard = unrealscope_core::logging::init_logging("cli", true);

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Describe => rt.block_on(describe::run(&cli.config_path)),
        Commands::Index {
            scan_workers,
            classify_workers,
            assemble_workers,
        } => rt.block_on(index::run(
            &cli.config_path,
            index::Widths {
                scan: scan_workers,
                classify: classify_workers,
                assemble: assemble_workers,
            },
        )),
        Commands::Owner { path } => rt.block_on(owner::run(&cli.config_path, path)),
        Commands::Ubt { args } => rt.block_on(ubt::run(&cli.config_path, args)),
    }
}

pub(crate) fn open_project(config_path: &Path) -> Result<Project, Box<dyn std::error::Error>> {
    let config = ProjectConfig::load(config_path)?;
    Ok(Project::open(config)?)
}
