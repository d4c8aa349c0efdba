use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;
use unrealscope_pipeline::PipelineError;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no build files found under {source_dir:?}. Is it an Unreal project?")]
    NoBuildFiles { source_dir: PathBuf },
    #[error("module {name:?} found more than once ({first:?} and {second:?})")]
    DuplicateModule {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("index consistency error: {0}")]
    Consistency(String),
    #[error("no module contains {0:?}")]
    NotFound(PathBuf),
    #[error("no modules loaded. Is the project indexed?")]
    NotIndexed,
    #[error("build file {path:?} does not match pattern {pattern:?}")]
    Parse { path: PathBuf, pattern: String },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("indexing timed out after {0:?}")]
    Timeout(Duration),
    #[error("unrecognized unreal platform {0:?}")]
    UnknownPlatform(String),
    #[error("{program:?} exited with {status}")]
    ExternalTool { program: PathBuf, status: ExitStatus },
}

impl IndexError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IndexError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, IndexError::Pipeline(PipelineError::Cancelled))
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
