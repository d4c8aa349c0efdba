use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::info;

use crate::config::ProjectConfig;
use crate::editor::{Editor, EngineVersion};
use crate::error::{IndexError, Result};

/// Engine releases whose build tool accepts our invocation.
pub const SUPPORTED_ENGINE_VERSIONS: [EngineVersion; 2] =
    [EngineVersion::new(5, 2, 0), EngineVersion::new(5, 3, 0)];

pub fn is_supported_engine(version: &EngineVersion) -> bool {
    SUPPORTED_ENGINE_VERSIONS
        .iter()
        .any(|supported| supported.same_minor(version))
}

pub fn default_build_tool_path(editor_dir: &Path) -> PathBuf {
    editor_dir
        .join("Engine")
        .join("Binaries")
        .join("DotNET")
        .join("UnrealBuildTool")
        .join("UnrealBuildTool.exe")
}

/// Runs UnrealBuildTool against the configured project.
#[derive(Debug, Clone)]
pub struct BuildToolRunner {
    program: PathBuf,
    uproject: PathBuf,
    working_dir: PathBuf,
}

impl BuildToolRunner {
    pub fn new(config: &ProjectConfig, editor: Option<&Editor>) -> Result<Self> {
        let editor = editor.ok_or_else(|| {
            IndexError::Config("running the build tool requires editor_dir".into())
        })?;
        if !is_supported_engine(&editor.version) {
            return Err(IndexError::Config(format!(
                "unsupported engine version {}; expected 5.2 or 5.3",
                editor.version
            )));
        }

        let uproject = config
            .uproject
            .clone()
            .ok_or_else(|| IndexError::Config("running the build tool requires uproject".into()))?;
        let program = config
            .ubt
            .clone()
            .unwrap_or_else(|| default_build_tool_path(&editor.dir));

        Ok(Self {
            program,
            uproject,
            working_dir: editor.dir.join("Engine").join("Source"),
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Full argument list: caller arguments followed by `-Project <uproject>`.
    pub fn arguments(&self, args: &[String]) -> Vec<String> {
        let mut all = args.to_vec();
        all.push("-Project".to_string());
        all.push(self.uproject.to_string_lossy().into_owned());
        all
    }

    /// Streams the tool's output through ours. A non-zero exit is an error
    /// carrying the status; nothing is retried.
    pub async fn run(&self, args: &[String]) -> Result<()> {
        let arguments = self.arguments(args);
        info!("Running {} {:?}", self.program.display(), arguments);

        let mut command = Command::new(&self.program);
        command
            .args(&arguments)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if self.working_dir.is_dir() {
            command.current_dir(&self.working_dir);
        }

        let status = command
            .status()
            .await
            .map_err(|err| IndexError::io(&self.program, err))?;

        if !status.success() {
            return Err(IndexError::ExternalTool {
                program: self.program.clone(),
                status,
            });
        }
        Ok(())
    }
}
