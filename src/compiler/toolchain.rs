//! Build step run after code generation

use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus};

use thiserror::Error;
use tracing::debug;

use super::log::CompilationLog;

/// Errors from running an external build
#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("'{program}' exited with {status}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// What a build step produced
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    /// True when no real toolchain was invoked
    pub simulated: bool,
    /// Process exit code, if a process ran and reported one
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Turns a generated project directory into a built artifact
pub trait Toolchain: Send + Sync {
    /// Short name shown in logs
    fn name(&self) -> &str;

    /// Builds the project in `project_dir`, appending progress to `log`
    fn build(&self, project_dir: &Path, log: &CompilationLog) -> Result<BuildOutput, ToolchainError>;
}

/// Stand-in build step that always succeeds without running anything
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedToolchain;

impl Toolchain for SimulatedToolchain {
    fn name(&self) -> &str {
        "simulated"
    }

    fn build(&self, _project_dir: &Path, log: &CompilationLog) -> Result<BuildOutput, ToolchainError> {
        log.line("Simulating build process...");
        Ok(BuildOutput {
            simulated: true,
            ..Default::default()
        })
    }
}

/// Runs an external command inside the project directory
///
/// Captured stdout and stderr are copied into the compilation log. A non-zero
/// exit status fails the build.
#[derive(Debug, Clone)]
pub struct CommandToolchain {
    program: String,
    args: Vec<String>,
}

impl CommandToolchain {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Builds from a command line split into program and arguments
    ///
    /// Returns `None` for an empty command line.
    pub fn from_command_line(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Toolchain for CommandToolchain {
    fn name(&self) -> &str {
        &self.program
    }

    fn build(&self, project_dir: &Path, log: &CompilationLog) -> Result<BuildOutput, ToolchainError> {
        log.line(format!("Running: {} {}", self.program, self.args.join(" ")));
        debug!(dir = %project_dir.display(), "Invoking build command");

        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(project_dir)
            .output()
            .map_err(|source| ToolchainError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        for line in stdout.lines() {
            log.line(format!("  {}", line));
        }
        for line in stderr.lines() {
            log.error(format!("  {}", line));
        }

        if !output.status.success() {
            return Err(ToolchainError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr,
            });
        }

        Ok(BuildOutput {
            simulated: false,
            exit_code: output.status.code(),
            stdout,
            stderr,
        })
    }
}
