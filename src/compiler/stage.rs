//! Core pipeline stage trait and types

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::error::CompileError;
use super::log::CompilationLog;
use super::toolchain::{BuildOutput, Toolchain};
use super::CompilerPaths;
use crate::level::LevelData;

/// Status of a completed stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// Stage completed normally
    Pass,
    /// Stage completed but produced something worth a second look
    Warn,
}

impl StageStatus {
    /// Returns the status as a colored string
    pub fn as_colored_str(&self) -> String {
        use colored::Colorize;
        match self {
            StageStatus::Pass => "PASS".green().to_string(),
            StageStatus::Warn => "WARN".yellow().to_string(),
        }
    }
}

/// Result of a stage that did not abort the pipeline
#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub status: StageStatus,
    /// Brief message describing the result; also written to the log
    pub message: String,
    /// Optional detailed information
    pub details: Option<String>,
}

impl StageOutcome {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Pass,
            message: message.into(),
            details: None,
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Warn,
            message: message.into(),
            details: None,
        }
    }

    /// Adds optional details to the outcome
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// A finished stage as recorded in the compile report
#[derive(Debug, Clone)]
pub struct StageRecord {
    pub name: &'static str,
    pub outcome: StageOutcome,
    pub duration: Duration,
}

/// Everything a stage may read or produce during one compilation
pub struct StageContext<'a> {
    pub level: &'a LevelData,
    pub paths: &'a CompilerPaths,
    pub project_dir: PathBuf,
    pub toolchain: &'a dyn Toolchain,
    pub log: &'a CompilationLog,
    /// Files copied from the engine and template trees
    pub copied_files: usize,
    /// Files written by code generation
    pub generated_files: Vec<PathBuf>,
    /// Output of the build step, once it has run
    pub build: Option<BuildOutput>,
}

impl StageContext<'_> {
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }
}

/// One step of the compile pipeline
///
/// Returning an error aborts every later stage.
pub trait PipelineStage {
    /// Name shown in the stage report
    fn name(&self) -> &'static str;

    /// Line written to the log before the stage runs
    fn banner(&self) -> Option<&'static str> {
        None
    }

    /// Runs the stage
    fn run(&self, ctx: &mut StageContext<'_>) -> Result<StageOutcome, CompileError>;
}
