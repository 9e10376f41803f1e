//! Errors produced by the compile pipeline

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::toolchain::ToolchainError;

/// Why a compilation did not complete
///
/// Failures returned by `compile_level`, other than
/// [`CompileError::AlreadyCompiling`], are also appended to the compilation
/// log using their `Display` text.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("A compilation is already in progress")]
    AlreadyCompiling,

    #[error("Error creating output directory {}: {source}", .path.display())]
    CreateOutputRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid game name '{0}': expected a single non-empty directory name")]
    InvalidGameName(String),

    #[error(
        "Game directory {} overlaps source tree {}",
        .project.display(),
        .tree.display()
    )]
    OverlappingTree { project: PathBuf, tree: PathBuf },

    #[error("Error clearing previous build: {source}")]
    ClearPreviousBuild {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Error creating game directory: {source}")]
    CreateGameDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Error copying engine files: {source}")]
    CopyEngineFiles {
        #[source]
        source: io::Error,
    },

    #[error("Failed to create {file}: {source}")]
    WriteGeneratedFile {
        file: String,
        #[source]
        source: io::Error,
    },

    #[error("Error building game: {0}")]
    Build(#[from] ToolchainError),
}

impl CompileError {
    /// Returns true if the request was rejected because another compile was running
    pub fn is_busy(&self) -> bool {
        matches!(self, CompileError::AlreadyCompiling)
    }
}
