//! Level-to-project compilation
//!
//! [`CompilerSystem::compile_level`] turns a [`LevelData`] into a standalone
//! project directory:
//!
//! 1. `output_dir/<game_name>` is removed if present and recreated
//! 2. the engine tree (and optional template tree) is copied into it
//! 3. `GameLevel.cpp`, `GameLevel.h` and `Main.cpp` are generated from the level
//! 4. the configured [`Toolchain`] builds the result
//!
//! Every step appends to a human-readable log, and the first failing step
//! aborts the rest. Nothing is rolled back on failure.
//!
//! # Example
//!
//! ```no_run
//! use level_designer::compiler::{CompilerPaths, CompilerSystem};
//! use level_designer::level::LevelData;
//!
//! let compiler = CompilerSystem::initialize(CompilerPaths::new("engine", "build")).unwrap();
//! let mut level = LevelData::new();
//! level.load_from_file("levels/intro.level").unwrap();
//!
//! match compiler.compile_level(&level, "Intro") {
//!     Ok(report) => println!("built {}", report.project_dir.display()),
//!     Err(_) => eprintln!("{}", compiler.compilation_log()),
//! }
//! ```

pub mod codegen;
mod error;
mod log;
mod pipeline;
pub mod report;
mod stage;
pub mod stages;
mod toolchain;

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

pub use error::CompileError;
pub use log::CompilationLog;
pub use pipeline::Pipeline;
pub use report::{format_report, print_report};
pub use stage::{PipelineStage, StageContext, StageOutcome, StageRecord, StageStatus};
pub use toolchain::{BuildOutput, CommandToolchain, SimulatedToolchain, Toolchain, ToolchainError};

use crate::level::LevelData;

/// Directories the compiler reads from and writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerPaths {
    /// Engine source tree copied into every project
    pub engine_dir: PathBuf,
    /// Optional tree copied over the engine files
    pub template_dir: Option<PathBuf>,
    /// Root under which each game gets its own directory
    pub output_dir: PathBuf,
}

impl CompilerPaths {
    pub fn new(engine_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine_dir: engine_dir.into(),
            template_dir: None,
            output_dir: output_dir.into(),
        }
    }

    /// Builder method to set the template tree
    pub fn with_template_dir(mut self, template_dir: impl Into<PathBuf>) -> Self {
        self.template_dir = Some(template_dir.into());
        self
    }
}

/// Whether a compilation is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileState {
    Idle,
    Compiling,
}

/// Summary of a successful compilation
#[derive(Debug, Clone)]
pub struct CompileReport {
    /// Directory the project was written to
    pub project_dir: PathBuf,
    /// Completed stages in order
    pub stages: Vec<StageRecord>,
    /// Files copied from the engine and template trees
    pub copied_files: usize,
    /// Files written by code generation
    pub generated_files: Vec<PathBuf>,
    /// Output of the build step
    pub build: BuildOutput,
}

impl CompileReport {
    /// Returns true if any stage finished with a warning
    pub fn has_warnings(&self) -> bool {
        self.stages
            .iter()
            .any(|record| record.outcome.status == StageStatus::Warn)
    }
}

/// Compiles levels into project directories, one at a time
///
/// The system can be shared between threads by reference. Only one
/// compilation runs at once; a request made while another is in progress
/// fails immediately with [`CompileError::AlreadyCompiling`], without writing
/// to the log or the filesystem.
pub struct CompilerSystem {
    paths: CompilerPaths,
    toolchain: Box<dyn Toolchain>,
    compiling: AtomicBool,
    log: CompilationLog,
}

impl CompilerSystem {
    /// Creates a compiler using a simulated build step
    ///
    /// The output root is created if it does not exist yet.
    pub fn initialize(paths: CompilerPaths) -> Result<Self, CompileError> {
        if !paths.output_dir.exists() {
            fs::create_dir_all(&paths.output_dir).map_err(|source| {
                CompileError::CreateOutputRoot {
                    path: paths.output_dir.clone(),
                    source,
                }
            })?;
        }

        info!(
            engine = %paths.engine_dir.display(),
            output = %paths.output_dir.display(),
            "Compiler initialized"
        );

        Ok(Self {
            paths,
            toolchain: Box::new(SimulatedToolchain),
            compiling: AtomicBool::new(false),
            log: CompilationLog::new(),
        })
    }

    /// Builder method to replace the build step
    pub fn with_toolchain(mut self, toolchain: Box<dyn Toolchain>) -> Self {
        self.toolchain = toolchain;
        self
    }

    pub fn paths(&self) -> &CompilerPaths {
        &self.paths
    }

    pub fn toolchain(&self) -> &dyn Toolchain {
        self.toolchain.as_ref()
    }

    /// Returns true while a compilation is running
    pub fn is_compiling(&self) -> bool {
        self.compiling.load(Ordering::Acquire)
    }

    pub fn state(&self) -> CompileState {
        if self.is_compiling() {
            CompileState::Compiling
        } else {
            CompileState::Idle
        }
    }

    /// Text log of the most recent accepted compilation
    pub fn compilation_log(&self) -> String {
        self.log.contents()
    }

    /// Compiles `level` into `output_dir/<game_name>`
    ///
    /// Any failure is appended to the log and returned; the system is idle
    /// again when this returns.
    pub fn compile_level(
        &self,
        level: &LevelData,
        game_name: &str,
    ) -> Result<CompileReport, CompileError> {
        let Some(_guard) = CompileGuard::acquire(&self.compiling) else {
            return Err(CompileError::AlreadyCompiling);
        };

        self.log.clear();
        self.log
            .line(format!("Starting compilation for: {}", game_name));

        if !is_plain_dir_name(game_name) {
            let err = CompileError::InvalidGameName(game_name.to_string());
            self.log.error(err.to_string());
            return Err(err);
        }

        let project_dir = self.paths.output_dir.join(game_name);
        if let Some(tree) = self.overlapping_tree(game_name) {
            let err = CompileError::OverlappingTree {
                project: project_dir,
                tree: tree.to_path_buf(),
            };
            self.log.error(err.to_string());
            return Err(err);
        }

        let mut ctx = StageContext {
            level,
            paths: &self.paths,
            project_dir,
            toolchain: self.toolchain.as_ref(),
            log: &self.log,
            copied_files: 0,
            generated_files: Vec::new(),
            build: None,
        };

        let stages = default_pipeline().run(&mut ctx)?;

        self.log.line("Compilation completed successfully!");

        Ok(CompileReport {
            project_dir: ctx.project_dir,
            stages,
            copied_files: ctx.copied_files,
            generated_files: ctx.generated_files,
            build: ctx.build.unwrap_or_default(),
        })
    }

    /// Returns the engine or template tree that contains, or lies inside,
    /// the project directory for `game_name`
    ///
    /// Compiling into such a tree would copy it into itself or delete it.
    fn overlapping_tree(&self, game_name: &str) -> Option<&Path> {
        let project = resolve(&self.paths.output_dir).join(game_name);
        std::iter::once(&self.paths.engine_dir)
            .chain(self.paths.template_dir.as_ref())
            .find(|tree| {
                let tree = resolve(tree);
                project.starts_with(&tree) || tree.starts_with(&project)
            })
            .map(PathBuf::as_path)
    }
}

/// Absolute form of `path`, with symlinks resolved when it exists
fn resolve(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// The standard stage sequence
pub fn default_pipeline() -> Pipeline {
    Pipeline::new()
        .add_stage(stages::PrepareOutput)
        .add_stage(stages::CopyEngineFiles)
        .add_stage(stages::GenerateGameCode)
        .add_stage(stages::BuildGame)
}

/// Rejects names that would escape or replace the output root
fn is_plain_dir_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Holds the compiling flag; clears it when dropped
struct CompileGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> CompileGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for CompileGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_dir_names() {
        assert!(is_plain_dir_name("MyGame"));
        assert!(is_plain_dir_name("my game 2"));
        assert!(!is_plain_dir_name(""));
        assert!(!is_plain_dir_name("."));
        assert!(!is_plain_dir_name(".."));
        assert!(!is_plain_dir_name("a/b"));
        assert!(!is_plain_dir_name("/abs"));
    }

    #[test]
    fn test_guard_is_exclusive() {
        let flag = AtomicBool::new(false);
        let first = CompileGuard::acquire(&flag);
        assert!(first.is_some());
        assert!(CompileGuard::acquire(&flag).is_none());
        drop(first);
        assert!(CompileGuard::acquire(&flag).is_some());
    }

    #[test]
    fn test_initialize_creates_output_root() {
        let root = tempfile::tempdir().unwrap();
        let output = root.path().join("builds/nested");
        let compiler = CompilerSystem::initialize(CompilerPaths::new(root.path(), &output)).unwrap();
        assert!(output.is_dir());
        assert_eq!(compiler.state(), CompileState::Idle);
        assert_eq!(compiler.toolchain().name(), "simulated");
    }

    #[test]
    fn test_output_inside_engine_tree_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let paths = CompilerPaths::new(root.path(), root.path().join("build"));
        let compiler = CompilerSystem::initialize(paths).unwrap();

        let err = compiler.compile_level(&LevelData::new(), "Game").unwrap_err();
        assert!(matches!(err, CompileError::OverlappingTree { .. }));
        assert!(compiler.compilation_log().contains("overlaps source tree"));
        assert!(!root.path().join("build/Game").exists());
    }

    #[test]
    fn test_invalid_game_name_is_logged() {
        let root = tempfile::tempdir().unwrap();
        let compiler =
            CompilerSystem::initialize(CompilerPaths::new(root.path(), root.path().join("out"))).unwrap();

        let err = compiler.compile_level(&LevelData::new(), "..").unwrap_err();
        assert!(matches!(err, CompileError::InvalidGameName(_)));
        assert!(compiler.compilation_log().contains("Invalid game name"));
        assert!(!compiler.is_compiling());
        // The output root itself is untouched
        assert!(root.path().join("out").is_dir());
    }
}
