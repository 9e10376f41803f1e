//! Integration tests for compiling levels into game projects

use std::fs;
use std::path::Path;
use std::sync::Barrier;

use level_designer::compiler::{
    BuildOutput, CompilationLog, CompileError, CompileState, CompilerPaths, CompilerSystem,
    StageStatus, Toolchain, ToolchainError, format_report,
};
use level_designer::level::{LevelData, LevelObject, ObjectType};
use tempfile::TempDir;

/// Scratch workspace with a small engine tree and an empty output root
struct Workspace {
    root: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let engine = root.path().join("engine");
        fs::create_dir_all(engine.join("shaders")).unwrap();
        fs::write(engine.join("Engine.h"), "class Engine {};\n").unwrap();
        fs::write(engine.join("Engine.cpp"), "#include \"Engine.h\"\n").unwrap();
        fs::write(engine.join("shaders/triangle.hlsl"), "float4 main() {}\n").unwrap();
        Self { root }
    }

    fn engine_dir(&self) -> std::path::PathBuf {
        self.root.path().join("engine")
    }

    fn output_dir(&self) -> std::path::PathBuf {
        self.root.path().join("output")
    }

    fn paths(&self) -> CompilerPaths {
        CompilerPaths::new(self.engine_dir(), self.output_dir())
    }

    fn compiler(&self) -> CompilerSystem {
        CompilerSystem::initialize(self.paths()).unwrap()
    }
}

fn rock_level() -> LevelData {
    let mut level = LevelData::new();
    level.add_object(
        LevelObject::new("Rock", ObjectType::Mesh)
            .with_property("posX", "1.0")
            .with_property("posY", "2.0")
            .with_property("posZ", "3.0"),
    );
    level.set_setting("GameTitle", "MyGame");
    level
}

#[test]
fn test_end_to_end_compile() {
    let ws = Workspace::new();
    let compiler = ws.compiler();

    let report = compiler.compile_level(&rock_level(), "RockGame").unwrap();
    let game = ws.output_dir().join("RockGame");
    assert_eq!(report.project_dir, game);

    // Full template tree
    assert!(game.join("Engine.h").is_file());
    assert!(game.join("Engine.cpp").is_file());
    assert!(game.join("shaders/triangle.hlsl").is_file());
    assert_eq!(report.copied_files, 3);

    // Generated sources
    let level_cpp = fs::read_to_string(game.join("GameLevel.cpp")).unwrap();
    assert!(level_cpp.contains("CreateObject(\"Rock\", XMFLOAT3(1.0, 2.0, 3.0)"));
    assert!(game.join("GameLevel.h").is_file());
    let main_cpp = fs::read_to_string(game.join("Main.cpp")).unwrap();
    assert!(main_cpp.contains("L\"MyGame\""));
    assert_eq!(report.generated_files.len(), 3);

    assert!(report.build.simulated);
    assert!(!compiler.is_compiling());

    let log = compiler.compilation_log();
    assert!(log.starts_with("Starting compilation for: RockGame\n"));
    assert!(log.contains("Copying engine files..."));
    assert!(log.contains("Generating game code..."));
    assert!(log.contains("Simulating build process..."));
    assert!(log.ends_with("Compilation completed successfully!\n"));

    let table = format_report(&report);
    assert!(table.contains("Copy engine files"));
}

#[test]
fn test_stage_warnings() {
    let ws = Workspace::new();
    let report = ws.compiler().compile_level(&rock_level(), "Warned").unwrap();

    let statuses: Vec<(&str, StageStatus)> = report
        .stages
        .iter()
        .map(|r| (r.name, r.outcome.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("Prepare output", StageStatus::Pass),
            ("Copy engine files", StageStatus::Pass),
            // Rock has no rotation properties
            ("Generate game code", StageStatus::Warn),
            // No build command configured
            ("Build", StageStatus::Warn),
        ]
    );
    assert!(report.has_warnings());
}

#[test]
fn test_only_meshes_are_generated() {
    let ws = Workspace::new();
    let mut level = rock_level();
    level.add_object(LevelObject::new("Sun", ObjectType::Light).with_property("posX", "5"));
    level.add_object(LevelObject::new("Start", ObjectType::Spawn));

    ws.compiler().compile_level(&level, "Meshes").unwrap();

    let level_cpp = fs::read_to_string(ws.output_dir().join("Meshes/GameLevel.cpp")).unwrap();
    assert_eq!(level_cpp.matches("CreateObject(").count(), 1);
    assert!(!level_cpp.contains("Sun"));
    assert!(!level_cpp.contains("Start"));
}

#[test]
fn test_recompile_replaces_previous_build() {
    let ws = Workspace::new();
    let game = ws.output_dir().join("Game");
    fs::create_dir_all(&game).unwrap();
    fs::write(game.join("stale.obj"), "old build").unwrap();

    ws.compiler().compile_level(&rock_level(), "Game").unwrap();

    assert!(!game.join("stale.obj").exists());
    assert!(game.join("Main.cpp").is_file());
}

#[test]
fn test_recompile_replaces_stale_file() {
    let ws = Workspace::new();
    let game = ws.output_dir().join("Game");
    fs::create_dir_all(ws.output_dir()).unwrap();
    fs::write(&game, "not a directory").unwrap();

    ws.compiler().compile_level(&rock_level(), "Game").unwrap();

    assert!(game.is_dir());
    assert!(game.join("GameLevel.cpp").is_file());
}

#[cfg(unix)]
#[test]
fn test_recompile_replaces_symlink_without_following_it() {
    let ws = Workspace::new();
    let elsewhere = ws.root.path().join("elsewhere");
    fs::create_dir_all(&elsewhere).unwrap();
    fs::write(elsewhere.join("keep.txt"), "keep").unwrap();
    fs::create_dir_all(ws.output_dir()).unwrap();
    std::os::unix::fs::symlink(&elsewhere, ws.output_dir().join("Linked")).unwrap();

    ws.compiler().compile_level(&rock_level(), "Linked").unwrap();

    assert!(elsewhere.join("keep.txt").is_file());
    assert!(!elsewhere.join("Main.cpp").exists());
    assert!(ws.output_dir().join("Linked/Main.cpp").is_file());
}

#[test]
fn test_engine_tree_inside_project_is_rejected() {
    let ws = Workspace::new();
    let engine = ws.output_dir().join("Game/engine");
    fs::create_dir_all(&engine).unwrap();
    fs::write(engine.join("Engine.h"), "class Engine {};\n").unwrap();

    let compiler = CompilerSystem::initialize(CompilerPaths::new(&engine, ws.output_dir())).unwrap();
    let err = compiler.compile_level(&rock_level(), "Game").unwrap_err();

    assert!(matches!(err, CompileError::OverlappingTree { .. }));
    assert!(!compiler.is_compiling());
    // Nothing was deleted
    assert!(engine.join("Engine.h").is_file());
    assert!(!compiler.compilation_log().contains("Copying engine files..."));
}

#[test]
fn test_template_tree_overlap_is_rejected() {
    let ws = Workspace::new();
    let paths = ws.paths().with_template_dir(ws.output_dir());
    let compiler = CompilerSystem::initialize(paths).unwrap();

    let err = compiler.compile_level(&rock_level(), "Game").unwrap_err();
    assert!(matches!(err, CompileError::OverlappingTree { .. }));
    assert!(!ws.output_dir().join("Game").exists());
}

#[test]
fn test_template_overrides_engine_files() {
    let ws = Workspace::new();
    let template = ws.root.path().join("template");
    fs::create_dir_all(&template).unwrap();
    fs::write(template.join("Engine.cpp"), "// patched\n").unwrap();
    fs::write(template.join("resource.rc"), "// icon\n").unwrap();

    let compiler =
        CompilerSystem::initialize(ws.paths().with_template_dir(&template)).unwrap();
    let report = compiler.compile_level(&rock_level(), "Templated").unwrap();

    let game = ws.output_dir().join("Templated");
    assert_eq!(fs::read_to_string(game.join("Engine.cpp")).unwrap(), "// patched\n");
    assert!(game.join("resource.rc").is_file());
    assert_eq!(report.copied_files, 5);
}

#[test]
fn test_missing_engine_tree_fails_and_recovers() {
    let ws = Workspace::new();
    fs::remove_dir_all(ws.engine_dir()).unwrap();
    let compiler = ws.compiler();

    let err = compiler.compile_level(&rock_level(), "Broken").unwrap_err();
    assert!(matches!(err, CompileError::CopyEngineFiles { .. }));
    assert_eq!(compiler.state(), CompileState::Idle);

    let log = compiler.compilation_log();
    assert!(log.contains("Error copying engine files:"));
    assert!(!log.contains("Generating game code..."));
    // Partial output is left behind
    assert!(ws.output_dir().join("Broken").is_dir());

    // A later attempt can run once the engine tree exists
    fs::create_dir_all(ws.engine_dir()).unwrap();
    fs::write(ws.engine_dir().join("Engine.h"), "").unwrap();
    compiler.compile_level(&rock_level(), "Broken").unwrap();
    assert!(!compiler.compilation_log().contains("Error copying engine files:"));
}

/// Build step that parks inside `build` until the test releases it
struct ParkedToolchain {
    entered: Barrier,
    release: Barrier,
}

impl Toolchain for ParkedToolchain {
    fn name(&self) -> &str {
        "parked"
    }

    fn build(&self, _project_dir: &Path, log: &CompilationLog) -> Result<BuildOutput, ToolchainError> {
        self.entered.wait();
        self.release.wait();
        log.line("Parked build finished");
        Ok(BuildOutput::default())
    }
}

/// Shares one parked toolchain between the compiler and the test
struct SharedToolchain(std::sync::Arc<ParkedToolchain>);

impl Toolchain for SharedToolchain {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn build(&self, project_dir: &Path, log: &CompilationLog) -> Result<BuildOutput, ToolchainError> {
        self.0.build(project_dir, log)
    }
}

#[test]
fn test_second_compile_is_rejected_while_busy() {
    let ws = Workspace::new();
    let parked = std::sync::Arc::new(ParkedToolchain {
        entered: Barrier::new(2),
        release: Barrier::new(2),
    });
    let compiler = ws
        .compiler()
        .with_toolchain(Box::new(SharedToolchain(parked.clone())));
    let level = rock_level();

    std::thread::scope(|scope| {
        let first = scope.spawn(|| compiler.compile_level(&level, "First"));

        // The first compile is now inside its build step
        parked.entered.wait();
        assert!(compiler.is_compiling());

        let err = compiler.compile_level(&level, "Second").unwrap_err();
        assert!(err.is_busy());
        assert!(!ws.output_dir().join("Second").exists());
        assert!(!compiler.compilation_log().contains("Second"));

        parked.release.wait();
        let report = first.join().unwrap().unwrap();
        assert_eq!(report.project_dir, ws.output_dir().join("First"));
    });

    assert!(!compiler.is_compiling());
    assert!(compiler.compilation_log().contains("Parked build finished"));
}

#[cfg(unix)]
#[test]
fn test_failing_build_command_is_reported() {
    use level_designer::compiler::CommandToolchain;

    let ws = Workspace::new();
    let compiler = ws.compiler().with_toolchain(Box::new(CommandToolchain::new(
        "sh",
        vec![
            "-c".to_string(),
            "test -f GameLevel.cpp && echo 'unresolved symbol CreateObject' >&2 && exit 2".to_string(),
        ],
    )));

    let err = compiler.compile_level(&rock_level(), "Linked").unwrap_err();
    match &err {
        CompileError::Build(ToolchainError::Failed { status, stderr, .. }) => {
            assert_eq!(status.code(), Some(2));
            assert!(stderr.contains("unresolved symbol"));
        }
        other => panic!("expected build failure, got {:?}", other),
    }

    let log = compiler.compilation_log();
    assert!(log.contains("unresolved symbol CreateObject"));
    assert!(log.contains("Error building game:"));
    assert!(!log.contains("Compilation completed successfully!"));
    assert!(!compiler.is_compiling());
}

#[cfg(unix)]
#[test]
fn test_successful_build_command() {
    use level_designer::compiler::CommandToolchain;

    let ws = Workspace::new();
    let compiler = ws.compiler().with_toolchain(Box::new(CommandToolchain::new(
        "sh",
        vec!["-c".to_string(), "ls Main.cpp GameLevel.h".to_string()],
    )));

    let report = compiler.compile_level(&rock_level(), "Built").unwrap();
    assert!(!report.build.simulated);
    assert_eq!(report.build.exit_code, Some(0));
    assert!(report.build.stdout.contains("Main.cpp"));
}
