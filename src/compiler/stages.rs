//! Built-in stages of the level compile pipeline

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use super::codegen;
use super::error::CompileError;
use super::stage::{PipelineStage, StageContext, StageOutcome};

/// Removes any previous build and creates an empty game directory
pub struct PrepareOutput;

impl PipelineStage for PrepareOutput {
    fn name(&self) -> &'static str {
        "Prepare output"
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<StageOutcome, CompileError> {
        let dir = ctx.project_dir.clone();

        // Whatever is in the way goes, including a stray file or symlink
        if let Ok(meta) = fs::symlink_metadata(&dir) {
            let removed = if meta.is_dir() {
                fs::remove_dir_all(&dir)
            } else {
                fs::remove_file(&dir)
            };
            removed.map_err(|source| CompileError::ClearPreviousBuild {
                path: dir.clone(),
                source,
            })?;
            debug!(dir = %dir.display(), "Removed previous build");
        }

        fs::create_dir_all(&dir).map_err(|source| CompileError::CreateGameDirectory {
            path: dir.clone(),
            source,
        })?;

        Ok(StageOutcome::pass(format!(
            "Game directory ready: {}",
            dir.display()
        )))
    }
}

/// Copies the engine tree, then the optional template tree, into the game directory
pub struct CopyEngineFiles;

impl PipelineStage for CopyEngineFiles {
    fn name(&self) -> &'static str {
        "Copy engine files"
    }

    fn banner(&self) -> Option<&'static str> {
        Some("Copying engine files...")
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<StageOutcome, CompileError> {
        let mut copied = copy_tree(&ctx.paths.engine_dir, &ctx.project_dir)
            .map_err(|source| CompileError::CopyEngineFiles { source })?;

        if let Some(template_dir) = &ctx.paths.template_dir {
            copied += copy_tree(template_dir, &ctx.project_dir)
                .map_err(|source| CompileError::CopyEngineFiles { source })?;
        }

        ctx.copied_files = copied;
        Ok(StageOutcome::pass("Engine files copied successfully.")
            .with_details(format!("{} files copied", copied)))
    }
}

/// Recursively copies `source` into `destination`, overwriting existing files
///
/// Returns the number of files copied.
pub fn copy_tree(source: &Path, destination: &Path) -> io::Result<usize> {
    let mut copied = 0;

    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Writes the generated level sources
pub struct GenerateGameCode;

impl PipelineStage for GenerateGameCode {
    fn name(&self) -> &'static str {
        "Generate game code"
    }

    fn banner(&self) -> Option<&'static str> {
        Some("Generating game code...")
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<StageOutcome, CompileError> {
        for file in codegen::generate(ctx.level) {
            let path = ctx.project_dir.join(file.file_name);
            fs::write(&path, file.contents).map_err(|source| CompileError::WriteGeneratedFile {
                file: file.file_name.to_string(),
                source,
            })?;
            ctx.generated_files.push(path);
        }

        let missing = codegen::missing_transform_properties(ctx.level);
        if missing.is_empty() {
            return Ok(StageOutcome::pass("Game code generated successfully."));
        }

        let details = missing
            .iter()
            .map(|(name, key)| format!("  {} has no '{}' property", name, key))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(
            StageOutcome::warn("Game code generated successfully (with empty transform fields).")
                .with_details(details),
        )
    }
}

/// Hands the generated project to the configured toolchain
pub struct BuildGame;

impl PipelineStage for BuildGame {
    fn name(&self) -> &'static str {
        "Build"
    }

    fn banner(&self) -> Option<&'static str> {
        Some("Building game...")
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<StageOutcome, CompileError> {
        let output = ctx.toolchain.build(&ctx.project_dir, ctx.log)?;

        let outcome = if output.simulated {
            StageOutcome::warn("Build completed successfully.")
                .with_details("No build command configured; the build was simulated")
        } else {
            StageOutcome::pass("Build completed successfully.")
                .with_details(format!("{} exited with {:?}", ctx.toolchain.name(), output.exit_code))
        };

        ctx.build = Some(output);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_tree_preserves_layout() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("shaders/common")).unwrap();
        fs::write(src.path().join("Engine.h"), "// engine").unwrap();
        fs::write(src.path().join("shaders/common/basic.hlsl"), "float4").unwrap();
        fs::create_dir_all(src.path().join("empty")).unwrap();

        let copied = copy_tree(src.path(), dst.path()).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(dst.path().join("Engine.h")).unwrap(), "// engine");
        assert!(dst.path().join("shaders/common/basic.hlsl").is_file());
        assert!(dst.path().join("empty").is_dir());
    }

    #[test]
    fn test_copy_tree_overwrites() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::write(src.path().join("Engine.cpp"), "new").unwrap();
        fs::write(dst.path().join("Engine.cpp"), "old").unwrap();

        copy_tree(src.path(), dst.path()).unwrap();
        assert_eq!(fs::read_to_string(dst.path().join("Engine.cpp")).unwrap(), "new");
    }

    #[test]
    fn test_copy_tree_missing_source() {
        let dst = tempfile::tempdir().unwrap();
        let missing = dst.path().join("no-such-engine");
        assert!(copy_tree(&missing, dst.path()).is_err());
    }
}
