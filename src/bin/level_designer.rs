//! Command-line front end for editing level files and compiling them
//!
//! Usage:
//!   level-designer new intro.level --title "My Game"
//!   level-designer add intro.level Rock --type mesh --prop posX=1.0
//!   level-designer list intro.level
//!   level-designer compile intro.level MyGame

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use glam::Vec3;
use tabled::{builder::Builder, settings::Style};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use level_designer::build_info;
use level_designer::compiler::{self, CompilerSystem};
use level_designer::config::AppConfig;
use level_designer::level::{LevelData, LevelObject, ObjectType};

#[derive(Parser)]
#[command(name = "level-designer")]
#[command(about = "Edit level files and compile them into game projects")]
#[command(version = build_info::PKG_VERSION)]
struct Cli {
    /// Configuration profile (defaults to APP_PROFILE, then "release")
    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty level file
    New {
        level: PathBuf,
        /// Window title of the compiled game
        #[arg(long)]
        title: Option<String>,
    },
    /// Add an object to a level
    Add {
        level: PathBuf,
        name: String,
        /// Object type: mesh, light, camera, trigger, spawn
        #[arg(long = "type", default_value = "mesh")]
        object_type: ObjectType,
        /// Position as x,y,z
        #[arg(long, value_parser = parse_vec3)]
        position: Option<Vec3>,
        /// Rotation as x,y,z
        #[arg(long, value_parser = parse_vec3)]
        rotation: Option<Vec3>,
        /// Scale as x,y,z
        #[arg(long, value_parser = parse_vec3)]
        scale: Option<Vec3>,
        /// Property as key=value (repeatable)
        #[arg(long = "prop", value_parser = parse_property)]
        properties: Vec<(String, String)>,
    },
    /// Remove every object with the given name
    Remove { level: PathBuf, name: String },
    /// Set a document setting
    Set {
        level: PathBuf,
        key: String,
        value: String,
    },
    /// List the objects in a level
    List {
        level: PathBuf,
        /// Only show objects of this type
        #[arg(long = "type")]
        object_type: Option<ObjectType>,
    },
    /// Compile a level into a game project
    Compile { level: PathBuf, game_name: String },
    /// Show build information
    Info,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.profile {
        Some(profile) => AppConfig::load(profile),
        None => AppConfig::load_from_env(),
    };
    let config = config.unwrap_or_else(|e| {
        eprintln!("Failed to load config ({}), using defaults", e);
        AppConfig::default()
    });

    init_tracing(&config);
    info!(profile = %config.profile, version = %build_info::version_string(), "Starting level designer");

    match run(cli.command, &config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(command: Commands, config: &AppConfig) -> Result<ExitCode> {
    match command {
        Commands::New { level, title } => {
            let mut doc = LevelData::new();
            if let Some(title) = title {
                doc.set_setting(compiler::codegen::GAME_TITLE_SETTING, title);
            }
            doc.save_to_file(&level)?;
            println!("Created {}", level.display());
        }
        Commands::Add {
            level,
            name,
            object_type,
            position,
            rotation,
            scale,
            properties,
        } => {
            let mut doc = load_level(&level)?;
            if doc.object(&name).is_some() {
                warn!(name = %name, "An object with this name already exists; lookups return the first");
            }

            let mut object = LevelObject::new(name.clone(), object_type);
            if let Some(position) = position {
                object.set_position(position);
            }
            if let Some(rotation) = rotation {
                object.set_rotation(rotation);
            }
            if let Some(scale) = scale {
                object.set_scale(scale);
            }
            for (key, value) in properties {
                object.set_property(key, value);
            }

            doc.add_object(object);
            doc.save_to_file(&level)?;
            println!("Added {} '{}'", object_type, name);
        }
        Commands::Remove { level, name } => {
            let mut doc = load_level(&level)?;
            let removed = doc.remove_object(&name);
            if removed == 0 {
                bail!("no object named '{}' in {}", name, level.display());
            }
            doc.save_to_file(&level)?;
            println!("Removed {} object(s) named '{}'", removed, name);
        }
        Commands::Set { level, key, value } => {
            check_entry("setting", &key, &value).map_err(anyhow::Error::msg)?;
            let mut doc = load_level(&level)?;
            doc.set_setting(key.clone(), value);
            doc.save_to_file(&level)?;
            println!("Set '{}'", key);
        }
        Commands::List { level, object_type } => {
            let doc = load_level(&level)?;
            print_objects(&doc, object_type);
        }
        Commands::Info => {
            println!("{}", build_info::detailed_info());
            println!("Profile: {}", config.profile);
            println!("Engine tree: {}", config.compiler.engine_dir.display());
            println!("Output root: {}", config.compiler.output_dir.display());
            println!("Toolchain: {}", config.compiler.toolchain().name());
        }
        Commands::Compile { level, game_name } => {
            let doc = load_level(&level)?;
            let system = CompilerSystem::initialize(config.compiler.paths())
                .context("Failed to initialize compiler")?
                .with_toolchain(config.compiler.toolchain());

            return Ok(match system.compile_level(&doc, &game_name) {
                Ok(report) => {
                    compiler::print_report(&report);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("{}", system.compilation_log());
                    eprintln!("{} {}", "Compilation failed:".red().bold(), e);
                    ExitCode::FAILURE
                }
            });
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Loads a level, printing a warning for every defaulted field
fn load_level(path: &Path) -> Result<LevelData> {
    let mut doc = LevelData::new();
    let report = doc
        .load_from_file(path)
        .with_context(|| format!("Failed to load level {}", path.display()))?;

    for fallback in &report.fallbacks {
        eprintln!("{} {}", "warning:".yellow().bold(), fallback);
    }
    if report.lossy_lines > 0 {
        eprintln!(
            "{} {} line(s) were not valid UTF-8; invalid bytes were replaced",
            "warning:".yellow().bold(),
            report.lossy_lines
        );
    }
    Ok(doc)
}

fn print_objects(doc: &LevelData, filter: Option<ObjectType>) {
    let mut builder = Builder::default();
    builder.push_record(["Name", "Type", "Position", "Rotation", "Scale", "Properties"]);

    let objects: Vec<&LevelObject> = match filter {
        Some(object_type) => doc.objects_by_type(object_type),
        None => doc.objects().iter().collect(),
    };

    for obj in &objects {
        let properties = obj
            .properties()
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join(" ");
        builder.push_record([
            obj.name().to_string(),
            obj.object_type().to_string(),
            format_vec3(obj.position()),
            format_vec3(obj.rotation()),
            format_vec3(obj.scale()),
            properties,
        ]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    println!("{}", table);

    for (key, value) in doc.settings() {
        println!("  {} = {}", key.bold(), value);
    }
}

fn format_vec3(v: Vec3) -> String {
    format!("{}, {}, {}", v.x, v.y, v.z)
}

fn parse_vec3(raw: &str) -> Result<Vec3, String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("expected x,y,z but got '{}'", raw));
    };
    let parse = |s: &str| {
        s.parse::<f32>()
            .map_err(|e| format!("invalid component '{}': {}", s, e))
    };
    Ok(Vec3::new(parse(*x)?, parse(*y)?, parse(*z)?))
}

fn parse_property(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value but got '{}'", raw))?;
    check_entry("property", key, value)?;
    Ok((key.to_string(), value.to_string()))
}

/// Rejects keys and values the level file cannot read back
///
/// Keys are split from values on the first comma, and every entry is one line.
fn check_entry(kind: &str, key: &str, value: &str) -> Result<(), String> {
    if key.is_empty() || key.contains([',', '\n', '\r']) {
        return Err(format!("invalid {} key '{}'", kind, key.escape_debug()));
    }
    if value.contains(['\n', '\r']) {
        return Err(format!("{} values cannot contain newlines", kind));
    }
    Ok(())
}
