//! Application configuration
//!
//! Supports multiple profiles (debug, release) with different settings.

use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::compiler::{CommandToolchain, CompilerPaths, SimulatedToolchain, Toolchain};

/// Compiler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Engine source tree copied into every generated project
    pub engine_dir: PathBuf,
    /// Optional template tree copied over the engine files
    #[serde(default)]
    pub template_dir: Option<PathBuf>,
    /// Root directory for generated projects
    pub output_dir: PathBuf,
    /// Build command (program followed by arguments), run inside the project
    /// directory. When absent the build step is simulated.
    #[serde(default)]
    pub build_command: Option<Vec<String>>,
}

impl CompilerConfig {
    /// Paths handed to the compiler
    pub fn paths(&self) -> CompilerPaths {
        CompilerPaths {
            engine_dir: self.engine_dir.clone(),
            template_dir: self.template_dir.clone(),
            output_dir: self.output_dir.clone(),
        }
    }

    /// Build step selected by `build_command`
    pub fn toolchain(&self) -> Box<dyn Toolchain> {
        match self
            .build_command
            .as_deref()
            .and_then(CommandToolchain::from_command_line)
        {
            Some(command) => Box::new(command),
            None => Box::new(SimulatedToolchain),
        }
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            engine_dir: PathBuf::from("engine"),
            template_dir: None,
            output_dir: PathBuf::from("build"),
            build_command: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is not set
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// The active profile (debug, release, etc.)
    pub profile: String,
    /// Compiler configuration
    #[serde(default)]
    pub compiler: CompilerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration based on the specified profile
    ///
    /// Profiles are loaded from config files in the following order:
    /// 1. config/{profile}.toml (profile-specific configuration)
    /// 2. Environment variables with prefix APP_ (e.g., APP_COMPILER__OUTPUT_DIR=out)
    ///
    /// Config files are searched for in:
    /// 1. Next to the executable (target/debug/config or target/release/config)
    /// 2. In the current directory (./config)
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        let config_dir = Self::find_config_dir();

        let mut builder = Config::builder();

        if let Some(ref dir) = config_dir {
            let profile_path = dir.join(profile);
            builder = builder.add_source(File::from(profile_path.as_path()).required(false));
        } else {
            builder =
                builder.add_source(File::with_name(&format!("config/{}", profile)).required(false));
        }

        // Use __ as separator for nested fields (e.g., APP_COMPILER__ENGINE_DIR).
        // APP_COMPILER__BUILD_COMMAND is split on spaces.
        builder = builder.add_source(
            Environment::with_prefix("APP")
                .separator("__")
                .list_separator(" ")
                .with_list_parse_key("compiler.build_command")
                .try_parsing(true),
        );

        let config = builder.set_override("profile", profile)?.build()?;

        config.try_deserialize()
    }

    /// Finds the config directory by searching in multiple locations
    fn find_config_dir() -> Option<PathBuf> {
        if let Ok(exe_path) = std::env::current_exe()
            && let Some(exe_dir) = exe_path.parent()
        {
            let config_dir = exe_dir.join("config");
            if config_dir.exists() {
                return Some(config_dir);
            }
        }

        let cwd_config = PathBuf::from("config");
        if cwd_config.exists() {
            return Some(cwd_config);
        }

        None
    }

    /// Loads configuration using the APP_PROFILE environment variable,
    /// defaulting to "release"
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let profile = std::env::var("APP_PROFILE").unwrap_or_else(|_| "release".to_string());
        Self::load(&profile)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::load("release").unwrap_or_else(|_| Self {
            profile: "release".to_string(),
            compiler: CompilerConfig::default(),
            logging: LoggingConfig::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_profile_falls_back_to_defaults() {
        let config = AppConfig::load("no-such-profile").unwrap();
        assert_eq!(config.profile, "no-such-profile");
        assert!(config.compiler.template_dir.is_none());
    }

    #[test]
    fn test_toolchain_selection() {
        let mut compiler = CompilerConfig::default();
        assert_eq!(compiler.toolchain().name(), "simulated");

        compiler.build_command = Some(Vec::new());
        assert_eq!(compiler.toolchain().name(), "simulated");

        compiler.build_command = Some(vec!["cmake".to_string(), "--build".to_string(), ".".to_string()]);
        assert_eq!(compiler.toolchain().name(), "cmake");
    }

    #[test]
    fn test_paths_from_config() {
        let compiler = CompilerConfig {
            template_dir: Some(PathBuf::from("templates/win32")),
            ..CompilerConfig::default()
        };
        let paths = compiler.paths();
        assert_eq!(paths.engine_dir, PathBuf::from("engine"));
        assert_eq!(paths.template_dir, Some(PathBuf::from("templates/win32")));
        assert_eq!(paths.output_dir, PathBuf::from("build"));
    }
}
