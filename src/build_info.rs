//! Build-time information
//!
//! Build metadata captured at compile time: timestamp, cargo configuration,
//! and compiler version.

/// Crate version from Cargo.toml
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build timestamp (when the binary was compiled)
pub const BUILD_TIMESTAMP: &str = env!("VERGEN_BUILD_TIMESTAMP");

/// Cargo optimization level (0, 1, 2, 3, s, z)
pub const CARGO_OPT_LEVEL: &str = env!("VERGEN_CARGO_OPT_LEVEL");

/// Target triple (e.g., x86_64-unknown-linux-gnu, x86_64-apple-darwin)
pub const CARGO_TARGET_TRIPLE: &str = env!("VERGEN_CARGO_TARGET_TRIPLE");

/// Rust compiler version (e.g., 1.75.0)
pub const RUSTC_SEMVER: &str = env!("VERGEN_RUSTC_SEMVER");

/// Rust channel (stable, beta, or nightly)
pub const RUSTC_CHANNEL: &str = env!("VERGEN_RUSTC_CHANNEL");

/// Returns a formatted build version string
///
/// Format: `{version} ({target_triple}-opt{opt_level})`
/// Example: `0.1.0 (x86_64-unknown-linux-gnu-opt0)`
pub fn version_string() -> String {
    format!("{} ({}-opt{})", PKG_VERSION, CARGO_TARGET_TRIPLE, CARGO_OPT_LEVEL)
}

/// Returns a detailed build info string
///
/// Includes build timestamp, target, optimization level, and compiler version
pub fn detailed_info() -> String {
    format!(
        "Version: {}\nBuilt: {}\nTarget: {}\nOptimization: {}\nRustc: {} ({})",
        PKG_VERSION,
        BUILD_TIMESTAMP,
        CARGO_TARGET_TRIPLE,
        CARGO_OPT_LEVEL,
        RUSTC_SEMVER,
        RUSTC_CHANNEL
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string_mentions_target() {
        let version = version_string();
        assert!(version.starts_with(PKG_VERSION));
        assert!(version.contains(CARGO_TARGET_TRIPLE));
    }

    #[test]
    fn test_detailed_info_lines() {
        assert_eq!(detailed_info().lines().count(), 5);
    }
}
