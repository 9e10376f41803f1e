//! Level Designer
//!
//! Level documents, their text file format, and a pipeline that compiles a
//! level into a standalone game project.

/// Build-time information (timestamp, target, rustc version)
pub mod build_info;

/// Level-to-project compilation pipeline
pub mod compiler;

/// Application configuration profiles
pub mod config;

/// Level data model and persistence
pub mod level;
