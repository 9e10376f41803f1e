//! Level data model and its text file format

mod data;
pub mod format;
mod object;
mod property;

pub use data::{LEVEL_FILE_VERSION, LevelData, LevelError, LoadReport, ObjectHandle};
pub use format::{DeserializedObject, FallbackReason, FieldFallback, ObjectField};
pub use object::{LevelObject, ObjectType};
pub use property::PropertyValue;
