//! Level documents: objects plus settings, saved as a single text file

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::format::{self, FieldFallback, OBJECT_BEGIN};
use super::object::{LevelObject, ObjectType};

/// Version written at the top of every level file. It is not checked on load.
pub const LEVEL_FILE_VERSION: &str = "1.0";

const SETTING_PREFIX: &str = "SETTING=";

/// Errors from saving or loading a level file
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("cannot open level file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed reading level file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed writing level file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Non-owning reference to an object inside a [`LevelData`]
///
/// A handle stops resolving after any removal, clear, or load on the
/// document that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectHandle {
    index: usize,
    generation: u64,
}

/// Summary of a completed load
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Number of objects read
    pub objects: usize,
    /// Number of settings read
    pub settings: usize,
    /// Fields that fell back to defaults
    pub fallbacks: Vec<FieldFallback>,
    /// Lines that were not valid UTF-8 and were read with replacement characters
    pub lossy_lines: usize,
}

impl LoadReport {
    /// Returns true if no field needed a default and every line was valid UTF-8
    pub fn is_clean(&self) -> bool {
        self.fallbacks.is_empty() && self.lossy_lines == 0
    }
}

/// A level document
///
/// Object names are expected to be unique but this is not enforced. When
/// names repeat, name lookups return the first match in document order and
/// [`LevelData::remove_object`] removes every match.
#[derive(Debug, Clone, Default)]
pub struct LevelData {
    objects: Vec<LevelObject>,
    settings: BTreeMap<String, String>,
    generation: u64,
}

impl LevelData {
    /// Creates an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an object and returns a handle to it
    pub fn add_object(&mut self, object: LevelObject) -> ObjectHandle {
        self.objects.push(object);
        ObjectHandle {
            index: self.objects.len() - 1,
            generation: self.generation,
        }
    }

    /// Removes every object with exactly this name, returning how many were removed
    pub fn remove_object(&mut self, name: &str) -> usize {
        let before = self.objects.len();
        self.objects.retain(|obj| obj.name() != name);
        let removed = before - self.objects.len();
        if removed > 0 {
            self.generation += 1;
        }
        removed
    }

    /// Returns the first object with this name
    pub fn object(&self, name: &str) -> Option<&LevelObject> {
        self.objects.iter().find(|obj| obj.name() == name)
    }

    /// Mutable version of [`LevelData::object`]
    pub fn object_mut(&mut self, name: &str) -> Option<&mut LevelObject> {
        self.objects.iter_mut().find(|obj| obj.name() == name)
    }

    /// Returns a handle to the first object with this name
    pub fn handle(&self, name: &str) -> Option<ObjectHandle> {
        self.objects
            .iter()
            .position(|obj| obj.name() == name)
            .map(|index| ObjectHandle {
                index,
                generation: self.generation,
            })
    }

    /// Resolves a handle, or `None` if it has been invalidated
    pub fn get(&self, handle: ObjectHandle) -> Option<&LevelObject> {
        if handle.generation != self.generation {
            return None;
        }
        self.objects.get(handle.index)
    }

    /// Mutable version of [`LevelData::get`]
    pub fn get_mut(&mut self, handle: ObjectHandle) -> Option<&mut LevelObject> {
        if handle.generation != self.generation {
            return None;
        }
        self.objects.get_mut(handle.index)
    }

    /// Returns every object of the given type in document order
    pub fn objects_by_type(&self, object_type: ObjectType) -> Vec<&LevelObject> {
        self.objects
            .iter()
            .filter(|obj| obj.object_type() == object_type)
            .collect()
    }

    /// All objects in document order
    pub fn objects(&self) -> &[LevelObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn set_setting(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.settings.insert(key.into(), value.into());
    }

    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    pub fn settings(&self) -> &BTreeMap<String, String> {
        &self.settings
    }

    /// Drops all objects and settings
    pub fn clear(&mut self) {
        self.objects.clear();
        self.settings.clear();
        self.generation += 1;
    }

    /// Writes the whole document to a file, truncating it
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), LevelError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| LevelError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)
            .and_then(|()| writer.flush())
            .map_err(|source| LevelError::Write {
                path: path.to_path_buf(),
                source,
            })?;

        info!(
            path = %path.display(),
            objects = self.objects.len(),
            settings = self.settings.len(),
            "Saved level"
        );
        Ok(())
    }

    /// Replaces this document with the contents of a file
    ///
    /// This is destructive: once the file is open, all current objects and
    /// settings are discarded before reading, whether or not they were saved.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<LoadReport, LevelError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LevelError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let report = self
            .read_from(BufReader::new(file))
            .map_err(|source| LevelError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        for fallback in &report.fallbacks {
            warn!(path = %path.display(), "{}", fallback);
        }
        if report.lossy_lines > 0 {
            warn!(
                path = %path.display(),
                lines = report.lossy_lines,
                "Level file is not valid UTF-8; invalid bytes were replaced"
            );
        }
        info!(
            path = %path.display(),
            objects = report.objects,
            settings = report.settings,
            fallbacks = report.fallbacks.len(),
            "Loaded level"
        );
        Ok(report)
    }

    /// Writes the document in level file format
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "LEVEL_FILE_VERSION={}", LEVEL_FILE_VERSION)?;

        writeln!(out, "SETTINGS_COUNT={}", self.settings.len())?;
        for (key, value) in &self.settings {
            writeln!(out, "{}{},{}", SETTING_PREFIX, key, value)?;
        }

        writeln!(out, "OBJECTS_COUNT={}", self.objects.len())?;
        for object in &self.objects {
            format::write_object(object, out)?;
        }
        Ok(())
    }

    /// Clears the document and repopulates it from level file text
    ///
    /// Version and count lines are not validated; reading is best effort.
    /// Bytes that are not valid UTF-8 are replaced with U+FFFD.
    pub fn read_from<R: BufRead>(&mut self, reader: R) -> io::Result<LoadReport> {
        self.clear();

        let mut report = LoadReport::default();
        let mut lines = LossyLines::new(reader);

        while let Some(line) = lines.next() {
            let line = line?;
            let line = line.trim_end_matches('\r');

            if line == OBJECT_BEGIN {
                let read = format::read_object(&mut lines)?;
                debug!(name = read.object.name(), "Read object");
                report.fallbacks.extend(read.fallbacks);
                self.objects.push(read.object);
            } else if let Some(rest) = line.strip_prefix(SETTING_PREFIX)
                && let Some((key, value)) = rest.split_once(',')
            {
                self.settings.insert(key.to_string(), value.to_string());
            }
        }

        report.objects = self.objects.len();
        report.settings = self.settings.len();
        report.lossy_lines = lines.lossy;
        Ok(report)
    }
}

/// Splits a reader into lines without requiring UTF-8
///
/// Counts the lines that needed replacement characters.
struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
    lossy: usize,
}

impl<R: BufRead> LossyLines<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            lossy: 0,
        }
    }
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                }
                let line = match String::from_utf8_lossy(&self.buf) {
                    Cow::Borrowed(line) => line.to_string(),
                    Cow::Owned(line) => {
                        self.lossy += 1;
                        line
                    }
                };
                Some(Ok(line))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Documents are equal when their objects and settings are; handle
/// generations are ignored.
impl PartialEq for LevelData {
    fn eq(&self, other: &Self) -> bool {
        self.objects == other.objects && self.settings == other.settings
    }
}
