//! Line-oriented text codec for object blocks
//!
//! ```text
//! OBJECT
//! NAME=<string>
//! TYPE=<ordinal>
//! POSITION=<x>,<y>,<z>
//! ROTATION=<x>,<y>,<z>
//! SCALE=<x>,<y>,<z>
//! PROPERTIES_COUNT=<n>
//! PROPERTY=<key>,<value>
//! END_OBJECT
//! ```
//!
//! Nothing is escaped. A comma inside a property key, or a newline anywhere,
//! corrupts the record on read-back.

use std::fmt;
use std::io::{self, Write};

use glam::Vec3;

use super::object::{LevelObject, ObjectType};
use super::property::PropertyValue;

pub const OBJECT_BEGIN: &str = "OBJECT";
pub const OBJECT_END: &str = "END_OBJECT";

/// Object fields that fall back to a default when absent or unreadable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectField {
    Name,
    Type,
    Position,
    Rotation,
    Scale,
}

impl fmt::Display for ObjectField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ObjectField::Name => "NAME",
            ObjectField::Type => "TYPE",
            ObjectField::Position => "POSITION",
            ObjectField::Rotation => "ROTATION",
            ObjectField::Scale => "SCALE",
        })
    }
}

/// Why a field was defaulted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The field never appeared in the block
    Missing,
    /// The field was present but could not be fully parsed; holds the raw text
    Malformed(String),
}

/// A field of one object that was replaced by its default during loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFallback {
    /// Name of the object the field belongs to (may be empty)
    pub object: String,
    pub field: ObjectField,
    pub reason: FallbackReason,
}

impl fmt::Display for FieldFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            FallbackReason::Missing => write!(
                f,
                "object '{}': {} missing, using default",
                self.object, self.field
            ),
            FallbackReason::Malformed(raw) => write!(
                f,
                "object '{}': {} malformed ('{}'), using default",
                self.object, self.field, raw
            ),
        }
    }
}

/// An object read from a block plus the fields that were defaulted
#[derive(Debug, Clone)]
pub struct DeserializedObject {
    pub object: LevelObject,
    pub fallbacks: Vec<FieldFallback>,
}

/// Writes one object block
pub fn write_object<W: Write>(object: &LevelObject, out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", OBJECT_BEGIN)?;
    writeln!(out, "NAME={}", object.name())?;
    writeln!(out, "TYPE={}", object.object_type().ordinal())?;
    writeln!(out, "POSITION={}", format_vec3(object.position()))?;
    writeln!(out, "ROTATION={}", format_vec3(object.rotation()))?;
    writeln!(out, "SCALE={}", format_vec3(object.scale()))?;
    writeln!(out, "PROPERTIES_COUNT={}", object.properties().len())?;
    for (key, value) in object.properties() {
        writeln!(out, "PROPERTY={},{}", key, value)?;
    }
    writeln!(out, "{}", OBJECT_END)
}

/// Reads one object block, consuming lines through `END_OBJECT`
///
/// The `OBJECT` line must already have been consumed. Reading stops at
/// `END_OBJECT` or at end of input. Unknown keys are ignored, and
/// `PROPERTIES_COUNT` is not checked against the number of properties read.
pub fn read_object<I>(lines: &mut I) -> io::Result<DeserializedObject>
where
    I: Iterator<Item = io::Result<String>>,
{
    let mut name = None;
    let mut object_type = None;
    let mut position = None;
    let mut rotation = None;
    let mut scale = None;
    let mut properties = Vec::new();
    let mut malformed = Vec::new();

    for line in lines.by_ref() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line == OBJECT_END {
            break;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        match key {
            "NAME" => name = Some(value.to_string()),
            "TYPE" => {
                let parsed = value
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .and_then(ObjectType::from_ordinal);
                if parsed.is_none() {
                    malformed.push((ObjectField::Type, value.to_string()));
                }
                object_type = Some(parsed.unwrap_or_default());
            }
            "POSITION" => {
                position = Some(parse_vec3(value, Vec3::ZERO, ObjectField::Position, &mut malformed))
            }
            "ROTATION" => {
                rotation = Some(parse_vec3(value, Vec3::ZERO, ObjectField::Rotation, &mut malformed))
            }
            "SCALE" => scale = Some(parse_vec3(value, Vec3::ONE, ObjectField::Scale, &mut malformed)),
            "PROPERTY" => {
                if let Some((prop_key, prop_value)) = value.split_once(',') {
                    properties.push((prop_key.to_string(), PropertyValue::parse(prop_value)));
                }
            }
            _ => {}
        }
    }

    let mut missing = Vec::new();
    if name.is_none() {
        missing.push(ObjectField::Name);
    }
    if object_type.is_none() {
        missing.push(ObjectField::Type);
    }
    if position.is_none() {
        missing.push(ObjectField::Position);
    }
    if rotation.is_none() {
        missing.push(ObjectField::Rotation);
    }
    if scale.is_none() {
        missing.push(ObjectField::Scale);
    }

    let mut object = LevelObject::new(name.unwrap_or_default(), object_type.unwrap_or_default());
    object.set_position(position.unwrap_or(Vec3::ZERO));
    object.set_rotation(rotation.unwrap_or(Vec3::ZERO));
    object.set_scale(scale.unwrap_or(Vec3::ONE));
    for (key, value) in properties {
        object.set_property(key, value);
    }

    let fallbacks = missing
        .into_iter()
        .map(|field| (field, FallbackReason::Missing))
        .chain(
            malformed
                .into_iter()
                .map(|(field, raw)| (field, FallbackReason::Malformed(raw))),
        )
        .map(|(field, reason)| FieldFallback {
            object: object.name().to_string(),
            field,
            reason,
        })
        .collect();

    Ok(DeserializedObject { object, fallbacks })
}

fn format_vec3(v: Vec3) -> String {
    format!("{},{},{}", v.x, v.y, v.z)
}

/// Parses `x,y,z` one component at a time
///
/// Parsing stops at the first component that is missing or unreadable;
/// that component and the ones after it keep their defaults.
fn parse_vec3(
    raw: &str,
    defaults: Vec3,
    field: ObjectField,
    malformed: &mut Vec<(ObjectField, String)>,
) -> Vec3 {
    let mut components = defaults.to_array();
    let mut parts = raw.split(',');

    for slot in components.iter_mut() {
        match parts.next().and_then(|part| part.trim().parse::<f32>().ok()) {
            Some(value) => *slot = value,
            None => {
                malformed.push((field, raw.to_string()));
                break;
            }
        }
    }

    Vec3::from_array(components)
}
