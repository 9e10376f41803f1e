//! Placeable level objects

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use glam::Vec3;

use super::property::PropertyValue;

/// Category of a level object
///
/// The ordinal is what level files store in the `TYPE=` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ObjectType {
    #[default]
    Mesh,
    Light,
    Camera,
    Trigger,
    Spawn,
}

impl ObjectType {
    /// Every object type, in ordinal order
    pub const ALL: [ObjectType; 5] = [
        ObjectType::Mesh,
        ObjectType::Light,
        ObjectType::Camera,
        ObjectType::Trigger,
        ObjectType::Spawn,
    ];

    /// Integer ordinal used by the level file format
    pub fn ordinal(self) -> u32 {
        self as u32
    }

    /// Looks up a type by its file ordinal
    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }

    /// Lowercase name used on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectType::Mesh => "mesh",
            ObjectType::Light => "light",
            ObjectType::Camera => "camera",
            ObjectType::Trigger => "trigger",
            ObjectType::Spawn => "spawn",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown object type '{}' (expected one of: mesh, light, camera, trigger, spawn)",
                    s
                )
            })
    }
}

/// A single placeable entity in a level
#[derive(Debug, Clone, PartialEq)]
pub struct LevelObject {
    name: String,
    object_type: ObjectType,
    position: Vec3,
    rotation: Vec3,
    scale: Vec3,
    properties: BTreeMap<String, PropertyValue>,
}

impl LevelObject {
    /// Creates an object at the origin with unit scale and no properties
    pub fn new(name: impl Into<String>, object_type: ObjectType) -> Self {
        Self {
            name: name.into(),
            object_type,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            properties: BTreeMap::new(),
        }
    }

    /// Builder method to set the position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Builder method to set a property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.set_property(key, value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    pub fn set_object_type(&mut self, object_type: ObjectType) {
        self.object_type = object_type;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    /// Sets a property, replacing any previous value for the key
    ///
    /// The value is stored in the form it takes after a save and reload:
    /// `Text("42")` becomes `Number(42.0)` and a non-finite number becomes text.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        let value = PropertyValue::parse(&value.into().to_string());
        self.properties.insert(key.into(), value);
    }

    /// Returns a property value if present
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Returns the code form of a property, or empty text when it is missing
    pub fn property_text(&self, key: &str) -> String {
        self.properties
            .get(key)
            .map(PropertyValue::to_code)
            .unwrap_or_default()
    }

    /// Removes a property, returning its old value
    pub fn remove_property(&mut self, key: &str) -> Option<PropertyValue> {
        self.properties.remove(key)
    }

    /// All properties, ordered by key
    pub fn properties(&self) -> &BTreeMap<String, PropertyValue> {
        &self.properties
    }
}
