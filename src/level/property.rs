//! Tagged values for the per-object property bag

use std::fmt;

use glam::Vec3;

/// A single property value attached to a level object
///
/// Values are stored on disk as plain text. Reading infers the tag:
/// a finite number becomes [`PropertyValue::Number`], three comma-separated
/// finite numbers become [`PropertyValue::Vector`], anything else stays text.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Scalar number
    Number(f64),
    /// Free-form text
    Text(String),
    /// Three-component vector
    Vector(Vec3),
}

impl PropertyValue {
    /// Infers a typed value from its text form
    pub fn parse(raw: &str) -> Self {
        if let Some(number) = parse_finite(raw) {
            return PropertyValue::Number(number);
        }

        let parts: Vec<&str> = raw.split(',').collect();
        if let [x, y, z] = parts.as_slice()
            && let (Some(x), Some(y), Some(z)) = (component(x), component(y), component(z))
        {
            return PropertyValue::Vector(Vec3::new(x, y, z));
        }

        PropertyValue::Text(raw.to_string())
    }

    /// Returns the number if this is a `Number`
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text if this is a `Text`
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the vector if this is a `Vector`
    pub fn as_vector(&self) -> Option<Vec3> {
        match self {
            PropertyValue::Vector(v) => Some(*v),
            _ => None,
        }
    }

    /// Renders the value for interpolation into generated source
    ///
    /// Numbers always carry a decimal point or exponent, so `1` renders as `1.0`.
    /// Text is emitted verbatim and is not escaped.
    pub fn to_code(&self) -> String {
        match self {
            PropertyValue::Number(n) => format!("{:?}", n),
            PropertyValue::Text(s) => s.clone(),
            PropertyValue::Vector(v) => format!("{:?}, {:?}, {:?}", v.x, v.y, v.z),
        }
    }
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn component(raw: &str) -> Option<f32> {
    raw.parse::<f32>().ok().filter(|n| n.is_finite())
}

/// Text form written to level files
impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Number(n) => write!(f, "{:?}", n),
            PropertyValue::Text(s) => f.write_str(s),
            PropertyValue::Vector(v) => write!(f, "{},{},{}", v.x, v.y, v.z),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for PropertyValue {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

impl From<f32> for PropertyValue {
    fn from(n: f32) -> Self {
        PropertyValue::Number(n as f64)
    }
}

impl From<Vec3> for PropertyValue {
    fn from(v: Vec3) -> Self {
        PropertyValue::Vector(v)
    }
}
