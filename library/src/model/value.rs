use serde::{Deserialize, Serialize};

use ordered_float::OrderedFloat;
use std::fmt;
use std::hash::Hash;

use super::gradient::Gradient;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Vec2 {
    pub x: OrderedFloat<f64>,
    pub y: OrderedFloat<f64>,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Vec3 {
    pub x: OrderedFloat<f64>,
    pub y: OrderedFloat<f64>,
    pub z: OrderedFloat<f64>,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Vec4 {
    pub x: OrderedFloat<f64>,
    pub y: OrderedFloat<f64>,
    pub z: OrderedFloat<f64>,
    pub w: OrderedFloat<f64>,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: OrderedFloat(x),
            y: OrderedFloat(y),
        }
    }
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: OrderedFloat(x),
            y: OrderedFloat(y),
            z: OrderedFloat(z),
        }
    }
}

impl Vec4 {
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self {
            x: OrderedFloat(x),
            y: OrderedFloat(y),
            z: OrderedFloat(z),
            w: OrderedFloat(w),
        }
    }

    /// Component-wise linear interpolation.
    pub fn lerp(&self, other: &Vec4, t: f64) -> Vec4 {
        let mix = |a: OrderedFloat<f64>, b: OrderedFloat<f64>| a.0 + (b.0 - a.0) * t;
        Vec4::new(
            mix(self.x, other.x),
            mix(self.y, other.y),
            mix(self.z, other.z),
            mix(self.w, other.w),
        )
    }
}

/// Declared type of a slot (socket type of an input or output definition).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Floating point scalar (f64)
    Float,
    /// Integer value (i64)
    Int,
    Bool,
    String,
    Vec2,
    Vec3,
    /// 4D vector, also used for RGBA colors
    Vec4,
    /// Color gradient
    Gradient,
    /// List of values
    List,
    /// Accepts any type
    Any,
}

impl ValueType {
    /// Zero value used for fresh output slots of this type.
    pub fn default_value(&self) -> SlotValue {
        match self {
            ValueType::Float => SlotValue::Float(OrderedFloat(0.0)),
            ValueType::Int => SlotValue::Int(0),
            ValueType::Bool => SlotValue::Bool(false),
            ValueType::String => SlotValue::String(String::new()),
            ValueType::Vec2 => SlotValue::Vec2(Vec2::default()),
            ValueType::Vec3 => SlotValue::Vec3(Vec3::default()),
            ValueType::Vec4 => SlotValue::Vec4(Vec4::default()),
            ValueType::Gradient => SlotValue::Gradient(Gradient::default()),
            ValueType::List => SlotValue::List(Vec::new()),
            ValueType::Any => SlotValue::Empty,
        }
    }

    /// Whether a source of type `source` may feed a slot of this type.
    pub fn accepts(&self, source: ValueType) -> bool {
        *self == ValueType::Any || source == ValueType::Any || *self == source
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueType::Float => "Float",
            ValueType::Int => "Int",
            ValueType::Bool => "Bool",
            ValueType::String => "String",
            ValueType::Vec2 => "Vec2",
            ValueType::Vec3 => "Vec3",
            ValueType::Vec4 => "Vec4",
            ValueType::Gradient => "Gradient",
            ValueType::List => "List",
            ValueType::Any => "Any",
        };
        write!(f, "{}", s)
    }
}

/// The value held by a slot.
///
/// Each variant corresponds to a `ValueType` and carries the concrete runtime
/// value for that type.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum SlotValue {
    Float(OrderedFloat<f64>),
    Int(i64),
    Bool(bool),
    String(String),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Gradient(Gradient),
    List(Vec<SlotValue>),
    /// No value (fresh `Any` slot).
    #[default]
    Empty,
}

impl SlotValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            SlotValue::Float(_) => ValueType::Float,
            SlotValue::Int(_) => ValueType::Int,
            SlotValue::Bool(_) => ValueType::Bool,
            SlotValue::String(_) => ValueType::String,
            SlotValue::Vec2(_) => ValueType::Vec2,
            SlotValue::Vec3(_) => ValueType::Vec3,
            SlotValue::Vec4(_) => ValueType::Vec4,
            SlotValue::Gradient(_) => ValueType::Gradient,
            SlotValue::List(_) => ValueType::List,
            SlotValue::Empty => ValueType::Any,
        }
    }

    pub fn get_as<T: TryGetValue<T>>(&self) -> Option<T> {
        T::try_get(self)
    }

    /// Extract as f64, returning `default` for non-numeric values.
    pub fn as_float(&self, default: f64) -> f64 {
        self.get_as::<f64>().unwrap_or(default)
    }
}

impl From<f64> for SlotValue {
    fn from(value: f64) -> Self {
        SlotValue::Float(OrderedFloat(value))
    }
}

impl From<f32> for SlotValue {
    fn from(value: f32) -> Self {
        SlotValue::Float(OrderedFloat(value as f64))
    }
}

impl From<i64> for SlotValue {
    fn from(value: i64) -> Self {
        SlotValue::Int(value)
    }
}

impl From<bool> for SlotValue {
    fn from(value: bool) -> Self {
        SlotValue::Bool(value)
    }
}

impl From<String> for SlotValue {
    fn from(value: String) -> Self {
        SlotValue::String(value)
    }
}

impl From<&str> for SlotValue {
    fn from(value: &str) -> Self {
        SlotValue::String(value.to_string())
    }
}

impl From<Vec4> for SlotValue {
    fn from(value: Vec4) -> Self {
        SlotValue::Vec4(value)
    }
}

impl From<Gradient> for SlotValue {
    fn from(value: Gradient) -> Self {
        SlotValue::Gradient(value)
    }
}

// Type-safe extraction from SlotValue
pub trait TryGetValue<T> {
    fn try_get(v: &SlotValue) -> Option<T>;
}

impl TryGetValue<f64> for f64 {
    fn try_get(v: &SlotValue) -> Option<f64> {
        match v {
            SlotValue::Float(f) => Some(f.into_inner()),
            SlotValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl TryGetValue<f32> for f32 {
    fn try_get(v: &SlotValue) -> Option<f32> {
        f64::try_get(v).map(|f| f as f32)
    }
}

impl TryGetValue<i64> for i64 {
    fn try_get(v: &SlotValue) -> Option<i64> {
        match v {
            SlotValue::Int(i) => Some(*i),
            SlotValue::Float(f) => {
                // Only whole numbers convert
                if f.fract().abs() < f64::EPSILON
                    && *f >= OrderedFloat(i64::MIN as f64)
                    && *f <= OrderedFloat(i64::MAX as f64)
                {
                    Some(f.into_inner() as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

impl TryGetValue<bool> for bool {
    fn try_get(v: &SlotValue) -> Option<bool> {
        match v {
            SlotValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl TryGetValue<String> for String {
    fn try_get(v: &SlotValue) -> Option<String> {
        match v {
            SlotValue::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl TryGetValue<Vec2> for Vec2 {
    fn try_get(v: &SlotValue) -> Option<Vec2> {
        match v {
            SlotValue::Vec2(v) => Some(*v),
            _ => None,
        }
    }
}

impl TryGetValue<Vec3> for Vec3 {
    fn try_get(v: &SlotValue) -> Option<Vec3> {
        match v {
            SlotValue::Vec3(v) => Some(*v),
            _ => None,
        }
    }
}

impl TryGetValue<Vec4> for Vec4 {
    fn try_get(v: &SlotValue) -> Option<Vec4> {
        match v {
            SlotValue::Vec4(v) => Some(*v),
            _ => None,
        }
    }
}

impl TryGetValue<Gradient> for Gradient {
    fn try_get(v: &SlotValue) -> Option<Gradient> {
        match v {
            SlotValue::Gradient(g) => Some(g.clone()),
            _ => None,
        }
    }
}

impl TryGetValue<Vec<SlotValue>> for Vec<SlotValue> {
    fn try_get(v: &SlotValue) -> Option<Vec<SlotValue>> {
        match v {
            SlotValue::List(items) => Some(items.clone()),
            _ => None,
        }
    }
}
