//! Typed field values and the generic record container.
use crate::layout::FieldKind;

/// A single field value.
///
/// Decoding always produces the variant matching the field kind
/// (`U32`, `F64`, `Text`, `U8`). `Int` exists for producers holding loosely
/// typed integers; the encoder range-checks it against the target field
/// (for `f64` fields, magnitudes above 2^53 are rejected as inexact).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U32(u32),
    F64(f64),
    Text(String),
    U8(u8),
    Int(i64),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::U32(_) => "u32",
            Value::F64(_) => "f64",
            Value::Text(_) => "text",
            Value::U8(_) => "u8",
            Value::Int(_) => "int",
        }
    }

    /// Whether a decoded value of `kind` has this variant.
    pub fn is_kind(&self, kind: FieldKind) -> bool {
        matches!(
            (self, kind),
            (Value::U32(_), FieldKind::U32)
                | (Value::F64(_), FieldKind::F64)
                | (Value::Text(_), FieldKind::Text)
                | (Value::U8(_), FieldKind::U8)
        )
    }

    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Value::U32(v) => Some(v),
            Value::U8(v) => Some(v as u32),
            Value::Int(v) => u32::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> Option<u8> {
        match *self {
            Value::U8(v) => Some(v),
            Value::U32(v) => u8::try_from(v).ok(),
            Value::Int(v) => u8::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F64(v) => Some(v),
            Value::U32(v) => Some(v as f64),
            Value::U8(v) => Some(v as f64),
            Value::Int(v) => Some(v as f64),
            Value::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::U32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::U8(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

/// Ordered name → value map for one logical record.
///
/// Field order is insertion order; [`crate::codec::decode`] inserts in layout
/// order. Setting an existing name replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self { fields: Vec::with_capacity(n) }
    }

    /// Builder-style [`Record::set`].
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name.to_owned(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_in_place() {
        let mut r = Record::new().with("a", 1u32).with("b", "x");
        r.set("a", 2u32);
        assert_eq!(r.len(), 2);
        assert_eq!(r.get("a"), Some(&Value::U32(2)));
        let names: Vec<&str> = r.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn conversions() {
        assert_eq!(Value::Int(300).as_u8(), None);
        assert_eq!(Value::Int(-1).as_u32(), None);
        assert_eq!(Value::U8(7).as_u32(), Some(7));
        assert_eq!(Value::Text("a".into()).as_f64(), None);
        assert!(Value::F64(1.0).is_kind(FieldKind::F64));
        assert!(!Value::Int(1).is_kind(FieldKind::U32));
    }
}
