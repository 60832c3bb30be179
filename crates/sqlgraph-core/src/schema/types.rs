//! Semantic field types.

use crate::value::Value;
use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};
use std::fmt;

/// The semantic type of a node field.
///
/// The compiler uses it to reject literals that cannot be compared against the
/// column and to decide which string operators apply.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Archive,
    Serialize,
    Deserialize,
    SerdeSerialize,
    SerdeDeserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Boolean.
    Bool,
    /// Signed integer of any width.
    Int,
    /// Floating point or decimal.
    Float,
    /// Text.
    String,
    /// Enumeration stored as its string value.
    Enum,
    /// Binary data.
    Bytes,
    /// Timestamp.
    Time,
    /// UUID.
    Uuid,
    /// JSON document.
    Json,
}

impl FieldType {
    /// Check if a literal of this value can be compared against the column.
    ///
    /// `Null` is never accepted here; null checks go through `IsNull`.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (FieldType::Bool, Value::Bool(_))
                | (FieldType::Int, Value::Int(_))
                | (FieldType::Float, Value::Float(_) | Value::Int(_))
                | (FieldType::String | FieldType::Enum, Value::String(_))
                | (FieldType::Bytes, Value::Bytes(_))
                | (FieldType::Time, Value::Timestamp(_) | Value::String(_))
                | (FieldType::Uuid, Value::Uuid(_) | Value::String(_))
                | (FieldType::Json, Value::String(_) | Value::Bytes(_))
        )
    }

    /// Check if LIKE-based operators apply to this type.
    pub fn is_textual(&self) -> bool {
        matches!(self, FieldType::String | FieldType::Enum)
    }

    /// Check if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Int | FieldType::Float)
    }

    /// Lowercase type name.
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::String => "string",
            FieldType::Enum => "enum",
            FieldType::Bytes => "bytes",
            FieldType::Time => "time",
            FieldType::Uuid => "uuid",
            FieldType::Json => "json",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts() {
        assert!(FieldType::Int.accepts(&Value::Int(1)));
        assert!(!FieldType::Int.accepts(&Value::from("1")));
        assert!(FieldType::Float.accepts(&Value::Int(1)));
        assert!(FieldType::Enum.accepts(&Value::from("active")));
        assert!(FieldType::Uuid.accepts(&Value::Uuid([0; 16])));
        assert!(!FieldType::Bool.accepts(&Value::Null));
        assert!(!FieldType::String.accepts(&Value::Null));
    }

    #[test]
    fn test_textual() {
        assert!(FieldType::String.is_textual());
        assert!(FieldType::Enum.is_textual());
        assert!(!FieldType::Json.is_textual());
        assert!(FieldType::Float.is_numeric());
    }

    #[test]
    fn test_serde_names() {
        let t: FieldType = serde_json::from_str("\"uuid\"").unwrap();
        assert_eq!(t, FieldType::Uuid);
        assert_eq!(serde_json::to_string(&FieldType::Time).unwrap(), "\"time\"");
        assert_eq!(FieldType::Json.to_string(), "json");
    }
}
