//! Core type definitions for the catalog.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Scalar data types a column can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    /// Boolean value.
    Bool,
    /// 64-bit signed integer.
    Int,
    /// 64-bit floating point.
    Float,
    /// UTF-8 string.
    String,
    /// Date or datetime kept as an ISO-8601 string.
    Timestamp,
}

impl ScalarType {
    /// Check if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ScalarType::Int | ScalarType::Float)
    }

    /// Check if this type is a string-like type.
    pub fn is_string_like(&self) -> bool {
        matches!(self, ScalarType::String | ScalarType::Timestamp)
    }

    /// Human-readable type name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Int => "int",
            ScalarType::Float => "float",
            ScalarType::String => "string",
            ScalarType::Timestamp => "timestamp",
        }
    }

    /// Parse a raw request string into a typed value.
    ///
    /// Booleans accept `true/false`, `1/0`, `yes/no` and `on/off`.
    pub fn parse(&self, raw: &str) -> Option<Value> {
        let raw = raw.trim();
        match self {
            ScalarType::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Some(Value::Bool(true)),
                "false" | "0" | "no" | "off" => Some(Value::Bool(false)),
                _ => None,
            },
            ScalarType::Int => raw.parse::<i64>().ok().map(Value::Int),
            ScalarType::Float => raw.parse::<f64>().ok().map(Value::Float),
            ScalarType::String | ScalarType::Timestamp => Some(Value::String(raw.to_string())),
        }
    }
}

/// What a field holds: a plain column or a reference to another model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// A plain column.
    Scalar {
        /// Column type.
        #[serde(rename = "type")]
        scalar: ScalarType,
        /// Whether the column may hold null.
        #[serde(default)]
        nullable: bool,
    },
    /// A reference to the primary key of `target`.
    ForeignKey {
        /// Referenced model name.
        target: String,
        /// Whether the reference may be null.
        #[serde(default)]
        nullable: bool,
    },
}

impl FieldKind {
    /// Check if this kind may hold null.
    pub fn is_nullable(&self) -> bool {
        match self {
            FieldKind::Scalar { nullable, .. } | FieldKind::ForeignKey { nullable, .. } => {
                *nullable
            }
        }
    }

    /// Target model if this is a foreign key.
    pub fn target(&self) -> Option<&str> {
        match self {
            FieldKind::ForeignKey { target, .. } => Some(target),
            FieldKind::Scalar { .. } => None,
        }
    }

    /// Scalar type if this is a plain column.
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self {
            FieldKind::Scalar { scalar, .. } => Some(*scalar),
            FieldKind::ForeignKey { .. } => None,
        }
    }
}
