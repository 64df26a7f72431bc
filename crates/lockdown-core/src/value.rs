//! Scalar values held by record fields and context variables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A dynamically typed field or context value.
///
/// `Ref` is a reference to another record. Rule evaluation never compares
/// references directly: they are reduced to the identity of the referenced
/// record first, so `owner == context.user` works whether `owner` holds the
/// user record or just its id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    /// Absent / null.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// A list of values, used for membership tests.
    List(Vec<Value>),
    /// A reference to another record.
    Ref {
        /// Name of the referenced entity type.
        entity_type: String,
        /// Identity of the referenced record (`Null` if not yet persisted).
        id: Box<Value>,
    },
}

impl Value {
    /// Create a reference to a record of `entity_type` with the given identity.
    pub fn reference(entity_type: impl Into<String>, id: impl Into<Value>) -> Self {
        Value::Ref {
            entity_type: entity_type.into(),
            id: Box::new(id.into()),
        }
    }

    /// Returns `true` for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Reduce references to the identity they point at.
    ///
    /// Nested references (a reference whose identity is itself a reference)
    /// are followed until a plain value is reached.
    pub fn reduce(&self) -> &Value {
        let mut current = self;
        while let Value::Ref { id, .. } = current {
            current = id;
        }
        current
    }

    /// Truthiness used when a bare value node is evaluated as a rule.
    pub fn is_truthy(&self) -> bool {
        match self.reduce() {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Text(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Ref { .. } => true,
        }
    }

    /// Null-aware equality after reference reduction.
    ///
    /// Null never equals anything, including another null.
    pub fn matches(&self, other: &Value) -> bool {
        let (lhs, rhs) = (self.reduce(), other.reduce());
        if lhs.is_null() || rhs.is_null() {
            return false;
        }
        lhs == rhs
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Ref { entity_type, id } => write!(f, "{}({})", entity_type, id),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduce_nested_reference() {
        let inner = Value::reference("user", 7);
        let outer = Value::Ref {
            entity_type: "owner".into(),
            id: Box::new(inner),
        };
        assert_eq!(outer.reduce(), &Value::Int(7));
    }

    #[test]
    fn test_reference_matches_plain_id() {
        let owner = Value::reference("user", 10);
        assert!(owner.matches(&Value::Int(10)));
        assert!(!owner.matches(&Value::Int(11)));
    }

    #[test]
    fn test_null_never_matches() {
        assert!(!Value::Null.matches(&Value::Null));
        assert!(!Value::Null.matches(&Value::Int(0)));
        assert!(!Value::reference("user", Value::Null).matches(&Value::Null));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Int(3).is_truthy());
        assert!(!Value::Text(String::new()).is_truthy());
        assert!(Value::from(vec![1, 2]).is_truthy());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from("x").to_string(), "\"x\"");
        assert_eq!(Value::from(vec![1, 2]).to_string(), "[1, 2]");
        assert_eq!(Value::reference("group", 3).to_string(), "group(3)");
    }

    #[test]
    fn test_serde_json() {
        let v = Value::reference("group", 3);
        let json = serde_json::to_string(&v).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);
    }
}
