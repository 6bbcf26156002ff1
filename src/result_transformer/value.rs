use serde::{Serialize, Serializer};
use serde_json::{Map, Number};

use crate::query_planner::logical_expr::{Literal, ValueType};

/// A runtime value flowing through executed rows and post-processing programs.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    /// Entity instances and constructed projection rows.
    Record {
        type_name: Option<String>,
        fields: Vec<(String, Value)>,
    },
    Tuple(Vec<Value>),
    List(Vec<Value>),
    /// Distinct items in first-insertion order.
    Set(Vec<Value>),
    Group {
        key: Box<Value>,
        values: Vec<Value>,
    },
}

impl Value {
    pub fn record(fields: Vec<(&str, Value)>) -> Self {
        Value::Record {
            type_name: None,
            fields: fields
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Build a set, dropping repeated items but keeping first occurrences in order.
    pub fn set_from(items: Vec<Value>) -> Self {
        let mut distinct: Vec<Value> = Vec::with_capacity(items.len());
        for item in items {
            if !distinct.contains(&item) {
                distinct.push(item);
            }
        }
        Value::Set(distinct)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record { fields, .. } => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Text(_) => "text",
            Value::Record { .. } => "record",
            Value::Tuple(_) => "tuple",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Group { .. } => "group",
        }
    }

    /// Whether this value may be viewed as `ty`. `Null` conforms to every type.
    pub fn conforms_to(&self, ty: &ValueType) -> bool {
        match (self, ty) {
            (Value::Null, _) | (_, ValueType::Object) => true,
            (Value::Int(_), ValueType::Int | ValueType::Float) => true,
            (Value::Float(_), ValueType::Float) => true,
            (Value::Bool(_), ValueType::Bool) => true,
            (Value::Text(_), ValueType::Text) => true,
            (Value::Record { .. }, ValueType::Entity(_) | ValueType::Record(_)) => true,
            (
                Value::List(_) | Value::Set(_),
                ValueType::Collection { .. } | ValueType::Sequence(_),
            ) => true,
            (Value::Group { .. }, ValueType::Grouping { .. } | ValueType::Sequence(_)) => true,
            (Value::Tuple(items), ValueType::Tuple(tuple)) => {
                items.len() == tuple.arity()
                    && items.iter().zip(tuple.items()).all(|(v, t)| v.conforms_to(t))
            }
            _ => false,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(x) => Number::from_f64(*x)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Record { fields, .. } => {
                let mut map = Map::new();
                for (name, value) in fields {
                    map.insert(name.clone(), value.to_json());
                }
                serde_json::Value::Object(map)
            }
            Value::Tuple(items) | Value::List(items) | Value::Set(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Group { key, values } => serde_json::json!({
                "key": key.to_json(),
                "values": values.iter().map(Value::to_json).collect::<Vec<_>>(),
            }),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Record {
                type_name: None,
                fields: map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            },
        }
    }
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Null => Value::Null,
            Literal::Int(i) => Value::Int(*i),
            Literal::Float(x) => Value::Float(*x),
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Text(s) => Value::Text(s.clone()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
