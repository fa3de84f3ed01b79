//! The rendered output tree handed to text emitters.

use std::str::FromStr;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    Null,
    Bool(bool),
    /// Exact decimal text of a number.
    Number(String),
    Str(String),
}

/// A node of the output tree: no application semantics, only ordered data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputNode {
    Scalar(Scalar),
    Sequence(Vec<OutputNode>),
    /// Entries in render order.
    Mapping(Vec<(String, OutputNode)>),
}

impl OutputNode {
    pub fn str(s: impl Into<String>) -> Self {
        OutputNode::Scalar(Scalar::Str(s.into()))
    }

    pub fn number(text: impl Into<String>) -> Self {
        OutputNode::Scalar(Scalar::Number(text.into()))
    }

    pub fn bool(b: bool) -> Self {
        OutputNode::Scalar(Scalar::Bool(b))
    }

    pub fn null() -> Self {
        OutputNode::Scalar(Scalar::Null)
    }

    /// Mapping keys in render order; empty for non-mappings.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            OutputNode::Mapping(entries) => entries.iter().map(|(k, _)| k.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&OutputNode> {
        match self {
            OutputNode::Mapping(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OutputNode::Scalar(Scalar::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Exact numeric text, when this is a number.
    pub fn as_number(&self) -> Option<&str> {
        match self {
            OutputNode::Scalar(Scalar::Number(n)) => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OutputNode::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[OutputNode]> {
        match self {
            OutputNode::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Convert to JSON, keeping mapping order and exact numeric text.
    pub fn to_json(&self) -> Value {
        match self {
            OutputNode::Scalar(Scalar::Null) => Value::Null,
            OutputNode::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
            OutputNode::Scalar(Scalar::Number(text)) => Number::from_str(text)
                .map(Value::Number)
                .unwrap_or_else(|_| Value::String(text.clone())),
            OutputNode::Scalar(Scalar::Str(s)) => Value::String(s.clone()),
            OutputNode::Sequence(items) => Value::Array(items.iter().map(|i| i.to_json()).collect()),
            OutputNode::Mapping(entries) => {
                let mut m = Map::new();
                for (k, v) in entries {
                    m.insert(k.clone(), v.to_json());
                }
                Value::Object(m)
            }
        }
    }

    /// Emit as YAML, keeping mapping order and exact numeric text.
    ///
    /// serde carries numbers as machine values, so each number is first
    /// swapped for a placeholder scalar no key or string in the tree
    /// contains, and its text is written back after emission.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        let mut prefix = String::from("groundwork-number-");
        while self.mentions(&prefix) {
            prefix.push('x');
        }
        let mut numbers = Vec::new();
        let placeheld = self.hold_numbers(&prefix, &mut numbers);
        let mut yaml = serde_yaml::to_string(&placeheld)?;
        for (i, text) in numbers.iter().enumerate() {
            yaml = yaml.replacen(&format!("{}{}_", prefix, i), text, 1);
        }
        Ok(yaml)
    }

    fn mentions(&self, needle: &str) -> bool {
        match self {
            OutputNode::Scalar(Scalar::Str(s)) => s.contains(needle),
            OutputNode::Scalar(_) => false,
            OutputNode::Sequence(items) => items.iter().any(|i| i.mentions(needle)),
            OutputNode::Mapping(entries) => entries
                .iter()
                .any(|(k, v)| k.contains(needle) || v.mentions(needle)),
        }
    }

    fn hold_numbers(&self, prefix: &str, numbers: &mut Vec<String>) -> OutputNode {
        match self {
            OutputNode::Scalar(Scalar::Number(text)) => {
                numbers.push(text.clone());
                OutputNode::str(format!("{}{}_", prefix, numbers.len() - 1))
            }
            OutputNode::Scalar(_) => self.clone(),
            OutputNode::Sequence(items) => OutputNode::Sequence(
                items.iter().map(|i| i.hold_numbers(prefix, numbers)).collect(),
            ),
            OutputNode::Mapping(entries) => OutputNode::Mapping(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.hold_numbers(prefix, numbers)))
                    .collect(),
            ),
        }
    }

    /// Generic structural encode of free-form JSON data.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => OutputNode::null(),
            Value::Bool(b) => OutputNode::bool(*b),
            Value::Number(n) => OutputNode::number(n.to_string()),
            Value::String(s) => OutputNode::str(s.as_str()),
            Value::Array(items) => OutputNode::Sequence(items.iter().map(OutputNode::from_json).collect()),
            Value::Object(m) => OutputNode::Mapping(
                m.iter()
                    .map(|(k, v)| (k.clone(), OutputNode::from_json(v)))
                    .collect(),
            ),
        }
    }
}

/// Entry order is kept. Numbers reach the serializer as machine values, so
/// their exact text only survives [`OutputNode::to_json`] and
/// [`OutputNode::to_yaml`].
impl Serialize for OutputNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OutputNode::Scalar(Scalar::Null) => serializer.serialize_unit(),
            OutputNode::Scalar(Scalar::Bool(b)) => serializer.serialize_bool(*b),
            OutputNode::Scalar(Scalar::Number(text)) => {
                if let Ok(n) = text.parse::<i64>() {
                    serializer.serialize_i64(n)
                } else if let Ok(n) = text.parse::<u64>() {
                    serializer.serialize_u64(n)
                } else if let Ok(n) = text.parse::<f64>() {
                    serializer.serialize_f64(n)
                } else {
                    serializer.serialize_str(text)
                }
            }
            OutputNode::Scalar(Scalar::Str(s)) => serializer.serialize_str(s),
            OutputNode::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            OutputNode::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}
