//! Feature tags and the wire-dictionary resolver.

use std::fmt;

use serde::de::{self, Deserializer};

use crate::proto;

/// A typed tag value. All wire number variants collapse to `f64`.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl TagValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TagValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            TagValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::String(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Bool(value) => value.fmt(f),
            TagValue::Number(value) => value.fmt(f),
            TagValue::String(value) => value.fmt(f),
        }
    }
}

impl From<bool> for TagValue {
    fn from(value: bool) -> Self {
        TagValue::Bool(value)
    }
}

impl From<f64> for TagValue {
    fn from(value: f64) -> Self {
        TagValue::Number(value)
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::String(value.into())
    }
}

impl<'de> serde::Deserialize<'de> for TagValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TagValueVisitor;

        impl<'de> de::Visitor<'de> for TagValueVisitor {
            type Value = TagValue;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "a boolean, number or string")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<TagValue, E> {
                Ok(TagValue::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<TagValue, E> {
                Ok(TagValue::Number(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<TagValue, E> {
                Ok(TagValue::Number(v as f64))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<TagValue, E> {
                Ok(TagValue::Number(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<TagValue, E> {
                Ok(TagValue::String(v.into()))
            }
        }

        deserializer.deserialize_any(TagValueVisitor)
    }
}

/// Ordered key/value mapping owned by one feature.
///
/// Keys are unique with last-write-wins semantics; insertion order is
/// preserved for iteration and display. Tag sets are small, so parallel
/// vectors beat a map here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagsCollection {
    keys: Vec<String>,
    values: Vec<TagValue>,
}

impl TagsCollection {
    pub fn new() -> Self {
        TagsCollection::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.values.clear();
    }

    pub fn insert(&mut self, key: &str, value: TagValue) {
        match self.keys.iter().position(|k| k == key) {
            Some(index) => self.values[index] = value,
            None => {
                self.keys.push(key.into());
                self.values.push(value);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&TagValue> {
        let index = self.keys.iter().position(|k| k == key)?;
        self.values.get(index)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn contains_key_value(&self, key: &str, value: &TagValue) -> bool {
        self.get(key) == Some(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagValue)> {
        self.keys.iter().map(String::as_str).zip(self.values.iter())
    }
}

impl fmt::Display for TagsCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "empty");
        }

        for (index, (key, value)) in self.iter().enumerate() {
            if index > 0 {
                write!(f, ",")?;
            }
            write!(f, "{key}={value}")?;
        }

        Ok(())
    }
}

/// Resolves a feature's alternating key/value index pairs against the
/// layer dictionaries.
///
/// Out-of-range indices indicate malformed upstream data: the entry is
/// skipped and logged, never fatal.
pub fn resolve_tags(
    keys: &[String],
    values: &[proto::Value],
    tags: &[u32],
    out: &mut TagsCollection,
) {
    for pair in tags.chunks_exact(2) {
        let (Some(key), Some(value)) = (keys.get(pair[0] as usize), values.get(pair[1] as usize))
        else {
            log::debug!(
                "tag indices {}/{} outside the layer dictionaries",
                pair[0],
                pair[1]
            );
            continue;
        };

        match decode_value(value) {
            Some(value) => out.insert(key, value),
            None => log::debug!("tag '{key}' carries no value variant"),
        }
    }
}

/// First set field wins; the union is mutually exclusive by construction
/// of the encoder.
fn decode_value(value: &proto::Value) -> Option<TagValue> {
    if let Some(v) = value.bool_value {
        Some(TagValue::Bool(v))
    } else if let Some(v) = value.double_value {
        Some(TagValue::Number(v))
    } else if let Some(v) = value.float_value {
        Some(TagValue::Number(v as f64))
    } else if let Some(v) = value.int_value {
        Some(TagValue::Number(v as f64))
    } else if let Some(v) = value.string_value.as_ref() {
        Some(TagValue::String(v.clone()))
    } else if let Some(v) = value.sint_value {
        Some(TagValue::Number(v as f64))
    } else if let Some(v) = value.uint_value {
        Some(TagValue::Number(v as f64))
    } else {
        None
    }
}
