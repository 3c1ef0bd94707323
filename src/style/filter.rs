//! Filter predicates over feature tags, type and id.

use std::fmt;

use serde::de::{self, Deserializer, SeqAccess, Visitor};

use crate::element::{GeometryType, VectorElement};
use crate::tags::TagValue;

/// Closed predicate tree evaluated against one element.
///
/// Unknown operators are unrepresentable here; the serde path rejects
/// them when a style document is loaded.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All(Vec<Filter>),
    Any(Vec<Filter>),
    None(Vec<Filter>),
    Equals(String, TagValue),
    NotEquals(String, TagValue),
    GreaterThan(String, f64),
    GreaterThanEquals(String, f64),
    LessThan(String, f64),
    LessThanEquals(String, f64),
    In(String, Vec<TagValue>),
    NotIn(String, Vec<TagValue>),
    Has(String),
    NotHas(String),
    TypeEquals(GeometryType),
    TypeNotEquals(GeometryType),
    TypeIn(Vec<GeometryType>),
    TypeNotIn(Vec<GeometryType>),
    IdentifierEquals(u64),
    IdentifierNotEquals(u64),
    IdentifierIn(Vec<u64>),
    IdentifierNotIn(Vec<u64>),
    HasIdentifier,
    NotHasIdentifier,
}

impl Default for Filter {
    /// An empty `All` matches every feature.
    fn default() -> Self {
        Filter::All(Vec::new())
    }
}

impl Filter {
    /// Pure predicate evaluation; compound variants short-circuit.
    pub fn eval(&self, element: &VectorElement) -> bool {
        match self {
            Filter::All(filters) => filters.iter().all(|f| f.eval(element)),
            Filter::Any(filters) => filters.iter().any(|f| f.eval(element)),
            Filter::None(filters) => !filters.iter().any(|f| f.eval(element)),
            Filter::Equals(key, value) => element.tags.contains_key_value(key, value),
            Filter::NotEquals(key, value) => !element.tags.contains_key_value(key, value),
            Filter::GreaterThan(key, value) => {
                Self::number(element, key).is_some_and(|n| n > *value)
            }
            Filter::GreaterThanEquals(key, value) => {
                Self::number(element, key).is_some_and(|n| n >= *value)
            }
            Filter::LessThan(key, value) => Self::number(element, key).is_some_and(|n| n < *value),
            Filter::LessThanEquals(key, value) => {
                Self::number(element, key).is_some_and(|n| n <= *value)
            }
            Filter::In(key, values) => element
                .tags
                .get(key)
                .is_some_and(|value| values.contains(value)),
            Filter::NotIn(key, values) => !element
                .tags
                .get(key)
                .is_some_and(|value| values.contains(value)),
            Filter::Has(key) => element.tags.contains_key(key),
            Filter::NotHas(key) => !element.tags.contains_key(key),
            Filter::TypeEquals(geometry_type) => element.geometry_type() == *geometry_type,
            Filter::TypeNotEquals(geometry_type) => element.geometry_type() != *geometry_type,
            Filter::TypeIn(types) => types.contains(&element.geometry_type()),
            Filter::TypeNotIn(types) => !types.contains(&element.geometry_type()),
            Filter::IdentifierEquals(id) => element.id() == Some(*id),
            Filter::IdentifierNotEquals(id) => element.id() != Some(*id),
            Filter::IdentifierIn(ids) => element.id().is_some_and(|id| ids.contains(&id)),
            Filter::IdentifierNotIn(ids) => !element.id().is_some_and(|id| ids.contains(&id)),
            Filter::HasIdentifier => element.id().is_some(),
            Filter::NotHasIdentifier => element.id().is_none(),
        }
    }

    fn number(element: &VectorElement, key: &str) -> Option<f64> {
        element.tags.get(key).and_then(TagValue::as_number)
    }
}

impl<'de> serde::Deserialize<'de> for Filter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(FilterVisitor)
    }
}

fn parse_geometry_type<E: de::Error>(name: &str) -> Result<GeometryType, E> {
    match name {
        "Point" => Ok(GeometryType::Point),
        "LineString" => Ok(GeometryType::LineString),
        "Polygon" => Ok(GeometryType::Polygon),
        other => Err(E::custom(format!("unknown geometry type '{other}'"))),
    }
}

struct FilterVisitor;

impl<'de> Visitor<'de> for FilterVisitor {
    type Value = Filter;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a filter array expression")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Filter, A::Error>
    where
        A: SeqAccess<'de>,
    {
        use serde::de::Error as E;

        let op: String = seq
            .next_element()?
            .ok_or(E::custom("expected filter operator"))?;

        let filter = match op.as_str() {
            "all" | "any" | "none" => {
                let mut filters = Vec::new();
                while let Some(filter) = seq.next_element()? {
                    filters.push(filter);
                }
                match op.as_str() {
                    "all" => Filter::All(filters),
                    "any" => Filter::Any(filters),
                    _ => Filter::None(filters),
                }
            }
            "==" | "!=" => {
                let key: String = seq
                    .next_element()?
                    .ok_or(E::custom("expected filter key"))?;
                let negated = op == "!=";

                match key.as_str() {
                    "$type" => {
                        let name: String = seq
                            .next_element()?
                            .ok_or(E::custom("expected geometry type"))?;
                        let geometry_type = parse_geometry_type(&name)?;
                        if negated {
                            Filter::TypeNotEquals(geometry_type)
                        } else {
                            Filter::TypeEquals(geometry_type)
                        }
                    }
                    "$id" => {
                        let id = seq
                            .next_element()?
                            .ok_or(E::custom("expected feature id"))?;
                        if negated {
                            Filter::IdentifierNotEquals(id)
                        } else {
                            Filter::IdentifierEquals(id)
                        }
                    }
                    _ => {
                        let value = seq
                            .next_element()?
                            .ok_or(E::custom("expected filter value"))?;
                        if negated {
                            Filter::NotEquals(key, value)
                        } else {
                            Filter::Equals(key, value)
                        }
                    }
                }
            }
            ">" | ">=" | "<" | "<=" => {
                let key: String = seq
                    .next_element()?
                    .ok_or(E::custom("expected filter key"))?;
                let value: f64 = seq
                    .next_element()?
                    .ok_or(E::custom("expected numeric filter value"))?;
                match op.as_str() {
                    ">" => Filter::GreaterThan(key, value),
                    ">=" => Filter::GreaterThanEquals(key, value),
                    "<" => Filter::LessThan(key, value),
                    _ => Filter::LessThanEquals(key, value),
                }
            }
            "in" | "!in" => {
                let key: String = seq
                    .next_element()?
                    .ok_or(E::custom("expected filter key"))?;
                let negated = op == "!in";

                if key == "$type" {
                    let mut types = Vec::new();
                    while let Some(name) = seq.next_element::<String>()? {
                        types.push(parse_geometry_type(&name)?);
                    }
                    if negated {
                        Filter::TypeNotIn(types)
                    } else {
                        Filter::TypeIn(types)
                    }
                } else if key == "$id" {
                    let mut ids = Vec::new();
                    while let Some(id) = seq.next_element()? {
                        ids.push(id);
                    }
                    if negated {
                        Filter::IdentifierNotIn(ids)
                    } else {
                        Filter::IdentifierIn(ids)
                    }
                } else {
                    let mut values = Vec::new();
                    while let Some(value) = seq.next_element()? {
                        values.push(value);
                    }
                    if negated {
                        Filter::NotIn(key, values)
                    } else {
                        Filter::In(key, values)
                    }
                }
            }
            "has" | "!has" => {
                let key: String = seq
                    .next_element()?
                    .ok_or(E::custom("expected filter key"))?;
                match (op.as_str(), key.as_str()) {
                    ("has", "$id") => Filter::HasIdentifier,
                    ("!has", "$id") => Filter::NotHasIdentifier,
                    ("has", _) => Filter::Has(key),
                    _ => Filter::NotHas(key),
                }
            }
            other => return Err(E::custom(format!("unknown filter operator '{other}'"))),
        };

        Ok(filter)
    }
}
