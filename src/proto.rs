//! Wire structures for the vector-tile protobuf container.
//!
//! Hand-annotated prost messages for the open vector-tile schema
//! (<https://github.com/mapbox/vector-tile-spec/tree/master/2.1>); the
//! field numbers are fixed by the specification.

use prost::{Enumeration, Message};

/// Top-level tile container.
#[derive(Clone, PartialEq, Message)]
pub struct Tile {
    #[prost(message, repeated, tag = "3")]
    pub layers: Vec<Layer>,
}

/// A named layer sharing one coordinate space and one key/value
/// dictionary across its features.
#[derive(Clone, PartialEq, Message)]
pub struct Layer {
    #[prost(uint32, required, tag = "15", default = "1")]
    pub version: u32,
    #[prost(string, required, tag = "1")]
    pub name: String,
    #[prost(message, repeated, tag = "2")]
    pub features: Vec<Feature>,
    /// Tag keys referenced by index from [`Feature::tags`].
    #[prost(string, repeated, tag = "3")]
    pub keys: Vec<String>,
    /// Tag values referenced by index from [`Feature::tags`].
    #[prost(message, repeated, tag = "4")]
    pub values: Vec<Value>,
    /// Width of the layer coordinate space, conventionally 4096.
    #[prost(uint32, tag = "5", default = "4096")]
    pub extent: u32,
}

/// A single geometric feature.
#[derive(Clone, PartialEq, Message)]
pub struct Feature {
    #[prost(uint64, optional, tag = "1")]
    pub id: Option<u64>,
    /// Alternating key/value index pairs into the layer dictionaries.
    #[prost(uint32, repeated, tag = "2")]
    pub tags: Vec<u32>,
    #[prost(enumeration = "GeomType", optional, tag = "3", default = "Unknown")]
    pub r#type: Option<i32>,
    /// Command-encoded geometry stream, decoded by [`crate::geometry`].
    #[prost(uint32, repeated, tag = "4")]
    pub geometry: Vec<u32>,
}

/// Geometry type carried by a feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Enumeration)]
#[repr(i32)]
pub enum GeomType {
    Unknown = 0,
    Point = 1,
    Linestring = 2,
    Polygon = 3,
}

/// Typed tag value; a well-formed encoder sets exactly one field.
#[derive(Clone, PartialEq, Message)]
pub struct Value {
    #[prost(string, optional, tag = "1")]
    pub string_value: Option<String>,
    #[prost(float, optional, tag = "2")]
    pub float_value: Option<f32>,
    #[prost(double, optional, tag = "3")]
    pub double_value: Option<f64>,
    #[prost(int64, optional, tag = "4")]
    pub int_value: Option<i64>,
    #[prost(uint64, optional, tag = "5")]
    pub uint_value: Option<u64>,
    #[prost(sint64, optional, tag = "6")]
    pub sint_value: Option<i64>,
    #[prost(bool, optional, tag = "7")]
    pub bool_value: Option<bool>,
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Value {
            string_value: Some(value.into()),
            ..Default::default()
        }
    }
}
