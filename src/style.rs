//! Style layers and the rule evaluation engine.
//!
//! A style layer binds a wire-format source layer to a filter, a zoom
//! visibility range and a list of paints. Layers are built
//! programmatically by the style-document loader (JSON parsing of the
//! document itself is out of scope); the value-level pieces (filters,
//! stopped properties, colors) ship `serde::Deserialize`
//! implementations matching their Mapbox style-JSON fragments.

pub mod color;
pub mod filter;
pub mod paint;
pub mod stops;

pub use color::Color;
pub use filter::Filter;
pub use paint::{PaintProperties, PaintStyle, VectorPaint};
pub use stops::{Stops, StyleProp};

use std::str::FromStr;

use serde::Deserialize;

use crate::Error;
use crate::tags::TagsCollection;

/// Style layer kind. Unknown kinds fail at style load.
#[derive(Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LayerType {
    Background,
    Fill,
    Line,
    Symbol,
    Raster,
}

impl FromStr for LayerType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "background" => Ok(LayerType::Background),
            "fill" => Ok(LayerType::Fill),
            "line" => Ok(LayerType::Line),
            "symbol" => Ok(LayerType::Symbol),
            "raster" => Ok(LayerType::Raster),
            other => Err(Error::UnknownLayerType(other.into())),
        }
    }
}

/// One parsed style layer, immutable after load and shared read-only
/// across all tiles.
#[derive(Debug, Clone)]
pub struct StyleLayer {
    pub id: String,
    pub kind: LayerType,
    /// Wire-format layer name this style binds to.
    pub source_layer: String,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub filter: Filter,
    pub paints: Vec<VectorPaint>,
    pub symbol: Option<SymbolStyler>,
    pub visible: bool,
}

impl StyleLayer {
    pub fn new(id: impl Into<String>, kind: LayerType) -> Self {
        StyleLayer {
            id: id.into(),
            kind,
            source_layer: String::new(),
            min_zoom: 0.0,
            max_zoom: 30.0,
            filter: Filter::default(),
            paints: Vec::new(),
            symbol: None,
            visible: true,
        }
    }

    pub fn with_source_layer(mut self, source_layer: impl Into<String>) -> Self {
        self.source_layer = source_layer.into();
        self
    }

    pub fn with_zoom_range(mut self, min_zoom: f32, max_zoom: f32) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_paint(mut self, paint: VectorPaint) -> Self {
        self.paints.push(paint);
        self
    }

    pub fn with_symbol(mut self, symbol: SymbolStyler) -> Self {
        self.symbol = Some(symbol);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Visibility for a zoom level; the upper bound is exclusive.
    pub fn is_active(&self, zoom: f32) -> bool {
        self.visible && zoom >= self.min_zoom && zoom < self.max_zoom
    }
}

/// Context a style is evaluated against.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EvaluationContext {
    pub zoom: f32,
    pub scale: f32,
}

impl EvaluationContext {
    pub fn new(zoom: f32) -> Self {
        EvaluationContext { zoom, scale: 1.0 }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }
}

/// Symbol configuration of a symbol layer: an icon sprite name, a text
/// template or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolStyler {
    pub icon_image: Option<StyleProp<String>>,
    /// Template with `{key}` placeholders resolved from feature tags.
    pub text_field: Option<String>,
}

impl SymbolStyler {
    pub fn with_icon(mut self, icon_image: impl Into<StyleProp<String>>) -> Self {
        self.icon_image = Some(icon_image.into());
        self
    }

    pub fn with_text(mut self, text_field: impl Into<String>) -> Self {
        self.text_field = Some(text_field.into());
        self
    }

    pub fn has_icon(&self) -> bool {
        self.icon_image.is_some()
    }

    pub fn has_text(&self) -> bool {
        self.text_field.is_some()
    }

    /// Sprite name for a zoom level, with `{key}` placeholders resolved
    /// from the feature tags.
    pub fn icon(&self, zoom: f32, tags: &TagsCollection) -> Option<String> {
        let name = self.icon_image.as_ref()?.resolve(zoom);
        let name = replace_fields(&name, tags);
        if name.is_empty() { None } else { Some(name.into()) }
    }

    /// Formatted label text, or `None` when the template resolves to
    /// whitespace.
    pub fn text(&self, tags: &TagsCollection) -> Option<smartstring::alias::String> {
        let text = replace_fields(self.text_field.as_ref()?, tags);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.into())
        }
    }
}

/// Substitutes `{key}` spans with the matching tag value; unknown keys
/// resolve to nothing.
fn replace_fields(template: &str, tags: &TagsCollection) -> smartstring::alias::String {
    let mut out = smartstring::alias::String::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        rest = &rest[open + 1..];

        match rest.find('}') {
            Some(close) => {
                if let Some(value) = tags.get(&rest[..close]) {
                    out.push_str(&value.to_string());
                }
                rest = &rest[close + 1..];
            }
            // Unbalanced brace, keep it literally.
            None => {
                out.push('{');
                break;
            }
        }
    }

    out.push_str(rest);
    out
}
