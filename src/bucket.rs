//! Per-style-layer accumulators of renderable geometry.

use crate::clip::{ClipRect, clip_line, clip_polygon};
use crate::element::{GeometryType, VectorElement};
use crate::geometry::Point;
use crate::style::{EvaluationContext, SymbolStyler};
use crate::tags::TagValue;

/// One polyline or closed ring inside a [`TilePath`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubPath {
    pub points: Vec<Point>,
    pub closed: bool,
}

/// Clip-reduced drawable path, the crate's stand-in for a surface path
/// object. Closed sub-paths are polygon rings (holes included, relying
/// on the surface's winding/even-odd fill rule), open ones are line
/// parts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TilePath {
    subpaths: Vec<SubPath>,
}

impl TilePath {
    pub fn new() -> Self {
        TilePath::default()
    }

    pub fn is_empty(&self) -> bool {
        self.subpaths.is_empty()
    }

    pub fn point_count(&self) -> usize {
        self.subpaths.iter().map(|sub| sub.points.len()).sum()
    }

    pub fn subpaths(&self) -> &[SubPath] {
        &self.subpaths
    }

    fn push(&mut self, points: Vec<Point>, closed: bool) {
        self.subpaths.push(SubPath { points, closed });
    }
}

/// Bucket for line and fill layers: all matching features of one style
/// layer merged into a single path.
#[derive(Debug, Default)]
pub struct PathBucket {
    pub path: TilePath,
}

impl PathBucket {
    pub fn new() -> Self {
        PathBucket::default()
    }

    /// Clips the element's rings against `rect` and appends the
    /// surviving parts.
    pub fn add_element(&mut self, element: &VectorElement, rect: &ClipRect) {
        match element.geometry_type() {
            GeometryType::LineString => {
                for ring in element.rings() {
                    for part in clip_line(ring, rect) {
                        if part.len() > 1 {
                            self.path.push(part, false);
                        }
                    }
                }
            }
            GeometryType::Polygon => {
                for ring in element.rings() {
                    let clipped = clip_polygon(ring, rect);
                    if clipped.len() > 2 {
                        self.path.push(clipped, true);
                    }
                }
            }
            other => {
                log::debug!(
                    "path bucket ignoring {other} feature in layer '{}'",
                    element.layer()
                );
            }
        }
    }
}

/// A placed symbol: an icon, a label or both.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub position: Point,
    pub icon: Option<String>,
    pub text: Option<smartstring::alias::String>,
    /// Paint order hint from the feature's `rank` tag; lower ranks are
    /// more important.
    pub rank: i32,
}

impl Symbol {
    pub fn has_icon(&self) -> bool {
        self.icon.is_some()
    }

    pub fn has_text(&self) -> bool {
        self.text.is_some()
    }
}

/// Bucket for symbol layers.
#[derive(Debug, Default)]
pub struct SymbolBucket {
    pub symbols: Vec<Symbol>,
}

impl SymbolBucket {
    pub fn new() -> Self {
        SymbolBucket::default()
    }

    /// Derives symbols for every point of the element that lies within
    /// the tile; anchors outside belong to the neighbouring tile.
    pub fn add_element(
        &mut self,
        element: &VectorElement,
        styler: &SymbolStyler,
        context: &EvaluationContext,
        tile_size: f32,
    ) {
        match element.geometry_type() {
            GeometryType::Point => {
                let icon = styler.icon(context.zoom, &element.tags);
                let text = styler.text(&element.tags);
                if icon.is_none() && text.is_none() {
                    return;
                }

                let rank = element
                    .tags
                    .get("rank")
                    .and_then(TagValue::as_number)
                    .map(|rank| rank as i32)
                    .unwrap_or(0);

                for &position in element.points() {
                    if position.x < 0.0
                        || position.y < 0.0
                        || position.x > tile_size
                        || position.y > tile_size
                    {
                        continue;
                    }

                    self.symbols.push(Symbol {
                        position,
                        icon: icon.clone(),
                        text: text.clone(),
                        rank,
                    });
                }
            }
            other => {
                log::debug!(
                    "symbol bucket ignoring {other} feature in layer '{}'",
                    element.layer()
                );
            }
        }
    }
}

/// Bucket slot content of one style layer.
#[derive(Debug)]
pub enum Bucket {
    Path(PathBucket),
    Symbol(SymbolBucket),
}

impl Bucket {
    pub fn is_empty(&self) -> bool {
        match self {
            Bucket::Path(bucket) => bucket.path.is_empty(),
            Bucket::Symbol(bucket) => bucket.symbols.is_empty(),
        }
    }
}
