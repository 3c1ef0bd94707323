//! Decoding and styling pipeline for Mapbox-style binary vector tiles.
//!
//! The crate turns raw tile payloads into renderable [`tile::VectorTile`]s:
//! protobuf decoding ([`proto`]), geometry command interpretation with
//! overzoom correction ([`geometry`]), tag resolution ([`tags`]), clipping
//! against the tile rectangle ([`clip`]), style rule evaluation ([`style`])
//! and per-style-layer bucket assembly ([`bucket`], [`tile`]). The
//! [`source`] module drives the whole pipeline against a byte-level tile
//! provider, falling back to lower-zoom parent tiles when the requested
//! tile is absent.
//!
//! Fetching bytes, caching, style-document parsing and rasterization are
//! all left to the caller; the seams are the [`source::TileDataSource`]
//! and [`tile::Canvas`] traits plus programmatically built
//! [`style::StyleLayer`] records.

pub mod bucket;
pub mod clip;
pub mod element;
pub mod geometry;
pub mod proto;
pub mod source;
pub mod style;
pub mod tags;
pub mod tile;

pub use crate::element::{GeometryType, VectorElement};
pub use crate::source::{TileDataSource, VectorTileSource, YAxis};
pub use crate::style::{EvaluationContext, StyleLayer};
pub use crate::tile::{Canvas, VectorTile};

/// Slippy-map tile address.
///
/// Rows are numbered north-up ("OSM" convention, row 0 at the top of the
/// map); sources using TMS numbering are normalized by the orchestrator
/// before lookup.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct TileId {
    pub column: u32,
    pub row: u32,
    pub zoom: u8,
}

impl TileId {
    pub fn new(column: u32, row: u32, zoom: u8) -> Self {
        TileId { column, row, zoom }
    }

    /// The tile one zoom level up that covers this tile.
    pub fn parent(&self) -> Option<Self> {
        if self.zoom == 0 {
            None
        } else {
            Some(TileId {
                column: self.column / 2,
                row: self.row / 2,
                zoom: self.zoom - 1,
            })
        }
    }

    /// Converts between OSM and TMS row numbering (the flip is its own
    /// inverse).
    pub fn flip_row(self) -> Self {
        TileId {
            row: (1u32 << self.zoom) - 1 - self.row,
            ..self
        }
    }
}

/// Failures surfaced by the decode pipeline.
///
/// Wire-level failures ([`Error::Decode`], [`Error::Gzip`]) are fatal for
/// the affected tile only; the orchestrator catches them and reports the
/// tile as unavailable. The element type-state variants indicate an
/// inconsistency between the decoder and the wire format and are never
/// silently coerced. Style construction variants surface at load time.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed tile payload: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("corrupt gzip stream: {0}")]
    Gzip(#[from] std::io::Error),
    #[error("geometry type already set to {expected}, refusing {found}")]
    GeometryMismatch {
        expected: GeometryType,
        found: GeometryType,
    },
    #[error("hole ring requires a polygon element, found {0}")]
    HoleOutsidePolygon(GeometryType),
    #[error("unknown style layer type '{0}'")]
    UnknownLayerType(String),
    #[error("invalid color '{0}'")]
    InvalidColor(String),
    #[error("stops list must contain at least one stop")]
    EmptyStops,
}
