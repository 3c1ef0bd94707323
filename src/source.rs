//! Tile data resolution and the decode pipeline.
//!
//! [`VectorTileSource`] resolves raw bytes for a tile coordinate,
//! falling back to lower-zoom parent tiles when the exact tile is
//! absent, and drives them through gzip detection, protobuf decoding,
//! per-feature geometry and tag parsing and bucket assembly, producing
//! a renderable [`VectorTile`].

use std::io::Read;
use std::sync::Arc;

use libflate::gzip;
use prost::Message;

use crate::element::VectorElement;
use crate::geometry::{self, Overzoom};
use crate::proto;
use crate::style::StyleLayer;
use crate::tags;
use crate::tile::VectorTile;
use crate::{Error, TileId};

/// gzip member header: magic bytes plus the deflate method byte.
const GZIP_SIGNATURE: [u8; 3] = [0x1f, 0x8b, 0x08];

/// Overzoom offsets are expressed in wire units of the conventional
/// 4096 extent.
const OVERZOOM_EXTENT: f32 = 4096.0;

/// Row numbering convention of a tile byte source.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum YAxis {
    /// North-up, row 0 at the top. The crate-internal convention.
    #[default]
    Osm,
    /// Row 0 at the bottom; rows are flipped before lookup.
    Tms,
}

/// Byte-level tile provider: a network fetcher, tile archive or cache
/// living outside this crate.
pub trait TileDataSource {
    /// Raw (possibly gzip-compressed) tile bytes, or `None` when the
    /// source has no data for this coordinate.
    fn get_tile(&mut self, tile: TileId) -> Option<Vec<u8>>;

    fn y_axis(&self) -> YAxis {
        YAxis::Osm
    }
}

/// Decodes tiles from a byte source against a shared style-layer list.
pub struct VectorTileSource<S> {
    source: S,
    style: Arc<Vec<StyleLayer>>,
    tile_size: u32,
}

impl<S: TileDataSource> VectorTileSource<S> {
    pub fn new(source: S, style: impl Into<Arc<Vec<StyleLayer>>>, tile_size: u32) -> Self {
        VectorTileSource {
            source,
            style: style.into(),
            tile_size,
        }
    }

    pub fn style(&self) -> &Arc<Vec<StyleLayer>> {
        &self.style
    }

    /// Like [`Self::load_tile`], but with per-tile failure isolation:
    /// a corrupt payload is logged and reported as "no tile" so one bad
    /// tile never takes down the pipeline.
    pub fn query_tile(&mut self, tile_id: TileId) -> Option<VectorTile> {
        match self.load_tile(tile_id) {
            Ok(tile) => tile,
            Err(err) => {
                log::error!(
                    "dropping tile {}/{}/{}: {err}",
                    tile_id.zoom,
                    tile_id.column,
                    tile_id.row
                );
                None
            }
        }
    }

    /// Resolves and decodes one tile. `Ok(None)` means no data exists
    /// for the coordinate or any of its ancestors, which is common at
    /// the data boundary and rendered as empty.
    pub fn load_tile(&mut self, tile_id: TileId) -> Result<Option<VectorTile>, Error> {
        let Some((data, overzoom, levels)) = self.resolve_data(tile_id) else {
            return Ok(None);
        };

        let data = decompress(data)?;
        let wire = proto::Tile::decode(data.as_slice())?;

        let mut tile = VectorTile::new(tile_id, self.tile_size, self.style.clone(), levels);
        let mut element = VectorElement::new();

        for layer in &wire.layers {
            let extent = if layer.extent == 0 { 4096 } else { layer.extent };
            let output_scale = self.tile_size as f32 / extent as f32;

            for feature in &layer.features {
                parse_feature(&mut element, layer, feature, overzoom, output_scale)?;
                tile.process(&element);
            }
        }

        Ok(Some(tile))
    }

    fn fetch(&mut self, tile: TileId) -> Option<Vec<u8>> {
        let tile = match self.source.y_axis() {
            YAxis::Osm => tile,
            YAxis::Tms => tile.flip_row(),
        };
        self.source.get_tile(tile)
    }

    /// Exact-zoom fetch with ancestor fallback.
    ///
    /// Each step halves column and row. A hit `levels` zoom steps up
    /// covers `2^levels` tiles per axis, so the requested tile occupies
    /// the sub-window selected by the low `levels` bits of its own
    /// coordinate; the offsets place that sub-window in wire units.
    /// A miss at zoom 0 is a terminal miss.
    fn resolve_data(&mut self, tile: TileId) -> Option<(Vec<u8>, Overzoom, u8)> {
        if let Some(data) = self.fetch(tile) {
            return Some((data, Overzoom::NONE, 0));
        }

        for levels in 1..=tile.zoom {
            let ancestor = TileId::new(
                tile.column >> levels,
                tile.row >> levels,
                tile.zoom - levels,
            );
            let Some(data) = self.fetch(ancestor) else {
                continue;
            };

            let scale = 1u32 << levels;
            let mask = scale - 1;
            let overzoom = Overzoom {
                scale,
                offset_x: (tile.column & mask) as f32 * OVERZOOM_EXTENT,
                offset_y: (tile.row & mask) as f32 * OVERZOOM_EXTENT,
            };

            return Some((data, overzoom, levels));
        }

        None
    }
}

/// Inflates gzip payloads, passing everything else through untouched.
fn decompress(data: Vec<u8>) -> Result<Vec<u8>, Error> {
    if !data.starts_with(&GZIP_SIGNATURE) {
        return Ok(data);
    }

    let mut decoder = gzip::Decoder::new(data.as_slice())?;
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    Ok(decompressed)
}

/// Decodes one wire feature into the reusable element: geometry rings
/// with overzoom correction and output scaling, ring/hole separation
/// for polygons, and resolved tags.
fn parse_feature(
    element: &mut VectorElement,
    layer: &proto::Layer,
    feature: &proto::Feature,
    overzoom: Overzoom,
    output_scale: f32,
) -> Result<(), Error> {
    element.reset(&layer.name, feature.id);
    tags::resolve_tags(&layer.keys, &layer.values, &feature.tags, &mut element.tags);

    let geom_type = feature.r#type();
    let rings = geometry::decode_rings(&feature.geometry, geom_type, overzoom, output_scale);

    match geom_type {
        proto::GeomType::Point => {
            element.start_point()?;
            for ring in &rings {
                for &point in ring {
                    element.push(point);
                }
            }
        }
        proto::GeomType::Linestring => {
            for ring in rings {
                element.start_line()?;
                for point in ring {
                    element.push(point);
                }
            }
        }
        proto::GeomType::Polygon => {
            let mut have_exterior = false;
            for mut ring in rings {
                // Guard against encoders that omit the closing point.
                if let Some(first) = ring.first().copied()
                    && ring.last() != Some(&first)
                {
                    ring.push(first);
                }

                // Negative signed area marks a counter-clockwise ring: a
                // hole in the most recently started polygon.
                if geometry::signed_area(&ring) < 0.0 && have_exterior {
                    element.start_hole()?;
                } else {
                    element.start_polygon()?;
                    have_exterior = true;
                }

                for point in ring {
                    element.push(point);
                }
            }
        }
        proto::GeomType::Unknown => {
            log::debug!(
                "feature {:?} in layer '{}' has unknown geometry type",
                feature.id,
                layer.name
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;
    use crate::bucket::Bucket;
    use crate::element::GeometryType;
    use crate::style::{Color, Filter, LayerType, VectorPaint};

    #[derive(Default)]
    struct MapSource {
        tiles: HashMap<TileId, Vec<u8>>,
        y_axis: YAxis,
    }

    impl TileDataSource for MapSource {
        fn get_tile(&mut self, tile: TileId) -> Option<Vec<u8>> {
            self.tiles.get(&tile).cloned()
        }

        fn y_axis(&self) -> YAxis {
            self.y_axis
        }
    }

    /// Square polygon covering the lower-right quadrant of the wire
    /// extent: MoveTo(2048,2048), three LineTos, ClosePath.
    fn quadrant_polygon() -> Vec<u32> {
        vec![9, 4096, 4096, 26, 4096, 0, 0, 4096, 4095, 0, 15]
    }

    fn water_tile() -> proto::Tile {
        proto::Tile {
            layers: vec![proto::Layer {
                version: 2,
                name: "water".into(),
                features: vec![proto::Feature {
                    id: Some(1),
                    tags: vec![0, 0],
                    r#type: Some(proto::GeomType::Polygon as i32),
                    geometry: quadrant_polygon(),
                }],
                keys: vec!["class".into()],
                values: vec![proto::Value::string("lake")],
                extent: 4096,
            }],
        }
    }

    fn fill_style(source_layer: &str) -> Vec<StyleLayer> {
        vec![
            StyleLayer::new("water", LayerType::Fill)
                .with_source_layer(source_layer)
                .with_paint(VectorPaint::fill(Color::from_rgb8(0, 0, 255))),
        ]
    }

    #[test]
    fn transport_miss_is_not_an_error() {
        let mut source = VectorTileSource::new(MapSource::default(), fill_style("water"), 256);
        assert!(source.load_tile(TileId::new(3, 5, 4)).unwrap().is_none());
    }

    #[test]
    fn malformed_payload_is_isolated() {
        let mut map = MapSource::default();
        map.tiles
            .insert(TileId::new(0, 0, 0), vec![0xde, 0xad, 0xbe, 0xef]);

        let mut source = VectorTileSource::new(map, fill_style("water"), 256);
        assert!(source.load_tile(TileId::new(0, 0, 0)).is_err());
        // The isolating boundary converts the failure to a miss.
        assert!(source.query_tile(TileId::new(0, 0, 0)).is_none());
    }

    #[test]
    fn gzip_payloads_are_detected_and_inflated() {
        let plain = water_tile().encode_to_vec();

        let mut encoder = gzip::Encoder::new(Vec::new()).unwrap();
        encoder.write_all(&plain).unwrap();
        let compressed = encoder.finish().into_result().unwrap();
        assert!(compressed.starts_with(&GZIP_SIGNATURE));

        let mut map = MapSource::default();
        map.tiles.insert(TileId::new(0, 0, 0), compressed);

        let mut source = VectorTileSource::new(map, fill_style("water"), 256);
        let tile = source.load_tile(TileId::new(0, 0, 0)).unwrap().unwrap();
        assert!(matches!(&tile.buckets()[0], Some(bucket) if !bucket.is_empty()));
    }

    #[test]
    fn ancestor_fallback_builds_the_overzoom_window() {
        // Only the root tile has data; request the bottom-right tile two
        // levels below it.
        let mut map = MapSource::default();
        map.tiles
            .insert(TileId::new(0, 0, 0), water_tile().encode_to_vec());

        let mut source = VectorTileSource::new(map, fill_style("water"), 256);
        let (_, overzoom, levels) = source.resolve_data(TileId::new(3, 3, 2)).unwrap();

        assert_eq!(levels, 2);
        assert_eq!(overzoom.scale, 4);
        assert_eq!(overzoom.offset_x, 3.0 * 4096.0);
        assert_eq!(overzoom.offset_y, 3.0 * 4096.0);

        // The polygon covers wire coordinates 2048..4096, which is the
        // root's bottom-right quadrant: exactly the requested tile, so
        // the overzoomed output spans the full 256px tile.
        let tile = source.query_tile(TileId::new(3, 3, 2)).unwrap();
        assert_eq!(tile.overzoom(), 2);
        match &tile.buckets()[0] {
            Some(Bucket::Path(bucket)) => {
                let points = &bucket.path.subpaths()[0].points;
                assert!(points.iter().any(|p| p.x <= 0.0 && p.y <= 0.0));
                assert!(points.iter().any(|p| p.x >= 256.0 && p.y >= 256.0));
            }
            other => panic!("expected path bucket, got {other:?}"),
        }

        // A sibling quadrant of the same ancestor sees nothing of the
        // polygon.
        let tile = source.query_tile(TileId::new(0, 0, 2)).unwrap();
        assert!(matches!(&tile.buckets()[0], Some(bucket) if bucket.is_empty()));
    }

    #[test]
    fn tms_sources_flip_rows_before_lookup() {
        let mut map = MapSource {
            y_axis: YAxis::Tms,
            ..Default::default()
        };
        // OSM row 1 at zoom 2 is TMS row 2.
        map.tiles
            .insert(TileId::new(2, 2, 2), water_tile().encode_to_vec());

        let mut source = VectorTileSource::new(map, fill_style("water"), 256);
        assert!(source.load_tile(TileId::new(2, 1, 2)).unwrap().is_some());
        assert!(source.load_tile(TileId::new(2, 2, 2)).unwrap().is_none());
    }

    #[test]
    fn polygon_holes_are_separated_by_winding() {
        let layer = proto::Layer {
            version: 2,
            name: "water".into(),
            features: vec![proto::Feature {
                id: None,
                tags: Vec::new(),
                r#type: Some(proto::GeomType::Polygon as i32),
                // Clockwise 10x10 square at (0,0), then a
                // counter-clockwise 4x4 square inside it.
                geometry: vec![
                    9, 0, 0, 26, 20, 0, 0, 20, 19, 0, 15, // exterior
                    9, 4, 13, 26, 0, 8, 10, 0, 0, 7, 15, // hole
                ],
            }],
            keys: Vec::new(),
            values: Vec::new(),
            extent: 4096,
        };

        let mut element = VectorElement::new();
        parse_feature(
            &mut element,
            &layer,
            &layer.features[0],
            Overzoom::NONE,
            1.0,
        )
        .unwrap();

        assert_eq!(element.geometry_type(), GeometryType::Polygon);
        let rings: Vec<_> = element.rings().collect();
        assert_eq!(rings.len(), 2);
        assert!(geometry::signed_area(rings[0]) > 0.0);
        assert!(geometry::signed_area(rings[1]) < 0.0);
    }

    #[test]
    fn end_to_end_two_layers_two_buckets() {
        let wire = proto::Tile {
            layers: vec![
                water_tile().layers.remove(0),
                proto::Layer {
                    version: 2,
                    name: "road".into(),
                    features: vec![proto::Feature {
                        id: Some(2),
                        tags: vec![0, 0],
                        r#type: Some(proto::GeomType::Linestring as i32),
                        // MoveTo(0,2048), LineTo(4096,2048).
                        geometry: vec![9, 0, 4096, 10, 8192, 0],
                    }],
                    keys: vec!["class".into()],
                    values: vec![proto::Value::string("primary")],
                    extent: 4096,
                },
            ],
        };

        let style = vec![
            StyleLayer::new("water", LayerType::Fill)
                .with_source_layer("water")
                .with_filter(Filter::Equals("class".into(), "lake".into()))
                .with_paint(VectorPaint::fill(Color::from_rgb8(0, 0, 255)))
                .with_paint(VectorPaint::stroke(Color::BLACK, 1.0)),
            StyleLayer::new("roads", LayerType::Line)
                .with_source_layer("road")
                .with_paint(VectorPaint::stroke(Color::BLACK, 2.0)),
        ];

        let mut map = MapSource::default();
        map.tiles.insert(TileId::new(0, 0, 0), wire.encode_to_vec());

        let mut source = VectorTileSource::new(map, style, 256);
        let tile = source.load_tile(TileId::new(0, 0, 0)).unwrap().unwrap();

        let buckets: Vec<_> = tile.buckets().iter().flatten().collect();
        assert_eq!(buckets.len(), 2);
        assert!(buckets.iter().all(|bucket| !bucket.is_empty()));

        assert_eq!(tile.overzoom(), 0);
        assert_eq!(source.style()[0].paints.len(), 2);
        assert_eq!(source.style()[1].paints.len(), 1);
    }
}
