//! Renderable tile assembly and the drawing contract.

use std::sync::Arc;

use crate::TileId;
use crate::bucket::{Bucket, PathBucket, Symbol, SymbolBucket, TilePath};
use crate::clip::ClipRect;
use crate::element::{GeometryType, VectorElement};
use crate::style::{EvaluationContext, LayerType, PaintProperties, StyleLayer};

/// Padding around the drawing bounds so clipped geometry never causes
/// visible seams between neighbouring tiles.
const CLIP_PADDING: f32 = 1.0;

/// Opaque drawing surface supplied by the rendering collaborator at
/// draw time.
pub trait Canvas {
    fn draw_path(&mut self, path: &TilePath, paint: &PaintProperties);
    fn fill_rect(&mut self, rect: &ClipRect, paint: &PaintProperties);
    fn draw_symbol(&mut self, symbol: &Symbol);
}

/// A decoded, styled, renderable tile.
///
/// Buckets are created lazily, one optional slot per style layer, and
/// drawn in style order. The tile is owned by the decode task that
/// builds it and can be handed to a render thread afterwards.
pub struct VectorTile {
    tile_id: TileId,
    tile_size: f32,
    zoom: f32,
    overzoom: u8,
    clip_rect: ClipRect,
    style: Arc<Vec<StyleLayer>>,
    buckets: Vec<Option<Bucket>>,
    context: EvaluationContext,
}

impl VectorTile {
    pub fn new(tile_id: TileId, tile_size: u32, style: Arc<Vec<StyleLayer>>, overzoom: u8) -> Self {
        let zoom = tile_id.zoom as f32;
        let buckets = style.iter().map(|_| None).collect();

        VectorTile {
            tile_id,
            tile_size: tile_size as f32,
            zoom,
            overzoom,
            clip_rect: ClipRect::padded(tile_size as f32, CLIP_PADDING),
            style,
            buckets,
            context: EvaluationContext::new(zoom),
        }
    }

    pub fn tile_id(&self) -> TileId {
        self.tile_id
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Number of zoom levels between this tile and the parent tile that
    /// provided its data; 0 for an exact hit.
    pub fn overzoom(&self) -> u8 {
        self.overzoom
    }

    pub fn clip_rect(&self) -> ClipRect {
        self.clip_rect
    }

    /// Bucket slots indexed by style-layer position.
    pub fn buckets(&self) -> &[Option<Bucket>] {
        &self.buckets
    }

    /// Routes one decoded element into the buckets of every style layer
    /// that accepts it.
    pub fn process(&mut self, element: &VectorElement) {
        let style = self.style.clone();

        for (index, layer) in style.iter().enumerate() {
            if !layer.is_active(self.zoom) {
                continue;
            }
            if layer.source_layer != element.layer() {
                continue;
            }
            if !layer.filter.eval(element) {
                continue;
            }

            match layer.kind {
                LayerType::Symbol => {
                    let Some(styler) = layer.symbol.as_ref() else {
                        continue;
                    };
                    let bucket = self.buckets[index]
                        .get_or_insert_with(|| Bucket::Symbol(SymbolBucket::new()));
                    if let Bucket::Symbol(bucket) = bucket {
                        bucket.add_element(element, styler, &self.context, self.tile_size);
                    }
                }
                LayerType::Line | LayerType::Fill => {
                    if !matches!(
                        element.geometry_type(),
                        GeometryType::LineString | GeometryType::Polygon
                    ) {
                        // Attribute-only features, e.g. building heights
                        // encoded as points.
                        log::debug!(
                            "skipping {} feature for style layer '{}'",
                            element.geometry_type(),
                            layer.id
                        );
                        continue;
                    }
                    let bucket =
                        self.buckets[index].get_or_insert_with(|| Bucket::Path(PathBucket::new()));
                    if let Bucket::Path(bucket) = bucket {
                        bucket.add_element(element, &self.clip_rect);
                    }
                }
                // Background layers carry no features; raster data never
                // enters this pipeline.
                LayerType::Background | LayerType::Raster => {}
            }
        }
    }

    /// Draws the buckets in style-layer order.
    pub fn draw(&self, canvas: &mut dyn Canvas, context: &EvaluationContext) {
        for (layer, bucket) in self.style.iter().zip(&self.buckets) {
            if layer.kind == LayerType::Background && layer.visible {
                for paint in &layer.paints {
                    canvas.fill_rect(&self.clip_rect, &paint.properties(context));
                }
                continue;
            }

            let Some(bucket) = bucket else {
                continue;
            };

            match bucket {
                Bucket::Path(path_bucket) => {
                    if path_bucket.path.is_empty() {
                        continue;
                    }
                    for paint in &layer.paints {
                        canvas.draw_path(&path_bucket.path, &paint.properties(context));
                    }
                }
                Bucket::Symbol(symbol_bucket) => {
                    for symbol in &symbol_bucket.symbols {
                        canvas.draw_symbol(symbol);
                    }
                }
            }
        }
    }
}
