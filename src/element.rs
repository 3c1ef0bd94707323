//! Reusable decode target for one feature's geometry and tags.

use std::fmt;

use crate::Error;
use crate::geometry::Point;
use crate::proto::GeomType;
use crate::tags::TagsCollection;

/// Geometry type of a [`VectorElement`], set once per feature.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum GeometryType {
    #[default]
    Unknown,
    Point,
    LineString,
    Polygon,
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeometryType::Unknown => "Unknown",
            GeometryType::Point => "Point",
            GeometryType::LineString => "LineString",
            GeometryType::Polygon => "Polygon",
        };
        write!(f, "{name}")
    }
}

impl From<GeomType> for GeometryType {
    fn from(geom_type: GeomType) -> Self {
        match geom_type {
            GeomType::Unknown => GeometryType::Unknown,
            GeomType::Point => GeometryType::Point,
            GeomType::Linestring => GeometryType::LineString,
            GeomType::Polygon => GeometryType::Polygon,
        }
    }
}

/// Mutable decode target reused across the features of one tile parse.
///
/// Holds a flat point buffer with a parallel ring-length index (rings
/// for polygons, parts for multi-lines) plus the resolved tags. The
/// geometry type is fixed by the first `start_*` call; a conflicting
/// call afterwards is a decoder bug and fails rather than coercing.
/// Never shared across tiles.
#[derive(Debug, Default)]
pub struct VectorElement {
    layer: String,
    id: Option<u64>,
    geometry_type: GeometryType,
    points: Vec<Point>,
    ring_lens: Vec<u32>,
    pub tags: TagsCollection,
}

impl VectorElement {
    pub fn new() -> Self {
        VectorElement {
            points: Vec::with_capacity(512),
            ring_lens: vec![0],
            ..Default::default()
        }
    }

    /// Clears all state and binds the element to the next feature.
    pub fn reset(&mut self, layer: &str, id: Option<u64>) {
        self.layer.clear();
        self.layer.push_str(layer);
        self.id = id;
        self.geometry_type = GeometryType::Unknown;
        self.points.clear();
        self.ring_lens.clear();
        self.ring_lens.push(0);
        self.tags.clear();
    }

    pub fn layer(&self) -> &str {
        &self.layer
    }

    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub fn geometry_type(&self) -> GeometryType {
        self.geometry_type
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points regardless of ring boundaries.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Iterates the non-empty rings as point slices.
    pub fn rings(&self) -> impl Iterator<Item = &[Point]> {
        let mut rest = self.points.as_slice();
        self.ring_lens.iter().filter_map(move |&len| {
            if len == 0 {
                return None;
            }
            let (ring, tail) = rest.split_at(len as usize);
            rest = tail;
            Some(ring)
        })
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(point);
        if let Some(len) = self.ring_lens.last_mut() {
            *len += 1;
        }
    }

    pub fn start_point(&mut self) -> Result<(), Error> {
        self.set_or_check(GeometryType::Point)
    }

    pub fn start_line(&mut self) -> Result<(), Error> {
        self.set_or_check(GeometryType::LineString)?;
        self.break_ring();
        Ok(())
    }

    pub fn start_polygon(&mut self) -> Result<(), Error> {
        self.set_or_check(GeometryType::Polygon)?;
        self.break_ring();
        Ok(())
    }

    /// Starts a hole ring inside the most recently started polygon.
    pub fn start_hole(&mut self) -> Result<(), Error> {
        if self.geometry_type != GeometryType::Polygon {
            return Err(Error::HoleOutsidePolygon(self.geometry_type));
        }
        self.break_ring();
        Ok(())
    }

    fn break_ring(&mut self) {
        if self.ring_lens.last().copied().unwrap_or(0) > 0 {
            self.ring_lens.push(0);
        }
    }

    fn set_or_check(&mut self, geometry_type: GeometryType) -> Result<(), Error> {
        if self.geometry_type == geometry_type {
            return Ok(());
        }
        if self.geometry_type != GeometryType::Unknown {
            return Err(Error::GeometryMismatch {
                expected: self.geometry_type,
                found: geometry_type,
            });
        }
        self.geometry_type = geometry_type;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_is_fixed_by_first_start() {
        let mut element = VectorElement::new();
        element.start_point().unwrap();
        element.start_point().unwrap();

        match element.start_line() {
            Err(Error::GeometryMismatch { expected, found }) => {
                assert_eq!(expected, GeometryType::Point);
                assert_eq!(found, GeometryType::LineString);
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn hole_requires_polygon() {
        let mut element = VectorElement::new();
        element.start_line().unwrap();
        assert!(matches!(
            element.start_hole(),
            Err(Error::HoleOutsidePolygon(GeometryType::LineString))
        ));

        let mut element = VectorElement::new();
        element.start_polygon().unwrap();
        element.push(Point::new(0.0, 0.0));
        assert!(element.start_hole().is_ok());
    }

    #[test]
    fn rings_follow_start_boundaries() {
        let mut element = VectorElement::new();
        element.start_line().unwrap();
        element.push(Point::new(0.0, 0.0));
        element.push(Point::new(1.0, 0.0));
        element.start_line().unwrap();
        element.push(Point::new(2.0, 0.0));

        let rings: Vec<_> = element.rings().collect();
        assert_eq!(rings.len(), 2);
        assert_eq!(rings[0].len(), 2);
        assert_eq!(rings[1], &[Point::new(2.0, 0.0)]);
    }

    #[test]
    fn empty_ring_breaks_are_collapsed() {
        let mut element = VectorElement::new();
        element.start_polygon().unwrap();
        // No points yet: another start must not leave an empty ring.
        element.start_polygon().unwrap();
        element.push(Point::new(0.0, 0.0));

        assert_eq!(element.rings().count(), 1);
    }

    #[test]
    fn reset_clears_everything() {
        let mut element = VectorElement::new();
        element.reset("water", Some(4));
        element.start_point().unwrap();
        element.push(Point::new(3.0, 3.0));
        element.tags.insert("class", "river".into());

        element.reset("roads", None);
        assert_eq!(element.layer(), "roads");
        assert_eq!(element.id(), None);
        assert_eq!(element.geometry_type(), GeometryType::Unknown);
        assert!(element.is_empty());
        assert!(element.tags.is_empty());
    }
}
