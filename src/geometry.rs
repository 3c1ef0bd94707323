//! Geometry command stream decoding.
//!
//! Feature geometry arrives as a stream of command integers
//! `(count << 3) | command` followed by zigzag-encoded coordinate
//! deltas. [`CommandIter`] unpacks that stream; [`decode_rings`] turns
//! it into absolute point rings, applying the overzoom correction for
//! tiles backed by lower-zoom parent data.

use crate::proto::GeomType;

const CMD_MOVE_TO: u32 = 1;
const CMD_LINE_TO: u32 = 2;
const CMD_CLOSE_PATH: u32 = 7;

/// A point in output (tile pixel) coordinates.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Point { x, y }
    }
}

/// Maps signed integers to unsigned ones so small magnitudes stay small
/// on the wire.
pub fn zigzag_decode(n: u32) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

/// Correction applied when a tile is rendered from lower-zoom parent
/// data.
///
/// `scale` is the power-of-two zoom difference and the offsets select
/// the requested tile's sub-window, in wire units. Exact-zoom tiles use
/// [`Overzoom::NONE`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Overzoom {
    pub scale: u32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Overzoom {
    pub const NONE: Overzoom = Overzoom {
        scale: 1,
        offset_x: 0.0,
        offset_y: 0.0,
    };

    /// Transforms an accumulated wire-space cursor into output
    /// coordinates. The order (scale by overzoom, subtract the offset,
    /// then scale to output units) must not be rearranged.
    fn apply(&self, x: i64, y: i64, output_scale: f32) -> Point {
        let px = (x as f64 * self.scale as f64 - self.offset_x as f64) * output_scale as f64;
        let py = (y as f64 * self.scale as f64 - self.offset_y as f64) * output_scale as f64;
        Point::new(px as f32, py as f32)
    }
}

/// A decoded geometry command carrying zigzag-decoded deltas.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    MoveTo(i64, i64),
    LineTo(i64, i64),
    ClosePath,
}

/// Iterator over the commands of one feature's geometry stream.
///
/// Malformed command ids and truncated parameter lists terminate the
/// iteration with a logged error; the protobuf container was already
/// validated, so this only triggers on encoder bugs.
pub struct CommandIter<'a> {
    geometry: &'a [u32],
    index: usize,
    command: u32,
    remaining: u32,
}

impl<'a> CommandIter<'a> {
    pub fn new(geometry: &'a [u32]) -> Self {
        CommandIter {
            geometry,
            index: 0,
            command: 0,
            remaining: 0,
        }
    }

    fn param(&mut self) -> Option<i64> {
        let raw = *self.geometry.get(self.index)?;
        self.index += 1;
        Some(zigzag_decode(raw))
    }

    fn delta(&mut self) -> Option<(i64, i64)> {
        match (self.param(), self.param()) {
            (Some(dx), Some(dy)) => Some((dx, dy)),
            _ => {
                log::warn!("geometry stream truncated inside a command parameter list");
                None
            }
        }
    }
}

impl Iterator for CommandIter<'_> {
    type Item = Command;

    fn next(&mut self) -> Option<Command> {
        loop {
            if self.remaining == 0 {
                let next = *self.geometry.get(self.index)?;
                self.index += 1;
                self.command = next & 7;
                self.remaining = next >> 3;
                continue;
            }

            self.remaining -= 1;

            match self.command {
                CMD_MOVE_TO => {
                    let (dx, dy) = self.delta()?;
                    return Some(Command::MoveTo(dx, dy));
                }
                CMD_LINE_TO => {
                    let (dx, dy) = self.delta()?;
                    return Some(Command::LineTo(dx, dy));
                }
                CMD_CLOSE_PATH => return Some(Command::ClosePath),
                id => {
                    log::error!("invalid geometry command id {id}");
                    self.index = self.geometry.len();
                    self.remaining = 0;
                    return None;
                }
            }
        }
    }
}

/// Decodes a geometry stream into absolute point rings.
///
/// Each `MoveTo` starts a new ring while the cursor keeps accumulating
/// deltas across the whole feature. `ClosePath` re-appends the ring's
/// first point for non-point geometry. Empty rings are dropped.
pub fn decode_rings(
    geometry: &[u32],
    geom_type: GeomType,
    overzoom: Overzoom,
    output_scale: f32,
) -> Vec<Vec<Point>> {
    let mut rings: Vec<Vec<Point>> = Vec::new();
    let (mut x, mut y) = (0i64, 0i64);

    for command in CommandIter::new(geometry) {
        match command {
            Command::MoveTo(dx, dy) => {
                x += dx;
                y += dy;
                rings.push(vec![overzoom.apply(x, y, output_scale)]);
            }
            Command::LineTo(dx, dy) => {
                x += dx;
                y += dy;
                let point = overzoom.apply(x, y, output_scale);
                match rings.last_mut() {
                    Some(ring) => ring.push(point),
                    // A LineTo before any MoveTo is malformed; recover by
                    // opening a ring at the cursor.
                    None => rings.push(vec![point]),
                }
            }
            Command::ClosePath => {
                if geom_type != GeomType::Point
                    && let Some(ring) = rings.last_mut()
                    && let Some(first) = ring.first().copied()
                {
                    ring.push(first);
                }
            }
        }
    }

    rings.retain(|ring| !ring.is_empty());
    rings
}

/// Twice-signed-area shoelace sum, halved.
///
/// In the tile's y-down coordinate space a visually clockwise ring has
/// positive area (an exterior ring); counter-clockwise rings are holes.
/// Open rings are closed implicitly.
pub fn signed_area(ring: &[Point]) -> f32 {
    let mut sum = 0.0f64;
    for pair in ring.windows(2) {
        sum += pair[0].x as f64 * pair[1].y as f64 - pair[1].x as f64 * pair[0].y as f64;
    }
    if let (Some(first), Some(last)) = (ring.first(), ring.last())
        && first != last
    {
        sum += last.x as f64 * first.y as f64 - first.x as f64 * last.y as f64;
    }
    (sum / 2.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zigzag_encode(v: i64) -> u32 {
        ((v << 1) ^ (v >> 63)) as u32
    }

    #[test]
    fn zigzag_roundtrip() {
        for v in [-4096, -257, -2, -1, 0, 1, 2, 100, 4095, 1 << 20] {
            assert_eq!(zigzag_decode(zigzag_encode(v)), v);
        }
        assert_eq!(zigzag_decode(0), 0);
        assert_eq!(zigzag_decode(1), -1);
        assert_eq!(zigzag_decode(2), 1);
        assert_eq!(zigzag_decode(3), -2);
    }

    #[test]
    fn command_iter_basics() {
        assert_eq!(CommandIter::new(&[]).next(), None);

        let mut iter = CommandIter::new(&[9, 50, 34]);
        assert_eq!(iter.next(), Some(Command::MoveTo(25, 17)));
        assert_eq!(iter.next(), None);

        let mut iter = CommandIter::new(&[(2 << 3) | 2, 2, 4, 6, 8]);
        assert_eq!(iter.next(), Some(Command::LineTo(1, 2)));
        assert_eq!(iter.next(), Some(Command::LineTo(3, 4)));
        assert_eq!(iter.next(), None);

        let mut iter = CommandIter::new(&[15]);
        assert_eq!(iter.next(), Some(Command::ClosePath));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn command_iter_stops_on_bad_id() {
        // Command id 3 is not part of the encoding.
        let mut iter = CommandIter::new(&[9, 2, 2, (1 << 3) | 3, 0, 0]);
        assert_eq!(iter.next(), Some(Command::MoveTo(1, 1)));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn command_iter_truncated_params() {
        let mut iter = CommandIter::new(&[(2 << 3) | 1, 2, 2, 6]);
        assert_eq!(iter.next(), Some(Command::MoveTo(1, 1)));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn simple_polygon_ring() {
        // MoveTo(0,0); LineTo(10,0),(0,10),(-10,0); ClosePath.
        let geometry = [9, 0, 0, 26, 20, 0, 0, 20, 19, 0, 15];
        let rings = decode_rings(&geometry, GeomType::Polygon, Overzoom::NONE, 1.0);

        assert_eq!(rings.len(), 1);
        assert_eq!(
            rings[0],
            vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
                Point::new(0.0, 0.0),
            ]
        );
    }

    #[test]
    fn multipoint_yields_one_ring_per_point() {
        // MoveTo with count 2: (5,7) then (3,2) relative to the first.
        let geometry = [(2 << 3) | 1, 10, 14, 6, 4];
        let rings = decode_rings(&geometry, GeomType::Point, Overzoom::NONE, 1.0);

        assert_eq!(rings.len(), 2);
        assert_eq!(rings[0], vec![Point::new(5.0, 7.0)]);
        assert_eq!(rings[1], vec![Point::new(8.0, 9.0)]);
    }

    #[test]
    fn close_path_skipped_for_points_and_empty_rings() {
        let rings = decode_rings(&[9, 2, 2, 15], GeomType::Point, Overzoom::NONE, 1.0);
        assert_eq!(rings, vec![vec![Point::new(1.0, 1.0)]]);

        // A bare ClosePath opens nothing and is dropped.
        let rings = decode_rings(&[15], GeomType::Polygon, Overzoom::NONE, 1.0);
        assert!(rings.is_empty());
    }

    #[test]
    fn cursor_accumulates_across_rings() {
        // Two line parts; the second MoveTo is relative to the end of the
        // first part, not to the tile origin.
        let geometry = [9, 0, 0, 10, 20, 0, 9, 2, 2, 10, 4, 0];
        let rings = decode_rings(&geometry, GeomType::Linestring, Overzoom::NONE, 1.0);

        assert_eq!(rings.len(), 2);
        assert_eq!(rings[0], vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
        assert_eq!(rings[1], vec![Point::new(11.0, 1.0), Point::new(13.0, 1.0)]);
    }

    #[test]
    fn overzoom_transform_order() {
        let overzoom = Overzoom {
            scale: 2,
            offset_x: 4096.0,
            offset_y: 0.0,
        };
        // Cursor (2048, 2048): scale first, subtract second.
        let geometry = [9, zigzag_encode(2048), zigzag_encode(2048)];
        let rings = decode_rings(&geometry, GeomType::Point, overzoom, 1.0);
        assert_eq!(rings[0][0], Point::new(0.0, 4096.0));

        // Output scaling applies last.
        let rings = decode_rings(&geometry, GeomType::Point, overzoom, 0.125);
        assert_eq!(rings[0][0], Point::new(0.0, 512.0));
    }

    #[test]
    fn shoelace_signs() {
        // Clockwise on a y-down screen: right, down, left, up.
        let clockwise = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert_eq!(signed_area(&clockwise), 100.0);

        let mut counter: Vec<Point> = clockwise.to_vec();
        counter.reverse();
        assert_eq!(signed_area(&counter), -100.0);
    }
}
