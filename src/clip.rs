//! Clipping of decoded geometry against the tile rectangle.
//!
//! Lines go through Liang–Barsky parametric clipping with merging of
//! chained segments; polygon rings go through Sutherland–Hodgman against
//! the four rectangle edges. Both are pure functions and safe to run
//! concurrently on independent inputs.

use crate::geometry::Point;

/// Clip rectangle in output coordinates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClipRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl ClipRect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        ClipRect {
            left,
            top,
            right,
            bottom,
        }
    }

    /// A tile's drawing bounds expanded by `padding` on every side, so
    /// clipped geometry never produces visible seams at tile edges.
    pub fn padded(size: f32, padding: f32) -> Self {
        ClipRect::new(-padding, -padding, size + padding, size + padding)
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// Outcome of clipping one segment.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SegmentClip {
    /// Entirely outside the rectangle; the segment is dropped.
    Outside,
    /// Entirely inside; both endpoints are kept unmodified.
    Inside,
    /// Crosses the boundary; one or both endpoints were replaced with
    /// the computed intersection.
    Clipped { start: Point, end: Point },
}

/// Liang–Barsky clip of the segment `start..end`.
pub fn clip_segment(start: Point, end: Point, rect: &ClipRect) -> SegmentClip {
    let vx = end.x - start.x;
    let vy = end.y - start.y;
    let p = [-vx, vx, -vy, vy];
    let q = [
        start.x - rect.left,
        rect.right - start.x,
        start.y - rect.top,
        rect.bottom - start.y,
    ];

    let mut u1 = f32::NEG_INFINITY;
    let mut u2 = f32::INFINITY;

    for i in 0..4 {
        if p[i] == 0.0 {
            // Parallel to this edge: outside the half-plane means no
            // intersection can exist.
            if q[i] < 0.0 {
                return SegmentClip::Outside;
            }
        } else {
            let t = q[i] / p[i];
            if p[i] < 0.0 {
                u1 = u1.max(t);
            } else {
                u2 = u2.min(t);
            }
        }
    }

    if u1 > u2 {
        return SegmentClip::Outside;
    }
    if u1 < 0.0 && u2 > 1.0 {
        return SegmentClip::Inside;
    }

    let t0 = u1.max(0.0);
    let t1 = u2.min(1.0);
    if t0 > t1 {
        return SegmentClip::Outside;
    }

    SegmentClip::Clipped {
        start: Point::new(start.x + t0 * vx, start.y + t0 * vy),
        end: Point::new(start.x + t1 * vx, start.y + t1 * vy),
    }
}

/// Clips a polyline, merging chained segments back into polylines.
///
/// Consecutive kept segments whose endpoints touch stay in one output
/// part; a clipped-away gap starts a new part.
pub fn clip_line(points: &[Point], rect: &ClipRect) -> Vec<Vec<Point>> {
    let mut parts: Vec<Vec<Point>> = Vec::new();
    let mut last_end: Option<Point> = None;

    for pair in points.windows(2) {
        let (start, end) = match clip_segment(pair[0], pair[1], rect) {
            SegmentClip::Outside => continue,
            SegmentClip::Inside => (pair[0], pair[1]),
            SegmentClip::Clipped { start, end } => (start, end),
        };

        if last_end != Some(start) {
            parts.push(vec![start]);
        }
        if let Some(part) = parts.last_mut() {
            part.push(end);
        }
        last_end = Some(end);
    }

    parts
}

#[derive(Debug, Copy, Clone)]
enum Edge {
    Left,
    Top,
    Right,
    Bottom,
}

impl Edge {
    fn inside(&self, point: Point, rect: &ClipRect) -> bool {
        match self {
            Edge::Left => point.x > rect.left,
            Edge::Top => point.y > rect.top,
            Edge::Right => point.x < rect.right,
            Edge::Bottom => point.y < rect.bottom,
        }
    }

    fn intersect(&self, start: Point, end: Point, rect: &ClipRect) -> Point {
        match self {
            Edge::Left => Point::new(
                rect.left,
                start.y + (rect.left - start.x) / (end.x - start.x) * (end.y - start.y),
            ),
            Edge::Top => Point::new(
                start.x + (rect.top - start.y) / (end.y - start.y) * (end.x - start.x),
                rect.top,
            ),
            Edge::Right => Point::new(
                rect.right,
                start.y + (rect.right - start.x) / (end.x - start.x) * (end.y - start.y),
            ),
            Edge::Bottom => Point::new(
                start.x + (rect.bottom - start.y) / (end.y - start.y) * (end.x - start.x),
                rect.bottom,
            ),
        }
    }
}

/// Sutherland–Hodgman clip of a polygon ring.
///
/// Processes the edges in the fixed order left, top, right, bottom; an
/// empty intermediate result short-circuits to an empty ring.
pub fn clip_polygon(ring: &[Point], rect: &ClipRect) -> Vec<Point> {
    let mut input = ring.to_vec();
    let mut output: Vec<Point> = Vec::with_capacity(ring.len() + 4);

    for edge in [Edge::Left, Edge::Top, Edge::Right, Edge::Bottom] {
        if input.is_empty() {
            return Vec::new();
        }

        output.clear();
        let mut start = input[input.len() - 1];

        for &end in input.iter() {
            if edge.inside(end, rect) {
                if !edge.inside(start, rect) {
                    output.push(edge.intersect(start, end, rect));
                }
                output.push(end);
            } else if edge.inside(start, rect) {
                output.push(edge.intersect(start, end, rect));
            }
            start = end;
        }

        std::mem::swap(&mut input, &mut output);
    }

    input
}
