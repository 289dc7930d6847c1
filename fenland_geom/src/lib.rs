// Planar geometry primitives for the Fenland terrain grid.
//
// Everything here works on axis-aligned rectangles (terrain cells) and
// discs (patch footprints and perception ranges). Coverage of a cell by a
// patch is classified into four ordered levels; the area of a disc/rect
// overlap is computed by polygonizing the disc and clipping it against the
// rectangle (Sutherland-Hodgman), then measuring the clipped polygon with
// the shoelace formula.
//
// **Critical constraint: determinism.** All functions are pure and use only
// IEEE f64 arithmetic in a fixed evaluation order, so the same inputs give
// the same classification on every platform. Do not introduce randomized
// sampling or platform-dependent math here.

use serde::{Deserialize, Serialize};

/// Number of vertices used when a disc is approximated by a polygon for
/// area computations. More points means a tighter area estimate at the
/// cost of a longer clipping pass per cell.
pub const POINTS_PER_CIRCLE: usize = 32;

/// Slack applied when comparing area fractions against exact thresholds,
/// absorbing the accumulated rounding of the clipping pass.
const AREA_EPSILON: f64 = 1e-9;

/// A point or offset in world space, in the same length unit as cell sizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Vec2) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// An axis-aligned rectangle, stored as min/max corners with `min <= max`
/// on both axes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AaRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl AaRect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        debug_assert!(min.x <= max.x && min.y <= max.y);
        Self { min, max }
    }

    /// Rectangle from its lower-left corner and a side length per axis.
    pub fn from_origin_size(origin: Vec2, width: f64, height: f64) -> Self {
        Self::new(origin, Vec2::new(origin.x + width, origin.y + height))
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
        )
    }

    /// Corners in counter-clockwise order starting from `min`.
    pub fn corners(&self) -> [Vec2; 4] {
        [
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
            Vec2::new(self.min.x, self.max.y),
        ]
    }

    /// Closed containment: points on the boundary count as inside.
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// True when `other` lies entirely inside `self` (boundaries allowed).
    pub fn contains_rect(&self, other: &AaRect) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    /// Area of the overlap between two axis-aligned rectangles, zero when
    /// they are disjoint.
    pub fn intersection_area(&self, other: &AaRect) -> f64 {
        let w = self.max.x.min(other.max.x) - self.min.x.max(other.min.x);
        let h = self.max.y.min(other.max.y) - self.min.y.max(other.min.y);
        if w <= 0.0 || h <= 0.0 { 0.0 } else { w * h }
    }
}

/// A disc in world space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f64,
}

impl Circle {
    pub const fn new(center: Vec2, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Closed containment: points on the circumference count as inside.
    pub fn contains_point(&self, p: Vec2) -> bool {
        self.center.distance(p) <= self.radius
    }
}

/// How much of a cell a patch footprint covers, as an ordered scale.
///
/// The ordering matters: patch application treats `Over50Percent` as the
/// adoption threshold for leaves, and `Full` as the short-circuit
/// threshold for whole subtrees.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Coverage {
    /// No overlap at all.
    Null,
    /// Some overlap, but half the cell or less.
    Partial,
    /// Strictly more than nothing and at least half the cell.
    Over50Percent,
    /// The whole cell is inside the footprint.
    Full,
}

/// Classify an area fraction (covered area / cell area) into a coverage
/// level. The thresholds are closed at 1.0 and 0.5 and open at 0.
pub fn coverage_from_fraction(fraction: f64) -> Coverage {
    if fraction >= 1.0 - AREA_EPSILON {
        Coverage::Full
    } else if fraction >= 0.5 {
        Coverage::Over50Percent
    } else if fraction > 0.0 {
        Coverage::Partial
    } else {
        Coverage::Null
    }
}

/// Coverage of `cell` by a rectangular footprint, computed exactly from
/// the rect/rect intersection area.
pub fn rect_coverage_of_rect(cell: &AaRect, footprint: &AaRect) -> Coverage {
    let cell_area = cell.area();
    if cell_area <= 0.0 {
        return Coverage::Null;
    }
    coverage_from_fraction(cell.intersection_area(footprint) / cell_area)
}

/// True when every corner of `rect` lies inside the disc, i.e. the disc
/// covers the rectangle completely.
pub fn rect_inside_circle(rect: &AaRect, circle: &Circle) -> bool {
    rect.corners().iter().all(|&c| circle.contains_point(c))
}

/// True when the disc and rectangle overlap at all. Exact: compares the
/// disc center against its closest point on the rectangle, so it is safe
/// for pruning subtrees that the polygonized area pass would miss.
pub fn circle_intersects_rect(circle: &Circle, rect: &AaRect) -> bool {
    let closest = Vec2::new(
        circle.center.x.clamp(rect.min.x, rect.max.x),
        circle.center.y.clamp(rect.min.y, rect.max.y),
    );
    circle.contains_point(closest)
}

/// Coverage of `cell` by a disc footprint.
///
/// Full coverage is decided exactly from the corner distances; the
/// remaining levels come from the polygonized overlap area.
pub fn circle_coverage_of_rect(cell: &AaRect, circle: &Circle) -> Coverage {
    if rect_inside_circle(cell, circle) {
        return Coverage::Full;
    }
    let cell_area = cell.area();
    if cell_area <= 0.0 {
        return Coverage::Null;
    }
    let fraction = circle_rect_overlap_area(circle, cell) / cell_area;
    // The polygon underestimates the disc, so an all-corners-inside disc
    // was already reported Full above; cap the remaining levels.
    match coverage_from_fraction(fraction) {
        Coverage::Full => Coverage::Over50Percent,
        other => other,
    }
}

/// Fraction of `cell` covered by the disc, in [0, 1]. Exact 1.0 is
/// reported when the corner test proves full containment, otherwise the
/// polygonized estimate is returned.
pub fn circle_coverage_fraction(cell: &AaRect, circle: &Circle) -> f64 {
    if rect_inside_circle(cell, circle) {
        return 1.0;
    }
    let cell_area = cell.area();
    if cell_area <= 0.0 {
        return 0.0;
    }
    (circle_rect_overlap_area(circle, cell) / cell_area).clamp(0.0, 1.0)
}

/// Approximate the disc by a regular polygon with `POINTS_PER_CIRCLE`
/// vertices, counter-clockwise.
pub fn circle_polygon(circle: &Circle) -> Vec<Vec2> {
    let mut points = Vec::with_capacity(POINTS_PER_CIRCLE);
    for i in 0..POINTS_PER_CIRCLE {
        let angle = std::f64::consts::TAU * (i as f64) / (POINTS_PER_CIRCLE as f64);
        points.push(Vec2::new(
            circle.center.x + circle.radius * angle.cos(),
            circle.center.y + circle.radius * angle.sin(),
        ));
    }
    points
}

/// Area of the overlap between a disc (polygonized) and a rectangle.
pub fn circle_rect_overlap_area(circle: &Circle, rect: &AaRect) -> f64 {
    let clipped = clip_polygon_to_rect(&circle_polygon(circle), rect);
    polygon_area(&clipped)
}

/// Unsigned area of a simple polygon via the shoelace formula.
pub fn polygon_area(points: &[Vec2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        twice_area += a.x * b.y - b.x * a.y;
    }
    twice_area.abs() * 0.5
}

/// Sutherland-Hodgman clip of a polygon against the four half-planes of
/// an axis-aligned rectangle. Returns the clipped polygon, possibly empty.
pub fn clip_polygon_to_rect(polygon: &[Vec2], rect: &AaRect) -> Vec<Vec2> {
    // Each edge is (inside-test, intersection-with-boundary).
    type Inside = fn(Vec2, &AaRect) -> bool;
    type Cross = fn(Vec2, Vec2, &AaRect) -> Vec2;

    fn cross_x(a: Vec2, b: Vec2, x: f64) -> Vec2 {
        let t = (x - a.x) / (b.x - a.x);
        Vec2::new(x, a.y + t * (b.y - a.y))
    }
    fn cross_y(a: Vec2, b: Vec2, y: f64) -> Vec2 {
        let t = (y - a.y) / (b.y - a.y);
        Vec2::new(a.x + t * (b.x - a.x), y)
    }

    let edges: [(Inside, Cross); 4] = [
        (|p, r| p.x >= r.min.x, |a, b, r| cross_x(a, b, r.min.x)),
        (|p, r| p.x <= r.max.x, |a, b, r| cross_x(a, b, r.max.x)),
        (|p, r| p.y >= r.min.y, |a, b, r| cross_y(a, b, r.min.y)),
        (|p, r| p.y <= r.max.y, |a, b, r| cross_y(a, b, r.max.y)),
    ];

    let mut current = polygon.to_vec();
    for (inside, cross) in edges {
        if current.is_empty() {
            break;
        }
        let mut next = Vec::with_capacity(current.len() + 4);
        for i in 0..current.len() {
            let a = current[i];
            let b = current[(i + 1) % current.len()];
            let a_in = inside(a, rect);
            let b_in = inside(b, rect);
            match (a_in, b_in) {
                (true, true) => next.push(b),
                (true, false) => next.push(cross(a, b, rect)),
                (false, true) => {
                    next.push(cross(a, b, rect));
                    next.push(b);
                }
                (false, false) => {}
            }
        }
        current = next;
    }
    current
}
