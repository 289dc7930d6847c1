// A patch pairs a footprint shape with a registered source. Applying a
// patch paints the source over every cell the footprint sufficiently
// covers; the coverage classification itself lives in `fenland_geom`.

use crate::source::SourceRef;
use crate::types::PatchPriority;
use fenland_geom::{AaRect, Circle, Coverage, circle_coverage_of_rect, rect_coverage_of_rect};
use serde::{Deserialize, Serialize};

/// Footprint of a patch in world space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatchShape {
    Rect(AaRect),
    Circle(Circle),
}

impl PatchShape {
    /// Coverage level of a cell by this footprint.
    pub fn coverage_of(&self, cell: &AaRect) -> Coverage {
        match self {
            PatchShape::Rect(rect) => rect_coverage_of_rect(cell, rect),
            PatchShape::Circle(circle) => circle_coverage_of_rect(cell, circle),
        }
    }
}

/// A source ready to be painted over the terrain at a given priority.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub shape: PatchShape,
    pub source: SourceRef,
    pub priority: PatchPriority,
}

#[cfg(test)]
mod tests {
    use super::*;
    use fenland_geom::Vec2;

    #[test]
    fn shape_coverage_dispatch() {
        let cell = AaRect::from_origin_size(Vec2::new(0.0, 0.0), 1.0, 1.0);
        let rect = PatchShape::Rect(AaRect::from_origin_size(Vec2::new(-1.0, -1.0), 4.0, 4.0));
        assert_eq!(rect.coverage_of(&cell), Coverage::Full);
        let circle = PatchShape::Circle(Circle::new(Vec2::new(0.5, 0.5), 5.0));
        assert_eq!(circle.coverage_of(&cell), Coverage::Full);
        let far = PatchShape::Circle(Circle::new(Vec2::new(9.0, 9.0), 1.0));
        assert_eq!(far.coverage_of(&cell), Coverage::Null);
    }
}
