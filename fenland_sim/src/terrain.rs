// The terrain arena: a fixed quadtree of cells over a square world.
//
// The tree is built once, up front, and never restructured. Cells live in
// one flat `Vec` and refer to each other by index, with parents always
// allocated before their children. That ordering is load-bearing: a
// descending index sweep visits every child before its parent, which is
// how snapshot reload and the tick pass refresh branch aggregates
// bottom-up without recursion.

use crate::habitat::CellHabitat;
use crate::moisture::CellMoisture;
use crate::obstacle::CellObstacle;
use crate::resource::CellResource;
use crate::source::{MoistureSourceId, SourceBook};
use crate::species::AnimalRecord;
use crate::types::{
    CHILDREN_PER_BRANCH, CellId, PatchPriority, SUBDIVISIONS_PER_AXIS, TreePos,
};
use fenland_geom::{AaRect, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CellKind {
    Branch {
        children: [CellId; CHILDREN_PER_BRANCH],
    },
    Leaf {
        animals: Vec<AnimalRecord>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub pos: TreePos,
    /// World-space footprint, precomputed at construction.
    pub area: AaRect,
    pub parent: Option<CellId>,
    pub kind: CellKind,
    pub moisture: CellMoisture,
    pub obstacle: CellObstacle,
    pub habitat: CellHabitat,
    /// Indexed by `ResourceSpeciesId`.
    pub resources: Vec<CellResource>,
}

impl Cell {
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, CellKind::Leaf { .. })
    }

    pub fn children(&self) -> Option<&[CellId; CHILDREN_PER_BRANCH]> {
        match &self.kind {
            CellKind::Branch { children } => Some(children),
            CellKind::Leaf { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Terrain {
    cells: Vec<Cell>,
    root: CellId,
    /// Depth of the leaf level; the root sits at depth 0.
    pub leaf_depth: u32,
    pub min_cell_size: f64,
    pub cells_per_axis: u32,
}

impl Terrain {
    /// Build the full tree for a square world of `cells_per_axis` leaf
    /// cells per side, each `min_cell_size` across. Every cell starts on
    /// open ground under the base moisture source.
    ///
    /// `cells_per_axis` must be a power of `SUBDIVISIONS_PER_AXIS`;
    /// config validation guarantees this before construction runs.
    pub fn build(
        cells_per_axis: u32,
        min_cell_size: f64,
        base_moisture: MoistureSourceId,
        base_priority: PatchPriority,
        animal_species_count: usize,
        book: &SourceBook,
    ) -> Self {
        let leaf_depth = cells_per_axis.ilog(SUBDIVISIONS_PER_AXIS);
        let world_side = cells_per_axis as f64 * min_cell_size;
        let mut terrain = Terrain {
            cells: Vec::new(),
            root: CellId(0),
            leaf_depth,
            min_cell_size,
            cells_per_axis,
        };
        let root_area = AaRect::from_origin_size(Vec2::new(0.0, 0.0), world_side, world_side);
        terrain.alloc_subtree(
            None,
            TreePos::new(0, 0, 0),
            root_area,
            base_moisture,
            base_priority,
            animal_species_count,
            book,
        );
        terrain
    }

    #[allow(clippy::too_many_arguments)]
    fn alloc_subtree(
        &mut self,
        parent: Option<CellId>,
        pos: TreePos,
        area: AaRect,
        base_moisture: MoistureSourceId,
        base_priority: PatchPriority,
        animal_species_count: usize,
        book: &SourceBook,
    ) -> CellId {
        let id = CellId(self.cells.len() as u32);
        let is_leaf = pos.depth == self.leaf_depth;
        // Children ids are patched in after the recursive allocations.
        let kind = if is_leaf {
            CellKind::Leaf { animals: Vec::new() }
        } else {
            CellKind::Branch {
                children: [id; CHILDREN_PER_BRANCH],
            }
        };
        self.cells.push(Cell {
            id,
            pos,
            area,
            parent,
            kind,
            moisture: CellMoisture::adopted(base_moisture, base_priority, area.area(), book),
            obstacle: CellObstacle::open(),
            habitat: CellHabitat::empty(animal_species_count),
            resources: Vec::new(),
        });
        if !is_leaf {
            let mut children = [id; CHILDREN_PER_BRANCH];
            let child_side = area.width() / SUBDIVISIONS_PER_AXIS as f64;
            for dy in 0..SUBDIVISIONS_PER_AXIS {
                for dx in 0..SUBDIVISIONS_PER_AXIS {
                    let origin = Vec2::new(
                        area.min.x + dx as f64 * child_side,
                        area.min.y + dy as f64 * child_side,
                    );
                    let child_area = AaRect::from_origin_size(origin, child_side, child_side);
                    children[(dy * SUBDIVISIONS_PER_AXIS + dx) as usize] = self.alloc_subtree(
                        Some(id),
                        pos.child(dx, dy),
                        child_area,
                        base_moisture,
                        base_priority,
                        animal_species_count,
                        book,
                    );
                }
            }
            self.cells[id.index()].kind = CellKind::Branch { children };
        }
        id
    }

    pub fn root(&self) -> CellId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.index()]
    }

    pub fn cell_mut(&mut self, id: CellId) -> &mut Cell {
        &mut self.cells[id.index()]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    pub fn world_bounds(&self) -> AaRect {
        self.cell(self.root).area
    }

    /// Append one barren resource entry to every cell, returning the
    /// species index the new entry occupies. Leaves get an empty stock,
    /// branches an empty summary; base painting fills them in afterwards.
    pub fn push_resource_entry(&mut self) -> usize {
        let index = self
            .cells
            .first()
            .map(|c| c.resources.len())
            .unwrap_or(0);
        for cell in &mut self.cells {
            if cell.is_leaf() {
                cell.resources.push(CellResource::barren());
            } else {
                cell.resources.push(CellResource::Summary {
                    priority: PatchPriority::BASE,
                    wet_mass: crate::types::WetMass::ZERO,
                });
            }
        }
        index
    }

    /// The leaf whose footprint contains `point`, or `None` outside the
    /// world. The descent picks children arithmetically, so points on
    /// interior cell edges resolve deterministically to the cell whose
    /// `min` corner they touch.
    pub fn leaf_at(&self, point: Vec2) -> Option<CellId> {
        let mut id = self.root;
        if !self.cell(id).area.contains_point(point) {
            return None;
        }
        while let Some(children) = self.cell(id).children() {
            let area = self.cell(id).area;
            let child_side = area.width() / SUBDIVISIONS_PER_AXIS as f64;
            let clamp = |v: f64| (v.max(0.0) as u32).min(SUBDIVISIONS_PER_AXIS - 1);
            let dx = clamp((point.x - area.min.x) / child_side);
            let dy = clamp((point.y - area.min.y) / child_side);
            id = children[(dy * SUBDIVISIONS_PER_AXIS + dx) as usize];
        }
        Some(id)
    }

    /// Visit every leaf in the subtree under `id`.
    pub fn for_each_leaf_in(&self, id: CellId, f: &mut impl FnMut(&Cell)) {
        let cell = self.cell(id);
        match cell.children() {
            None => f(cell),
            Some(children) => {
                for &child in children {
                    self.for_each_leaf_in(child, f);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::HumidityDynamics;
    use crate::source::MoistureSource;
    use crate::types::WetMass;

    fn test_terrain(cells_per_axis: u32) -> (Terrain, SourceBook) {
        let mut book = SourceBook::new();
        let (base, priority) = book.register_moisture(MoistureSource {
            name: "base".into(),
            temperature_cycle: vec![12.0],
            humidity: HumidityDynamics::Constant { value: 60.0 },
            max_capacity_density: WetMass(1.0),
            in_enemy_free_space: false,
            in_competitor_free_space: false,
        });
        let terrain = Terrain::build(cells_per_axis, 1.0, base, priority, 1, &book);
        (terrain, book)
    }

    #[test]
    fn cell_counts_per_level() {
        let (terrain, _) = test_terrain(4);
        // 1 root + 4 branches + 16 leaves.
        assert_eq!(terrain.len(), 21);
        assert_eq!(terrain.leaf_depth, 2);
        let leaves = terrain.cells().iter().filter(|c| c.is_leaf()).count();
        assert_eq!(leaves, 16);
    }

    #[test]
    fn parents_allocated_before_children() {
        let (terrain, _) = test_terrain(4);
        for cell in terrain.cells() {
            if let Some(parent) = cell.parent {
                assert!(parent < cell.id);
            }
        }
    }

    #[test]
    fn child_areas_tile_the_parent() {
        let (terrain, _) = test_terrain(2);
        let root = terrain.cell(terrain.root());
        let children = root.children().unwrap();
        let total: f64 = children
            .iter()
            .map(|&c| terrain.cell(c).area.area())
            .sum();
        assert!((total - root.area.area()).abs() < 1e-9);
        for &c in children {
            assert!(root.area.contains_rect(&terrain.cell(c).area));
        }
    }

    #[test]
    fn leaf_lookup_by_point() {
        let (terrain, _) = test_terrain(4);
        let leaf = terrain.leaf_at(Vec2::new(0.5, 0.5)).unwrap();
        let cell = terrain.cell(leaf);
        assert!(cell.is_leaf());
        assert_eq!(cell.pos, TreePos::new(2, 0, 0));

        let far = terrain.leaf_at(Vec2::new(3.5, 0.5)).unwrap();
        assert_eq!(terrain.cell(far).pos, TreePos::new(2, 3, 0));

        assert!(terrain.leaf_at(Vec2::new(-1.0, 0.0)).is_none());
        assert!(terrain.leaf_at(Vec2::new(10.0, 10.0)).is_none());
    }

    #[test]
    fn leaf_visit_covers_subtree() {
        let (terrain, _) = test_terrain(4);
        let root_children = *terrain.cell(terrain.root()).children().unwrap();
        let mut count = 0;
        terrain.for_each_leaf_in(root_children[0], &mut |cell| {
            assert!(cell.is_leaf());
            count += 1;
        });
        assert_eq!(count, 4);
    }

    #[test]
    fn resource_entries_cover_every_cell() {
        let (mut terrain, _) = test_terrain(2);
        let index = terrain.push_resource_entry();
        assert_eq!(index, 0);
        for cell in terrain.cells() {
            assert_eq!(cell.resources.len(), 1);
            match (&cell.kind, &cell.resources[0]) {
                (CellKind::Leaf { .. }, CellResource::Stock { .. }) => {}
                (CellKind::Branch { .. }, CellResource::Summary { .. }) => {}
                _ => panic!("wrong resource variant for cell kind"),
            }
        }
    }
}
