// Patch application: painting a source over the terrain tree.
//
// Application enters at the root and recurses. A leaf adopts the source
// when the footprint covers at least half of it, the patch priority wins
// over the leaf's current holder, and the layer precondition holds (a
// resource cannot take root on obstructed ground). A branch whose
// children all adopted stores the source directly; a branch that was only
// partially touched re-aggregates the patched layer from its children.
//
// The full-coverage short circuit skips the per-descendant coverage
// classification when the footprint provably covers the whole subtree
// and every descendant would have accepted anyway. The guard relies on
// branch aggregates being upper bounds: a branch's layer priority is the
// maximum over its subtree, and `any_obstructed` records whether any
// descendant leaf is blocked. With the guard in place, the short circuit
// and the plain recursion produce identical trees.

use crate::habitat::CellHabitat;
use crate::moisture::CellMoisture;
use crate::obstacle::CellObstacle;
use crate::patch::Patch;
use crate::resource::CellResource;
use crate::source::{SourceBook, SourceRef};
use crate::terrain::Terrain;
use crate::types::CellId;
use fenland_geom::Coverage;

/// What a patch application did to the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Every leaf under the entry cell adopted the source.
    pub fully_applied: bool,
    /// At least one cell changed.
    pub touched: bool,
}

/// Paint `patch` over the whole terrain.
///
/// `short_circuit` selects the full-coverage fast path; both settings
/// produce the same tree and the flag exists so equivalence can be
/// checked in tests and benchmarks.
pub fn apply_patch(
    terrain: &mut Terrain,
    book: &SourceBook,
    tick: u64,
    patch: &Patch,
    short_circuit: bool,
) -> ApplyOutcome {
    let root = terrain.root();
    let (fully_applied, touched) = apply_cell(terrain, book, tick, patch, root, short_circuit);
    ApplyOutcome {
        fully_applied,
        touched,
    }
}

fn apply_cell(
    terrain: &mut Terrain,
    book: &SourceBook,
    tick: u64,
    patch: &Patch,
    id: CellId,
    short_circuit: bool,
) -> (bool, bool) {
    let area = terrain.cell(id).area;
    let coverage = patch.shape.coverage_of(&area);
    if coverage == Coverage::Null {
        return (false, false);
    }

    let children = match terrain.cell(id).children() {
        Some(children) => *children,
        None => {
            // Leaf: adopt on majority coverage, a winning priority, and a
            // satisfied layer precondition.
            if coverage >= Coverage::Over50Percent && can_adopt(terrain.cell(id), patch, book) {
                adopt(terrain, book, id, patch);
                return (true, true);
            }
            return (false, false);
        }
    };

    if short_circuit
        && coverage == Coverage::Full
        && can_adopt(terrain.cell(id), patch, book)
    {
        apply_source_down(terrain, book, patch, id);
        return (true, true);
    }

    let mut fully_applied = true;
    let mut touched = false;
    for child in children {
        let (f, t) = apply_cell(terrain, book, tick, patch, child, short_circuit);
        fully_applied &= f;
        touched |= t;
    }
    if touched {
        if fully_applied {
            adopt(terrain, book, id, patch);
        } else {
            refresh_patched_layer(terrain, book, tick, patch.source, id);
        }
    }
    (fully_applied, touched)
}

/// Whether a direct adoption at `id` is allowed. For branches this is
/// exactly the condition under which every descendant leaf would accept:
/// aggregated layer priorities are subtree maxima, and `any_obstructed`
/// witnesses any blocked leaf below.
fn can_adopt(cell: &crate::terrain::Cell, patch: &Patch, book: &SourceBook) -> bool {
    match patch.source {
        SourceRef::Moisture(_) => patch.priority.wins_over(cell.moisture.priority()),
        SourceRef::Obstacle(_) => patch.priority.wins_over(cell.obstacle.priority),
        SourceRef::Habitat(_) => patch.priority.wins_over(cell.habitat.priority),
        SourceRef::Resource(id) => {
            if cell.obstacle.any_obstructed {
                return false;
            }
            let species = book.resource(id).species;
            patch
                .priority
                .wins_over(cell.resources[species.0].priority())
        }
    }
}

/// Write the source into one cell. Leaves take the payload; a branch
/// stores it directly for the layers that support direct holding, while
/// the resource layer re-sums the children (each child starts from its
/// own area-scaled stock, so the branch total is not `n` times anything).
fn adopt(terrain: &mut Terrain, book: &SourceBook, id: CellId, patch: &Patch) {
    let area = terrain.cell(id).area.area();
    match patch.source {
        SourceRef::Moisture(source) => {
            terrain.cell_mut(id).moisture =
                CellMoisture::adopted(source, patch.priority, area, book);
        }
        SourceRef::Obstacle(source) => {
            let blocking = book.obstacle(source).blocking;
            terrain.cell_mut(id).obstacle = CellObstacle::adopted(blocking, patch.priority);
        }
        SourceRef::Habitat(source) => {
            let species_count = terrain.cell(id).habitat.species_count();
            terrain.cell_mut(id).habitat =
                CellHabitat::adopted(book.habitat(source), patch.priority, species_count);
        }
        SourceRef::Resource(source) => {
            let species = book.resource(source).species;
            let entry = if terrain.cell(id).is_leaf() {
                CellResource::adopted(source, patch.priority, area, book)
            } else {
                aggregate_resource(terrain, id, species.0)
            };
            terrain.cell_mut(id).resources[species.0] = entry;
        }
    }
}

/// Full-coverage fast path: write the source into every cell of the
/// subtree, children before parents, without classifying coverage again.
/// Only reachable after `can_adopt` held at the subtree root.
fn apply_source_down(terrain: &mut Terrain, book: &SourceBook, patch: &Patch, id: CellId) {
    if let Some(children) = terrain.cell(id).children().copied() {
        for child in children {
            apply_source_down(terrain, book, patch, child);
        }
    }
    adopt(terrain, book, id, patch);
}

/// Re-aggregate the layer `source` belongs to at branch `id`.
fn refresh_patched_layer(
    terrain: &mut Terrain,
    book: &SourceBook,
    tick: u64,
    source: SourceRef,
    id: CellId,
) {
    match source {
        SourceRef::Moisture(_) => {
            let state = aggregate_moisture(terrain, book, tick, id);
            terrain.cell_mut(id).moisture = state;
        }
        SourceRef::Obstacle(_) => {
            let state = aggregate_obstacle(terrain, id);
            terrain.cell_mut(id).obstacle = state;
        }
        SourceRef::Habitat(_) => {
            let state = aggregate_habitat(terrain, id);
            terrain.cell_mut(id).habitat = state;
        }
        SourceRef::Resource(src) => {
            let species = book.resource(src).species;
            let state = aggregate_resource(terrain, id, species.0);
            terrain.cell_mut(id).resources[species.0] = state;
        }
    }
}

/// Recompute every ancestor of `id`, patched layer only, bottom-up.
/// Used when a mutation enters below the root (animal foraging, direct
/// sub-cell painting) and the recursion's own return path cannot refresh
/// the levels above the entry point.
pub fn apply_up(
    terrain: &mut Terrain,
    book: &SourceBook,
    tick: u64,
    source: SourceRef,
    from: CellId,
) {
    let mut current = terrain.cell(from).parent;
    while let Some(id) = current {
        refresh_patched_layer(terrain, book, tick, source, id);
        current = terrain.cell(id).parent;
    }
}

pub fn aggregate_moisture(
    terrain: &Terrain,
    book: &SourceBook,
    tick: u64,
    id: CellId,
) -> CellMoisture {
    let children = terrain
        .cell(id)
        .children()
        .expect("moisture aggregation targets a branch");
    let kids: Vec<&CellMoisture> = children
        .iter()
        .map(|&c| &terrain.cell(c).moisture)
        .collect();
    CellMoisture::aggregate(&kids, book, tick)
}

pub fn aggregate_obstacle(terrain: &Terrain, id: CellId) -> CellObstacle {
    let children = terrain
        .cell(id)
        .children()
        .expect("obstacle aggregation targets a branch");
    let kids: Vec<&CellObstacle> = children
        .iter()
        .map(|&c| &terrain.cell(c).obstacle)
        .collect();
    CellObstacle::aggregate(&kids)
}

pub fn aggregate_habitat(terrain: &Terrain, id: CellId) -> CellHabitat {
    let children = terrain
        .cell(id)
        .children()
        .expect("habitat aggregation targets a branch");
    let kids: Vec<&CellHabitat> = children
        .iter()
        .map(|&c| &terrain.cell(c).habitat)
        .collect();
    let species_count = terrain.cell(id).habitat.species_count();
    CellHabitat::aggregate(&kids, species_count)
}

pub fn aggregate_resource(terrain: &Terrain, id: CellId, species_index: usize) -> CellResource {
    let children = terrain
        .cell(id)
        .children()
        .expect("resource aggregation targets a branch");
    let kids: Vec<(&CellResource, bool)> = children
        .iter()
        .map(|&c| {
            let child = terrain.cell(c);
            (
                &child.resources[species_index],
                child.obstacle.fully_obstructed,
            )
        })
        .collect();
    CellResource::aggregate(&kids)
}
