// Per-cell resource layer state, one entry per resource species.
//
// Leaves hold the live stock plus a handle to the source that painted
// them; the handle drives growth (rate, capacity) and is rebound from the
// persisted priority on reload. Branches only ever hold summaries: even
// when a resource patch fully covers a subtree, the branch total is
// recomputed from the children, because each child starts from its own
// area-scaled initial stock.

use crate::source::{ResourceSourceId, SourceBook};
use crate::species::ResourceSpecies;
use crate::types::{PatchPriority, WetMass};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CellResource {
    /// Leaf stock painted by one source.
    Stock {
        priority: PatchPriority,
        #[serde(skip)]
        source: Option<ResourceSourceId>,
        wet_mass: WetMass,
    },
    /// Branch aggregate: the sum of the children's stocks.
    Summary {
        priority: PatchPriority,
        wet_mass: WetMass,
    },
}

impl CellResource {
    /// A leaf with nothing growing in it. The base state before any
    /// resource patch reaches the cell.
    pub fn barren() -> Self {
        CellResource::Stock {
            priority: PatchPriority::BASE,
            source: None,
            wet_mass: WetMass::ZERO,
        }
    }

    /// Direct adoption by a leaf: the stock starts at the source's
    /// initial density scaled by the cell area.
    pub fn adopted(
        id: ResourceSourceId,
        priority: PatchPriority,
        cell_area: f64,
        book: &SourceBook,
    ) -> Self {
        let density = book.resource(id).initial_wet_density;
        CellResource::Stock {
            priority,
            source: Some(id),
            wet_mass: density * cell_area,
        }
    }

    pub fn priority(&self) -> PatchPriority {
        match self {
            CellResource::Stock { priority, .. } => *priority,
            CellResource::Summary { priority, .. } => *priority,
        }
    }

    pub fn wet_mass(&self) -> WetMass {
        match self {
            CellResource::Stock { wet_mass, .. } => *wet_mass,
            CellResource::Summary { wet_mass, .. } => *wet_mass,
        }
    }

    pub fn set_wet_mass(&mut self, mass: WetMass) {
        debug_assert!(mass.0 >= 0.0 && mass.0.is_finite());
        match self {
            CellResource::Stock { wet_mass, .. } => *wet_mass = mass,
            CellResource::Summary { wet_mass, .. } => *wet_mass = mass,
        }
    }

    /// Aggregate a branch's entry from its children. The summed stock
    /// counts every child; the priority only considers children whose
    /// ground is not fully obstructed, so a walled-off corner cannot
    /// dictate the rank of the whole branch.
    pub fn aggregate(children: &[(&CellResource, bool)]) -> Self {
        debug_assert!(!children.is_empty());
        let mut wet_mass = WetMass::ZERO;
        let mut priority = PatchPriority::BASE;
        for (child, fully_obstructed) in children {
            wet_mass += child.wet_mass();
            if !fully_obstructed {
                priority = priority.max(child.priority());
            }
        }
        CellResource::Summary { priority, wet_mass }
    }

    /// One growth tick for a leaf stock.
    ///
    /// Growth only happens when the cell's humidity sits inside the
    /// species' band. The carrying capacity comes from the moisture
    /// layer when the species competes for shared capacity, otherwise
    /// from the painting source's own density.
    pub fn grow(
        &mut self,
        species: &ResourceSpecies,
        book: &SourceBook,
        humidity: f64,
        shared_capacity: WetMass,
        cell_area: f64,
    ) {
        let CellResource::Stock {
            source: Some(id),
            wet_mass,
            ..
        } = self
        else {
            return;
        };
        if !species.grows_at(humidity) {
            return;
        }
        let source = book.resource(*id);
        let capacity = if species.competes_for_moisture_capacity {
            shared_capacity
        } else {
            source.max_capacity_density * cell_area
        };
        *wet_mass = source.growth.step(*wet_mass, capacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::GrowthDynamics;
    use crate::source::ResourceSource;
    use crate::types::ResourceSpeciesId;

    fn book_with_source() -> (SourceBook, ResourceSourceId, PatchPriority) {
        let mut book = SourceBook::new();
        let (id, priority) = book.register_resource(ResourceSource {
            species: ResourceSpeciesId(0),
            growth: GrowthDynamics { rate: 0.5 },
            initial_wet_density: WetMass(2.0),
            max_capacity_density: WetMass(10.0),
        });
        (book, id, priority)
    }

    fn sedge(competes: bool) -> ResourceSpecies {
        ResourceSpecies {
            id: ResourceSpeciesId(0),
            name: "sedge".into(),
            conversion_to_wet_mass: 1.0,
            minimum_edible_wet_mass: WetMass::ZERO,
            min_humidity: 40.0,
            max_humidity: 90.0,
            competes_for_moisture_capacity: competes,
        }
    }

    #[test]
    fn adoption_scales_initial_stock_by_area() {
        let (book, id, priority) = book_with_source();
        let cell = CellResource::adopted(id, priority, 3.0, &book);
        assert_eq!(cell.wet_mass(), WetMass(6.0));
    }

    #[test]
    fn aggregate_sums_all_but_ranks_open_ground() {
        let (book, id, priority) = book_with_source();
        let painted = CellResource::adopted(id, priority, 1.0, &book);
        let barren = CellResource::barren();
        // The painted child is fully obstructed; its mass still counts
        // but its priority must not.
        let branch =
            CellResource::aggregate(&[(&painted, true), (&barren, false), (&barren, false)]);
        assert_eq!(branch.wet_mass(), WetMass(2.0));
        assert_eq!(branch.priority(), PatchPriority::BASE);

        let branch = CellResource::aggregate(&[(&painted, false), (&barren, false)]);
        assert_eq!(branch.priority(), priority);
    }

    #[test]
    fn growth_gated_on_humidity_band() {
        let (book, id, priority) = book_with_source();
        let mut cell = CellResource::adopted(id, priority, 1.0, &book);
        let before = cell.wet_mass();
        cell.grow(&sedge(false), &book, 10.0, WetMass(100.0), 1.0);
        assert_eq!(cell.wet_mass(), before);
        cell.grow(&sedge(false), &book, 60.0, WetMass(100.0), 1.0);
        assert!(cell.wet_mass() > before);
    }

    #[test]
    fn competing_species_uses_shared_capacity() {
        let (book, id, priority) = book_with_source();
        let mut cell = CellResource::adopted(id, priority, 1.0, &book);
        // Shared capacity below the current stock forces shrinkage.
        for _ in 0..100 {
            cell.grow(&sedge(true), &book, 60.0, WetMass(1.0), 1.0);
        }
        assert!(cell.wet_mass().0 <= 1.0);
    }

    #[test]
    fn barren_cells_do_not_grow() {
        let book = SourceBook::new();
        let mut cell = CellResource::barren();
        cell.grow(&sedge(false), &book, 60.0, WetMass(100.0), 1.0);
        assert_eq!(cell.wet_mass(), WetMass::ZERO);
    }
}
