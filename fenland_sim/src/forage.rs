// Foraging: what an animal can see and eat within its perception radius.
//
// Availability walks the tree clipped to the disc, excluding the
// inedible floor per covered leaf. Consumption is optimistic: every
// visited cell subtracts its share locally, children split the cut in
// proportion to what they can actually supply, and the levels above the
// entry cell are decremented directly instead of re-summed. Stocks clamp
// at zero in exactly one place (`WetMass::saturating_sub` via
// `CellResource::set_wet_mass` callers), so no cell ever goes negative.

use crate::species::{AnimalRecord, ResourceSpecies};
use crate::terrain::Terrain;
use crate::types::{AnimalSpeciesId, CellId, DryMass, ResourceSpeciesId, TreePos, WetMass};
use fenland_geom::{Circle, Vec2, circle_coverage_fraction, circle_intersects_rect, rect_inside_circle};

/// Dry mass of `species` an animal could eat from the subtree under
/// `id`, restricted to the disc. `known_full` short-circuits the
/// geometry when an ancestor already proved full containment.
pub fn dry_mass_available(
    terrain: &Terrain,
    species: &ResourceSpecies,
    species_index: usize,
    id: CellId,
    circle: &Circle,
    known_full: bool,
) -> DryMass {
    let cell = terrain.cell(id);
    if !known_full && !circle_intersects_rect(circle, &cell.area) {
        return DryMass::ZERO;
    }
    match cell.children() {
        None => {
            let wet = cell.resources[species_index].wet_mass();
            if wet.0 <= 0.0 {
                return DryMass::ZERO;
            }
            let fraction = if known_full || rect_inside_circle(&cell.area, circle) {
                1.0
            } else {
                circle_coverage_fraction(&cell.area, circle)
            };
            let edible = (wet - species.minimum_edible_wet_mass) * fraction;
            edible.to_dry(species.conversion_to_wet_mass).max(DryMass::ZERO)
        }
        Some(children) => {
            let mut total = DryMass::ZERO;
            for &child in children {
                let child_full =
                    known_full || rect_inside_circle(&terrain.cell(child).area, circle);
                total += dry_mass_available(
                    terrain,
                    species,
                    species_index,
                    child,
                    circle,
                    child_full,
                );
            }
            total
        }
    }
}

/// Remove `amount` of dry mass from the subtree under `id`, restricted
/// to the disc. The cell subtracts locally, then distributes the cut to
/// its children in proportion to each child's own availability; children
/// with nothing to give are skipped entirely.
pub fn subtract_dry_mass(
    terrain: &mut Terrain,
    species: &ResourceSpecies,
    species_index: usize,
    id: CellId,
    amount: DryMass,
    circle: &Circle,
    known_full: bool,
) {
    if amount.0 <= 0.0 {
        return;
    }
    let wet_cut = amount.to_wet(species.conversion_to_wet_mass);
    let entry = &mut terrain.cell_mut(id).resources[species_index];
    let reduced = entry.wet_mass().saturating_sub(wet_cut);
    entry.set_wet_mass(reduced);

    let Some(children) = terrain.cell(id).children().copied() else {
        return;
    };
    let mut shares = [DryMass::ZERO; crate::types::CHILDREN_PER_BRANCH];
    let mut total = DryMass::ZERO;
    let mut full = [false; crate::types::CHILDREN_PER_BRANCH];
    for (i, &child) in children.iter().enumerate() {
        full[i] = known_full || rect_inside_circle(&terrain.cell(child).area, circle);
        shares[i] = dry_mass_available(terrain, species, species_index, child, circle, full[i]);
        total += shares[i];
    }
    if total.0 <= 0.0 {
        return;
    }
    for (i, &child) in children.iter().enumerate() {
        if shares[i].0 <= 0.0 {
            continue;
        }
        let child_cut = amount * (shares[i].0 / total.0);
        subtract_dry_mass(
            terrain,
            species,
            species_index,
            child,
            child_cut,
            circle,
            full[i],
        );
    }
}

/// Decrement the resource sums of every ancestor of `from` after a
/// subtraction entered below the root. O(depth), no re-aggregation.
pub fn subtract_dry_mass_up(
    terrain: &mut Terrain,
    species: &ResourceSpecies,
    species_index: usize,
    from: CellId,
    amount: DryMass,
) {
    let wet_cut = amount.to_wet(species.conversion_to_wet_mass);
    let mut current = terrain.cell(from).parent;
    while let Some(id) = current {
        let entry = &mut terrain.cell_mut(id).resources[species_index];
        let reduced = entry.wet_mass().saturating_sub(wet_cut);
        entry.set_wet_mass(reduced);
        current = terrain.cell(id).parent;
    }
}

/// What one evaluated cell offers an animal deciding where to move.
#[derive(Clone, Debug, PartialEq)]
pub struct CellValue {
    pub cell: CellId,
    pub pos: TreePos,
    pub center: Vec2,
    /// The perception disc contains the whole cell.
    pub fully_covered: bool,
    /// Most available resource in the cell, if any is edible at all.
    pub best_resource: Option<(ResourceSpeciesId, DryMass)>,
    /// Mature females of the viewer's species resident under this cell.
    pub mature_females: u32,
    pub in_habitat_domain: bool,
}

/// Evaluate the cells an animal at `center` perceives within `radius`.
///
/// The walk descends to `evaluation_depth` (or to leaves, whichever
/// comes first), prunes subtrees the disc misses, skips fully obstructed
/// subtrees, and drops cells whose own ground is majority-blocked.
pub fn radius_cell_values(
    terrain: &Terrain,
    resource_species: &[ResourceSpecies],
    viewer: AnimalSpeciesId,
    center: Vec2,
    radius: f64,
    evaluation_depth: u32,
) -> Vec<CellValue> {
    let circle = Circle::new(center, radius);
    let mut values = Vec::new();
    collect_cell_values(
        terrain,
        resource_species,
        viewer,
        &circle,
        evaluation_depth,
        terrain.root(),
        false,
        &mut values,
    );
    values
}

#[allow(clippy::too_many_arguments)]
fn collect_cell_values(
    terrain: &Terrain,
    resource_species: &[ResourceSpecies],
    viewer: AnimalSpeciesId,
    circle: &Circle,
    evaluation_depth: u32,
    id: CellId,
    parent_full: bool,
    out: &mut Vec<CellValue>,
) {
    let cell = terrain.cell(id);
    if cell.obstacle.fully_obstructed {
        return;
    }
    let full = parent_full || rect_inside_circle(&cell.area, circle);
    if !full && !circle_intersects_rect(circle, &cell.area) {
        return;
    }
    let evaluate_here = cell.is_leaf() || cell.pos.depth >= evaluation_depth;
    if !evaluate_here {
        for &child in cell.children().into_iter().flatten() {
            collect_cell_values(
                terrain,
                resource_species,
                viewer,
                circle,
                evaluation_depth,
                child,
                full,
                out,
            );
        }
        return;
    }
    if cell.obstacle.obstructed {
        return;
    }

    let mut best_resource: Option<(ResourceSpeciesId, DryMass)> = None;
    for (index, species) in resource_species.iter().enumerate() {
        let available = dry_mass_available(terrain, species, index, id, circle, full);
        if available.0 > 0.0 && best_resource.is_none_or(|(_, b)| available > b) {
            best_resource = Some((ResourceSpeciesId(index), available));
        }
    }

    let mut mature_females = 0;
    terrain.for_each_leaf_in(id, &mut |leaf| {
        if let crate::terrain::CellKind::Leaf { animals } = &leaf.kind {
            mature_females += animals
                .iter()
                .filter(|a| a.species == viewer && a.female && a.mature)
                .count() as u32;
        }
    });

    out.push(CellValue {
        cell: id,
        pos: cell.pos,
        center: cell.area.center(),
        fully_covered: full,
        best_resource,
        mature_females,
        in_habitat_domain: cell.habitat.contains(viewer),
    });
}

/// Visit every resident animal within `radius` of `center`.
pub fn for_each_animal_in_radius(
    terrain: &Terrain,
    center: Vec2,
    radius: f64,
    f: &mut impl FnMut(&AnimalRecord),
) {
    let circle = Circle::new(center, radius);
    visit_animals(terrain, &circle, terrain.root(), f);
}

fn visit_animals(
    terrain: &Terrain,
    circle: &Circle,
    id: CellId,
    f: &mut impl FnMut(&AnimalRecord),
) {
    let cell = terrain.cell(id);
    if !circle_intersects_rect(circle, &cell.area) {
        return;
    }
    match &cell.kind {
        crate::terrain::CellKind::Leaf { animals } => {
            for animal in animals {
                if circle.contains_point(animal.position) {
                    f(animal);
                }
            }
        }
        crate::terrain::CellKind::Branch { children } => {
            for &child in children {
                visit_animals(terrain, circle, child, f);
            }
        }
    }
}

/// Total wet cut implied by a dry amount; exposed so the landscape can
/// log consumption in the unit cells store.
pub fn wet_cut(species: &ResourceSpecies, amount: DryMass) -> WetMass {
    amount.to_wet(species.conversion_to_wet_mass)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LandscapeConfig, ResourceSourceConfig, ResourceSpeciesConfig};
    use crate::landscape::Landscape;
    use crate::types::ResourceSpeciesId;

    // 2x2 world of unit leaves, every leaf starting at 2.0 wet sedge.
    // conversion 2.0 and a 0.5 edible floor make the per-leaf numbers
    // round: (2.0 - 0.5) / 2.0 = 0.75 dry available under full coverage.
    fn grazed_landscape() -> Landscape {
        let config = LandscapeConfig {
            cells_per_axis: 2,
            evaluation_depth: 1,
            resource_species: vec![ResourceSpeciesConfig {
                name: "sedge".into(),
                conversion_to_wet_mass: 2.0,
                minimum_edible_wet_mass: 0.5,
                min_humidity: 0.0,
                max_humidity: 100.0,
                competes_for_moisture_capacity: false,
                base_source: Some(ResourceSourceConfig {
                    growth_rate: 0.1,
                    initial_wet_density: 2.0,
                    max_capacity_density: 8.0,
                }),
            }],
            ..LandscapeConfig::default()
        };
        Landscape::from_config(config).unwrap()
    }

    const SEDGE: ResourceSpeciesId = ResourceSpeciesId(0);

    #[test]
    fn availability_excludes_the_edible_floor() {
        let landscape = grazed_landscape();
        let available = landscape.dry_mass_available(SEDGE, Vec2::new(1.0, 1.0), 3.0);
        assert!((available.0 - 4.0 * 0.75).abs() < 1e-9);
    }

    #[test]
    fn stock_below_the_floor_offers_nothing() {
        let mut landscape = grazed_landscape();
        let leaf = landscape.terrain().leaf_at(Vec2::new(0.5, 0.5)).unwrap();
        landscape.terrain_mut().cell_mut(leaf).resources[0].set_wet_mass(WetMass(0.4));
        let available = landscape.dry_mass_available(SEDGE, Vec2::new(1.0, 1.0), 3.0);
        assert!((available.0 - 3.0 * 0.75).abs() < 1e-9);
    }

    #[test]
    fn partial_coverage_scales_availability() {
        let landscape = grazed_landscape();
        let center = Vec2::new(0.5, 0.5);
        let radius = 0.3;
        let available = landscape.dry_mass_available(SEDGE, center, radius);
        let leaf = landscape.terrain().leaf_at(center).unwrap();
        let fraction = fenland_geom::circle_coverage_fraction(
            &landscape.terrain().cell(leaf).area,
            &Circle::new(center, radius),
        );
        assert!(fraction > 0.0 && fraction < 1.0);
        assert!((available.0 - 1.5 * fraction / 2.0).abs() < 1e-9);
    }

    #[test]
    fn empty_children_are_skipped_when_splitting_a_cut() {
        let mut landscape = grazed_landscape();
        let bare = landscape.terrain().leaf_at(Vec2::new(0.5, 0.5)).unwrap();
        landscape.terrain_mut().cell_mut(bare).resources[0].set_wet_mass(WetMass::ZERO);
        let root = landscape.terrain().root();
        // Three stocked leaves supply 0.75 dry each; a 1.0 dry cut splits
        // into thirds, 2/3 wet off every stocked leaf.
        landscape.subtract_dry_mass(root, SEDGE, DryMass(1.0), Vec2::new(1.0, 1.0), 3.0);
        assert_eq!(
            landscape.terrain().cell(bare).resources[0].wet_mass(),
            WetMass::ZERO
        );
        for point in [
            Vec2::new(1.5, 0.5),
            Vec2::new(0.5, 1.5),
            Vec2::new(1.5, 1.5),
        ] {
            let leaf = landscape.terrain().leaf_at(point).unwrap();
            let wet = landscape.terrain().cell(leaf).resources[0].wet_mass();
            assert!((wet.0 - (2.0 - 2.0 / 3.0)).abs() < 1e-9, "leaf at {point:?}: {wet:?}");
        }
    }
}
