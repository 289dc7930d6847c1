// Top-level landscape state: the terrain tree, the source registry, the
// species tables, and the tick counter, plus the public operations that
// tie them together (painting patches, advancing time, foraging, and
// animal residency).
//
// Construction order is fixed and priority-bearing: the base moisture
// source registers first, then each species' base resource source, then
// every configured patch in config order. Since the registry issues
// priorities from one monotone counter, config order alone decides which
// patch wins overlapping ground.
//
// **Critical constraint: determinism.** All state lives in `Vec`s and is
// mutated in arena or config order; there is no hashing-dependent
// iteration anywhere in the tick path.

use crate::apply::{self, ApplyOutcome};
use crate::config::{LandscapeConfig, PatchSourceConfig, ShapeConfig};
use crate::dynamics::GrowthDynamics;
use crate::error::ConfigError;
use crate::forage;
use crate::moisture::CellMoisture;
use crate::patch::{Patch, PatchShape};
use crate::source::{
    HabitatDomainSource, MoistureSource, ObstacleSource, ResourceSource, SourceBook, SourceRef,
};
use crate::species::{AnimalRecord, AnimalSpecies, ResourceSpecies};
use crate::terrain::{CellKind, Terrain};
use crate::types::{
    AnimalId, AnimalSpeciesId, CellId, DryMass, PatchPriority, ResourceSpeciesId, WetMass,
};
use fenland_geom::{AaRect, Circle, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Landscape {
    config: LandscapeConfig,
    terrain: Terrain,
    sources: SourceBook,
    resource_species: Vec<ResourceSpecies>,
    animal_species: Vec<AnimalSpecies>,
    tick: u64,
    next_animal_id: u64,
}

impl Landscape {
    /// Build a landscape from a validated config: terrain first, base
    /// layers next, configured patches last, in order.
    pub fn from_config(config: LandscapeConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut sources = SourceBook::new();
        let (base_moisture, base_priority) =
            sources.register_moisture(config.base_moisture.clone());
        debug_assert_eq!(base_priority, PatchPriority::BASE);

        let animal_species: Vec<AnimalSpecies> = config
            .animal_species
            .iter()
            .enumerate()
            .map(|(i, name)| AnimalSpecies {
                id: AnimalSpeciesId(i),
                name: name.clone(),
            })
            .collect();

        let terrain = Terrain::build(
            config.cells_per_axis,
            config.min_cell_size,
            base_moisture,
            base_priority,
            animal_species.len(),
            &sources,
        );
        log::info!(
            "landscape terrain built: {} cells, {} per axis, leaf depth {}",
            terrain.len(),
            config.cells_per_axis,
            terrain.leaf_depth,
        );

        let mut landscape = Landscape {
            resource_species: Vec::new(),
            animal_species,
            terrain,
            sources,
            tick: 0,
            next_animal_id: 0,
            config,
        };

        // Species table plus world-wide base stands.
        let species_configs = landscape.config.resource_species.clone();
        let world = landscape.terrain.world_bounds();
        for (index, entry) in species_configs.iter().enumerate() {
            let id = ResourceSpeciesId(index);
            landscape.resource_species.push(ResourceSpecies {
                id,
                name: entry.name.clone(),
                conversion_to_wet_mass: entry.conversion_to_wet_mass,
                minimum_edible_wet_mass: WetMass(entry.minimum_edible_wet_mass),
                min_humidity: entry.min_humidity,
                max_humidity: entry.max_humidity,
                competes_for_moisture_capacity: entry.competes_for_moisture_capacity,
            });
            let slot = landscape.terrain.push_resource_entry();
            debug_assert_eq!(slot, index);
            if let Some(base) = &entry.base_source {
                landscape.add_resource_patch(
                    PatchShape::Rect(world),
                    ResourceSource {
                        species: id,
                        growth: GrowthDynamics {
                            rate: base.growth_rate,
                        },
                        initial_wet_density: WetMass(base.initial_wet_density),
                        max_capacity_density: WetMass(base.max_capacity_density),
                    },
                );
            }
        }

        let patches = landscape.config.patches.clone();
        for (index, patch) in patches.iter().enumerate() {
            let shape = shape_from_config(&patch.shape);
            match &patch.source {
                PatchSourceConfig::Moisture(source) => {
                    landscape.add_moisture_patch(shape, source.clone());
                }
                PatchSourceConfig::Resource {
                    species,
                    growth_rate,
                    initial_wet_density,
                    max_capacity_density,
                } => {
                    let id = landscape
                        .resource_species
                        .iter()
                        .find(|s| &s.name == species)
                        .map(|s| s.id)
                        .ok_or_else(|| ConfigError::UnknownResourceSpecies {
                            index,
                            species: species.clone(),
                        })?;
                    landscape.add_resource_patch(
                        shape,
                        ResourceSource {
                            species: id,
                            growth: GrowthDynamics { rate: *growth_rate },
                            initial_wet_density: WetMass(*initial_wet_density),
                            max_capacity_density: WetMass(*max_capacity_density),
                        },
                    );
                }
                PatchSourceConfig::Obstacle { blocking } => {
                    landscape.add_obstacle_patch(shape, *blocking);
                }
                PatchSourceConfig::Habitat { species } => {
                    let members = species
                        .iter()
                        .map(|name| {
                            landscape
                                .animal_species
                                .iter()
                                .find(|s| &s.name == name)
                                .map(|s| s.id)
                                .ok_or_else(|| ConfigError::UnknownAnimalSpecies {
                                    index,
                                    species: name.clone(),
                                })
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    landscape.add_habitat_patch(shape, HabitatDomainSource { members });
                }
            }
        }

        Ok(landscape)
    }

    // -----------------------------------------------------------------
    // Painting
    // -----------------------------------------------------------------

    pub fn add_moisture_patch(
        &mut self,
        shape: PatchShape,
        source: MoistureSource,
    ) -> (PatchPriority, ApplyOutcome) {
        let (id, priority) = self.sources.register_moisture(source);
        self.paint(shape, SourceRef::Moisture(id), priority)
    }

    pub fn add_resource_patch(
        &mut self,
        shape: PatchShape,
        source: ResourceSource,
    ) -> (PatchPriority, ApplyOutcome) {
        debug_assert!(source.species.0 < self.resource_species.len());
        let (id, priority) = self.sources.register_resource(source);
        self.paint(shape, SourceRef::Resource(id), priority)
    }

    pub fn add_obstacle_patch(
        &mut self,
        shape: PatchShape,
        blocking: bool,
    ) -> (PatchPriority, ApplyOutcome) {
        let (id, priority) = self.sources.register_obstacle(ObstacleSource { blocking });
        self.paint(shape, SourceRef::Obstacle(id), priority)
    }

    pub fn add_habitat_patch(
        &mut self,
        shape: PatchShape,
        source: HabitatDomainSource,
    ) -> (PatchPriority, ApplyOutcome) {
        let (id, priority) = self.sources.register_habitat(source);
        self.paint(shape, SourceRef::Habitat(id), priority)
    }

    fn paint(
        &mut self,
        shape: PatchShape,
        source: SourceRef,
        priority: PatchPriority,
    ) -> (PatchPriority, ApplyOutcome) {
        let patch = Patch {
            shape,
            source,
            priority,
        };
        let outcome = apply::apply_patch(&mut self.terrain, &self.sources, self.tick, &patch, true);
        log::debug!(
            "painted {priority}: fully_applied={} touched={}",
            outcome.fully_applied,
            outcome.touched,
        );
        (priority, outcome)
    }

    /// Paint an already-built patch with an explicit short-circuit
    /// setting. Exists for equivalence checks and benchmarks; `paint`
    /// and the `add_*_patch` methods are the normal entry points.
    pub fn apply_patch_with(&mut self, patch: &Patch, short_circuit: bool) -> ApplyOutcome {
        apply::apply_patch(
            &mut self.terrain,
            &self.sources,
            self.tick,
            patch,
            short_circuit,
        )
    }

    // -----------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------

    /// Advance the landscape by `steps` ticks: resources grow at the
    /// leaves, then branch aggregates refresh bottom-up.
    pub fn update(&mut self, steps: u32) {
        for _ in 0..steps {
            self.tick += 1;
            self.step();
        }
    }

    fn step(&mut self) {
        let species_count = self.resource_species.len();
        // Parents precede children in the arena, so the descending sweep
        // grows every leaf before its ancestors re-aggregate.
        for index in (0..self.terrain.len()).rev() {
            let id = CellId(index as u32);
            if self.terrain.cell(id).is_leaf() {
                let tick = self.tick;
                let cell = self.terrain.cell_mut(id);
                let humidity = cell.moisture.humidity(&self.sources, tick);
                let shared_capacity = cell.moisture.total_max_capacity();
                let area = cell.area.area();
                for (i, species) in self.resource_species.iter().enumerate() {
                    cell.resources[i].grow(species, &self.sources, humidity, shared_capacity, area);
                }
            } else {
                if matches!(
                    self.terrain.cell(id).moisture,
                    CellMoisture::Summary { .. }
                ) {
                    let state =
                        apply::aggregate_moisture(&self.terrain, &self.sources, self.tick, id);
                    self.terrain.cell_mut(id).moisture = state;
                }
                for i in 0..species_count {
                    let state = apply::aggregate_resource(&self.terrain, id, i);
                    self.terrain.cell_mut(id).resources[i] = state;
                }
            }
        }
    }

    // -----------------------------------------------------------------
    // Foraging
    // -----------------------------------------------------------------

    /// Dry mass of `species` available inside the disc, from the root.
    pub fn dry_mass_available(
        &self,
        species: ResourceSpeciesId,
        center: Vec2,
        radius: f64,
    ) -> DryMass {
        let circle = Circle::new(center, radius);
        forage::dry_mass_available(
            &self.terrain,
            &self.resource_species[species.0],
            species.0,
            self.terrain.root(),
            &circle,
            false,
        )
    }

    /// Consume `amount` of `species` inside the disc, entering at `cell`.
    /// The subtree splits the cut proportionally and the ancestors of the
    /// entry cell are decremented directly.
    pub fn subtract_dry_mass(
        &mut self,
        cell: CellId,
        species: ResourceSpeciesId,
        amount: DryMass,
        center: Vec2,
        radius: f64,
    ) {
        if amount.0 <= 0.0 {
            return;
        }
        let species_def = self.resource_species[species.0].clone();
        let circle = Circle::new(center, radius);
        let known_full =
            fenland_geom::rect_inside_circle(&self.terrain.cell(cell).area, &circle);
        forage::subtract_dry_mass(
            &mut self.terrain,
            &species_def,
            species.0,
            cell,
            amount,
            &circle,
            known_full,
        );
        forage::subtract_dry_mass_up(&mut self.terrain, &species_def, species.0, cell, amount);
        log::trace!(
            "consumed {:.3} dry ({:.3} wet) of {} at {cell}",
            amount.0,
            forage::wet_cut(&species_def, amount).0,
            species_def.name,
        );
    }

    /// Evaluate the cells an animal perceives around `center`, at the
    /// configured evaluation depth.
    pub fn radius_cell_values(
        &self,
        viewer: AnimalSpeciesId,
        center: Vec2,
        radius: f64,
    ) -> Vec<forage::CellValue> {
        forage::radius_cell_values(
            &self.terrain,
            &self.resource_species,
            viewer,
            center,
            radius,
            self.config.evaluation_depth.min(self.terrain.leaf_depth),
        )
    }

    // -----------------------------------------------------------------
    // Animals
    // -----------------------------------------------------------------

    /// Register a resident animal at `position`. Returns `None` when the
    /// position falls outside the world.
    pub fn insert_animal(
        &mut self,
        species: AnimalSpeciesId,
        position: Vec2,
        female: bool,
        mature: bool,
    ) -> Option<AnimalId> {
        let leaf = self.terrain.leaf_at(position)?;
        let id = AnimalId(self.next_animal_id);
        self.next_animal_id += 1;
        if let CellKind::Leaf { animals } = &mut self.terrain.cell_mut(leaf).kind {
            animals.push(AnimalRecord {
                id,
                species,
                position,
                female,
                mature,
            });
        }
        Some(id)
    }

    pub fn for_each_animal_in_radius(
        &self,
        center: Vec2,
        radius: f64,
        mut f: impl FnMut(&AnimalRecord),
    ) {
        forage::for_each_animal_in_radius(&self.terrain, center, radius, &mut f);
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn config(&self) -> &LandscapeConfig {
        &self.config
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub(crate) fn terrain_mut(&mut self) -> &mut Terrain {
        &mut self.terrain
    }

    pub fn sources(&self) -> &SourceBook {
        &self.sources
    }

    pub fn resource_species(&self) -> &[ResourceSpecies] {
        &self.resource_species
    }

    pub fn animal_species(&self) -> &[AnimalSpecies] {
        &self.animal_species
    }

    pub fn temperature_at(&self, point: Vec2) -> Option<f64> {
        let leaf = self.terrain.leaf_at(point)?;
        Some(
            self.terrain
                .cell(leaf)
                .moisture
                .temperature(&self.sources, self.tick),
        )
    }

    pub fn humidity_at(&self, point: Vec2) -> Option<f64> {
        let leaf = self.terrain.leaf_at(point)?;
        Some(
            self.terrain
                .cell(leaf)
                .moisture
                .humidity(&self.sources, self.tick),
        )
    }

    pub fn is_obstructed_at(&self, point: Vec2) -> Option<bool> {
        let leaf = self.terrain.leaf_at(point)?;
        Some(self.terrain.cell(leaf).obstacle.obstructed)
    }

    pub fn wet_mass_at(&self, point: Vec2, species: ResourceSpeciesId) -> Option<WetMass> {
        let leaf = self.terrain.leaf_at(point)?;
        Some(self.terrain.cell(leaf).resources[species.0].wet_mass())
    }
}

fn shape_from_config(shape: &ShapeConfig) -> PatchShape {
    match *shape {
        ShapeConfig::Rect {
            x,
            y,
            width,
            height,
        } => PatchShape::Rect(AaRect::from_origin_size(Vec2::new(x, y), width, height)),
        ShapeConfig::Circle { x, y, radius } => {
            PatchShape::Circle(Circle::new(Vec2::new(x, y), radius))
        }
    }
}
