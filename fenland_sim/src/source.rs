// Patch sources and the registry that owns them.
//
// A source is the payload a patch paints into cells: moisture conditions,
// a resource stand, an obstacle, or a habitat domain. Cells hold cheap
// index handles into the `SourceBook`; the book also assigns every
// registration its priority from one monotone counter, so priorities are
// unique across all four layers and never reused.
//
// Snapshots do not persist handles. Reload rebuilds them from the
// persisted priorities, which is why the book keeps priority-to-handle
// lookups (see `snapshot.rs`).

use crate::dynamics::{GrowthDynamics, HumidityDynamics};
use crate::types::{AnimalSpeciesId, PatchPriority, ResourceSpeciesId, WetMass};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Source payloads
// ---------------------------------------------------------------------------

/// Moisture conditions painted over an area: a repeating temperature
/// cycle, humidity dynamics, and the shared resource capacity the area
/// can sustain per unit of ground.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoistureSource {
    pub name: String,
    /// Temperature per tick, repeating. Never empty for a registered source.
    pub temperature_cycle: Vec<f64>,
    pub humidity: HumidityDynamics,
    /// Maximum wet mass per unit area that competing resources share.
    pub max_capacity_density: WetMass,
    pub in_enemy_free_space: bool,
    pub in_competitor_free_space: bool,
}

impl MoistureSource {
    pub fn temperature_at(&self, tick: u64) -> f64 {
        self.temperature_cycle[(tick % self.temperature_cycle.len() as u64) as usize]
    }

    pub fn humidity_at(&self, tick: u64) -> f64 {
        self.humidity.value_at(tick)
    }
}

/// A stand of one resource species painted over an area.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceSource {
    pub species: ResourceSpeciesId,
    pub growth: GrowthDynamics,
    /// Wet mass per unit area a freshly painted cell starts with.
    pub initial_wet_density: WetMass,
    /// Capacity per unit area used when the species does not compete for
    /// the moisture layer's shared capacity.
    pub max_capacity_density: WetMass,
}

/// A region animals cannot enter. `blocking` exists so a later patch can
/// carve an opening back out of an obstructed area.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSource {
    pub blocking: bool,
}

/// A region that counts as home range for a set of animal species.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HabitatDomainSource {
    pub members: Vec<AnimalSpeciesId>,
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Handle to a registered moisture source.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct MoistureSourceId(pub usize);

/// Handle to a registered resource source.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ResourceSourceId(pub usize);

/// Handle to a registered obstacle source.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ObstacleSourceId(pub usize);

/// Handle to a registered habitat domain source.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct HabitatSourceId(pub usize);

/// A layer-tagged source handle, as carried by a patch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceRef {
    Moisture(MoistureSourceId),
    Resource(ResourceSourceId),
    Obstacle(ObstacleSourceId),
    Habitat(HabitatSourceId),
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// One registered source together with the priority it was issued.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Registered<T> {
    pub priority: PatchPriority,
    pub source: T,
}

/// Owns every registered source, per layer, in registration order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceBook {
    pub moisture: Vec<Registered<MoistureSource>>,
    pub resource: Vec<Registered<ResourceSource>>,
    pub obstacle: Vec<Registered<ObstacleSource>>,
    pub habitat: Vec<Registered<HabitatDomainSource>>,
    next_priority: u64,
}

impl SourceBook {
    pub fn new() -> Self {
        Self::default()
    }

    fn issue_priority(&mut self) -> PatchPriority {
        let p = PatchPriority(self.next_priority);
        self.next_priority += 1;
        p
    }

    pub fn register_moisture(
        &mut self,
        source: MoistureSource,
    ) -> (MoistureSourceId, PatchPriority) {
        let priority = self.issue_priority();
        let id = MoistureSourceId(self.moisture.len());
        self.moisture.push(Registered { priority, source });
        (id, priority)
    }

    pub fn register_resource(
        &mut self,
        source: ResourceSource,
    ) -> (ResourceSourceId, PatchPriority) {
        let priority = self.issue_priority();
        let id = ResourceSourceId(self.resource.len());
        self.resource.push(Registered { priority, source });
        (id, priority)
    }

    pub fn register_obstacle(
        &mut self,
        source: ObstacleSource,
    ) -> (ObstacleSourceId, PatchPriority) {
        let priority = self.issue_priority();
        let id = ObstacleSourceId(self.obstacle.len());
        self.obstacle.push(Registered { priority, source });
        (id, priority)
    }

    pub fn register_habitat(
        &mut self,
        source: HabitatDomainSource,
    ) -> (HabitatSourceId, PatchPriority) {
        let priority = self.issue_priority();
        let id = HabitatSourceId(self.habitat.len());
        self.habitat.push(Registered { priority, source });
        (id, priority)
    }

    pub fn moisture(&self, id: MoistureSourceId) -> &MoistureSource {
        &self.moisture[id.0].source
    }

    pub fn resource(&self, id: ResourceSourceId) -> &ResourceSource {
        &self.resource[id.0].source
    }

    pub fn obstacle(&self, id: ObstacleSourceId) -> &ObstacleSource {
        &self.obstacle[id.0].source
    }

    pub fn habitat(&self, id: HabitatSourceId) -> &HabitatDomainSource {
        &self.habitat[id.0].source
    }

    /// The priority a `SourceRef` was registered with.
    pub fn priority_of(&self, source: SourceRef) -> PatchPriority {
        match source {
            SourceRef::Moisture(id) => self.moisture[id.0].priority,
            SourceRef::Resource(id) => self.resource[id.0].priority,
            SourceRef::Obstacle(id) => self.obstacle[id.0].priority,
            SourceRef::Habitat(id) => self.habitat[id.0].priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fen_moisture() -> MoistureSource {
        MoistureSource {
            name: "fen".into(),
            temperature_cycle: vec![5.0, 10.0, 15.0],
            humidity: HumidityDynamics::Constant { value: 70.0 },
            max_capacity_density: WetMass(4.0),
            in_enemy_free_space: false,
            in_competitor_free_space: false,
        }
    }

    #[test]
    fn priorities_are_unique_across_layers() {
        let mut book = SourceBook::new();
        let (_, p0) = book.register_moisture(fen_moisture());
        let (_, p1) = book.register_obstacle(ObstacleSource { blocking: true });
        let (_, p2) = book.register_habitat(HabitatDomainSource { members: vec![] });
        assert_eq!(p0, PatchPriority(0));
        assert_eq!(p1, PatchPriority(1));
        assert_eq!(p2, PatchPriority(2));
    }

    #[test]
    fn handles_resolve_registration_order() {
        let mut book = SourceBook::new();
        let (a, pa) = book.register_moisture(fen_moisture());
        let mut drier = fen_moisture();
        drier.name = "heath".into();
        let (b, pb) = book.register_moisture(drier);
        assert_eq!(book.moisture(a).name, "fen");
        assert_eq!(book.moisture(b).name, "heath");
        assert_eq!(book.priority_of(SourceRef::Moisture(a)), pa);
        assert_eq!(book.priority_of(SourceRef::Moisture(b)), pb);
        assert!(pb > pa);
    }

    #[test]
    fn temperature_cycle_wraps() {
        let source = fen_moisture();
        assert_eq!(source.temperature_at(0), 5.0);
        assert_eq!(source.temperature_at(4), 10.0);
    }
}
