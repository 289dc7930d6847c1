// Save/load for the whole landscape.
//
// Serialization is plain serde over the landscape state, with one
// deliberate hole: cells do not persist their source handles, only the
// winning priority per layer. Reload therefore rebinds every handle by
// looking the priority up in the registry (priorities are unique, issued
// from one counter, and never reused), then refreshes branch aggregates
// bottom-up so a snapshot edited or produced elsewhere still loads into
// a consistent tree. A priority with no registered source is a hard
// `SnapshotError`, never a silently dangling cell.

use crate::apply;
use crate::error::SnapshotError;
use crate::landscape::Landscape;
use crate::moisture::CellMoisture;
use crate::resource::CellResource;
use crate::source::{MoistureSourceId, ResourceSourceId};
use crate::types::{CellId, PatchPriority, ResourceSpeciesId};
use rustc_hash::FxHashMap;

impl Landscape {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Landscape, SnapshotError> {
        let mut landscape: Landscape = serde_json::from_str(json)?;
        landscape.rebind_sources()?;
        landscape.refresh_aggregates();
        Ok(landscape)
    }

    /// Rebind the skipped source handles from persisted priorities.
    ///
    /// The resource base case: a stock that was never painted keeps the
    /// base priority, which the registry can never have issued to a
    /// resource source (the base moisture source always takes it), so
    /// base-ranked stocks stay unbound rather than erroring.
    fn rebind_sources(&mut self) -> Result<(), SnapshotError> {
        let moisture_by_priority: FxHashMap<u64, MoistureSourceId> = self
            .sources()
            .moisture
            .iter()
            .enumerate()
            .map(|(i, r)| (r.priority.0, MoistureSourceId(i)))
            .collect();
        let resource_by_priority: FxHashMap<u64, ResourceSourceId> = self
            .sources()
            .resource
            .iter()
            .enumerate()
            .map(|(i, r)| (r.priority.0, ResourceSourceId(i)))
            .collect();

        for cell in self.terrain_mut().cells_mut() {
            if let CellMoisture::Source {
                priority, source, ..
            } = &mut cell.moisture
            {
                let id = moisture_by_priority.get(&priority.0).copied().ok_or(
                    SnapshotError::UnknownMoisturePriority {
                        priority: priority.0,
                    },
                )?;
                *source = Some(id);
            }
            for (index, entry) in cell.resources.iter_mut().enumerate() {
                if let CellResource::Stock {
                    priority, source, ..
                } = entry
                {
                    if *priority == PatchPriority::BASE {
                        continue;
                    }
                    let id = resource_by_priority.get(&priority.0).copied().ok_or(
                        SnapshotError::UnknownResourcePriority {
                            species: ResourceSpeciesId(index),
                            priority: priority.0,
                        },
                    )?;
                    *source = Some(id);
                }
            }
        }
        Ok(())
    }

    /// Recompute every branch aggregate from its children, bottom-up.
    /// Direct-source branches keep their rebound source; everything
    /// aggregated is derived state and safe to rebuild.
    fn refresh_aggregates(&mut self) {
        let tick = self.tick();
        let species_count = self.resource_species().len();
        for index in (0..self.terrain().len()).rev() {
            let id = CellId(index as u32);
            if self.terrain().cell(id).is_leaf() {
                continue;
            }
            if matches!(
                self.terrain().cell(id).moisture,
                CellMoisture::Summary { .. }
            ) {
                let state = apply::aggregate_moisture(self.terrain(), self.sources(), tick, id);
                self.terrain_mut().cell_mut(id).moisture = state;
            }
            let obstacle = apply::aggregate_obstacle(self.terrain(), id);
            self.terrain_mut().cell_mut(id).obstacle = obstacle;
            let habitat = apply::aggregate_habitat(self.terrain(), id);
            self.terrain_mut().cell_mut(id).habitat = habitat;
            for i in 0..species_count {
                let state = apply::aggregate_resource(self.terrain(), id, i);
                self.terrain_mut().cell_mut(id).resources[i] = state;
            }
        }
    }
}
