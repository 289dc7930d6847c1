// Error taxonomy for landscape construction and snapshot reload.
//
// Configuration problems are rejected up front with `ConfigError`; a
// snapshot that references sources no longer present in the registry
// fails reload with `SnapshotError` instead of producing a landscape
// with dangling layer state.

use crate::types::ResourceSpeciesId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cells per axis must be a power of {subdivisions}, got {got}")]
    CellsPerAxisNotPowerOf { subdivisions: u32, got: u32 },
    #[error("cell size must be positive, got {0}")]
    NonPositiveCellSize(f64),
    #[error("moisture source {name:?} has an empty temperature cycle")]
    EmptyTemperatureCycle { name: String },
    #[error("relative humidity must be in [0, 100], got {0}")]
    HumidityOutOfRange(f64),
    #[error("patch {index} references unknown resource species {species:?}")]
    UnknownResourceSpecies { index: usize, species: String },
    #[error("patch {index} references unknown animal species {species:?}")]
    UnknownAnimalSpecies { index: usize, species: String },
    #[error("patch {index} has a non-positive radius {radius}")]
    NonPositiveRadius { index: usize, radius: f64 },
    #[error("patch {index} has a degenerate rectangle ({width} x {height})")]
    DegenerateRect {
        index: usize,
        width: f64,
        height: f64,
    },
    #[error("species {name:?} has a non-positive wet-mass conversion {conversion}")]
    NonPositiveConversion { name: String, conversion: f64 },
    #[error("species {name:?} has negative mass parameter {value}")]
    NegativeMass { name: String, value: f64 },
    #[error("failed to parse landscape config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot references unknown moisture source priority {priority}")]
    UnknownMoisturePriority { priority: u64 },
    #[error(
        "snapshot references unknown resource source priority {priority} for species {species:?}"
    )]
    UnknownResourcePriority {
        species: ResourceSpeciesId,
        priority: u64,
    },
    #[error("failed to parse landscape snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}
