// Data-driven landscape configuration.
//
// Everything that defines a landscape lives in `LandscapeConfig`, loaded
// from JSON at startup: grid dimensions, the base moisture climate, the
// species tables, and the ordered list of patches painted over the base
// layers. The engine reads from the config rather than using magic
// numbers, so scenarios can be iterated without recompilation.
//
// Validation runs before any terrain is built. A config that names an
// unknown species, a degenerate footprint, or an impossible grid is
// rejected with a `ConfigError` naming the offending entry.
//
// **Critical constraint: determinism.** Patch order in the config is
// application order, which fixes every priority the landscape will ever
// assign. Two runs from the same config produce identical trees.

use crate::dynamics::HumidityDynamics;
use crate::error::ConfigError;
use crate::source::MoistureSource;
use crate::types::{SUBDIVISIONS_PER_AXIS, WetMass};
use serde::{Deserialize, Serialize};

/// Growth parameters of one resource source as written in config files,
/// in densities per unit area.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceSourceConfig {
    pub growth_rate: f64,
    pub initial_wet_density: f64,
    pub max_capacity_density: f64,
}

/// One entry of the resource species table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpeciesConfig {
    pub name: String,
    /// `wet = dry * conversion_to_wet_mass`.
    pub conversion_to_wet_mass: f64,
    pub minimum_edible_wet_mass: f64,
    /// Relative-humidity band (percent) the species grows in.
    pub min_humidity: f64,
    pub max_humidity: f64,
    /// Competes for the moisture layer's shared capacity instead of its
    /// source's own.
    pub competes_for_moisture_capacity: bool,
    /// When present, this source is painted over the whole world before
    /// any configured patch, so every later patch outranks it.
    pub base_source: Option<ResourceSourceConfig>,
}

/// A patch footprint as written in config files.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeConfig {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Circle {
        x: f64,
        y: f64,
        radius: f64,
    },
}

/// A patch payload as written in config files. Species are referenced by
/// name and resolved against the tables during landscape construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layer", rename_all = "snake_case")]
pub enum PatchSourceConfig {
    Moisture(MoistureSource),
    Resource {
        species: String,
        growth_rate: f64,
        initial_wet_density: f64,
        max_capacity_density: f64,
    },
    Obstacle {
        blocking: bool,
    },
    Habitat {
        species: Vec<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatchConfig {
    pub shape: ShapeConfig,
    pub source: PatchSourceConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandscapeConfig {
    /// Side length of a leaf cell, in world units.
    pub min_cell_size: f64,
    /// Leaf cells per world side. Must be a power of
    /// `SUBDIVISIONS_PER_AXIS` so the tree subdivides evenly.
    pub cells_per_axis: u32,
    /// Tree depth perception queries evaluate cells at, clamped to the
    /// leaf level.
    pub evaluation_depth: u32,
    /// The climate every cell starts under, at base priority rank.
    pub base_moisture: MoistureSource,
    pub resource_species: Vec<ResourceSpeciesConfig>,
    pub animal_species: Vec<String>,
    /// Painted in order after the base layers; order fixes priorities.
    pub patches: Vec<PatchConfig>,
}

impl Default for LandscapeConfig {
    fn default() -> Self {
        Self {
            min_cell_size: 1.0,
            cells_per_axis: 16,
            evaluation_depth: 3,
            base_moisture: MoistureSource {
                name: "fen".into(),
                temperature_cycle: vec![4.0, 9.0, 15.0, 10.0],
                humidity: HumidityDynamics::Constant { value: 70.0 },
                max_capacity_density: WetMass(6.0),
                in_enemy_free_space: false,
                in_competitor_free_space: false,
            },
            resource_species: vec![ResourceSpeciesConfig {
                name: "sedge".into(),
                conversion_to_wet_mass: 2.5,
                minimum_edible_wet_mass: 0.2,
                min_humidity: 40.0,
                max_humidity: 100.0,
                competes_for_moisture_capacity: true,
                base_source: Some(ResourceSourceConfig {
                    growth_rate: 0.08,
                    initial_wet_density: 1.0,
                    max_capacity_density: 6.0,
                }),
            }],
            animal_species: vec!["water vole".into()],
            patches: Vec::new(),
        }
    }
}

impl LandscapeConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: LandscapeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_cell_size <= 0.0 {
            return Err(ConfigError::NonPositiveCellSize(self.min_cell_size));
        }
        if self.cells_per_axis == 0 || !self.cells_per_axis.is_power_of_two() {
            return Err(ConfigError::CellsPerAxisNotPowerOf {
                subdivisions: SUBDIVISIONS_PER_AXIS,
                got: self.cells_per_axis,
            });
        }
        validate_moisture(&self.base_moisture)?;
        for species in &self.resource_species {
            if species.conversion_to_wet_mass <= 0.0 {
                return Err(ConfigError::NonPositiveConversion {
                    name: species.name.clone(),
                    conversion: species.conversion_to_wet_mass,
                });
            }
            if species.minimum_edible_wet_mass < 0.0 {
                return Err(ConfigError::NegativeMass {
                    name: species.name.clone(),
                    value: species.minimum_edible_wet_mass,
                });
            }
            if let Some(base) = &species.base_source {
                validate_resource_source(&species.name, base)?;
            }
        }
        for (index, patch) in self.patches.iter().enumerate() {
            match patch.shape {
                ShapeConfig::Rect { width, height, .. } => {
                    if width <= 0.0 || height <= 0.0 {
                        return Err(ConfigError::DegenerateRect {
                            index,
                            width,
                            height,
                        });
                    }
                }
                ShapeConfig::Circle { radius, .. } => {
                    if radius <= 0.0 {
                        return Err(ConfigError::NonPositiveRadius { index, radius });
                    }
                }
            }
            match &patch.source {
                PatchSourceConfig::Moisture(source) => validate_moisture(source)?,
                PatchSourceConfig::Resource { species, .. } => {
                    if !self.resource_species.iter().any(|s| &s.name == species) {
                        return Err(ConfigError::UnknownResourceSpecies {
                            index,
                            species: species.clone(),
                        });
                    }
                }
                PatchSourceConfig::Obstacle { .. } => {}
                PatchSourceConfig::Habitat { species } => {
                    for name in species {
                        if !self.animal_species.contains(name) {
                            return Err(ConfigError::UnknownAnimalSpecies {
                                index,
                                species: name.clone(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn validate_moisture(source: &MoistureSource) -> Result<(), ConfigError> {
    if source.temperature_cycle.is_empty() {
        return Err(ConfigError::EmptyTemperatureCycle {
            name: source.name.clone(),
        });
    }
    let humidity_values: Vec<f64> = match &source.humidity {
        HumidityDynamics::Constant { value } => vec![*value],
        HumidityDynamics::Cycle { values } => values.clone(),
        HumidityDynamics::Decay {
            initial, floor, ..
        } => vec![*initial, *floor],
    };
    for value in humidity_values {
        if !(0.0..=100.0).contains(&value) {
            return Err(ConfigError::HumidityOutOfRange(value));
        }
    }
    Ok(())
}

fn validate_resource_source(
    name: &str,
    source: &ResourceSourceConfig,
) -> Result<(), ConfigError> {
    if source.initial_wet_density < 0.0 {
        return Err(ConfigError::NegativeMass {
            name: name.to_string(),
            value: source.initial_wet_density,
        });
    }
    if source.max_capacity_density < 0.0 {
        return Err(ConfigError::NegativeMass {
            name: name.to_string(),
            value: source.max_capacity_density,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates_and_roundtrips() {
        let config = LandscapeConfig::default();
        config.validate().unwrap();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let restored = LandscapeConfig::from_json(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn config_loads_from_json_string() {
        let json = r#"{
            "min_cell_size": 2.0,
            "cells_per_axis": 4,
            "evaluation_depth": 1,
            "base_moisture": {
                "name": "heath",
                "temperature_cycle": [8.0, 14.0],
                "humidity": { "kind": "constant", "value": 45.0 },
                "max_capacity_density": 3.0,
                "in_enemy_free_space": false,
                "in_competitor_free_space": true
            },
            "resource_species": [
                {
                    "name": "heather",
                    "conversion_to_wet_mass": 2.0,
                    "minimum_edible_wet_mass": 0.1,
                    "min_humidity": 20.0,
                    "max_humidity": 80.0,
                    "competes_for_moisture_capacity": false,
                    "base_source": null
                }
            ],
            "animal_species": ["red deer"],
            "patches": [
                {
                    "shape": { "kind": "circle", "x": 4.0, "y": 4.0, "radius": 2.0 },
                    "source": {
                        "layer": "resource",
                        "species": "heather",
                        "growth_rate": 0.05,
                        "initial_wet_density": 1.5,
                        "max_capacity_density": 4.0
                    }
                },
                {
                    "shape": { "kind": "rect", "x": 0.0, "y": 0.0, "width": 2.0, "height": 8.0 },
                    "source": { "layer": "obstacle", "blocking": true }
                },
                {
                    "shape": { "kind": "rect", "x": 0.0, "y": 0.0, "width": 8.0, "height": 8.0 },
                    "source": { "layer": "habitat", "species": ["red deer"] }
                }
            ]
        }"#;
        let config = LandscapeConfig::from_json(json).unwrap();
        assert_eq!(config.cells_per_axis, 4);
        assert_eq!(config.patches.len(), 3);
        assert_eq!(config.base_moisture.name, "heath");
    }

    #[test]
    fn rejects_non_power_of_two_grid() {
        let config = LandscapeConfig {
            cells_per_axis: 12,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CellsPerAxisNotPowerOf { got: 12, .. })
        ));
    }

    #[test]
    fn rejects_unknown_species_in_patch() {
        let mut config = LandscapeConfig::default();
        config.patches.push(PatchConfig {
            shape: ShapeConfig::Circle {
                x: 1.0,
                y: 1.0,
                radius: 1.0,
            },
            source: PatchSourceConfig::Resource {
                species: "bracken".into(),
                growth_rate: 0.1,
                initial_wet_density: 1.0,
                max_capacity_density: 2.0,
            },
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownResourceSpecies { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_degenerate_footprints() {
        let mut config = LandscapeConfig::default();
        config.patches.push(PatchConfig {
            shape: ShapeConfig::Circle {
                x: 1.0,
                y: 1.0,
                radius: 0.0,
            },
            source: PatchSourceConfig::Obstacle { blocking: true },
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveRadius { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_humidity_outside_percent_range() {
        let mut config = LandscapeConfig::default();
        config.base_moisture.humidity = HumidityDynamics::Constant { value: 130.0 };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::HumidityOutOfRange(v)) if v == 130.0
        ));
    }
}
