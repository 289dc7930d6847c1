// Species tables: the edible resources that grow in cells and the animal
// species that habitat domains are defined over. Resident animal records
// live in leaf cells and reference these tables by index.

use crate::types::{AnimalId, AnimalSpeciesId, ResourceSpeciesId, WetMass};
use fenland_geom::Vec2;
use serde::{Deserialize, Serialize};

/// A plant or fungus species animals can forage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpecies {
    pub id: ResourceSpeciesId,
    pub name: String,
    /// Dry-to-wet mass factor: `wet = dry * conversion_to_wet_mass`.
    pub conversion_to_wet_mass: f64,
    /// Stock below or at this level is structural tissue animals cannot
    /// eat; availability queries exclude it per covered leaf.
    pub minimum_edible_wet_mass: WetMass,
    /// Relative-humidity band (percent) outside which the species does
    /// not grow this tick.
    pub min_humidity: f64,
    pub max_humidity: f64,
    /// When set, the species competes for the moisture layer's shared
    /// capacity; otherwise its own source capacity bounds growth.
    pub competes_for_moisture_capacity: bool,
}

impl ResourceSpecies {
    pub fn grows_at(&self, humidity: f64) -> bool {
        humidity >= self.min_humidity && humidity <= self.max_humidity
    }
}

/// An animal species habitat domains and perception queries refer to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimalSpecies {
    pub id: AnimalSpeciesId,
    pub name: String,
}

/// A resident animal, stored in the leaf cell containing its position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimalRecord {
    pub id: AnimalId,
    pub species: AnimalSpeciesId,
    pub position: Vec2,
    pub female: bool,
    pub mature: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humidity_band_is_closed() {
        let species = ResourceSpecies {
            id: ResourceSpeciesId(0),
            name: "sedge".into(),
            conversion_to_wet_mass: 2.0,
            minimum_edible_wet_mass: WetMass(0.1),
            min_humidity: 30.0,
            max_humidity: 70.0,
            competes_for_moisture_capacity: false,
        };
        assert!(species.grows_at(30.0));
        assert!(species.grows_at(70.0));
        assert!(!species.grows_at(29.9));
        assert!(!species.grows_at(70.1));
    }
}
