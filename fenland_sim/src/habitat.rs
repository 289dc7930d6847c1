// Per-cell habitat domain layer state.
//
// Cells store the membership flags by value (one bool per animal
// species), not a handle, so this layer needs no rebinding on reload.
// Branch membership is a strict majority vote per species.

use crate::source::HabitatDomainSource;
use crate::types::{AnimalSpeciesId, PatchPriority, strict_majority};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellHabitat {
    pub priority: PatchPriority,
    /// Indexed by `AnimalSpeciesId`.
    members: SmallVec<[bool; 4]>,
}

impl CellHabitat {
    /// No species at home here; the state every cell starts in.
    pub fn empty(species_count: usize) -> Self {
        CellHabitat {
            priority: PatchPriority::BASE,
            members: SmallVec::from_elem(false, species_count),
        }
    }

    /// Direct adoption of a habitat domain.
    pub fn adopted(
        source: &HabitatDomainSource,
        priority: PatchPriority,
        species_count: usize,
    ) -> Self {
        let mut members = SmallVec::from_elem(false, species_count);
        for &species in &source.members {
            if species.0 < species_count {
                members[species.0] = true;
            }
        }
        CellHabitat { priority, members }
    }

    pub fn contains(&self, species: AnimalSpeciesId) -> bool {
        self.members.get(species.0).copied().unwrap_or(false)
    }

    pub fn species_count(&self) -> usize {
        self.members.len()
    }

    /// Aggregate a branch's membership from its children, per species.
    pub fn aggregate(children: &[&CellHabitat], species_count: usize) -> Self {
        let n = children.len();
        debug_assert!(n > 0);
        let mut members = SmallVec::from_elem(false, species_count);
        for (species, member) in members.iter_mut().enumerate() {
            let votes = children
                .iter()
                .filter(|c| c.contains(AnimalSpeciesId(species)))
                .count();
            *member = strict_majority(votes, n);
        }
        CellHabitat {
            priority: children
                .iter()
                .map(|c| c.priority)
                .max()
                .unwrap_or(PatchPriority::BASE),
            members,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adoption_sets_listed_species_only() {
        let source = HabitatDomainSource {
            members: vec![AnimalSpeciesId(0), AnimalSpeciesId(2)],
        };
        let cell = CellHabitat::adopted(&source, PatchPriority(5), 3);
        assert!(cell.contains(AnimalSpeciesId(0)));
        assert!(!cell.contains(AnimalSpeciesId(1)));
        assert!(cell.contains(AnimalSpeciesId(2)));
    }

    #[test]
    fn membership_majority_per_species() {
        let deer = HabitatDomainSource {
            members: vec![AnimalSpeciesId(0)],
        };
        let in_domain = CellHabitat::adopted(&deer, PatchPriority(1), 2);
        let out = CellHabitat::empty(2);
        let branch = CellHabitat::aggregate(&[&in_domain, &in_domain, &in_domain, &out], 2);
        assert!(branch.contains(AnimalSpeciesId(0)));
        assert!(!branch.contains(AnimalSpeciesId(1)));

        let split = CellHabitat::aggregate(&[&in_domain, &in_domain, &out, &out], 2);
        assert!(!split.contains(AnimalSpeciesId(0)));
    }
}
