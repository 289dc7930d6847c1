// Core types shared across the landscape engine.
//
// Defines tree addressing (`CellId`, `TreePos`), strongly-typed indices for
// species and sources, patch priorities, and the two biomass units. All
// types derive `Serialize` and `Deserialize` for save/load.
//
// **Critical constraint: determinism.** Identifiers are arena indices and
// monotone counters, never hashes or OS entropy. Do not reorder arena
// construction or the counters stop being reproducible.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};

/// Cells per axis produced by one subdivision step.
pub const SUBDIVISIONS_PER_AXIS: u32 = 2;

/// Children per branch cell (a subdivision step splits both axes).
pub const CHILDREN_PER_BRANCH: usize =
    (SUBDIVISIONS_PER_AXIS * SUBDIVISIONS_PER_AXIS) as usize;

// ---------------------------------------------------------------------------
// Tree addressing
// ---------------------------------------------------------------------------

/// Index of a cell in the terrain arena.
///
/// The arena is append-only and built once, so a `CellId` stays valid for
/// the lifetime of the landscape. Parents are always allocated before
/// their children, which makes a descending index sweep a bottom-up pass.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellId(pub u32);

impl CellId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell#{}", self.0)
    }
}

/// Logical position of a cell inside the subdivision tree: a depth level
/// plus integer grid coordinates at that level. The root is `(0, 0, 0)`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TreePos {
    pub depth: u32,
    pub x: u32,
    pub y: u32,
}

impl TreePos {
    pub const fn new(depth: u32, x: u32, y: u32) -> Self {
        Self { depth, x, y }
    }

    /// Position of the child at `(dx, dy)` within this cell's subdivision,
    /// where each axis offset is below `SUBDIVISIONS_PER_AXIS`.
    pub fn child(self, dx: u32, dy: u32) -> Self {
        Self {
            depth: self.depth + 1,
            x: self.x * SUBDIVISIONS_PER_AXIS + dx,
            y: self.y * SUBDIVISIONS_PER_AXIS + dy,
        }
    }
}

impl fmt::Display for TreePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}:({}, {})", self.depth, self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Species and animal identifiers
// ---------------------------------------------------------------------------

/// Index into the landscape's resource species table.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ResourceSpeciesId(pub usize);

/// Index into the landscape's animal species table.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct AnimalSpeciesId(pub usize);

/// Identifier for a resident animal, issued from a monotone counter.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct AnimalId(pub u64);

// ---------------------------------------------------------------------------
// Patch priority
// ---------------------------------------------------------------------------

/// Application rank of a patch source.
///
/// Priorities are assigned from a single monotone counter at registration
/// time and are never reused, so every registered source carries a unique
/// priority. A patch wins a cell when its priority is greater than or
/// equal to the cell's current one; ties therefore resolve in favor of
/// the newer patch.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PatchPriority(pub u64);

impl PatchPriority {
    /// The rank given to the landscape-wide base sources.
    pub const BASE: PatchPriority = PatchPriority(0);

    /// True when a patch with this priority displaces a holder with
    /// `current`. Equality wins so the newest registration takes effect.
    pub fn wins_over(self, current: PatchPriority) -> bool {
        self >= current
    }
}

impl fmt::Display for PatchPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Biomass units
// ---------------------------------------------------------------------------

/// Dry biomass, the unit animals consume in.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct DryMass(pub f64);

/// Wet biomass, the unit cells store and grow in.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct WetMass(pub f64);

impl DryMass {
    pub const ZERO: DryMass = DryMass(0.0);

    /// Convert to wet mass with a species' dry-to-wet factor.
    pub fn to_wet(self, conversion_to_wet: f64) -> WetMass {
        WetMass(self.0 * conversion_to_wet)
    }

    pub fn max(self, other: DryMass) -> DryMass {
        DryMass(self.0.max(other.0))
    }
}

impl WetMass {
    pub const ZERO: WetMass = WetMass(0.0);

    /// Convert to dry mass with a species' dry-to-wet factor.
    pub fn to_dry(self, conversion_to_wet: f64) -> DryMass {
        DryMass(self.0 / conversion_to_wet)
    }

    /// Subtract and clamp at zero. This is the single place where stored
    /// biomass is allowed to hit the floor; callers never write negatives.
    pub fn saturating_sub(self, other: WetMass) -> WetMass {
        WetMass((self.0 - other.0).max(0.0))
    }

    pub fn min(self, other: WetMass) -> WetMass {
        WetMass(self.0.min(other.0))
    }
}

impl Add for DryMass {
    type Output = DryMass;
    fn add(self, rhs: DryMass) -> DryMass {
        DryMass(self.0 + rhs.0)
    }
}

impl AddAssign for DryMass {
    fn add_assign(&mut self, rhs: DryMass) {
        self.0 += rhs.0;
    }
}

impl Sub for DryMass {
    type Output = DryMass;
    fn sub(self, rhs: DryMass) -> DryMass {
        DryMass(self.0 - rhs.0)
    }
}

impl Mul<f64> for DryMass {
    type Output = DryMass;
    fn mul(self, rhs: f64) -> DryMass {
        DryMass(self.0 * rhs)
    }
}

impl Add for WetMass {
    type Output = WetMass;
    fn add(self, rhs: WetMass) -> WetMass {
        WetMass(self.0 + rhs.0)
    }
}

impl AddAssign for WetMass {
    fn add_assign(&mut self, rhs: WetMass) {
        self.0 += rhs.0;
    }
}

impl Sub for WetMass {
    type Output = WetMass;
    fn sub(self, rhs: WetMass) -> WetMass {
        WetMass(self.0 - rhs.0)
    }
}

impl Mul<f64> for WetMass {
    type Output = WetMass;
    fn mul(self, rhs: f64) -> WetMass {
        WetMass(self.0 * rhs)
    }
}

/// Strict integer majority: more than half of `total`.
///
/// This is the single vote rule used by every aggregated boolean layer
/// (obstacle flags, habitat membership, moisture space flags). An exact
/// half is not a majority.
pub fn strict_majority(count: usize, total: usize) -> bool {
    2 * count > total
}
