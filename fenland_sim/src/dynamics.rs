// Environmental dynamics: how moisture conditions evolve over ticks and
// how resources grow toward their capacity.
//
// All dynamics are pure functions of the landscape tick, never of mutable
// per-source cursors, so reloading a snapshot at tick `t` reproduces the
// exact environment of the original run at tick `t`.

use crate::types::WetMass;
use serde::{Deserialize, Serialize};

/// Relative-humidity dynamics of a moisture source, in percent [0, 100].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HumidityDynamics {
    /// Humidity never changes.
    Constant { value: f64 },
    /// Humidity follows a repeating per-tick cycle.
    Cycle { values: Vec<f64> },
    /// Humidity decays exponentially from `initial` toward `floor`.
    Decay { initial: f64, rate: f64, floor: f64 },
}

impl HumidityDynamics {
    /// Relative humidity at the given tick.
    pub fn value_at(&self, tick: u64) -> f64 {
        match self {
            HumidityDynamics::Constant { value } => *value,
            HumidityDynamics::Cycle { values } => {
                if values.is_empty() {
                    0.0
                } else {
                    values[(tick % values.len() as u64) as usize]
                }
            }
            HumidityDynamics::Decay {
                initial,
                rate,
                floor,
            } => floor + (initial - floor) * (-rate * tick as f64).exp(),
        }
    }
}

/// Logistic growth parameters for a resource source.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrowthDynamics {
    /// Intrinsic per-tick growth rate.
    pub rate: f64,
}

impl GrowthDynamics {
    /// One logistic step: `w + r * w * (1 - w / K)`, clamped to `[0, K]`.
    ///
    /// A zero or negative capacity means the cell cannot sustain this
    /// resource and the stock collapses to zero.
    pub fn step(&self, wet: WetMass, capacity: WetMass) -> WetMass {
        if capacity.0 <= 0.0 {
            return WetMass::ZERO;
        }
        let grown = wet.0 + self.rate * wet.0 * (1.0 - wet.0 / capacity.0);
        WetMass(grown.clamp(0.0, capacity.0))
    }
}
