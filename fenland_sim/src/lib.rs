// fenland_sim — hierarchical patch-overlay landscape engine.
//
// The landscape is a square world subdivided into a fixed quadtree of
// terrain cells. Ecological state is painted over the tree as patches:
// each patch pairs a footprint (rectangle or disc) with a source payload
// on one of four layers (moisture, resource, obstacle, habitat domain).
// Leaves adopt a patch when it covers enough of them and outranks the
// current holder; branches hold either a directly adopted source or an
// aggregate of their children. Animals read the tree through
// radius-bounded queries and consume resources through proportional
// subtraction.
//
// Module overview:
// - `landscape.rs`: Top-level `Landscape`: construction, painting, tick loop, foraging API.
// - `terrain.rs`:   The cell arena — a fixed quadtree with parents before children.
// - `apply.rs`:     Patch application protocol (leaf adoption, short circuit, re-aggregation).
// - `forage.rs`:    Availability, proportional consumption, radius perception queries.
// - `moisture.rs`, `resource.rs`, `obstacle.rs`, `habitat.rs`: per-layer cell state.
// - `source.rs`:    Source payloads and the priority-issuing registry.
// - `patch.rs`:     Footprint shapes + the `Patch` struct.
// - `dynamics.rs`:  Humidity dynamics and logistic growth.
// - `species.rs`:   Resource/animal species tables and resident animal records.
// - `config.rs`:    `LandscapeConfig` — all tunable parameters, JSON-loaded.
// - `snapshot.rs`:  Save/load with priority-based source rebinding.
// - `types.rs`:     Ids, priorities, mass units, the majority rule.
// - `error.rs`:     `ConfigError` / `SnapshotError`.
//
// Geometry (coverage classification, disc/rect clipping) lives in the
// companion crate `fenland_geom`.
//
// **Critical constraint: determinism.** The engine is a pure function of
// its config, the paint/consume call sequence, and the tick count. State
// lives in `Vec`s mutated in arena or registration order; no `HashMap`
// iteration, no system time, no OS entropy anywhere in the engine.

pub mod apply;
pub mod config;
pub mod dynamics;
pub mod error;
pub mod forage;
pub mod habitat;
pub mod landscape;
pub mod moisture;
pub mod obstacle;
pub mod patch;
pub mod resource;
pub mod snapshot;
pub mod source;
pub mod species;
pub mod terrain;
pub mod types;
