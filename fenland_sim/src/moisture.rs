// Per-cell moisture layer state.
//
// A cell either holds a direct moisture source (a leaf, or a branch whose
// whole subtree adopted the same patch) or an aggregated summary of its
// children. Direct holders read temperature and humidity live from the
// registry at the current tick; summaries cache the aggregated values and
// are refreshed on every tick and after every structural change below.
//
// Source handles are not persisted. Snapshots keep only the winning
// priority, and reload rebinds the handle through the registry's
// priority lookup before any read happens.

use crate::source::{MoistureSourceId, SourceBook};
use crate::types::{PatchPriority, WetMass, strict_majority};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CellMoisture {
    /// The cell is covered by one moisture source directly.
    Source {
        priority: PatchPriority,
        #[serde(skip)]
        source: Option<MoistureSourceId>,
        /// Shared resource capacity for the whole cell, precomputed from
        /// the source's density and the cell area at adoption time.
        total_max_capacity: WetMass,
    },
    /// Aggregate over the cell's children.
    Summary {
        priority: PatchPriority,
        temperature: f64,
        humidity: f64,
        in_enemy_free_space: bool,
        in_competitor_free_space: bool,
        total_max_capacity: WetMass,
    },
}

impl CellMoisture {
    /// Direct adoption of a source, as performed by patch application.
    pub fn adopted(
        id: MoistureSourceId,
        priority: PatchPriority,
        cell_area: f64,
        book: &SourceBook,
    ) -> Self {
        let density = book.moisture(id).max_capacity_density;
        CellMoisture::Source {
            priority,
            source: Some(id),
            total_max_capacity: density * cell_area,
        }
    }

    pub fn priority(&self) -> PatchPriority {
        match self {
            CellMoisture::Source { priority, .. } => *priority,
            CellMoisture::Summary { priority, .. } => *priority,
        }
    }

    pub fn total_max_capacity(&self) -> WetMass {
        match self {
            CellMoisture::Source {
                total_max_capacity, ..
            } => *total_max_capacity,
            CellMoisture::Summary {
                total_max_capacity, ..
            } => *total_max_capacity,
        }
    }

    fn bound(source: &Option<MoistureSourceId>) -> MoistureSourceId {
        source.expect("moisture source rebound after load")
    }

    pub fn temperature(&self, book: &SourceBook, tick: u64) -> f64 {
        match self {
            CellMoisture::Source { source, .. } => {
                book.moisture(Self::bound(source)).temperature_at(tick)
            }
            CellMoisture::Summary { temperature, .. } => *temperature,
        }
    }

    pub fn humidity(&self, book: &SourceBook, tick: u64) -> f64 {
        match self {
            CellMoisture::Source { source, .. } => {
                book.moisture(Self::bound(source)).humidity_at(tick)
            }
            CellMoisture::Summary { humidity, .. } => *humidity,
        }
    }

    pub fn in_enemy_free_space(&self, book: &SourceBook) -> bool {
        match self {
            CellMoisture::Source { source, .. } => {
                book.moisture(Self::bound(source)).in_enemy_free_space
            }
            CellMoisture::Summary {
                in_enemy_free_space,
                ..
            } => *in_enemy_free_space,
        }
    }

    pub fn in_competitor_free_space(&self, book: &SourceBook) -> bool {
        match self {
            CellMoisture::Source { source, .. } => {
                book.moisture(Self::bound(source)).in_competitor_free_space
            }
            CellMoisture::Summary {
                in_competitor_free_space,
                ..
            } => *in_competitor_free_space,
        }
    }

    /// Aggregate a branch's moisture from its children: means for
    /// temperature and humidity, a sum for capacity, strict majority for
    /// the boolean space flags, and the maximum child priority.
    pub fn aggregate(children: &[&CellMoisture], book: &SourceBook, tick: u64) -> CellMoisture {
        let n = children.len();
        debug_assert!(n > 0);
        let mut temperature = 0.0;
        let mut humidity = 0.0;
        let mut capacity = WetMass::ZERO;
        let mut enemy_free_votes = 0;
        let mut competitor_free_votes = 0;
        let mut priority = PatchPriority::BASE;
        for child in children {
            temperature += child.temperature(book, tick);
            humidity += child.humidity(book, tick);
            capacity += child.total_max_capacity();
            if child.in_enemy_free_space(book) {
                enemy_free_votes += 1;
            }
            if child.in_competitor_free_space(book) {
                competitor_free_votes += 1;
            }
            priority = priority.max(child.priority());
        }
        CellMoisture::Summary {
            priority,
            temperature: temperature / n as f64,
            humidity: humidity / n as f64,
            in_enemy_free_space: strict_majority(enemy_free_votes, n),
            in_competitor_free_space: strict_majority(competitor_free_votes, n),
            total_max_capacity: capacity,
        }
    }
}
