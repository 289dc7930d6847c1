// Per-cell obstacle layer state.
//
// Leaves store a plain blocked flag. Branches additionally track whether
// every descendant leaf is blocked (`fully_obstructed`) and whether any
// is (`any_obstructed`). The `any` flag is what makes the full-coverage
// short circuit safe: painting a resource over a subtree in one step is
// only allowed when no descendant would have refused it in the per-child
// recursion.

use crate::types::{PatchPriority, strict_majority};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellObstacle {
    pub priority: PatchPriority,
    /// Leaf: this cell is blocked. Branch: a strict majority of children
    /// report blocked, which is what movement queries read.
    pub obstructed: bool,
    /// Every descendant leaf is blocked.
    pub fully_obstructed: bool,
    /// At least one descendant leaf is blocked.
    pub any_obstructed: bool,
}

impl CellObstacle {
    /// Open ground at base priority; the state every cell starts in.
    pub fn open() -> Self {
        CellObstacle {
            priority: PatchPriority::BASE,
            obstructed: false,
            fully_obstructed: false,
            any_obstructed: false,
        }
    }

    /// Direct adoption of an obstacle source by a leaf or a fully covered
    /// subtree.
    pub fn adopted(blocking: bool, priority: PatchPriority) -> Self {
        CellObstacle {
            priority,
            obstructed: blocking,
            fully_obstructed: blocking,
            any_obstructed: blocking,
        }
    }

    /// Aggregate a branch's obstacle state from its children.
    pub fn aggregate(children: &[&CellObstacle]) -> Self {
        let n = children.len();
        debug_assert!(n > 0);
        let votes = children.iter().filter(|c| c.obstructed).count();
        CellObstacle {
            priority: children
                .iter()
                .map(|c| c.priority)
                .max()
                .unwrap_or(PatchPriority::BASE),
            obstructed: strict_majority(votes, n),
            fully_obstructed: children.iter().all(|c| c.fully_obstructed),
            any_obstructed: children.iter().any(|c| c.any_obstructed),
        }
    }
}
