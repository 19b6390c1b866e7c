//! Diagnostic metrics for a found solution. Nothing here can change a validation verdict.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::sim::{Stage, manhattan};
use crate::types::ActionKind;

/// Steps charged per required item on top of the straight-line distance: the detour and the
/// `pickup` itself.
pub const ITEM_STEP_COST: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLabel {
    Optimal,
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityLabel {
    pub fn from_efficiency(ratio: f64) -> Self {
        match ratio {
            r if r <= 1.0 => QualityLabel::Optimal,
            r if r <= 1.25 => QualityLabel::Excellent,
            r if r <= 1.6 => QualityLabel::Good,
            r if r <= 2.5 => QualityLabel::Fair,
            _ => QualityLabel::Poor,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SolutionAnalysis {
    pub board_width: usize,
    pub board_height: usize,
    pub wall_count: usize,
    /// Walls over total cells.
    pub wall_density: f64,
    pub enemy_count: usize,
    pub item_count: usize,
    pub action_counts: BTreeMap<ActionKind, usize>,
    pub total_actions: usize,
    pub theoretical_minimum: u32,
    /// Actual actions over the theoretical minimum; `1.0` when both are zero.
    pub efficiency_ratio: f64,
    /// Distinct action kinds the solution uses.
    pub variety: usize,
    /// Variety weighted by how often the solution switches between kinds.
    pub complexity_score: f64,
    pub quality: QualityLabel,
}

pub fn theoretical_minimum(stage: &Stage) -> u32 {
    let required = u32::try_from(stage.required_items().count()).unwrap_or(u32::MAX);
    manhattan(stage.config().player.pos(), stage.goal())
        .saturating_add(ITEM_STEP_COST.saturating_mul(required))
}

pub fn analyze(stage: &Stage, actions: &[ActionKind]) -> SolutionAnalysis {
    let board = stage.board();
    let mut action_counts = BTreeMap::new();
    for action in actions {
        *action_counts.entry(*action).or_insert(0) += 1;
    }

    let minimum = theoretical_minimum(stage);
    let efficiency_ratio = match (actions.len(), minimum) {
        (0, _) => 1.0,
        (len, 0) => len as f64,
        (len, min) => len as f64 / f64::from(min),
    };

    let switches = actions.windows(2).filter(|pair| pair[0] != pair[1]).count();
    let variety = action_counts.len();
    let complexity_score = if actions.is_empty() {
        0.0
    } else {
        variety as f64 * (1.0 + switches as f64 / actions.len() as f64)
    };

    SolutionAnalysis {
        board_width: board.width,
        board_height: board.height,
        wall_count: board.wall_count(),
        wall_density: board.wall_count() as f64 / board.cell_count().max(1) as f64,
        enemy_count: stage.enemy_order().len(),
        item_count: stage.items().len(),
        action_counts,
        total_actions: actions.len(),
        theoretical_minimum: minimum,
        efficiency_ratio,
        variety,
        complexity_score,
        quality: QualityLabel::from_efficiency(efficiency_ratio),
    }
}
