use serde::Serialize;
use std::collections::BTreeMap;

use super::EngineError;
use crate::models::Difficulty;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierThreshold {
    pub tier: Difficulty,
    /// Cumulative points needed to enter this tier.
    pub points: u32,
    pub partial_badge: String,
    pub complete_badge: String,
}

/// Ordered tier thresholds. The lowest tier starts at zero, thresholds and
/// tier ranks strictly increase, and `mastery_points` closes the top tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierTable {
    tiers: Vec<TierThreshold>,
    mastery_points: u32,
}

impl TierTable {
    pub fn new(tiers: Vec<TierThreshold>, mastery_points: u32) -> Result<Self, EngineError> {
        let first = tiers.first().ok_or(EngineError::MissingTierTable)?;
        if first.points != 0 {
            return Err(EngineError::InvalidTierTable(format!(
                "lowest tier '{}' must start at 0 points, found {}",
                first.tier, first.points
            )));
        }

        for window in tiers.windows(2) {
            let (lower, upper) = (&window[0], &window[1]);
            if upper.points <= lower.points {
                return Err(EngineError::InvalidTierTable(format!(
                    "threshold for '{}' ({}) must exceed '{}' ({})",
                    upper.tier, upper.points, lower.tier, lower.points
                )));
            }
            if upper.tier <= lower.tier {
                return Err(EngineError::InvalidTierTable(format!(
                    "tier '{}' is listed after '{}'",
                    upper.tier, lower.tier
                )));
            }
        }

        let top = &tiers[tiers.len() - 1];
        if mastery_points <= top.points {
            return Err(EngineError::InvalidTierTable(format!(
                "mastery_points ({}) must exceed the top threshold ({})",
                mastery_points, top.points
            )));
        }

        Ok(Self {
            tiers,
            mastery_points,
        })
    }

    pub fn tiers(&self) -> &[TierThreshold] {
        &self.tiers
    }

    pub fn mastery_points(&self) -> u32 {
        self.mastery_points
    }

    pub fn top(&self) -> Difficulty {
        self.tiers[self.tiers.len() - 1].tier
    }

    /// Points covered by the tier at `index`: up to the next threshold, or
    /// up to mastery for the top tier.
    fn span_at(&self, index: usize) -> u32 {
        let upper = self
            .tiers
            .get(index + 1)
            .map(|next| next.points)
            .unwrap_or(self.mastery_points);
        upper - self.tiers[index].points
    }

    pub fn span_of(&self, tier: Difficulty) -> Option<u32> {
        self.tiers
            .iter()
            .position(|threshold| threshold.tier == tier)
            .map(|index| self.span_at(index))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierProgress {
    pub current_tier: Difficulty,
    pub next_tier: Option<Difficulty>,
    pub points_to_next: u32,
    pub tier_display: BTreeMap<Difficulty, u32>,
    pub level_complete: bool,
}

pub fn derive_tier(total_points: u32, table: &TierTable) -> TierProgress {
    let current = table
        .tiers
        .iter()
        .rposition(|threshold| threshold.points <= total_points)
        .unwrap_or(0);

    let next = table.tiers.get(current + 1);

    let tier_display = table
        .tiers
        .iter()
        .enumerate()
        .map(|(index, threshold)| {
            let shown = match index.cmp(&current) {
                std::cmp::Ordering::Less => table.span_at(index),
                std::cmp::Ordering::Equal => total_points.saturating_sub(threshold.points),
                std::cmp::Ordering::Greater => 0,
            };
            (threshold.tier, shown)
        })
        .collect();

    TierProgress {
        current_tier: table.tiers[current].tier,
        next_tier: next.map(|threshold| threshold.tier),
        points_to_next: next
            .map(|threshold| threshold.points.saturating_sub(total_points))
            .unwrap_or(0),
        tier_display,
        level_complete: total_points >= table.mastery_points,
    }
}
