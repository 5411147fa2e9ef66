//! Barbell plate loadouts.
//!
//! [`resolve`] greedily fills each side of a standard bar with the largest
//! plate that still fits. The remainder is never rounded, so the loaded
//! weight can fall short of the target; callers get both numbers.

use serde::{Deserialize, Serialize};

/// Weight of an empty standard barbell, in pounds.
pub const BAR_WEIGHT: f64 = 45.0;

/// Plates available per side, largest first.
pub const AVAILABLE_PLATES: [f64; 6] = [45.0, 35.0, 25.0, 10.0, 5.0, 2.5];

/// Largest target accepted. Above this the per-side plate list would stop
/// being meaningful (and the greedy loop would run for a very long time).
pub const MAX_TARGET_WEIGHT: f64 = 10_000.0;

/// A concrete loadout for a target weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateLoadout {
    pub target_weight: f64,
    pub bar_weight: f64,
    pub weight_per_side: f64,
    /// Plates for one side, in the order they were selected (descending).
    pub plates_per_side: Vec<f64>,
    /// `sum(plates_per_side) * 2 + bar_weight`. May be below `target_weight`.
    pub actual_weight: f64,
}

/// Outcome of [`resolve`]. Serialized untagged: either the loadout object or
/// `{"error": ..., "bar_weight": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlateResult {
    Loadout(PlateLoadout),
    Unloadable { error: String, bar_weight: f64 },
}

impl PlateResult {
    pub fn loadout(&self) -> Option<&PlateLoadout> {
        match self {
            Self::Loadout(loadout) => Some(loadout),
            Self::Unloadable { .. } => None,
        }
    }

    fn unloadable(error: &str) -> Self {
        Self::Unloadable {
            error: error.to_owned(),
            bar_weight: BAR_WEIGHT,
        }
    }
}

/// Compute the plates to load on each side of the bar for `target_weight`.
pub fn resolve(target_weight: f64) -> PlateResult {
    if !target_weight.is_finite() {
        return PlateResult::unloadable("weight is not a finite number");
    }
    if target_weight < BAR_WEIGHT {
        return PlateResult::unloadable("weight is less than bar weight");
    }
    if target_weight > MAX_TARGET_WEIGHT {
        return PlateResult::unloadable("weight exceeds the maximum loadable weight");
    }

    let weight_per_side = (target_weight - BAR_WEIGHT) / 2.0;
    let mut remaining = weight_per_side;
    let mut plates_per_side = Vec::new();
    for plate in AVAILABLE_PLATES {
        while remaining >= plate {
            plates_per_side.push(plate);
            remaining -= plate;
        }
    }

    let actual_weight = plates_per_side.iter().sum::<f64>() * 2.0 + BAR_WEIGHT;
    PlateResult::Loadout(PlateLoadout {
        target_weight,
        bar_weight: BAR_WEIGHT,
        weight_per_side,
        plates_per_side,
        actual_weight,
    })
}
