//! Morale scalar and the damage multipliers it drives for the ally side.
use serde::{Deserialize, Serialize};

use crate::constants::{
    MORALE_FRAGILITY, MORALE_LOW_FLOOR, MORALE_LOW_SLOPE, MORALE_NEUTRAL, MORALE_TIERS,
};

/// Persistent morale value supplied by the caller. Negative values act as 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Morale(pub i32);

impl Default for Morale {
    fn default() -> Self {
        Self(MORALE_NEUTRAL)
    }
}

impl From<i32> for Morale {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl Morale {
    #[must_use]
    pub const fn value(self) -> i32 {
        if self.0 < 0 { 0 } else { self.0 }
    }

    /// Multiplier applied to damage dealt by allies.
    #[must_use]
    pub fn outgoing_multiplier(self) -> f64 {
        let value = self.value();
        if value < MORALE_NEUTRAL {
            let ratio = f64::from(value) / f64::from(MORALE_NEUTRAL);
            return MORALE_LOW_FLOOR + MORALE_LOW_SLOPE * ratio;
        }
        MORALE_TIERS
            .iter()
            .find(|(threshold, _)| value >= *threshold)
            .map_or(1.0, |(_, multiplier)| *multiplier)
    }

    /// Multiplier applied to damage allies receive. Only low morale raises it.
    #[must_use]
    pub fn incoming_multiplier(self) -> f64 {
        let value = self.value();
        if value < MORALE_NEUTRAL {
            let ratio = f64::from(value) / f64::from(MORALE_NEUTRAL);
            1.0 + MORALE_FRAGILITY * (1.0 - ratio)
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn outgoing_tiers() {
        assert!(approx(Morale(0).outgoing_multiplier(), 0.4));
        assert!(approx(Morale(50).outgoing_multiplier(), 0.7));
        assert!(approx(Morale(100).outgoing_multiplier(), 1.0));
        assert!(approx(Morale(149).outgoing_multiplier(), 1.0));
        assert!(approx(Morale(150).outgoing_multiplier(), 1.1));
        assert!(approx(Morale(200).outgoing_multiplier(), 1.2));
        assert!(approx(Morale(250).outgoing_multiplier(), 1.4));
        assert!(approx(Morale(300).outgoing_multiplier(), 1.6));
        assert!(approx(Morale(999).outgoing_multiplier(), 1.6));
    }

    #[test]
    fn incoming_only_rises_below_neutral() {
        assert!(approx(Morale(0).incoming_multiplier(), 1.5));
        assert!(approx(Morale(60).incoming_multiplier(), 1.2));
        assert!(approx(Morale(100).incoming_multiplier(), 1.0));
        assert!(approx(Morale(300).incoming_multiplier(), 1.0));
    }

    #[test]
    fn negative_morale_reads_as_zero() {
        assert_eq!(Morale(-40).value(), 0);
        assert!(approx(Morale(-40).outgoing_multiplier(), 0.4));
        assert!(approx(Morale(-40).incoming_multiplier(), 1.5));
    }
}
