//! Enemy catalog and roster assembly for night raids and scripted fights.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::Enemy;
use crate::constants::{
    ROSTER_BASE_COUNT, ROSTER_PER_DAY, ROSTER_RUNNER_ROLL, ROSTER_TANK_ROLL, ROSTER_TANK_THREAT,
    ROSTER_THREAT_DIVISOR,
};
use crate::numbers::floor_f64_to_i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Walker,
    Runner,
    Tank,
    ElevatorNightmare,
}

impl EnemyKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Walker => "Walker",
            Self::Runner => "Runner",
            Self::Tank => "Tank",
            Self::ElevatorNightmare => "Elevator Nightmare",
        }
    }

    /// Template stat block; `crit` is left to the combat default.
    #[must_use]
    pub fn spawn(self, id: impl Into<String>) -> Enemy {
        let (hp, attack, defense, speed, accuracy, evasion, elite) = match self {
            Self::Walker => (80, 15, 2, 5, 80, 0, false),
            Self::Runner => (50, 20, 1, 20, 90, 15, false),
            Self::Tank => (200, 25, 20, 4, 70, 0, true),
            Self::ElevatorNightmare => (350, 25, 5, 7, 85, 0, true),
        };
        Enemy {
            id: id.into(),
            name: self.label().to_string(),
            hp,
            max_hp: hp,
            attack,
            defense,
            speed,
            accuracy,
            evasion,
            crit: None,
            elite,
        }
    }
}

/// Raid size for a night: `floor(2 + day * 0.5 + threat / 20)`, never negative.
#[must_use]
pub fn enemy_count(day: u32, threat: i32) -> usize {
    let raw = ROSTER_BASE_COUNT
        + f64::from(day) * ROSTER_PER_DAY
        + f64::from(threat) / ROSTER_THREAT_DIVISOR;
    usize::try_from(floor_f64_to_i32(raw).max(0)).unwrap_or(0)
}

fn roll_kind<R: Rng + ?Sized>(threat: i32, rng: &mut R) -> EnemyKind {
    let roll = rng.r#gen::<f64>();
    if threat > ROSTER_TANK_THREAT && roll > ROSTER_TANK_ROLL {
        EnemyKind::Tank
    } else if roll > ROSTER_RUNNER_ROLL {
        EnemyKind::Runner
    } else {
        EnemyKind::Walker
    }
}

/// Assemble the raid for `day` at `threat`. Tanks only appear above threat 50.
pub fn night_roster<R: Rng + ?Sized>(day: u32, threat: i32, rng: &mut R) -> Vec<Enemy> {
    let roster: Vec<Enemy> = (0..enemy_count(day, threat))
        .map(|slot| roll_kind(threat, rng).spawn(format!("enemy_{slot}")))
        .collect();
    log::debug!(
        "night {day} roster at threat {threat}: {} enemies",
        roster.len()
    );
    roster
}

/// The lone walker blocking the doorway in the opening fight.
#[must_use]
pub fn prologue_roster() -> Vec<Enemy> {
    let mut walker = EnemyKind::Walker.spawn("prologue_walker");
    walker.name = String::from("Doorway Walker");
    vec![walker]
}

#[must_use]
pub fn boss_roster() -> Vec<Enemy> {
    vec![EnemyKind::ElevatorNightmare.spawn("boss_elevator")]
}
