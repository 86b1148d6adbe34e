//! Stat derivation: persistent growth data and job class to combat attributes.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::constants::{
    ACC_PER_DEX, ACC_PER_PER, ASSASSIN_BASE, ASSASSIN_GROWTH, CROWBAR_ATTACK_BONUS, CRT_PER_DEX,
    CRT_PER_PER, DEF_PER_CON, DEF_PER_STR, ESPER_BASE, ESPER_GROWTH, EVA_PER_DEX, EVA_PER_PER,
    GROWTH_MAX, GROWTH_MIN, GROWTH_POINTS_PER_LEVEL, GUARD_BASE, GUARD_GROWTH, HP_PER_CON,
    HP_PER_STR, RANGER_BASE, RANGER_GROWTH, SPD_PER_DEX, SPD_PER_PER, SUPPORT_BASE,
    SUPPORT_GROWTH, WARRIOR_BASE, WARRIOR_GROWTH,
};
use crate::mutation::BonusTrait;
use crate::numbers::floor_f64_to_i32;

/// One of the six persistent growth axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatAxis {
    Strength,
    Dexterity,
    Constitution,
    Intellect,
    Perception,
    Charisma,
}

impl StatAxis {
    pub const ALL: [Self; 6] = [
        Self::Strength,
        Self::Dexterity,
        Self::Constitution,
        Self::Intellect,
        Self::Perception,
        Self::Charisma,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Strength => 0,
            Self::Dexterity => 1,
            Self::Constitution => 2,
            Self::Intellect => 3,
            Self::Perception => 4,
            Self::Charisma => 5,
        }
    }

    #[must_use]
    pub const fn abbrev(self) -> &'static str {
        match self {
            Self::Strength => "STR",
            Self::Dexterity => "DEX",
            Self::Constitution => "CON",
            Self::Intellect => "INT",
            Self::Perception => "PER",
            Self::Charisma => "CHA",
        }
    }
}

impl fmt::Display for StatAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbrev())
    }
}

/// Errors raised when a growth vector would leave its legal range.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum GrowthError {
    #[error("{axis} growth must be finite")]
    NonFinite { axis: StatAxis },
    #[error("{axis} growth {value:.3} outside [{min:.2}, {max:.2}]")]
    OutOfRange {
        axis: StatAxis,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Plain named-field form of a growth vector, used for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthRates {
    pub strength: f64,
    pub dexterity: f64,
    pub constitution: f64,
    pub intellect: f64,
    pub perception: f64,
    pub charisma: f64,
}

/// Per-axis growth rates, each always within `[GROWTH_MIN, GROWTH_MAX]`.
///
/// Construction validates every axis, so derivation and mutation can treat
/// a `GrowthVector` as well-formed without re-checking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GrowthRates", into = "GrowthRates")]
pub struct GrowthVector {
    rates: [f64; 6],
}

impl GrowthVector {
    /// Build a vector from rates in [`StatAxis::ALL`] order.
    ///
    /// # Errors
    ///
    /// Returns an error if any rate is non-finite or outside the growth bounds.
    pub fn from_array(rates: [f64; 6]) -> Result<Self, GrowthError> {
        for axis in StatAxis::ALL {
            let value = rates[axis.index()];
            if !value.is_finite() {
                return Err(GrowthError::NonFinite { axis });
            }
            if !(GROWTH_MIN..=GROWTH_MAX).contains(&value) {
                return Err(GrowthError::OutOfRange {
                    axis,
                    value,
                    min: GROWTH_MIN,
                    max: GROWTH_MAX,
                });
            }
        }
        Ok(Self { rates })
    }

    /// Clamp arbitrary rates into bounds; non-finite rates collapse to the minimum.
    #[must_use]
    pub(crate) fn clamped(rates: [f64; 6]) -> Self {
        let rates = rates.map(|value| {
            if value.is_finite() {
                value.clamp(GROWTH_MIN, GROWTH_MAX)
            } else {
                GROWTH_MIN
            }
        });
        Self { rates }
    }

    #[must_use]
    pub const fn get(&self, axis: StatAxis) -> f64 {
        self.rates[axis.index()]
    }

    /// Return a copy with one axis replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the new rate is out of bounds.
    pub fn with(&self, axis: StatAxis, value: f64) -> Result<Self, GrowthError> {
        let mut rates = self.rates;
        rates[axis.index()] = value;
        Self::from_array(rates)
    }

    #[must_use]
    pub const fn as_array(&self) -> [f64; 6] {
        self.rates
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatAxis, f64)> + '_ {
        StatAxis::ALL
            .into_iter()
            .map(|axis| (axis, self.rates[axis.index()]))
    }
}

impl TryFrom<GrowthRates> for GrowthVector {
    type Error = GrowthError;

    fn try_from(value: GrowthRates) -> Result<Self, Self::Error> {
        Self::from_array([
            value.strength,
            value.dexterity,
            value.constitution,
            value.intellect,
            value.perception,
            value.charisma,
        ])
    }
}

impl From<GrowthVector> for GrowthRates {
    fn from(value: GrowthVector) -> Self {
        let [strength, dexterity, constitution, intellect, perception, charisma] = value.rates;
        Self {
            strength,
            dexterity,
            constitution,
            intellect,
            perception,
            charisma,
        }
    }
}

/// Which growth axes weight a job's derived attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackFormula {
    PhysicalMelee,
    PhysicalFinesse,
    Mental,
}

/// Base attribute table carried by each job class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobBaseStats {
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub accuracy: i32,
    pub evasion: i32,
    pub crit: i32,
}

impl JobBaseStats {
    const fn from_row(row: [i32; 7]) -> Self {
        Self {
            hp: row[0],
            attack: row[1],
            defense: row[2],
            speed: row[3],
            accuracy: row[4],
            evasion: row[5],
            crit: row[6],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobClass {
    Guard,
    Warrior,
    Assassin,
    Ranger,
    Esper,
    Support,
}

impl JobClass {
    pub const ALL: [Self; 6] = [
        Self::Guard,
        Self::Warrior,
        Self::Assassin,
        Self::Ranger,
        Self::Esper,
        Self::Support,
    ];

    #[must_use]
    pub const fn base_stats(self) -> JobBaseStats {
        JobBaseStats::from_row(match self {
            Self::Guard => GUARD_BASE,
            Self::Warrior => WARRIOR_BASE,
            Self::Assassin => ASSASSIN_BASE,
            Self::Ranger => RANGER_BASE,
            Self::Esper => ESPER_BASE,
            Self::Support => SUPPORT_BASE,
        })
    }

    #[must_use]
    pub const fn attack_formula(self) -> AttackFormula {
        match self {
            Self::Guard | Self::Warrior => AttackFormula::PhysicalMelee,
            Self::Assassin | Self::Ranger => AttackFormula::PhysicalFinesse,
            Self::Esper | Self::Support => AttackFormula::Mental,
        }
    }

    /// Growth template assigned to freshly recruited characters of this job.
    #[must_use]
    pub fn initial_growth(self) -> GrowthVector {
        GrowthVector::clamped(match self {
            Self::Guard => GUARD_GROWTH,
            Self::Warrior => WARRIOR_GROWTH,
            Self::Assassin => ASSASSIN_GROWTH,
            Self::Ranger => RANGER_GROWTH,
            Self::Esper => ESPER_GROWTH,
            Self::Support => SUPPORT_GROWTH,
        })
    }
}

/// Equipped item. Only the crowbar is recognized by the attack formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Equipment {
    Crowbar,
    Other(String),
}

impl Equipment {
    #[must_use]
    pub fn attack_bonus(&self) -> i32 {
        match self {
            Self::Crowbar => CROWBAR_ATTACK_BONUS,
            Self::Other(_) => 0,
        }
    }
}

/// Persistent character snapshot handed to the core by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    pub job: JobClass,
    pub level: u32,
    #[serde(default)]
    pub exp: u32,
    pub growth: GrowthVector,
    pub current_hp: i32,
    #[serde(default)]
    pub traits: Vec<BonusTrait>,
    #[serde(default)]
    pub equipment: Option<Equipment>,
}

impl Character {
    /// Recruit a level-1 character with the job's growth template at full health.
    #[must_use]
    pub fn recruit(id: impl Into<String>, name: impl Into<String>, job: JobClass) -> Self {
        let mut character = Self {
            id: id.into(),
            name: name.into(),
            job,
            level: 1,
            exp: 0,
            growth: job.initial_growth(),
            current_hp: 0,
            traits: Vec::new(),
            equipment: None,
        };
        character.current_hp = character.max_hp();
        character
    }

    #[must_use]
    pub fn with_equipment(mut self, equipment: Equipment) -> Self {
        self.equipment = Some(equipment);
        self
    }

    #[must_use]
    pub fn max_hp(&self) -> i32 {
        derive_stats(self).max_hp
    }

    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.current_hp > 0
    }
}

/// Effective combat attributes. Computed on demand, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatAttributes {
    pub max_hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub accuracy: i32,
    pub evasion: i32,
    pub crit: i32,
}

/// Raw per-axis attribute points: `growth * level * 10`.
#[derive(Debug, Clone, Copy)]
struct RawPoints {
    strength: f64,
    dexterity: f64,
    constitution: f64,
    intellect: f64,
    perception: f64,
}

impl RawPoints {
    fn project(growth: &GrowthVector, level: u32) -> Self {
        let level = f64::from(level);
        let raw = |axis: StatAxis| growth.get(axis) * level * GROWTH_POINTS_PER_LEVEL;
        Self {
            strength: raw(StatAxis::Strength),
            dexterity: raw(StatAxis::Dexterity),
            constitution: raw(StatAxis::Constitution),
            intellect: raw(StatAxis::Intellect),
            perception: raw(StatAxis::Perception),
        }
    }
}

/// Derive effective combat attributes from growth, level, job and equipment.
#[must_use]
pub fn derive_stats(character: &Character) -> CombatAttributes {
    let base = character.job.base_stats();
    let raw = RawPoints::project(&character.growth, character.level);

    let attack_points = match character.job.attack_formula() {
        AttackFormula::PhysicalMelee => 2.0 * raw.strength + 0.5 * raw.dexterity,
        AttackFormula::PhysicalFinesse => 0.5 * raw.strength + 2.0 * raw.dexterity,
        AttackFormula::Mental => 1.5 * raw.intellect + 0.5 * raw.perception,
    };
    let equipment_bonus = character
        .equipment
        .as_ref()
        .map_or(0, Equipment::attack_bonus);
    let attack = f64::from(base.attack) + attack_points + f64::from(equipment_bonus);

    CombatAttributes {
        max_hp: floor_f64_to_i32(
            f64::from(base.hp) + HP_PER_CON * raw.constitution + HP_PER_STR * raw.strength,
        ),
        attack: floor_f64_to_i32(attack),
        defense: floor_f64_to_i32(
            f64::from(base.defense) + DEF_PER_CON * raw.constitution + DEF_PER_STR * raw.strength,
        ),
        speed: floor_f64_to_i32(
            f64::from(base.speed) + SPD_PER_DEX * raw.dexterity + SPD_PER_PER * raw.perception,
        ),
        accuracy: floor_f64_to_i32(
            f64::from(base.accuracy) + ACC_PER_PER * raw.perception + ACC_PER_DEX * raw.dexterity,
        ),
        evasion: floor_f64_to_i32(
            f64::from(base.evasion) + EVA_PER_DEX * raw.dexterity + EVA_PER_PER * raw.perception,
        ),
        crit: floor_f64_to_i32(
            f64::from(base.crit) + CRT_PER_DEX * raw.dexterity + CRT_PER_PER * raw.perception,
        ),
    }
}
