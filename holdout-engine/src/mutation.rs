//! Growth mutation: scored proposals for replacing a character's growth vector.
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::config::{CategoryRule, MutationConfig};
use crate::constants::{GROWTH_MAX, GROWTH_MIN};
use crate::numbers::round_hundredths;
use crate::stats::{Character, GrowthVector, StatAxis};

/// Per-axis mutation category drawn for each candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationCategory {
    Stable,
    Beneficial,
    Adverse,
    Exceptional,
}

impl MutationCategory {
    pub const ALL: [Self; 4] = [
        Self::Stable,
        Self::Beneficial,
        Self::Adverse,
        Self::Exceptional,
    ];

    #[must_use]
    pub const fn rule(self, cfg: &MutationConfig) -> &CategoryRule {
        match self {
            Self::Stable => &cfg.stable,
            Self::Beneficial => &cfg.beneficial,
            Self::Adverse => &cfg.adverse,
            Self::Exceptional => &cfg.exceptional,
        }
    }
}

/// Candidate rank, a pure function of the aggregate score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationRank {
    Common,
    Rare,
    Exceptional,
}

impl MutationRank {
    #[must_use]
    pub fn from_score(score: f64, cfg: &MutationConfig) -> Self {
        if score > cfg.exceptional_rank_score {
            Self::Exceptional
        } else if score > cfg.rare_rank_score {
            Self::Rare
        } else {
            Self::Common
        }
    }

    #[must_use]
    pub const fn trait_chance(self, cfg: &MutationConfig) -> f64 {
        match self {
            Self::Exceptional => cfg.exceptional_trait_chance,
            Self::Rare => cfg.rare_trait_chance,
            Self::Common => cfg.common_trait_chance,
        }
    }
}

impl fmt::Display for MutationRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Common => "Common",
            Self::Rare => "Rare",
            Self::Exceptional => "Exceptional",
        })
    }
}

/// Bonus traits a mutation may grant alongside its growth change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusTrait {
    Tenacity,
    NightVision,
    Brawn,
    Inspiration,
    Leadership,
}

impl BonusTrait {
    pub const ALL: [Self; 5] = [
        Self::Tenacity,
        Self::NightVision,
        Self::Brawn,
        Self::Inspiration,
        Self::Leadership,
    ];
}

impl fmt::Display for BonusTrait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tenacity => "Tenacity",
            Self::NightVision => "Night Vision",
            Self::Brawn => "Brawn",
            Self::Inspiration => "Inspiration",
            Self::Leadership => "Leadership",
        })
    }
}

/// Outcome of mutating a single axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisMutation {
    pub axis: StatAxis,
    pub category: MutationCategory,
    /// Rolled delta, rounded to hundredths, before bounds were applied.
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationCandidate {
    pub rank: MutationRank,
    pub score: f64,
    pub growth: GrowthVector,
    pub deltas: SmallVec<[AxisMutation; 6]>,
    pub bonus_trait: Option<BonusTrait>,
}

impl MutationCandidate {
    /// Return a copy of `character` with this candidate's growth and trait applied.
    #[must_use]
    pub fn apply_to(&self, character: &Character) -> Character {
        let mut updated = character.clone();
        updated.growth = self.growth;
        if let Some(bonus) = self.bonus_trait
            && !updated.traits.contains(&bonus)
        {
            updated.traits.push(bonus);
        }
        updated
    }
}

pub type MutationSet = SmallVec<[MutationCandidate; 3]>;

fn roll_category<R: Rng + ?Sized>(cfg: &MutationConfig, rng: &mut R) -> MutationCategory {
    let total_weight = cfg.total_weight();
    let mut remaining = rng.r#gen::<f64>() * total_weight;
    let mut selected = MutationCategory::Stable;
    for category in MutationCategory::ALL {
        let weight = category.rule(cfg).weight;
        if weight <= 0.0 {
            continue;
        }
        selected = category;
        if remaining < weight {
            break;
        }
        remaining -= weight;
    }
    selected
}

fn roll_candidate<R: Rng + ?Sized>(
    current: &GrowthVector,
    cfg: &MutationConfig,
    rng: &mut R,
) -> MutationCandidate {
    let mut rates = current.as_array();
    let mut deltas = SmallVec::new();
    let mut score = 0.0_f64;

    for axis in StatAxis::ALL {
        let category = roll_category(cfg, rng);
        let rule = category.rule(cfg);
        let span = rule.delta_max - rule.delta_min;
        let delta = round_hundredths(rule.delta_min + rng.r#gen::<f64>() * span);
        let slot = &mut rates[axis.index()];
        *slot = round_hundredths((*slot + delta).clamp(GROWTH_MIN, GROWTH_MAX));
        score += rule.score_bonus + delta * cfg.delta_score_scale;
        deltas.push(AxisMutation {
            axis,
            category,
            delta,
        });
    }

    let rank = MutationRank::from_score(score, cfg);
    let bonus_trait = if rng.r#gen::<f64>() < rank.trait_chance(cfg) {
        Some(BonusTrait::ALL[rng.gen_range(0..BonusTrait::ALL.len())])
    } else {
        None
    };

    MutationCandidate {
        rank,
        score,
        growth: GrowthVector::clamped(rates),
        deltas,
        bonus_trait,
    }
}

/// Generate `cfg.candidate_count` independent candidates, best score first.
///
/// Ties keep generation order. Every resulting growth rate stays within the
/// growth bounds regardless of the input vector.
pub fn generate_mutation_candidates<R: Rng + ?Sized>(
    character: &Character,
    cfg: &MutationConfig,
    rng: &mut R,
) -> MutationSet {
    let mut candidates: MutationSet = (0..cfg.candidate_count)
        .map(|_| roll_candidate(&character.growth, cfg, rng))
        .collect();
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    log::debug!(
        "mutation batch for {}: {}",
        character.id,
        candidates
            .iter()
            .map(|candidate| format!("{}({:.1})", candidate.rank, candidate.score))
            .collect::<Vec<_>>()
            .join(", ")
    );
    candidates
}
