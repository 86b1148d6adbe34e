//! Encounter and mutation tuning.
//!
//! Every field has a serde default matching the built-in balance, so hosts can
//! override a single knob from JSON without restating the rest.
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::constants::{
    ADVERSE_BONUS, ADVERSE_DELTA, ADVERSE_WEIGHT, BENEFICIAL_BONUS, BENEFICIAL_DELTA,
    BENEFICIAL_WEIGHT, CANDIDATE_COUNT, COMMON_TRAIT_CHANCE, CRIT_DIVISOR, CRIT_MAX, CRIT_MIN,
    CRIT_MULTIPLIER, DEFENSE_FACTOR, DELTA_SCORE_SCALE, ENEMY_CRIT, EXCEPTIONAL_BONUS,
    EXCEPTIONAL_DELTA, EXCEPTIONAL_RANK_SCORE, EXCEPTIONAL_TRAIT_CHANCE, EXCEPTIONAL_WEIGHT,
    HIT_BASE, HIT_DIVISOR, HIT_MAX, HIT_MIN, INITIATIVE_PER_SPEED, INITIATIVE_THRESHOLD,
    MAX_CYCLES, MAX_SUBTICKS, MIN_DAMAGE_RATIO, RARE_RANK_SCORE, RARE_TRAIT_CHANCE, STABLE_DELTA,
    STABLE_WEIGHT, VARIANCE_MAX, VARIANCE_MIN,
};
use crate::numbers::{i64_to_f64, usize_to_f64};

/// Errors raised when tuning invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{field} bounds inverted (min {min:.2} > max {max:.2})")]
    InvertedBounds {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("{field} weight must be a non-negative number (got {weight})")]
    NegativeWeight { field: &'static str, weight: f64 },
    #[error("mutation category weights must sum to a positive total (got {total:.2})")]
    CategoryWeights { total: f64 },
    #[error("rank thresholds invalid: exceptional {exceptional:.1} must exceed rare {rare:.1}")]
    RankThresholds { exceptional: f64, rare: f64 },
}

/// Errors raised while reading tuning from JSON.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn check_probability(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::RangeViolation {
            field,
            min: 0.0,
            max: 1.0,
            value,
        })
    }
}

fn check_bounds(field: &'static str, min: f64, max: f64) -> Result<(), ConfigError> {
    if min.is_finite() && max.is_finite() && min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvertedBounds { field, min, max })
    }
}

/// Initiative, hit, crit and damage tuning for the combat resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatConfig {
    #[serde(default = "CombatConfig::default_initiative_threshold")]
    pub initiative_threshold: i64,
    #[serde(default = "CombatConfig::default_speed_multiplier")]
    pub speed_multiplier: i64,
    #[serde(default = "CombatConfig::default_max_subticks")]
    pub max_subticks: u32,
    #[serde(default = "CombatConfig::default_max_cycles")]
    pub max_cycles: u32,
    #[serde(default = "CombatConfig::default_hit_base")]
    pub hit_base: f64,
    #[serde(default = "CombatConfig::default_hit_divisor")]
    pub hit_divisor: f64,
    #[serde(default = "CombatConfig::default_hit_min")]
    pub hit_min: f64,
    #[serde(default = "CombatConfig::default_hit_max")]
    pub hit_max: f64,
    #[serde(default = "CombatConfig::default_crit_divisor")]
    pub crit_divisor: f64,
    #[serde(default = "CombatConfig::default_crit_min")]
    pub crit_min: f64,
    #[serde(default = "CombatConfig::default_crit_max")]
    pub crit_max: f64,
    #[serde(default = "CombatConfig::default_crit_multiplier")]
    pub crit_multiplier: f64,
    #[serde(default = "CombatConfig::default_defense_factor")]
    pub defense_factor: f64,
    #[serde(default = "CombatConfig::default_min_damage_ratio")]
    pub min_damage_ratio: f64,
    #[serde(default = "CombatConfig::default_variance_min")]
    pub variance_min: f64,
    #[serde(default = "CombatConfig::default_variance_max")]
    pub variance_max: f64,
    /// Crit rating used for enemies whose template omits one.
    #[serde(default = "CombatConfig::default_enemy_crit")]
    pub enemy_crit: i32,
}

impl CombatConfig {
    const fn default_initiative_threshold() -> i64 {
        INITIATIVE_THRESHOLD
    }

    const fn default_speed_multiplier() -> i64 {
        INITIATIVE_PER_SPEED
    }

    const fn default_max_subticks() -> u32 {
        MAX_SUBTICKS
    }

    const fn default_max_cycles() -> u32 {
        MAX_CYCLES
    }

    const fn default_hit_base() -> f64 {
        HIT_BASE
    }

    const fn default_hit_divisor() -> f64 {
        HIT_DIVISOR
    }

    const fn default_hit_min() -> f64 {
        HIT_MIN
    }

    const fn default_hit_max() -> f64 {
        HIT_MAX
    }

    const fn default_crit_divisor() -> f64 {
        CRIT_DIVISOR
    }

    const fn default_crit_min() -> f64 {
        CRIT_MIN
    }

    const fn default_crit_max() -> f64 {
        CRIT_MAX
    }

    const fn default_crit_multiplier() -> f64 {
        CRIT_MULTIPLIER
    }

    const fn default_defense_factor() -> f64 {
        DEFENSE_FACTOR
    }

    const fn default_min_damage_ratio() -> f64 {
        MIN_DAMAGE_RATIO
    }

    const fn default_variance_min() -> f64 {
        VARIANCE_MIN
    }

    const fn default_variance_max() -> f64 {
        VARIANCE_MAX
    }

    const fn default_enemy_crit() -> i32 {
        ENEMY_CRIT
    }

    /// Load combat tuning from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or if validation fails.
    pub fn from_json(json: &str) -> Result<Self, ConfigLoadError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Probability that an attack with `accuracy` lands on a target with `evasion`.
    #[must_use]
    pub fn hit_chance(&self, accuracy: i32, evasion: i32) -> f64 {
        let delta = f64::from(accuracy) - f64::from(evasion);
        // clamp panics on inverted bounds, and hand-built tuning skips validation.
        (self.hit_base + delta / self.hit_divisor)
            .max(self.hit_min)
            .min(self.hit_max)
    }

    /// Probability that a landed attack from an attacker with `crit` is critical.
    #[must_use]
    pub fn crit_chance(&self, crit: i32) -> f64 {
        let crit = f64::from(crit);
        let denominator = crit + self.crit_divisor;
        let raw = if denominator > 0.0 {
            crit / denominator
        } else {
            0.0
        };
        raw.max(self.crit_min).min(self.crit_max)
    }

    /// Check tuning invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("initiative_threshold", i64_to_f64(self.initiative_threshold))?;
        check_positive("speed_multiplier", i64_to_f64(self.speed_multiplier))?;
        check_positive("max_subticks", f64::from(self.max_subticks))?;
        check_positive("max_cycles", f64::from(self.max_cycles))?;
        check_positive("hit_divisor", self.hit_divisor)?;
        check_positive("crit_divisor", self.crit_divisor)?;
        check_probability("hit_min", self.hit_min)?;
        check_probability("hit_max", self.hit_max)?;
        check_bounds("hit", self.hit_min, self.hit_max)?;
        check_probability("crit_min", self.crit_min)?;
        check_probability("crit_max", self.crit_max)?;
        check_bounds("crit", self.crit_min, self.crit_max)?;
        check_positive("crit_multiplier", self.crit_multiplier)?;
        check_positive("variance_min", self.variance_min)?;
        check_bounds("variance", self.variance_min, self.variance_max)?;
        check_probability("min_damage_ratio", self.min_damage_ratio)?;
        if !(self.defense_factor.is_finite() && self.defense_factor >= 0.0) {
            return Err(ConfigError::RangeViolation {
                field: "defense_factor",
                min: 0.0,
                max: f64::MAX,
                value: self.defense_factor,
            });
        }
        Ok(())
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            initiative_threshold: Self::default_initiative_threshold(),
            speed_multiplier: Self::default_speed_multiplier(),
            max_subticks: Self::default_max_subticks(),
            max_cycles: Self::default_max_cycles(),
            hit_base: Self::default_hit_base(),
            hit_divisor: Self::default_hit_divisor(),
            hit_min: Self::default_hit_min(),
            hit_max: Self::default_hit_max(),
            crit_divisor: Self::default_crit_divisor(),
            crit_min: Self::default_crit_min(),
            crit_max: Self::default_crit_max(),
            crit_multiplier: Self::default_crit_multiplier(),
            defense_factor: Self::default_defense_factor(),
            min_damage_ratio: Self::default_min_damage_ratio(),
            variance_min: Self::default_variance_min(),
            variance_max: Self::default_variance_max(),
            enemy_crit: Self::default_enemy_crit(),
        }
    }
}

/// Draw weight, delta range and score bonus for one mutation category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub weight: f64,
    pub delta_min: f64,
    pub delta_max: f64,
    pub score_bonus: f64,
}

/// Sparse category override; omitted fields keep the category's built-in value.
#[derive(Debug, Deserialize)]
struct CategoryOverride {
    weight: Option<f64>,
    delta_min: Option<f64>,
    delta_max: Option<f64>,
    score_bonus: Option<f64>,
}

impl CategoryOverride {
    fn apply(self, base: CategoryRule) -> CategoryRule {
        CategoryRule {
            weight: self.weight.unwrap_or(base.weight),
            delta_min: self.delta_min.unwrap_or(base.delta_min),
            delta_max: self.delta_max.unwrap_or(base.delta_max),
            score_bonus: self.score_bonus.unwrap_or(base.score_bonus),
        }
    }
}

fn overlay<'de, D>(deserializer: D, base: CategoryRule) -> Result<CategoryRule, D::Error>
where
    D: Deserializer<'de>,
{
    CategoryOverride::deserialize(deserializer).map(|o| o.apply(base))
}

fn stable_rule<'de, D: Deserializer<'de>>(d: D) -> Result<CategoryRule, D::Error> {
    overlay(d, MutationConfig::default_stable())
}

fn beneficial_rule<'de, D: Deserializer<'de>>(d: D) -> Result<CategoryRule, D::Error> {
    overlay(d, MutationConfig::default_beneficial())
}

fn adverse_rule<'de, D: Deserializer<'de>>(d: D) -> Result<CategoryRule, D::Error> {
    overlay(d, MutationConfig::default_adverse())
}

fn exceptional_rule<'de, D: Deserializer<'de>>(d: D) -> Result<CategoryRule, D::Error> {
    overlay(d, MutationConfig::default_exceptional())
}

impl CategoryRule {
    const fn new(weight: f64, delta: (f64, f64), score_bonus: f64) -> Self {
        Self {
            weight,
            delta_min: delta.0,
            delta_max: delta.1,
            score_bonus,
        }
    }
}

/// Category table, rank thresholds and trait chances for growth mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationConfig {
    #[serde(default = "MutationConfig::default_candidate_count")]
    pub candidate_count: usize,
    #[serde(
        default = "MutationConfig::default_stable",
        deserialize_with = "stable_rule"
    )]
    pub stable: CategoryRule,
    #[serde(
        default = "MutationConfig::default_beneficial",
        deserialize_with = "beneficial_rule"
    )]
    pub beneficial: CategoryRule,
    #[serde(
        default = "MutationConfig::default_adverse",
        deserialize_with = "adverse_rule"
    )]
    pub adverse: CategoryRule,
    #[serde(
        default = "MutationConfig::default_exceptional",
        deserialize_with = "exceptional_rule"
    )]
    pub exceptional: CategoryRule,
    /// Score contributed per unit of delta.
    #[serde(default = "MutationConfig::default_delta_score_scale")]
    pub delta_score_scale: f64,
    #[serde(default = "MutationConfig::default_exceptional_rank_score")]
    pub exceptional_rank_score: f64,
    #[serde(default = "MutationConfig::default_rare_rank_score")]
    pub rare_rank_score: f64,
    #[serde(default = "MutationConfig::default_exceptional_trait_chance")]
    pub exceptional_trait_chance: f64,
    #[serde(default = "MutationConfig::default_rare_trait_chance")]
    pub rare_trait_chance: f64,
    #[serde(default = "MutationConfig::default_common_trait_chance")]
    pub common_trait_chance: f64,
}

impl MutationConfig {
    const fn default_candidate_count() -> usize {
        CANDIDATE_COUNT
    }

    const fn default_stable() -> CategoryRule {
        CategoryRule::new(STABLE_WEIGHT, STABLE_DELTA, 0.0)
    }

    const fn default_beneficial() -> CategoryRule {
        CategoryRule::new(BENEFICIAL_WEIGHT, BENEFICIAL_DELTA, BENEFICIAL_BONUS)
    }

    const fn default_adverse() -> CategoryRule {
        CategoryRule::new(ADVERSE_WEIGHT, ADVERSE_DELTA, ADVERSE_BONUS)
    }

    const fn default_exceptional() -> CategoryRule {
        CategoryRule::new(EXCEPTIONAL_WEIGHT, EXCEPTIONAL_DELTA, EXCEPTIONAL_BONUS)
    }

    const fn default_delta_score_scale() -> f64 {
        DELTA_SCORE_SCALE
    }

    const fn default_exceptional_rank_score() -> f64 {
        EXCEPTIONAL_RANK_SCORE
    }

    const fn default_rare_rank_score() -> f64 {
        RARE_RANK_SCORE
    }

    const fn default_exceptional_trait_chance() -> f64 {
        EXCEPTIONAL_TRAIT_CHANCE
    }

    const fn default_rare_trait_chance() -> f64 {
        RARE_TRAIT_CHANCE
    }

    const fn default_common_trait_chance() -> f64 {
        COMMON_TRAIT_CHANCE
    }

    /// Load mutation tuning from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or if validation fails.
    pub fn from_json(json: &str) -> Result<Self, ConfigLoadError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.stable.weight + self.beneficial.weight + self.adverse.weight + self.exceptional.weight
    }

    /// Check tuning invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("candidate_count", usize_to_f64(self.candidate_count))?;
        let rules = [
            ("stable", &self.stable),
            ("beneficial", &self.beneficial),
            ("adverse", &self.adverse),
            ("exceptional", &self.exceptional),
        ];
        for (field, rule) in rules {
            if !(rule.weight.is_finite() && rule.weight >= 0.0) {
                return Err(ConfigError::NegativeWeight {
                    field,
                    weight: rule.weight,
                });
            }
            check_bounds(field, rule.delta_min, rule.delta_max)?;
        }
        let total = self.total_weight();
        if !(total.is_finite() && total > 0.0) {
            return Err(ConfigError::CategoryWeights { total });
        }
        if self.exceptional_rank_score <= self.rare_rank_score {
            return Err(ConfigError::RankThresholds {
                exceptional: self.exceptional_rank_score,
                rare: self.rare_rank_score,
            });
        }
        check_probability("exceptional_trait_chance", self.exceptional_trait_chance)?;
        check_probability("rare_trait_chance", self.rare_trait_chance)?;
        check_probability("common_trait_chance", self.common_trait_chance)?;
        Ok(())
    }
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            candidate_count: Self::default_candidate_count(),
            stable: Self::default_stable(),
            beneficial: Self::default_beneficial(),
            adverse: Self::default_adverse(),
            exceptional: Self::default_exceptional(),
            delta_score_scale: Self::default_delta_score_scale(),
            exceptional_rank_score: Self::default_exceptional_rank_score(),
            rare_rank_score: Self::default_rare_rank_score(),
            exceptional_trait_chance: Self::default_exceptional_trait_chance(),
            rare_trait_chance: Self::default_rare_trait_chance(),
            common_trait_chance: Self::default_common_trait_chance(),
        }
    }
}

/// Complete engine tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub combat: CombatConfig,
    #[serde(default)]
    pub mutation: MutationConfig,
}

impl EngineConfig {
    /// Check every sub-configuration.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.combat.validate()?;
        self.mutation.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = CombatConfig::from_json(r#"{ "max_cycles": 12 }"#).unwrap();
        assert_eq!(cfg.max_cycles, 12);
        assert_eq!(cfg.initiative_threshold, 1_000);
        assert!((cfg.hit_max - 0.98).abs() < f64::EPSILON);

        let mutation = MutationConfig::from_json("{}").unwrap();
        assert_eq!(mutation, MutationConfig::default());
    }

    #[test]
    fn from_json_rejects_inverted_hit_bounds() {
        let err = CombatConfig::from_json(r#"{ "hit_min": 0.9, "hit_max": 0.5 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::Invalid(ConfigError::InvertedBounds { field: "hit", .. })
        ));
        assert!(matches!(
            CombatConfig::from_json("{ nope").unwrap_err(),
            ConfigLoadError::Json(_)
        ));
        let err = MutationConfig::from_json(r#"{ "candidate_count": 0 }"#).unwrap_err();
        assert!(err.to_string().contains("candidate_count"));
    }

    #[test]
    fn unvalidated_bounds_do_not_panic() {
        let cfg = CombatConfig {
            hit_min: 0.9,
            hit_max: 0.5,
            crit_min: 0.6,
            crit_max: 0.1,
            ..CombatConfig::default()
        };
        assert!((cfg.hit_chance(0, 0) - 0.5).abs() < 1e-12);
        assert!((cfg.crit_chance(0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn sparse_category_keeps_its_own_bonus() {
        let mutation =
            MutationConfig::from_json(r#"{ "adverse": { "weight": 0.4 }, "stable": {} }"#).unwrap();
        assert!((mutation.adverse.weight - 0.4).abs() < f64::EPSILON);
        assert!((mutation.adverse.score_bonus - ADVERSE_BONUS).abs() < f64::EPSILON);
        assert_eq!(
            (mutation.adverse.delta_min, mutation.adverse.delta_max),
            ADVERSE_DELTA
        );
        assert_eq!(mutation.stable, MutationConfig::default_stable());
    }

    #[test]
    fn negative_weight_names_the_category() {
        let mutation = MutationConfig {
            beneficial: CategoryRule {
                weight: -0.1,
                ..MutationConfig::default_beneficial()
            },
            ..MutationConfig::default()
        };
        assert_eq!(
            mutation.validate(),
            Err(ConfigError::NegativeWeight {
                field: "beneficial",
                weight: -0.1,
            })
        );
    }

    #[test]
    fn hit_chance_is_clamped() {
        let cfg = CombatConfig::default();
        assert!((cfg.hit_chance(100, 0) - 0.98).abs() < 1e-12);
        assert!((cfg.hit_chance(0, 100_000) - 0.30).abs() < 1e-12);
        assert!((cfg.hit_chance(90, 90) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn crit_chance_has_floor() {
        let cfg = CombatConfig::default();
        assert!((cfg.crit_chance(0) - 0.05).abs() < 1e-12);
        assert!((cfg.crit_chance(200) - 0.5).abs() < 1e-12);
        assert!((cfg.crit_chance(-200) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn invalid_tuning_is_rejected() {
        let cfg = CombatConfig {
            hit_min: 0.9,
            hit_max: 0.5,
            ..CombatConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvertedBounds { field: "hit", .. })
        ));

        let cfg = CombatConfig {
            max_cycles: 0,
            ..CombatConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NotPositive {
                field: "max_cycles",
                ..
            })
        ));

        let mutation = MutationConfig {
            rare_rank_score: 50.0,
            ..MutationConfig::default()
        };
        assert!(matches!(
            mutation.validate(),
            Err(ConfigError::RankThresholds { .. })
        ));
    }
}
