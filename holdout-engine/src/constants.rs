//! Centralized balance and tuning constants for the Holdout simulation core.
//!
//! Job tables, growth templates and enemy templates are fixed content.
//! Encounter and mutation tuning defaults live here too; hosts may override
//! those through [`crate::config`], but the tables below only change through
//! reviewed code changes.

// Growth -------------------------------------------------------------------
pub const GROWTH_MIN: f64 = 0.01;
pub const GROWTH_MAX: f64 = 1.5;
/// Raw attribute points granted per level for each unit of growth.
pub(crate) const GROWTH_POINTS_PER_LEVEL: f64 = 10.0;

// Stat derivation weights -------------------------------------------------
pub(crate) const HP_PER_CON: f64 = 3.0;
pub(crate) const HP_PER_STR: f64 = 1.0;
pub(crate) const DEF_PER_CON: f64 = 1.5;
pub(crate) const DEF_PER_STR: f64 = 0.5;
pub(crate) const SPD_PER_DEX: f64 = 0.8;
pub(crate) const SPD_PER_PER: f64 = 0.2;
pub(crate) const ACC_PER_PER: f64 = 1.5;
pub(crate) const ACC_PER_DEX: f64 = 0.5;
pub(crate) const EVA_PER_DEX: f64 = 1.2;
pub(crate) const EVA_PER_PER: f64 = 0.5;
pub(crate) const CRT_PER_DEX: f64 = 1.0;
pub(crate) const CRT_PER_PER: f64 = 0.5;
pub(crate) const CROWBAR_ATTACK_BONUS: i32 = 15;

/// Base attribute rows in `[hp, atk, def, spd, acc, eva, crit]` order.
pub(crate) const GUARD_BASE: [i32; 7] = [140, 10, 15, 8, 80, 5, 5];
pub(crate) const WARRIOR_BASE: [i32; 7] = [100, 15, 10, 10, 90, 10, 10];
pub(crate) const ASSASSIN_BASE: [i32; 7] = [70, 20, 5, 18, 95, 25, 25];
pub(crate) const RANGER_BASE: [i32; 7] = [65, 18, 6, 14, 110, 15, 20];
pub(crate) const ESPER_BASE: [i32; 7] = [70, 22, 7, 9, 100, 10, 15];
pub(crate) const SUPPORT_BASE: [i32; 7] = [80, 8, 8, 11, 90, 12, 5];

/// Starting growth rows in `[STR, DEX, CON, INT, PER, CHA]` order.
pub(crate) const GUARD_GROWTH: [f64; 6] = [0.4, 0.05, 0.6, 0.05, 0.2, 0.2];
pub(crate) const WARRIOR_GROWTH: [f64; 6] = [0.5, 0.2, 0.4, 0.1, 0.3, 0.3];
pub(crate) const ASSASSIN_GROWTH: [f64; 6] = [0.2, 0.6, 0.2, 0.1, 0.5, 0.1];
pub(crate) const RANGER_GROWTH: [f64; 6] = [0.2, 0.5, 0.2, 0.2, 0.6, 0.1];
pub(crate) const ESPER_GROWTH: [f64; 6] = [0.05, 0.2, 0.2, 0.7, 0.4, 0.2];
pub(crate) const SUPPORT_GROWTH: [f64; 6] = [0.1, 0.3, 0.3, 0.4, 0.3, 0.6];

// Morale -------------------------------------------------------------------
pub const MORALE_NEUTRAL: i32 = 100;
pub(crate) const MORALE_LOW_FLOOR: f64 = 0.4;
pub(crate) const MORALE_LOW_SLOPE: f64 = 0.6;
pub(crate) const MORALE_FRAGILITY: f64 = 0.5;
/// Outgoing damage tiers, highest threshold first.
pub(crate) const MORALE_TIERS: [(i32, f64); 4] = [(300, 1.6), (250, 1.4), (200, 1.2), (150, 1.1)];

// Encounter defaults -------------------------------------------------------
pub(crate) const INITIATIVE_THRESHOLD: i64 = 1_000;
pub(crate) const INITIATIVE_PER_SPEED: i64 = 5;
pub(crate) const MAX_SUBTICKS: u32 = 50;
pub(crate) const MAX_CYCLES: u32 = 200;
pub(crate) const HIT_BASE: f64 = 0.9;
pub(crate) const HIT_DIVISOR: f64 = 500.0;
pub(crate) const HIT_MIN: f64 = 0.30;
pub(crate) const HIT_MAX: f64 = 0.98;
pub(crate) const CRIT_DIVISOR: f64 = 200.0;
pub(crate) const CRIT_MIN: f64 = 0.05;
pub(crate) const CRIT_MAX: f64 = 1.0;
pub(crate) const CRIT_MULTIPLIER: f64 = 1.5;
pub(crate) const DEFENSE_FACTOR: f64 = 0.8;
pub(crate) const MIN_DAMAGE_RATIO: f64 = 0.25;
pub(crate) const VARIANCE_MIN: f64 = 0.9;
pub(crate) const VARIANCE_MAX: f64 = 1.1;
pub(crate) const ENEMY_CRIT: i32 = 5;

// Mutation defaults --------------------------------------------------------
pub(crate) const CANDIDATE_COUNT: usize = 3;
pub(crate) const STABLE_WEIGHT: f64 = 0.50;
pub(crate) const BENEFICIAL_WEIGHT: f64 = 0.25;
pub(crate) const ADVERSE_WEIGHT: f64 = 0.20;
pub(crate) const EXCEPTIONAL_WEIGHT: f64 = 0.05;
pub(crate) const STABLE_DELTA: (f64, f64) = (-0.05, 0.05);
pub(crate) const BENEFICIAL_DELTA: (f64, f64) = (0.10, 0.20);
pub(crate) const ADVERSE_DELTA: (f64, f64) = (-0.20, -0.10);
pub(crate) const EXCEPTIONAL_DELTA: (f64, f64) = (0.25, 0.35);
pub(crate) const BENEFICIAL_BONUS: f64 = 10.0;
pub(crate) const ADVERSE_BONUS: f64 = -15.0;
pub(crate) const EXCEPTIONAL_BONUS: f64 = 30.0;
pub(crate) const DELTA_SCORE_SCALE: f64 = 100.0;
pub(crate) const EXCEPTIONAL_RANK_SCORE: f64 = 40.0;
pub(crate) const RARE_RANK_SCORE: f64 = 15.0;
pub(crate) const EXCEPTIONAL_TRAIT_CHANCE: f64 = 0.80;
pub(crate) const RARE_TRAIT_CHANCE: f64 = 0.30;
pub(crate) const COMMON_TRAIT_CHANCE: f64 = 0.05;

// Night roster -------------------------------------------------------------
pub(crate) const ROSTER_BASE_COUNT: f64 = 2.0;
pub(crate) const ROSTER_PER_DAY: f64 = 0.5;
pub(crate) const ROSTER_THREAT_DIVISOR: f64 = 20.0;
pub(crate) const ROSTER_TANK_THREAT: i32 = 50;
pub(crate) const ROSTER_TANK_ROLL: f64 = 0.8;
pub(crate) const ROSTER_RUNNER_ROLL: f64 = 0.6;
