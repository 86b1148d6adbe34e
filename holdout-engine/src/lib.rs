//! Holdout Simulation Core
//!
//! Platform-agnostic rules engine for the Holdout survival game: stat
//! derivation, the auto-battle combat resolver and growth mutation. Every call
//! takes immutable snapshots and returns fresh results; merging them back into
//! persistent state is left to the caller.

pub mod combat;
pub mod config;
pub mod constants;
pub mod morale;
pub mod mutation;
pub mod numbers;
pub mod rng;
pub mod roster;
pub mod stats;

use anyhow::Context;

// Re-export commonly used types
pub use combat::{
    AllyReport, CombatEvent, CombatLogEntry, CombatOutcome, CombatResult, CombatUnit, Enemy,
    Side, Strike, resolve_combat, resolve_strike,
};
pub use config::{
    CategoryRule, CombatConfig, ConfigError, ConfigLoadError, EngineConfig, MutationConfig,
};
pub use constants::{GROWTH_MAX, GROWTH_MIN, MORALE_NEUTRAL};
pub use morale::Morale;
pub use mutation::{
    AxisMutation, BonusTrait, MutationCandidate, MutationCategory, MutationRank, MutationSet,
    generate_mutation_candidates,
};
pub use rng::{CountingRng, RngBundle};
pub use roster::{EnemyKind, boss_roster, enemy_count, night_roster, prologue_roster};
pub use stats::{
    AttackFormula, Character, CombatAttributes, Equipment, GrowthError, GrowthRates,
    GrowthVector, JobBaseStats, JobClass, StatAxis, derive_stats,
};

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load configuration data for a specific system
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: serde::de::DeserializeOwned;
}

/// Inputs for one encounter.
#[derive(Debug, Clone, Copy)]
pub struct CombatRequest<'a> {
    pub allies: &'a [Character],
    pub enemies: &'a [Enemy],
    pub morale: Morale,
}

/// Inputs for one mutation batch.
#[derive(Debug, Clone, Copy)]
pub struct MutationRequest<'a> {
    pub character: &'a Character,
}

/// Which enemy roster to assemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterRequest {
    Night { day: u32, threat: i32 },
    Prologue,
    Boss,
}

/// Seeded facade over the three core contracts.
///
/// Combat, mutation and roster draws come from separate streams of the same
/// [`RngBundle`], so replaying a seed replays every call in order.
#[derive(Debug, Clone)]
pub struct SimulationEngine {
    config: EngineConfig,
    rng: RngBundle,
}

impl SimulationEngine {
    /// Engine with the built-in tuning.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            config: EngineConfig::default(),
            rng: RngBundle::from_user_seed(seed),
        }
    }

    /// Engine with custom tuning.
    ///
    /// # Errors
    ///
    /// Returns an error if the tuning violates an invariant.
    pub fn with_config(seed: u64, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            rng: RngBundle::from_user_seed(seed),
        })
    }

    /// Engine with tuning read through a [`DataLoader`] (`combat` and `mutation`).
    ///
    /// # Errors
    ///
    /// Returns an error if either document cannot be loaded or fails validation.
    pub fn from_loader<L>(loader: &L, seed: u64) -> Result<Self, anyhow::Error>
    where
        L: DataLoader,
        L::Error: Into<anyhow::Error>,
    {
        let combat: CombatConfig = loader
            .load_config("combat")
            .map_err(Into::<anyhow::Error>::into)
            .context("loading combat config")?;
        let mutation: MutationConfig = loader
            .load_config("mutation")
            .map_err(Into::<anyhow::Error>::into)
            .context("loading mutation config")?;
        let engine = Self::with_config(seed, EngineConfig { combat, mutation })?;
        Ok(engine)
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn rng(&self) -> &RngBundle {
        &self.rng
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }

    #[must_use]
    pub fn derive_stats(&self, character: &Character) -> CombatAttributes {
        derive_stats(character)
    }

    #[must_use]
    pub fn resolve_combat(&self, request: &CombatRequest<'_>) -> CombatResult {
        let mut rng = self.rng.combat();
        resolve_combat(
            request.allies,
            request.enemies,
            request.morale,
            &self.config.combat,
            &mut *rng,
        )
    }

    #[must_use]
    pub fn generate_mutations(&self, request: &MutationRequest<'_>) -> MutationSet {
        let mut rng = self.rng.mutation();
        generate_mutation_candidates(request.character, &self.config.mutation, &mut *rng)
    }

    #[must_use]
    pub fn roster(&self, request: RosterRequest) -> Vec<Enemy> {
        match request {
            RosterRequest::Night { day, threat } => {
                let mut rng = self.rng.roster();
                night_roster(day, threat, &mut *rng)
            }
            RosterRequest::Prologue => prologue_roster(),
            RosterRequest::Boss => boss_roster(),
        }
    }
}
