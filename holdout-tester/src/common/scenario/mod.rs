use anyhow::{Context, Result, ensure};
use holdout_engine::{
    Character, CombatAttributes, CombatEvent, CombatRequest, CombatResult, Enemy, EngineConfig,
    JobClass, Morale, MutationRequest, MutationSet, SimulationEngine,
};
use std::sync::Arc;

pub mod combat;
pub mod mutation;
pub mod smoke;

/// Per-iteration inputs handed to a scenario driver.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioCtx<'a> {
    pub seed: u64,
    pub config: &'a EngineConfig,
    pub verbose: bool,
}

impl ScenarioCtx<'_> {
    /// Fresh engine for this iteration's seed and tuning.
    pub fn engine(&self) -> Result<SimulationEngine> {
        SimulationEngine::with_config(self.seed, self.config.clone())
            .with_context(|| format!("building engine for seed {}", self.seed))
    }
}

#[derive(Debug, Clone)]
pub struct EncounterRecord {
    pub label: String,
    pub morale: Morale,
    pub party: Vec<Character>,
    pub enemies: Vec<Enemy>,
    pub result: CombatResult,
}

#[derive(Debug, Clone)]
pub struct MutationRecord {
    pub character: Character,
    pub candidates: MutationSet,
}

/// Everything a driver observed during one iteration.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub seed: u64,
    pub config: EngineConfig,
    pub derived: Vec<(Character, CombatAttributes)>,
    pub encounters: Vec<EncounterRecord>,
    pub mutations: Vec<MutationRecord>,
}

impl RunSummary {
    #[must_use]
    pub fn new(ctx: &ScenarioCtx<'_>) -> Self {
        Self {
            seed: ctx.seed,
            config: ctx.config.clone(),
            derived: Vec::new(),
            encounters: Vec::new(),
            mutations: Vec::new(),
        }
    }

    /// Resolve one encounter, record it, and return the party with its health merged back.
    pub fn fight(
        &mut self,
        engine: &SimulationEngine,
        label: impl Into<String>,
        party: &[Character],
        enemies: Vec<Enemy>,
        morale: Morale,
    ) -> Vec<Character> {
        let result = engine.resolve_combat(&CombatRequest {
            allies: party,
            enemies: &enemies,
            morale,
        });
        let merged = result.apply_to(party);
        self.encounters.push(EncounterRecord {
            label: label.into(),
            morale,
            party: party.to_vec(),
            enemies,
            result,
        });
        merged
    }

    pub fn mutate(&mut self, engine: &SimulationEngine, character: &Character) {
        let candidates = engine.generate_mutations(&MutationRequest { character });
        self.mutations.push(MutationRecord {
            character: character.clone(),
            candidates,
        });
    }

    pub fn derive(&mut self, engine: &SimulationEngine, character: Character) {
        let attributes = engine.derive_stats(&character);
        self.derived.push((character, attributes));
    }
}

pub type ScenarioDriver = fn(&ScenarioCtx<'_>, &mut RunSummary) -> Result<()>;

/// Assertion hook run after a driver completes.
type ExpectationFn = Arc<dyn Fn(&RunSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct Expectation(ExpectationFn);

impl std::fmt::Debug for Expectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Expectation").finish()
    }
}

impl Expectation {
    pub fn evaluate(&self, summary: &RunSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for Expectation
where
    F: Fn(&RunSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    driver: ScenarioDriver,
    pub expectations: Vec<Expectation>,
}

impl TestScenario {
    #[must_use]
    pub fn new(name: impl Into<String>, driver: ScenarioDriver) -> Self {
        Self {
            name: name.into(),
            driver,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<Expectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }

    /// Drive one iteration and collect what happened.
    pub fn run(&self, ctx: &ScenarioCtx<'_>) -> Result<RunSummary> {
        let mut summary = RunSummary::new(ctx);
        (self.driver)(ctx, &mut summary)?;
        Ok(summary)
    }
}

/// One recruit per job, at full health.
#[must_use]
pub fn survivor_party() -> Vec<Character> {
    JobClass::ALL
        .iter()
        .enumerate()
        .map(|(idx, job)| Character::recruit(format!("survivor_{idx}"), format!("{job:?}"), *job))
        .collect()
}

/// Every recorded encounter ended inside the cycle cap with a closing log entry.
pub fn encounters_concluded(summary: &RunSummary) -> Result<()> {
    ensure!(!summary.encounters.is_empty(), "no encounters were resolved");
    let cap = summary.config.combat.max_cycles;
    for record in &summary.encounters {
        let result = &record.result;
        ensure!(
            result.cycles <= cap,
            "{}: ran {} cycles past the cap of {cap}",
            record.label,
            result.cycles
        );
        let concluded = matches!(
            result.log.last().map(|entry| &entry.event),
            Some(CombatEvent::Concluded { outcome }) if *outcome == result.outcome
        );
        ensure!(concluded, "{}: log does not close with the outcome", record.label);
    }
    Ok(())
}

/// Ally reports line up with the party and health only moves down within bounds.
pub fn health_invariants(summary: &RunSummary) -> Result<()> {
    for record in &summary.encounters {
        let reports = &record.result.allies;
        ensure!(
            reports.len() == record.party.len(),
            "{}: {} ally reports for {} allies",
            record.label,
            reports.len(),
            record.party.len()
        );
        for (member, report) in record.party.iter().zip(reports) {
            ensure!(member.id == report.id, "{}: report order drifted", record.label);
            let entry = member.current_hp.clamp(0, member.max_hp());
            ensure!(
                report.entry_hp == entry,
                "{}: {} entered at {} instead of {entry}",
                record.label,
                report.id,
                report.entry_hp
            );
            ensure!(
                (0..=report.entry_hp).contains(&report.final_hp),
                "{}: {} finished at {} HP",
                record.label,
                report.id,
                report.final_hp
            );
            ensure!(
                report.damage_taken == report.entry_hp - report.final_hp,
                "{}: {} damage ledger is off",
                record.label,
                report.id
            );
        }
    }
    Ok(())
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    match name.to_lowercase().as_str() {
        "smoke" => Some(smoke::smoke_scenario()),
        "prologue-doorway" | "prologue" => Some(combat::prologue_doorway_scenario()),
        "night-escalation" | "nights" => Some(combat::night_escalation_scenario()),
        "elevator-boss" | "boss" => Some(combat::elevator_boss_scenario()),
        "low-morale" | "morale" => Some(combat::low_morale_scenario()),
        "deterministic-replay" | "replay" => Some(mutation::deterministic_replay_scenario()),
        "mutation-bounds" | "mutation" => Some(mutation::mutation_bounds_scenario()),
        _ => None,
    }
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Smoke Test"),
        ("prologue-doorway", "Prologue Doorway Fight"),
        ("night-escalation", "Night Raid Escalation"),
        ("elevator-boss", "Elevator Nightmare Boss"),
        ("low-morale", "Morale Extremes"),
        ("deterministic-replay", "Deterministic Replay"),
        ("mutation-bounds", "Mutation Growth Bounds"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_scenario_resolves() {
        for (key, name) in list_scenarios() {
            let scenario = get_scenario(key).unwrap();
            assert_eq!(scenario.name, name);
            assert!(!scenario.expectations.is_empty(), "{key} checks nothing");
        }
        assert!(get_scenario("BOSS").is_some());
        assert!(get_scenario("nope").is_none());
    }

    #[test]
    fn every_scenario_passes_on_default_tuning() {
        let config = EngineConfig::default();
        for (key, _) in list_scenarios() {
            let scenario = get_scenario(key).unwrap();
            for seed in [1, 1337, 0xDEAD_BEEF] {
                let ctx = ScenarioCtx {
                    seed,
                    config: &config,
                    verbose: false,
                };
                let summary = scenario.run(&ctx).unwrap();
                for expectation in &scenario.expectations {
                    if let Err(err) = expectation.evaluate(&summary) {
                        panic!("{key} seed {seed}: {err}");
                    }
                }
            }
        }
    }

    #[test]
    fn health_check_flags_a_broken_ledger() {
        let config = EngineConfig::default();
        let ctx = ScenarioCtx {
            seed: 4,
            config: &config,
            verbose: false,
        };
        let mut summary = combat::elevator_boss_scenario().run(&ctx).unwrap();
        assert!(health_invariants(&summary).is_ok());
        summary.encounters[0].result.allies[0].damage_taken += 1;
        assert!(health_invariants(&summary).is_err());
        summary.encounters.clear();
        assert!(encounters_concluded(&summary).is_err());
    }
}
