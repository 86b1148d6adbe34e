use colored::Colorize;
use holdout_engine::{CombatOutcome, EngineConfig};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::common::scenario::{RunSummary, ScenarioCtx, TestScenario};

/// Combat outcomes observed across every iteration of a scenario.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeTally {
    pub victories: usize,
    pub defeats: usize,
    pub stalemates: usize,
}

impl OutcomeTally {
    pub const fn record(&mut self, outcome: CombatOutcome) {
        match outcome {
            CombatOutcome::AllyVictory => self.victories += 1,
            CombatOutcome::EnemyVictory => self.defeats += 1,
            CombatOutcome::Stalemate => self.stalemates += 1,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.victories + self.defeats + self.stalemates
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    pub outcomes: OutcomeTally,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    config: EngineConfig,
    verbose: bool,
}

impl LogicTester {
    pub const fn new(config: EngineConfig, verbose: bool) -> Self {
        Self { config, verbose }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (seed: {seed})",
                    scenario.name.bright_white()
                );
            }

            results.push(self.run_single_scenario(scenario, seed, iterations));
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();
        let mut outcomes = OutcomeTally::default();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let ctx = ScenarioCtx {
                seed: iteration_seed,
                config: &self.config,
                verbose: self.verbose,
            };

            let verdict = scenario.run(&ctx).map_or_else(
                |err| Err(format!("driver failed: {err:#}")),
                |summary| {
                    for record in &summary.encounters {
                        outcomes.record(record.result.outcome);
                    }
                    evaluate_expectations(scenario, &summary)
                        .map_or(Ok(summary), Err)
                },
            );

            match verdict {
                Ok(summary) => {
                    successes += 1;
                    let duration = start_time.elapsed();
                    performance_data.push(duration);

                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) {}",
                            i + 1,
                            iterations,
                            summarize_run(&summary)
                        );
                    }
                }
                Err(err) => {
                    failures.push(format!(
                        "Iteration {} (seed {iteration_seed}): {err}",
                        i + 1
                    ));

                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            err.red()
                        );
                    }
                }
            }
        }

        let avg_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            outcomes,
            average_duration: avg_duration,
            performance_data,
        }
    }
}

fn evaluate_expectations(scenario: &TestScenario, summary: &RunSummary) -> Option<String> {
    for expectation in &scenario.expectations {
        if let Err(err) = expectation.evaluate(summary) {
            return Some(err.to_string());
        }
    }
    None
}

fn summarize_run(summary: &RunSummary) -> String {
    if summary.encounters.is_empty() {
        return format!(
            "derived:{} mutations:{}",
            summary.derived.len(),
            summary.mutations.len()
        );
    }

    summary
        .encounters
        .iter()
        .rev()
        .take(3)
        .map(|record| {
            format!(
                "{} -> {} ({} turns, {} cycles)",
                record.label, record.result.outcome, record.result.turns, record.result.cycles
            )
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u64>::deserialize(deserializer)?;
        Ok(millis_vec.into_iter().map(Duration::from_millis).collect())
    }
}
