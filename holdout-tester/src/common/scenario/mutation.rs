use anyhow::{Result, ensure};
use holdout_engine::{
    Character, GROWTH_MAX, GROWTH_MIN, GrowthVector, JobClass, Morale, MutationRank,
    RosterRequest,
};

use super::{RunSummary, ScenarioCtx, TestScenario, encounters_concluded, survivor_party};

const REPLAY_PASSES: [&str; 2] = ["first", "second"];

/// Two engines on the same seed walk the same calls in the same order.
fn drive_replay(ctx: &ScenarioCtx<'_>, summary: &mut RunSummary) -> Result<()> {
    let party = survivor_party();
    for pass in REPLAY_PASSES {
        let engine = ctx.engine()?;
        let enemies = engine.roster(RosterRequest::Night { day: 3, threat: 30 });
        summary.fight(
            &engine,
            format!("replay {pass}"),
            &party,
            enemies,
            Morale::default(),
        );
        summary.mutate(&engine, &party[0]);
    }
    Ok(())
}

fn replays_match(summary: &RunSummary) -> Result<()> {
    let [first, second] = summary.encounters.as_slice() else {
        anyhow::bail!("expected two encounters, got {}", summary.encounters.len());
    };
    ensure!(
        first.enemies == second.enemies,
        "rosters diverged for seed {}",
        summary.seed
    );
    let (a, b) = (first.result.fingerprint(), second.result.fingerprint());
    ensure!(a == b, "fingerprints diverged: {a:#018x} vs {b:#018x}");
    ensure!(first.result == second.result, "results diverged despite equal fingerprints");

    let [left, right] = summary.mutations.as_slice() else {
        anyhow::bail!("expected two mutation batches, got {}", summary.mutations.len());
    };
    ensure!(
        left.candidates == right.candidates,
        "mutation batches diverged for seed {}",
        summary.seed
    );
    Ok(())
}

pub fn deterministic_replay_scenario() -> TestScenario {
    TestScenario::new("Deterministic Replay", drive_replay)
        .with_expectation(encounters_concluded)
        .with_expectation(replays_match)
}

/// Every job at both growth extremes.
fn drive_bounds(ctx: &ScenarioCtx<'_>, summary: &mut RunSummary) -> Result<()> {
    let engine = ctx.engine()?;
    for (label, rate) in [("floor", GROWTH_MIN), ("ceiling", GROWTH_MAX)] {
        for job in JobClass::ALL {
            let mut subject = Character::recruit(
                format!("{label}_{job:?}").to_lowercase(),
                format!("{job:?} at the {label}"),
                job,
            );
            subject.growth = GrowthVector::from_array([rate; 6])?;
            summary.mutate(&engine, &subject);
        }
    }
    Ok(())
}

fn candidates_respect_bounds(summary: &RunSummary) -> Result<()> {
    let cfg = &summary.config.mutation;
    ensure!(!summary.mutations.is_empty(), "no mutation batches generated");
    for record in &summary.mutations {
        let id = &record.character.id;
        ensure!(
            record.candidates.len() == cfg.candidate_count,
            "{id}: {} candidates instead of {}",
            record.candidates.len(),
            cfg.candidate_count
        );
        ensure!(
            record
                .candidates
                .windows(2)
                .all(|pair| pair[0].score >= pair[1].score),
            "{id}: candidates are not sorted by score"
        );
        for candidate in &record.candidates {
            for (axis, rate) in candidate.growth.iter() {
                ensure!(
                    (GROWTH_MIN..=GROWTH_MAX).contains(&rate),
                    "{id}: {axis} rate {rate} escaped the growth bounds"
                );
            }
            let expected = MutationRank::from_score(candidate.score, cfg);
            ensure!(
                candidate.rank == expected,
                "{id}: score {} ranked {} instead of {expected}",
                candidate.score,
                candidate.rank
            );
            let applied = candidate.apply_to(&record.character);
            ensure!(
                applied.growth == candidate.growth,
                "{id}: applying a candidate lost its growth"
            );
        }
    }
    Ok(())
}

pub fn mutation_bounds_scenario() -> TestScenario {
    TestScenario::new("Mutation Growth Bounds", drive_bounds)
        .with_expectation(candidates_respect_bounds)
}
