use anyhow::{Result, ensure};
use holdout_engine::{Equipment, JobClass};

use super::{RunSummary, ScenarioCtx, TestScenario, survivor_party};

const VETERAN_LEVEL: u32 = 20;

fn drive(ctx: &ScenarioCtx<'_>, summary: &mut RunSummary) -> Result<()> {
    let engine = ctx.engine()?;
    for recruit in survivor_party() {
        let mut veteran = recruit.clone();
        veteran.id = format!("{}_veteran", recruit.id);
        veteran.level = VETERAN_LEVEL;
        if veteran.job == JobClass::Warrior {
            veteran = veteran.with_equipment(Equipment::Crowbar);
        }
        summary.derive(&engine, recruit);
        summary.derive(&engine, veteran);
    }
    Ok(())
}

fn attributes_are_sane(summary: &RunSummary) -> Result<()> {
    ensure!(
        summary.derived.len() == JobClass::ALL.len() * 2,
        "expected a recruit and a veteran per job, got {}",
        summary.derived.len()
    );
    for (character, stats) in &summary.derived {
        let base_hp = character.job.base_stats().hp;
        ensure!(
            stats.max_hp >= base_hp,
            "{} max HP {} fell below base {base_hp}",
            character.id,
            stats.max_hp
        );
        for (label, value) in [
            ("attack", stats.attack),
            ("defense", stats.defense),
            ("speed", stats.speed),
            ("accuracy", stats.accuracy),
            ("evasion", stats.evasion),
            ("crit", stats.crit),
        ] {
            ensure!(value >= 0, "{} has negative {label}: {value}", character.id);
        }
    }
    Ok(())
}

fn veterans_outgrow_recruits(summary: &RunSummary) -> Result<()> {
    for pair in summary.derived.chunks(2) {
        if let [(recruit, fresh), (_, veteran)] = pair {
            ensure!(
                veteran.max_hp >= fresh.max_hp,
                "{:?} veteran lost health with levels",
                recruit.job
            );
            ensure!(
                veteran.attack >= fresh.attack,
                "{:?} veteran lost attack with levels",
                recruit.job
            );
        }
    }
    Ok(())
}

pub fn smoke_scenario() -> TestScenario {
    TestScenario::new("Smoke Test", drive)
        .with_expectation(attributes_are_sane)
        .with_expectation(veterans_outgrow_recruits)
}
