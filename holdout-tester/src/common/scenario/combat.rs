use anyhow::{Result, ensure};
use holdout_engine::{Character, Equipment, JobClass, Morale, RosterRequest};

use super::{
    RunSummary, ScenarioCtx, TestScenario, encounters_concluded, health_invariants,
    survivor_party,
};

const NIGHTS: u32 = 10;
const THREAT_STEPS: [i32; 4] = [0, 20, 40, 60];
const PROLOGUE_MORALE: i32 = 100;
const MORALE_EXTREMES: [i32; 2] = [20, 300];

fn drive_prologue(ctx: &ScenarioCtx<'_>, summary: &mut RunSummary) -> Result<()> {
    let engine = ctx.engine()?;
    let commander = Character::recruit("commander", "Commander", JobClass::Warrior)
        .with_equipment(Equipment::Crowbar);
    let enemies = engine.roster(RosterRequest::Prologue);
    summary.fight(
        &engine,
        "prologue doorway",
        &[commander],
        enemies,
        Morale(PROLOGUE_MORALE),
    );
    Ok(())
}

fn doorway_is_a_lone_walker(summary: &RunSummary) -> Result<()> {
    for record in &summary.encounters {
        ensure!(
            record.enemies.len() == 1,
            "doorway spawned {} enemies",
            record.enemies.len()
        );
        ensure!(
            record.party.len() == 1 && record.party[0].equipment == Some(Equipment::Crowbar),
            "commander entered without the crowbar"
        );
    }
    Ok(())
}

pub fn prologue_doorway_scenario() -> TestScenario {
    TestScenario::new("Prologue Doorway Fight", drive_prologue)
        .with_expectation(encounters_concluded)
        .with_expectation(health_invariants)
        .with_expectation(doorway_is_a_lone_walker)
}

/// Ten nights back to back; damage carries over and the run ends on a wipe.
fn drive_nights(ctx: &ScenarioCtx<'_>, summary: &mut RunSummary) -> Result<()> {
    let engine = ctx.engine()?;
    let mut party = survivor_party();
    for (day, threat) in (1..=NIGHTS).zip(THREAT_STEPS.iter().copied().cycle()) {
        let enemies = engine.roster(RosterRequest::Night { day, threat });
        party = summary.fight(
            &engine,
            format!("night {day} (threat {threat})"),
            &party,
            enemies,
            Morale::default(),
        );
        if ctx.verbose
            && let Some(record) = summary.encounters.last()
        {
            println!(
                "     ↳ {}: {} after {} turns",
                record.label, record.result.outcome, record.result.turns
            );
        }
        if !party.iter().any(Character::is_alive) {
            break;
        }
    }
    Ok(())
}

fn rosters_are_well_formed(summary: &RunSummary) -> Result<()> {
    for record in &summary.encounters {
        ensure!(
            record.enemies.len() >= 2,
            "{}: only {} enemies spawned",
            record.label,
            record.enemies.len()
        );
        for (slot, enemy) in record.enemies.iter().enumerate() {
            ensure!(
                enemy.id == format!("enemy_{slot}"),
                "{}: slot {slot} carries id {}",
                record.label,
                enemy.id
            );
        }
    }
    Ok(())
}

fn fallen_stay_down(summary: &RunSummary) -> Result<()> {
    for pair in summary.encounters.windows(2) {
        let [before, after] = pair else { continue };
        for (report, member) in before.result.allies.iter().zip(&after.party) {
            ensure!(
                report.final_hp == member.current_hp,
                "{}: {} carried {} HP into the next night instead of {}",
                after.label,
                member.id,
                member.current_hp,
                report.final_hp
            );
        }
    }
    Ok(())
}

pub fn night_escalation_scenario() -> TestScenario {
    TestScenario::new("Night Raid Escalation", drive_nights)
        .with_expectation(encounters_concluded)
        .with_expectation(health_invariants)
        .with_expectation(rosters_are_well_formed)
        .with_expectation(fallen_stay_down)
}

fn drive_boss(ctx: &ScenarioCtx<'_>, summary: &mut RunSummary) -> Result<()> {
    let engine = ctx.engine()?;
    let party = survivor_party();
    let enemies = engine.roster(RosterRequest::Boss);
    summary.fight(&engine, "elevator boss", &party, enemies, Morale::default());
    Ok(())
}

fn boss_reports_every_member(summary: &RunSummary) -> Result<()> {
    for record in &summary.encounters {
        ensure!(
            record.enemies.iter().all(|enemy| enemy.elite),
            "{}: boss roster lost its elite flag",
            record.label
        );
        for member in &record.party {
            ensure!(
                record.result.report(&member.id).is_some(),
                "{}: no report for {}",
                record.label,
                member.id
            );
        }
    }
    Ok(())
}

pub fn elevator_boss_scenario() -> TestScenario {
    TestScenario::new("Elevator Nightmare Boss", drive_boss)
        .with_expectation(encounters_concluded)
        .with_expectation(health_invariants)
        .with_expectation(boss_reports_every_member)
}

/// The same raid fought at both morale extremes.
fn drive_morale(ctx: &ScenarioCtx<'_>, summary: &mut RunSummary) -> Result<()> {
    let engine = ctx.engine()?;
    let party = survivor_party();
    let enemies = engine.roster(RosterRequest::Night { day: 5, threat: 40 });
    for morale in MORALE_EXTREMES {
        summary.fight(
            &engine,
            format!("morale {morale}"),
            &party,
            enemies.clone(),
            Morale(morale),
        );
    }
    Ok(())
}

fn both_extremes_recorded(summary: &RunSummary) -> Result<()> {
    let recorded: Vec<i32> = summary
        .encounters
        .iter()
        .map(|record| record.morale.value())
        .collect();
    ensure!(
        recorded == MORALE_EXTREMES,
        "expected fights at {MORALE_EXTREMES:?}, got {recorded:?}"
    );
    Ok(())
}

pub fn low_morale_scenario() -> TestScenario {
    TestScenario::new("Morale Extremes", drive_morale)
        .with_expectation(encounters_concluded)
        .with_expectation(health_invariants)
        .with_expectation(both_extremes_recorded)
}
