use holdout_engine::{
    Character, CombatConfig, CombatEvent, CombatOutcome, CombatRequest, CombatResult, Enemy,
    EnemyKind, Equipment, JobClass, Morale, RosterRequest, SimulationEngine, night_roster,
    prologue_roster, resolve_combat,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand_chacha::ChaCha20Rng;

fn survivors() -> Vec<Character> {
    JobClass::ALL
        .iter()
        .enumerate()
        .map(|(idx, job)| Character::recruit(format!("s{idx}"), format!("Survivor {idx}"), *job))
        .collect()
}

fn assert_health_invariants(party: &[Character], result: &CombatResult) {
    assert_eq!(result.allies.len(), party.len());
    for (member, report) in party.iter().zip(&result.allies) {
        assert_eq!(member.id, report.id);
        assert!(report.final_hp >= 0, "{} went negative", report.id);
        assert!(report.final_hp <= member.max_hp());
        assert!(report.final_hp <= report.entry_hp);
        assert_eq!(report.damage_taken, report.entry_hp - report.final_hp);
    }
}

fn total_damage(result: &CombatResult) -> i64 {
    result
        .allies
        .iter()
        .map(|report| i64::from(report.damage_taken))
        .sum()
}

#[test]
fn night_raids_always_terminate_with_valid_health() {
    let cfg = CombatConfig::default();
    let party = survivors();
    let mut rng = SmallRng::seed_from_u64(0xBEEF);
    for day in 1..=10 {
        for threat in [0, 30, 60, 90] {
            let enemies = night_roster(day, threat, &mut rng);
            let result = resolve_combat(&party, &enemies, Morale::default(), &cfg, &mut rng);
            assert!(result.cycles <= cfg.max_cycles);
            assert!(matches!(
                result.log.last().map(|entry| &entry.event),
                Some(CombatEvent::Concluded { outcome }) if *outcome == result.outcome
            ));
            assert_health_invariants(&party, &result);
        }
    }
}

#[test]
fn crowbar_hero_clears_the_doorway_most_of_the_time() {
    let cfg = CombatConfig::default();
    let hero = Character::recruit("hero", "Commander", JobClass::Warrior)
        .with_equipment(Equipment::Crowbar);
    let party = [hero];
    let enemies = prologue_roster();
    let mut rng = ChaCha20Rng::seed_from_u64(11);
    let wins = (0..200)
        .filter(|_| resolve_combat(&party, &enemies, Morale::default(), &cfg, &mut rng).won())
        .count();
    assert!(wins > 150, "doorway walker won too often: {wins}/200 hero wins");
}

#[test]
fn morale_swings_the_fight() {
    let cfg = CombatConfig::default();
    let party = survivors();
    let enemies: Vec<Enemy> = (0..8)
        .map(|slot| EnemyKind::Runner.spawn(format!("enemy_{slot}")))
        .collect();
    let mut broken_damage = 0i64;
    let mut inspired_damage = 0i64;
    for seed in 0..60 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let broken = resolve_combat(&party, &enemies, Morale(0), &cfg, &mut rng);
        let mut rng = SmallRng::seed_from_u64(seed);
        let inspired = resolve_combat(&party, &enemies, Morale(300), &cfg, &mut rng);
        broken_damage += total_damage(&broken);
        inspired_damage += total_damage(&inspired);
        assert_health_invariants(&party, &broken);
        assert_health_invariants(&party, &inspired);
    }
    assert!(
        broken_damage > inspired_damage,
        "low morale should hurt more: {broken_damage} vs {inspired_damage}"
    );
}

#[test]
fn immovable_rosters_stall_at_the_cap() {
    let cfg = CombatConfig {
        max_cycles: 25,
        ..CombatConfig::default()
    };
    let party = survivors();
    let fortress = Enemy {
        id: "wall".into(),
        name: "Wall".into(),
        hp: 1_000_000,
        max_hp: 1_000_000,
        attack: 0,
        defense: 0,
        speed: 0,
        accuracy: 0,
        evasion: 0,
        crit: Some(0),
        elite: true,
    };
    let mut rng = SmallRng::seed_from_u64(1);
    let result = resolve_combat(&party, &[fortress], Morale::default(), &cfg, &mut rng);
    assert_eq!(result.outcome, CombatOutcome::Stalemate);
    assert_eq!(result.cycles, 25);
    assert!(
        result
            .log
            .iter()
            .any(|entry| entry.event == CombatEvent::Stalemate { cycles: 25 })
    );
    assert!(!result.won());
}

#[test]
fn wounded_party_enters_with_clamped_health() {
    let cfg = CombatConfig::default();
    let mut party = survivors();
    party[0].current_hp = 10_000;
    party[1].current_hp = 0;
    let enemies = [EnemyKind::Walker.spawn("enemy_0")];
    let mut rng = SmallRng::seed_from_u64(3);
    let result = resolve_combat(&party, &enemies, Morale::default(), &cfg, &mut rng);
    assert_eq!(result.allies[0].entry_hp, party[0].max_hp());
    assert_eq!(result.allies[1].entry_hp, 0);
    assert_eq!(result.allies[1].final_hp, 0);
    assert_eq!(result.allies[1].damage_taken, 0);
}

#[test]
fn fallen_units_never_act_again() {
    let cfg = CombatConfig::default();
    let party = survivors();
    let mut rng = SmallRng::seed_from_u64(0xFA11);
    for _ in 0..20 {
        let mut enemies = night_roster(6, 70, &mut rng);
        for (slot, enemy) in enemies.iter_mut().enumerate() {
            enemy.name = format!("{} #{slot}", enemy.name);
        }
        let result = resolve_combat(&party, &enemies, Morale(80), &cfg, &mut rng);
        let mut fallen: Vec<&str> = Vec::new();
        for entry in &result.log {
            match &entry.event {
                CombatEvent::Hit {
                    attacker,
                    target,
                    remaining_hp,
                    ..
                } => {
                    assert!(!fallen.contains(&attacker.as_str()), "{attacker} acted late");
                    assert!(!fallen.contains(&target.as_str()), "{target} hit while down");
                    if *remaining_hp == 0 {
                        fallen.push(target.as_str());
                    }
                }
                CombatEvent::Missed { attacker, target } => {
                    assert!(!fallen.contains(&attacker.as_str()));
                    assert!(!fallen.contains(&target.as_str()));
                }
                _ => {}
            }
        }
    }
}

#[test]
fn engine_replays_and_merges_results() {
    let party = survivors();
    let first = SimulationEngine::new(0x00C0_FFEE);
    let second = SimulationEngine::new(0x00C0_FFEE);
    let enemies = first.roster(RosterRequest::Night { day: 4, threat: 45 });
    assert_eq!(enemies, second.roster(RosterRequest::Night { day: 4, threat: 45 }));

    let request = CombatRequest {
        allies: &party,
        enemies: &enemies,
        morale: Morale(120),
    };
    let a = first.resolve_combat(&request);
    let b = second.resolve_combat(&request);
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_eq!(a, b);

    let merged = a.apply_to(&party);
    for (member, report) in merged.iter().zip(&a.allies) {
        assert_eq!(member.current_hp, report.final_hp);
    }
}
