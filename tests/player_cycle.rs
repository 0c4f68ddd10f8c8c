use std::collections::BTreeSet;

use rand::{SeedableRng, rngs::StdRng};
use rumor_reel::{
    AnimationRegistry, Dataset, OverrideInput, OverrideOutput, Player, PlayerEvent, PlayerState,
    ReelConfig, ReelError, ReelResult, Role,
};

const DT: f64 = 1.0 / 60.0;

fn fast_config() -> ReelConfig {
    let cfg: ReelConfig = serde_json::from_str(include_str!("data/fast_config.json")).unwrap();
    cfg.validate().unwrap();
    cfg
}

fn fixture() -> Dataset {
    Dataset::from_json_str(include_str!("data/rumors.json")).unwrap()
}

/// Tick until `pred` matches an event, collecting everything seen on the way.
fn run_until(
    player: &mut Player,
    max_ticks: usize,
    pred: impl Fn(&PlayerEvent) -> bool,
) -> Vec<PlayerEvent> {
    let mut seen = Vec::new();
    for _ in 0..max_ticks {
        let events = player.tick(DT);
        let hit = events.iter().any(&pred);
        seen.extend(events);
        if hit {
            return seen;
        }
    }
    panic!("condition not reached in {max_ticks} ticks; saw {seen:?}");
}

fn started_key(e: &PlayerEvent) -> Option<&str> {
    match e {
        PlayerEvent::CycleStarted { key, .. } => Some(key),
        _ => None,
    }
}

#[test]
fn debug_mode_replays_the_first_record() {
    let mut player = Player::seeded(fixture(), fast_config(), 1);
    player.set_debug_mode(true);
    let events = player.start();
    assert_eq!(started_key(&events[0]), Some("The Prince Has Not Slept"));

    let events = run_until(&mut player, 20_000, |e| started_key(e).is_some());
    assert!(matches!(events[0], PlayerEvent::CycleCompleted { cycle: 1, .. }));
    assert_eq!(
        events.iter().find_map(started_key),
        Some("The Prince Has Not Slept")
    );
    assert_eq!(player.cycles(), 2);
}

#[test]
fn cycles_walk_the_whole_dataset_before_repeating() {
    let ds = fixture();
    let n = ds.len();
    let mut player = Player::seeded(ds, fast_config(), 77);
    let mut keys: Vec<String> = player
        .start()
        .iter()
        .filter_map(started_key)
        .map(str::to_string)
        .collect();
    while keys.len() < n {
        let events = run_until(&mut player, 20_000, |e| started_key(e).is_some());
        keys.extend(events.iter().filter_map(started_key).map(str::to_string));
    }
    let unique: BTreeSet<&String> = keys.iter().collect();
    assert_eq!(unique.len(), n, "{keys:?}");
}

#[test]
fn completion_waits_for_the_inter_cycle_delay() {
    let mut player = Player::seeded(fixture(), fast_config(), 3);
    player.start();
    run_until(&mut player, 20_000, |e| {
        matches!(e, PlayerEvent::CycleCompleted { .. })
    });
    assert!(matches!(player.state(), PlayerState::Completing { .. }));

    // 100 ms delay: five ticks are not enough, seven are.
    for _ in 0..5 {
        assert!(player.tick(DT).is_empty());
    }
    let mut started = false;
    for _ in 0..2 {
        started |= player.tick(DT).iter().any(|e| started_key(e).is_some());
    }
    assert!(started);
    assert_eq!(player.state(), PlayerState::Playing);
}

#[test]
fn pause_freezes_the_frame() {
    let mut player = Player::seeded(fixture(), fast_config(), 5);
    player.start();
    for _ in 0..30 {
        player.tick(DT);
    }
    assert_eq!(player.pause(), Some(PlayerEvent::Paused));
    let frozen = player.current_frame().unwrap().unwrap();
    for _ in 0..120 {
        assert!(player.tick(DT).is_empty());
    }
    let still = player.current_frame().unwrap().unwrap();
    assert_eq!(frozen.time, still.time);
    assert_eq!(player.state(), PlayerState::Paused);

    assert_eq!(player.resume(), Some(PlayerEvent::Resumed));
    player.tick(DT);
    assert!(player.time().unwrap() > frozen.time);
}

fn always_fails(input: &OverrideInput<'_>) -> ReelResult<OverrideOutput> {
    Err(ReelError::composition(format!(
        "{} override refused {} words",
        input.role,
        input.targets.len()
    )))
}

#[test]
fn failed_composition_loses_the_cycle_without_requeueing() {
    let ds = Dataset::from_json_str(
        r#"{
            "Broken": { "content": "this one breaks", "titleClass": "boom" },
            "Fine": { "content": "this one works" }
        }"#,
    )
    .unwrap();
    let mut registry = AnimationRegistry::with_builtin();
    registry.register("boom", Role::Title, always_fails);

    let mut player = Player::new(ds, fast_config(), registry, StdRng::seed_from_u64(8));
    let mut events = player.start();
    let mut lost = Vec::new();
    let mut started = Vec::new();
    for _ in 0..20_000 {
        for e in &events {
            match e {
                PlayerEvent::CycleLost { key, error, .. } => {
                    assert!(error.contains("override refused"));
                    lost.push(key.clone());
                }
                PlayerEvent::CycleStarted { key, .. } => started.push(key.clone()),
                _ => {}
            }
        }
        if lost.len() + started.len() >= 2 {
            break;
        }
        events = player.tick(DT);
    }
    assert_eq!(lost, vec!["Broken".to_string()]);
    assert_eq!(started, vec!["Fine".to_string()]);
}
