use std::collections::BTreeSet;

use rumor_reel::{Dataset, RotationController};

fn fixture() -> Dataset {
    Dataset::from_json_str(include_str!("data/rumors.json")).unwrap()
}

#[test]
fn every_key_once_per_pass() {
    let ds = fixture();
    let all: BTreeSet<String> = ds.keys().map(str::to_string).collect();
    let mut rot = RotationController::seeded(&ds, 2024);

    for _pass in 0..5 {
        let seen: Vec<String> = (0..ds.len())
            .map(|_| rot.next(&ds, false).unwrap().key.clone())
            .collect();
        let unique: BTreeSet<String> = seen.iter().cloned().collect();
        assert_eq!(unique, all, "pass was not a permutation: {seen:?}");
    }
}

#[test]
fn exhausted_stack_reshuffles() {
    let ds = Dataset::from_json_str(
        r#"{ "A": { "content": "a" }, "B": { "content": "b" }, "C": { "content": "c" } }"#,
    )
    .unwrap();
    let mut rot = RotationController::seeded(&ds, 11);
    let first: BTreeSet<String> = (0..3)
        .map(|_| rot.next(&ds, false).unwrap().key.clone())
        .collect();
    assert_eq!(first.len(), 3);
    assert!(rot.remaining().is_empty());

    let fourth = rot.next(&ds, false).unwrap().key.clone();
    assert!(first.contains(&fourth));
    assert_eq!(rot.remaining().len(), 2);
}

#[test]
fn debug_mode_always_returns_first_record() {
    let ds = Dataset::from_json_str(r#"{ "Rumor A": { "content": "one two three" } }"#).unwrap();
    let mut rot = RotationController::seeded(&ds, 0);
    for _ in 0..10 {
        let rec = rot.next(&ds, true).unwrap();
        assert_eq!(rec.key, "Rumor A");
        assert_eq!(rec.title(), "Rumor A");
    }
}

#[test]
fn seeds_give_reproducible_order() {
    let ds = fixture();
    let order = |seed| {
        let mut rot = RotationController::seeded(&ds, seed);
        (0..ds.len())
            .map(|_| rot.next(&ds, false).unwrap().key.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(order(5), order(5));
}
