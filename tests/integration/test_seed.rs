//! Integration tests for startup configuration and catalog seeding.
//!
//! These mirror what the `pictolearn` binary does before serving: load
//! `pictolearn.json`, read the seed file it names and fill the store.

use std::path::PathBuf;

use pictolearn_exercises::{
    load_seed_file, seed_store, Config, ExerciseFilter, ExerciseStore, GuidedSequence,
    InMemoryExerciseStore,
};

/// Path to the fixtures directory.
fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Tests that the sample config loads successfully.
#[test]
fn test_sample_config_loads() {
    let config = Config::load_from_dir(&fixture_path()).expect("Failed to load config");

    assert_eq!(config.port, 3100);
    assert_eq!(config.default_language, "es");
    assert_eq!(config.seed_file.as_deref(), Some("seed-exercises.json"));
    assert_eq!(
        config.check_login_url(),
        "http://localhost:4000/teachers/checkLogin"
    );
}

/// Tests that the seed fixture loads in file order without owners.
#[test]
fn test_seed_fixture_loads() {
    let exercises =
        load_seed_file(fixture_path().join("seed-exercises.json")).expect("Failed to load seed");

    assert_eq!(exercises.len(), 3);
    assert_eq!(exercises[0].id.as_str(), "casa");
    assert_eq!(exercises[0].title, "CASA");
    assert_eq!(exercises[0].closed_order, Some(2));
    assert!(exercises.iter().all(|exercise| exercise.teacher_id.is_none()));
}

/// Tests that a seeded store answers language queries and guided sequences.
#[tokio::test]
async fn test_seeded_store_builds_guided_sequence() {
    let store = InMemoryExerciseStore::new();
    let exercises =
        load_seed_file(fixture_path().join("seed-exercises.json")).expect("Failed to load seed");

    let count = seed_store(&store, exercises).await.expect("Failed to seed");
    assert_eq!(count, 3);

    let spanish = store
        .find(&ExerciseFilter::language("es"))
        .await
        .expect("Failed to query store");
    assert_eq!(spanish.len(), 2);

    let sequence = GuidedSequence::build("es", &spanish);
    assert_eq!(sequence.len(), 8);

    let first = sequence.at(0).expect("Missing first entry");
    assert_eq!(first.exercise.id.as_str(), "casa");
    let last = sequence.at(7).expect("Missing last entry");
    assert_eq!(last.exercise.id.as_str(), "perro");
    assert_eq!(last.exercise.representation, "SYMBOLIC");
    assert!(sequence.after("7").is_none());
}

/// Tests that reseeding on restart leaves stored exercises alone.
#[tokio::test]
async fn test_reseeding_keeps_stored_exercises() {
    let store = InMemoryExerciseStore::new();
    let path = fixture_path().join("seed-exercises.json");

    seed_store(&store, load_seed_file(&path).expect("Failed to load seed"))
        .await
        .expect("Failed to seed");
    let count = seed_store(&store, load_seed_file(&path).expect("Failed to load seed"))
        .await
        .expect("Failed to reseed");

    assert_eq!(count, 0);
    assert_eq!(store.len().await, 3);
}
