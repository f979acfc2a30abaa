//! Integration tests for the MongoDB exercise store.
//!
//! These tests need a running MongoDB server and are marked with
//! `#[ignore]`. Run them with:
//!
//! ```text
//! MONGO_URI=mongodb://localhost:27017 cargo test -p pictolearn-integration-tests -- --ignored
//! ```

use pictolearn_exercises::{
    Exercise, ExerciseFilter, ExerciseId, ExercisePatch, ExerciseStore, MongoExerciseStore,
    NewExercise, StoreError, TeacherId,
};

/// Connects to a fresh, uniquely named database.
async fn connect() -> MongoExerciseStore {
    let uri = std::env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".into());
    let database = format!("pictolearn_test_{}", ExerciseId::generate().as_str().replace('-', ""));
    MongoExerciseStore::connect(&uri, &database)
        .await
        .expect("Failed to connect to MongoDB")
}

fn exercise(id: &str, network_type: &str, owner: Option<&str>) -> Exercise {
    NewExercise {
        title: Some(id.to_string()),
        category: Some("hogar".to_string()),
        main_image: Some(format!("{id}.png")),
        definition_image: Some(format!("{id}-definicion.png")),
        definition_text: Some("objeto de la casa".to_string()),
        ampliation_images: Some(vec![format!("{id}-1.png")]),
        ampliation_text: Some(vec!["se usa todos los dias".to_string()]),
        definition_pictogram: Some(format!("{id}-picto.png")),
        ampliation_pictogram: Some(format!("{id}-ampliacion.png")),
        network_type: Some(network_type.to_string()),
        representation: Some("iconic".to_string()),
        language: Some("es".to_string()),
        closed_order: None,
    }
    .into_exercise(ExerciseId::from(id), owner.map(TeacherId::new))
    .expect("Failed to build exercise")
}

/// Tests insert, natural-order listing, update and delete against MongoDB.
#[tokio::test]
#[ignore = "requires a running MongoDB server"]
async fn test_mongo_store_lifecycle() {
    let store = connect().await;

    for (id, tier, owner) in [("c", "I-I", Some("7")), ("a", "I-II", None), ("b", "I-I", Some("8"))] {
        store
            .insert(exercise(id, tier, owner))
            .await
            .expect("Failed to insert");
    }

    let listed = store
        .find(&ExerciseFilter::language("es"))
        .await
        .expect("Failed to list");
    let ids: Vec<&str> = listed.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["c", "a", "b"]);

    let owned = store
        .find(&ExerciseFilter::owned_by(TeacherId::new("7")))
        .await
        .expect("Failed to list owned");
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].id.as_str(), "c");

    let patch = ExercisePatch {
        title: Some("nuevo".to_string()),
        closed_order: Some(2),
        ..Default::default()
    };
    let updated = store
        .update(&ExerciseId::from("c"), &patch)
        .await
        .expect("Failed to update")
        .expect("Missing updated exercise");
    assert_eq!(updated.title, "NUEVO");
    assert_eq!(updated.closed_order, Some(2));
    assert_eq!(updated.teacher_id, Some(TeacherId::new("7")));

    let removed = store
        .delete(&ExerciseId::from("a"))
        .await
        .expect("Failed to delete");
    assert_eq!(removed.map(|e| e.id), Some(ExerciseId::from("a")));
    assert!(store
        .find_by_id(&ExerciseId::from("a"))
        .await
        .expect("Failed to find")
        .is_none());
}

/// Tests that a reused id is reported as a duplicate.
#[tokio::test]
#[ignore = "requires a running MongoDB server"]
async fn test_mongo_store_rejects_duplicate_ids() {
    let store = connect().await;
    store
        .insert(exercise("casa", "I-I", None))
        .await
        .expect("Failed to insert");

    let result = store.insert(exercise("casa", "I-II", None)).await;

    assert!(matches!(result, Err(StoreError::Duplicate(id)) if id == "casa"));
}
