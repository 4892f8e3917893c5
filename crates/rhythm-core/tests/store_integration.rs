//! JSON file store round-trip tests.

use rhythm_core::{JsonFileStore, StateDocument, StateStore};

#[test]
fn load_on_missing_file_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::with_path(dir.path().join("state.json"));
    assert!(store.load().unwrap().is_none());
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::with_path(dir.path().join("state.json"));

    let mut doc = StateDocument::seeded();
    doc.reminders.get_mut("water").unwrap().enabled = true;
    doc.stat_mut("water").today_count = 3;
    store.save(&doc).unwrap();

    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded, doc);
    // No stray temp file left behind.
    assert!(!dir.path().join("state.json.tmp").exists());
}

#[test]
fn save_replaces_the_whole_document() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::with_path(dir.path().join("state.json"));

    let mut doc = StateDocument::seeded();
    store.save(&doc).unwrap();

    doc.reminders.remove("water");
    doc.stats.remove("water");
    store.save(&doc).unwrap();

    let loaded = store.load().unwrap().unwrap();
    assert!(!loaded.reminders.contains_key("water"));
    assert_eq!(loaded.reminders.len(), 9);
}

#[test]
fn corrupt_document_surfaces_as_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = JsonFileStore::with_path(path);
    assert!(store.load().is_err());
}
