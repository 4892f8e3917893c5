use rhythm_core::{JsonFileStore, StateDocument, StateStore};

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub fn open_store() -> CliResult<JsonFileStore> {
    Ok(JsonFileStore::open()?)
}

/// Load the state document, writing the default schema on first run.
pub fn load_or_seed(store: &JsonFileStore) -> CliResult<StateDocument> {
    match store.load()? {
        Some(doc) => Ok(doc),
        None => {
            let doc = StateDocument::seeded();
            store.save(&doc)?;
            Ok(doc)
        }
    }
}
