use eyre::Result;

/// Small string preference store (sort choice and the like).
///
/// Injected into components that remember user choices, so that nothing
/// touches process-wide state and tests can substitute an in-memory store.
pub trait KeyValueStore: Send + Sync {
    fn get_string(&self, key: &str) -> Result<Option<String>>;
    fn set_string(&self, key: &str, value: &str) -> Result<()>;
}

pub mod util {
    use std::{
        collections::BTreeMap,
        fs,
        path::{Path, PathBuf},
        sync::Arc,
    };

    use eyre::{Context, Result};
    use parking_lot::{Mutex, RwLock};

    use super::KeyValueStore;

    #[derive(Clone, Default)]
    pub struct InMemoryKeyValueStore {
        data: Arc<RwLock<BTreeMap<String, String>>>,
    }

    impl InMemoryKeyValueStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl KeyValueStore for InMemoryKeyValueStore {
        fn get_string(&self, key: &str) -> Result<Option<String>> {
            Ok(self.data.read().get(key).cloned())
        }

        fn set_string(&self, key: &str, value: &str) -> Result<()> {
            self.data.write().insert(key.to_owned(), value.to_owned());
            Ok(())
        }
    }

    /// All keys live in one JSON object file, rewritten on every change.
    pub struct JsonFileKeyValueStore {
        path: PathBuf,
        write_lock: Mutex<()>,
    }

    impl JsonFileKeyValueStore {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self {
                path: path.into(),
                write_lock: Mutex::new(()),
            }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        fn load_all(&self) -> Result<BTreeMap<String, String>> {
            if !self.path.exists() {
                return Ok(BTreeMap::new());
            }

            let json_string = fs::read_to_string(&self.path)
                .with_context(|| format!("Failed to read {}", self.path.display()))?;
            serde_json::from_str(&json_string).context("Failed to deserialize preferences")
        }

        fn store_all(&self, data: &BTreeMap<String, String>) -> Result<()> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent).context("Failed to create parent directory")?;
            }

            tracing::debug!("Storing preferences into {}", self.path.display());
            let json_string =
                serde_json::to_string_pretty(data).context("Failed to serialize preferences")?;
            fs::write(&self.path, json_string).context("Failed to write preferences file")
        }

        fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
            let _guard = self.write_lock.lock();
            let mut data = self.load_all()?;
            f(&mut data);
            self.store_all(&data)
        }
    }

    impl KeyValueStore for JsonFileKeyValueStore {
        fn get_string(&self, key: &str) -> Result<Option<String>> {
            Ok(self.load_all()?.remove(key))
        }

        fn set_string(&self, key: &str, value: &str) -> Result<()> {
            self.update(|data| {
                data.insert(key.to_owned(), value.to_owned());
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        util::{InMemoryKeyValueStore, JsonFileKeyValueStore},
        KeyValueStore,
    };

    #[test]
    fn test_in_memory_store() {
        let store = InMemoryKeyValueStore::new();
        assert_eq!(store.get_string("sort").unwrap(), None);

        store.set_string("sort", "price").unwrap();
        let shared = store.clone();
        assert_eq!(shared.get_string("sort").unwrap().as_deref(), Some("price"));

        shared.set_string("sort", "name").unwrap();
        assert_eq!(store.get_string("sort").unwrap().as_deref(), Some("name"));
    }

    #[test]
    fn test_json_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs").join("settings.json");

        let store = JsonFileKeyValueStore::new(&path);
        assert_eq!(store.get_string("sort").unwrap(), None);
        store.set_string("sort", "rating").unwrap();
        store.set_string("other", "x").unwrap();

        let reopened = JsonFileKeyValueStore::new(&path);
        assert_eq!(reopened.path(), path.as_path());
        assert_eq!(reopened.get_string("sort").unwrap().as_deref(), Some("rating"));

        reopened.set_string("other", "y").unwrap();
        assert_eq!(store.get_string("other").unwrap().as_deref(), Some("y"));
        assert_eq!(store.get_string("sort").unwrap().as_deref(), Some("rating"));
    }

    #[test]
    fn test_json_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "not json").unwrap();

        let store = JsonFileKeyValueStore::new(&path);
        assert!(store.get_string("sort").is_err());
    }
}
