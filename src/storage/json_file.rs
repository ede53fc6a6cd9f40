use std::{
    collections::BTreeMap,
    fs, io,
    path::PathBuf,
};

use super::{Storage, StorageError};

/// Storage adapter backed by a single JSON file holding the whole key-value
/// map, rewritten on every mutation. A missing file opens as an empty store;
/// an unreadable one is an error rather than silently starting fresh.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStorage {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => {
                serde_json::from_str(&raw).map_err(|source| StorageError::CorruptFile {
                    path: path.clone(),
                    source,
                })?
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => {
                return Err(StorageError::Io {
                    path: path.clone(),
                    source,
                });
            }
        };
        Ok(Self { path, entries })
    }

    fn flush(&self) -> Result<(), StorageError> {
        let raw =
            serde_json::to_string_pretty(&self.entries).map_err(|source| StorageError::Encode {
                target: self.path.display().to_string(),
                source,
            })?;
        fs::write(&self.path, raw).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path().join("state.json")).unwrap();
        assert_eq!(storage.get("users").unwrap(), None);
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut storage = FileStorage::open(&path).unwrap();
        storage.put("users", "[]".to_string()).unwrap();
        storage.put("loggedInUser", "alice".to_string()).unwrap();
        drop(storage);

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get("users").unwrap().as_deref(), Some("[]"));
        assert_eq!(
            storage.get("loggedInUser").unwrap().as_deref(),
            Some("alice")
        );
    }

    #[test]
    fn delete_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut storage = FileStorage::open(&path).unwrap();
        storage.put("loggedInUser", "alice".to_string()).unwrap();
        storage.delete("loggedInUser").unwrap();
        drop(storage);

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get("loggedInUser").unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "not json").unwrap();

        let err = FileStorage::open(&path).unwrap_err();
        assert!(matches!(err, StorageError::CorruptFile { .. }));
    }
}
