use std::path::PathBuf;

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

pub mod in_memory;
pub mod json_file;

/// Storage key for the persisted user collection.
pub const USERS_KEY: &str = "users";
/// Storage key for the persisted transfer history.
pub const TOKENS_KEY: &str = "tokens";
/// Storage key holding the raw username of the logged-in user.
pub const LOGGED_IN_USER_KEY: &str = "loggedInUser";
/// Storage key holding the raw strings `"true"` / `"false"`.
pub const IS_LOGGED_IN_KEY: &str = "isLoggedIn";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to access storage at `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Storage file `{path}` holds invalid JSON")]
    CorruptFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Value stored under `{key}` is not valid JSON")]
    CorruptValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode value for `{target}`")]
    Encode {
        target: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A flat string key-value store, the persistence seam of the crate.
///
/// Adapters differ only in durability: [`in_memory::MemoryStorage`] for
/// tests and ephemeral runs, [`json_file::FileStorage`] for state that
/// survives a restart.
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn put(&mut self, key: &str, value: String) -> Result<(), StorageError>;

    fn delete(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Reads and decodes the JSON value under `key`, `None` when the key is
/// absent.
pub fn read_json<S, T>(storage: &S, key: &str) -> Result<Option<T>, StorageError>
where
    S: Storage,
    T: DeserializeOwned,
{
    match storage.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::CorruptValue {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// Encodes `value` as JSON and writes it under `key`, replacing whatever was
/// there.
pub fn write_json<S, T>(storage: &mut S, key: &str, value: &T) -> Result<(), StorageError>
where
    S: Storage,
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Encode {
        target: key.to_string(),
        source,
    })?;
    storage.put(key, raw)
}
