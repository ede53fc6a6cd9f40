use crate::storage::{IS_LOGGED_IN_KEY, LOGGED_IN_USER_KEY, Storage, StorageError};

/// Who is currently logged in, mirrored to storage under the session keys.
///
/// The username and the logged-in flag are stored as raw strings, not JSON;
/// the flag alone decides whether a leftover username counts as a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    username: Option<String>,
}

impl Session {
    pub fn hydrate<S: Storage>(storage: &S) -> Result<Self, StorageError> {
        let logged_in = storage
            .get(IS_LOGGED_IN_KEY)?
            .is_some_and(|flag| flag == "true");
        let username = storage.get(LOGGED_IN_USER_KEY)?;
        Ok(Self {
            username: if logged_in { username } else { None },
        })
    }

    pub fn login<S: Storage>(&mut self, storage: &mut S, username: &str) -> Result<(), StorageError> {
        storage.put(LOGGED_IN_USER_KEY, username.to_string())?;
        storage.put(IS_LOGGED_IN_KEY, "true".to_string())?;
        self.username = Some(username.to_string());
        Ok(())
    }

    pub fn logout<S: Storage>(&mut self, storage: &mut S) -> Result<(), StorageError> {
        storage.delete(LOGGED_IN_USER_KEY)?;
        storage.put(IS_LOGGED_IN_KEY, "false".to_string())?;
        self.username = None;
        Ok(())
    }

    pub fn current_user(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.username.is_some()
    }
}
