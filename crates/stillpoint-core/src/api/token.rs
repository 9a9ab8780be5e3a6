//! Bearer token storage. Presence of a token means "logged in".

use std::sync::{Arc, Mutex};

use crate::error::StorageError;

pub trait TokenStore: Send + Sync {
    fn get(&self) -> Result<Option<String>, StorageError>;
    fn set(&self, token: &str) -> Result<(), StorageError>;
    /// Clearing an absent token is not an error.
    fn clear(&self) -> Result<(), StorageError>;

    fn is_logged_in(&self) -> bool {
        matches!(self.get(), Ok(Some(_)))
    }
}

/// Token kept in the OS keyring.
pub struct KeyringTokenStore {
    service: String,
    account: String,
}

impl KeyringTokenStore {
    const SERVICE: &'static str = "stillpoint";
    const ACCOUNT: &'static str = "api_token";

    pub fn new() -> Self {
        Self {
            service: Self::SERVICE.into(),
            account: Self::ACCOUNT.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, StorageError> {
        Ok(keyring::Entry::new(&self.service, &self.account)?)
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self) -> Result<Option<String>, StorageError> {
        match self.entry()?.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, token: &str) -> Result<(), StorageError> {
        self.entry()?.set_password(token)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local token. Clones share the same value.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    token: Arc<Mutex<Option<String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Arc::new(Mutex::new(Some(token.to_string()))),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, StorageError> {
        self.token
            .lock()
            .map_err(|_| StorageError::QueryFailed("token slot poisoned".into()))
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.clone())
    }

    fn set(&self, token: &str) -> Result<(), StorageError> {
        *self.lock()? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.lock()? = None;
        Ok(())
    }
}
