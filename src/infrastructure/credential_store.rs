use crate::infrastructure::error::InfraError;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

const DEFAULT_SERVICE_NAME: &str = "activity-calendar.store";

/// Bearer credential for the REST activity store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreCredential {
    pub access_token: String,
}

pub trait CredentialStore: Send + Sync {
    fn save_credential(&self, account: &str, credential: &StoreCredential) -> Result<(), InfraError>;
    fn load_credential(&self, account: &str) -> Result<Option<StoreCredential>, InfraError>;
    fn delete_credential(&self, account: &str) -> Result<(), InfraError>;
}

#[derive(Debug, Clone)]
pub struct KeyringCredentialStore {
    service_name: String,
}

impl KeyringCredentialStore {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    fn entry(&self, account: &str) -> Result<keyring::Entry, InfraError> {
        keyring::Entry::new(&self.service_name, account)
            .map_err(|error| InfraError::Credential(error.to_string()))
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_NAME)
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn save_credential(&self, account: &str, credential: &StoreCredential) -> Result<(), InfraError> {
        let payload = serde_json::to_string(credential)
            .map_err(|error| InfraError::Credential(error.to_string()))?;
        self.entry(account)?
            .set_password(&payload)
            .map_err(|error| InfraError::Credential(error.to_string()))
    }

    fn load_credential(&self, account: &str) -> Result<Option<StoreCredential>, InfraError> {
        let payload = match self.entry(account)?.get_password() {
            Ok(value) => value,
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(error) => return Err(InfraError::Credential(error.to_string())),
        };

        serde_json::from_str::<StoreCredential>(&payload)
            .map(Some)
            .map_err(|error| InfraError::Credential(error.to_string()))
    }

    fn delete_credential(&self, account: &str) -> Result<(), InfraError> {
        match self.entry(account)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(InfraError::Credential(error.to_string())),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    credentials: Mutex<Vec<(String, StoreCredential)>>,
}

impl InMemoryCredentialStore {
    fn lock_error(error: impl std::fmt::Display) -> InfraError {
        InfraError::Credential(format!("in-memory lock poisoned: {error}"))
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn save_credential(&self, account: &str, credential: &StoreCredential) -> Result<(), InfraError> {
        let mut guard = self.credentials.lock().map_err(Self::lock_error)?;
        guard.retain(|(stored_account, _)| stored_account != account);
        guard.push((account.to_string(), credential.clone()));
        Ok(())
    }

    fn load_credential(&self, account: &str) -> Result<Option<StoreCredential>, InfraError> {
        let guard = self.credentials.lock().map_err(Self::lock_error)?;
        Ok(guard
            .iter()
            .find(|(stored_account, _)| stored_account == account)
            .map(|(_, credential)| credential.clone()))
    }

    fn delete_credential(&self, account: &str) -> Result<(), InfraError> {
        let mut guard = self.credentials.lock().map_err(Self::lock_error)?;
        guard.retain(|(stored_account, _)| stored_account != account);
        Ok(())
    }
}
