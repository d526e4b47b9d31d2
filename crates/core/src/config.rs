//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Nothing below reads environment variables itself; binaries read
//! them and hand the raw values to the `*_from_env_value` helpers.

use crate::constants::{
    CREDENTIALS_FILENAME, CREDENTIAL_KEY, DEFAULT_DATA_DIR, KEYRING_SERVICE, LIBRARY_DIR_NAME,
    PREFERENCES_FILENAME, STATE_DIR_NAME,
};
use crate::credentials::{
    CredentialGate, CredentialStore, FileCredentialStore, KeyringCredentialStore,
};
use crate::preferences::PreferencesStore;
use crate::validation::validate_data_dir;
use crate::{CoreError, CoreResult};
use picshelf_files::{DeletePolicy, InventoryService};
use std::fs;
use std::path::{Path, PathBuf};

/// Where the credential record is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialBackend {
    /// The OS secret store when one answers, otherwise the credential file
    #[default]
    Auto,
    /// The OS secret store only
    Keyring,
    /// The owner-only credential file in the state directory
    File,
}

impl std::str::FromStr for CredentialBackend {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(CredentialBackend::Auto),
            "keyring" => Ok(CredentialBackend::Keyring),
            "file" => Ok(CredentialBackend::File),
            other => Err(CoreError::InvalidInput(format!(
                "unknown credential store '{}' (expected 'auto', 'keyring' or 'file')",
                other
            ))),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    delete_policy: DeletePolicy,
    credential_backend: CredentialBackend,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(data_dir: PathBuf, delete_policy: DeletePolicy) -> CoreResult<Self> {
        validate_data_dir(&data_dir)?;

        Ok(Self {
            data_dir,
            delete_policy,
            credential_backend: CredentialBackend::default(),
        })
    }

    #[must_use]
    pub fn with_credential_backend(mut self, credential_backend: CredentialBackend) -> Self {
        self.credential_backend = credential_backend;
        self
    }

    pub fn credential_backend(&self) -> CredentialBackend {
        self.credential_backend
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn library_dir(&self) -> PathBuf {
        self.data_dir.join(LIBRARY_DIR_NAME)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.data_dir.join(STATE_DIR_NAME)
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.state_dir().join(CREDENTIALS_FILENAME)
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.state_dir().join(PREFERENCES_FILENAME)
    }

    pub fn delete_policy(&self) -> DeletePolicy {
        self.delete_policy
    }

    /// Creates the library and state directories if they are missing.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        for dir in [self.library_dir(), self.state_dir()] {
            fs::create_dir_all(&dir).map_err(|source| CoreError::StorageDirCreation {
                path: dir.clone(),
                source,
            })?;
        }
        tracing::debug!("data directory ready at {}", self.data_dir.display());
        Ok(())
    }

    /// Builds the inventory service for the library directory, creating it if needed.
    pub fn inventory(&self) -> CoreResult<InventoryService> {
        self.ensure_dirs()?;
        let inventory =
            InventoryService::open(&self.library_dir())?.with_delete_policy(self.delete_policy);
        Ok(inventory)
    }

    /// Builds the credential gate over [`Self::credential_store`].
    pub fn credential_gate(&self) -> CredentialGate<Box<dyn CredentialStore>> {
        CredentialGate::new(self.credential_store())
    }

    /// Picks the credential store for the configured backend.
    ///
    /// Under [`CredentialBackend::Auto`] the OS secret store is used when it answers a
    /// lookup. An existing credential file is still honoured while the secret store holds
    /// nothing for this library, so a password set on a host without a keystore keeps working.
    pub fn credential_store(&self) -> Box<dyn CredentialStore> {
        match self.credential_backend {
            CredentialBackend::File => Box::new(self.file_credential_store()),
            CredentialBackend::Keyring => Box::new(self.keyring_credential_store()),
            CredentialBackend::Auto => {
                let keyring = self.keyring_credential_store();
                let file = self.file_credential_store();

                match keyring.load(CREDENTIAL_KEY) {
                    Ok(Some(_)) => Box::new(keyring),
                    Ok(None) if matches!(file.load(CREDENTIAL_KEY), Ok(Some(_))) => {
                        tracing::debug!("using existing credential file {}", file.path().display());
                        Box::new(file)
                    }
                    Ok(None) => Box::new(keyring),
                    Err(e) => {
                        tracing::warn!(
                            "no OS secret store available ({}); using {}",
                            e,
                            file.path().display()
                        );
                        Box::new(file)
                    }
                }
            }
        }
    }

    fn file_credential_store(&self) -> FileCredentialStore {
        FileCredentialStore::new(self.credentials_path())
    }

    /// The keyring account is the canonical data directory, so two libraries never share one.
    fn keyring_credential_store(&self) -> KeyringCredentialStore {
        let account = fs::canonicalize(&self.data_dir).unwrap_or_else(|_| self.data_dir.clone());
        KeyringCredentialStore::new(KEYRING_SERVICE, account.display().to_string())
    }

    /// Builds the preference store backed by the state directory.
    pub fn preferences(&self) -> PreferencesStore {
        PreferencesStore::new(self.preferences_path())
    }
}

/// Resolve the data directory from an optional configured value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_DATA_DIR`] relative to the
/// current working directory.
pub fn data_dir_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Parse the delete policy from an optional configured value.
///
/// If `value` is `None` or empty/whitespace, returns the default policy.
pub fn delete_policy_from_env_value(value: Option<String>) -> CoreResult<DeletePolicy> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value
        .map(|v| v.parse::<DeletePolicy>())
        .transpose()
        .map_err(|e| CoreError::InvalidInput(e.to_string()))?;

    Ok(parsed.unwrap_or_default())
}

/// Parse the credential backend from an optional configured value.
///
/// If `value` is `None` or empty/whitespace, returns [`CredentialBackend::Auto`].
pub fn credential_backend_from_env_value(value: Option<String>) -> CoreResult<CredentialBackend> {
    match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(v) => v.parse(),
        None => Ok(CredentialBackend::default()),
    }
}
