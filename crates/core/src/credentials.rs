//! The credential gate.
//!
//! A single password protects the library. The gate stores it behind the [`CredentialStore`]
//! seam as an Argon2id PHC string (random salt, parameters embedded), so the secret itself is
//! never persisted. [`KeyringCredentialStore`] keeps that record in the operating system's
//! secret store; [`FileCredentialStore`] is the fallback for hosts without one. The gate applies no length policy; that belongs to the callers in
//! [`crate::password`].

use crate::constants::CREDENTIAL_KEY;
use crate::{CoreError, CoreResult};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use std::cell::RefCell;
use std::collections::{btree_map, BTreeMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Persistent storage for opaque credential records, keyed by a fixed identifier.
///
/// Implementations only move strings around; hashing happens in [`CredentialGate`].
pub trait CredentialStore {
    /// Returns the record stored under `key`, or `None` if there is none.
    fn load(&self, key: &str) -> CoreResult<Option<String>>;

    /// Stores `record` under `key`, replacing any previous record.
    fn save(&mut self, key: &str, record: &str) -> CoreResult<()>;
}

/// Credential records kept in a YAML map on disk.
///
/// On Unix the file is created and kept with owner-only permissions (0600).
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_records(&self) -> CoreResult<BTreeMap<String, String>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(CoreError::StateRead {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_yaml::from_str(&contents).map_err(|source| CoreError::YamlDeserialization {
            path: self.path.clone(),
            source,
        })
    }

    fn write_records(&self, records: &BTreeMap<String, String>) -> CoreResult<()> {
        let yaml = serde_yaml::to_string(records).map_err(CoreError::YamlSerialization)?;
        write_private(&self.path, yaml.as_bytes()).map_err(|source| CoreError::StateWrite {
            path: self.path.clone(),
            source,
        })
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.read_records()?.remove(key))
    }

    fn save(&mut self, key: &str, record: &str) -> CoreResult<()> {
        let mut records = self.read_records()?;
        records.insert(key.to_owned(), record.to_owned());
        self.write_records(&records)
    }
}

/// Writes `data` to `path`, readable and writable by the owner only.
#[cfg(unix)]
fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation; tighten files that already existed.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(data)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    fs::write(path, data)
}

/// Process-local credential records.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    records: BTreeMap<String, String>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.records.get(key).cloned())
    }

    fn save(&mut self, key: &str, record: &str) -> CoreResult<()> {
        self.records.insert(key.to_owned(), record.to_owned());
        Ok(())
    }
}

/// Credential records kept in the operating system's secret store.
///
/// Backed by the macOS Keychain, the Windows Credential Manager or the Linux kernel keyring.
/// Every key is one entry under `service`; the account name scopes entries to one library.
pub struct KeyringCredentialStore {
    service: String,
    account: String,
    entries: RefCell<BTreeMap<String, keyring::Entry>>,
}

impl KeyringCredentialStore {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
            entries: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// Runs `op` on the entry for `key`, creating the entry on first use.
    fn with_entry<T>(
        &self,
        key: &str,
        op: impl FnOnce(&keyring::Entry) -> keyring::Result<T>,
    ) -> keyring::Result<T> {
        let mut entries = self.entries.borrow_mut();
        let entry = match entries.entry(key.to_owned()) {
            btree_map::Entry::Occupied(slot) => slot.into_mut(),
            btree_map::Entry::Vacant(slot) => {
                let user = format!("{}/{}", self.account, key);
                slot.insert(keyring::Entry::new(&self.service, &user)?)
            }
        };
        op(entry)
    }
}

impl std::fmt::Debug for KeyringCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyringCredentialStore")
            .field("service", &self.service)
            .field("account", &self.account)
            .finish()
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn load(&self, key: &str) -> CoreResult<Option<String>> {
        match self.with_entry(key, |entry| entry.get_password()) {
            Ok(record) => Ok(Some(record)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(CoreError::SecureStorage(e)),
        }
    }

    fn save(&mut self, key: &str, record: &str) -> CoreResult<()> {
        self.with_entry(key, |entry| entry.set_password(record))?;
        Ok(())
    }
}

impl<S: CredentialStore + ?Sized> CredentialStore for Box<S> {
    fn load(&self, key: &str) -> CoreResult<Option<String>> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, record: &str) -> CoreResult<()> {
        (**self).save(key, record)
    }
}

/// Checks and replaces the library password.
#[derive(Debug)]
pub struct CredentialGate<S> {
    store: S,
    params: Params,
}

impl<S: CredentialStore> CredentialGate<S> {
    /// Creates a gate hashing with the default Argon2id parameters.
    pub fn new(store: S) -> Self {
        Self {
            store,
            params: Params::default(),
        }
    }

    /// Creates a gate hashing new credentials with `params`.
    ///
    /// Verification always uses the parameters embedded in the stored hash.
    pub fn with_params(store: S, params: Params) -> Self {
        Self { store, params }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether a credential has been set.
    pub fn has_credential(&self) -> CoreResult<bool> {
        Ok(self.store.load(CREDENTIAL_KEY)?.is_some())
    }

    /// Replaces the credential with `secret`.
    ///
    /// # Errors
    ///
    /// Fails only if hashing fails or the store is inaccessible.
    pub fn set_credential(&mut self, secret: &str) -> CoreResult<()> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .hasher()
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| CoreError::CredentialHash(e.to_string()))?
            .to_string();

        self.store.save(CREDENTIAL_KEY, &hash)?;
        tracing::info!("credential updated");
        Ok(())
    }

    /// Checks `candidate` against the stored credential.
    ///
    /// Returns `false` when no credential is set.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::MalformedCredential` if the stored record is not a valid hash, or
    /// a store error if it cannot be read.
    pub fn verify(&self, candidate: &str) -> CoreResult<bool> {
        let Some(record) = self.store.load(CREDENTIAL_KEY)? else {
            return Ok(false);
        };

        let parsed = PasswordHash::new(&record).map_err(|_| CoreError::MalformedCredential)?;
        let matches = self
            .hasher()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok();

        if !matches {
            tracing::debug!("credential verification failed");
        }
        Ok(matches)
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}
