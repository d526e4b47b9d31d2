//! # picshelf core
//!
//! Everything between the image inventory and a user interface:
//! - Runtime configuration and the on-disk layout under the data directory
//! - The credential gate and the password flows in front of it
//! - The persisted sort preference
//! - The library view that turns inventory snapshots into displayed rows
//!
//! **No inventory logic lives here**: listing, adding and deleting files belong to
//! `picshelf_files`; this crate only decides when and how to call them.

pub mod config;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod library;
pub mod password;
pub mod preferences;
pub mod validation;

pub use config::{CoreConfig, CredentialBackend};
pub use credentials::{
    CredentialGate, CredentialStore, FileCredentialStore, KeyringCredentialStore,
    MemoryCredentialStore,
};
pub use error::{CoreError, CoreResult};
pub use library::{LibraryRow, LibraryView, Preview};
pub use password::{GateState, PasswordSetup, SetupStep};
pub use preferences::{Preferences, PreferencesStore, SortOrder};

pub use picshelf_files as files;
