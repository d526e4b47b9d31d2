//! Constants used throughout the picshelf core crate.
//!
//! This module contains all path, filename and policy constants to ensure
//! consistency across the codebase and make maintenance easier.

/// Default data directory when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "picshelf_data";

/// Directory name for the managed image library.
pub const LIBRARY_DIR_NAME: &str = "library";

/// Directory name for persisted application state.
pub const STATE_DIR_NAME: &str = "state";

/// Filename for the credential store.
pub const CREDENTIALS_FILENAME: &str = "credentials.yaml";

/// Filename for user preferences.
pub const PREFERENCES_FILENAME: &str = "preferences.yaml";

/// Fixed identifier the single credential is stored under.
pub const CREDENTIAL_KEY: &str = "password";

/// Service name the credential is filed under in the OS secret store.
pub const KEYRING_SERVICE: &str = "picshelf";

/// Minimum password length, in characters.
pub const MIN_PASSWORD_CHARS: usize = 4;

/// Grapheme clusters of a long file name kept before the ellipsis.
pub const DISPLAY_NAME_HEAD_CHARS: usize = 19;

/// Grapheme clusters of a long file name kept after the ellipsis.
pub const DISPLAY_NAME_TAIL_CHARS: usize = 12;

/// Row text shown when the library has no files.
pub const EMPTY_LIBRARY_MESSAGE: &str = "No files yet. Add one to get started.";
