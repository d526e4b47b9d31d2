use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to create storage directory {}: {source}", path.display())]
    StorageDirCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read state file {}: {source}", path.display())]
    StateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write state file {}: {source}", path.display())]
    StateWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("failed to deserialize YAML in {}: {source}", path.display())]
    YamlDeserialization {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to hash credential: {0}")]
    CredentialHash(String),
    #[error("secure storage error: {0}")]
    SecureStorage(#[from] keyring::Error),
    #[error("stored credential is malformed")]
    MalformedCredential,
    #[error("no password has been set")]
    NoCredential,
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("incorrect password")]
    WrongPassword,
    #[error("new password must differ from the current password")]
    SameAsCurrent,

    #[error("library error: {0}")]
    Files(#[from] picshelf_files::FilesError),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
