//! picshelf image inventory
//!
//! This crate owns the managed image directory: it decides which files the library
//! contains, and performs every mutation of that directory.
//!
//! ## Design Principles
//!
//! - The directory is the only source of truth; nothing is cached between queries
//! - Only regular files with a recognised image extension are part of the inventory
//! - Paths are always derived from the root directory and a validated [`FileName`]
//! - Overwriting an existing file requires an explicit decision from a [`ConflictResolver`]
//! - Positional access goes through an [`InventorySnapshot`], and stale snapshots are rejected
//!
//! ## Storage Layout
//!
//! ```text
//! <library>/
//! ├── beach.jpg        # listed
//! ├── Cat.PNG          # listed (extension matching ignores case)
//! ├── notes.txt        # ignored: unrecognised extension
//! └── holiday/         # ignored: directories are never traversed
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use picshelf_files::{AlwaysOverwrite, FileName, InventoryService};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = InventoryService::open(Path::new("picshelf_data/library"))?;
//! let name = FileName::new("sunset.png")?;
//!
//! let outcome = service.add(&name, b"...", &mut AlwaysOverwrite)?;
//! assert!(outcome.is_success());
//!
//! for name in service.list().iter() {
//!     println!("{}", service.resolve_path(name).display());
//! }
//! # Ok(())
//! # }
//! ```

mod conflict;
mod constants;
mod inventory;
mod snapshot;

pub use conflict::{AlwaysOverwrite, ConflictResolver, NeverOverwrite, OverwriteDecision};
pub use constants::RECOGNISED_EXTENSIONS;
pub use inventory::{AddOutcome, DeletePolicy, FileMetadata, InventoryService, ParseDeletePolicyError};
pub use picshelf_types::{FileName, ImageExtension, TextError};
pub use snapshot::{Generation, InventorySnapshot};

use std::path::PathBuf;

/// Errors that can occur during inventory operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Root directory does not exist or is not a directory
    #[error("Invalid root directory: {0}")]
    InvalidRootDirectory(String),

    /// A file name failed validation
    #[error("Invalid file name: {0}")]
    InvalidName(#[from] TextError),

    /// The named file is not present in the library
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A positional lookup went past the end of the inventory
    #[error("Index {index} is out of range for an inventory of {len} files")]
    IndexOutOfRange { index: usize, len: usize },

    /// The directory changed since the snapshot used for a positional operation was taken
    #[error("Inventory changed since snapshot {expected} (now {actual})")]
    StaleSnapshot {
        expected: Generation,
        actual: Generation,
    },

    /// Writing a file into the library failed
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading a file failed
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Removing a file failed
    #[error("Failed to delete {}: {source}", path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type FilesResult<T> = Result<T, FilesError>;
