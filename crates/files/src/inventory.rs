//! Library directory service implementation
//!
//! This module provides [`InventoryService`], the single owner of the managed image
//! directory. It answers "which images does the library contain?" and performs every
//! mutation of that directory.
//!
//! # Inventory rules
//!
//! - The directory is scanned non-recursively on every query; nothing is cached
//! - Only regular files (after following symlinks) are listed, never directories
//! - Only names with a recognised image extension are listed (case-insensitive)
//! - Names are returned in ascending lexicographic order
//! - A directory that cannot be scanned lists as empty
//!
//! # Mutations
//!
//! - [`InventoryService::add`] writes unconditionally to a free name, and asks a
//!   [`ConflictResolver`] before overwriting an existing one
//! - [`InventoryService::delete`] removes a file; whether failures surface is controlled by
//!   the service's [`DeletePolicy`]
//! - Positional variants take an [`InventorySnapshot`] and refuse to act when the directory
//!   has changed since that snapshot was taken
//!
//! # Implementation Notes
//!
//! - Path resolution is a pure join of the root directory and a validated [`FileName`]
//! - File contents are never validated as images; consumers must tolerate undecodable files
//! - The service holds no open handles and can be cloned freely

use crate::conflict::{ConflictResolver, OverwriteDecision};
use crate::snapshot::InventorySnapshot;
use crate::{FilesError, FilesResult};
use chrono::{DateTime, Utc};
use picshelf_types::FileName;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Metadata for a file in the library
///
/// Produced on demand by [`InventoryService::describe`]. Serialises to YAML or JSON for
/// display; it is never persisted.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FileMetadata {
    /// Base name of the file
    pub name: FileName,

    /// Size of the file in bytes
    pub size_bytes: u64,

    /// Lower-cased extension, if the name has one
    pub extension: Option<String>,

    /// Detected media type (MIME type), if available
    ///
    /// This is a best-effort detection from the file's leading bytes and should not be
    /// considered authoritative.
    pub media_type: Option<String>,

    /// Hexadecimal SHA-256 digest of the file content
    pub sha256: String,

    /// Last modification time, when the platform reports one
    pub modified_at: Option<DateTime<Utc>>,
}

/// Result of a completed [`InventoryService::add`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// No file had the name; it was written
    Created,
    /// A file had the name and the resolver confirmed the overwrite
    Overwritten,
    /// A file had the name and the resolver declined; nothing was written
    Declined,
}

impl AddOutcome {
    /// Whether the data is now stored under the requested name.
    pub fn is_success(&self) -> bool {
        matches!(self, AddOutcome::Created | AddOutcome::Overwritten)
    }
}

/// What [`InventoryService::delete`] does when a removal fails or the file is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Log the failure and report success
    #[default]
    Swallow,
    /// Return the failure to the caller
    Propagate,
}

impl DeletePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeletePolicy::Swallow => "swallow",
            DeletePolicy::Propagate => "propagate",
        }
    }
}

/// Error returned when a string is not a known [`DeletePolicy`].
#[derive(Debug, thiserror::Error)]
#[error("unknown delete policy '{0}' (expected 'swallow' or 'propagate')")]
pub struct ParseDeletePolicyError(String);

impl std::str::FromStr for DeletePolicy {
    type Err = ParseDeletePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "swallow" => Ok(DeletePolicy::Swallow),
            "propagate" => Ok(DeletePolicy::Propagate),
            _ => Err(ParseDeletePolicyError(s.to_owned())),
        }
    }
}

impl std::fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service for managing the image files in one library directory
///
/// # Design
///
/// - Directory-scoped: each instance is bound to one flat directory
/// - Stateless: every query re-reads the directory
/// - Validated names: every path is `root_directory/<FileName>`, so no operation can
///   escape the directory
#[derive(Debug, Clone)]
pub struct InventoryService {
    /// Directory holding the library's files
    root_directory: PathBuf,

    /// How delete failures are reported
    delete_policy: DeletePolicy,
}

impl InventoryService {
    /// Creates a service for `root_directory` without touching the filesystem.
    ///
    /// The directory does not have to exist: listing a missing directory yields an empty
    /// inventory and writes into it fail.
    pub fn new(root_directory: impl Into<PathBuf>) -> Self {
        Self {
            root_directory: root_directory.into(),
            delete_policy: DeletePolicy::default(),
        }
    }

    /// Creates a service for an existing directory.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidRootDirectory` if:
    /// - The root directory does not exist or is not a directory
    /// - Path canonicalisation fails
    pub fn open(root_directory: &Path) -> FilesResult<Self> {
        if !root_directory.exists() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Directory does not exist: {}",
                root_directory.display()
            )));
        }

        if !root_directory.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Path is not a directory: {}",
                root_directory.display()
            )));
        }

        let root_directory = root_directory.canonicalize().map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot canonicalize path {}: {}",
                root_directory.display(),
                e
            ))
        })?;

        Ok(Self::new(root_directory))
    }

    /// Returns the service with a different delete policy.
    #[must_use]
    pub fn with_delete_policy(mut self, delete_policy: DeletePolicy) -> Self {
        self.delete_policy = delete_policy;
        self
    }

    /// Returns the library directory.
    #[must_use]
    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    #[must_use]
    pub fn delete_policy(&self) -> DeletePolicy {
        self.delete_policy
    }

    /// Scans the directory and returns the current inventory.
    ///
    /// Never fails: if the directory cannot be read the snapshot is empty. Entries that
    /// cannot be inspected, or whose names are not valid UTF-8, are skipped.
    pub fn list(&self) -> InventorySnapshot {
        let entries = match fs::read_dir(&self.root_directory) {
            Ok(it) => it,
            Err(e) => {
                tracing::warn!(
                    "cannot scan library directory {}: {}",
                    self.root_directory.display(),
                    e
                );
                return InventorySnapshot::empty();
            }
        };

        let mut names = Vec::new();
        for entry in entries.flatten() {
            let Ok(raw) = entry.file_name().into_string() else {
                tracing::debug!("skipping non UTF-8 entry in {}", self.root_directory.display());
                continue;
            };
            let Ok(name) = FileName::new(raw) else {
                continue;
            };
            if !name.is_recognised_image() {
                continue;
            }

            // fs::metadata follows symlinks, so a link to an image file is listed.
            let is_file = fs::metadata(entry.path())
                .map(|m| m.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }

            names.push(name);
        }

        let snapshot = InventorySnapshot::new(names);
        tracing::debug!(
            "scanned {}: {} files, generation {}",
            self.root_directory.display(),
            snapshot.len(),
            snapshot.generation()
        );
        snapshot
    }

    /// Returns the current inventory names without the snapshot tag.
    pub fn names(&self) -> Vec<FileName> {
        self.list().into_names()
    }

    /// Resolves a name to its absolute path in the library.
    ///
    /// Pure: does not check that the file exists.
    #[must_use]
    pub fn resolve_path(&self, name: &FileName) -> PathBuf {
        self.root_directory.join(name.as_str())
    }

    /// Resolves a position in `snapshot` to a path.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::IndexOutOfRange` if `index >= snapshot.len()`.
    pub fn resolve_index(&self, snapshot: &InventorySnapshot, index: usize) -> FilesResult<PathBuf> {
        let name = snapshot.get(index).ok_or(FilesError::IndexOutOfRange {
            index,
            len: snapshot.len(),
        })?;
        Ok(self.resolve_path(name))
    }

    /// Resolves a position in a fresh listing to a path.
    ///
    /// Equivalent to `resolve_index(&self.list(), index)`. Callers holding an older
    /// listing should use [`Self::resolve_index`] with that listing instead.
    pub fn resolve_index_live(&self, index: usize) -> FilesResult<PathBuf> {
        self.resolve_index(&self.list(), index)
    }

    /// Whether a regular file exists under `name`.
    pub fn contains(&self, name: &FileName) -> bool {
        self.resolve_path(name).is_file()
    }

    /// Stores `data` under `name`.
    ///
    /// If anything already exists under `name`, `resolver` decides whether to overwrite it.
    /// Declining leaves the existing file untouched and returns [`AddOutcome::Declined`].
    ///
    /// # Errors
    ///
    /// Returns `FilesError::Write` if the write fails. There is no retry and no cleanup of
    /// a partial write.
    pub fn add<R>(&self, name: &FileName, data: &[u8], resolver: &mut R) -> FilesResult<AddOutcome>
    where
        R: ConflictResolver + ?Sized,
    {
        if !name.is_recognised_image() {
            tracing::warn!(
                "adding {} with an unrecognised extension; it will not be listed",
                name
            );
        }

        let path = self.resolve_path(name);

        let outcome = if fs::symlink_metadata(&path).is_ok() {
            match resolver.confirm_overwrite(name) {
                OverwriteDecision::Overwrite => AddOutcome::Overwritten,
                OverwriteDecision::Cancel => {
                    tracing::info!("overwrite of {} declined", name);
                    return Ok(AddOutcome::Declined);
                }
            }
        } else {
            AddOutcome::Created
        };

        fs::write(&path, data).map_err(|source| FilesError::Write {
            path: path.clone(),
            source,
        })?;

        tracing::info!(
            "{} {} ({} bytes)",
            match outcome {
                AddOutcome::Overwritten => "overwrote",
                _ => "added",
            },
            name,
            data.len()
        );
        Ok(outcome)
    }

    /// Copies a file from elsewhere on disk into the library.
    ///
    /// The stored name defaults to the source's base name.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - The source cannot be read (`Read`)
    /// - No name is given and the source has no usable base name (`InvalidName`)
    /// - The write fails (`Write`)
    pub fn import_from_path<R>(
        &self,
        source_path: &Path,
        name: Option<FileName>,
        resolver: &mut R,
    ) -> FilesResult<AddOutcome>
    where
        R: ConflictResolver + ?Sized,
    {
        let name = match name {
            Some(name) => name,
            None => FileName::from_path(source_path)?,
        };

        let data = fs::read(source_path).map_err(|source| FilesError::Read {
            path: source_path.to_path_buf(),
            source,
        })?;

        self.add(&name, &data, resolver)
    }

    /// Reads the contents of a library file.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::NotFound` if nothing exists under `name`, or
    /// `FilesError::Read` for any other I/O failure.
    pub fn read(&self, name: &FileName) -> FilesResult<Vec<u8>> {
        let path = self.resolve_path(name);
        fs::read(&path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                FilesError::NotFound(path.clone())
            } else {
                FilesError::Read {
                    path: path.clone(),
                    source,
                }
            }
        })
    }

    /// Collects size, media type, digest and modification time for a library file.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::NotFound` if `name` is not a regular file, or
    /// `FilesError::Read` if it cannot be read.
    pub fn describe(&self, name: &FileName) -> FilesResult<FileMetadata> {
        let path = self.resolve_path(name);

        let metadata = match fs::metadata(&path) {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(FilesError::NotFound(path)),
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(FilesError::NotFound(path)),
            Err(source) => return Err(FilesError::Read { path, source }),
        };

        let buffer = self.read(name)?;

        let mut hasher = Sha256::new();
        hasher.update(&buffer);
        let sha256 = hex::encode(hasher.finalize());

        // Detect media type (best-effort)
        let media_type = infer::get(&buffer).map(|kind| kind.mime_type().to_owned());

        Ok(FileMetadata {
            name: name.clone(),
            size_bytes: buffer.len() as u64,
            extension: name.extension().map(|e| e.to_ascii_lowercase()),
            media_type,
            sha256,
            modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    /// Sniffs the media type of a library file from its leading bytes.
    ///
    /// Returns `None` if the file cannot be read or its type is not recognised.
    pub fn sniff_media_type(&self, name: &FileName) -> Option<String> {
        let path = self.resolve_path(name);
        match infer::get_from_path(&path) {
            Ok(kind) => kind.map(|k| k.mime_type().to_owned()),
            Err(e) => {
                tracing::debug!("cannot sniff {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Removes the file stored under `name`.
    ///
    /// Directories are never removed. With [`DeletePolicy::Swallow`] every failure,
    /// including a missing file, is logged and `Ok(())` is returned; callers confirm the
    /// removal by listing again.
    ///
    /// # Errors
    ///
    /// With [`DeletePolicy::Propagate`], returns `FilesError::NotFound` if nothing exists
    /// under `name` and `FilesError::Delete` if removal fails.
    pub fn delete(&self, name: &FileName) -> FilesResult<()> {
        let path = self.resolve_path(name);

        let result = match fs::symlink_metadata(&path) {
            Ok(m) if m.is_dir() => Err(FilesError::Delete {
                path: path.clone(),
                source: std::io::Error::other("refusing to delete a directory"),
            }),
            Ok(_) => fs::remove_file(&path).map_err(|source| FilesError::Delete {
                path: path.clone(),
                source,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(FilesError::NotFound(path.clone())),
            Err(source) => Err(FilesError::Delete {
                path: path.clone(),
                source,
            }),
        };

        match result {
            Ok(()) => {
                tracing::info!("deleted {}", name);
                Ok(())
            }
            Err(e) => match self.delete_policy {
                DeletePolicy::Propagate => Err(e),
                DeletePolicy::Swallow => {
                    tracing::warn!("ignoring delete failure: {}", e);
                    Ok(())
                }
            },
        }
    }

    /// Removes the file at `index` in `snapshot`.
    ///
    /// The directory is re-scanned first; if it no longer matches `snapshot` nothing is
    /// removed. Staleness and range errors are reported regardless of the delete policy,
    /// which only governs the removal itself.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - `index` is outside `snapshot` (`IndexOutOfRange`)
    /// - The directory changed since `snapshot` was taken (`StaleSnapshot`)
    /// - The removal fails under [`DeletePolicy::Propagate`]
    pub fn delete_at(&self, snapshot: &InventorySnapshot, index: usize) -> FilesResult<()> {
        let name = snapshot.get(index).ok_or(FilesError::IndexOutOfRange {
            index,
            len: snapshot.len(),
        })?;

        let live = self.list();
        if live.generation() != snapshot.generation() {
            return Err(FilesError::StaleSnapshot {
                expected: snapshot.generation(),
                actual: live.generation(),
            });
        }

        self.delete(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::{AlwaysOverwrite, NeverOverwrite};
    use std::fs;
    use tempfile::TempDir;

    /// Helper to create a library directory with the given files and subdirectories
    fn create_library(root: &Path, files: &[&str], dirs: &[&str]) -> PathBuf {
        let library = root.join("library");
        fs::create_dir_all(&library).expect("Failed to create library directory");
        for file in files {
            fs::write(library.join(file), file.as_bytes()).expect("Failed to write file");
        }
        for dir in dirs {
            fs::create_dir_all(library.join(dir)).expect("Failed to create subdirectory");
        }
        library
    }

    fn name(raw: &str) -> FileName {
        FileName::new(raw).unwrap()
    }

    fn listed(service: &InventoryService) -> Vec<String> {
        service.list().iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_open_success() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &[], &[]);

        let service = InventoryService::open(&library).unwrap();

        assert!(service.root_directory().ends_with("library"));
        assert_eq!(service.delete_policy(), DeletePolicy::Swallow);
    }

    #[test]
    fn test_open_root_not_exists() {
        let temp = TempDir::new().unwrap();
        let result = InventoryService::open(&temp.path().join("missing"));

        assert!(matches!(result, Err(FilesError::InvalidRootDirectory(_))));
    }

    #[test]
    fn test_open_root_not_directory() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("file.txt");
        fs::write(&root, "not a directory").unwrap();

        let result = InventoryService::open(&root);

        assert!(matches!(result, Err(FilesError::InvalidRootDirectory(_))));
    }

    #[test]
    fn test_list_filters_directories_and_extensions() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &["a.png", "b.txt"], &["subdir"]);
        let service = InventoryService::new(&library);

        assert_eq!(listed(&service), vec!["a.png"]);
    }

    #[test]
    fn test_list_excludes_directory_with_image_name() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &["real.jpg"], &["fake.jpg"]);
        let service = InventoryService::new(&library);

        assert_eq!(listed(&service), vec!["real.jpg"]);
    }

    #[test]
    fn test_list_is_sorted_and_case_insensitive() {
        let temp = TempDir::new().unwrap();
        let library = create_library(
            temp.path(),
            &["zebra.webp", "X.PNG", "apple.Jpeg", "m.gif", "k.bmp", "notes.md", ".png"],
            &[],
        );
        let service = InventoryService::new(&library);

        assert_eq!(
            listed(&service),
            vec!["X.PNG", "apple.Jpeg", "k.bmp", "m.gif", "zebra.webp"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_list_and_delete_name_with_backslash() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &["a\\b.png", "c.png"], &[]);
        let service = InventoryService::open(&library).unwrap();

        assert_eq!(listed(&service), vec!["a\\b.png", "c.png"]);

        service.delete(&name("a\\b.png")).unwrap();

        assert!(!library.join("a\\b.png").exists());
        assert_eq!(listed(&service), vec!["c.png"]);
    }

    #[test]
    fn test_list_does_not_recurse() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &["top.png"], &["nested"]);
        fs::write(library.join("nested").join("deep.png"), b"x").unwrap();
        let service = InventoryService::new(&library);

        assert_eq!(listed(&service), vec!["top.png"]);
    }

    #[test]
    fn test_list_missing_directory_is_empty() {
        let temp = TempDir::new().unwrap();
        let service = InventoryService::new(temp.path().join("missing"));

        let snapshot = service.list();

        assert!(snapshot.is_empty());
        assert_eq!(snapshot.generation(), InventorySnapshot::empty().generation());
    }

    #[test]
    fn test_list_reflects_external_changes() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &["a.png"], &[]);
        let service = InventoryService::new(&library);
        assert_eq!(listed(&service), vec!["a.png"]);

        fs::write(library.join("b.png"), b"b").unwrap();
        fs::remove_file(library.join("a.png")).unwrap();

        assert_eq!(listed(&service), vec!["b.png"]);
    }

    #[test]
    fn test_resolve_path_is_pure() {
        let temp = TempDir::new().unwrap();
        let service = InventoryService::new(temp.path().join("never-created"));

        let path = service.resolve_path(&name("ghost.png"));

        assert_eq!(path, temp.path().join("never-created").join("ghost.png"));
        assert!(!path.exists());
    }

    #[test]
    fn test_resolve_index() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &["b.png", "a.png"], &[]);
        let service = InventoryService::new(&library);
        let snapshot = service.list();

        assert_eq!(
            service.resolve_index(&snapshot, 0).unwrap(),
            library.join("a.png")
        );
        assert_eq!(service.resolve_index_live(1).unwrap(), library.join("b.png"));
        assert!(matches!(
            service.resolve_index(&snapshot, 2),
            Err(FilesError::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert!(matches!(
            service.resolve_index_live(5),
            Err(FilesError::IndexOutOfRange { index: 5, len: 2 })
        ));
    }

    #[test]
    fn test_add_new_file() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &[], &[]);
        let service = InventoryService::new(&library);

        let mut asked = false;
        let outcome = service
            .add(&name("a.png"), b"image bytes", &mut |_: &FileName| {
                asked = true;
                OverwriteDecision::Cancel
            })
            .unwrap();

        assert_eq!(outcome, AddOutcome::Created);
        assert!(outcome.is_success());
        assert!(!asked, "resolver must not be consulted without a conflict");
        assert_eq!(listed(&service), vec!["a.png"]);
        assert_eq!(fs::read(library.join("a.png")).unwrap(), b"image bytes");
    }

    #[test]
    fn test_add_existing_cancelled_keeps_content() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &[], &[]);
        let service = InventoryService::new(&library);
        service.add(&name("a.png"), b"original", &mut NeverOverwrite).unwrap();

        let outcome = service
            .add(&name("a.png"), b"replacement", &mut NeverOverwrite)
            .unwrap();

        assert_eq!(outcome, AddOutcome::Declined);
        assert!(!outcome.is_success());
        assert_eq!(fs::read(library.join("a.png")).unwrap(), b"original");
    }

    #[test]
    fn test_add_existing_confirmed_overwrites() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &[], &[]);
        let service = InventoryService::new(&library);
        service.add(&name("a.png"), b"original", &mut AlwaysOverwrite).unwrap();

        let mut asked = Vec::new();
        let outcome = service
            .add(&name("a.png"), b"replacement", &mut |n: &FileName| {
                asked.push(n.to_string());
                OverwriteDecision::Overwrite
            })
            .unwrap();

        assert_eq!(outcome, AddOutcome::Overwritten);
        assert_eq!(asked, vec!["a.png".to_string()]);
        assert_eq!(fs::read(library.join("a.png")).unwrap(), b"replacement");
        assert_eq!(listed(&service), vec!["a.png"]);
    }

    #[test]
    fn test_add_does_not_validate_content() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &[], &[]);
        let service = InventoryService::new(&library);

        let outcome = service
            .add(&name("not-really.jpg"), b"plain text", &mut AlwaysOverwrite)
            .unwrap();

        assert_eq!(outcome, AddOutcome::Created);
        assert_eq!(service.sniff_media_type(&name("not-really.jpg")), None);
    }

    #[test]
    fn test_add_unrecognised_extension_is_stored_but_not_listed() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &[], &[]);
        let service = InventoryService::new(&library);

        service
            .add(&name("readme.txt"), b"hello", &mut AlwaysOverwrite)
            .unwrap();

        assert!(service.contains(&name("readme.txt")));
        assert!(service.list().is_empty());
    }

    #[test]
    fn test_add_write_failure_is_reported() {
        let temp = TempDir::new().unwrap();
        let service = InventoryService::new(temp.path().join("missing"));

        let result = service.add(&name("a.png"), b"data", &mut AlwaysOverwrite);

        assert!(matches!(result, Err(FilesError::Write { .. })));
    }

    #[test]
    fn test_add_over_directory_fails_after_confirmation() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &[], &["taken.png"]);
        let service = InventoryService::new(&library);

        let result = service.add(&name("taken.png"), b"data", &mut AlwaysOverwrite);

        assert!(matches!(result, Err(FilesError::Write { .. })));
        assert!(library.join("taken.png").is_dir());
    }

    #[test]
    fn test_add_then_resolve_roundtrip() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &[], &[]);
        let service = InventoryService::new(&library);
        let data: Vec<u8> = (0..=255).collect();

        service.add(&name("bytes.bmp"), &data, &mut AlwaysOverwrite).unwrap();

        let path = service.resolve_path(&name("bytes.bmp"));
        assert_eq!(fs::read(path).unwrap(), data);
        assert_eq!(service.read(&name("bytes.bmp")).unwrap(), data);
    }

    #[test]
    fn test_import_from_path_uses_source_name() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &[], &[]);
        let source = temp.path().join("IMG_0042.JPG");
        fs::write(&source, b"jpeg").unwrap();
        let service = InventoryService::new(&library);

        let outcome = service
            .import_from_path(&source, None, &mut AlwaysOverwrite)
            .unwrap();

        assert_eq!(outcome, AddOutcome::Created);
        assert_eq!(listed(&service), vec!["IMG_0042.JPG"]);
    }

    #[test]
    fn test_import_from_path_with_explicit_name() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &[], &[]);
        let source = temp.path().join("download.bin");
        fs::write(&source, b"gif").unwrap();
        let service = InventoryService::new(&library);

        service
            .import_from_path(&source, Some(name("renamed.gif")), &mut AlwaysOverwrite)
            .unwrap();

        assert_eq!(listed(&service), vec!["renamed.gif"]);
    }

    #[test]
    fn test_import_from_missing_source() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &[], &[]);
        let service = InventoryService::new(&library);

        let result = service.import_from_path(
            &temp.path().join("nope.png"),
            None,
            &mut AlwaysOverwrite,
        );

        assert!(matches!(result, Err(FilesError::Read { .. })));
    }

    #[test]
    fn test_read_not_found() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &[], &[]);
        let service = InventoryService::new(&library);

        let result = service.read(&name("ghost.png"));

        assert!(matches!(result, Err(FilesError::NotFound(_))));
    }

    #[test]
    fn test_describe_png() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &[], &[]);
        let service = InventoryService::new(&library);
        let png_header = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        service
            .add(&name("Pic.PNG"), &png_header, &mut AlwaysOverwrite)
            .unwrap();

        let metadata = service.describe(&name("Pic.PNG")).unwrap();

        assert_eq!(metadata.name.as_str(), "Pic.PNG");
        assert_eq!(metadata.size_bytes, 8);
        assert_eq!(metadata.extension.as_deref(), Some("png"));
        assert_eq!(metadata.media_type.as_deref(), Some("image/png"));
        assert_eq!(metadata.sha256.len(), 64);
        assert!(metadata.modified_at.is_some());
        assert_eq!(
            service.sniff_media_type(&name("Pic.PNG")).as_deref(),
            Some("image/png")
        );
    }

    #[test]
    fn test_describe_directory_is_not_found() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &[], &["folder.png"]);
        let service = InventoryService::new(&library);

        let result = service.describe(&name("folder.png"));

        assert!(matches!(result, Err(FilesError::NotFound(_))));
    }

    #[test]
    fn test_file_metadata_serialization() {
        let metadata = FileMetadata {
            name: name("cat.gif"),
            size_bytes: 1024,
            extension: Some("gif".into()),
            media_type: Some("image/gif".into()),
            sha256: "abc123".into(),
            modified_at: Some("2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap()),
        };

        let json = serde_json::to_string(&metadata).unwrap();
        assert!(json.contains("cat.gif"));
        assert!(json.contains("image/gif"));

        let back: FileMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metadata);
    }

    #[test]
    fn test_delete_existing() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &["a.png", "b.png"], &[]);
        let service = InventoryService::new(&library);

        service.delete(&name("a.png")).unwrap();

        assert_eq!(listed(&service), vec!["b.png"]);
    }

    #[test]
    fn test_delete_missing_is_swallowed_by_default() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &["a.png"], &[]);
        let service = InventoryService::new(&library);

        assert!(service.delete(&name("missing.png")).is_ok());
        assert_eq!(listed(&service), vec!["a.png"]);
    }

    #[test]
    fn test_delete_missing_propagates_when_configured() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &[], &[]);
        let service = InventoryService::new(&library).with_delete_policy(DeletePolicy::Propagate);

        let result = service.delete(&name("missing.png"));

        assert!(matches!(result, Err(FilesError::NotFound(_))));
    }

    #[test]
    fn test_delete_never_removes_directories() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &[], &["album.png"]);
        let swallow = InventoryService::new(&library);
        let propagate = swallow.clone().with_delete_policy(DeletePolicy::Propagate);

        assert!(swallow.delete(&name("album.png")).is_ok());
        assert!(matches!(
            propagate.delete(&name("album.png")),
            Err(FilesError::Delete { .. })
        ));
        assert!(library.join("album.png").is_dir());
    }

    #[test]
    fn test_delete_at_current_snapshot() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &["a.png", "b.png", "c.png"], &[]);
        let service = InventoryService::new(&library);
        let snapshot = service.list();

        service.delete_at(&snapshot, 1).unwrap();

        assert_eq!(listed(&service), vec!["a.png", "c.png"]);
    }

    #[test]
    fn test_delete_at_stale_snapshot_removes_nothing() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &["b.png", "c.png"], &[]);
        let service = InventoryService::new(&library);
        let snapshot = service.list();

        // External change shifts every index by one.
        fs::write(library.join("a.png"), b"a").unwrap();

        let result = service.delete_at(&snapshot, 0);

        assert!(matches!(result, Err(FilesError::StaleSnapshot { .. })));
        assert_eq!(listed(&service), vec!["a.png", "b.png", "c.png"]);
    }

    #[test]
    fn test_delete_at_out_of_range() {
        let temp = TempDir::new().unwrap();
        let library = create_library(temp.path(), &["a.png"], &[]);
        let service = InventoryService::new(&library);
        let snapshot = service.list();

        let result = service.delete_at(&snapshot, 3);

        assert!(matches!(
            result,
            Err(FilesError::IndexOutOfRange { index: 3, len: 1 })
        ));
        assert_eq!(listed(&service), vec!["a.png"]);
    }

    #[test]
    fn test_delete_policy_parse() {
        assert_eq!("swallow".parse::<DeletePolicy>().unwrap(), DeletePolicy::Swallow);
        assert_eq!(
            " Propagate ".parse::<DeletePolicy>().unwrap(),
            DeletePolicy::Propagate
        );
        assert!("explode".parse::<DeletePolicy>().is_err());
        assert_eq!(DeletePolicy::Propagate.to_string(), "propagate");
    }
}
