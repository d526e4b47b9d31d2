//! Immutable inventory listings.
//!
//! Every call to [`crate::InventoryService::list`] re-scans the directory and returns a fresh
//! [`InventorySnapshot`]. Positional operations take a snapshot explicitly so that an index
//! always refers to the listing the caller actually looked at.

use crate::constants::GENERATION_BYTES;
use picshelf_types::FileName;
use sha2::{Digest, Sha256};

/// Fingerprint of an ordered inventory listing.
///
/// Two scans of an unchanged directory produce the same generation. Adding, removing or
/// renaming a recognised file changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Generation(u64);

impl Generation {
    /// Computes the fingerprint of an ordered list of names.
    pub fn of(names: &[FileName]) -> Self {
        let mut hasher = Sha256::new();
        for name in names {
            hasher.update(name.as_str().as_bytes());
            // Separator so that ["ab", "c"] and ["a", "bc"] differ.
            hasher.update([0u8]);
        }
        let digest = hasher.finalize();

        let mut prefix = [0u8; GENERATION_BYTES];
        prefix.copy_from_slice(&digest[..GENERATION_BYTES]);
        Self(u64::from_be_bytes(prefix))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(self.0.to_be_bytes()))
    }
}

/// One ordered listing of the library, tagged with its [`Generation`].
///
/// Names are in ascending lexicographic order with no duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySnapshot {
    names: Vec<FileName>,
    generation: Generation,
}

impl InventorySnapshot {
    /// Builds a snapshot, sorting and de-duplicating `names`.
    pub(crate) fn new(mut names: Vec<FileName>) -> Self {
        names.sort();
        names.dedup();
        let generation = Generation::of(&names);
        Self { names, generation }
    }

    /// An empty listing, used when the directory cannot be scanned.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn names(&self) -> &[FileName] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FileName> {
        self.names.get(index)
    }

    pub fn contains(&self, name: &FileName) -> bool {
        self.names.binary_search(name).is_ok()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileName> {
        self.names.iter()
    }

    pub fn into_names(self) -> Vec<FileName> {
        self.names
    }
}

impl<'a> IntoIterator for &'a InventorySnapshot {
    type Item = &'a FileName;
    type IntoIter = std::slice::Iter<'a, FileName>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}
