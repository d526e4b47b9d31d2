//! Overwrite confirmation for `add`.
//!
//! Adding a file under a name that already exists pauses on a [`ConflictResolver`]. The
//! resolver usually asks the user; the directory is not touched until it answers.

use picshelf_types::FileName;

/// Answer to "a file with this name already exists, overwrite it?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteDecision {
    Overwrite,
    Cancel,
}

impl OverwriteDecision {
    /// Maps a yes/no answer onto a decision.
    pub fn from_confirmed(confirmed: bool) -> Self {
        if confirmed {
            OverwriteDecision::Overwrite
        } else {
            OverwriteDecision::Cancel
        }
    }
}

/// Decides whether an existing file may be overwritten.
pub trait ConflictResolver {
    fn confirm_overwrite(&mut self, name: &FileName) -> OverwriteDecision;
}

impl<F> ConflictResolver for F
where
    F: FnMut(&FileName) -> OverwriteDecision,
{
    fn confirm_overwrite(&mut self, name: &FileName) -> OverwriteDecision {
        self(name)
    }
}

/// Confirms every overwrite.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOverwrite;

impl ConflictResolver for AlwaysOverwrite {
    fn confirm_overwrite(&mut self, _name: &FileName) -> OverwriteDecision {
        OverwriteDecision::Overwrite
    }
}

/// Declines every overwrite.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverOverwrite;

impl ConflictResolver for NeverOverwrite {
    fn confirm_overwrite(&mut self, _name: &FileName) -> OverwriteDecision {
        OverwriteDecision::Cancel
    }
}
