//! The library view: what a screen listing the library shows.
//!
//! [`LibraryView`] owns the sort order and the snapshot it is displaying. Changing the sort
//! order re-derives the rows from a fresh listing; row numbers always refer to the snapshot
//! on display, and mutations through a stale snapshot are refused by the inventory.

use crate::constants::{DISPLAY_NAME_HEAD_CHARS, DISPLAY_NAME_TAIL_CHARS, EMPTY_LIBRARY_MESSAGE};
use crate::preferences::SortOrder;
use crate::CoreResult;
use picshelf_files::{
    AddOutcome, ConflictResolver, FileMetadata, FileName, FilesError, InventoryService,
    InventorySnapshot,
};
use std::path::{Path, PathBuf};
use unicode_segmentation::UnicodeSegmentation;

/// Whether a row can show a thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    /// The file's content sniffs as an image of this media type
    Available { media_type: String },
    /// The file could not be read or is not a recognisable image; show the name only
    Unavailable,
}

/// One displayed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryRow {
    pub name: FileName,
    pub display_name: String,
    pub preview: Preview,
}

/// Shortens `text` to its first `max_left` and last `max_right` grapheme clusters joined by
/// `...`.
///
/// Text of at most `max_left + max_right` graphemes is returned unchanged. Counting
/// graphemes keeps combining marks and emoji sequences whole.
pub fn ellipsize_middle(text: &str, max_left: usize, max_right: usize) -> String {
    let graphemes: Vec<&str> = text.graphemes(true).collect();
    let len = graphemes.len();
    if len <= max_left + max_right {
        return text.to_owned();
    }

    format!(
        "{}...{}",
        graphemes[..max_left].concat(),
        graphemes[len - max_right..].concat()
    )
}

/// Display form of a file name in the list.
pub fn display_name(name: &FileName) -> String {
    ellipsize_middle(name.as_str(), DISPLAY_NAME_HEAD_CHARS, DISPLAY_NAME_TAIL_CHARS)
}

/// The presentation state of the library list.
#[derive(Debug)]
pub struct LibraryView {
    inventory: InventoryService,
    sort_order: SortOrder,
    snapshot: InventorySnapshot,
}

impl LibraryView {
    /// Creates a view and takes its first snapshot.
    pub fn new(inventory: InventoryService, sort_order: SortOrder) -> Self {
        let snapshot = inventory.list();
        Self {
            inventory,
            sort_order,
            snapshot,
        }
    }

    pub fn inventory(&self) -> &InventoryService {
        &self.inventory
    }

    pub fn snapshot(&self) -> &InventorySnapshot {
        &self.snapshot
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    /// Re-scans the directory.
    pub fn refresh(&mut self) {
        self.snapshot = self.inventory.list();
    }

    /// Switches the presentation order and re-scans.
    pub fn set_sort_order(&mut self, sort_order: SortOrder) {
        self.sort_order = sort_order;
        self.refresh();
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    /// Text shown in place of rows when the library is empty.
    pub fn empty_message(&self) -> &'static str {
        EMPTY_LIBRARY_MESSAGE
    }

    /// Maps a displayed row number to an index into the snapshot.
    fn snapshot_index(&self, row: usize) -> CoreResult<usize> {
        let len = self.snapshot.len();
        if row >= len {
            return Err(FilesError::IndexOutOfRange { index: row, len }.into());
        }
        Ok(match self.sort_order {
            SortOrder::Ascending => row,
            SortOrder::Descending => len - 1 - row,
        })
    }

    /// Names in display order.
    pub fn names(&self) -> Vec<&FileName> {
        let names = self.snapshot.iter();
        match self.sort_order {
            SortOrder::Ascending => names.collect(),
            SortOrder::Descending => names.rev().collect(),
        }
    }

    /// Rows in display order.
    ///
    /// A file that cannot be sniffed still gets a row, with [`Preview::Unavailable`].
    pub fn rows(&self) -> Vec<LibraryRow> {
        self.names()
            .into_iter()
            .map(|name| {
                let preview = match self.inventory.sniff_media_type(name) {
                    Some(media_type) if media_type.starts_with("image/") => {
                        Preview::Available { media_type }
                    }
                    _ => Preview::Unavailable,
                };
                LibraryRow {
                    name: name.clone(),
                    display_name: display_name(name),
                    preview,
                }
            })
            .collect()
    }

    /// Full name of the file shown at `row`.
    pub fn name_at(&self, row: usize) -> CoreResult<&FileName> {
        let index = self.snapshot_index(row)?;
        self.snapshot
            .get(index)
            .ok_or_else(|| {
                FilesError::IndexOutOfRange {
                    index: row,
                    len: self.snapshot.len(),
                }
                .into()
            })
    }

    /// Path of the file shown at `row`.
    pub fn path_at(&self, row: usize) -> CoreResult<PathBuf> {
        let index = self.snapshot_index(row)?;
        Ok(self.inventory.resolve_index(&self.snapshot, index)?)
    }

    /// Metadata of the file shown at `row`.
    pub fn describe_row(&self, row: usize) -> CoreResult<FileMetadata> {
        let name = self.name_at(row)?;
        Ok(self.inventory.describe(name)?)
    }

    /// Deletes the file shown at `row`, then re-scans.
    ///
    /// If the directory changed since the rows were produced nothing is deleted and
    /// `FilesError::StaleSnapshot` is returned; the view is refreshed either way.
    pub fn delete_row(&mut self, row: usize) -> CoreResult<()> {
        let index = self.snapshot_index(row)?;
        let result = self.inventory.delete_at(&self.snapshot, index);
        self.refresh();
        result?;
        Ok(())
    }

    /// Stores `data` under `name`, then re-scans.
    pub fn add<R>(&mut self, name: &FileName, data: &[u8], resolver: &mut R) -> CoreResult<AddOutcome>
    where
        R: ConflictResolver + ?Sized,
    {
        let result = self.inventory.add(name, data, resolver);
        self.refresh();
        Ok(result?)
    }

    /// Imports a file from disk, then re-scans.
    pub fn import<R>(
        &mut self,
        source_path: &Path,
        name: Option<FileName>,
        resolver: &mut R,
    ) -> CoreResult<AddOutcome>
    where
        R: ConflictResolver + ?Sized,
    {
        let result = self.inventory.import_from_path(source_path, name, resolver);
        self.refresh();
        Ok(result?)
    }
}
