//! Constants used by the inventory.

/// Lower-case file extensions that make a file part of the inventory.
///
/// Kept in sync with [`picshelf_types::ImageExtension::ALL`].
pub const RECOGNISED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Number of bytes of a generation fingerprint kept from the SHA-256 digest.
pub(crate) const GENERATION_BYTES: usize = 8;
