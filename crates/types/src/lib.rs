//! Validated value types shared across the picshelf crates.
//!
//! Types in this crate guarantee their invariants at construction time, so code that
//! receives one never has to re-check it. None of them touch the filesystem.

use std::path::Path;

/// Errors that can occur when validating a file name.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input was empty or contained only whitespace
    #[error("File name cannot be empty")]
    Empty,

    /// The input contained a path separator
    #[error("File name must not contain path separators: {0}")]
    PathSeparator(String),

    /// The input contained a NUL byte
    #[error("File name must not contain NUL bytes")]
    NulByte,

    /// The input was `.` or `..`
    #[error("File name is reserved: {0}")]
    Reserved(String),
}

/// Image formats the library recognises by file extension.
///
/// Matching is case-insensitive. Anything outside this set is invisible to the inventory,
/// whatever the file actually contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageExtension {
    Jpg,
    Jpeg,
    Png,
    Gif,
    Bmp,
    Webp,
}

impl ImageExtension {
    /// Every recognised extension, in canonical lower-case form.
    pub const ALL: [ImageExtension; 6] = [
        ImageExtension::Jpg,
        ImageExtension::Jpeg,
        ImageExtension::Png,
        ImageExtension::Gif,
        ImageExtension::Bmp,
        ImageExtension::Webp,
    ];

    /// Parses an extension (without the leading dot), ignoring ASCII case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(ext))
    }

    /// Returns the lower-case extension string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageExtension::Jpg => "jpg",
            ImageExtension::Jpeg => "jpeg",
            ImageExtension::Png => "png",
            ImageExtension::Gif => "gif",
            ImageExtension::Bmp => "bmp",
            ImageExtension::Webp => "webp",
        }
    }
}

impl std::fmt::Display for ImageExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The base name of a file inside the library directory.
///
/// A `FileName` is always a single path component: it cannot contain a path separator of
/// the host platform (`/`, and `\` on Windows), cannot be `.` or `..`, and cannot be blank.
/// It is *not* trimmed; surrounding whitespace is part of a real file name.
///
/// Ordering is byte-lexicographic on the UTF-8 name, which is the canonical inventory order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileName(String);

impl FileName {
    /// Validates and wraps a base file name.
    pub fn new(input: impl Into<String>) -> Result<Self, TextError> {
        let name = input.into();

        if name.trim().is_empty() {
            return Err(TextError::Empty);
        }
        if name.contains('\0') {
            return Err(TextError::NulByte);
        }
        if name.chars().any(std::path::is_separator) {
            return Err(TextError::PathSeparator(name));
        }
        if name == "." || name == ".." {
            return Err(TextError::Reserved(name));
        }

        Ok(Self(name))
    }

    /// Takes the final component of `path` as a file name.
    ///
    /// Fails when the path has no final component or it is not valid UTF-8.
    pub fn from_path(path: &Path) -> Result<Self, TextError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or(TextError::Empty)?;
        Self::new(name)
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the raw extension (text after the last dot), if any.
    ///
    /// A leading dot does not start an extension: `.png` has none, `a.` has none.
    pub fn extension(&self) -> Option<&str> {
        let (stem, ext) = self.0.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext)
    }

    /// Returns the recognised image format of this name, if it has one.
    pub fn image_extension(&self) -> Option<ImageExtension> {
        self.extension().and_then(ImageExtension::from_extension)
    }

    /// Whether the name carries a recognised image extension.
    pub fn is_recognised_image(&self) -> bool {
        self.image_extension().is_some()
    }

    /// Number of characters (Unicode scalar values) in the name.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl std::fmt::Display for FileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FileName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<Path> for FileName {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl std::str::FromStr for FileName {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FileName::new(s)
    }
}

impl serde::Serialize for FileName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for FileName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FileName::new(s).map_err(serde::de::Error::custom)
    }
}
