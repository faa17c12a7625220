//! Strongly-typed domain structures for upload handling.
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identifier of a temporarily stored file. Freshly generated per upload,
/// never reused.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(Uuid);

impl FileId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl FromStr for FileId {
    type Err = TypeConstraintError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| TypeConstraintError::InvalidFileId)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Root directory holding temporarily stored uploads.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UploadRoot(PathBuf);

impl UploadRoot {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Storage path for a file id, keeping the original extension so served
    /// files keep a recognizable name on disk.
    pub fn resolve(&self, id: FileId, original: &FileName) -> PathBuf {
        let stored = match original.extension() {
            Some(ext) => format!("{id}.{ext}"),
            None => id.to_string(),
        };
        self.0.join(stored)
    }
}

impl From<PathBuf> for UploadRoot {
    fn from(value: PathBuf) -> Self {
        Self::new(value)
    }
}

/// Sanitized file name (single path component).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileName(String);

impl FileName {
    pub fn try_new(value: String) -> Result<Self, TypeConstraintError> {
        let path = Path::new(&value);
        let mut components = path.components();
        match (components.next(), components.next()) {
            (Some(std::path::Component::Normal(component)), None) => {
                Ok(Self(component.to_string_lossy().to_string()))
            }
            _ => Err(TypeConstraintError::InvalidFileName),
        }
    }

    pub fn try_from_str(value: &str) -> Result<Self, TypeConstraintError> {
        Self::try_new(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn extension(&self) -> Option<String> {
        Path::new(&self.0)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }

    pub fn is_image(&self) -> bool {
        self.extension()
            .map(|ext| {
                matches!(
                    ext.as_str(),
                    "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp" | "svg"
                )
            })
            .unwrap_or(false)
    }
}

impl TryFrom<String> for FileName {
    type Error = TypeConstraintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<FileName> for String {
    fn from(value: FileName) -> Self {
        value.0
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Error)]
pub enum TypeConstraintError {
    #[error("invalid file id")]
    InvalidFileId,
    #[error("invalid file name")]
    InvalidFileName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_root_keeps_extension() {
        let root = UploadRoot::from(PathBuf::from("upload"));
        let id = FileId::generate();
        let name = FileName::try_from_str("pasfoto.JPG").unwrap();

        let path = root.resolve(id, &name);
        assert_eq!(path, PathBuf::from(format!("upload/{id}.jpg")));
    }

    #[test]
    fn file_name_detects_images() {
        let png = FileName::try_new("photo.PNG".to_string()).unwrap();
        let txt = FileName::try_new("notes.txt".to_string()).unwrap();

        assert!(png.is_image());
        assert!(!txt.is_image());
    }

    #[test]
    fn file_name_rejects_nested() {
        assert!(FileName::try_new("foo/bar.txt".to_string()).is_err());
        assert!(FileName::try_new("../evil.txt".to_string()).is_err());
    }

    #[test]
    fn file_id_round_trips_through_display() {
        let id = FileId::generate();
        let parsed: FileId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn file_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<FileId>().is_err());
    }
}
