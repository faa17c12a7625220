//! Application services orchestrating domain logic and side effects.
pub mod cloudinary;
pub mod registry;
pub mod relay;
pub mod uploads;

/// Convenience alias for service results.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by service operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("only image files are allowed")]
    NotAnImage,
    #[error("file exceeds the 5 MiB upload limit")]
    TooLarge,
    #[error("invalid file name")]
    InvalidFileName,
    #[error("failed to prepare storage")]
    StorageSetup(#[source] std::io::Error),
    #[error("failed to list stored files")]
    ListEntries(#[source] std::io::Error),
    #[error("failed to save file")]
    SaveFile(#[source] std::io::Error),
}
