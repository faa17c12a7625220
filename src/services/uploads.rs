//! Upload admission: gate, then store externally or on local disk.
use std::fs;

use tempfile::NamedTempFile;

use crate::domain::{FileId, FileName};
use crate::services::cloudinary::{CloudinaryClient, HostedImage};
use crate::services::registry::{TempFileEntry, TempFileRegistry};
use crate::services::{ServiceError, ServiceResult};

pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Where an accepted upload ended up.
#[derive(Debug)]
pub enum StoredUpload {
    Hosted {
        original_name: FileName,
        image: HostedImage,
    },
    Local {
        id: FileId,
        entry: TempFileEntry,
    },
}

/// Accepts one image per request. When the external image host is
/// configured it takes precedence; a failed external write falls back to
/// local storage for that request instead of failing the upload.
#[derive(Clone)]
pub struct UploadService {
    registry: TempFileRegistry,
    image_host: Option<CloudinaryClient>,
}

impl UploadService {
    pub fn new(registry: TempFileRegistry, image_host: Option<CloudinaryClient>) -> Self {
        Self {
            registry,
            image_host,
        }
    }

    pub fn registry(&self) -> &TempFileRegistry {
        &self.registry
    }

    /// Gate the upload, then store it. The gate runs before any storage
    /// attempt: rejected files never touch the registry or the host.
    pub async fn store(
        &self,
        original_name: FileName,
        mime_type: String,
        size: u64,
        file: NamedTempFile,
    ) -> ServiceResult<StoredUpload> {
        if !mime_type.starts_with("image/") {
            return Err(ServiceError::NotAnImage);
        }
        if size > MAX_UPLOAD_BYTES {
            return Err(ServiceError::TooLarge);
        }

        if let Some(host) = &self.image_host {
            match fs::read(file.path()) {
                Ok(bytes) => {
                    match host.upload(original_name.as_str(), &mime_type, bytes).await {
                        Ok(image) => {
                            return Ok(StoredUpload::Hosted {
                                original_name,
                                image,
                            });
                        }
                        Err(err) => {
                            log::error!("image host upload failed, falling back to local: {err}")
                        }
                    }
                }
                Err(err) => log::error!("could not read upload for hosting: {err}"),
            }
        }

        let (id, entry) = self.registry.admit(original_name, mime_type, size, file)?;
        Ok(StoredUpload::Local { id, entry })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Write;
    use std::time::Duration;

    use tempfile::tempdir;

    use super::*;
    use crate::domain::UploadRoot;

    fn service(root: &std::path::Path) -> UploadService {
        let registry = TempFileRegistry::new(
            UploadRoot::new(root.to_path_buf()),
            Duration::from_secs(3600),
        )
        .unwrap();
        UploadService::new(registry, None)
    }

    fn fake_upload() -> NamedTempFile {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"fakejpeg").unwrap();
        temp
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected_before_storage() {
        let dir = tempdir().unwrap();
        let service = service(dir.path());

        let err = service
            .store(
                FileName::try_from_str("big.jpg").unwrap(),
                "image/jpeg".to_string(),
                6 * 1024 * 1024,
                fake_upload(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::TooLarge));
        assert!(service.registry().is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn non_image_mime_is_rejected() {
        let dir = tempdir().unwrap();
        let service = service(dir.path());

        let err = service
            .store(
                FileName::try_from_str("cv.pdf").unwrap(),
                "application/pdf".to_string(),
                1024,
                fake_upload(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotAnImage));
        assert!(service.registry().is_empty());
    }

    #[tokio::test]
    async fn accepted_image_is_resolvable_by_id() {
        let dir = tempdir().unwrap();
        let service = service(dir.path());

        let stored = service
            .store(
                FileName::try_from_str("pasfoto.jpg").unwrap(),
                "image/jpeg".to_string(),
                4 * 1024 * 1024,
                fake_upload(),
            )
            .await
            .unwrap();

        let StoredUpload::Local { id, entry } = stored else {
            panic!("expected local storage without a configured host");
        };
        assert_eq!(entry.size, 4 * 1024 * 1024);
        let resolved = service.registry().retrieve(id).unwrap();
        assert_eq!(resolved.original_name.as_str(), "pasfoto.jpg");
    }
}
