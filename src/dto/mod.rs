//! Serializable response bodies, matching the wire shapes the site's
//! frontend consumes (camelCase keys).
use chrono::Utc;
use serde::Serialize;

use crate::services::uploads::StoredUpload;

/// Result of a relayed email call.
#[derive(Clone, Debug, Serialize)]
pub struct RelayReceipt {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

impl RelayReceipt {
    pub fn delivered() -> Self {
        Self {
            success: true,
            message: Some("Email sent successfully".to_string()),
            error: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Result of a successful upload, for either storage backend.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub success: bool,
    pub file_id: String,
    pub file_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimized_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub original_name: String,
    pub size: u64,
    pub mimetype: String,
    pub storage: &'static str,
}

impl UploadReceipt {
    pub fn from_stored(stored: StoredUpload, public_base_url: &str) -> Self {
        match stored {
            StoredUpload::Hosted {
                original_name,
                image,
            } => Self {
                success: true,
                file_id: image.public_id,
                file_url: image.secure_url,
                optimized_url: Some(image.optimized_url),
                thumbnail_url: Some(image.thumbnail_url),
                original_name: original_name.to_string(),
                size: image.bytes,
                mimetype: image.format,
                storage: "cloudinary",
            },
            StoredUpload::Local { id, entry } => Self {
                success: true,
                file_id: id.to_string(),
                file_url: format!("{public_base_url}/api/file/{id}"),
                optimized_url: None,
                thumbnail_url: None,
                original_name: entry.original_name.to_string(),
                size: entry.size,
                mimetype: entry.mime_type,
                storage: "local",
            },
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: String,
    pub service: &'static str,
    pub temp_files: usize,
}

impl HealthStatus {
    pub fn current(temp_files: usize) -> Self {
        Self {
            status: "OK",
            timestamp: Utc::now().to_rfc3339(),
            service: "clubforms",
            temp_files,
        }
    }
}

/// Generic failure body.
#[derive(Clone, Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}
