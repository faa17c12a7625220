//! Thin client for the Cloudinary upload API.
//!
//! Uploads land in a dedicated temp folder, tagged so the host's own bulk
//! cleanup can reclaim them, with an incoming transformation capping the
//! stored size at 800x600. Requests are signed with SHA-256 over the sorted
//! parameter string.
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::config::CloudinaryConfig;

const UPLOAD_FOLDER: &str = "club/temp-uploads";
const UPLOAD_TAGS: &str = "temp-upload,auto-delete";
const INCOMING_TRANSFORMATION: &str = "c_limit,h_600,q_auto:good,w_800";
const OPTIMIZED_TRANSFORMATION: &str = "c_limit,f_auto,h_600,q_auto:good,w_800";
const THUMBNAIL_TRANSFORMATION: &str = "c_fill,f_auto,g_face,h_200,q_auto:good,w_200";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A successfully hosted image with its derived display variants.
#[derive(Clone, Debug)]
pub struct HostedImage {
    pub public_id: String,
    pub secure_url: String,
    /// Size-capped 800x600 rendition.
    pub optimized_url: String,
    /// 200x200 face-gravity crop.
    pub thumbnail_url: String,
    pub bytes: u64,
    pub format: String,
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("image host request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("image host responded with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Deserialize)]
struct UploadApiResponse {
    public_id: String,
    secure_url: String,
    bytes: u64,
    format: String,
}

#[derive(Clone)]
pub struct CloudinaryClient {
    http: Client,
    config: CloudinaryConfig,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { http, config })
    }

    pub async fn upload(
        &self,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<HostedImage, HostError> {
        let timestamp = Utc::now().timestamp().to_string();
        // Keys must stay sorted; the signature covers exactly these.
        let signed_params = [
            ("folder", UPLOAD_FOLDER),
            ("tags", UPLOAD_TAGS),
            ("timestamp", timestamp.as_str()),
            ("transformation", INCOMING_TRANSFORMATION),
        ];
        let signature = sign(&signed_params, &self.config.api_secret);

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)?;
        let mut form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in signed_params {
            form = form.text(key.to_string(), value.to_string());
        }

        let url = format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.config.cloud_name
        );
        let response = self.http.post(&url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HostError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: UploadApiResponse = response.json().await?;
        Ok(HostedImage {
            optimized_url: self.delivery_url(OPTIMIZED_TRANSFORMATION, &parsed.public_id),
            thumbnail_url: self.delivery_url(THUMBNAIL_TRANSFORMATION, &parsed.public_id),
            public_id: parsed.public_id,
            secure_url: parsed.secure_url,
            bytes: parsed.bytes,
            format: parsed.format,
        })
    }

    fn delivery_url(&self, transformation: &str, public_id: &str) -> String {
        format!(
            "https://res.cloudinary.com/{}/image/upload/{}/{}",
            self.config.cloud_name, transformation, public_id
        )
    }
}

/// SHA-256 over `key=value&...` pairs followed by the API secret, hex encoded.
fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(signing_payload(params).as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn signing_payload(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CloudinaryClient {
        CloudinaryClient::new(CloudinaryConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn signing_payload_joins_sorted_pairs() {
        let payload = signing_payload(&[
            ("folder", "club/temp-uploads"),
            ("tags", "temp-upload,auto-delete"),
            ("timestamp", "1700000000"),
        ]);
        assert_eq!(
            payload,
            "folder=club/temp-uploads&tags=temp-upload,auto-delete&timestamp=1700000000"
        );
    }

    #[test]
    fn signature_is_hex_and_keyed_by_secret() {
        let params = [("timestamp", "1700000000")];
        let a = sign(&params, "secret-a");
        let b = sign(&params, "secret-b");

        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
        assert_eq!(a, sign(&params, "secret-a"));
    }

    #[test]
    fn delivery_urls_carry_the_transformation() {
        let client = client();
        assert_eq!(
            client.delivery_url(OPTIMIZED_TRANSFORMATION, "club/temp-uploads/abc"),
            "https://res.cloudinary.com/demo/image/upload/c_limit,f_auto,h_600,q_auto:good,w_800/club/temp-uploads/abc"
        );
        assert_eq!(
            client.delivery_url(THUMBNAIL_TRANSFORMATION, "club/temp-uploads/abc"),
            "https://res.cloudinary.com/demo/image/upload/c_fill,f_auto,g_face,h_200,q_auto:good,w_200/club/temp-uploads/abc"
        );
    }
}
