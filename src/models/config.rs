//! Configuration model loaded from external sources.

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
/// Basic configuration shared across handlers.
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    /// Base URL clients can reach this service on; used to build file URLs.
    pub public_base_url: String,
    /// External webhook receiving relayed form submissions.
    pub webhook_url: String,
    pub upload_path: String,
    /// Retention window for locally stored uploads, in seconds.
    pub retention_secs: u64,
    pub allowed_origins: Vec<String>,
    /// External image hosting is enabled only when the whole section is
    /// present.
    #[serde(default)]
    pub cloudinary: Option<CloudinaryConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}
