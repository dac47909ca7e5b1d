//! Storage configuration types.

use std::path::PathBuf;
use std::time::Duration;

use fileserver_shared::StorageSettings;

/// Storage provider configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageProvider {
    /// S3-compatible storage: AWS S3, MinIO, Cloudflare R2
    S3 {
        /// S3 bucket name.
        bucket: String,
        /// AWS region.
        region: String,
        /// Endpoint URL for non-AWS stores.
        endpoint: Option<String>,
        /// Access key ID, `AWS_ACCESS_KEY_ID` when absent.
        access_key_id: Option<String>,
        /// Secret access key, `AWS_SECRET_ACCESS_KEY` when absent.
        secret_access_key: Option<String>,
        /// Address the bucket in the path instead of the host name.
        force_path_style: bool,
    },
    /// Local filesystem
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
}

impl StorageProvider {
    /// Create S3-compatible provider with credentials taken from the environment.
    #[must_use]
    pub fn s3(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self::S3 {
            bucket: bucket.into(),
            region: region.into(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            force_path_style: false,
        }
    }

    /// Create local filesystem provider.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the provider name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::LocalFs { .. } => "local",
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Turns deletes into no-ops on the local backend.
    pub prevent_cleanup: bool,
    /// Signed download URL TTL in seconds (default: 3600 = 1 hour).
    pub presign_download_ttl_secs: u64,
}

impl StorageConfig {
    /// Default download TTL: 1 hour.
    pub const DEFAULT_DOWNLOAD_TTL: u64 = 3600;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            prevent_cleanup: false,
            presign_download_ttl_secs: Self::DEFAULT_DOWNLOAD_TTL,
        }
    }

    /// Disable or enable deletes.
    #[must_use]
    pub fn with_prevent_cleanup(mut self, prevent_cleanup: bool) -> Self {
        self.prevent_cleanup = prevent_cleanup;
        self
    }

    /// Set signed download URL TTL.
    #[must_use]
    pub fn with_download_ttl(mut self, secs: u64) -> Self {
        self.presign_download_ttl_secs = secs;
        self
    }

    /// Signed download URL TTL as a duration.
    #[must_use]
    pub fn presign_download_ttl(&self) -> Duration {
        Duration::from_secs(self.presign_download_ttl_secs)
    }
}

impl From<StorageSettings> for StorageConfig {
    fn from(settings: StorageSettings) -> Self {
        match settings {
            StorageSettings::Local {
                location,
                prevent_cleanup,
            } => Self::new(StorageProvider::local_fs(location)).with_prevent_cleanup(prevent_cleanup),
            StorageSettings::S3 {
                bucket,
                region,
                endpoint,
                access_key_id,
                secret_access_key,
                force_path_style,
            } => Self::new(StorageProvider::S3 {
                bucket,
                region,
                endpoint,
                access_key_id,
                secret_access_key,
                force_path_style,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_provider_s3() {
        let provider = StorageProvider::s3("files", "eu-west-1");
        assert_eq!(provider.name(), "s3");
    }

    #[test]
    fn test_storage_provider_local() {
        let provider = StorageProvider::local_fs("./storage");
        assert_eq!(provider.name(), "local");
    }

    #[test]
    fn test_storage_config_defaults() {
        let config = StorageConfig::new(StorageProvider::local_fs("./storage"));
        assert!(!config.prevent_cleanup);
        assert_eq!(
            config.presign_download_ttl_secs,
            StorageConfig::DEFAULT_DOWNLOAD_TTL
        );
        assert_eq!(config.presign_download_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_from_local_settings() {
        let config = StorageConfig::from(StorageSettings::Local {
            location: PathBuf::from("/data"),
            prevent_cleanup: true,
        });
        assert_eq!(config.provider, StorageProvider::local_fs("/data"));
        assert!(config.prevent_cleanup);
    }

    #[test]
    fn test_from_s3_settings() {
        let config = StorageConfig::from(StorageSettings::S3 {
            bucket: "files".into(),
            region: "eu-west-1".into(),
            endpoint: Some("http://localhost:9000".into()),
            access_key_id: None,
            secret_access_key: None,
            force_path_style: true,
        });
        assert_eq!(config.provider.name(), "s3");
        assert!(!config.prevent_cleanup);
    }
}
