//! Invocation configuration, read once from the environment.

use std::path::PathBuf;

use smb_archive_core::contract::{PASSWORD_PARAMETER, USERNAME_PARAMETER};
use smb_archive_core::staging::DEFAULT_STAGING_DIR;

pub const DEFAULT_BUCKET: &str = "test-bucket";
pub const DEFAULT_SMB_HOST: &str = "localhost";
pub const DEFAULT_SMB_PORT: u16 = 445;
pub const DEFAULT_SHARE_NAME: &str = "share";
pub const DEFAULT_ROOT_PATH: &str = "/";
pub const DEFAULT_WORKGROUP: &str = "WORKGROUP";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveConfig {
    /// Parameter store endpoint override (`SSM_ENDPOINT_URL`).
    pub ssm_endpoint_url: Option<String>,
    /// Object store endpoint override (`S3_ENDPOINT_URL`).
    pub s3_endpoint_url: Option<String>,
    pub bucket: String,
    pub smb_host: String,
    pub smb_port: u16,
    pub share_name: String,
    pub root_path: String,
    pub staging_dir: PathBuf,
    pub workgroup: String,
    pub username_parameter: String,
    pub password_parameter: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            ssm_endpoint_url: None,
            s3_endpoint_url: None,
            bucket: DEFAULT_BUCKET.to_string(),
            smb_host: DEFAULT_SMB_HOST.to_string(),
            smb_port: DEFAULT_SMB_PORT,
            share_name: DEFAULT_SHARE_NAME.to_string(),
            root_path: DEFAULT_ROOT_PATH.to_string(),
            staging_dir: PathBuf::from(DEFAULT_STAGING_DIR),
            workgroup: DEFAULT_WORKGROUP.to_string(),
            username_parameter: USERNAME_PARAMETER.to_string(),
            password_parameter: PASSWORD_PARAMETER.to_string(),
        }
    }
}

impl ArchiveConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        Self {
            ssm_endpoint_url: read("SSM_ENDPOINT_URL"),
            s3_endpoint_url: read("S3_ENDPOINT_URL"),
            bucket: read("S3_BUCKET_NAME").unwrap_or(defaults.bucket),
            smb_host: read("SMB_HOST").unwrap_or(defaults.smb_host),
            workgroup: read("SMB_WORKGROUP").unwrap_or(defaults.workgroup),
            ..defaults
        }
    }

    pub fn with_staging_dir(mut self, staging_dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = staging_dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_environment() {
        let config = ArchiveConfig::from_lookup(|_| None);

        assert_eq!(config.bucket, "test-bucket");
        assert_eq!(config.smb_host, "localhost");
        assert_eq!(config.smb_port, 445);
        assert_eq!(config.share_name, "share");
        assert_eq!(config.root_path, "/");
        assert_eq!(config.staging_dir, PathBuf::from("/tmp"));
        assert_eq!(config.username_parameter, "/smb/username");
        assert_eq!(config.password_parameter, "/smb/password");
        assert!(config.ssm_endpoint_url.is_none());
        assert!(config.s3_endpoint_url.is_none());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = ArchiveConfig::from_lookup(lookup_from(&[
            ("SSM_ENDPOINT_URL", "http://localhost:4566"),
            ("S3_ENDPOINT_URL", "http://localhost:4566"),
            ("S3_BUCKET_NAME", "archive-bucket"),
            ("SMB_HOST", "samba"),
            ("SMB_WORKGROUP", "CORP"),
        ]));

        assert_eq!(
            config.ssm_endpoint_url.as_deref(),
            Some("http://localhost:4566")
        );
        assert_eq!(
            config.s3_endpoint_url.as_deref(),
            Some("http://localhost:4566")
        );
        assert_eq!(config.bucket, "archive-bucket");
        assert_eq!(config.smb_host, "samba");
        assert_eq!(config.workgroup, "CORP");
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = ArchiveConfig::from_lookup(lookup_from(&[
            ("S3_BUCKET_NAME", "   "),
            ("SMB_HOST", ""),
            ("S3_ENDPOINT_URL", ""),
        ]));

        assert_eq!(config.bucket, "test-bucket");
        assert_eq!(config.smb_host, "localhost");
        assert!(config.s3_endpoint_url.is_none());
    }

    #[test]
    fn secret_parameter_names_are_not_configurable() {
        let config = ArchiveConfig::from_lookup(lookup_from(&[
            ("SMB_USERNAME_PARAMETER", "/other/user"),
        ]));
        assert_eq!(config.username_parameter, "/smb/username");
    }
}
