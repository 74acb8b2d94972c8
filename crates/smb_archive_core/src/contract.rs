use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const USERNAME_PARAMETER: &str = "/smb/username";
pub const PASSWORD_PARAMETER: &str = "/smb/password";
pub const CONNECT_FAILURE_MESSAGE: &str = "Failed to connect to SMB share";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One entry of a share listing, in the order the server returned it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub is_directory: bool,
}

impl RemoteEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArchiveReport {
    pub processed: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArchiveResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl ArchiveResponse {
    pub fn success(report: &ArchiveReport) -> Self {
        Self {
            status_code: 200,
            body: format!("Processed files: {:?}", report.processed),
        }
    }

    pub fn failure(error: &ArchiveError) -> Self {
        let body = match error {
            ArchiveError::ConnectionRefused => CONNECT_FAILURE_MESSAGE.to_string(),
            other => format!("Error: {}: {}", other.category(), other),
        };
        Self {
            status_code: 500,
            body,
        }
    }

    pub fn from_result(result: &Result<ArchiveReport, ArchiveError>) -> Self {
        match result {
            Ok(report) => Self::success(report),
            Err(error) => Self::failure(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Every way an invocation can fail. The first failure ends the invocation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("{0}")]
    Credentials(String),
    /// The server answered but refused the session.
    #[error("Failed to connect to SMB share")]
    ConnectionRefused,
    #[error("{0}")]
    Share(String),
    #[error("{0}")]
    Staging(String),
    #[error("{0}")]
    Upload(String),
    #[error("{0}")]
    Cleanup(String),
}

impl ArchiveError {
    pub fn category(&self) -> &'static str {
        match self {
            Self::Credentials(_) => "CredentialError",
            Self::ConnectionRefused => "ConnectionRefused",
            Self::Share(_) => "ShareError",
            Self::Staging(_) => "StagingError",
            Self::Upload(_) => "UploadError",
            Self::Cleanup(_) => "CleanupError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_body_lists_processed_names_in_order() {
        let report = ArchiveReport {
            processed: vec!["b.txt".to_string(), "a.txt".to_string()],
        };
        let response = ArchiveResponse::success(&report);

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, r#"Processed files: ["b.txt", "a.txt"]"#);
    }

    #[test]
    fn empty_report_is_still_a_success() {
        let response = ArchiveResponse::success(&ArchiveReport::default());
        assert!(response.is_success());
        assert_eq!(response.body, "Processed files: []");
    }

    #[test]
    fn connection_refusal_uses_fixed_message() {
        let response = ArchiveResponse::failure(&ArchiveError::ConnectionRefused);
        assert_eq!(response.status_code, 500);
        assert_eq!(response.body, "Failed to connect to SMB share");
    }

    #[test]
    fn other_failures_carry_category_and_message() {
        let response = ArchiveResponse::failure(&ArchiveError::Upload("S3 Error".to_string()));
        assert_eq!(response.status_code, 500);
        assert_eq!(response.body, "Error: UploadError: S3 Error");
    }

    #[test]
    fn response_serializes_with_lambda_field_names() {
        let response = ArchiveResponse::failure(&ArchiveError::Credentials("SSM Error".into()));
        let value = serde_json::to_value(&response).expect("response should serialize");

        assert_eq!(value["statusCode"], 500);
        assert_eq!(value["body"], "Error: CredentialError: SSM Error");
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let credentials = Credentials::new("testuser", "hunter2");
        let rendered = format!("{credentials:?}");

        assert!(rendered.contains("testuser"));
        assert!(!rendered.contains("hunter2"));
    }
}
