use std::path::Path;

use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use smb_archive_core::contract::ArchiveError;

use crate::config::ArchiveConfig;

pub trait ArchiveStore {
    /// Uploads a local file as a single object at `key`.
    fn upload_file(&self, key: &str, local_path: &Path) -> Result<(), ArchiveError>;
}

pub struct S3ArchiveStore {
    bucket: String,
    s3_client: aws_sdk_s3::Client,
}

impl S3ArchiveStore {
    pub fn new(bucket: impl Into<String>, s3_client: aws_sdk_s3::Client) -> Self {
        Self {
            bucket: bucket.into(),
            s3_client,
        }
    }

    /// Path-style addressing is enabled whenever the endpoint is overridden.
    pub fn from_sdk_config(sdk_config: &aws_config::SdkConfig, config: &ArchiveConfig) -> Self {
        let mut builder = aws_sdk_s3::config::Builder::from(sdk_config);
        if let Some(endpoint) = &config.s3_endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        Self::new(
            config.bucket.clone(),
            aws_sdk_s3::Client::from_conf(builder.build()),
        )
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

impl ArchiveStore for S3ArchiveStore {
    fn upload_file(&self, key: &str, local_path: &Path) -> Result<(), ArchiveError> {
        let bucket = self.bucket.clone();
        let object_key = key.to_string();
        let path = local_path.to_path_buf();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let body = ByteStream::from_path(&path).await.map_err(|error| {
                    ArchiveError::Upload(format!(
                        "failed to read staged file '{}': {error}",
                        path.display()
                    ))
                })?;
                client
                    .put_object()
                    .bucket(&bucket)
                    .key(&object_key)
                    .body(body)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| {
                        ArchiveError::Upload(format!(
                            "failed to upload s3://{bucket}/{object_key}: {}",
                            DisplayErrorContext(&error)
                        ))
                    })
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::operation::put_object::{PutObjectError, PutObjectOutput};
    use aws_smithy_mocks::{mock, mock_client};

    use super::*;

    fn staged_file(dir: &tempfile::TempDir, name: &str, body: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).expect("staged file should be written");
        path
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn uploads_staged_file_to_bucket_key() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = staged_file(&dir, "test.txt", b"hello");
        let put_rule = mock!(aws_sdk_s3::Client::put_object)
            .match_requests(|request| {
                request.bucket() == Some("test-bucket")
                    && request.key() == Some("archives/20260214/test.txt")
            })
            .then_output(|| PutObjectOutput::builder().build());
        let client = mock_client!(aws_sdk_s3, [&put_rule]);
        let store = S3ArchiveStore::new("test-bucket", client);

        store
            .upload_file("archives/20260214/test.txt", &path)
            .expect("upload should succeed");

        assert_eq!(put_rule.num_calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn service_error_is_an_upload_error() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = staged_file(&dir, "test.txt", b"hello");
        let put_rule = mock!(aws_sdk_s3::Client::put_object).then_error(|| {
            PutObjectError::generic(
                ErrorMetadata::builder()
                    .code("AccessDenied")
                    .message("S3 Error")
                    .build(),
            )
        });
        let client = mock_client!(aws_sdk_s3, [&put_rule]);
        let store = S3ArchiveStore::new("test-bucket", client);

        let error = store
            .upload_file("archives/20260214/test.txt", &path)
            .expect_err("upload should fail");

        assert_eq!(error.category(), "UploadError");
        assert!(error
            .to_string()
            .contains("s3://test-bucket/archives/20260214/test.txt"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_staged_file_fails_before_any_request() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let put_rule = mock!(aws_sdk_s3::Client::put_object)
            .then_output(|| PutObjectOutput::builder().build());
        let client = mock_client!(aws_sdk_s3, [&put_rule]);
        let store = S3ArchiveStore::new("test-bucket", client);

        let error = store
            .upload_file("archives/20260214/gone.txt", &dir.path().join("gone.txt"))
            .expect_err("upload should fail");

        assert_eq!(error.category(), "UploadError");
        assert_eq!(put_rule.num_calls(), 0);
    }

    #[test]
    fn endpoint_override_keeps_configured_bucket() {
        let sdk_config = aws_config::SdkConfig::builder()
            .behavior_version(aws_config::BehaviorVersion::latest())
            .build();
        let config = ArchiveConfig {
            s3_endpoint_url: Some("http://localhost:4566".to_string()),
            bucket: "archive-bucket".to_string(),
            ..ArchiveConfig::default()
        };

        let store = S3ArchiveStore::from_sdk_config(&sdk_config, &config);

        assert_eq!(store.bucket(), "archive-bucket");
    }
}
