use aws_sdk_ssm::error::DisplayErrorContext;
use smb_archive_core::contract::{ArchiveError, Credentials};

use crate::config::ArchiveConfig;

pub trait SecretResolver {
    /// Reads one secure parameter, decrypted.
    fn resolve_secret(&self, name: &str) -> Result<String, ArchiveError>;
}

/// Resolves the share credentials. Nothing is cached between invocations.
pub fn resolve_credentials(
    resolver: &impl SecretResolver,
    config: &ArchiveConfig,
) -> Result<Credentials, ArchiveError> {
    let username = resolver.resolve_secret(&config.username_parameter)?;
    let password = resolver.resolve_secret(&config.password_parameter)?;
    Ok(Credentials { username, password })
}

pub struct SsmSecretResolver {
    ssm_client: aws_sdk_ssm::Client,
}

impl SsmSecretResolver {
    pub fn new(ssm_client: aws_sdk_ssm::Client) -> Self {
        Self { ssm_client }
    }

    pub fn from_sdk_config(sdk_config: &aws_config::SdkConfig, config: &ArchiveConfig) -> Self {
        let mut builder = aws_sdk_ssm::config::Builder::from(sdk_config);
        if let Some(endpoint) = &config.ssm_endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }
        Self::new(aws_sdk_ssm::Client::from_conf(builder.build()))
    }
}

impl SecretResolver for SsmSecretResolver {
    fn resolve_secret(&self, name: &str) -> Result<String, ArchiveError> {
        let parameter_name = name.to_string();
        let client = self.ssm_client.clone();

        let output = tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .get_parameter()
                    .name(parameter_name)
                    .with_decryption(true)
                    .send()
                    .await
            })
        })
        .map_err(|error| {
            ArchiveError::Credentials(format!(
                "failed to read parameter '{name}': {}",
                DisplayErrorContext(&error)
            ))
        })?;

        output
            .parameter()
            .and_then(|parameter| parameter.value())
            .map(str::to_string)
            .ok_or_else(|| ArchiveError::Credentials(format!("parameter '{name}' has no value")))
    }
}
