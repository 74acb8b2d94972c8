use chrono::Utc;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use smb_archive_core::contract::ArchiveResponse;
use smb_archive_core::storage_keys::run_date;
use smb_archive_lambda::adapters::object_store::S3ArchiveStore;
use smb_archive_lambda::adapters::secrets::SsmSecretResolver;
use smb_archive_lambda::adapters::share::PavaoShareConnector;
use smb_archive_lambda::config::ArchiveConfig;
use smb_archive_lambda::handlers::archive::handle_archive_invocation;

// The event payload carries nothing the archive run needs.
async fn handle_request(_event: LambdaEvent<Value>) -> Result<ArchiveResponse, Error> {
    let config = ArchiveConfig::from_env();
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let secrets = SsmSecretResolver::from_sdk_config(&aws_config, &config);
    let store = S3ArchiveStore::from_sdk_config(&aws_config, &config);
    let connector = PavaoShareConnector::from_config(&config);
    let run_date = run_date(Utc::now());

    let response = tokio::task::block_in_place(|| {
        handle_archive_invocation(&config, &run_date, &secrets, &connector, &store)
    });
    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::tracing::init_default_subscriber();
    lambda_runtime::run(service_fn(handle_request)).await
}
