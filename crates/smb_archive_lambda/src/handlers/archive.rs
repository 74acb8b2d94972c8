use std::collections::HashSet;
use std::time::Instant;

use smb_archive_core::contract::{ArchiveError, ArchiveReport, ArchiveResponse, RemoteEntry};
use smb_archive_core::staging::{validate_staging_name, StagedFile};
use smb_archive_core::storage_keys::{archive_object_key, remote_file_path};
use tracing::{error, info, warn};

use crate::adapters::object_store::ArchiveStore;
use crate::adapters::secrets::{resolve_credentials, SecretResolver};
use crate::adapters::share::{SessionGuard, ShareConnector, ShareSession};
use crate::config::ArchiveConfig;

const COMPONENT: &str = "archive_handler";

/// Runs one archive invocation and renders the outcome; every error becomes a
/// 500 response.
pub fn handle_archive_invocation(
    config: &ArchiveConfig,
    run_date: &str,
    secrets: &impl SecretResolver,
    connector: &impl ShareConnector,
    store: &impl ArchiveStore,
) -> ArchiveResponse {
    let started_at = Instant::now();
    info!(
        component = COMPONENT,
        event = "archive_started",
        bucket = %config.bucket,
        smb_host = %config.smb_host,
        share = %config.share_name,
        run_date,
    );

    let result = run_archive(config, run_date, secrets, connector, store);
    let duration_ms = started_at.elapsed().as_millis() as u64;
    match &result {
        Ok(report) => info!(
            component = COMPONENT,
            event = "archive_completed",
            files_processed = report.processed.len(),
            duration_ms,
        ),
        Err(ArchiveError::ConnectionRefused) => warn!(
            component = COMPONENT,
            event = "connection_refused",
            smb_host = %config.smb_host,
            smb_port = config.smb_port,
            duration_ms,
        ),
        Err(failure) => error!(
            component = COMPONENT,
            event = "archive_failed",
            category = failure.category(),
            error = %failure,
            duration_ms,
        ),
    }

    ArchiveResponse::from_result(&result)
}

/// Credentials, connect, list, then transfer. The first failure ends the run;
/// the share session is closed on every path once it has been opened.
pub fn run_archive(
    config: &ArchiveConfig,
    run_date: &str,
    secrets: &impl SecretResolver,
    connector: &impl ShareConnector,
    store: &impl ArchiveStore,
) -> Result<ArchiveReport, ArchiveError> {
    let credentials = resolve_credentials(secrets, config)?;

    let session = connector
        .connect(&credentials, &config.smb_host, config.smb_port)?
        .ok_or(ArchiveError::ConnectionRefused)?;
    let mut session = SessionGuard::new(session);

    let entries = session.list_path(&config.share_name, &config.root_path)?;
    info!(
        component = COMPONENT,
        event = "share_listed",
        path = %config.root_path,
        entries = entries.len(),
    );

    let files = plan_transfers(&entries)?;
    let mut report = ArchiveReport::default();
    for entry in files {
        transfer_file(&mut *session, entry, config, run_date, store)?;
        report.processed.push(entry.name.clone());
    }
    Ok(report)
}

/// Non-directory entries in listing order. Names that cannot be staged safely,
/// or that occur twice, reject the whole listing before anything is moved.
pub fn plan_transfers(entries: &[RemoteEntry]) -> Result<Vec<&RemoteEntry>, ArchiveError> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for entry in entries.iter().filter(|entry| !entry.is_directory) {
        validate_staging_name(&entry.name)?;
        if !seen.insert(entry.name.as_str()) {
            return Err(ArchiveError::Staging(format!(
                "Listing contains '{}' more than once; refusing to overwrite its staging file",
                entry.name
            )));
        }
        files.push(entry);
    }
    Ok(files)
}

fn transfer_file(
    session: &mut impl ShareSession,
    entry: &RemoteEntry,
    config: &ArchiveConfig,
    run_date: &str,
    store: &impl ArchiveStore,
) -> Result<(), ArchiveError> {
    let remote_path = remote_file_path(&config.root_path, &entry.name);
    let mut staged = StagedFile::create(&config.staging_dir, &entry.name)?;

    let bytes = session.retrieve_file(&config.share_name, &remote_path, staged.writer()?)?;
    staged.seal()?;

    let key = archive_object_key(run_date, &entry.name);
    store.upload_file(&key, staged.path())?;

    session.delete_file(&config.share_name, &remote_path)?;
    staged.remove()?;

    info!(
        component = COMPONENT,
        event = "file_archived",
        file = %entry.name,
        key = %key,
        bytes,
    );
    Ok(())
}
