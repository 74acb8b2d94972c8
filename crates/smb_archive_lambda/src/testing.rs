//! Recording test doubles for the adapter traits.
//!
//! The share and store doubles append to one shared [`CallLog`], so tests can
//! assert the exact order of remote operations across both systems.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use smb_archive_core::contract::{ArchiveError, Credentials, RemoteEntry};

use crate::adapters::object_store::ArchiveStore;
use crate::adapters::secrets::SecretResolver;
use crate::adapters::share::{ShareConnector, ShareSession};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Connect { host: String, port: u16 },
    List { share: String, path: String },
    Retrieve { share: String, path: String },
    Upload { key: String, body: Vec<u8> },
    Delete { share: String, path: String },
    Close,
}

#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl CallLog {
    pub fn record(&self, call: RecordedCall) {
        self.calls.lock().expect("poisoned mutex").push(call);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("poisoned mutex").clone()
    }

    pub fn count(&self, predicate: impl Fn(&RecordedCall) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }

    pub fn uploaded_keys(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::Upload { key, .. } => Some(key),
                _ => None,
            })
            .collect()
    }

    pub fn touched_remote_paths(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::Retrieve { path, .. } | RecordedCall::Delete { path, .. } => {
                    Some(path)
                }
                _ => None,
            })
            .collect()
    }
}

pub struct StaticSecrets {
    values: Result<(String, String), String>,
    requested: Mutex<Vec<String>>,
}

impl StaticSecrets {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            values: Ok((username.to_string(), password.to_string())),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            values: Err(message.to_string()),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().expect("poisoned mutex").clone()
    }
}

impl SecretResolver for StaticSecrets {
    fn resolve_secret(&self, name: &str) -> Result<String, ArchiveError> {
        self.requested
            .lock()
            .expect("poisoned mutex")
            .push(name.to_string());
        let (username, password) = self
            .values
            .as_ref()
            .map_err(|message| ArchiveError::Credentials(message.clone()))?;
        match name {
            "/smb/username" => Ok(username.clone()),
            "/smb/password" => Ok(password.clone()),
            other => Err(ArchiveError::Credentials(format!(
                "parameter '{other}' not found"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ShareBehavior {
    entries: Vec<RemoteEntry>,
    contents: BTreeMap<String, Vec<u8>>,
    refuse: bool,
    connect_error: Option<String>,
    list_error: Option<String>,
    retrieve_failure: Option<String>,
    delete_failure: Option<String>,
}

/// In-memory share that serves `entries` and records every operation.
pub struct RecordingShare {
    log: CallLog,
    behavior: ShareBehavior,
    credentials_seen: Mutex<Vec<Credentials>>,
}

impl RecordingShare {
    pub fn new(log: CallLog, entries: Vec<RemoteEntry>) -> Self {
        Self {
            log,
            behavior: ShareBehavior {
                entries,
                ..ShareBehavior::default()
            },
            credentials_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with_contents(mut self, name: &str, body: &[u8]) -> Self {
        self.behavior
            .contents
            .insert(name.to_string(), body.to_vec());
        self
    }

    pub fn refuse_connection(mut self) -> Self {
        self.behavior.refuse = true;
        self
    }

    pub fn fail_connect(mut self, message: &str) -> Self {
        self.behavior.connect_error = Some(message.to_string());
        self
    }

    pub fn fail_list(mut self, message: &str) -> Self {
        self.behavior.list_error = Some(message.to_string());
        self
    }

    pub fn fail_retrieve_on(mut self, name: &str) -> Self {
        self.behavior.retrieve_failure = Some(name.to_string());
        self
    }

    pub fn fail_delete_on(mut self, name: &str) -> Self {
        self.behavior.delete_failure = Some(name.to_string());
        self
    }

    pub fn credentials_seen(&self) -> Vec<Credentials> {
        self.credentials_seen.lock().expect("poisoned mutex").clone()
    }
}

impl ShareConnector for RecordingShare {
    type Session = RecordingSession;

    fn connect(
        &self,
        credentials: &Credentials,
        host: &str,
        port: u16,
    ) -> Result<Option<RecordingSession>, ArchiveError> {
        self.credentials_seen
            .lock()
            .expect("poisoned mutex")
            .push(credentials.clone());
        self.log.record(RecordedCall::Connect {
            host: host.to_string(),
            port,
        });
        if let Some(message) = &self.behavior.connect_error {
            return Err(ArchiveError::Share(message.clone()));
        }
        if self.behavior.refuse {
            return Ok(None);
        }
        Ok(Some(RecordingSession {
            log: self.log.clone(),
            behavior: self.behavior.clone(),
        }))
    }
}

pub struct RecordingSession {
    log: CallLog,
    behavior: ShareBehavior,
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

impl ShareSession for RecordingSession {
    fn list_path(&mut self, share_name: &str, path: &str) -> Result<Vec<RemoteEntry>, ArchiveError> {
        self.log.record(RecordedCall::List {
            share: share_name.to_string(),
            path: path.to_string(),
        });
        if let Some(message) = &self.behavior.list_error {
            return Err(ArchiveError::Share(message.clone()));
        }
        Ok(self.behavior.entries.clone())
    }

    fn retrieve_file(
        &mut self,
        share_name: &str,
        path: &str,
        sink: &mut dyn Write,
    ) -> Result<u64, ArchiveError> {
        self.log.record(RecordedCall::Retrieve {
            share: share_name.to_string(),
            path: path.to_string(),
        });
        let name = file_name(path);
        if self.behavior.retrieve_failure.as_deref() == Some(name) {
            return Err(ArchiveError::Share(format!("failed to retrieve '{path}'")));
        }
        let body = self
            .behavior
            .contents
            .get(name)
            .cloned()
            .unwrap_or_else(|| format!("contents of {name}").into_bytes());
        sink.write_all(&body)
            .map_err(|error| ArchiveError::Share(error.to_string()))?;
        Ok(body.len() as u64)
    }

    fn delete_file(&mut self, share_name: &str, path: &str) -> Result<(), ArchiveError> {
        self.log.record(RecordedCall::Delete {
            share: share_name.to_string(),
            path: path.to_string(),
        });
        if self.behavior.delete_failure.as_deref() == Some(file_name(path)) {
            return Err(ArchiveError::Share(format!("failed to delete '{path}'")));
        }
        Ok(())
    }

    fn close(&mut self) {
        self.log.record(RecordedCall::Close);
    }
}

/// Store double that captures uploaded bytes as they were staged.
pub struct RecordingStore {
    log: CallLog,
    failure: Option<String>,
    takes_staged_file: bool,
}

impl RecordingStore {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            failure: None,
            takes_staged_file: false,
        }
    }

    pub fn failing(log: CallLog, message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(log)
        }
    }

    /// Deletes the staged file after a successful upload, so the handler's own
    /// cleanup of it fails.
    pub fn taking_staged_file(log: CallLog) -> Self {
        Self {
            takes_staged_file: true,
            ..Self::new(log)
        }
    }
}

impl ArchiveStore for RecordingStore {
    fn upload_file(&self, key: &str, local_path: &Path) -> Result<(), ArchiveError> {
        let body = std::fs::read(local_path).map_err(|error| {
            ArchiveError::Upload(format!(
                "staged file '{}' unreadable: {error}",
                local_path.display()
            ))
        })?;
        self.log.record(RecordedCall::Upload {
            key: key.to_string(),
            body,
        });
        if let Some(message) = &self.failure {
            return Err(ArchiveError::Upload(message.clone()));
        }
        if self.takes_staged_file {
            std::fs::remove_file(local_path)
                .map_err(|error| ArchiveError::Upload(error.to_string()))?;
        }
        Ok(())
    }
}
