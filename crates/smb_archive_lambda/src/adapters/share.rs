//! SMB share access.
//!
//! A [`ShareConnector`] opens at most one [`ShareSession`] per invocation. The
//! handler wraps an opened session in a [`SessionGuard`], which closes it on
//! every exit path.

use std::io::Write;
use std::ops::{Deref, DerefMut};

use smb_archive_core::contract::{ArchiveError, Credentials, RemoteEntry};

pub trait ShareSession {
    /// Lists `path` on `share_name` without descending into subdirectories.
    fn list_path(&mut self, share_name: &str, path: &str) -> Result<Vec<RemoteEntry>, ArchiveError>;

    /// Copies the whole remote file into `sink`, returning the byte count.
    fn retrieve_file(
        &mut self,
        share_name: &str,
        path: &str,
        sink: &mut dyn Write,
    ) -> Result<u64, ArchiveError>;

    fn delete_file(&mut self, share_name: &str, path: &str) -> Result<(), ArchiveError>;

    fn close(&mut self);
}

pub trait ShareConnector {
    type Session: ShareSession;

    /// `Ok(None)` means the server refused the session; `Err` is a transport failure.
    fn connect(
        &self,
        credentials: &Credentials,
        host: &str,
        port: u16,
    ) -> Result<Option<Self::Session>, ArchiveError>;
}

pub struct SessionGuard<S: ShareSession> {
    session: S,
}

impl<S: ShareSession> SessionGuard<S> {
    pub fn new(session: S) -> Self {
        Self { session }
    }
}

impl<S: ShareSession> Deref for SessionGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.session
    }
}

impl<S: ShareSession> DerefMut for SessionGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.session
    }
}

impl<S: ShareSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        self.session.close();
    }
}

#[cfg(feature = "smb")]
pub use self::pavao_share::{PavaoShareConnector, PavaoShareSession};

#[cfg(feature = "smb")]
mod pavao_share {
    use std::io::{self, Write};

    use pavao::{
        SmbClient, SmbCredentials, SmbDirentType, SmbError, SmbOpenOptions, SmbOptions,
    };
    use smb_archive_core::contract::{ArchiveError, Credentials, RemoteEntry};

    use super::{ShareConnector, ShareSession};
    use crate::config::ArchiveConfig;

    /// Connects through libsmbclient, bound to one share.
    #[derive(Debug, Clone)]
    pub struct PavaoShareConnector {
        share_name: String,
        probe_path: String,
        workgroup: String,
    }

    impl PavaoShareConnector {
        pub fn from_config(config: &ArchiveConfig) -> Self {
            Self {
                share_name: config.share_name.clone(),
                probe_path: config.root_path.clone(),
                workgroup: config.workgroup.clone(),
            }
        }
    }

    impl ShareConnector for PavaoShareConnector {
        type Session = PavaoShareSession;

        fn connect(
            &self,
            credentials: &Credentials,
            host: &str,
            port: u16,
        ) -> Result<Option<PavaoShareSession>, ArchiveError> {
            let smb_credentials = SmbCredentials::default()
                .server(format!("smb://{host}:{port}"))
                .share(format!("/{}", self.share_name.trim_start_matches('/')))
                .username(credentials.username.as_str())
                .password(credentials.password.as_str())
                .workgroup(self.workgroup.as_str());
            let client = SmbClient::new(
                smb_credentials,
                SmbOptions::default().one_share_per_server(true),
            )
            .map_err(|error| ArchiveError::Share(format!("failed to create SMB client: {error}")))?;

            // libsmbclient connects lazily; stat forces authentication and keeps errno.
            match client.stat(self.probe_path.as_str()) {
                Ok(_) => Ok(Some(PavaoShareSession {
                    share_name: self.share_name.clone(),
                    client: Some(client),
                })),
                Err(error) => classify_connect_error(error, &format!("smb://{host}:{port}")),
            }
        }
    }

    /// Permission denied while authenticating is the server refusing the
    /// session; anything else is a transport failure.
    fn classify_connect_error<S>(
        error: SmbError,
        server: &str,
    ) -> Result<Option<S>, ArchiveError> {
        match error {
            SmbError::Io(io_error) if io_error.kind() == io::ErrorKind::PermissionDenied => {
                Ok(None)
            }
            other => Err(ArchiveError::Share(format!(
                "failed to connect to {server}: {other}"
            ))),
        }
    }

    /// Plain files and links are archived. Directories and the share-level
    /// entry kinds (workgroups, servers, shares) are skipped like directories.
    fn is_transferable(kind: SmbDirentType) -> bool {
        matches!(kind, SmbDirentType::File | SmbDirentType::Link)
    }

    pub struct PavaoShareSession {
        share_name: String,
        client: Option<SmbClient>,
    }

    impl PavaoShareSession {
        fn client(&self, share_name: &str) -> Result<&SmbClient, ArchiveError> {
            if share_name.trim_start_matches('/') != self.share_name.trim_start_matches('/') {
                return Err(ArchiveError::Share(format!(
                    "session is bound to share '{}', not '{share_name}'",
                    self.share_name
                )));
            }
            self.client
                .as_ref()
                .ok_or_else(|| ArchiveError::Share("SMB session is closed".to_string()))
        }
    }

    impl ShareSession for PavaoShareSession {
        fn list_path(
            &mut self,
            share_name: &str,
            path: &str,
        ) -> Result<Vec<RemoteEntry>, ArchiveError> {
            let entries = self
                .client(share_name)?
                .list_dir(path)
                .map_err(|error| ArchiveError::Share(format!("failed to list '{path}': {error}")))?;

            Ok(entries
                .iter()
                .map(|entry| RemoteEntry {
                    name: entry.name().to_string(),
                    is_directory: !is_transferable(entry.get_type()),
                })
                .collect())
        }

        fn retrieve_file(
            &mut self,
            share_name: &str,
            path: &str,
            sink: &mut dyn Write,
        ) -> Result<u64, ArchiveError> {
            let mut reader = self
                .client(share_name)?
                .open_with(path, SmbOpenOptions::default().read(true))
                .map_err(|error| ArchiveError::Share(format!("failed to open '{path}': {error}")))?;
            io::copy(&mut reader, sink)
                .map_err(|error| ArchiveError::Share(format!("failed to retrieve '{path}': {error}")))
        }

        fn delete_file(&mut self, share_name: &str, path: &str) -> Result<(), ArchiveError> {
            self.client(share_name)?
                .unlink(path)
                .map_err(|error| ArchiveError::Share(format!("failed to delete '{path}': {error}")))
        }

        fn close(&mut self) {
            self.client.take();
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        const SERVER: &str = "smb://localhost:445";

        #[test]
        fn permission_denied_is_a_refusal() {
            let error = SmbError::Io(io::Error::from(io::ErrorKind::PermissionDenied));

            let outcome: Result<Option<()>, ArchiveError> = classify_connect_error(error, SERVER);

            assert_eq!(outcome, Ok(None));
        }

        #[test]
        fn transport_errors_are_share_errors() {
            for error in [
                SmbError::Io(io::Error::from(io::ErrorKind::ConnectionRefused)),
                SmbError::Io(io::Error::from(io::ErrorKind::TimedOut)),
                SmbError::BadFileDescriptor,
            ] {
                let outcome: Result<Option<()>, ArchiveError> =
                    classify_connect_error(error, SERVER);

                let failure = outcome.expect_err("transport error should not be a refusal");
                assert_eq!(failure.category(), "ShareError");
                assert!(failure.to_string().contains(SERVER));
            }
        }

        #[test]
        fn only_files_and_links_are_transferable() {
            assert!(is_transferable(SmbDirentType::File));
            assert!(is_transferable(SmbDirentType::Link));
            for kind in [
                SmbDirentType::Dir,
                SmbDirentType::FileShare,
                SmbDirentType::IpcShare,
                SmbDirentType::PrinterShare,
                SmbDirentType::Workgroup,
                SmbDirentType::Server,
            ] {
                assert!(!is_transferable(kind));
            }
        }
    }
}
