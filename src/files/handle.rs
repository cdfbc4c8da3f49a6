use snafu::{ResultExt, Snafu};
use std::{future::Future, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::{
    client::{Error as ClientError, GeminiClient},
    files::model::{File, FileState},
};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("failed to fetch status of file '{name}'"))]
    Refresh {
        name: String,
        source: Box<ClientError>,
    },

    #[snafu(display("processing of file '{name}' failed: {message}"))]
    ProcessingFailed { name: String, message: String },

    #[snafu(display("file '{name}' has no {field}, it cannot be referenced"))]
    IncompleteMetadata { name: String, field: &'static str },

    #[snafu(display("operation cancelled"))]
    Cancelled,
}

/// A handle to a file uploaded through the Files API.
#[derive(Debug, Clone)]
pub struct FileHandle {
    client: Arc<GeminiClient>,
    file: File,
}

impl FileHandle {
    pub(crate) fn new(client: Arc<GeminiClient>, file: File) -> Self {
        Self { client, file }
    }

    /// Resource name, e.g. `files/abc-123`.
    pub fn name(&self) -> &str {
        &self.file.name
    }

    pub fn state(&self) -> FileState {
        self.file.state
    }

    /// Poll the file until the service reports it as active.
    ///
    /// The status is re-fetched once per `interval` with no upper bound on the
    /// number of attempts; only `cancel` or a `FAILED` state ends the wait early.
    #[instrument(skip_all, fields(
        file.name = %self.file.name,
        poll.interval.secs = interval.as_secs(),
    ))]
    pub async fn wait_until_active(
        &mut self,
        interval: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        let client = self.client.clone();
        let fetch = |name: String| {
            let client = client.clone();
            async move { client.get_file(&name).await }
        };
        self.file = poll_until_active(self.file.clone(), interval, cancel, fetch).await?;
        Ok(())
    }

    /// The URI and MIME type needed to reference this file in a request.
    pub(crate) fn reference(&self) -> Result<(&str, &str), Error> {
        let uri = self.file.uri.as_ref().ok_or_else(|| Error::IncompleteMetadata {
            name: self.file.name.clone(),
            field: "URI",
        })?;
        let mime_type = self
            .file
            .mime_type
            .as_ref()
            .ok_or_else(|| Error::IncompleteMetadata {
                name: self.file.name.clone(),
                field: "MIME type",
            })?;
        Ok((uri.as_str(), mime_type.essence_str()))
    }
}

/// Readiness loop shared by [`FileHandle::wait_until_active`] and its tests.
pub(crate) async fn poll_until_active<F, Fut>(
    mut file: File,
    interval: Duration,
    cancel: &CancellationToken,
    mut fetch: F,
) -> Result<File, Error>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<File, ClientError>>,
{
    loop {
        match file.state {
            FileState::Active => return Ok(file),
            FileState::Failed => {
                return ProcessingFailedSnafu {
                    message: file
                        .error
                        .map(|e| e.message)
                        .unwrap_or_else(|| "no error details".to_string()),
                    name: file.name,
                }
                .fail();
            }
            state => info!(state = state.as_ref(), "processing video..."),
        }

        tokio::select! {
            _ = cancel.cancelled() => return CancelledSnafu.fail(),
            _ = tokio::time::sleep(interval) => {}
        }

        let name = file.name.clone();
        file = tokio::select! {
            _ = cancel.cancelled() => return CancelledSnafu.fail(),
            fetched = fetch(name.clone()) => fetched.map_err(Box::new).context(RefreshSnafu { name })?,
        };
    }
}
