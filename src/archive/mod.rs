//! Archive builder
//!
//! Fetches every file of a task concurrently and writes the bodies into a
//! single in-memory ZIP container. Fetches run in parallel; only the step that
//! writes an entry (header + body) into the container is serialized, because
//! `ZipWriter` cannot be used from several writers at once.
//!
//! A build either produces the complete archive or fails with
//! [`ArchiveError::Fetch`] carrying every per-file failure. All fetches are
//! awaited before the result is decided, so a failing file never cancels its
//! siblings.

use crate::config::ArchiveConfig;
use crate::error::{ArchiveError, Error, FetchError, FetchErrorKind, Result};
use crate::types::FileRequest;
use futures::future::join_all;
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use zip::ZipWriter;
use zip::write::FileOptions;

type SharedWriter = Arc<Mutex<ZipWriter<Cursor<Vec<u8>>>>>;

/// Builds ZIP archives from lists of remote files
#[derive(Clone)]
pub struct ArchiveBuilder {
    client: reqwest::Client,
    options: FileOptions,
}

impl ArchiveBuilder {
    /// Create a builder whose HTTP client applies the configured per-request timeout
    pub fn new(config: &ArchiveConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(Error::Network)?;

        Ok(Self::with_client(client, config))
    }

    /// Create a builder around an existing HTTP client
    pub fn with_client(client: reqwest::Client, config: &ArchiveConfig) -> Self {
        let options = FileOptions::default().compression_method(config.compression.into());
        Self { client, options }
    }

    /// Fetch every file and bundle them into one archive
    ///
    /// Entries are named `name + extension`. Entry order in the archive follows
    /// completion order, not input order. Duplicate names are written twice.
    /// An empty list yields a valid empty archive.
    pub async fn build(&self, files: &[FileRequest]) -> std::result::Result<Vec<u8>, ArchiveError> {
        debug!(files = files.len(), "building archive");

        let writer: SharedWriter = Arc::new(Mutex::new(ZipWriter::new(Cursor::new(Vec::new()))));

        let handles = files.iter().cloned().map(|file| {
            let client = self.client.clone();
            let writer = writer.clone();
            let options = self.options;
            tokio::spawn(async move { add_entry(client, file, writer, options).await })
        });

        // Wait for every fetch before deciding the outcome
        let results = join_all(handles).await;

        let mut failures = Vec::new();
        for (file, result) in files.iter().zip(results) {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(join_err) => Err(fetch_error(file, FetchErrorKind::Aborted(join_err.to_string()))),
            };
            if let Err(failure) = outcome {
                warn!(
                    entry = %failure.name,
                    link = %failure.link,
                    error = %failure.kind,
                    "failed to add file to archive"
                );
                failures.push(failure);
            }
        }

        if !failures.is_empty() {
            return Err(ArchiveError::Fetch { failures });
        }

        let bytes = finish(writer)?;
        info!(files = files.len(), size_bytes = bytes.len(), "archive built");
        Ok(bytes)
    }
}

/// Fetch one file and write it into the shared container
async fn add_entry(
    client: reqwest::Client,
    file: FileRequest,
    writer: SharedWriter,
    options: FileOptions,
) -> std::result::Result<(), FetchError> {
    let body = fetch(&client, &file).await?;

    let entry_name = file.entry_name();
    let size = body.len();
    let written = tokio::task::spawn_blocking(move || -> std::result::Result<(), String> {
        // Header creation and body write happen under one lock acquisition
        let mut zip = writer
            .lock()
            .map_err(|_| "archive writer lock poisoned".to_string())?;
        zip.start_file(entry_name, options).map_err(|e| e.to_string())?;
        zip.write_all(&body).map_err(|e| e.to_string())?;
        Ok(())
    })
    .await;

    match written {
        Ok(Ok(())) => {
            debug!(entry = %file.entry_name(), size_bytes = size, "archive entry written");
            Ok(())
        }
        Ok(Err(reason)) => Err(fetch_error(&file, FetchErrorKind::Write(reason))),
        Err(join_err) => Err(fetch_error(&file, FetchErrorKind::Aborted(join_err.to_string()))),
    }
}

/// GET the file's link and return the full body
///
/// Any non-success status is a failure.
async fn fetch(client: &reqwest::Client, file: &FileRequest) -> std::result::Result<Vec<u8>, FetchError> {
    debug!(link = %file.link, "fetching file");

    let response = client
        .get(&file.link)
        .send()
        .await
        .map_err(|e| fetch_error(file, classify(&e, FetchErrorKind::Transport)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fetch_error(file, FetchErrorKind::Status(status.as_u16())));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| fetch_error(file, classify(&e, FetchErrorKind::Body)))?;

    Ok(body.to_vec())
}

fn classify(error: &reqwest::Error, otherwise: fn(String) -> FetchErrorKind) -> FetchErrorKind {
    if error.is_timeout() {
        FetchErrorKind::Timeout
    } else {
        otherwise(error.to_string())
    }
}

fn fetch_error(file: &FileRequest, kind: FetchErrorKind) -> FetchError {
    FetchError {
        name: file.entry_name(),
        link: file.link.clone(),
        kind,
    }
}

/// Close the container and return its bytes
fn finish(writer: SharedWriter) -> std::result::Result<Vec<u8>, ArchiveError> {
    let mutex = Arc::try_unwrap(writer)
        .map_err(|_| ArchiveError::Finalize("archive writer is still shared".into()))?;
    let mut zip = mutex
        .into_inner()
        .map_err(|_| ArchiveError::Finalize("archive writer lock poisoned".into()))?;
    let cursor = zip
        .finish()
        .map_err(|e| ArchiveError::Finalize(e.to_string()))?;
    Ok(cursor.into_inner())
}
