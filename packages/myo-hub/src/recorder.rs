//! Newline-delimited JSON recordings of the update stream.

use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::{HubError, HubResult};
use crate::update::Update;

const RECORD_QUEUE: usize = 256;

/// Sending side of a running recorder
#[derive(Clone)]
pub struct RecorderHandle {
    tx: mpsc::Sender<Update>,
}

impl RecorderHandle {
    pub async fn record(&self, update: Update) -> HubResult<()> {
        self.tx
            .send(update)
            .await
            .map_err(|_| HubError::RecorderClosed)
    }
}

/// Append-only writer of one JSON record per line
pub struct Recorder {
    path: PathBuf,
    out: BufWriter<File>,
    written: u64,
}

impl Recorder {
    /// Create (or truncate) the recording file.
    pub async fn create(path: impl AsRef<Path>) -> HubResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .await
            .map_err(|source| HubError::Recording {
                path: path.clone(),
                source,
            })?;
        info!("Recording updates to {}", path.display());
        Ok(Self {
            path,
            out: BufWriter::new(file),
            written: 0,
        })
    }

    /// Run the recorder on its own task.
    ///
    /// The task ends with `Ok` when every handle is dropped, or with the
    /// first write error.
    pub fn spawn(self) -> (RecorderHandle, JoinHandle<HubResult<()>>) {
        let (tx, rx) = mpsc::channel(RECORD_QUEUE);
        let task = tokio::spawn(self.run(rx));
        (RecorderHandle { tx }, task)
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Update>) -> HubResult<()> {
        while let Some(update) = rx.recv().await {
            self.write(&update).await?;
        }
        info!(
            "Recorder closed {} after {} records",
            self.path.display(),
            self.written
        );
        Ok(())
    }

    /// Append one record and flush it to the file.
    pub async fn write(&mut self, update: &Update) -> HubResult<()> {
        let mut line = serde_json::to_vec(update)?;
        line.push(b'\n');
        self.out
            .write_all(&line)
            .await
            .map_err(|source| HubError::Recording {
                path: self.path.clone(),
                source,
            })?;
        self.out.flush().await.map_err(|source| HubError::Recording {
            path: self.path.clone(),
            source,
        })?;
        self.written += 1;
        Ok(())
    }
}

/// Read a whole recording into memory.
///
/// Blank lines are skipped; every other line must be a timestamped update.
pub async fn load_recording(path: impl AsRef<Path>) -> HubResult<Vec<Update>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .await
        .map_err(|source| HubError::ReadRecording {
            path: path.to_path_buf(),
            source,
        })?;

    let mut updates = Vec::new();
    for (i, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let update: Update =
            serde_json::from_str(line).map_err(|source| HubError::MalformedRecord {
                path: path.to_path_buf(),
                line: i + 1,
                source,
            })?;
        if update.time.is_none() {
            return Err(HubError::MissingTimestamp { line: i + 1 });
        }
        updates.push(update);
    }

    if updates.is_empty() {
        return Err(HubError::EmptyRecording {
            path: path.to_path_buf(),
        });
    }
    Ok(updates)
}
