//! Best-effort local archive of exported documents.
//!
//! Each export is written to `<dir>/<YYYYMMDD_HHMMSS>.csv` using local time.
//! Two exports within the same second never overwrite each other: the
//! later one gets a `_<n>` suffix. Snapshots are never read back.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Upper bound on same-second suffixes tried before giving up.
const MAX_SUFFIX: usize = 10_000;

/// Writes exported documents into a fixed local directory.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist `document`, creating the directory if needed.
    ///
    /// Returns the path written.
    pub async fn persist(&self, document: &[u8]) -> io::Result<PathBuf> {
        let stamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.persist_with_stamp(document, &stamp).await
    }

    async fn persist_with_stamp(&self, document: &[u8], stamp: &str) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir).await?;

        let (path, mut file) = self.create_unique(stamp).await?;
        file.write_all(document).await?;
        file.flush().await?;

        tracing::info!(path = %path.display(), bytes = document.len(), "snapshot saved");
        Ok(path)
    }

    async fn create_unique(&self, stamp: &str) -> io::Result<(PathBuf, File)> {
        for suffix in 0..MAX_SUFFIX {
            let name = match suffix {
                0 => format!("{stamp}.csv"),
                n => format!("{stamp}_{n}.csv"),
            };
            let path = self.dir.join(name);

            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free snapshot name for {stamp} in {}", self.dir.display()),
        ))
    }
}
