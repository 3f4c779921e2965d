//! File registry — on-demand enumeration of the output directory
//!
//! Downloaded files are owned by the extractor (it writes them) and by the
//! user (they delete them out-of-band); the registry never caches and
//! re-scans the directory on every call.

use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::core::models::{AppError, AppResult, DownloadedFile};

pub struct FileRegistry {
    output_dir: PathBuf,
}

impl FileRegistry {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// List the files in the output directory, newest first.
    ///
    /// A directory that does not exist yet means "no downloads yet" and
    /// yields an empty list; any other read failure (permissions, I/O) is a
    /// `DirectoryUnavailable` error.
    pub async fn list_files(&self) -> AppResult<Vec<DownloadedFile>> {
        let mut entries = match tokio::fs::read_dir(&self.output_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::DirectoryUnavailable(e.to_string())),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::DirectoryUnavailable(e.to_string()))?
        {
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                // Entry vanished between readdir and stat; skip it.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(AppError::DirectoryUnavailable(e.to_string())),
            };

            if !metadata.is_file() {
                continue;
            }

            let modified = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            files.push(DownloadedFile {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: metadata.len(),
                modified,
            });
        }

        files.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(files)
    }

    /// Resolve a client-supplied filename to a path inside the output
    /// directory, rejecting anything that could escape it.
    pub fn resolve(&self, name: &str) -> AppResult<PathBuf> {
        let candidate = Path::new(name);

        let mut components = candidate.components();
        let is_plain_file = matches!(components.next(), Some(Component::Normal(_)))
            && components.next().is_none();

        if name.is_empty() || !is_plain_file {
            return Err(AppError::InvalidFilename(name.to_string()));
        }

        Ok(self.output_dir.join(name))
    }
}
