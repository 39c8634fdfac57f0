// # Output File
//
// Flat-file mirror of the address table.
//
// ## Format
//
// One address per line, UTF-8, trailing newline when non-empty, nothing
// else. An empty list is an empty file.
//
// ## Atomicity
//
// - The current content is read first; identical content means no write
// - New content goes to a fresh sibling temporary file (`.<name>.<pid>.tmp`,
//   created exclusively) which is flushed, closed and renamed over the target
// - On a failure after creation the temporary file is removed
//
// A concurrent reader therefore sees either the old or the new list, never
// a partial one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;

/// Render an address list in the file format
pub fn render(addresses: &[String]) -> String {
    if addresses.is_empty() {
        return String::new();
    }
    let mut content = addresses.join("\n");
    content.push('\n');
    content
}

/// Output file with atomic replacement
#[derive(Debug, Clone)]
pub struct OutputFile {
    path: PathBuf,
}

impl OutputFile {
    /// Wrap a target path; nothing is touched until read or write
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Target path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current content
    ///
    /// A missing file reads as `None`.
    pub async fn read(&self) -> Result<Option<String>, Error> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Output file does not exist: {}", self.path.display());
                Ok(None)
            }
            Err(e) => Err(Error::output_file(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Replace the file content atomically
    pub async fn write_atomic(&self, content: &str) -> Result<(), Error> {
        let temp_path = self.temp_path();

        // create_new: never reuse or truncate a file we did not create
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .await
            .map_err(|e| {
                Error::output_file(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

        let result = self.write_and_rename(file, &temp_path, content).await;
        if result.is_err() {
            if let Err(e) = fs::remove_file(&temp_path).await
                && e.kind() != ErrorKind::NotFound
            {
                tracing::warn!(
                    "Failed to remove temp file {}: {}",
                    temp_path.display(),
                    e
                );
            }
        }
        result
    }

    async fn write_and_rename(
        &self,
        mut file: fs::File,
        temp_path: &Path,
        content: &str,
    ) -> Result<(), Error> {
        file.write_all(content.as_bytes()).await.map_err(|e| {
            Error::output_file(format!(
                "Failed to write to temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        file.flush().await.map_err(|e| {
            Error::output_file(format!(
                "Failed to flush temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            Error::output_file(format!(
                "Failed to sync temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;
        drop(file);

        fs::rename(temp_path, &self.path).await.map_err(|e| {
            Error::output_file(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Output file written: {}", self.path.display());
        Ok(())
    }

    /// Sibling temporary path used for atomic writes: `.<name>.<pid>.tmp`
    fn temp_path(&self) -> PathBuf {
        let mut name = std::ffi::OsString::from(".");
        if let Some(file_name) = self.path.file_name() {
            name.push(file_name);
        }
        name.push(format!(".{}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }
}
