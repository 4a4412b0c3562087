//! JSON file backend
//!
//! The document is rewritten in full on every save: serialized to a sibling
//! `.tmp` file which is then renamed over the target, so a crash mid-write
//! never leaves a truncated document behind.

use super::{DocumentBackend, GateDocument};
use crate::error::Result;
use async_trait::async_trait;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    }

    /// Copy of an unreadable document kept next to the original
    pub fn corrupt_path(&self) -> PathBuf {
        self.sibling(".corrupt")
    }
}

#[async_trait]
impl DocumentBackend for JsonFileStore {
    async fn load(&self) -> Result<Option<GateDocument>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        // Invalid UTF-8 surfaces here as a decode error, not an I/O error
        match serde_json::from_slice::<GateDocument>(&bytes) {
            Ok(document) => Ok(Some(document)),
            Err(e) => {
                let backup = self.corrupt_path();
                match tokio::fs::copy(&self.path, &backup).await {
                    Ok(_) => warn!("Kept unreadable document as {}", backup.display()),
                    Err(copy_err) => warn!(
                        "Could not back up unreadable document to {}: {}",
                        backup.display(),
                        copy_err
                    ),
                }
                Err(e.into())
            }
        }
    }

    async fn save(&self, document: &GateDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec_pretty(document)?;
        let tmp = self.sibling(".tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!("Wrote {} bytes to {}", bytes.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
