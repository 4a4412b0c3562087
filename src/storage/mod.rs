//! Persistent counter store
//!
//! Rate-limit state, analytics counters, the submission log and redemptions
//! all live in one [`GateDocument`]. The document is held in memory behind a
//! single async lock and written in full through a [`DocumentBackend`] after
//! every mutation.

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use crate::analytics::AnalyticsSnapshot;
use crate::error::{GateError, Result};
use crate::rate_limiter::RateTable;
use crate::types::{Redemption, SubmissionRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Everything the gate persists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateDocument {
    /// Accepted submissions, oldest first
    pub requests: Vec<SubmissionRecord>,

    pub analytics: AnalyticsSnapshot,

    pub rate_limits: RateTable,

    pub redemptions: Vec<Redemption>,
}

impl GateDocument {
    /// Append an accepted submission and fold it into the analytics
    pub fn record_submission(&mut self, record: SubmissionRecord) {
        self.analytics.record(&record);
        self.requests.push(record);
    }

    pub fn find_submission(&self, code: &str) -> Option<&SubmissionRecord> {
        self.requests.iter().find(|r| r.code == code)
    }

    pub fn is_redeemed(&self, code: &str) -> bool {
        self.redemptions.iter().any(|r| r.code == code)
    }

    pub fn issued_codes(&self) -> impl Iterator<Item = &str> {
        self.requests.iter().map(|r| r.code.as_str())
    }
}

/// Durable home of the gate document
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Read the stored document; `Ok(None)` when nothing has been stored yet
    ///
    /// Unreadable content is reported as [`GateError::Serialization`].
    async fn load(&self) -> Result<Option<GateDocument>>;

    /// Replace the stored document
    async fn save(&self, document: &GateDocument) -> Result<()>;

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}

/// In-memory document plus the backend it is persisted to
pub struct CounterStore {
    backend: Arc<dyn DocumentBackend>,
    document: Mutex<GateDocument>,
}

impl CounterStore {
    /// Load the document from `backend`
    ///
    /// A missing or corrupt document starts the store empty. Any other
    /// backend error is returned, so existing data is never overwritten.
    pub async fn open(backend: Arc<dyn DocumentBackend>) -> Result<Self> {
        let document = match backend.load().await {
            Ok(Some(document)) => {
                info!(
                    "Loaded {} submissions from {}",
                    document.requests.len(),
                    backend.describe()
                );
                document
            }
            Ok(None) => {
                info!("No document at {}, starting empty", backend.describe());
                GateDocument::default()
            }
            Err(GateError::Serialization(e)) => {
                warn!(
                    "Document at {} is corrupt ({}), starting empty",
                    backend.describe(),
                    e
                );
                GateDocument::default()
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            backend,
            document: Mutex::new(document),
        })
    }

    /// Apply `f` to a copy of the document, persist it, then commit
    ///
    /// If `f` fails nothing is saved. If the save fails the in-memory
    /// document is left as it was and [`GateError::Persistence`] is returned.
    pub async fn transact<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut GateDocument) -> Result<T>,
    {
        let mut document = self.document.lock().await;
        let mut draft = document.clone();
        let output = f(&mut draft)?;

        self.backend.save(&draft).await.map_err(|e| {
            GateError::Persistence(format!("{}: {}", self.backend.describe(), e))
        })?;

        *document = draft;
        debug!("Document committed");
        Ok(output)
    }

    /// Run a read-only closure against the current document
    pub async fn read<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&GateDocument) -> T,
    {
        let document = self.document.lock().await;
        f(&document)
    }

    /// Copy of the current document
    pub async fn snapshot(&self) -> GateDocument {
        self.document.lock().await.clone()
    }

    pub fn describe(&self) -> String {
        self.backend.describe()
    }
}
