//! Volatile document backend, for tests and dry runs

use super::{DocumentBackend, GateDocument};
use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    document: Mutex<Option<GateDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing document
    pub fn with_document(document: GateDocument) -> Self {
        Self {
            document: Mutex::new(Some(document)),
        }
    }
}

#[async_trait]
impl DocumentBackend for MemoryStore {
    async fn load(&self) -> Result<Option<GateDocument>> {
        Ok(self.document.lock().await.clone())
    }

    async fn save(&self, document: &GateDocument) -> Result<()> {
        *self.document.lock().await = Some(document.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
