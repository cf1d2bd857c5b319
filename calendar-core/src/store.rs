use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{Event, Result};

/// Where base events live between runs
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn load(&self) -> Result<Vec<Event>>;
    async fn save(&self, events: &[Event]) -> Result<()>;
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    events: RwLock<Vec<Event>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<Event>) -> Self {
        Self {
            events: RwLock::new(events),
        }
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn load(&self) -> Result<Vec<Event>> {
        Ok(self.events.read().await.clone())
    }

    async fn save(&self, events: &[Event]) -> Result<()> {
        *self.events.write().await = events.to_vec();
        Ok(())
    }
}
