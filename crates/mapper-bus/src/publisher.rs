use async_trait::async_trait;
use mapper_core::{MapperError, Publisher, Record};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::bus::InMemoryBus;

/// Publisher que escribe directamente en los tópicos del bus.
pub struct InMemoryPublisher {
    bus: InMemoryBus,
    client_id: String,
    closed: AtomicBool,
    published: AtomicUsize,
}

impl InMemoryPublisher {
    pub fn new(bus: InMemoryBus, client_id: impl Into<String>) -> Self {
        Self { bus,
               client_id: client_id.into(),
               closed: AtomicBool::new(false),
               published: AtomicUsize::new(0) }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Total de registros publicados por este cliente.
    pub fn published(&self) -> usize {
        self.published.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Publisher for InMemoryPublisher {
    async fn publish(&self, records: Vec<Record>) -> Result<(), MapperError> {
        if self.is_closed() {
            return Err(MapperError::Publish(format!("publisher {} is closed", self.client_id)));
        }
        self.published.fetch_add(records.len(), Ordering::SeqCst);
        self.bus.append(records);
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapper_core::{FlowMapperEvent, RecordKey, RecordValue};

    fn cleanup_record() -> Record {
        Record::new("flow.mapper.event",
                    RecordKey::Session("k".into()),
                    RecordValue::Mapper(FlowMapperEvent::execute_cleanup()))
    }

    #[tokio::test]
    async fn publish_appends_to_bus() {
        let bus = InMemoryBus::new(1);
        let publisher = InMemoryPublisher::new(bus.clone(), "test");
        publisher.publish(vec![cleanup_record()]).await.expect("publish");
        assert_eq!(bus.records("flow.mapper.event").len(), 1);
        assert_eq!(publisher.published(), 1);
    }

    #[tokio::test]
    async fn publish_after_close_fails() {
        let publisher = InMemoryPublisher::new(InMemoryBus::new(1), "test");
        publisher.close();
        let err = publisher.publish(vec![cleanup_record()]).await.unwrap_err();
        assert!(!err.is_fatal());
    }
}
