use mapper_core::bus::MapperProcessor;
use mapper_core::{FlowMapperState, MapperError, MapperLogger, PartitionCallbacks, Publisher, Subscription, SubscriptionConfig,
                  SubscriptionFactory};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::bus::InMemoryBus;
use crate::publisher::InMemoryPublisher;
use crate::subscription::{InMemoryStateAndEventSubscription, SubscriptionHandle};

/// Factory de publishers y suscripciones sobre un `InMemoryBus`.
///
/// Guarda el último handle creado por grupo para que los tests puedan
/// conducir la suscripción que el servicio registró.
pub struct InMemorySubscriptionFactory {
    bus: InMemoryBus,
    auto_assign: bool,
    subscriptions: Mutex<HashMap<String, SubscriptionHandle>>,
    publishers: Mutex<Vec<Arc<InMemoryPublisher>>>,
    logger: MapperLogger,
}

impl InMemorySubscriptionFactory {
    pub fn new(bus: InMemoryBus) -> Self {
        Self::with_logger(bus, MapperLogger::global("mapper.bus"))
    }

    pub fn with_logger(bus: InMemoryBus, logger: MapperLogger) -> Self {
        Self { bus,
               auto_assign: true,
               subscriptions: Mutex::new(HashMap::new()),
               publishers: Mutex::new(Vec::new()),
               logger }
    }

    /// Con `false`, `start` no asigna particiones; se asignan a mano con
    /// `SubscriptionHandle::assign`.
    pub fn auto_assign(mut self, enabled: bool) -> Self {
        self.auto_assign = enabled;
        self
    }

    pub fn bus(&self) -> &InMemoryBus {
        &self.bus
    }

    pub fn subscription(&self, group_name: &str) -> Option<SubscriptionHandle> {
        self.subscriptions.lock().unwrap_or_else(|p| p.into_inner()).get(group_name).cloned()
    }

    pub fn publishers(&self) -> Vec<Arc<InMemoryPublisher>> {
        self.publishers.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl SubscriptionFactory for InMemorySubscriptionFactory {
    fn create_publisher(&self, client_id: &str) -> Result<Arc<dyn Publisher>, MapperError> {
        let publisher = Arc::new(InMemoryPublisher::new(self.bus.clone(), client_id));
        self.publishers.lock().unwrap_or_else(|p| p.into_inner()).push(publisher.clone());
        Ok(publisher as Arc<dyn Publisher>)
    }

    fn create_state_and_event_subscription(&self, config: SubscriptionConfig, processor: Arc<MapperProcessor>,
                                           callbacks: PartitionCallbacks<FlowMapperState>)
                                           -> Result<Box<dyn Subscription>, MapperError> {
        if config.topic.is_empty() {
            return Err(MapperError::Subscription("empty topic".into()));
        }
        self.logger.debug(format_args!("subscription group={} topic={} instance={}",
                                       config.group_name, config.topic, config.instance_id));
        let handle = SubscriptionHandle::new(self.bus.clone(),
                                             config.clone(),
                                             processor,
                                             callbacks,
                                             self.auto_assign,
                                             self.logger.clone());
        self.subscriptions
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(config.group_name, handle.clone());
        Ok(Box::new(InMemoryStateAndEventSubscription::new(handle)))
    }
}
