//! Ciclo de vida del Flow Mapper: arma scheduler, procesador y listener y
//! los registra en el transporte bajo `(grupo, tópico, instancia)`.
use mapper_core::bus::MapperProcessor;
use mapper_core::{Clock, FlowMapperMessageProcessor, MapperLogger, Subscription, SubscriptionConfig, SubscriptionFactory,
                  SystemClock};
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};
use uuid::Uuid;

use crate::config::FlowMapperConfig;
use crate::error::ServiceError;
use crate::listener::FlowMapperListener;
use crate::scheduler::ScheduledTaskState;

pub const CLEANUP_THREAD_NAME: &str = "flow-mapper-cleanup";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStatus {
    Down,
    Up,
    Error,
}

/// Recursos de una ejecución; se descartan completos en `stop`.
struct RunningMapper {
    config: FlowMapperConfig,
    runtime: Runtime,
    scheduler: Arc<ScheduledTaskState>,
    subscription: Box<dyn Subscription>,
}

pub struct FlowMapperService<F: SubscriptionFactory> {
    factory: Arc<F>,
    clock: Arc<dyn Clock>,
    logger: MapperLogger,
    running: Option<RunningMapper>,
    status: LifecycleStatus,
}

impl<F: SubscriptionFactory> FlowMapperService<F> {
    pub fn new(factory: Arc<F>, logger: MapperLogger) -> Self {
        Self::with_clock(factory, Arc::new(SystemClock), logger)
    }

    pub fn with_clock(factory: Arc<F>, clock: Arc<dyn Clock>, logger: MapperLogger) -> Self {
        Self { factory,
               clock,
               logger,
               running: None,
               status: LifecycleStatus::Down }
    }

    pub fn status(&self) -> LifecycleStatus {
        self.status
    }

    pub fn config(&self) -> Option<&FlowMapperConfig> {
        self.running.as_ref().map(|r| &r.config)
    }

    /// Scheduler de la ejecución en curso (diagnóstico y tests).
    pub fn scheduler(&self) -> Option<Arc<ScheduledTaskState>> {
        self.running.as_ref().map(|r| r.scheduler.clone())
    }

    pub fn start(&mut self, config: FlowMapperConfig) -> Result<(), ServiceError> {
        if self.running.is_some() {
            self.logger.warn(format_args!("flow mapper already started, ignoring start"));
            return Ok(());
        }
        match self.build(config) {
            Ok(running) => {
                self.logger.info(format_args!("flow mapper up group={} topic={} instance={}",
                                              running.config.group_name,
                                              running.config.topics.mapper_topic,
                                              running.config.instance_id));
                self.running = Some(running);
                self.status = LifecycleStatus::Up;
                Ok(())
            }
            Err(e) => {
                self.logger.error(format_args!("flow mapper failed to start: {e}"));
                self.status = LifecycleStatus::Error;
                Err(e)
            }
        }
    }

    fn build(&self, config: FlowMapperConfig) -> Result<RunningMapper, ServiceError> {
        let runtime = Builder::new_multi_thread().worker_threads(config.cleanup_runtime_threads.max(1))
                                                 .thread_name(CLEANUP_THREAD_NAME)
                                                 .enable_all()
                                                 .build()
                                                 .map_err(|e| ServiceError::Runtime(e.to_string()))?;

        let client_id = format!("{}-cleanup-{}", config.group_name, Uuid::new_v4());
        let publisher = self.factory.create_publisher(&client_id)?;
        let scheduler = Arc::new(ScheduledTaskState::new(runtime.handle().clone(),
                                                         publisher,
                                                         config.topics.mapper_topic.clone(),
                                                         self.clock.clone(),
                                                         self.logger.with_target("flow_mapper::scheduler")));
        let processor: Arc<MapperProcessor> =
            Arc::new(FlowMapperMessageProcessor::new(config.topics.clone(),
                                                     self.clock.clone(),
                                                     self.logger.with_target("flow_mapper::processor")));
        let listener = Arc::new(FlowMapperListener::new(scheduler.clone(),
                                                        self.clock.clone(),
                                                        self.logger.with_target("flow_mapper::listener")));

        let subscription_config = SubscriptionConfig { group_name: config.group_name.clone(),
                                                       topic: config.topics.mapper_topic.clone(),
                                                       instance_id: config.instance_id };
        let subscription = self.factory
                               .create_state_and_event_subscription(subscription_config, processor, listener.into_callbacks())
                               .and_then(|mut sub| sub.start().map(|_| sub));
        match subscription {
            Ok(subscription) => Ok(RunningMapper { config,
                                                   runtime,
                                                   scheduler,
                                                   subscription }),
            Err(e) => {
                scheduler.close();
                runtime.shutdown_background();
                Err(e.into())
            }
        }
    }

    /// Cierra la suscripción, cancela todos los timers y libera el publisher.
    pub fn stop(&mut self) -> Result<(), ServiceError> {
        let Some(mut running) = self.running.take() else {
            return Err(ServiceError::AlreadyStopped);
        };
        running.subscription.close();
        running.scheduler.close();
        running.runtime.shutdown_background();
        self.status = LifecycleStatus::Down;
        self.logger.info(format_args!("flow mapper down group={}", running.config.group_name));
        Ok(())
    }

    pub fn reconfigure(&mut self, config: FlowMapperConfig) -> Result<(), ServiceError> {
        if self.running.is_some() {
            self.stop()?;
        }
        self.start(config)
    }
}

impl<F: SubscriptionFactory> Drop for FlowMapperService<F> {
    fn drop(&mut self) {
        if self.running.is_some() {
            let _ = self.stop();
        }
    }
}
