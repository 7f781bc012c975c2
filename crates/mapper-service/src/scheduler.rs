//! Estado de las tareas de limpieza programadas (timers por clave de sesión).
//!
//! - Un timer por clave como máximo: reprogramar reemplaza atómicamente y
//!   aborta el anterior.
//! - Al disparar, publica `ExecuteCleanup` para la clave en el tópico del
//!   propio mapper; la limpieza pasa así por el mismo camino exactly-once.
//! - Un fallo de publicación se loguea y no se reintenta aquí (el reintento
//!   es responsabilidad del publisher).
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use mapper_core::{Clock, FlowMapperEvent, MapperLogger, Publisher, Record, RecordKey, RecordValue};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Timer pendiente. `generation` distingue un timer de su reemplazo.
struct ScheduledCleanup {
    generation: u64,
    expiry: DateTime<Utc>,
    handle: JoinHandle<()>,
}

pub struct ScheduledTaskState {
    runtime: Handle,
    publisher: Arc<dyn Publisher>,
    mapper_topic: String,
    tasks: Arc<DashMap<String, ScheduledCleanup>>,
    generation: AtomicU64,
    clock: Arc<dyn Clock>,
    logger: MapperLogger,
}

impl ScheduledTaskState {
    pub fn new(runtime: Handle, publisher: Arc<dyn Publisher>, mapper_topic: impl Into<String>, clock: Arc<dyn Clock>,
               logger: MapperLogger)
               -> Self {
        Self { runtime,
               publisher,
               mapper_topic: mapper_topic.into(),
               tasks: Arc::new(DashMap::new()),
               generation: AtomicU64::new(0),
               clock,
               logger }
    }

    fn cleanup_record(topic: &str, key: &str) -> Record {
        Record::new(topic, RecordKey::Session(key.to_string()), RecordValue::Mapper(FlowMapperEvent::execute_cleanup()))
    }

    /// Programa (o reemplaza) el timer de `key` para que dispare en `expiry`.
    pub fn schedule(&self, key: &str, expiry: DateTime<Utc>) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = (expiry - self.clock.now()).to_std().unwrap_or_default();

        let tasks = self.tasks.clone();
        let publisher = self.publisher.clone();
        let logger = self.logger.clone();
        let record = Self::cleanup_record(&self.mapper_topic, key);
        let task_key = key.to_string();
        let handle = self.runtime.spawn(async move {
                                      tokio::time::sleep(delay).await;
                                      logger.debug(format_args!("cleanup timer fired key={task_key}"));
                                      if let Err(e) = publisher.publish(vec![record]).await {
                                          logger.warn(format_args!("cleanup publish failed key={task_key}: {e}"));
                                      }
                                      tasks.remove_if(&task_key, |_, t| t.generation == generation);
                                  });

        let entry = ScheduledCleanup { generation, expiry, handle };
        if let Some(previous) = self.tasks.insert(key.to_string(), entry) {
            previous.handle.abort();
            self.logger.debug(format_args!("replaced cleanup timer key={key} old_expiry={} new_expiry={expiry}",
                                           previous.expiry));
        } else {
            self.logger.debug(format_args!("scheduled cleanup key={key} expiry={expiry} delay={delay:?}"));
        }
        // Si el timer ya terminó antes del insert, su `remove_if` no encontró la entrada.
        self.tasks.remove_if(key, |_, t| t.generation == generation && t.handle.is_finished());
    }

    /// Publica `ExecuteCleanup` para `key` sin esperar (expiración ya vencida).
    /// Pasa por el mapa de timers con demora cero, así `cancel` también lo alcanza.
    pub fn publish_now(&self, key: &str) {
        self.logger.debug(format_args!("expired session key={key}, publishing cleanup now"));
        self.schedule(key, self.clock.now());
    }

    /// Cancela el timer de `key`; devuelve si había uno.
    pub fn cancel(&self, key: &str) -> bool {
        match self.tasks.remove(key) {
            Some((_, task)) => {
                task.handle.abort();
                self.logger.debug(format_args!("cancelled cleanup timer key={key}"));
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) -> usize {
        let keys: Vec<String> = self.tasks.iter().map(|e| e.key().clone()).collect();
        keys.iter().filter(|k| self.cancel(k)).count()
    }

    pub fn is_scheduled(&self, key: &str) -> bool {
        self.tasks.contains_key(key)
    }

    pub fn scheduled_expiry(&self, key: &str) -> Option<DateTime<Utc>> {
        self.tasks.get(key).map(|t| t.expiry)
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Cancela todo y libera el publisher.
    pub fn close(&self) {
        let cancelled = self.cancel_all();
        self.publisher.close();
        self.logger.info(format_args!("cleanup scheduler closed, cancelled={cancelled}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use mapper_core::{FixedClock, MapperError};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPublisher {
        published: Mutex<Vec<Record>>,
    }

    #[async_trait]
    impl Publisher for RecordingPublisher {
        async fn publish(&self, records: Vec<Record>) -> Result<(), MapperError> {
            self.published.lock().unwrap().extend(records);
            Ok(())
        }

        fn close(&self) {}
    }

    impl RecordingPublisher {
        fn keys(&self) -> Vec<String> {
            self.published
                .lock()
                .unwrap()
                .iter()
                .filter_map(|r| r.key.as_session().map(str::to_string))
                .collect()
        }
    }

    fn scheduler(publisher: Arc<RecordingPublisher>, clock: Arc<FixedClock>) -> ScheduledTaskState {
        ScheduledTaskState::new(Handle::current(), publisher, "flow.mapper.event", clock, MapperLogger::global("mapper.test"))
    }

    #[tokio::test(start_paused = true)]
    async fn timer_publishes_execute_cleanup_and_forgets_itself() {
        let publisher = Arc::new(RecordingPublisher::default());
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let s = scheduler(publisher.clone(), clock.clone());

        s.schedule("sessionId", clock.now() + Duration::seconds(5));
        assert!(s.is_scheduled("sessionId"));

        tokio::time::sleep(std::time::Duration::from_secs(6)).await;
        assert_eq!(publisher.keys(), vec!["sessionId".to_string()]);
        let published = publisher.published.lock().unwrap()[0].clone();
        assert_eq!(published.topic, "flow.mapper.event");
        assert_eq!(published.mapper_event(), Some(&FlowMapperEvent::execute_cleanup()));
        assert!(!s.is_scheduled("sessionId"));
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_replaces_previous_timer() {
        let publisher = Arc::new(RecordingPublisher::default());
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let s = scheduler(publisher.clone(), clock.clone());

        s.schedule("sessionId", clock.now() + Duration::seconds(1));
        s.schedule("sessionId", clock.now() + Duration::seconds(3));
        assert_eq!(s.pending(), 1);
        assert_eq!(s.scheduled_expiry("sessionId"), Some(clock.now() + Duration::seconds(3)));

        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        assert!(publisher.keys().is_empty(), "replaced timer must not fire");

        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        assert_eq!(publisher.keys().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let publisher = Arc::new(RecordingPublisher::default());
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let s = scheduler(publisher.clone(), clock.clone());

        s.schedule("a", clock.now() + Duration::seconds(1));
        s.schedule("b", clock.now() + Duration::seconds(1));
        assert!(s.cancel("a"));
        assert!(!s.cancel("a"));

        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        assert_eq!(publisher.keys(), vec!["b".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn close_cancels_everything() {
        let publisher = Arc::new(RecordingPublisher::default());
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let s = scheduler(publisher.clone(), clock.clone());
        for k in ["a", "b", "c"] {
            s.schedule(k, clock.now() + Duration::seconds(1));
        }
        s.close();
        assert_eq!(s.pending(), 0);
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        assert!(publisher.keys().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn publish_now_can_be_cancelled_before_it_runs() {
        let publisher = Arc::new(RecordingPublisher::default());
        let s = scheduler(publisher.clone(), Arc::new(FixedClock::new(Utc::now())));
        s.publish_now("expired");
        assert!(s.is_scheduled("expired"));
        assert!(s.cancel("expired"));

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(publisher.keys().is_empty());
    }

    #[derive(Default)]
    struct FailingPublisher {
        attempts: Mutex<usize>,
    }

    #[async_trait]
    impl Publisher for FailingPublisher {
        async fn publish(&self, _records: Vec<Record>) -> Result<(), MapperError> {
            *self.attempts.lock().unwrap() += 1;
            Err(MapperError::Publish("broker caído".into()))
        }

        fn close(&self) {}
    }

    #[tokio::test(start_paused = true)]
    async fn failed_publish_is_not_retried_nor_rearmed() {
        let publisher = Arc::new(FailingPublisher::default());
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let s = ScheduledTaskState::new(Handle::current(),
                                        publisher.clone(),
                                        "flow.mapper.event",
                                        clock.clone(),
                                        MapperLogger::global("mapper.test"));
        s.schedule("sessionId", clock.now() + Duration::seconds(1));

        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        assert_eq!(*publisher.attempts.lock().unwrap(), 1);
        assert_eq!(s.pending(), 0);

        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        assert_eq!(*publisher.attempts.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn publish_now_emits_immediately() {
        let publisher = Arc::new(RecordingPublisher::default());
        let s = scheduler(publisher.clone(), Arc::new(FixedClock::new(Utc::now())));
        s.publish_now("expired");
        for _ in 0..50 {
            if !publisher.keys().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(publisher.keys(), vec!["expired".to_string()]);
        assert_eq!(s.pending(), 0);
    }
}
