use mapper_core::hashing::hash_bytes_u64;
use mapper_core::{FlowMapperState, Record};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct BusInner {
    topics: HashMap<String, Vec<Record>>,
    states: HashMap<String, FlowMapperState>,
    /// Próximo índice a consumir por `(grupo, partición)`.
    offsets: HashMap<(String, u32), usize>,
}

/// Tópicos + store de estado compartidos por publishers y suscripciones.
#[derive(Clone)]
pub struct InMemoryBus {
    inner: Arc<Mutex<BusInner>>,
    partitions: u32,
}

impl InMemoryBus {
    pub fn new(partitions: u32) -> Self {
        Self { inner: Arc::new(Mutex::new(BusInner::default())),
               partitions: partitions.max(1) }
    }

    fn lock(&self) -> MutexGuard<'_, BusInner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn partitions(&self) -> u32 {
        self.partitions
    }

    pub fn partition_for(&self, key: &str) -> u32 {
        (hash_bytes_u64(key.as_bytes()) % u64::from(self.partitions)) as u32
    }

    pub fn all_partitions(&self) -> BTreeSet<u32> {
        (0..self.partitions).collect()
    }

    pub fn append(&self, records: Vec<Record>) {
        let mut inner = self.lock();
        for r in records {
            inner.topics.entry(r.topic.clone()).or_default().push(r);
        }
    }

    pub fn records(&self, topic: &str) -> Vec<Record> {
        self.lock().topics.get(topic).cloned().unwrap_or_default()
    }

    /// Registros de `topic` a partir del índice `from`, con su índice.
    pub(crate) fn records_from(&self, topic: &str, from: usize) -> Vec<(usize, Record)> {
        self.lock()
            .topics
            .get(topic)
            .map(|log| log.iter().enumerate().skip(from).map(|(i, r)| (i, r.clone())).collect())
            .unwrap_or_default()
    }

    pub fn state(&self, key: &str) -> Option<FlowMapperState> {
        self.lock().states.get(key).cloned()
    }

    /// Siembra el store durable (p. ej. para simular rehidratación).
    pub fn put_state(&self, key: &str, state: FlowMapperState) {
        self.lock().states.insert(key.to_string(), state);
    }

    pub fn state_count(&self) -> usize {
        self.lock().states.len()
    }

    /// Snapshot de los estados cuyas claves caen en `partitions`.
    pub fn states_in(&self, partitions: &BTreeSet<u32>) -> HashMap<String, FlowMapperState> {
        self.lock()
            .states
            .iter()
            .filter(|(k, _)| partitions.contains(&self.partition_for(k)))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Offset comiteado del grupo en la partición (0 si nunca consumió).
    pub fn committed_offset(&self, group: &str, partition: u32) -> usize {
        self.lock().offsets.get(&(group.to_string(), partition)).copied().unwrap_or(0)
    }

    /// Avanza el offset sin tocar estado (registros que no son del mapper).
    pub(crate) fn advance_offset(&self, group: &str, partition: u32, next: usize) {
        self.lock().offsets.insert((group.to_string(), partition), next);
    }

    /// Commit atómico: estado de la clave, registros de salida y offset del
    /// grupo bajo el mismo lock.
    pub(crate) fn commit(&self, group: &str, partition: u32, next: usize, key: &str, state: Option<FlowMapperState>,
                         records: Vec<Record>) {
        let mut inner = self.lock();
        inner.offsets.insert((group.to_string(), partition), next);
        match state {
            Some(s) => {
                inner.states.insert(key.to_string(), s);
            }
            None => {
                inner.states.remove(key);
            }
        }
        for r in records {
            inner.topics.entry(r.topic.clone()).or_default().push(r);
        }
    }
}
