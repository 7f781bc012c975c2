//! Configuración del servicio del mapper.
//! Se construye a mano o desde variables de entorno (`.env` opcional).

use mapper_core::MapperTopics;
use once_cell::sync::Lazy;
use std::env;

use crate::error::ServiceError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenvy::dotenv(); // ignora error si no existe .env
});

pub const DEFAULT_GROUP_NAME: &str = "flow-mapper";
pub const DEFAULT_CLEANUP_THREADS: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowMapperConfig {
    /// Grupo de consumo bajo el que se registra la suscripción.
    pub group_name: String,
    pub instance_id: i32,
    pub topics: MapperTopics,
    /// Hilos del runtime que ejecuta los timers de limpieza.
    pub cleanup_runtime_threads: usize,
}

impl Default for FlowMapperConfig {
    fn default() -> Self {
        Self { group_name: DEFAULT_GROUP_NAME.to_string(),
               instance_id: 0,
               topics: MapperTopics::default(),
               cleanup_runtime_threads: DEFAULT_CLEANUP_THREADS }
    }
}

impl FlowMapperConfig {
    pub fn new(group_name: impl Into<String>, instance_id: i32, topics: MapperTopics) -> Self {
        Self { group_name: group_name.into(),
               instance_id,
               topics,
               ..Self::default() }
    }

    pub fn from_env() -> Result<Self, ServiceError> {
        // asegura que .env se haya cargado
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Igual que `from_env` pero leyendo de una función arbitraria.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServiceError>
        where F: Fn(&str) -> Option<String>
    {
        let defaults = Self::default();
        let instance_id = match lookup("FLOW_MAPPER_INSTANCE_ID") {
            Some(raw) => raw.trim()
                            .parse::<i32>()
                            .map_err(|e| ServiceError::Config(format!("FLOW_MAPPER_INSTANCE_ID inválido '{raw}': {e}")))?,
            None => defaults.instance_id,
        };
        let cleanup_runtime_threads = match lookup("FLOW_MAPPER_CLEANUP_THREADS") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ServiceError::Config(format!("FLOW_MAPPER_CLEANUP_THREADS inválido '{raw}'"))),
            },
            None => defaults.cleanup_runtime_threads,
        };
        let topics = MapperTopics { mapper_topic: lookup("FLOW_MAPPER_TOPIC").unwrap_or(defaults.topics.mapper_topic),
                                    flow_event_topic: lookup("FLOW_EVENT_TOPIC").unwrap_or(defaults.topics.flow_event_topic),
                                    p2p_out_topic: lookup("P2P_OUT_TOPIC").unwrap_or(defaults.topics.p2p_out_topic) };
        Ok(Self { group_name: lookup("FLOW_MAPPER_GROUP").unwrap_or(defaults.group_name),
                  instance_id,
                  topics,
                  cleanup_runtime_threads })
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
