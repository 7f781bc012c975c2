//! Handle de logging inyectado en cada componente.
//!
//! Envuelve un `log::Log` y un target. `MapperLogger::global` reenvía al
//! logger del proceso (la fachada `log`); los tests pueden pasar un
//! `CapturingLog` para inspeccionar lo emitido.

use log::{Level, Log, Metadata, Record};
use std::fmt;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MapperLogger {
    sink: Arc<dyn Log>,
    target: &'static str,
}

impl fmt::Debug for MapperLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperLogger").field("target", &self.target).finish()
    }
}

impl MapperLogger {
    pub fn new(sink: Arc<dyn Log>, target: &'static str) -> Self {
        Self { sink, target }
    }

    pub fn global(target: &'static str) -> Self {
        Self::new(Arc::new(GlobalLog), target)
    }

    /// Mismo sink con otro target.
    pub fn with_target(&self, target: &'static str) -> Self {
        Self { sink: self.sink.clone(),
               target }
    }

    pub fn target(&self) -> &'static str {
        self.target
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        let metadata = Metadata::builder().level(level).target(self.target).build();
        if !self.sink.enabled(&metadata) {
            return;
        }
        self.sink.log(&Record::builder().metadata(metadata).args(args).build());
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args)
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args)
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args)
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args)
    }
}

/// Reenvía al logger instalado en el proceso respetando `log::max_level`.
struct GlobalLog;

impl Log for GlobalLog {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level() && log::logger().enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        log::logger().log(record)
    }

    fn flush(&self) {
        log::logger().flush()
    }
}

/// Sink en memoria: guarda `(nivel, target, mensaje)`.
#[derive(Debug, Default)]
pub struct CapturingLog {
    entries: Mutex<Vec<(Level, String, String)>>,
}

impl CapturingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Level, String, String)> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn count_at(&self, level: Level) -> usize {
        self.entries().iter().filter(|(l, _, _)| *l == level).count()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries().iter().any(|(_, _, msg)| msg.contains(needle))
    }
}

impl Log for CapturingLog {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((record.level(), record.target().to_string(), record.args().to_string()));
    }

    fn flush(&self) {}
}
