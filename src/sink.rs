use crate::error::Result;
use crate::format::{LineFormat, Record};
use crate::handler::Handler;
use crate::severity::Severity;
use std::sync::{Arc, Mutex};

/// Shared destination registry for log records.
///
/// A `LogSink` is a cheap cloneable handle; every clone dispatches into the
/// same handler list. Passing the handle around replaces ambient global
/// state, so tests can build an isolated sink per case. Concurrent emits
/// are serialized by the internal lock; the sink does not coordinate
/// concurrent handler attachment beyond that same lock.
#[derive(Clone)]
pub struct LogSink {
    inner: Arc<SinkInner>,
}

struct SinkInner {
    handlers: Mutex<Vec<Box<dyn Handler>>>,
    default_severity: Mutex<Severity>,
    default_format: Mutex<LineFormat>,
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SinkInner {
                handlers: Mutex::new(Vec::new()),
                default_severity: Mutex::new(Severity::default()),
                default_format: Mutex::new(LineFormat::default()),
            }),
        }
    }

    /// Set the sink-wide severity floor; records below it reach no handler
    pub fn set_default_severity(&self, severity: Severity) {
        *self.inner.default_severity.lock().unwrap() = severity;
    }

    pub fn default_severity(&self) -> Severity {
        *self.inner.default_severity.lock().unwrap()
    }

    pub fn set_default_format(&self, format: LineFormat) {
        *self.inner.default_format.lock().unwrap() = format;
    }

    pub fn default_format(&self) -> LineFormat {
        self.inner.default_format.lock().unwrap().clone()
    }

    /// Attach a handler; it receives every future record at or above its
    /// own threshold.
    ///
    /// A handler whose format was never set picks up the sink's default
    /// format here; an explicitly-set format is left alone.
    pub fn attach(&self, mut handler: Box<dyn Handler>) {
        if !handler.has_format() {
            handler.set_format(self.default_format());
        }
        self.inner.handlers.lock().unwrap().push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.inner.handlers.lock().unwrap().len()
    }

    /// Forward a record to every eligible handler.
    ///
    /// All eligible handlers are attempted even if one fails; the last
    /// failure is returned so emit-time problems (a bad format template,
    /// a rotation error) stay visible to the caller.
    pub fn dispatch(&self, record: &Record) -> Result<()> {
        if record.level < self.default_severity() {
            return Ok(());
        }

        let mut handlers = self.inner.handlers.lock().unwrap();
        let mut last_err = None;
        for handler in handlers.iter_mut() {
            if record.level >= handler.severity() {
                if let Err(e) = handler.emit(record) {
                    last_err = Some(e);
                }
            }
        }

        match last_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Obtain a named logger bound to this sink. Any string is a valid
    /// name; loggers are created on demand and loggers sharing a name are
    /// interchangeable.
    pub fn logger(&self, name: &str) -> Logger {
        Logger {
            name: Arc::from(name),
            sink: self.clone(),
        }
    }
}

/// A named handle for emitting records into a sink
#[derive(Clone)]
pub struct Logger {
    name: Arc<str>,
    sink: LogSink,
}

impl Logger {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stamp a record with the current time and dispatch it
    pub fn log(&self, level: Severity, message: &str) -> Result<()> {
        self.sink.dispatch(&Record::new(&self.name, level, message))
    }

    pub fn trace(&self, message: &str) -> Result<()> {
        self.log(Severity::Trace, message)
    }

    pub fn debug(&self, message: &str) -> Result<()> {
        self.log(Severity::Debug, message)
    }

    pub fn info(&self, message: &str) -> Result<()> {
        self.log(Severity::Info, message)
    }

    pub fn warn(&self, message: &str) -> Result<()> {
        self.log(Severity::Warn, message)
    }

    pub fn error(&self, message: &str) -> Result<()> {
        self.log(Severity::Error, message)
    }

    pub fn fatal(&self, message: &str) -> Result<()> {
        self.log(Severity::Fatal, message)
    }
}
