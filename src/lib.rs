// Library exports for logsmith

pub mod config;
pub mod error;
pub mod format;
pub mod handler;
pub mod manager;
pub mod severity;
pub mod sink;

pub use config::{LogConfig, RotationConfig};
pub use error::{LogsmithError, Result};
pub use format::{LineFormat, Record, DEFAULT_TEMPLATE, TIMESTAMP_PATTERN};
pub use handler::{ConsoleHandler, FileHandler, Handler, RotatingFileHandler};
pub use manager::LogManager;
pub use severity::Severity;
pub use sink::{LogSink, Logger};
