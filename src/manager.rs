use crate::config::LogConfig;
use crate::error::{LogsmithError, Result};
use crate::format::{LineFormat, DEFAULT_TEMPLATE};
use crate::handler::{
    ConsoleHandler, FileHandler, Handler, RotatingFileHandler, DEFAULT_BACKUP_COUNT,
    DEFAULT_MAX_BYTES,
};
use crate::severity::Severity;
use crate::sink::{LogSink, Logger};
use chrono::Local;
use std::path::{Path, PathBuf};

/// Filename prefix for generated log files
const LOG_FILE_PREFIX: &str = "agt003dsi_";

/// Default directory for log files
const DEFAULT_LOG_DIR: &str = "logs";

/// LogManager sets up the logging sink: it derives a timestamped log file
/// path, ensures the target directory exists, and attaches file, rotating
/// file and console handlers, all at a shared minimum severity.
///
/// Construction opens the initial file handler synchronously; additional
/// handlers may be attached any time after. There is no teardown, handlers
/// live as long as the sink handle.
pub struct LogManager {
    /// Directory where log files are stored
    directory: PathBuf,
    /// Minimum severity applied to every handler this manager attaches
    severity: Severity,
    /// Log file path computed once at construction, never recomputed
    file_path: PathBuf,
    /// Sink every handler is attached to
    sink: LogSink,
    /// Logger handed out when no name is requested
    primary: Logger,
}

impl LogManager {
    /// Create a LogManager with the default directory (`logs`) and
    /// severity (`DEBUG`)
    pub fn new() -> Result<Self> {
        Self::with_options(DEFAULT_LOG_DIR, Severity::default())
    }

    /// Create a LogManager writing to `directory` at `severity`.
    ///
    /// The directory is created if absent (parents included) and a plain
    /// file handler is opened on the generated path.
    ///
    /// # Arguments
    /// * `directory` - Directory where log files will be stored
    /// * `severity` - Minimum severity applied to every attached handler
    ///
    /// # Returns
    /// * `Ok(LogManager)` - Directory exists and the log file is open
    /// * `Err(LogsmithError)` - Failed to create the directory or open the
    ///   file; construction is aborted
    pub fn with_options<P: AsRef<Path>>(directory: P, severity: Severity) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        let file_path = generate_log_path(&directory);

        std::fs::create_dir_all(&directory).map_err(|e| {
            LogsmithError::DirectoryError(format!("Failed to create log directory: {}", e))
        })?;

        let sink = LogSink::new();
        sink.set_default_severity(severity);
        sink.set_default_format(LineFormat::default());

        let primary = sink.logger(env!("CARGO_PKG_NAME"));

        let manager = Self {
            directory,
            severity,
            file_path,
            sink,
            primary,
        };

        let file_handler = FileHandler::new(&manager.file_path)?;
        manager.add_handler(Box::new(file_handler), DEFAULT_TEMPLATE);

        Ok(manager)
    }

    /// Create a LogManager from a loaded configuration, attaching console
    /// and rotating handlers as the config requests.
    ///
    /// # Arguments
    /// * `config` - Validated logging configuration
    ///
    /// # Returns
    /// * `Ok(LogManager)` - Setup complete with all requested handlers
    /// * `Err(LogsmithError)` - Invalid configuration or an I/O failure
    ///   during setup
    pub fn from_config(config: &LogConfig) -> Result<Self> {
        config.validate()?;

        let manager = Self::with_options(&config.directory, config.level)?;
        if config.console {
            manager.add_console_handler();
        }
        if let Some(rotation) = &config.rotation {
            manager.add_rotating_file_handler_with(rotation.max_bytes, rotation.backup_count)?;
        }

        Ok(manager)
    }

    /// Retrieve a logger by name, or the primary logger when no name is
    /// given.
    ///
    /// # Arguments
    /// * `name` - Optional logger name; any string is valid and loggers
    ///   are created on demand
    ///
    /// # Returns
    /// * `Logger` - Named logger bound to this manager's sink
    pub fn get_logger(&self, name: Option<&str>) -> Logger {
        match name {
            Some(name) => self.sink.logger(name),
            None => self.primary.clone(),
        }
    }

    /// Attach a console handler (stderr) at the manager severity with the
    /// default line format
    pub fn add_console_handler(&self) {
        self.add_handler(Box::new(ConsoleHandler::new()), DEFAULT_TEMPLATE);
    }

    /// Attach a rotating file handler on the generated log path with the
    /// default size limit (10MB) and backup count (5)
    pub fn add_rotating_file_handler(&self) -> Result<()> {
        self.add_rotating_file_handler_with(DEFAULT_MAX_BYTES, DEFAULT_BACKUP_COUNT)
    }

    /// Attach a rotating file handler on the generated log path.
    ///
    /// The rotating handler targets the same path as the plain file handler
    /// opened at construction, so both write every record. That matches the
    /// historical contract; a WARN record is emitted to make the duplicate
    /// writers visible.
    ///
    /// # Arguments
    /// * `max_bytes` - Maximum file size in bytes before rollover
    /// * `backup_count` - Number of rotated backups to retain
    ///
    /// # Returns
    /// * `Ok(())` - Handler attached
    /// * `Err(LogsmithError)` - Failed to open the log file
    pub fn add_rotating_file_handler_with(
        &self,
        max_bytes: u64,
        backup_count: usize,
    ) -> Result<()> {
        let handler = RotatingFileHandler::with_limits(&self.file_path, max_bytes, backup_count)?;
        self.add_handler(Box::new(handler), DEFAULT_TEMPLATE);

        // The warning is advisory; a delivery failure (say, an unrelated
        // handler carrying a bad template) must not fail the attach itself.
        let _ = self.primary.warn(&format!(
            "Multiple handlers now target {}; records will be written more than once",
            self.file_path.display()
        ));

        Ok(())
    }

    /// Set a handler's severity to the manager severity and its format to
    /// `template`, then attach it to the sink.
    ///
    /// # Arguments
    /// * `handler` - Handler to attach
    /// * `template` - Line template; not validated here, a bad placeholder
    ///   only fails once a record is emitted through the handler
    pub fn add_handler(&self, mut handler: Box<dyn Handler>, template: &str) {
        handler.set_severity(self.severity);
        handler.set_format(LineFormat::new(template));
        self.sink.attach(handler);
    }

    /// Path of the log file generated at construction
    pub fn log_filename(&self) -> &Path {
        &self.file_path
    }

    /// Directory where log files are stored
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Minimum severity applied to attached handlers
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// The sink this manager attaches handlers to
    pub fn sink(&self) -> &LogSink {
        &self.sink
    }
}

/// Generate a log file path from the current local time, e.g.
/// `logs/agt003dsi_20240307123045.log`
fn generate_log_path(directory: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d%H%M%S");
    directory.join(format!("{}{}.log", LOG_FILE_PREFIX, stamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager_in(temp_dir: &TempDir) -> LogManager {
        LogManager::with_options(temp_dir.path().join("logs"), Severity::Debug).unwrap()
    }

    #[test]
    fn test_construction_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("a").join("b").join("logs");
        assert!(!dir.exists());

        let manager = LogManager::with_options(&dir, Severity::Info).unwrap();
        assert!(dir.exists());
        assert_eq!(manager.directory(), dir);
    }

    #[test]
    fn test_log_filename_shape() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);

        let name = manager
            .log_filename()
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap();

        assert!(name.starts_with(LOG_FILE_PREFIX));
        assert!(name.ends_with(".log"));
        let stamp = &name[LOG_FILE_PREFIX.len()..name.len() - 4];
        assert_eq!(stamp.len(), 14);
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_log_filename_is_stable() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);

        let first = manager.log_filename().to_path_buf();
        manager.get_logger(None).info("a record").unwrap();
        assert_eq!(manager.log_filename(), first);
    }

    #[test]
    fn test_construction_opens_file_handler() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);

        assert!(manager.log_filename().exists());
        assert_eq!(manager.sink().handler_count(), 1);
    }

    #[test]
    fn test_inaccessible_directory_fails() {
        let result = LogManager::with_options("/proc/no-such-place/logs", Severity::Debug);
        assert!(result.is_err());
    }

    #[test]
    fn test_get_logger_default_is_primary() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);

        let a = manager.get_logger(None);
        let b = manager.get_logger(None);
        assert_eq!(a.name(), b.name());
        assert_eq!(a.name(), env!("CARGO_PKG_NAME"));
    }

    #[test]
    fn test_get_logger_named() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);

        let x = manager.get_logger(Some("x"));
        let y = manager.get_logger(Some("y"));
        assert_eq!(x.name(), "x");
        assert_eq!(y.name(), "y");
    }

    #[test]
    fn test_records_reach_log_file() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);

        manager.get_logger(Some("svc")).info("file bound").unwrap();

        let content = std::fs::read_to_string(manager.log_filename()).unwrap();
        assert!(content.contains("svc - INFO - file bound"));
    }

    #[test]
    fn test_severity_filter_applies_to_file_handler() {
        let temp_dir = TempDir::new().unwrap();
        let manager =
            LogManager::with_options(temp_dir.path().join("logs"), Severity::Warn).unwrap();

        let logger = manager.get_logger(None);
        logger.debug("suppressed").unwrap();
        logger.error("kept").unwrap();

        let content = std::fs::read_to_string(manager.log_filename()).unwrap();
        assert!(!content.contains("suppressed"));
        assert!(content.contains("kept"));
    }

    #[test]
    fn test_rotating_handler_rotates_and_caps_backups() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);
        manager.add_rotating_file_handler_with(100, 2).unwrap();

        let logger = manager.get_logger(Some("rot"));
        for i in 0..40 {
            logger.info(&format!("padding entry {}", i)).unwrap();
        }

        let base = manager.log_filename();
        let backup = |n: u32| {
            let mut name = base.as_os_str().to_os_string();
            name.push(format!(".{}", n));
            PathBuf::from(name)
        };

        assert!(backup(1).exists());
        assert!(backup(2).exists());
        assert!(!backup(3).exists());
    }

    #[test]
    fn test_rotating_attach_survives_failed_warning() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);

        // A bad template makes the advisory warning fail at dispatch
        let extra = FileHandler::new(&temp_dir.path().join("extra.log")).unwrap();
        manager.add_handler(Box::new(extra), "{nonsense}");

        let handlers_before = manager.sink().handler_count();
        let result = manager.add_rotating_file_handler_with(1024, 2);

        assert!(result.is_ok());
        assert_eq!(manager.sink().handler_count(), handlers_before + 1);
    }

    #[test]
    fn test_add_handler_defers_template_validation() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);

        let handler = FileHandler::new(&temp_dir.path().join("extra.log")).unwrap();
        // Attaching never inspects the template
        manager.add_handler(Box::new(handler), "{nonsense}");

        let result = manager.get_logger(None).info("first emit");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_config_attaches_requested_handlers() {
        let temp_dir = TempDir::new().unwrap();
        let config = LogConfig {
            directory: temp_dir.path().join("logs"),
            level: Severity::Info,
            console: true,
            rotation: Some(crate::config::RotationConfig {
                max_bytes: 2048,
                backup_count: 2,
            }),
        };

        let manager = LogManager::from_config(&config).unwrap();
        // File handler, console handler, rotating handler
        assert_eq!(manager.sink().handler_count(), 3);
        assert_eq!(manager.severity(), Severity::Info);
    }
}
