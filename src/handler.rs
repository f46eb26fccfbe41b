use crate::error::{LogsmithError, Result};
use crate::format::{LineFormat, Record};
use crate::severity::Severity;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default maximum rotating log file size before rollover (10MB)
pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Default number of rotated backup files to retain
pub const DEFAULT_BACKUP_COUNT: usize = 5;

/// An output adapter with its own severity threshold and line format.
///
/// The sink consults `severity()` before calling `emit`, so handlers only
/// see records at or above their own threshold. A handler whose format was
/// never set reports `has_format() == false`; the sink fills in its default
/// format at attach time, and a detached handler renders with the built-in
/// template.
pub trait Handler: Send {
    fn emit(&mut self, record: &Record) -> Result<()>;
    fn severity(&self) -> Severity;
    fn set_severity(&mut self, severity: Severity);
    fn set_format(&mut self, format: LineFormat);
    fn has_format(&self) -> bool;
}

fn render_line(format: &Option<LineFormat>, record: &Record) -> Result<String> {
    match format {
        Some(format) => format.render(record),
        None => LineFormat::default().render(record),
    }
}

/// Handler writing rendered lines to a console stream (stderr by default)
pub struct ConsoleHandler {
    stream: Box<dyn Write + Send>,
    severity: Severity,
    format: Option<LineFormat>,
}

impl ConsoleHandler {
    pub fn new() -> Self {
        Self::with_writer(Box::new(std::io::stderr()))
    }

    /// Build a console handler around an arbitrary stream. Tests use this
    /// to capture output in a shared buffer.
    pub fn with_writer(stream: Box<dyn Write + Send>) -> Self {
        Self {
            stream,
            severity: Severity::default(),
            format: None,
        }
    }
}

impl Default for ConsoleHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for ConsoleHandler {
    fn emit(&mut self, record: &Record) -> Result<()> {
        let line = render_line(&self.format, record)?;
        writeln!(self.stream, "{}", line)?;
        self.stream.flush()?;
        Ok(())
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn set_severity(&mut self, severity: Severity) {
        self.severity = severity;
    }

    fn set_format(&mut self, format: LineFormat) {
        self.format = Some(format);
    }

    fn has_format(&self) -> bool {
        self.format.is_some()
    }
}

/// Handler appending rendered lines to a single file
pub struct FileHandler {
    path: PathBuf,
    file: File,
    severity: Severity,
    format: Option<LineFormat>,
}

impl FileHandler {
    /// Open a file handler appending to `path`.
    ///
    /// # Arguments
    /// * `path` - Log file to append to; created if absent
    ///
    /// # Returns
    /// * `Ok(FileHandler)` - Successfully opened the file
    /// * `Err(LogsmithError)` - Failed to open the file for writing
    pub fn new(path: &Path) -> Result<Self> {
        let file = open_append(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            severity: Severity::default(),
            format: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Handler for FileHandler {
    fn emit(&mut self, record: &Record) -> Result<()> {
        let line = render_line(&self.format, record)?;
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        Ok(())
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn set_severity(&mut self, severity: Severity) {
        self.severity = severity;
    }

    fn set_format(&mut self, format: LineFormat) {
        self.format = Some(format);
    }

    fn has_format(&self) -> bool {
        self.format.is_some()
    }
}

/// Size-bounded rotating file handler.
///
/// When a write would push the active file past `max_bytes`, existing
/// backups shift up one slot (`base.1` becomes `base.2` and so on, the
/// oldest beyond `backup_count` discarded), the active file is renamed to
/// `base.1` and a fresh file is opened at the base path.
pub struct RotatingFileHandler {
    path: PathBuf,
    file: File,
    current_size: u64,
    max_bytes: u64,
    backup_count: usize,
    severity: Severity,
    format: Option<LineFormat>,
}

impl RotatingFileHandler {
    /// Open a rotating handler with the default size limit (10MB) and
    /// backup count (5)
    pub fn new(path: &Path) -> Result<Self> {
        Self::with_limits(path, DEFAULT_MAX_BYTES, DEFAULT_BACKUP_COUNT)
    }

    /// Open a rotating handler with custom limits.
    ///
    /// # Arguments
    /// * `path` - Active log file; backups get numeric suffixes next to it
    /// * `max_bytes` - Maximum file size in bytes before rollover
    /// * `backup_count` - Number of rotated backups to retain
    ///
    /// # Returns
    /// * `Ok(RotatingFileHandler)` - Successfully opened the active file
    /// * `Err(LogsmithError)` - Failed to open the file for writing
    pub fn with_limits(path: &Path, max_bytes: u64, backup_count: usize) -> Result<Self> {
        let file = open_append(path)?;
        let current_size = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(Self {
            path: path.to_path_buf(),
            file,
            current_size,
            max_bytes,
            backup_count,
            severity: Severity::default(),
            format: None,
        })
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn backup_count(&self) -> usize {
        self.backup_count
    }

    /// Path of the numbered backup slot, e.g. `app.log.2`
    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    /// Shift backups up one slot and start a fresh active file
    fn rollover(&mut self) -> Result<()> {
        self.file
            .flush()
            .map_err(|e| LogsmithError::RotationError(format!("Failed to flush before rotation: {}", e)))?;

        if self.backup_count > 0 {
            // Oldest slot is overwritten by the rename out of the slot below it
            for index in (1..self.backup_count).rev() {
                let from = self.backup_path(index);
                if from.exists() {
                    std::fs::rename(&from, self.backup_path(index + 1)).map_err(|e| {
                        LogsmithError::RotationError(format!("Failed to shift backup: {}", e))
                    })?;
                }
            }
            std::fs::rename(&self.path, self.backup_path(1)).map_err(|e| {
                LogsmithError::RotationError(format!("Failed to rotate log: {}", e))
            })?;
        } else {
            std::fs::remove_file(&self.path).map_err(|e| {
                LogsmithError::RotationError(format!("Failed to truncate log: {}", e))
            })?;
        }

        self.file = open_append(&self.path)?;
        self.current_size = 0;
        Ok(())
    }
}

impl Handler for RotatingFileHandler {
    fn emit(&mut self, record: &Record) -> Result<()> {
        let line = render_line(&self.format, record)?;
        let entry_len = line.len() as u64 + 1;

        if self.current_size + entry_len > self.max_bytes && self.current_size > 0 {
            self.rollover()?;
        }

        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        self.current_size += entry_len;
        Ok(())
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn set_severity(&mut self, severity: Severity) {
        self.severity = severity;
    }

    fn set_format(&mut self, format: LineFormat) {
        self.format = Some(format);
    }

    fn has_format(&self) -> bool {
        self.format.is_some()
    }
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LogsmithError::FileError(format!("Failed to open log file: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Write adapter that lets tests inspect what a console handler emitted
    #[derive(Clone)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_console_handler_writes_formatted_line() {
        let buf = SharedBuf(Arc::new(Mutex::new(Vec::new())));
        let mut handler = ConsoleHandler::with_writer(Box::new(buf.clone()));

        handler
            .emit(&Record::new("app", Severity::Info, "hello"))
            .unwrap();

        let output = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains(" - app - INFO - hello"));
        assert!(output.ends_with('\n'));
    }

    #[test]
    fn test_file_handler_appends() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");

        let mut handler = FileHandler::new(&path).unwrap();
        handler
            .emit(&Record::new("app", Severity::Warn, "first"))
            .unwrap();
        handler
            .emit(&Record::new("app", Severity::Warn, "second"))
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("first"));
        assert!(lines[1].contains("second"));
    }

    #[test]
    fn test_file_handler_open_failure() {
        let result = FileHandler::new(Path::new("/nonexistent-dir/app.log"));
        assert!(matches!(result, Err(LogsmithError::FileError(_))));
    }

    #[test]
    fn test_rotation_produces_backup() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");

        let mut handler = RotatingFileHandler::with_limits(&path, 100, 2).unwrap();
        for i in 0..10 {
            handler
                .emit(&Record::new("app", Severity::Info, &format!("entry {}", i)))
                .unwrap();
        }

        assert!(path.exists());
        assert!(temp_dir.path().join("app.log.1").exists());
    }

    #[test]
    fn test_rotation_respects_backup_count() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");

        let mut handler = RotatingFileHandler::with_limits(&path, 80, 2).unwrap();
        for i in 0..50 {
            handler
                .emit(&Record::new("app", Severity::Info, &format!("entry {}", i)))
                .unwrap();
        }

        assert!(temp_dir.path().join("app.log.1").exists());
        assert!(temp_dir.path().join("app.log.2").exists());
        assert!(!temp_dir.path().join("app.log.3").exists());

        // Active file never exceeds the limit
        let size = std::fs::metadata(&path).unwrap().len();
        assert!(size <= 80, "active file is {} bytes", size);
    }

    #[test]
    fn test_rotation_preserves_newest_entries() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");

        let mut handler = RotatingFileHandler::with_limits(&path, 100, 3).unwrap();
        for i in 0..20 {
            handler
                .emit(&Record::new("app", Severity::Info, &format!("entry {}", i)))
                .unwrap();
        }

        // The most recent entry lives in the active file
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("entry 19"));
    }

    #[test]
    fn test_no_rotation_below_limit() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");

        let mut handler = RotatingFileHandler::with_limits(&path, 10_000, 2).unwrap();
        for _ in 0..5 {
            handler
                .emit(&Record::new("app", Severity::Info, "short"))
                .unwrap();
        }

        assert!(!temp_dir.path().join("app.log.1").exists());
    }
}
