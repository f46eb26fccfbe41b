use crate::error::{LogsmithError, Result};
use crate::severity::Severity;
use chrono::{DateTime, Local};

/// Timestamp pattern used by every handler (chrono strftime syntax)
pub const TIMESTAMP_PATTERN: &str = "%Y-%m-%d %H:%M:%S";

/// Default line template shared by file and console handlers
pub const DEFAULT_TEMPLATE: &str = "{timestamp} - {name} - {level} - {message}";

/// A single log record before formatting
#[derive(Debug, Clone)]
pub struct Record {
    pub timestamp: DateTime<Local>,
    pub name: String,
    pub level: Severity,
    pub message: String,
}

impl Record {
    pub fn new(name: &str, level: Severity, message: &str) -> Self {
        Self {
            timestamp: Local::now(),
            name: name.to_string(),
            level,
            message: message.to_string(),
        }
    }
}

/// Line format built from a placeholder template.
///
/// The template is not validated at construction. An unknown placeholder
/// only surfaces as a `FormatError` when a record is actually rendered,
/// so a bad template attaches fine and fails at first emit.
#[derive(Debug, Clone)]
pub struct LineFormat {
    template: String,
}

impl Default for LineFormat {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl LineFormat {
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Render a record into a single line (no trailing newline).
    pub fn render(&self, record: &Record) -> Result<String> {
        let mut out = String::with_capacity(self.template.len() + record.message.len());
        let mut chars = self.template.char_indices();

        while let Some((i, c)) = chars.next() {
            if c != '{' {
                out.push(c);
                continue;
            }
            let rest = &self.template[i + 1..];
            let end = rest.find('}').ok_or_else(|| {
                LogsmithError::FormatError(format!(
                    "Unterminated placeholder in template: {}",
                    self.template
                ))
            })?;
            let key = &rest[..end];
            match key {
                "timestamp" => out.push_str(&record.timestamp.format(TIMESTAMP_PATTERN).to_string()),
                "name" => out.push_str(&record.name),
                "level" => out.push_str(&record.level.to_string()),
                "message" => out.push_str(&record.message),
                other => {
                    return Err(LogsmithError::FormatError(format!(
                        "Unknown placeholder: {{{}}}",
                        other
                    )))
                }
            }
            // Skip past the placeholder body and closing brace
            for _ in 0..=end {
                chars.next();
            }
        }

        Ok(out)
    }
}
