//! Textual run log returned to the host.
//!
//! The log is a domain object, not ambient diagnostics: the engine writes
//! into it during `run` and the full text is attached to the result record.
//! Warnings are captured separately and reissued in a block at the end of
//! the log so they are visible without scanning the whole text.

use chrono::Local;

#[derive(Debug, Default)]
pub struct RunLog {
    buf: String,
    warnings: Vec<String>,
}

impl RunLog {
    /// Start a log with a timestamped header line.
    pub fn start() -> Self {
        let mut log = Self::default();
        log.line(format!("Run started {}", Local::now().to_rfc3339()));
        log
    }

    /// Append one line of log text.
    pub fn line(&mut self, msg: impl AsRef<str>) {
        self.buf.push_str(msg.as_ref());
        self.buf.push('\n');
    }

    /// Append a warning line and remember it for reissue.
    pub fn warn(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        self.buf.push_str("WARNING: ");
        self.buf.push_str(&msg);
        self.buf.push('\n');
        self.warnings.push(msg);
    }

    pub fn text(&self) -> &str {
        &self.buf
    }

    /// Finish the log, reissuing captured warnings at the end.
    pub fn finish(mut self) -> String {
        if !self.warnings.is_empty() {
            self.buf.push('\n');
            self.buf.push_str(&format!(
                "{} warning(s) issued during this run:\n",
                self.warnings.len()
            ));
            for w in &self.warnings {
                self.buf.push_str("WARNING: ");
                self.buf.push_str(w);
                self.buf.push('\n');
            }
        }
        self.buf
    }
}
