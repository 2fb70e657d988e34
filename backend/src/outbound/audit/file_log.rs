//! Daily plain-text audit files.
//!
//! Records go to `<dir>/log_YYYY-MM-DD.txt` (UTC date), one line each:
//!
//! ```text
//! 2026-10-18 09:15:02 | IP=10.0.0.1 | RAW_QUERY | command=check&account=123456
//! 2026-10-18 09:15:02 | IP=10.0.0.1 | REQUEST | command=check | txn_id= | account=123456
//! 2026-10-18 09:15:02 | IP=10.0.0.1 | RESPONSE | txn_id= | result=0 | Simulator: check for account 123456
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::domain::ports::{AuditEvent, AuditLog, AuditLogError};

/// Appends audit records to a file per UTC day.
#[derive(Clone)]
pub struct FileAuditLog {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
    write_lock: Arc<Mutex<()>>,
}

impl FileAuditLog {
    /// Write files under `dir`, which must already exist.
    pub fn new(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            dir: dir.into(),
            clock,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Directory holding the audit files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File receiving records written at `at`.
    #[must_use]
    pub fn file_for(&self, at: DateTime<Utc>) -> PathBuf {
        self.dir.join(format!("log_{}.txt", at.format("%Y-%m-%d")))
    }
}

/// Render one record as a single line, without the trailing newline.
fn render_line(at: DateTime<Utc>, event: &AuditEvent) -> String {
    let timestamp = at.format("%Y-%m-%d %H:%M:%S");
    let kind = event.kind();
    match event {
        AuditEvent::RawQuery { remote_addr, query } => {
            format!("{timestamp} | IP={remote_addr} | {kind} | {query}")
        }
        AuditEvent::Request {
            remote_addr,
            command,
            fields,
        } => {
            let rendered = fields
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect::<Vec<_>>()
                .join(" | ");
            format!("{timestamp} | IP={remote_addr} | {kind} | command={command} | {rendered}")
        }
        AuditEvent::Response {
            remote_addr,
            txn_id,
            result,
            comment,
        } => format!(
            "{timestamp} | IP={remote_addr} | {kind} | txn_id={txn_id} | result={result} | {comment}"
        ),
    }
}

#[async_trait]
impl AuditLog for FileAuditLog {
    async fn record(&self, event: &AuditEvent) -> Result<(), AuditLogError> {
        let now = self.clock.utc();
        let mut line = render_line(now, event);
        line.push('\n');
        let path = self.file_for(now);

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|err| AuditLogError::write(format!("{}: {err}", path.display())))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|err| AuditLogError::write(format!("{}: {err}", path.display())))?;
        file.flush()
            .await
            .map_err(|err| AuditLogError::write(format!("{}: {err}", path.display())))
    }
}
