use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use yieldkeeper_interfaces::AuditSink;
use yieldkeeper_types::AuditEvent;

/// Append-only JSON-lines audit sink. One record per line, `O_APPEND` opened
/// fresh on every write so a concurrently-rotated or -truncated file is
/// tolerated; a `Mutex` only serializes writers within this process, it does
/// not provide cross-process locking.
pub struct JsonLinesAuditSink {
    path: PathBuf,
    writer_lock: Mutex<()>,
}

impl JsonLinesAuditSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl AuditSink for JsonLinesAuditSink {
    async fn log_event(&self, event: AuditEvent) {
        let _guard = self.writer_lock.lock().await;

        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize audit event");
                return;
            }
        };

        let result = async {
            let mut file = OpenOptions::new().create(true).append(true).open(&self.path).await?;
            file.write_all(line.as_bytes()).await?;
            file.write_all(b"\n").await?;
            file.flush().await
        }
        .await;

        if let Err(err) = result {
            tracing::error!(error = %err, path = %self.path.display(), "failed to write audit event");
        }
    }
}
