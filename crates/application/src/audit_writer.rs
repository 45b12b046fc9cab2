use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use quire_core::{AppError, AppResult};
use quire_domain::AuditLogEntry;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::AuditLogRepository;

mod listener;


pub use listener::AuditListener;

/// Tuning for the audit writer queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditWriterConfig {
    /// Maximum entries waiting for the writer.
    pub queue_capacity: usize,
    /// Longest a broadcaster waits for queue space before the entry is dropped.
    pub enqueue_timeout: Duration,
}

impl Default for AuditWriterConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            enqueue_timeout: Duration::from_millis(250),
        }
    }
}

/// Audit writer counters since startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuditWriterStats {
    /// Entries persisted.
    pub written: u64,
    /// Entries the repository rejected.
    pub failed: u64,
    /// Entries never queued because the queue stayed full or the writer had stopped.
    pub dropped: u64,
}

#[derive(Debug, Default)]
struct AuditCounters {
    written: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

impl AuditCounters {
    fn snapshot(&self) -> AuditWriterStats {
        AuditWriterStats {
            written: self.written.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug)]
struct PendingAuditEntry {
    action: String,
    user: Option<Value>,
    details: Option<Value>,
}

#[derive(Debug)]
enum AuditCommand {
    Append(PendingAuditEntry),
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Single task owning the audit repository; appends entries one at a time in queue order.
pub struct AuditWriter {
    repository: Arc<dyn AuditLogRepository>,
    receiver: mpsc::Receiver<AuditCommand>,
    counters: Arc<AuditCounters>,
    last_created_at: Option<DateTime<Utc>>,
}

impl AuditWriter {
    /// Starts the writer task on the current tokio runtime.
    pub fn spawn(
        repository: Arc<dyn AuditLogRepository>,
        config: AuditWriterConfig,
    ) -> AppResult<AuditWriterHandle> {
        if config.queue_capacity == 0 {
            return Err(AppError::Configuration(
                "audit queue capacity must be at least 1".to_owned(),
            ));
        }

        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let counters = Arc::new(AuditCounters::default());
        let writer = Self {
            repository,
            receiver,
            counters: counters.clone(),
            last_created_at: None,
        };
        let task = tokio::spawn(writer.run());

        Ok(AuditWriterHandle {
            sender,
            counters,
            enqueue_timeout: config.enqueue_timeout,
            task: Arc::new(Mutex::new(Some(task))),
        })
    }

    async fn run(mut self) {
        while let Some(command) = self.receiver.recv().await {
            match command {
                AuditCommand::Append(pending) => self.write(pending).await,
                AuditCommand::Flush(done) => {
                    let _ = done.send(());
                }
                AuditCommand::Shutdown(done) => {
                    let _ = done.send(());
                    break;
                }
            }
        }

        self.receiver.close();
        while let Ok(command) = self.receiver.try_recv() {
            match command {
                AuditCommand::Append(_) => {
                    self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                }
                AuditCommand::Flush(done) | AuditCommand::Shutdown(done) => {
                    let _ = done.send(());
                }
            }
        }

        info!(stats = ?self.counters.snapshot(), "audit writer stopped");
    }

    async fn write(&mut self, pending: PendingAuditEntry) {
        let created_at = self.next_created_at();
        let action = pending.action.clone();
        let result = match AuditLogEntry::new(
            pending.action,
            pending.user,
            pending.details,
            created_at,
        ) {
            Ok(entry) => self.repository.append_entry(entry).await,
            Err(error) => Err(error),
        };

        match result {
            Ok(()) => {
                self.counters.written.fetch_add(1, Ordering::Relaxed);
            }
            Err(error) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                error!(%error, action = action.as_str(), "failed to persist audit entry");
            }
        }
    }

    /// Strictly increasing at microsecond granularity, the precision storage keeps.
    fn next_created_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now()
            .duration_trunc(TimeDelta::microseconds(1))
            .unwrap_or_else(|_| Utc::now());
        let created_at = match self.last_created_at {
            Some(last) if now <= last => last + TimeDelta::microseconds(1),
            _ => now,
        };
        self.last_created_at = Some(created_at);
        created_at
    }
}

/// Shared control surface of a running audit writer.
#[derive(Clone)]
pub struct AuditWriterHandle {
    sender: mpsc::Sender<AuditCommand>,
    counters: Arc<AuditCounters>,
    enqueue_timeout: Duration,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl AuditWriterHandle {
    /// Creates an event subscriber feeding this writer.
    #[must_use]
    pub fn listener(&self) -> AuditListener {
        AuditListener::new(
            self.sender.clone(),
            self.counters.clone(),
            self.enqueue_timeout,
        )
    }

    /// Returns current counters.
    #[must_use]
    pub fn stats(&self) -> AuditWriterStats {
        self.counters.snapshot()
    }

    /// Waits until every entry queued before this call has been processed.
    pub async fn flush(&self) -> AppResult<()> {
        let (done, processed) = oneshot::channel();
        self.sender
            .send(AuditCommand::Flush(done))
            .await
            .map_err(|_| AppError::Internal("audit writer has stopped".to_owned()))?;

        processed
            .await
            .map_err(|_| AppError::Internal("audit writer stopped before flushing".to_owned()))
    }

    /// Drains the queue and stops the writer. Later events are counted as dropped.
    pub async fn shutdown(&self) -> AppResult<()> {
        let Some(task) = self.task.lock().await.take() else {
            return Ok(());
        };

        let (done, processed) = oneshot::channel();
        self.sender
            .send(AuditCommand::Shutdown(done))
            .await
            .map_err(|_| AppError::Internal("audit writer has stopped".to_owned()))?;
        processed
            .await
            .map_err(|_| AppError::Internal("audit writer stopped before draining".to_owned()))?;

        task.await
            .map_err(|error| AppError::Internal(format!("audit writer task failed: {error}")))
    }
}
