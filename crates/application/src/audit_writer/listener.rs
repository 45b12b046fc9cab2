use async_trait::async_trait;
use tokio::sync::mpsc::error::SendTimeoutError;
use tracing::warn;

use super::*;
use crate::{DomainEvent, EventSubscriber};

/// Catch-all subscriber that turns qualifying events into queued audit entries.
///
/// An event qualifies when its payload is a JSON object with a `user` or `details` key,
/// even if the value is null. Everything else is ignored.
#[derive(Clone)]
pub struct AuditListener {
    sender: mpsc::Sender<AuditCommand>,
    counters: Arc<AuditCounters>,
    enqueue_timeout: Duration,
}

impl AuditListener {
    pub(super) fn new(
        sender: mpsc::Sender<AuditCommand>,
        counters: Arc<AuditCounters>,
        enqueue_timeout: Duration,
    ) -> Self {
        Self {
            sender,
            counters,
            enqueue_timeout,
        }
    }

    fn pending_entry(event: &DomainEvent) -> Option<PendingAuditEntry> {
        let payload = event.payload()?.as_object()?;
        if !payload.contains_key("user") && !payload.contains_key("details") {
            return None;
        }

        Some(PendingAuditEntry {
            action: event.name().to_owned(),
            user: payload.get("user").cloned(),
            details: payload.get("details").cloned(),
        })
    }
}

#[async_trait]
impl EventSubscriber for AuditListener {
    async fn handle(&self, event: &DomainEvent) {
        let Some(pending) = Self::pending_entry(event) else {
            return;
        };

        match self
            .sender
            .send_timeout(AuditCommand::Append(pending), self.enqueue_timeout)
            .await
        {
            Ok(()) => {}
            Err(SendTimeoutError::Timeout(_)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(action = event.name(), "audit queue full, dropping entry");
            }
            Err(SendTimeoutError::Closed(_)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    action = event.name(),
                    "audit writer stopped, dropping entry"
                );
            }
        }
    }
}
