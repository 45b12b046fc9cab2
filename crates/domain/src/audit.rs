use chrono::{DateTime, SecondsFormat, Utc};
use quire_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::Record;

/// Resource type under which audit entries are listed.
pub const AUDIT_LOG_RESOURCE_TYPE: &str = "audit_log";

/// One persisted, immutable audit trail entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    entry_id: Uuid,
    action: String,
    user: Option<Value>,
    details: Option<Value>,
    created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    /// Creates an entry with a fresh identifier.
    pub fn new(
        action: impl Into<String>,
        user: Option<Value>,
        details: Option<Value>,
        created_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        Self::restore(Uuid::new_v4(), action, user, details, created_at)
    }

    /// Rebuilds an entry loaded from storage.
    pub fn restore(
        entry_id: Uuid,
        action: impl Into<String>,
        user: Option<Value>,
        details: Option<Value>,
        created_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        let action = action.into();
        if action.trim().is_empty() {
            return Err(AppError::Validation(
                "audit action must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            entry_id,
            action,
            user: user.filter(|value| !value.is_null()),
            details: details.filter(|value| !value.is_null()),
            created_at,
        })
    }

    /// Returns the entry identifier.
    #[must_use]
    pub fn entry_id(&self) -> Uuid {
        self.entry_id
    }

    /// Returns the event name that produced this entry.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action.as_str()
    }

    /// Returns the acting user reference, when one was broadcast.
    #[must_use]
    pub fn user(&self) -> Option<&Value> {
        self.user.as_ref()
    }

    /// Returns the broadcast details, when present.
    #[must_use]
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Returns the write timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Projects the entry into a queryable record.
    pub fn to_record(&self) -> AppResult<Record> {
        Record::new(
            self.entry_id.to_string(),
            AUDIT_LOG_RESOURCE_TYPE,
            json!({
                "action": self.action,
                "user": self.user,
                "details": self.details,
                "created_at": self.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            }),
        )
    }
}

impl TryFrom<&Record> for AuditLogEntry {
    type Error = AppError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        let entry_id = Uuid::parse_str(record.record_id().as_str()).map_err(|error| {
            AppError::Internal(format!("invalid audit entry id: {error}"))
        })?;
        let action = record
            .field("action")
            .and_then(|value| value.as_str().map(str::to_owned))
            .ok_or_else(|| AppError::Internal("audit record is missing its action".to_owned()))?;
        let created_at = record
            .field("created_at")
            .and_then(|value| value.as_str().map(str::to_owned))
            .ok_or_else(|| {
                AppError::Internal("audit record is missing its timestamp".to_owned())
            })
            .and_then(|value| {
                DateTime::parse_from_rfc3339(value.as_str())
                    .map(|timestamp| timestamp.with_timezone(&Utc))
                    .map_err(|error| {
                        AppError::Internal(format!("invalid audit timestamp: {error}"))
                    })
            })?;

        Self::restore(
            entry_id,
            action,
            record.field("user"),
            record.field("details"),
            created_at,
        )
    }
}
