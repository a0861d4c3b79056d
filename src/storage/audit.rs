// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit logging for security-sensitive operations.
//!
//! Uploads, mints, grants, access decisions and creator edits are appended to
//! a daily JSONL file under `audit/{date}/events.jsonl`.

use std::fs::{self, OpenOptions};
use std::io::Write;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::StoragePaths;

/// Types of auditable events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    // Content lifecycle
    ContentUploaded,
    ContentMinted,
    ContentUpdated,
    ContentDeleted,

    // Grants
    GrantRecorded,

    // Access
    AccessGranted,
    AccessDenied,
    AccessTokenIssued,
    FileDownloaded,
}

/// An audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Type of event.
    pub event_type: AuditEventType,
    /// Wallet that triggered the event (if known).
    pub wallet_address: Option<String>,
    /// Content affected.
    pub content_id: Option<String>,
    /// Additional details as JSON.
    pub details: Option<serde_json::Value>,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error code if the operation failed.
    pub error: Option<String>,
}

impl AuditEvent {
    /// Create a new audit event.
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            wallet_address: None,
            content_id: None,
            details: None,
            success: true,
            error: None,
        }
    }

    /// Set the acting wallet.
    pub fn with_wallet(mut self, wallet_address: impl Into<String>) -> Self {
        self.wallet_address = Some(wallet_address.into());
        self
    }

    /// Set the affected content.
    pub fn with_content(mut self, content_id: impl Into<String>) -> Self {
        self.content_id = Some(content_id.into());
        self
    }

    /// Add details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Mark as failed with an error code.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("invalid date: {0}")]
    InvalidDate(String),
}

pub type AuditResult<T> = Result<T, AuditError>;

/// Append-only JSONL audit log.
#[derive(Debug, Clone)]
pub struct AuditLog {
    paths: StoragePaths,
}

impl AuditLog {
    pub fn new(paths: StoragePaths) -> Self {
        Self { paths }
    }

    /// Append an event to its day's file.
    pub fn log(&self, event: &AuditEvent) -> AuditResult<()> {
        let date = event.timestamp.format("%Y-%m-%d").to_string();
        let path = self.paths.audit_events_file(&date);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(&line)?;
        Ok(())
    }

    /// Log an event; failures are reported via tracing only.
    pub fn record(&self, event: AuditEvent) {
        if let Err(e) = self.log(&event) {
            tracing::warn!(
                error = %e,
                event_type = ?event.event_type,
                "failed to write audit event"
            );
        }
    }

    /// Read audit events for a specific date (`YYYY-MM-DD`).
    pub fn read_events(&self, date: &str) -> AuditResult<Vec<AuditEvent>> {
        let path = self.paths.audit_events_file(date);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(AuditError::from))
            .collect()
    }

    /// Read events for an inclusive date range.
    pub fn read_events_range(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> AuditResult<Vec<AuditEvent>> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| AuditError::InvalidDate(format!("{s}: {e}")))
        };
        let start = parse(start_date)?;
        let end = parse(end_date)?;

        let mut all_events = Vec::new();
        for day in start.iter_days().take_while(|d| *d <= end) {
            all_events.extend(self.read_events(&day.format("%Y-%m-%d").to_string())?);
        }
        Ok(all_events)
    }

    /// Events of one day that concern `content_id`.
    pub fn search_by_content(&self, content_id: &str, date: &str) -> AuditResult<Vec<AuditEvent>> {
        Ok(self
            .read_events(date)?
            .into_iter()
            .filter(|e| e.content_id.as_deref() == Some(content_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, AuditLog) {
        let temp = TempDir::new().unwrap();
        let log = AuditLog::new(StoragePaths::new(temp.path()));
        (temp, log)
    }

    fn today() -> String {
        Utc::now().format("%Y-%m-%d").to_string()
    }

    #[test]
    fn create_audit_event() {
        let event = AuditEvent::new(AuditEventType::ContentUploaded)
            .with_wallet("wallet_123")
            .with_content("content_abc");

        assert_eq!(event.event_type, AuditEventType::ContentUploaded);
        assert_eq!(event.wallet_address.as_deref(), Some("wallet_123"));
        assert_eq!(event.content_id.as_deref(), Some("content_abc"));
        assert!(event.success);
    }

    #[test]
    fn failed_event() {
        let event = AuditEvent::new(AuditEventType::AccessDenied)
            .with_wallet("wallet_123")
            .failed("access_refused");

        assert!(!event.success);
        assert_eq!(event.error.as_deref(), Some("access_refused"));
    }

    #[test]
    fn log_and_read_events() {
        let (_temp, log) = setup();

        log.log(
            &AuditEvent::new(AuditEventType::ContentUploaded)
                .with_wallet("w1")
                .with_content("c1"),
        )
        .unwrap();
        log.record(
            AuditEvent::new(AuditEventType::AccessGranted)
                .with_wallet("w2")
                .with_content("c1"),
        );

        let events = log.read_events(&today()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, AuditEventType::ContentUploaded);
        assert_eq!(events[1].event_type, AuditEventType::AccessGranted);
    }

    #[test]
    fn missing_day_is_empty() {
        let (_temp, log) = setup();
        assert!(log.read_events("2000-01-01").unwrap().is_empty());
    }

    #[test]
    fn search_by_content() {
        let (_temp, log) = setup();
        log.record(AuditEvent::new(AuditEventType::ContentMinted).with_content("target"));
        log.record(AuditEvent::new(AuditEventType::ContentMinted).with_content("other"));
        log.record(AuditEvent::new(AuditEventType::GrantRecorded).with_content("target"));

        let events = log.search_by_content("target", &today()).unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn range_spans_days_and_validates_dates() {
        let (_temp, log) = setup();
        log.record(AuditEvent::new(AuditEventType::ContentDeleted));

        let yesterday = (Utc::now() - chrono::Duration::days(1))
            .format("%Y-%m-%d")
            .to_string();
        let events = log.read_events_range(&yesterday, &today()).unwrap();
        assert_eq!(events.len(), 1);
        assert!(log.read_events_range(&yesterday, &yesterday).unwrap().is_empty());

        assert!(matches!(
            log.read_events_range("not-a-date", "2000-01-01"),
            Err(AuditError::InvalidDate(_))
        ));
    }
}
