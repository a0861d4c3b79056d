// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed challenge documents and the replay window.
//!
//! A challenge is the JSON document a wallet signs before asking for access:
//!
//! ```json
//! {"action":"verify_access","contentId":"…","timestamp":"2026-01-01T00:00:00.000Z","nonce":"k3x9a"}
//! ```
//!
//! Challenges are never stored. Replay protection is the time window alone:
//! the nonce is carried for the client's benefit but is not tracked.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Oldest acceptable challenge, in milliseconds before "now".
pub const MAX_CHALLENGE_AGE_MS: i64 = 30_000;

/// Furthest acceptable future-dated challenge, in milliseconds after "now".
pub const MAX_FUTURE_SKEW_MS: i64 = 5_000;

/// Action tags a challenge can authorize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeAction {
    /// Download / token issuance.
    VerifyAccess,
    /// Attach the required token to a pending upload.
    AttachToken,
    /// Creator metadata edit.
    UpdateContent,
    /// Creator deletion.
    DeleteContent,
}

impl ChallengeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeAction::VerifyAccess => "verify_access",
            ChallengeAction::AttachToken => "attach_token",
            ChallengeAction::UpdateContent => "update_content",
            ChallengeAction::DeleteContent => "delete_content",
        }
    }
}

/// Challenge timestamp: RFC 3339 text or Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChallengeTimestamp {
    Millis(i64),
    Text(String),
}

impl ChallengeTimestamp {
    fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            ChallengeTimestamp::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            ChallengeTimestamp::Text(text) => DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// A parsed challenge document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessChallenge {
    pub action: String,
    pub content_id: String,
    pub timestamp: ChallengeTimestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// Why a challenge could not be accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChallengeError {
    #[error("message is not a challenge document")]
    Malformed,

    #[error("challenge action {found:?} does not authorize {expected:?}")]
    WrongAction { expected: &'static str, found: String },

    #[error("challenge was issued for content {found}, not {expected}")]
    WrongContent { expected: String, found: String },

    #[error("challenge timestamp is not a valid instant")]
    InvalidTimestamp,

    #[error("challenge outside replay window (skew {skew_ms}ms)")]
    OutsideWindow { skew_ms: i64 },
}

impl AccessChallenge {
    /// Build a fresh challenge for `content_id` stamped at `now`.
    pub fn new(action: ChallengeAction, content_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        Self {
            action: action.as_str().to_string(),
            content_id: content_id.into(),
            timestamp: ChallengeTimestamp::Text(
                now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            ),
            nonce: Some(nonce[..8].to_string()),
        }
    }

    /// Parse the signed message text.
    pub fn parse(message: &str) -> Result<Self, ChallengeError> {
        serde_json::from_str(message).map_err(|_| ChallengeError::Malformed)
    }

    /// Serialize to the exact text a wallet signs.
    pub fn to_message(&self) -> String {
        // Serializing a struct of strings and integers cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Check the action tag and content binding.
    pub fn ensure_scope(
        &self,
        action: ChallengeAction,
        content_id: &str,
    ) -> Result<(), ChallengeError> {
        if self.action != action.as_str() {
            return Err(ChallengeError::WrongAction {
                expected: action.as_str(),
                found: self.action.clone(),
            });
        }
        if self.content_id != content_id {
            return Err(ChallengeError::WrongContent {
                expected: content_id.to_string(),
                found: self.content_id.clone(),
            });
        }
        Ok(())
    }

    /// Enforce the replay window; returns the measured skew on success.
    pub fn ensure_fresh(&self, now: DateTime<Utc>) -> Result<i64, ChallengeError> {
        let issued_at = self
            .timestamp
            .to_datetime()
            .ok_or(ChallengeError::InvalidTimestamp)?;
        check_window(issued_at, now)
    }
}

/// `now - issued_at` must fall within `[-MAX_FUTURE_SKEW_MS, MAX_CHALLENGE_AGE_MS]`.
///
/// The bounds are compared at full precision; the reported skew is truncated
/// to milliseconds.
pub fn check_window(issued_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<i64, ChallengeError> {
    let skew = now - issued_at;
    let skew_ms = skew.num_milliseconds();
    if skew > Duration::milliseconds(MAX_CHALLENGE_AGE_MS)
        || skew < -Duration::milliseconds(MAX_FUTURE_SKEW_MS)
    {
        return Err(ChallengeError::OutsideWindow { skew_ms });
    }
    Ok(skew_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn parses_wallet_message() {
        let message = r#"{"action":"verify_access","contentId":"c-1","timestamp":"2026-03-01T11:59:50.000Z","nonce":"k3x9a"}"#;
        let challenge = AccessChallenge::parse(message).unwrap();
        assert_eq!(challenge.content_id, "c-1");
        assert_eq!(challenge.nonce.as_deref(), Some("k3x9a"));
        assert_eq!(challenge.ensure_fresh(fixed_now()), Ok(10_000));
    }

    #[test]
    fn accepts_millisecond_timestamps() {
        let issued = fixed_now() - Duration::seconds(3);
        let message = format!(
            r#"{{"action":"verify_access","contentId":"c-1","timestamp":{}}}"#,
            issued.timestamp_millis()
        );
        let challenge = AccessChallenge::parse(&message).unwrap();
        assert_eq!(challenge.ensure_fresh(fixed_now()), Ok(3_000));
    }

    #[test]
    fn rejects_non_json() {
        assert_eq!(AccessChallenge::parse("hello"), Err(ChallengeError::Malformed));
        assert_eq!(AccessChallenge::parse("{}"), Err(ChallengeError::Malformed));
    }

    #[test]
    fn rejects_garbage_timestamp() {
        let challenge = AccessChallenge {
            action: "verify_access".into(),
            content_id: "c".into(),
            timestamp: ChallengeTimestamp::Text("yesterday".into()),
            nonce: None,
        };
        assert_eq!(
            challenge.ensure_fresh(fixed_now()),
            Err(ChallengeError::InvalidTimestamp)
        );
    }

    #[test]
    fn window_boundaries() {
        let now = fixed_now();

        assert!(check_window(now - Duration::milliseconds(30_000), now).is_ok());
        assert_eq!(
            check_window(now - Duration::milliseconds(30_001), now),
            Err(ChallengeError::OutsideWindow { skew_ms: 30_001 })
        );

        assert!(check_window(now + Duration::milliseconds(4_999), now).is_ok());
        assert!(check_window(now + Duration::milliseconds(5_000), now).is_ok());
        assert_eq!(
            check_window(now + Duration::milliseconds(5_001), now),
            Err(ChallengeError::OutsideWindow { skew_ms: -5_001 })
        );
    }

    #[test]
    fn window_edges_are_exact_below_a_millisecond() {
        let now = fixed_now();

        assert_eq!(
            check_window(now - Duration::microseconds(30_000_900), now),
            Err(ChallengeError::OutsideWindow { skew_ms: 30_000 })
        );
        assert_eq!(
            check_window(now + Duration::microseconds(5_000_900), now),
            Err(ChallengeError::OutsideWindow { skew_ms: -5_000 })
        );
        assert_eq!(
            check_window(now - Duration::microseconds(29_999_900), now),
            Ok(29_999)
        );
    }

    #[test]
    fn scope_checks_action_and_content() {
        let challenge = AccessChallenge::new(ChallengeAction::VerifyAccess, "c-1", fixed_now());

        assert!(challenge.ensure_scope(ChallengeAction::VerifyAccess, "c-1").is_ok());
        assert!(matches!(
            challenge.ensure_scope(ChallengeAction::DeleteContent, "c-1"),
            Err(ChallengeError::WrongAction { .. })
        ));
        assert!(matches!(
            challenge.ensure_scope(ChallengeAction::VerifyAccess, "c-2"),
            Err(ChallengeError::WrongContent { .. })
        ));
    }

    #[test]
    fn built_challenge_round_trips_through_message_text() {
        let challenge = AccessChallenge::new(ChallengeAction::UpdateContent, "c-9", fixed_now());
        let parsed = AccessChallenge::parse(&challenge.to_message()).unwrap();
        assert_eq!(parsed, challenge);
        assert_eq!(parsed.ensure_fresh(fixed_now()), Ok(0));
    }
}
