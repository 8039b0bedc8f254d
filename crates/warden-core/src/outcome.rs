//! Outcomes of bridge calls and the per-contact results of a removal run.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of a single call to the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeOutcome {
    /// The bridge acknowledged the operation.
    Success { message: String },
    /// The bridge answered but refused, either with a non-success status
    /// or an explicit `success: false` payload.
    Rejected {
        status: Option<u16>,
        message: String,
    },
    /// The bridge could not be reached (connection failure or timeout).
    Unreachable { message: String },
}

impl BridgeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success { message }
            | Self::Rejected { message, .. }
            | Self::Unreachable { message } => message,
        }
    }
}

/// Why a contact was not sent to the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Whitelisted,
    UserSkip,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Whitelisted => "whitelisted",
            Self::UserSkip => "user_skip",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of one attempted or explicitly skipped removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalResult {
    pub jid: String,
    pub group_jid: String,
    pub success: bool,
    pub message: String,
    pub skipped: bool,
    pub skip_reason: Option<SkipReason>,
    pub error_code: Option<String>,
    pub timestamp: DateTime<Local>,
}

impl RemovalResult {
    /// Build the record for a removal that reached the bridge.
    pub fn attempted(group_jid: &str, jid: &str, outcome: &BridgeOutcome) -> Self {
        let error_code = match outcome {
            BridgeOutcome::Rejected {
                status: Some(code), ..
            } => Some(code.to_string()),
            _ => None,
        };
        Self {
            jid: jid.to_string(),
            group_jid: group_jid.to_string(),
            success: outcome.is_success(),
            message: outcome.message().to_string(),
            skipped: false,
            skip_reason: None,
            error_code,
            timestamp: Local::now(),
        }
    }

    /// Build the record for a contact that never reached the bridge.
    pub fn skipped(group_jid: &str, jid: &str, reason: SkipReason) -> Self {
        let message = match reason {
            SkipReason::Whitelisted => "Skipped - contact is whitelisted",
            SkipReason::UserSkip => "Skipped by user",
        };
        Self {
            jid: jid.to_string(),
            group_jid: group_jid.to_string(),
            success: false,
            message: message.to_string(),
            skipped: true,
            skip_reason: Some(reason),
            error_code: None,
            timestamp: Local::now(),
        }
    }

    /// A result that neither succeeded nor was skipped.
    pub fn is_failure(&self) -> bool {
        !self.success && !self.skipped
    }
}

/// Tallies over a set of results.
///
/// User-skipped contacts only count as skipped, never as failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub successful: usize,
    pub failed: usize,
    pub whitelisted: usize,
    pub user_skipped: usize,
}

impl Summary {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a RemovalResult>) -> Self {
        let mut summary = Self::default();
        for r in results {
            summary.record(r);
        }
        summary
    }

    pub fn record(&mut self, result: &RemovalResult) {
        match (result.success, result.skip_reason) {
            (true, _) => self.successful += 1,
            (false, Some(SkipReason::Whitelisted)) => self.whitelisted += 1,
            (false, Some(SkipReason::UserSkip)) => self.user_skipped += 1,
            (false, None) => self.failed += 1,
        }
    }

    pub fn skipped(&self) -> usize {
        self.whitelisted + self.user_skipped
    }

    pub fn total(&self) -> usize {
        self.successful + self.failed + self.skipped()
    }

    pub fn merge(&mut self, other: &Summary) {
        self.successful += other.successful;
        self.failed += other.failed;
        self.whitelisted += other.whitelisted;
        self.user_skipped += other.user_skipped;
    }
}
