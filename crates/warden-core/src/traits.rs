use crate::{
    contact::{ContactRecord, GroupMember},
    error::WardenError,
    outcome::{BridgeOutcome, RemovalResult, Summary},
};
use async_trait::async_trait;
use std::time::Duration;

/// Bridge trait: the only way out to the messaging platform.
///
/// Implemented over HTTP by `warden-bridge`; tests use in-memory doubles.
#[async_trait]
pub trait Bridge: Send + Sync {
    /// Remove one participant from a group. Never retries.
    async fn remove_participant(&self, group_jid: &str, participant_jid: &str) -> BridgeOutcome;

    /// List the members of a group.
    async fn group_members(&self, group_jid: &str) -> Result<Vec<GroupMember>, WardenError>;

    /// Send a text message to a chat.
    async fn send_message(&self, recipient: &str, text: &str) -> BridgeOutcome;
}

/// Operator decision at a batch checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    SkipBatch,
    Quit,
}

/// What the operator is asked to approve.
#[derive(Debug, Clone, Copy)]
pub struct BatchPreview<'a> {
    pub group_jid: &'a str,
    /// 1-based.
    pub batch_number: usize,
    pub total_batches: usize,
    pub contacts: &'a [ContactRecord],
    pub delay: Duration,
}

/// Approval checkpoint between batches.
#[async_trait]
pub trait ApprovalPort: Send {
    /// Ask whether to run, skip, or stop at this batch.
    async fn ask(&mut self, preview: &BatchPreview<'_>) -> Decision;
}

/// Planning numbers for one group, reported before the first batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOverview {
    pub group_jid: String,
    pub total: usize,
    pub removable: usize,
    pub protected: usize,
    pub batches: usize,
    pub batch_size: usize,
}

/// Sink for progress of a removal run or a broadcast.
///
/// Every method has a no-op default so observers only implement what they show.
pub trait RunObserver: Send + Sync {
    fn on_plan(&self, _overview: &PlanOverview) {}

    fn on_batch_start(&self, _preview: &BatchPreview<'_>) {}

    /// A removal is about to be sent (`index` is 1-based within the batch).
    fn on_removing(&self, _index: usize, _batch_len: usize, _contact: &ContactRecord) {}

    /// A result was recorded, attempted or skipped.
    fn on_result(&self, _result: &RemovalResult) {}

    fn on_delay(&self, _delay: Duration) {}

    fn on_batch_skipped(&self, _preview: &BatchPreview<'_>) {}

    fn on_batch_done(&self, _batch_number: usize, _summary: &Summary) {}

    fn on_cancelled(&self, _group_jid: &str) {}

    fn on_group_done(&self, _group_jid: &str, _summary: &Summary) {}

    /// A broadcast message is about to be sent (`index` is 1-based).
    fn on_sending(&self, _index: usize, _total: usize, _recipient: &str) {}

    fn on_sent(&self, _recipient: &str, _outcome: &BridgeOutcome) {}
}

/// Observer that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl RunObserver for SilentObserver {}
