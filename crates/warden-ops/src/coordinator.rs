//! Batch coordinator: drives removals with an operator checkpoint per batch.
//!
//! One logical task: calls to the bridge are strictly sequential and the
//! fixed delay between two removals is the only rate limit. Whitelisted
//! contacts are turned into skipped results during planning and never reach
//! the bridge. Per-contact failures are recorded and the batch goes on.

use std::time::Duration;
use tracing::{debug, info, warn};
use warden_core::{
    contact::ContactRecord,
    outcome::{RemovalResult, SkipReason, Summary},
    traits::{ApprovalPort, BatchPreview, Bridge, Decision, RunObserver},
};

use crate::plan::Plan;

/// Where the coordinator is in a group run. Batch numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Planning,
    AwaitingApproval(usize),
    Executing(usize),
    Done,
    Cancelled,
}

/// Everything recorded for one target group.
#[derive(Debug, Clone)]
pub struct GroupOutcome {
    pub group_jid: String,
    /// Final phase: `Done` or `Cancelled`.
    pub phase: Phase,
    /// Whitelisted contacts, skipped during planning.
    pub protected: Vec<RemovalResult>,
    /// Results of approved and operator-skipped batches, in order.
    pub processed: Vec<RemovalResult>,
}

impl GroupOutcome {
    pub fn is_cancelled(&self) -> bool {
        self.phase == Phase::Cancelled
    }

    /// Protected entries first, then processed ones.
    pub fn results(&self) -> impl Iterator<Item = &RemovalResult> {
        self.protected.iter().chain(self.processed.iter())
    }

    pub fn summary(&self) -> Summary {
        Summary::from_results(self.results())
    }
}

/// Outcomes of a run over one or more groups.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub groups: Vec<GroupOutcome>,
}

impl RunReport {
    /// Whether the operator quit before every group was handled.
    pub fn cancelled(&self) -> bool {
        self.groups.iter().any(GroupOutcome::is_cancelled)
    }

    pub fn summary(&self) -> Summary {
        let mut total = Summary::default();
        for g in &self.groups {
            total.merge(&g.summary());
        }
        total
    }
}

/// Approval-gated removal of planned contacts from groups.
pub struct BatchCoordinator<'a> {
    bridge: &'a dyn Bridge,
    approver: &'a mut dyn ApprovalPort,
    observer: &'a dyn RunObserver,
    delay: Duration,
    phase: Phase,
}

impl<'a> BatchCoordinator<'a> {
    pub fn new(
        bridge: &'a dyn Bridge,
        approver: &'a mut dyn ApprovalPort,
        observer: &'a dyn RunObserver,
        delay: Duration,
    ) -> Self {
        Self {
            bridge,
            approver,
            observer,
            delay,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn transition(&mut self, next: Phase) {
        debug!("coordinator: {:?} -> {:?}", self.phase, next);
        self.phase = next;
    }

    /// Run `plan` against every group in order.
    ///
    /// Groups are separated by twice the removal delay. Quitting stops the
    /// whole run; groups after the cancelled one are not touched.
    pub async fn run_groups(&mut self, groups: &[String], plan: &Plan) -> RunReport {
        let mut report = RunReport::default();
        for (i, group_jid) in groups.iter().enumerate() {
            if i > 0 {
                let pause = self.delay * 2;
                debug!("coordinator: pausing {pause:?} before next group");
                tokio::time::sleep(pause).await;
            }

            let outcome = self.run_group(group_jid, plan).await;
            let cancelled = outcome.is_cancelled();
            report.groups.push(outcome);
            if cancelled {
                let remaining = groups.len() - i - 1;
                if remaining > 0 {
                    warn!("coordinator: cancelled, {remaining} group(s) not processed");
                }
                break;
            }
        }
        report
    }

    /// Run `plan` against a single group.
    pub async fn run_group(&mut self, group_jid: &str, plan: &Plan) -> GroupOutcome {
        self.transition(Phase::Idle);
        self.transition(Phase::Planning);

        let overview = plan.overview(group_jid);
        info!(
            "coordinator: {group_jid}: {} contacts, {} removable, {} protected, {} batches",
            overview.total, overview.removable, overview.protected, overview.batches
        );
        self.observer.on_plan(&overview);

        let mut outcome = GroupOutcome {
            group_jid: group_jid.to_string(),
            phase: Phase::Planning,
            protected: Vec::with_capacity(plan.protected.len()),
            processed: Vec::with_capacity(plan.removable.len()),
        };
        for contact in &plan.protected {
            let result = RemovalResult::skipped(group_jid, &contact.jid, SkipReason::Whitelisted);
            self.observer.on_result(&result);
            outcome.protected.push(result);
        }

        let total_batches = plan.batch_count();
        for (i, batch) in plan.batches().enumerate() {
            let batch_number = i + 1;
            let preview = BatchPreview {
                group_jid,
                batch_number,
                total_batches,
                contacts: batch,
                delay: self.delay,
            };

            self.transition(Phase::AwaitingApproval(batch_number));
            match self.approver.ask(&preview).await {
                Decision::Proceed => {
                    self.transition(Phase::Executing(batch_number));
                    self.observer.on_batch_start(&preview);
                    let before = outcome.processed.len();
                    self.execute_batch(group_jid, batch, &mut outcome.processed)
                        .await;
                    let batch_summary = Summary::from_results(&outcome.processed[before..]);
                    self.observer.on_batch_done(batch_number, &batch_summary);
                }
                Decision::SkipBatch => {
                    info!("coordinator: {group_jid}: batch {batch_number} skipped by operator");
                    self.observer.on_batch_skipped(&preview);
                    for contact in batch {
                        let result =
                            RemovalResult::skipped(group_jid, &contact.jid, SkipReason::UserSkip);
                        self.observer.on_result(&result);
                        outcome.processed.push(result);
                    }
                }
                Decision::Quit => {
                    info!("coordinator: {group_jid}: cancelled at batch {batch_number}");
                    self.transition(Phase::Cancelled);
                    self.observer.on_cancelled(group_jid);
                    outcome.phase = Phase::Cancelled;
                    return outcome;
                }
            }
        }

        self.transition(Phase::Done);
        outcome.phase = Phase::Done;
        self.observer.on_group_done(group_jid, &outcome.summary());
        outcome
    }

    /// Remove every contact of an approved batch, in order.
    async fn execute_batch(
        &mut self,
        group_jid: &str,
        batch: &[ContactRecord],
        results: &mut Vec<RemovalResult>,
    ) {
        for (i, contact) in batch.iter().enumerate() {
            self.observer.on_removing(i + 1, batch.len(), contact);
            let outcome = self
                .bridge
                .remove_participant(group_jid, &contact.jid)
                .await;
            let result = RemovalResult::attempted(group_jid, &contact.jid, &outcome);
            self.observer.on_result(&result);
            results.push(result);

            if i + 1 < batch.len() {
                self.observer.on_delay(self.delay);
                tokio::time::sleep(self.delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests;
