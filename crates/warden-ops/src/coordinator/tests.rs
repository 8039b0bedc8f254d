use super::*;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use warden_core::{
    contact::GroupMember, error::WardenError, outcome::BridgeOutcome, whitelist::Whitelist,
};

const GROUP_A: &str = "120363315467665376@g.us";
const GROUP_B: &str = "120363385526179109@g.us";
const DELAY: Duration = Duration::from_secs(2);

/// Bridge double: records every removal and answers from a script.
#[derive(Default)]
struct RecordingBridge {
    calls: Mutex<Vec<(String, String)>>,
    failures: HashMap<String, BridgeOutcome>,
}

impl RecordingBridge {
    fn failing(jid: &str, outcome: BridgeOutcome) -> Self {
        Self {
            failures: HashMap::from([(jid.to_string(), outcome)]),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    fn called_jids(&self) -> Vec<String> {
        self.calls().into_iter().map(|(_, jid)| jid).collect()
    }
}

#[async_trait]
impl Bridge for RecordingBridge {
    async fn remove_participant(&self, group_jid: &str, participant_jid: &str) -> BridgeOutcome {
        self.calls
            .lock()
            .unwrap()
            .push((group_jid.to_string(), participant_jid.to_string()));
        self.failures
            .get(participant_jid)
            .cloned()
            .unwrap_or(BridgeOutcome::Success {
                message: "Successfully removed from group".into(),
            })
    }

    async fn group_members(&self, _group_jid: &str) -> Result<Vec<GroupMember>, WardenError> {
        Ok(Vec::new())
    }

    async fn send_message(&self, _recipient: &str, _text: &str) -> BridgeOutcome {
        BridgeOutcome::Success {
            message: "sent".into(),
        }
    }
}

/// Approver double: answers from a script, then quits.
struct ScriptedApprover {
    answers: VecDeque<Decision>,
    asked: Vec<(String, usize, usize, usize)>,
}

impl ScriptedApprover {
    fn new(answers: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }
}

#[async_trait]
impl ApprovalPort for ScriptedApprover {
    async fn ask(&mut self, preview: &BatchPreview<'_>) -> Decision {
        self.asked.push((
            preview.group_jid.to_string(),
            preview.batch_number,
            preview.total_batches,
            preview.contacts.len(),
        ));
        self.answers.pop_front().unwrap_or(Decision::Quit)
    }
}

/// Observer double: keeps a flat log of events.
#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl RunObserver for RecordingObserver {
    fn on_plan(&self, o: &warden_core::traits::PlanOverview) {
        self.push(format!("plan {} {}/{}", o.group_jid, o.removable, o.protected));
    }
    fn on_result(&self, r: &RemovalResult) {
        self.push(format!("result {} {}", r.jid, r.success));
    }
    fn on_delay(&self, d: Duration) {
        self.push(format!("delay {}", d.as_secs()));
    }
    fn on_batch_skipped(&self, p: &BatchPreview<'_>) {
        self.push(format!("skipped batch {}", p.batch_number));
    }
    fn on_cancelled(&self, group_jid: &str) {
        self.push(format!("cancelled {group_jid}"));
    }
}

fn contacts(n: usize) -> Vec<ContactRecord> {
    (0..n)
        .map(|i| ContactRecord::new(format!("97250000{i:04}@s.whatsapp.net")))
        .collect()
}

fn plan(contacts: &[ContactRecord], whitelist: &Whitelist, k: usize) -> Plan {
    Plan::build(contacts, whitelist, k).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_whitelisted_never_reach_bridge() {
    let input = contacts(25);
    let whitelist: Whitelist = [&input[3].jid, &input[10].jid, &input[20].jid]
        .into_iter()
        .cloned()
        .collect();
    let plan = plan(&input, &whitelist, 10);

    let bridge = RecordingBridge::default();
    let mut approver = ScriptedApprover::new([Decision::Proceed; 3]);
    let observer = RecordingObserver::default();
    let outcome = BatchCoordinator::new(&bridge, &mut approver, &observer, DELAY)
        .run_group(GROUP_A, &plan)
        .await;

    assert_eq!(outcome.phase, Phase::Done);
    assert_eq!(bridge.calls().len(), 22);
    let called = bridge.called_jids();
    for jid in whitelist.iter() {
        assert!(!called.iter().any(|c| c == jid), "{jid} reached the bridge");
    }

    assert_eq!(outcome.protected.len(), 3);
    assert!(outcome
        .protected
        .iter()
        .all(|r| r.skipped && r.skip_reason == Some(SkipReason::Whitelisted)));

    let batch_sizes: Vec<_> = approver.asked.iter().map(|a| a.3).collect();
    assert_eq!(batch_sizes, vec![10, 10, 2]);

    let summary = outcome.summary();
    assert_eq!(summary.successful, 22);
    assert_eq!(summary.whitelisted, 3);
    assert_eq!(summary.failed, 0);
}

#[tokio::test(start_paused = true)]
async fn test_all_whitelisted_short_circuits() {
    let input = contacts(4);
    let whitelist: Whitelist = input.iter().map(|c| c.jid.clone()).collect();
    let plan = plan(&input, &whitelist, 10);

    let bridge = RecordingBridge::default();
    let mut approver = ScriptedApprover::new(Vec::new());
    let observer = RecordingObserver::default();
    let mut coordinator = BatchCoordinator::new(&bridge, &mut approver, &observer, DELAY);
    let outcome = coordinator.run_group(GROUP_A, &plan).await;
    assert_eq!(coordinator.phase(), Phase::Done);
    drop(coordinator);

    assert_eq!(outcome.phase, Phase::Done);
    assert!(approver.asked.is_empty());
    assert!(bridge.calls().is_empty());
    assert!(outcome.processed.is_empty());
    assert_eq!(outcome.summary().whitelisted, 4);
}

#[tokio::test(start_paused = true)]
async fn test_quit_at_second_batch_keeps_first_batch_only() {
    let input = contacts(25);
    let plan = plan(&input, &Whitelist::default(), 10);

    let bridge = RecordingBridge::default();
    let mut approver = ScriptedApprover::new([Decision::Proceed, Decision::Quit]);
    let observer = RecordingObserver::default();
    let mut coordinator = BatchCoordinator::new(&bridge, &mut approver, &observer, DELAY);
    let outcome = coordinator.run_group(GROUP_A, &plan).await;
    assert_eq!(coordinator.phase(), Phase::Cancelled);
    drop(coordinator);

    assert!(outcome.is_cancelled());
    assert_eq!(outcome.processed.len(), 10);
    let processed: Vec<_> = outcome.processed.iter().map(|r| r.jid.clone()).collect();
    let first_batch: Vec<_> = input[..10].iter().map(|c| c.jid.clone()).collect();
    assert_eq!(processed, first_batch);
    assert_eq!(bridge.calls().len(), 10);
    assert_eq!(approver.asked.len(), 2);
    assert!(observer
        .events()
        .contains(&format!("cancelled {GROUP_A}")));
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_mid_batch_continues() {
    let input = contacts(3);
    let plan = plan(&input, &Whitelist::default(), 10);

    let bridge = RecordingBridge::failing(
        &input[1].jid,
        BridgeOutcome::Unreachable {
            message: "Request failed: connection refused".into(),
        },
    );
    let mut approver = ScriptedApprover::new([Decision::Proceed]);
    let observer = RecordingObserver::default();

    let start = tokio::time::Instant::now();
    let outcome = BatchCoordinator::new(&bridge, &mut approver, &observer, DELAY)
        .run_group(GROUP_A, &plan)
        .await;
    let elapsed = start.elapsed();

    let failed = &outcome.processed[1];
    assert!(!failed.success);
    assert!(!failed.skipped);
    assert_eq!(failed.message, "Request failed: connection refused");
    let expected: Vec<_> = input.iter().map(|c| c.jid.clone()).collect();
    assert_eq!(bridge.called_jids(), expected);
    assert!(outcome.processed[2].success);

    // Delay between each pair of calls, none after the last.
    let events = observer.events();
    let failed_at = events
        .iter()
        .position(|e| e == &format!("result {} false", input[1].jid))
        .unwrap();
    assert_eq!(events[failed_at + 1], "delay 2");
    assert_eq!(events.iter().filter(|e| *e == "delay 2").count(), 2);
    assert!(elapsed >= Duration::from_secs(4));
    assert!(elapsed < Duration::from_secs(5));

    let summary = outcome.summary();
    assert_eq!((summary.successful, summary.failed), (2, 1));
}

#[tokio::test(start_paused = true)]
async fn test_rejected_keeps_bridge_message() {
    let input = contacts(2);
    let plan = plan(&input, &Whitelist::default(), 10);
    let bridge = RecordingBridge::failing(
        &input[0].jid,
        BridgeOutcome::Rejected {
            status: Some(500),
            message: "HTTP 500: not a group admin".into(),
        },
    );
    let mut approver = ScriptedApprover::new([Decision::Proceed]);
    let observer = RecordingObserver::default();
    let outcome = BatchCoordinator::new(&bridge, &mut approver, &observer, DELAY)
        .run_group(GROUP_A, &plan)
        .await;

    assert_eq!(outcome.processed[0].message, "HTTP 500: not a group admin");
    assert_eq!(outcome.processed[0].error_code.as_deref(), Some("500"));
    assert!(outcome.processed[1].success);
}

#[tokio::test(start_paused = true)]
async fn test_skip_batch_records_user_skip_without_calls() {
    let input = contacts(15);
    let plan = plan(&input, &Whitelist::default(), 10);

    let bridge = RecordingBridge::default();
    let mut approver = ScriptedApprover::new([Decision::SkipBatch, Decision::Proceed]);
    let observer = RecordingObserver::default();
    let outcome = BatchCoordinator::new(&bridge, &mut approver, &observer, DELAY)
        .run_group(GROUP_A, &plan)
        .await;

    assert_eq!(outcome.phase, Phase::Done);
    assert_eq!(outcome.processed.len(), 15);
    assert!(outcome.processed[..10]
        .iter()
        .all(|r| r.skipped && r.skip_reason == Some(SkipReason::UserSkip)));
    let second_batch: Vec<_> = input[10..].iter().map(|c| c.jid.clone()).collect();
    assert_eq!(bridge.called_jids(), second_batch);
    assert!(observer.events().contains(&"skipped batch 1".to_string()));

    let summary = outcome.summary();
    assert_eq!(summary.user_skipped, 10);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.successful, 5);
}

#[tokio::test(start_paused = true)]
async fn test_run_groups_processes_each_group_in_order() {
    let input = contacts(2);
    let plan = plan(&input, &Whitelist::default(), 10);
    let groups = vec![GROUP_A.to_string(), GROUP_B.to_string()];

    let bridge = RecordingBridge::default();
    let mut approver = ScriptedApprover::new([Decision::Proceed, Decision::Proceed]);
    let observer = RecordingObserver::default();

    let start = tokio::time::Instant::now();
    let report = BatchCoordinator::new(&bridge, &mut approver, &observer, DELAY)
        .run_groups(&groups, &plan)
        .await;
    let elapsed = start.elapsed();

    assert!(!report.cancelled());
    assert_eq!(report.groups.len(), 2);
    let call_groups: Vec<_> = bridge.calls().into_iter().map(|(g, _)| g).collect();
    assert_eq!(call_groups, vec![GROUP_A, GROUP_A, GROUP_B, GROUP_B]);
    assert_eq!(report.summary().successful, 4);
    // One delay inside each group plus the pause between groups.
    assert!(elapsed >= Duration::from_secs(8));
    assert!(elapsed < Duration::from_secs(9));
}

#[tokio::test(start_paused = true)]
async fn test_quit_stops_remaining_groups() {
    let input = contacts(12);
    let plan = plan(&input, &Whitelist::default(), 10);
    let groups = vec![GROUP_A.to_string(), GROUP_B.to_string()];

    let bridge = RecordingBridge::default();
    let mut approver = ScriptedApprover::new([Decision::Proceed, Decision::Quit]);
    let observer = RecordingObserver::default();
    let report = BatchCoordinator::new(&bridge, &mut approver, &observer, DELAY)
        .run_groups(&groups, &plan)
        .await;

    assert!(report.cancelled());
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].processed.len(), 10);
    assert!(approver.asked.iter().all(|a| a.0 == GROUP_A));
    assert!(bridge.calls().iter().all(|(g, _)| g == GROUP_A));
}

#[tokio::test(start_paused = true)]
async fn test_preview_carries_batch_position_and_delay() {
    let input = contacts(21);
    let plan = plan(&input, &Whitelist::default(), 10);
    let bridge = RecordingBridge::default();
    let mut approver = ScriptedApprover::new([Decision::SkipBatch; 3]);
    BatchCoordinator::new(&bridge, &mut approver, &RecordingObserver::default(), DELAY)
        .run_group(GROUP_B, &plan)
        .await;

    assert_eq!(
        approver.asked,
        vec![
            (GROUP_B.to_string(), 1, 3, 10),
            (GROUP_B.to_string(), 2, 3, 10),
            (GROUP_B.to_string(), 3, 3, 1),
        ]
    );
    assert!(bridge.calls().is_empty());
}
