//! Operator prompts: batch approval, the START gate, and run progress with cliclack styled output.

use async_trait::async_trait;
use console::style;
use std::time::Duration;
use warden_core::{
    contact::ContactRecord,
    outcome::{BridgeOutcome, RemovalResult, Summary},
    traits::{ApprovalPort, BatchPreview, Decision, PlanOverview, RunObserver},
};

/// Word the operator must type before anything is sent to the bridge.
pub const START_WORD: &str = "START";

/// Interactive approver. Any prompt failure (closed stdin, Ctrl-C) quits.
pub struct ConsoleApprover;

#[async_trait]
impl ApprovalPort for ConsoleApprover {
    async fn ask(&mut self, preview: &BatchPreview<'_>) -> Decision {
        let title = format!(
            "Batch {}/{} ({} contacts)",
            preview.batch_number,
            preview.total_batches,
            preview.contacts.len()
        );
        if cliclack::note(title, preview_lines(preview)).is_err() {
            return Decision::Quit;
        }

        cliclack::select("Remove this batch?")
            .item(Decision::Proceed, "Proceed", "remove every contact above")
            .item(Decision::SkipBatch, "Skip", "leave this batch, continue with the next")
            .item(Decision::Quit, "Quit", "stop here, save results so far")
            .interact()
            .unwrap_or(Decision::Quit)
    }
}

/// Numbered contact lines for a batch preview. Admins are flagged.
pub fn preview_lines(preview: &BatchPreview<'_>) -> String {
    let mut lines: Vec<String> = preview
        .contacts
        .iter()
        .enumerate()
        .map(|(i, c)| contact_line(i + 1, c))
        .collect();
    lines.push(String::new());
    lines.push(format!(
        "Group: {}  Delay: {}s between removals",
        preview.group_jid,
        preview.delay.as_secs()
    ));
    lines.join("\n")
}

fn contact_line(index: usize, contact: &ContactRecord) -> String {
    let admin = if contact.is_any_admin() { " [ADMIN]" } else { "" };
    format!(
        "{index:>3}. {} ({}){admin}",
        contact.display_name(),
        contact.jid
    )
}

/// Show the removal plan and ask for [`START_WORD`]. Anything else aborts.
pub fn confirm_start(overview: &PlanOverview, groups: usize) -> anyhow::Result<bool> {
    let plan = format!(
        "Groups: {groups}\nContacts: {}\nTo remove: {}\nWhitelisted: {}\n\
         Batches per group: {} of up to {}",
        overview.total,
        overview.removable,
        overview.protected,
        overview.batches,
        overview.batch_size
    );
    cliclack::note("Removal plan", plan)?;
    ask_start()
}

/// Show the message and pacing of a broadcast and ask for [`START_WORD`].
pub fn confirm_broadcast(
    message: &str,
    recipients: usize,
    delay: Duration,
) -> anyhow::Result<bool> {
    cliclack::note("Message", message)?;
    cliclack::log::info(format!(
        "{recipients} recipients, {}s between messages",
        delay.as_secs()
    ))?;
    ask_start()
}

fn ask_start() -> anyhow::Result<bool> {
    let answer: String = cliclack::input(format!("Type {START_WORD} to begin"))
        .placeholder(START_WORD)
        .required(false)
        .default_input("")
        .interact()?;
    Ok(is_start(&answer))
}

pub fn is_start(answer: &str) -> bool {
    answer.trim() == START_WORD
}

/// Progress printed as the coordinator runs.
pub struct ConsoleObserver;

impl RunObserver for ConsoleObserver {
    fn on_plan(&self, overview: &PlanOverview) {
        let _ = cliclack::log::step(format!(
            "{}: {} to remove, {} whitelisted, {} batches",
            style(&overview.group_jid).bold(),
            overview.removable,
            overview.protected,
            overview.batches
        ));
    }

    fn on_removing(&self, index: usize, batch_len: usize, contact: &ContactRecord) {
        let _ = cliclack::log::info(format!(
            "[{index}/{batch_len}] Removing {} ({})",
            contact.display_name(),
            contact.jid
        ));
    }

    fn on_result(&self, result: &RemovalResult) {
        let line = result_line(result);
        let _ = if result.skipped {
            cliclack::log::remark(line)
        } else if result.success {
            cliclack::log::success(line)
        } else {
            cliclack::log::error(line)
        };
    }

    fn on_delay(&self, delay: Duration) {
        let _ = cliclack::log::remark(format!("waiting {}s", delay.as_secs()));
    }

    fn on_batch_skipped(&self, preview: &BatchPreview<'_>) {
        let _ = cliclack::log::warning(format!(
            "Batch {} skipped ({} contacts)",
            preview.batch_number,
            preview.contacts.len()
        ));
    }

    fn on_batch_done(&self, batch_number: usize, summary: &Summary) {
        let _ = cliclack::log::step(format!(
            "Batch {batch_number} done: {} removed, {} failed",
            summary.successful, summary.failed
        ));
    }

    fn on_cancelled(&self, group_jid: &str) {
        let _ = cliclack::log::warning(format!("Stopped by operator in {group_jid}"));
    }

    fn on_group_done(&self, group_jid: &str, summary: &Summary) {
        let _ = cliclack::log::success(format!("{group_jid}: {}", summary_line(summary)));
    }

    fn on_sending(&self, index: usize, total: usize, recipient: &str) {
        let _ = cliclack::log::info(format!("[{index}/{total}] Sending to {recipient}"));
    }

    fn on_sent(&self, recipient: &str, outcome: &BridgeOutcome) {
        let line = format!("{recipient}: {}", outcome.message());
        let _ = if outcome.is_success() {
            cliclack::log::success(line)
        } else {
            cliclack::log::error(line)
        };
    }
}

/// One printed line per recorded result, skipped ones included.
pub fn result_line(result: &RemovalResult) -> String {
    match result.skip_reason {
        Some(reason) if result.skipped => format!("Skipped ({reason}): {}", result.jid),
        _ => format!("{}: {}", result.jid, result.message),
    }
}

pub fn summary_line(summary: &Summary) -> String {
    format!(
        "{} removed, {} failed, {} whitelisted, {} skipped by user",
        summary.successful, summary.failed, summary.whitelisted, summary.user_skipped
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::outcome::SkipReason;

    #[test]
    fn test_preview_marks_admins() {
        let mut admin = ContactRecord::new("972500000001@s.whatsapp.net").with_name("Dana");
        admin.is_super_admin = true;
        let plain = ContactRecord::new("66846921380038@lid");
        let contacts = [admin, plain];
        let preview = BatchPreview {
            group_jid: "120363385526179109@g.us",
            batch_number: 2,
            total_batches: 3,
            contacts: &contacts,
            delay: Duration::from_secs(2),
        };

        let text = preview_lines(&preview);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "  1. Dana (972500000001@s.whatsapp.net) [ADMIN]");
        assert_eq!(lines[1], "  2. Unknown (66846921380038@lid)");
        assert!(text.contains("Delay: 2s"));
    }

    #[test]
    fn test_result_line_covers_every_outcome() {
        let group = "120363385526179109@g.us";
        let jid = "972500000001@s.whatsapp.net";

        let whitelisted = RemovalResult::skipped(group, jid, SkipReason::Whitelisted);
        assert_eq!(
            result_line(&whitelisted),
            "Skipped (whitelisted): 972500000001@s.whatsapp.net"
        );
        let user_skip = RemovalResult::skipped(group, jid, SkipReason::UserSkip);
        assert_eq!(
            result_line(&user_skip),
            "Skipped (user_skip): 972500000001@s.whatsapp.net"
        );

        let failed = RemovalResult::attempted(
            group,
            jid,
            &BridgeOutcome::Unreachable {
                message: "Request failed: connection refused".into(),
            },
        );
        assert_eq!(
            result_line(&failed),
            "972500000001@s.whatsapp.net: Request failed: connection refused"
        );
    }

    #[test]
    fn test_start_word_is_exact() {
        assert!(is_start("START"));
        assert!(is_start("  START\n"));
        assert!(!is_start("start"));
        assert!(!is_start("yes"));
        assert!(!is_start(""));
    }

    #[test]
    fn test_summary_line() {
        let summary = Summary {
            successful: 20,
            failed: 2,
            whitelisted: 3,
            user_skipped: 0,
        };
        assert_eq!(
            summary_line(&summary),
            "20 removed, 2 failed, 3 whitelisted, 0 skipped by user"
        );
    }
}
