//! Broadcast: one text message to every recipient of a CSV, paced by a fixed delay.
//!
//! Sends are sequential. A failed send is recorded and the run goes on, except
//! when the bridge is unreachable: then nothing after it can succeed either.

use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use warden_core::{
    error::WardenError,
    outcome::BridgeOutcome,
    traits::{Bridge, RunObserver},
};

use crate::contacts;

/// Below this the account risks being flagged for spam.
pub const MIN_RECOMMENDED_DELAY: Duration = Duration::from_secs(15);

/// Recipients read from a CSV.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipients {
    pub targets: Vec<String>,
    /// First-column entries that are not phone numbers.
    pub invalid: Vec<String>,
}

/// Load recipients from the CSV at `path`.
pub fn load(path: impl AsRef<Path>) -> Result<Recipients, WardenError> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| {
        WardenError::Config(format!("failed to read recipients {}: {e}", path.display()))
    })?;
    let recipients = read(&data)?;
    info!(
        "broadcast: {} recipients from {} ({} invalid)",
        recipients.targets.len(),
        path.display(),
        recipients.invalid.len()
    );
    Ok(recipients)
}

/// Read recipients from CSV data with a header row.
///
/// A contacts CSV (one with a `jid` column) yields its JIDs. Any other file
/// is read as phone numbers in the first column, digits only.
pub fn read(data: &[u8]) -> Result<Recipients, WardenError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);
    if rdr.headers()?.iter().any(|h| h.eq_ignore_ascii_case("jid")) {
        let targets = contacts::read(data)?.into_iter().map(|c| c.jid).collect();
        return Ok(Recipients {
            targets,
            invalid: Vec::new(),
        });
    }

    let mut recipients = Recipients::default();
    for (i, record) in rdr.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!("broadcast: skipping malformed row {}: {e}", i + 2);
                continue;
            }
        };
        let number = record.get(0).unwrap_or("");
        if number.is_empty() {
            continue;
        }
        if number.bytes().all(|b| b.is_ascii_digit()) {
            recipients.targets.push(number.to_string());
        } else {
            recipients.invalid.push(number.to_string());
        }
    }
    Ok(recipients)
}

/// Drop the first `skip` recipients, then keep at most `limit` (0 keeps all).
pub fn select(targets: &[String], skip: usize, limit: usize) -> &[String] {
    let rest = targets.get(skip..).unwrap_or(&[]);
    if limit > 0 && limit < rest.len() {
        &rest[..limit]
    } else {
        rest
    }
}

/// Delay between two sends. Never shorter than a second.
pub fn pacing(delay_secs: u64) -> Duration {
    Duration::from_secs(delay_secs.max(1))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResult {
    pub recipient: String,
    pub outcome: BridgeOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct BroadcastReport {
    pub results: Vec<SendResult>,
    /// Stopped early because the bridge went away.
    pub aborted: bool,
}

impl BroadcastReport {
    pub fn attempted(&self) -> usize {
        self.results.len()
    }

    pub fn successful(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.successful()
    }
}

/// Send `text` to every recipient in order, waiting `delay` between sends.
pub async fn send_all(
    bridge: &dyn Bridge,
    recipients: &[String],
    text: &str,
    delay: Duration,
    observer: &dyn RunObserver,
) -> BroadcastReport {
    let total = recipients.len();
    let mut report = BroadcastReport::default();
    for (i, recipient) in recipients.iter().enumerate() {
        observer.on_sending(i + 1, total, recipient);
        let outcome = bridge.send_message(recipient, text).await;
        observer.on_sent(recipient, &outcome);
        let unreachable = matches!(outcome, BridgeOutcome::Unreachable { .. });
        report.results.push(SendResult {
            recipient: recipient.clone(),
            outcome,
        });

        let remaining = total - i - 1;
        if unreachable {
            if remaining > 0 {
                warn!("broadcast: bridge unreachable, {remaining} message(s) not sent");
                report.aborted = true;
            }
            break;
        }
        if remaining > 0 {
            observer.on_delay(delay);
            tokio::time::sleep(delay).await;
        }
    }
    info!(
        "broadcast: {} sent, {} failed",
        report.successful(),
        report.failed()
    );
    report
}
