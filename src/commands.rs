//! Subcommand handlers. Each loads what it needs, talks to the bridge, and reports.

use anyhow::bail;
use clap::Args;
use console::style;
use tracing::{info, warn};
use warden_bridge::HttpBridge;
use warden_core::{
    config::Config,
    jid::{is_group_jid, phone_to_jid},
    traits::Bridge,
    whitelist::{self, Whitelist},
};
use warden_ops::{
    broadcast::{self, MIN_RECOMMENDED_DELAY},
    compare, contacts,
    report::ResultsFile,
    BatchCoordinator, Plan, RunReport,
};

use crate::prompt::{self, ConsoleApprover, ConsoleObserver};

/// Flags of the `remove` subcommand. Anything left unset comes from the config file.
#[derive(Args, Debug, Default)]
pub struct RemoveArgs {
    /// Contacts CSV with the removal targets.
    #[arg(long)]
    pub csv_file: Option<String>,
    /// First target group JID.
    #[arg(long)]
    pub group1: Option<String>,
    /// Second target group JID.
    #[arg(long)]
    pub group2: Option<String>,
    /// Seconds between two removals.
    #[arg(long)]
    pub delay: Option<u64>,
    /// Contacts per batch.
    #[arg(long)]
    pub batch_size: Option<usize>,
    /// Bridge base URL.
    #[arg(long)]
    pub bridge_url: Option<String>,
    /// Whitelist file.
    #[arg(long)]
    pub whitelist: Option<String>,
    /// Results CSV.
    #[arg(long)]
    pub output: Option<String>,
    /// Show the plan without contacting the bridge.
    #[arg(long)]
    pub dry_run: bool,
}

impl RemoveArgs {
    /// Overlay the flags that were given onto `cfg`.
    pub fn apply(&self, cfg: &mut Config) {
        if let Some(ref v) = self.csv_file {
            cfg.files.contacts = v.clone();
        }
        if let Some(v) = self.delay {
            cfg.batch.delay_secs = v;
        }
        if let Some(v) = self.batch_size {
            cfg.batch.size = v;
        }
        if let Some(ref v) = self.bridge_url {
            cfg.bridge.base_url = v.clone();
        }
        if let Some(ref v) = self.whitelist {
            cfg.files.whitelist = v.clone();
        }
        if let Some(ref v) = self.output {
            cfg.files.results = v.clone();
        }
    }

    /// Groups named on the command line, or the configured targets if none were.
    pub fn target_groups(&self, cfg: &Config) -> Vec<String> {
        let given: Vec<String> = [&self.group1, &self.group2]
            .into_iter()
            .flatten()
            .cloned()
            .collect();
        if given.is_empty() {
            cfg.groups.targets.clone()
        } else {
            given
        }
    }
}

/// Batch removal of the contacts CSV from the target groups.
pub async fn remove(mut cfg: Config, args: RemoveArgs) -> anyhow::Result<()> {
    args.apply(&mut cfg);
    cfg.batch.validate()?;
    let groups = args.target_groups(&cfg);

    let contacts = contacts::load(&cfg.files.contacts)?;
    let (whitelist, err) = Whitelist::load(&cfg.files.whitelist);
    if let Some(e) = err {
        warn!("whitelist {} could not be fully read: {e}", cfg.files.whitelist);
    }
    info!(
        "loaded {} contacts and {} whitelist entries",
        contacts.len(),
        whitelist.len()
    );
    let plan = Plan::build(&contacts, &whitelist, cfg.batch.size)?;

    cliclack::intro(style("groupwarden remove").bold().to_string())?;

    if args.dry_run {
        cliclack::note("Dry run", dry_run_text(&plan, &groups))?;
        cliclack::outro("Dry run only, nothing was sent")?;
        return Ok(());
    }

    let results = preflight(&cfg, &groups)?;
    let overview = plan.overview(&groups[0]);
    if !prompt::confirm_start(&overview, groups.len())? {
        cliclack::outro_cancel("Not started, nothing was sent")?;
        return Ok(());
    }

    let bridge = HttpBridge::from_config(&cfg.bridge)?;
    let mut approver = ConsoleApprover;
    let observer = ConsoleObserver;
    let run = BatchCoordinator::new(&bridge, &mut approver, &observer, cfg.batch.delay())
        .run_groups(&groups, &plan)
        .await;

    let path = results.path().display().to_string();
    let rows = results.write(&run.groups)?;
    cliclack::note("Summary", run_summary_text(&run, rows, &path))?;

    if run.cancelled() {
        cliclack::outro_cancel("Cancelled by operator, partial results saved")?;
    } else {
        cliclack::outro("Done")?;
    }
    Ok(())
}

/// Checks that must pass before the START prompt, while nothing has reached
/// the bridge: usable targets, bridge settings, and a writable results file.
pub fn preflight(cfg: &Config, groups: &[String]) -> anyhow::Result<ResultsFile> {
    if groups.is_empty() {
        bail!("no target groups. Pass --group1/--group2 or set [groups] targets in the config.");
    }
    if let Some(bad) = groups.iter().find(|g| !is_group_jid(g)) {
        bail!("not a group JID: {bad}");
    }
    cfg.bridge.validate()?;
    Ok(ResultsFile::create(&cfg.files.results)?)
}

/// Per-group counts, then the totals and where the results went.
pub fn run_summary_text(run: &RunReport, rows: usize, path: &str) -> String {
    let mut lines: Vec<String> = run
        .groups
        .iter()
        .map(|g| {
            let status = if g.is_cancelled() { " (cancelled)" } else { "" };
            format!(
                "{}{status}: {}",
                g.group_jid,
                prompt::summary_line(&g.summary())
            )
        })
        .collect();
    lines.push(format!("Total: {}", prompt::summary_line(&run.summary())));
    lines.push(format!("Results: {rows} rows in {path}"));
    lines.join("\n")
}

/// Protected/removable split and batch layout shown by `remove --dry-run`.
pub fn dry_run_text(plan: &Plan, groups: &[String]) -> String {
    let mut lines = vec![
        format!(
            "Groups: {}",
            if groups.is_empty() {
                "(none configured)".to_string()
            } else {
                groups.join(", ")
            }
        ),
        format!("Contacts: {}", plan.total()),
        format!("Whitelisted: {}", plan.protected.len()),
        format!("To remove: {}", plan.removable.len()),
        format!(
            "Batches: {} of up to {}",
            plan.batch_count(),
            plan.batch_size()
        ),
    ];
    for (i, batch) in plan.batches().enumerate() {
        lines.push(format!("  batch {}: {} contacts", i + 1, batch.len()));
    }
    lines.join("\n")
}

/// Write the members common to both groups as a contacts CSV.
pub async fn compare(cfg: &Config, group1: &str, group2: &str, output: &str) -> anyhow::Result<()> {
    let bridge = HttpBridge::from_config(&cfg.bridge)?;
    let common = compare::common_members(&bridge, group1, group2).await?;
    contacts::save(output, &common)?;

    let admins = common.iter().filter(|c| c.is_any_admin()).count();
    println!(
        "{} common members ({admins} admins) written to {output}",
        common.len()
    );
    Ok(())
}

/// Print the members of a group.
pub async fn members(cfg: &Config, group: &str) -> anyhow::Result<()> {
    let bridge = HttpBridge::from_config(&cfg.bridge)?;
    let members = bridge.group_members(group).await?;
    println!("{group}: {} members", members.len());
    for m in &members {
        let admin = if m.is_super_admin {
            " [SUPERADMIN]"
        } else if m.is_admin {
            " [ADMIN]"
        } else {
            ""
        };
        println!(
            "  {} ({}){admin}",
            m.display_name.as_deref().unwrap_or("Unknown"),
            m.jid
        );
    }
    Ok(())
}

/// Send one text message through the bridge.
pub async fn send(cfg: &Config, to: &str, message: &[String]) -> anyhow::Result<()> {
    if message.is_empty() {
        bail!("no message provided. Usage: groupwarden send --to <jid> <message>");
    }
    let bridge = HttpBridge::from_config(&cfg.bridge)?;
    let outcome = bridge.send_message(to, &message.join(" ")).await;
    if !outcome.is_success() {
        bail!("send failed: {}", outcome.message());
    }
    println!("{}", outcome.message());
    Ok(())
}

/// Flags of the `broadcast` subcommand.
#[derive(Args, Debug, Default)]
pub struct BroadcastArgs {
    /// Recipients CSV: phone numbers in the first column, or a contacts CSV.
    #[arg(long)]
    pub csv_file: String,
    /// UTF-8 text file holding the message.
    #[arg(long)]
    pub message_file: Option<String>,
    /// Seconds between two messages.
    #[arg(long)]
    pub delay: Option<u64>,
    /// Leave out the first N recipients.
    #[arg(long, default_value_t = 0)]
    pub skip: usize,
    /// Send to at most N recipients after skipping (0 sends to all).
    #[arg(long, default_value_t = 0)]
    pub limit: usize,
    /// Message text, when no --message-file is given.
    #[arg(trailing_var_arg = true)]
    pub message: Vec<String>,
}

impl BroadcastArgs {
    /// Message from `--message-file`, else from the trailing words. Never empty.
    pub fn message_text(&self) -> anyhow::Result<String> {
        let text = match self.message_file {
            Some(ref path) => std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("failed to read message file {path}: {e}"))?
                .trim()
                .to_string(),
            None => self.message.join(" ").trim().to_string(),
        };
        if text.is_empty() {
            bail!("no message provided. Use --message-file <path> or trailing text");
        }
        Ok(text)
    }
}

/// Send one message to every recipient of a CSV, paced and confirmed.
pub async fn broadcast(cfg: &Config, args: BroadcastArgs) -> anyhow::Result<()> {
    let text = args.message_text()?;
    cfg.bridge.validate()?;
    let recipients = broadcast::load(&args.csv_file)?;
    for entry in &recipients.invalid {
        warn!("broadcast: skipping invalid entry {entry:?}");
    }
    if recipients.targets.is_empty() {
        bail!("no valid recipients in {}", args.csv_file);
    }
    let selected = broadcast::select(&recipients.targets, args.skip, args.limit);
    if selected.is_empty() {
        println!("No recipients left after --skip/--limit, nothing to send");
        return Ok(());
    }
    let delay = broadcast::pacing(args.delay.unwrap_or(cfg.broadcast.delay_secs));

    cliclack::intro(style("groupwarden broadcast").bold().to_string())?;
    if delay < MIN_RECOMMENDED_DELAY {
        cliclack::log::warning(format!(
            "{}s between messages is below the recommended {}s and raises the ban risk",
            delay.as_secs(),
            MIN_RECOMMENDED_DELAY.as_secs()
        ))?;
    }
    if !prompt::confirm_broadcast(&text, selected.len(), delay)? {
        cliclack::outro_cancel("Not started, nothing was sent")?;
        return Ok(());
    }

    let bridge = HttpBridge::from_config(&cfg.bridge)?;
    let report = broadcast::send_all(&bridge, selected, &text, delay, &ConsoleObserver).await;
    cliclack::note(
        "Summary",
        format!(
            "Attempted: {}\nSent: {}\nFailed: {}",
            report.attempted(),
            report.successful(),
            report.failed()
        ),
    )?;
    if report.aborted {
        cliclack::outro_cancel("Bridge unreachable, remaining messages were not sent")?;
    } else {
        cliclack::outro("Done")?;
    }
    Ok(())
}

/// Convert phone numbers to JIDs and append the new ones to the whitelist file.
pub fn whitelist_add(cfg: &Config, phones: &[String]) -> anyhow::Result<()> {
    let (jids, invalid) = phones_to_jids(phones, &cfg.phone.default_country_code);
    for phone in &invalid {
        warn!("whitelist: no digits in {phone:?}, ignored");
    }
    if jids.is_empty() {
        bail!("no valid phone numbers given");
    }

    let added = whitelist::append(&cfg.files.whitelist, &jids, chrono::Local::now())?;
    println!(
        "{} added, {} already whitelisted ({})",
        added.len(),
        jids.len() - added.len(),
        cfg.files.whitelist
    );
    for jid in &added {
        println!("  {jid}");
    }
    Ok(())
}

/// Split phone inputs into JIDs and the inputs that had no digits.
pub fn phones_to_jids(phones: &[String], country_code: &str) -> (Vec<String>, Vec<String>) {
    let mut jids = Vec::new();
    let mut invalid = Vec::new();
    for phone in phones {
        match phone_to_jid(phone, country_code) {
            Some(jid) => jids.push(jid),
            None => invalid.push(phone.clone()),
        }
    }
    (jids, invalid)
}
