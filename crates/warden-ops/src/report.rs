//! Results CSV written at the end of a removal run, cancelled or not.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;
use warden_core::{error::WardenError, outcome::RemovalResult};

use crate::coordinator::GroupOutcome;

const HEADER: [&str; 8] = [
    "group_jid",
    "participant_jid",
    "success",
    "skipped",
    "skip_reason",
    "message",
    "error_code",
    "timestamp",
];

/// Results file opened before a run starts.
///
/// Opening up front surfaces a bad output path before anything reaches the
/// bridge. An existing file is only replaced once results are written.
#[derive(Debug)]
pub struct ResultsFile {
    path: PathBuf,
    file: File,
}

impl ResultsFile {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, WardenError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| {
                WardenError::Config(format!("failed to create {}: {e}", path.display()))
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file content with every result of `groups`.
    pub fn write(self, groups: &[GroupOutcome]) -> Result<usize, WardenError> {
        self.file.set_len(0)?;
        let rows = write_to(&self.file, groups.iter().flat_map(GroupOutcome::results))?;
        info!("report: saved {rows} results to {}", self.path.display());
        Ok(rows)
    }
}

/// Write every result of `groups` to the CSV at `path`.
pub fn write(path: impl AsRef<Path>, groups: &[GroupOutcome]) -> Result<usize, WardenError> {
    ResultsFile::create(path)?.write(groups)
}

/// Write results to any writer, header first. Returns the number of rows.
pub fn write_to<'a, W: io::Write>(
    writer: W,
    results: impl IntoIterator<Item = &'a RemovalResult>,
) -> Result<usize, WardenError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;
    let mut rows = 0;
    for r in results {
        let timestamp = r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        wtr.write_record([
            r.group_jid.as_str(),
            r.jid.as_str(),
            if r.success { "true" } else { "false" },
            if r.skipped { "true" } else { "false" },
            r.skip_reason.map(|s| s.as_str()).unwrap_or(""),
            r.message.as_str(),
            r.error_code.as_deref().unwrap_or(""),
            timestamp.as_str(),
        ])?;
        rows += 1;
    }
    wtr.flush()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::Phase;
    use warden_core::outcome::{BridgeOutcome, SkipReason};

    const GROUP: &str = "120363385526179109@g.us";

    fn outcome() -> GroupOutcome {
        GroupOutcome {
            group_jid: GROUP.to_string(),
            phase: Phase::Cancelled,
            protected: vec![RemovalResult::skipped(
                GROUP,
                "w@s.whatsapp.net",
                SkipReason::Whitelisted,
            )],
            processed: vec![
                RemovalResult::attempted(
                    GROUP,
                    "a@s.whatsapp.net",
                    &BridgeOutcome::Success {
                        message: "Successfully removed from group".into(),
                    },
                ),
                RemovalResult::attempted(
                    GROUP,
                    "b@s.whatsapp.net",
                    &BridgeOutcome::Rejected {
                        status: Some(500),
                        message: "HTTP 500: {\"error\":\"not admin, sorry\"}".into(),
                    },
                ),
            ],
        }
    }

    #[test]
    fn test_write_to_rows_and_columns() {
        let mut buf = Vec::new();
        let rows = write_to(&mut buf, outcome().results()).unwrap();
        assert_eq!(rows, 3);

        let mut rdr = csv::Reader::from_reader(buf.as_slice());
        let headers: Vec<_> = rdr.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, HEADER);

        let records: Vec<_> = rdr.records().map(Result::unwrap).collect();
        assert_eq!(&records[0][1], "w@s.whatsapp.net");
        assert_eq!(&records[0][3], "true");
        assert_eq!(&records[0][4], "whitelisted");
        assert_eq!(&records[1][2], "true");
        assert_eq!(&records[1][4], "");
        assert_eq!(&records[2][2], "false");
        assert_eq!(&records[2][5], "HTTP 500: {\"error\":\"not admin, sorry\"}");
        assert_eq!(&records[2][6], "500");
        assert_eq!(records[2][7].len(), "2026-01-01 00:00:00".len());
    }

    #[test]
    fn test_write_cancelled_run_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("removal_results.csv");
        let rows = write(&path, &[outcome()]).unwrap();
        assert_eq!(rows, 3);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(
            "group_jid,participant_jid,success,skipped,skip_reason,message,error_code,timestamp"
        ));
    }

    #[test]
    fn test_missing_directory_fails_on_create() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("removal_results.csv");
        let err = ResultsFile::create(&path).unwrap_err();
        assert!(matches!(err, WardenError::Config(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_existing_file_kept_until_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("removal_results.csv");
        let old = "a much longer previous report that must not leave a tail behind\n".repeat(20);
        std::fs::write(&path, &old).unwrap();

        let results = ResultsFile::create(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), old);

        assert_eq!(results.write(&[outcome()]).unwrap(), 3);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("group_jid,"));
        assert!(!content.contains("previous report"));
        assert_eq!(content.lines().count(), 4);
    }

    #[test]
    fn test_write_empty_run_has_header_only() {
        let mut buf = Vec::new();
        assert_eq!(write_to(&mut buf, std::iter::empty()).unwrap(), 0);
        assert_eq!(buf.iter().filter(|b| **b == b'\n').count(), 1);
    }
}
