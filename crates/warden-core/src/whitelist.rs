//! Protected identifiers that must never be targeted by a removal.
//!
//! The whitelist file is plain UTF-8 text: one identifier per line, blank
//! lines and `#` comments ignored. A missing file is an empty whitelist.

use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use tracing::{info, warn};

/// Set of protected JIDs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Whitelist {
    entries: HashSet<String>,
}

impl Whitelist {
    /// Load the whitelist at `path`.
    ///
    /// A missing file yields an empty set and no error. Any other I/O error is
    /// returned next to whatever was parsed before it happened.
    pub fn load(path: impl AsRef<Path>) -> (Self, Option<io::Error>) {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(
                    "whitelist: {} not found, no contacts will be protected",
                    path.display()
                );
                return (Self::default(), None);
            }
            Err(e) => return (Self::default(), Some(e)),
        };

        let mut whitelist = Self::default();
        for line in BufReader::new(file).lines() {
            match line {
                Ok(line) => whitelist.insert_line(&line),
                Err(e) => {
                    warn!(
                        "whitelist: read error in {} after {} entries: {e}",
                        path.display(),
                        whitelist.len()
                    );
                    return (whitelist, Some(e));
                }
            }
        }

        info!(
            "whitelist: loaded {} protected contacts from {}",
            whitelist.len(),
            path.display()
        );
        (whitelist, None)
    }

    /// Parse whitelist text held in memory.
    pub fn parse(content: &str) -> Self {
        let mut whitelist = Self::default();
        for line in content.lines() {
            whitelist.insert_line(line);
        }
        whitelist
    }

    fn insert_line(&mut self, line: &str) {
        let line = line.trim();
        if !line.is_empty() && !line.starts_with('#') {
            self.entries.insert(line.to_string());
        }
    }

    pub fn contains(&self, jid: &str) -> bool {
        self.entries.contains(jid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Whitelist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Append `jids` that are not yet protected to the whitelist file at `path`.
///
/// New entries go under a timestamped comment. Returns the entries actually
/// written, in input order; the file is untouched when nothing is new.
pub fn append(
    path: impl AsRef<Path>,
    jids: &[String],
    now: DateTime<Local>,
) -> io::Result<Vec<String>> {
    let path = path.as_ref();
    let (existing, err) = Whitelist::load(path);
    if let Some(e) = err {
        return Err(e);
    }

    let mut seen = HashSet::new();
    let new: Vec<String> = jids
        .iter()
        .filter(|j| !existing.contains(j) && seen.insert(j.as_str()))
        .cloned()
        .collect();
    if new.is_empty() {
        return Ok(new);
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(
        file,
        "\n# Auto-added from phone numbers on {}",
        now.format("%Y-%m-%d %H:%M:%S")
    )?;
    for jid in &new {
        writeln!(file, "{jid}")?;
    }
    info!(
        "whitelist: added {} entries to {}",
        new.len(),
        path.display()
    );
    Ok(new)
}
