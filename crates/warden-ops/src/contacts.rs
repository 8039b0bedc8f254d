//! Contacts CSV: the list of removal targets.
//!
//! Recognized columns are `name`, `jid`, `source`, `is_admin`,
//! `is_super_admin` and `phone_number`; others are ignored and missing ones
//! read as empty. Rows without a `jid` cannot be acted upon and are dropped.

use csv::StringRecord;
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::{info, warn};
use warden_core::{
    contact::{ContactRecord, ContactSource},
    error::WardenError,
};

/// Header written by [`save`].
const HEADER: [&str; 6] = [
    "phone_number",
    "name",
    "jid",
    "source",
    "is_admin",
    "is_super_admin",
];

/// Load contacts from the CSV at `path`.
///
/// A missing or unreadable file is a configuration error: without it there is
/// nothing to process.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<ContactRecord>, WardenError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            WardenError::Config(format!("contacts file not found: {}", path.display()))
        } else {
            WardenError::Config(format!("failed to read {}: {e}", path.display()))
        }
    })?;

    let contacts = read(file)?;
    info!(
        "contacts: loaded {} contacts from {}",
        contacts.len(),
        path.display()
    );
    Ok(contacts)
}

/// Positions of the recognized columns in a header row.
struct Columns {
    jid: usize,
    name: Option<usize>,
    phone_number: Option<usize>,
    source: Option<usize>,
    is_admin: Option<usize>,
    is_super_admin: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self, WardenError> {
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let jid = find("jid")
            .ok_or_else(|| WardenError::Config("contacts CSV has no 'jid' column".to_string()))?;
        Ok(Self {
            jid,
            name: find("name"),
            phone_number: find("phone_number"),
            source: find("source"),
            is_admin: find("is_admin"),
            is_super_admin: find("is_super_admin"),
        })
    }
}

fn field(record: &StringRecord, idx: Option<usize>) -> &str {
    idx.and_then(|i| record.get(i)).unwrap_or("")
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// `"true"` in any case is true, everything else is false.
fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// Read contacts from any CSV source with a header row.
pub fn read<R: io::Read>(reader: R) -> Result<Vec<ContactRecord>, WardenError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let columns = Columns::from_headers(rdr.headers()?)?;

    let mut contacts = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                // Header is line 1.
                warn!("contacts: skipping malformed row {}: {e}", i + 2);
                continue;
            }
        };

        let jid = field(&record, Some(columns.jid));
        if jid.is_empty() {
            continue;
        }

        contacts.push(ContactRecord {
            jid: jid.to_string(),
            name: non_empty(field(&record, columns.name)),
            phone_number: non_empty(field(&record, columns.phone_number)),
            source: ContactSource::parse(field(&record, columns.source)),
            is_admin: parse_bool(field(&record, columns.is_admin)),
            is_super_admin: parse_bool(field(&record, columns.is_super_admin)),
        });
    }
    Ok(contacts)
}

/// Write contacts in the format [`load`] reads.
pub fn save(path: impl AsRef<Path>, contacts: &[ContactRecord]) -> Result<(), WardenError> {
    let path = path.as_ref();
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(HEADER)?;
    for c in contacts {
        wtr.write_record([
            c.phone_number.as_deref().unwrap_or(""),
            c.name.as_deref().unwrap_or(""),
            c.jid.as_str(),
            c.source.as_str(),
            bool_str(c.is_admin),
            bool_str(c.is_super_admin),
        ])?;
    }
    wtr.flush()?;
    info!("contacts: wrote {} contacts to {}", contacts.len(), path.display());
    Ok(())
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
