//! Contacts and group members as seen by the workflow.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a contact record came from.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactSource {
    /// Full member list fetched from the bridge.
    Api,
    /// Derived from message history (senders only).
    Messages,
    /// Added by hand.
    Manual,
    /// Groups were resolved through different sources.
    Mixed,
    #[default]
    Unknown,
}

impl ContactSource {
    /// Parse the serialized tag. Anything unrecognized is `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "api" => Self::Api,
            "messages" => Self::Messages,
            "manual" => Self::Manual,
            "mixed" => Self::Mixed,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Messages => "messages",
            Self::Manual => "manual",
            Self::Mixed => "mixed",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ContactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A removal target loaded from a contacts CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    pub jid: String,
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub source: ContactSource,
    pub is_admin: bool,
    pub is_super_admin: bool,
}

impl ContactRecord {
    /// A plain record with no name or admin flags.
    pub fn new(jid: impl Into<String>) -> Self {
        Self {
            jid: jid.into(),
            name: None,
            phone_number: None,
            source: ContactSource::Manual,
            is_admin: false,
            is_super_admin: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_any_admin(&self) -> bool {
        self.is_admin || self.is_super_admin
    }

    /// Name for display, `Unknown` when the record has none.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }
}

/// A member entry returned by the bridge's members endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub jid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_super_admin: bool,
}

impl GroupMember {
    pub fn new(jid: impl Into<String>) -> Self {
        Self {
            jid: jid.into(),
            display_name: None,
            is_admin: false,
            is_super_admin: false,
        }
    }
}
