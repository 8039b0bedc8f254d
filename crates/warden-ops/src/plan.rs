//! Planning: split contacts into protected and removable, then into batches.

use warden_core::{
    contact::ContactRecord, error::WardenError, traits::PlanOverview, whitelist::Whitelist,
};

/// Removal plan for a contact list.
///
/// `removable` and `protected` partition the input exactly and keep its
/// order. Batches are consecutive `batch_size` chunks of `removable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub removable: Vec<ContactRecord>,
    pub protected: Vec<ContactRecord>,
    batch_size: usize,
}

impl Plan {
    pub fn build(
        contacts: &[ContactRecord],
        whitelist: &Whitelist,
        batch_size: usize,
    ) -> Result<Self, WardenError> {
        if batch_size == 0 {
            return Err(WardenError::Config(
                "batch size must be at least 1".to_string(),
            ));
        }

        let (protected, removable): (Vec<_>, Vec<_>) = contacts
            .iter()
            .cloned()
            .partition(|c| whitelist.contains(&c.jid));

        Ok(Self {
            removable,
            protected,
            batch_size,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Batches in execution order. Every batch but the last is full.
    pub fn batches(&self) -> std::slice::Chunks<'_, ContactRecord> {
        self.removable.chunks(self.batch_size)
    }

    pub fn batch_count(&self) -> usize {
        self.removable.len().div_ceil(self.batch_size)
    }

    pub fn total(&self) -> usize {
        self.removable.len() + self.protected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.removable.is_empty()
    }

    pub fn overview(&self, group_jid: &str) -> PlanOverview {
        PlanOverview {
            group_jid: group_jid.to_string(),
            total: self.total(),
            removable: self.removable.len(),
            protected: self.protected.len(),
            batches: self.batch_count(),
            batch_size: self.batch_size,
        }
    }
}
