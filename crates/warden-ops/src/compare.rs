//! Common members of two groups, as a contacts list for a later removal run.

use std::collections::{HashMap, HashSet};
use tracing::info;
use warden_core::{
    contact::{ContactRecord, ContactSource, GroupMember},
    error::WardenError,
    jid::phone_from_jid,
    traits::Bridge,
};

/// Members present in both `group1` and `group2`.
///
/// Names come from whichever list has one, admin flags are combined. Named
/// contacts sort first by name, unnamed ones follow, ties break on the JID.
pub async fn common_members(
    bridge: &dyn Bridge,
    group1: &str,
    group2: &str,
) -> Result<Vec<ContactRecord>, WardenError> {
    let first = bridge.group_members(group1).await?;
    let second = bridge.group_members(group2).await?;
    info!(
        "compare: {group1} has {} members, {group2} has {}",
        first.len(),
        second.len()
    );

    let mut common = intersect(&first, &second);
    sort_for_display(&mut common);
    info!("compare: {} common members", common.len());
    Ok(common)
}

fn intersect(first: &[GroupMember], second: &[GroupMember]) -> Vec<ContactRecord> {
    let by_jid: HashMap<&str, &GroupMember> =
        second.iter().map(|m| (m.jid.as_str(), m)).collect();

    let mut seen = HashSet::new();
    first
        .iter()
        .filter(|m| seen.insert(m.jid.as_str()))
        .filter_map(|a| {
            let b = by_jid.get(a.jid.as_str())?;
            Some(ContactRecord {
                jid: a.jid.clone(),
                name: a.display_name.clone().or_else(|| b.display_name.clone()),
                phone_number: phone_from_jid(&a.jid).map(String::from),
                source: ContactSource::Api,
                is_admin: a.is_admin || b.is_admin,
                is_super_admin: a.is_super_admin || b.is_super_admin,
            })
        })
        .collect()
}

fn sort_for_display(contacts: &mut [ContactRecord]) {
    contacts.sort_by(|a, b| {
        let key = |c: &ContactRecord| (c.name.is_none(), c.name.as_deref().map(str::to_lowercase));
        key(a).cmp(&key(b)).then_with(|| a.jid.cmp(&b.jid))
    });
}
