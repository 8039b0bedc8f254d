//! # warden-ops
//!
//! The removal workflow: contact sources, batch planning, the approval-gated
//! batch coordinator, group comparison, the results report, and paced
//! broadcast messaging.

pub mod broadcast;
pub mod compare;
pub mod contacts;
pub mod coordinator;
pub mod plan;
pub mod report;

pub use coordinator::{BatchCoordinator, GroupOutcome, Phase, RunReport};
pub use plan::Plan;
