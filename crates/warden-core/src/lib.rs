//! # warden-core
//!
//! Core types, traits, configuration, and error handling for groupwarden.

pub mod config;
pub mod contact;
pub mod error;
pub mod jid;
pub mod outcome;
pub mod traits;
pub mod whitelist;
