//! # warden-bridge
//!
//! Client for the REST API of the local WhatsApp bridge.

pub mod http;

pub use http::HttpBridge;
