//! HTTP networking module
//!
//! Provides the SearXNG backend client and the trait the coordinator drives.

mod client;
mod payload;
mod traits;

pub use client::{BackendClient, ProbeStatus};
pub use payload::{BackendPayload, BackendRecord};
pub use traits::SearchBackend;
