//! Search orchestration module
//!
//! The [`Coordinator`] drives sequential failover across backend endpoints;
//! the [`SearchService`] puts the result cache in front of it.

mod coordinator;
mod service;

pub use coordinator::{Coordinator, FailoverPolicy};
pub use service::SearchService;
