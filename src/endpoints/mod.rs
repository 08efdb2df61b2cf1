//! Backend endpoints and their advisory health tracking

mod endpoint;
mod pool;

pub use endpoint::{Endpoint, HealthState};
pub use pool::EndpointPool;

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
