//! Web server module
//!
//! Provides the JSON HTTP API in front of the search service.

mod handlers;
mod routes;
mod state;

pub use handlers::{build_query, ApiError, SearchParams};
pub use routes::create_router;
pub use state::AppState;
