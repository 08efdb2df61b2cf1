//! Result types for normalized search output
//!
//! A [`ResultSet`] is built once by the backend client and never changes
//! afterwards, apart from the cache flag set when it is served from cache.

mod types;

pub use types::*;
