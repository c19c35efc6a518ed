//! Search orchestration module
//!
//! Takes a request from the auth check through cache and upstream to the
//! final response.

mod executor;
mod models;

pub use executor::Search;
pub use models::*;
