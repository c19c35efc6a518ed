//! Web server module
//!
//! Exposes the search variants, health and stats over HTTP.

mod handlers;
mod routes;
mod state;

pub use handlers::ErrorBody;
pub use routes::create_router;
pub use state::AppState;
