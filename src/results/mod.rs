//! Result types and normalization
//!
//! Raw upstream hits are canonicalized, deduplicated by URL and ordered here.

mod canonical;
mod normalizer;
mod types;

pub use canonical::canonicalize_url;
pub use normalizer::{normalize, normalize_timestamp};
pub use types::*;
