//! Upstream aggregator access
//!
//! One bounded call per query to the SearXNG instance; partial engine
//! failure is reported, not raised.

mod client;
mod response;

pub use client::{UpstreamClient, UpstreamFetch};
