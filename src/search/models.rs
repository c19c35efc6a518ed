//! Response models for the search endpoints

use crate::results::ResultSet;
use serde::{Deserialize, Serialize};

/// A result set plus whether it came from the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(flatten)]
    pub result_set: ResultSet,
    pub cached: bool,
}

impl SearchResponse {
    pub fn fresh(result_set: ResultSet) -> Self {
        Self {
            result_set,
            cached: false,
        }
    }

    pub fn cached(result_set: ResultSet) -> Self {
        Self {
            result_set,
            cached: true,
        }
    }
}
