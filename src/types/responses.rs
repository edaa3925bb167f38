//! Request and response shells for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::scan::ScanStats;

/// Body of `POST /scan`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub root_dir: String,
    /// Reset the store before scanning instead of accumulating.
    #[serde(default)]
    pub clear: bool,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub success: bool,
    pub stats: ScanStats,
}
