//! Configuration for the artwork module.

use serde::{Deserialize, Serialize};

/// Configuration for the HTTP artwork fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtworkConfig {
    /// Timeout for a single candidate download in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User agent sent with artwork requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout() -> u64 {
    15
}

fn default_user_agent() -> String {
    format!("tunegrab/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ArtworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}
