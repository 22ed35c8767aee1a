// ── Core error types ──
//
// Gateway failures pass through untouched: the aggregation engine never
// reinterprets an API or transport error, it only aborts the pass.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // ── Gateway ──────────────────────────────────────────────────────
    #[error(transparent)]
    Api(#[from] micetro_api::Error),

    // ── Cache ────────────────────────────────────────────────────────
    #[error("Cache I/O error at {}: {source}", path.display())]
    CacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache entry could not be encoded: {0}")]
    CacheEncode(#[from] serde_json::Error),
}

impl CoreError {
    /// The gateway error underneath, if this came from the API.
    pub fn api(&self) -> Option<&micetro_api::Error> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }
}
