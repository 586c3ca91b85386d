use thiserror::Error;

use crate::types::GenerationId;

/// Failure surfaced by the persistence layer. Storage never interprets these;
/// the crawl orchestrator classifies them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether the store itself is unhealthy, as opposed to a single row being
    /// rejected. Systemic failures abort the whole crawl attempt.
    pub fn is_systemic(&self) -> bool {
        match self {
            StoreError::Unavailable(_) => true,
            StoreError::Database(err) => matches!(
                err,
                sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::Protocol(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            ),
        }
    }
}

/// A crawl attempt that could not complete. Rows already written for the new
/// generation stay inactive and are swept by a later cleanup; nothing the
/// attempt wrote ever becomes visible to readers.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("fetch source failed for {domain}: {source}")]
    Fetch {
        domain: String,
        source: anyhow::Error,
    },

    #[error("store failure aborted crawl of {domain}: {source}")]
    Store {
        domain: String,
        #[source]
        source: StoreError,
    },

    #[error("no documents ingested for {domain}; nothing to activate")]
    EmptyCrawl { domain: String },

    #[error("activating generation {generation_id} for {domain} failed: {source}")]
    Activation {
        domain: String,
        generation_id: GenerationId,
        #[source]
        source: StoreError,
    },
}
