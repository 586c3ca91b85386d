use serde::{Deserialize, Serialize};

/// Tuning knobs for one crawl attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Upper bound on documents ingested concurrently within one attempt.
    /// Never below 1; the worker pool must be able to make progress.
    pub max_concurrent_ingests: usize,
}

impl CrawlConfig {
    pub fn new() -> Self {
        Self {
            max_concurrent_ingests: 4,
        }
    }

    pub fn with_max_concurrent_ingests(mut self, limit: usize) -> Self {
        self.max_concurrent_ingests = limit.max(1);
        self
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self::new()
    }
}
