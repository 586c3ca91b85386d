use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::chunker::chunk;
use crate::config::CrawlConfig;
use crate::error::{CrawlError, StoreError};
use crate::flattener::flatten;
use crate::storage::DocumentStore;
use crate::types::{ContentHash, GenerationId, NewDocument};

/// Trait for the page source feeding a crawl (to allow mocking)
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_pages(&self, domain: &str) -> anyhow::Result<Vec<FetchedPage>>;
}

/// A single raw page delivered by the fetch source
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub path: String,
    pub content: String,
}

/// Lifecycle of one crawl attempt for one domain. `Failed` is terminal and
/// reachable from `Started` and `Ingesting`; an activation failure is also
/// terminal but leaves the previously active generation untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrawlState {
    Started,
    Ingesting,
    Activating,
    Completed,
    Failed,
}

/// One document that could not be ingested; the attempt carried on without it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub url: String,
    pub error: String,
}

/// Outcome of a completed crawl attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlReport {
    pub domain: String,
    pub generation_id: GenerationId,
    pub documents_ingested: usize,
    pub sections_inserted: u64,
    pub documents_activated: u64,
    pub failures: Vec<DocumentFailure>,
    /// Rows removed by post-activation cleanup; `None` when cleanup failed
    /// and the orphaned rows are left for a later attempt.
    pub rows_cleaned: Option<u64>,
}

/// Run one crawl of one domain end to end.
///
/// Mints a fresh generation, ingests every fetched page as inactive rows
/// through a bounded worker pool, then atomically swaps the domain's visible
/// generation and deletes the replaced rows. Readers only ever see the last
/// activated generation, whole. Callers must not run two attempts for the
/// same domain concurrently; attempts for different domains are independent.
pub async fn crawl_domain(
    domain: &str,
    fetcher: &impl PageFetcher,
    store: &impl DocumentStore,
    config: &CrawlConfig,
) -> Result<CrawlReport, CrawlError> {
    let generation_id = GenerationId::new();
    let mut state = CrawlState::Started;
    tracing::info!(domain = %domain, generation_id = %generation_id, "Starting crawl");

    let pages = match fetcher.fetch_pages(domain).await {
        Ok(pages) => pages,
        Err(source) => {
            tracing::error!(domain = %domain, error = %source, "Fetch source failed");
            transition(domain, generation_id, &mut state, CrawlState::Failed);
            return Err(CrawlError::Fetch {
                domain: domain.to_string(),
                source,
            });
        }
    };

    transition(domain, generation_id, &mut state, CrawlState::Ingesting);

    let outcomes: Vec<Result<u64, IngestFailure>> = stream::iter(pages)
        .map(|page| ingest_page(domain, generation_id, page, store))
        .buffer_unordered(config.max_concurrent_ingests)
        .collect()
        .await;

    let mut documents_ingested = 0;
    let mut sections_inserted = 0u64;
    let mut failures = Vec::new();
    let mut systemic: Option<StoreError> = None;
    for outcome in outcomes {
        match outcome {
            Ok(section_count) => {
                documents_ingested += 1;
                sections_inserted += section_count;
            }
            Err(failure) => {
                if systemic.is_none() && failure.source.is_systemic() {
                    systemic = Some(failure.source);
                } else {
                    failures.push(DocumentFailure {
                        url: failure.url,
                        error: failure.source.to_string(),
                    });
                }
            }
        }
    }

    if let Some(source) = systemic {
        tracing::error!(
            domain = %domain,
            generation_id = %generation_id,
            error = %source,
            "Systemic store failure; abandoning crawl attempt"
        );
        transition(domain, generation_id, &mut state, CrawlState::Failed);
        return Err(CrawlError::Store {
            domain: domain.to_string(),
            source,
        });
    }

    if documents_ingested == 0 {
        tracing::warn!(
            domain = %domain,
            generation_id = %generation_id,
            "No documents ingested; nothing to activate"
        );
        transition(domain, generation_id, &mut state, CrawlState::Failed);
        return Err(CrawlError::EmptyCrawl {
            domain: domain.to_string(),
        });
    }

    transition(domain, generation_id, &mut state, CrawlState::Activating);
    let documents_activated = match store.activate_generation(domain, generation_id).await {
        Ok(count) => count,
        Err(source) => {
            tracing::error!(
                domain = %domain,
                generation_id = %generation_id,
                error = %source,
                "Activation failed; previous generation stays visible"
            );
            transition(domain, generation_id, &mut state, CrawlState::Failed);
            return Err(CrawlError::Activation {
                domain: domain.to_string(),
                generation_id,
                source,
            });
        }
    };

    transition(domain, generation_id, &mut state, CrawlState::Completed);
    tracing::info!(
        domain = %domain,
        generation_id = %generation_id,
        documents_ingested,
        documents_activated,
        "Generation activated"
    );

    // Sweeps the replaced generation and any orphans from earlier failed
    // attempts. Failure here never reverts a completed crawl.
    let rows_cleaned = match store.cleanup_old_generations(domain).await {
        Ok(count) => {
            tracing::debug!(domain = %domain, rows = count, "Old generations removed");
            Some(count)
        }
        Err(error) => {
            tracing::warn!(
                domain = %domain,
                error = %error,
                "Cleanup failed; orphaned rows left for a later attempt"
            );
            None
        }
    };

    Ok(CrawlReport {
        domain: domain.to_string(),
        generation_id,
        documents_ingested,
        sections_inserted,
        documents_activated,
        failures,
        rows_cleaned,
    })
}

struct IngestFailure {
    url: String,
    source: StoreError,
}

/// Ingest one fetched page: insert the document row, chunk and flatten its
/// content, insert the sections. Everything written here is invisible to
/// readers until the generation is activated.
async fn ingest_page(
    domain: &str,
    generation_id: GenerationId,
    page: FetchedPage,
    store: &impl DocumentStore,
) -> Result<u64, IngestFailure> {
    let new_document = NewDocument {
        domain: domain.to_string(),
        url: page.url.clone(),
        path: page.path.clone(),
        content_hash: ContentHash::from_content(&page.content),
        generation_id,
    };

    let document = store
        .insert_document(&new_document)
        .await
        .map_err(|source| {
            tracing::warn!(url = %page.url, error = %source, "Failed to insert document");
            IngestFailure {
                url: page.url.clone(),
                source,
            }
        })?;

    let tree = chunk(&page.content);
    let sections = flatten(&tree, document.id);
    let count = store.insert_sections(&sections).await.map_err(|source| {
        tracing::warn!(url = %page.url, error = %source, "Failed to insert sections");
        IngestFailure {
            url: page.url.clone(),
            source,
        }
    })?;

    tracing::debug!(
        url = %page.url,
        document_id = %document.id,
        sections = count,
        "Ingested document"
    );
    Ok(count)
}

fn transition(domain: &str, generation_id: GenerationId, state: &mut CrawlState, next: CrawlState) {
    tracing::debug!(
        domain = %domain,
        generation_id = %generation_id,
        from = ?*state,
        to = ?next,
        "Crawl state transition"
    );
    *state = next;
}
