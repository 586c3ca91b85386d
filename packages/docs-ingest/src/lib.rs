// Generation-based document ingestion: fetched pages are chunked into section
// trees, flattened, and written as an inactive generation that one atomic swap
// makes visible.
pub mod chunker;
pub mod config;
pub mod crawler;
pub mod error;
pub mod flattener;
pub mod storage;
pub mod types;

// Re-exports for clean API
pub use chunker::chunk;
pub use config::CrawlConfig;
pub use crawler::{crawl_domain, CrawlReport, CrawlState, DocumentFailure, FetchedPage, PageFetcher};
pub use error::{CrawlError, StoreError};
pub use flattener::flatten;
pub use storage::{DocumentStore, PostgresStore};
pub use types::{
    ContentHash, Document, DocumentId, GenerationId, NewDocument, Section, SectionHit, SectionId,
    SectionNode,
};
