use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{Document, DocumentId, GenerationId, NewDocument, Section, SectionHit};

pub mod postgres;
pub use postgres::PostgresStore;

/// CRUD surface over the relational store. Holds no crawl policy: the
/// orchestrator decides when a generation changes state, storage only moves
/// rows. All query operations read through the active-generation projection,
/// so they cannot observe an in-flight or orphaned generation.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert one document row. Always inserts; never upserts, never compares
    /// hashes, never skips. The row starts inactive and the store assigns the
    /// id.
    async fn insert_document(&self, document: &NewDocument) -> Result<Document, StoreError>;

    /// Bulk-insert fully-formed sections; the caller supplies all ids and
    /// links, with parents ahead of their children (pre-order, as the
    /// flattener emits them). All-or-nothing: a failed row aborts the whole
    /// call and nothing from it persists.
    async fn insert_sections(&self, sections: &[Section]) -> Result<u64, StoreError>;

    /// Atomically make `generation_id` the visible generation for `domain`,
    /// deactivating every other row of that domain in the same transaction.
    /// Returns the number of rows activated.
    async fn activate_generation(
        &self,
        domain: &str,
        generation_id: GenerationId,
    ) -> Result<u64, StoreError>;

    /// Delete every inactive row of the domain, whichever generation it came
    /// from; sections go with their documents. Returns documents deleted.
    async fn cleanup_old_generations(&self, domain: &str) -> Result<u64, StoreError>;

    /// The active document at (domain, path), if any.
    async fn get_document(&self, domain: &str, path: &str)
        -> Result<Option<Document>, StoreError>;

    /// All active documents for a domain, ordered by path.
    async fn list_documents(&self, domain: &str) -> Result<Vec<Document>, StoreError>;

    /// Sections of an active document in flattened order.
    async fn get_sections_by_document(
        &self,
        document_id: DocumentId,
    ) -> Result<Vec<Section>, StoreError>;

    /// Case-insensitive substring search over active sections, optionally
    /// narrowed to one domain.
    async fn search_sections(
        &self,
        term: &str,
        domain: Option<&str>,
        limit: i64,
    ) -> Result<Vec<SectionHit>, StoreError>;
}
