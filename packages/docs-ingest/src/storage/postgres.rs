use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use crate::error::StoreError;
use crate::storage::DocumentStore;
use crate::types::{
    ContentHash, Document, DocumentId, GenerationId, NewDocument, Section, SectionHit, SectionId,
};

/// Embedded schema migrations, applied with [`PostgresStore::migrate`]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with a pool sized for one crawler process.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Apply any pending schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.into()))?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn insert_document(&self, document: &NewDocument) -> Result<Document, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO documents (domain, url, path, content_hash, generation_id, generation_active)
            VALUES ($1, $2, $3, $4, $5, false)
            RETURNING id, domain, url, path, content_hash, generation_id, generation_active, inserted_at
            "#,
        )
        .bind(&document.domain)
        .bind(&document.url)
        .bind(&document.path)
        .bind(document.content_hash.as_str())
        .bind(document.generation_id.0)
        .fetch_one(&self.pool)
        .await?;

        Ok(document_from_row(&row))
    }

    async fn insert_sections(&self, sections: &[Section]) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        for section in sections {
            sqlx::query(
                r#"
                INSERT INTO sections (id, document_id, parent_section_id, heading, level, content, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(section.id.0)
            .bind(section.document_id.0)
            .bind(section.parent_section_id.map(|id| id.0))
            .bind(&section.heading)
            .bind(section.level)
            .bind(&section.content)
            .bind(section.position)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(sections.len() as u64)
    }

    async fn activate_generation(
        &self,
        domain: &str,
        generation_id: GenerationId,
    ) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Deactivate before activate: the partial unique index on
        // (domain, path) is checked per statement, and readers see neither
        // step until the commit.
        sqlx::query(
            r#"
            UPDATE documents
            SET generation_active = false
            WHERE domain = $1 AND generation_active AND generation_id <> $2
            "#,
        )
        .bind(domain)
        .bind(generation_id.0)
        .execute(&mut *tx)
        .await?;

        let activated = sqlx::query(
            r#"
            UPDATE documents
            SET generation_active = true
            WHERE domain = $1 AND generation_id = $2
            "#,
        )
        .bind(domain)
        .bind(generation_id.0)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(activated.rows_affected())
    }

    async fn cleanup_old_generations(&self, domain: &str) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM documents
            WHERE domain = $1 AND generation_active = false
            "#,
        )
        .bind(domain)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn get_document(
        &self,
        domain: &str,
        path: &str,
    ) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, domain, url, path, content_hash, generation_id, generation_active, inserted_at
            FROM documents_active
            WHERE domain = $1 AND path = $2
            "#,
        )
        .bind(domain)
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(document_from_row))
    }

    async fn list_documents(&self, domain: &str) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, domain, url, path, content_hash, generation_id, generation_active, inserted_at
            FROM documents_active
            WHERE domain = $1
            ORDER BY path
            "#,
        )
        .bind(domain)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(document_from_row).collect())
    }

    async fn get_sections_by_document(
        &self,
        document_id: DocumentId,
    ) -> Result<Vec<Section>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, s.document_id, s.parent_section_id, s.heading, s.level, s.content, s.position
            FROM sections s
            JOIN documents_active d ON d.id = s.document_id
            WHERE s.document_id = $1
            ORDER BY s.position
            "#,
        )
        .bind(document_id.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(section_from_row).collect())
    }

    async fn search_sections(
        &self,
        term: &str,
        domain: Option<&str>,
        limit: i64,
    ) -> Result<Vec<SectionHit>, StoreError> {
        let pattern = format!("%{}%", escape_like(term));

        let rows = sqlx::query(
            r#"
            SELECT s.id, s.document_id, s.parent_section_id, s.heading, s.level, s.content, s.position,
                   d.url, d.path
            FROM sections s
            JOIN documents_active d ON d.id = s.document_id
            WHERE (s.content ILIKE $1 OR s.heading ILIKE $1)
              AND ($2::text IS NULL OR d.domain = $2)
            ORDER BY d.path, s.position
            LIMIT $3
            "#,
        )
        .bind(&pattern)
        .bind(domain)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| SectionHit {
                section: section_from_row(row),
                url: row.get("url"),
                path: row.get("path"),
            })
            .collect())
    }
}

fn document_from_row(row: &PgRow) -> Document {
    Document {
        id: DocumentId(row.get("id")),
        domain: row.get("domain"),
        url: row.get("url"),
        path: row.get("path"),
        content_hash: ContentHash(row.get("content_hash")),
        generation_id: GenerationId(row.get("generation_id")),
        generation_active: row.get("generation_active"),
        inserted_at: row.get("inserted_at"),
    }
}

fn section_from_row(row: &PgRow) -> Section {
    Section {
        id: SectionId(row.get("id")),
        document_id: DocumentId(row.get("document_id")),
        parent_section_id: row
            .get::<Option<uuid::Uuid>, _>("parent_section_id")
            .map(SectionId),
        heading: row.get("heading"),
        level: row.get("level"),
        content: row.get("content"),
        position: row.get("position"),
    }
}

/// Escape LIKE wildcards so a search term is matched literally
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("100%_done"), "100\\%\\_done");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
