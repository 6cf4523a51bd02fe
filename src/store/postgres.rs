//! Postgres-backed document store.
//!
//! All collections share the `documents` table; a document body is a JSONB
//! column and `version` backs the optimistic writes in `update`.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;

use super::{
    new_document_id, Document, DocumentStore, Fields, Filter, FilterOp, StoreError, StoreResult,
};

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: String,
    data: Json<Fields>,
    version: i64,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            data: row.data.0,
            version: row.version,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect, then apply the embedded migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!("Connected to document database");

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Document store migrations complete");

        Ok(Self::new(pool))
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &[Filter]) {
    for filter in filters {
        match &filter.op {
            FilterOp::Eq(value) => {
                qb.push(" AND data -> ");
                qb.push_bind(filter.field.clone());
                qb.push(" = ");
                qb.push_bind(Json(value.clone()));
            }
            FilterOp::Prefix(prefix) => {
                qb.push(" AND jsonb_typeof(data -> ");
                qb.push_bind(filter.field.clone());
                qb.push(") = 'string' AND starts_with(data ->> ");
                qb.push_bind(filter.field.clone());
                qb.push(", ");
                qb.push_bind(prefix.clone());
                qb.push(")");
            }
        }
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let row: Option<DocumentRow> = sqlx::query_as(
            "SELECT id, data, version FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Document::from))
    }

    async fn list(&self, collection: &str, filters: &[Filter]) -> StoreResult<Vec<Document>> {
        let mut qb =
            QueryBuilder::<Postgres>::new("SELECT id, data, version FROM documents WHERE collection = ");
        qb.push_bind(collection.to_string());
        push_filters(&mut qb, filters);
        qb.push(" ORDER BY id");

        let rows: Vec<DocumentRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn insert(&self, collection: &str, data: Fields) -> StoreResult<Document> {
        let row: DocumentRow = sqlx::query_as(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            RETURNING id, data, version
            "#,
        )
        .bind(collection)
        .bind(new_document_id())
        .bind(Json(data))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn set(&self, collection: &str, id: &str, data: Fields) -> StoreResult<Document> {
        let row: DocumentRow = sqlx::query_as(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO UPDATE
                SET data = EXCLUDED.data,
                    version = documents.version + 1,
                    updated_at = NOW()
            RETURNING id, data, version
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(data))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Fields,
        expected_version: Option<i64>,
    ) -> StoreResult<Document> {
        let row: Option<DocumentRow> = sqlx::query_as(
            r#"
            UPDATE documents
            SET data = data || $3, version = version + 1, updated_at = NOW()
            WHERE collection = $1 AND id = $2 AND ($4::BIGINT IS NULL OR version = $4)
            RETURNING id, data, version
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(patch))
        .bind(expected_version)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(row.into());
        }

        // Nothing matched: either the document is gone or its version moved.
        let actual: Option<i64> =
            sqlx::query_scalar("SELECT version FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match (actual, expected_version) {
            (Some(actual), Some(expected)) => Err(StoreError::VersionConflict { expected, actual }),
            _ => Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_where(&self, collection: &str, filters: &[Filter]) -> StoreResult<usize> {
        let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM documents WHERE collection = ");
        qb.push_bind(collection.to_string());
        push_filters(&mut qb, filters);

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected() as usize)
    }
}
