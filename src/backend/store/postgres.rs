//! PostgreSQL document store
//!
//! All collections share one table:
//!
//! ```sql
//! documents(collection TEXT, id UUID, body JSONB, created_at TIMESTAMPTZ)
//! ```
//!
//! Field merges and array pushes, pulls and patches are single `UPDATE`
//! statements built from JSONB operators, so they are atomic per document.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use super::{DocumentStore, ElementMatch, StoreError};

/// Document store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the bundled migrations
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!().run(&self.pool).await
    }

    async fn ensure_array(&self, collection: &str, id: Uuid, field: &str) -> Result<(), StoreError> {
        let kind = sqlx::query_scalar::<_, Option<String>>(
            r#"
            SELECT jsonb_typeof(body -> $3)
            FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(field)
        .fetch_optional(&self.pool)
        .await?;

        match kind {
            Some(Some(kind)) if kind != "array" && kind != "null" => Err(StoreError::NotAnArray {
                collection: collection.to_string(),
                id,
                field: field.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn insert(&self, collection: &str, id: Uuid, doc: Value) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO NOTHING
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(&doc)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Duplicate {
                collection: collection.to_string(),
                id,
            });
        }
        Ok(())
    }

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError> {
        let body = sqlx::query_scalar::<_, Value>(
            r#"
            SELECT body FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(body)
    }

    async fn merge_fields(
        &self,
        collection: &str,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> Result<Option<Value>, StoreError> {
        let body = sqlx::query_scalar::<_, Value>(
            r#"
            UPDATE documents SET body = body || $3::jsonb
            WHERE collection = $1 AND id = $2
            RETURNING body
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Value::Object(fields))
        .fetch_optional(&self.pool)
        .await?;

        Ok(body)
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let bodies = sqlx::query_scalar::<_, Value>(
            r#"
            SELECT body FROM documents
            WHERE collection = $1
            ORDER BY seq
            "#,
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        Ok(bodies)
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, StoreError> {
        let bodies = sqlx::query_scalar::<_, Value>(
            r#"
            SELECT body FROM documents
            WHERE collection = $1 AND body -> $2 = $3
            ORDER BY seq
            "#,
        )
        .bind(collection)
        .bind(field)
        .bind(value)
        .fetch_all(&self.pool)
        .await?;

        Ok(bodies)
    }

    async fn push_to_array(
        &self,
        collection: &str,
        id: Uuid,
        field: &str,
        value: Value,
    ) -> Result<bool, StoreError> {
        self.ensure_array(collection, id, field).await?;

        let result = sqlx::query(
            r#"
            UPDATE documents
            SET body = CASE
                WHEN COALESCE(NULLIF(body -> $3, 'null'::jsonb), '[]'::jsonb) @> jsonb_build_array($4::jsonb)
                    THEN body
                ELSE jsonb_set(
                    body,
                    ARRAY[$3::text],
                    COALESCE(NULLIF(body -> $3, 'null'::jsonb), '[]'::jsonb) || jsonb_build_array($4::jsonb),
                    true
                )
            END
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(field)
        .bind(&value)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn pull_from_array(
        &self,
        collection: &str,
        id: Uuid,
        field: &str,
        value: &Value,
    ) -> Result<bool, StoreError> {
        self.ensure_array(collection, id, field).await?;

        let result = sqlx::query(
            r#"
            UPDATE documents
            SET body = jsonb_set(
                body,
                ARRAY[$3::text],
                COALESCE(
                    (
                        SELECT jsonb_agg(e.elem ORDER BY e.idx)
                        FROM jsonb_array_elements(
                            COALESCE(NULLIF(body -> $3, 'null'::jsonb), '[]'::jsonb)
                        ) WITH ORDINALITY AS e(elem, idx)
                        WHERE e.elem <> $4::jsonb
                    ),
                    '[]'::jsonb
                ),
                true
            )
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(field)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn push_keyed(
        &self,
        collection: &str,
        id: Uuid,
        field: &str,
        key: &str,
        value: Value,
    ) -> Result<Option<bool>, StoreError> {
        self.ensure_array(collection, id, field).await?;

        let result = sqlx::query(
            r#"
            UPDATE documents
            SET body = jsonb_set(
                body,
                ARRAY[$3::text],
                COALESCE(NULLIF(body -> $3, 'null'::jsonb), '[]'::jsonb) || jsonb_build_array($5::jsonb),
                true
            )
            WHERE collection = $1 AND id = $2
              AND NOT EXISTS (
                SELECT 1
                FROM jsonb_array_elements(COALESCE(NULLIF(body -> $3, 'null'::jsonb), '[]'::jsonb)) AS e(elem)
                WHERE e.elem -> $4 = $5::jsonb -> $4
              )
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(field)
        .bind(key)
        .bind(&value)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(Some(true));
        }
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM documents WHERE collection = $1 AND id = $2)
            "#,
        )
        .bind(collection)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.then_some(false))
    }

    async fn pull_keyed(
        &self,
        collection: &str,
        id: Uuid,
        field: &str,
        matching: ElementMatch<'_>,
    ) -> Result<bool, StoreError> {
        self.ensure_array(collection, id, field).await?;

        let result = sqlx::query(
            r#"
            UPDATE documents
            SET body = jsonb_set(
                body,
                ARRAY[$3::text],
                COALESCE(
                    (
                        SELECT jsonb_agg(e.elem ORDER BY e.idx)
                        FROM jsonb_array_elements(
                            COALESCE(NULLIF(body -> $3, 'null'::jsonb), '[]'::jsonb)
                        ) WITH ORDINALITY AS e(elem, idx)
                        WHERE (e.elem -> $4) IS DISTINCT FROM $5::jsonb
                    ),
                    '[]'::jsonb
                ),
                true
            )
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(field)
        .bind(matching.key)
        .bind(matching.value)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn patch_elements(
        &self,
        collection: &str,
        id: Uuid,
        field: &str,
        matching: Option<ElementMatch<'_>>,
        patch: Map<String, Value>,
    ) -> Result<Option<Value>, StoreError> {
        self.ensure_array(collection, id, field).await?;

        let body = sqlx::query_scalar::<_, Value>(
            r#"
            UPDATE documents
            SET body = jsonb_set(
                body,
                ARRAY[$3::text],
                COALESCE(
                    (
                        SELECT jsonb_agg(
                            CASE
                                WHEN jsonb_typeof(e.elem) = 'object'
                                    AND ($4::text IS NULL OR e.elem -> $4::text = $5::jsonb)
                                    THEN e.elem || $6::jsonb
                                ELSE e.elem
                            END
                            ORDER BY e.idx
                        )
                        FROM jsonb_array_elements(
                            COALESCE(NULLIF(body -> $3, 'null'::jsonb), '[]'::jsonb)
                        ) WITH ORDINALITY AS e(elem, idx)
                    ),
                    '[]'::jsonb
                ),
                true
            )
            WHERE collection = $1 AND id = $2
            RETURNING body
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(field)
        .bind(matching.map(|m| m.key))
        .bind(matching.map(|m| m.value))
        .bind(Value::Object(patch))
        .fetch_optional(&self.pool)
        .await?;

        Ok(body)
    }
}
