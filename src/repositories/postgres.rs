use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashSet;

use super::{ContentRepository, RepositoryError};
use crate::content::{Content, ContentStatus, ContentVersion};

/// PostgreSQL store. The full record is kept as a JSONB document; the
/// columns beside it exist for lookups and the revision check.
#[derive(Clone)]
pub struct PgContentRepository {
    pool: PgPool,
}

impl PgContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn document(content: &Content) -> Result<serde_json::Value, RepositoryError> {
        let mut value = serde_json::to_value(content)?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("versions".into(), serde_json::Value::Array(Vec::new()));
        }
        Ok(value)
    }

    async fn load_versions(&self, content_id: &str) -> Result<Vec<ContentVersion>, RepositoryError> {
        let rows: Vec<serde_json::Value> = sqlx::query_scalar(
            "SELECT document FROM content_versions WHERE content_id = $1 ORDER BY version",
        )
        .bind(content_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(RepositoryError::from))
            .collect()
    }

    async fn current_revision(&self, id: &str) -> Result<Option<u64>, RepositoryError> {
        let revision: Option<i64> = sqlx::query_scalar("SELECT revision FROM contents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(revision.map(|r| r as u64))
    }
}

#[async_trait]
impl ContentRepository for PgContentRepository {
    async fn get(&self, id: &str) -> Result<Option<Content>, RepositoryError> {
        let doc: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT document FROM contents WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(doc) = doc else {
            return Ok(None);
        };
        let mut content: Content = serde_json::from_value(doc)?;
        content.versions = self.load_versions(id).await?;
        Ok(Some(content))
    }

    async fn create(&self, content: &Content) -> Result<(), RepositoryError> {
        let syndication = content.syndication.as_ref();
        let result = sqlx::query(
            r#"
            INSERT INTO contents
                  (id, version, revision, status, feed_id, fingerprint, scheduled_at, document, created_at, updated_at)
            VALUES ($1, $2,      $3,       $4,     $5,      $6,          $7,           $8,       $9,         $10)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&content.id)
        .bind(content.version as i32)
        .bind(content.revision as i64)
        .bind(content.status.as_str())
        .bind(syndication.map(|s| s.feed_id.as_str()))
        .bind(syndication.map(|s| s.fingerprint.as_str()))
        .bind(content.scheduled_at)
        .bind(Self::document(content)?)
        .bind(content.created_at)
        .bind(content.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::AlreadyExists(content.id.clone()));
        }
        Ok(())
    }

    async fn update(&self, content: &Content) -> Result<u64, RepositoryError> {
        let mut next = content.clone();
        next.revision = content.revision + 1;

        let written: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE contents
               SET version      = $2,
                   revision     = revision + 1,
                   status       = $3,
                   scheduled_at = $4,
                   document     = $5,
                   updated_at   = $6
             WHERE id = $1 AND revision = $7
            RETURNING revision
            "#,
        )
        .bind(&next.id)
        .bind(next.version as i32)
        .bind(next.status.as_str())
        .bind(next.scheduled_at)
        .bind(Self::document(&next)?)
        .bind(next.updated_at)
        .bind(content.revision as i64)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(revision) = written {
            return Ok(revision as u64);
        }
        match self.current_revision(&content.id).await? {
            None => Err(RepositoryError::NotFound(content.id.clone())),
            Some(actual) => Err(RepositoryError::Conflict {
                id: content.id.clone(),
                expected: content.revision,
                actual,
            }),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM contents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_fingerprints(&self, feed_id: &str) -> Result<HashSet<String>, RepositoryError> {
        let rows: Vec<String> = sqlx::query_scalar(
            "SELECT fingerprint FROM contents WHERE feed_id = $1 AND fingerprint IS NOT NULL",
        )
        .bind(feed_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn append_version(
        &self,
        content_id: &str,
        version: &ContentVersion,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO content_versions (content_id, version, document, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (content_id, version) DO NOTHING
            "#,
        )
        .bind(content_id)
        .bind(version.version as i32)
        .bind(serde_json::to_value(version)?)
        .bind(version.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(RepositoryError::NotFound(content_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_due_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Content>, RepositoryError> {
        let rows: Vec<serde_json::Value> = sqlx::query_scalar(
            r#"
            SELECT document FROM contents
             WHERE status = $1 AND scheduled_at <= $2
             ORDER BY scheduled_at
            "#,
        )
        .bind(ContentStatus::Approved.as_str())
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(RepositoryError::from))
            .collect()
    }
}
