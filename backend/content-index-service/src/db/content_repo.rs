use async_trait::async_trait;
use chrono::{DateTime, Utc};
use content_index::{ContentSource, IndexError, ListParams, PrincipalId, RawContentItem};
use sqlx::PgPool;
use std::collections::HashSet;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
struct ContentItemRow {
    id: Uuid,
    title: String,
    content_type: String,
    status: String,
    author_id: Uuid,
    modified_at: DateTime<Utc>,
}

impl From<ContentItemRow> for RawContentItem {
    fn from(row: ContentItemRow) -> Self {
        RawContentItem {
            id: row.id,
            title: row.title,
            content_type: row.content_type,
            status: row.status,
            author_id: row.author_id,
            modified_at: row.modified_at,
        }
    }
}

/// Content source reading `content_items` and `content_editors`
#[derive(Clone)]
pub struct PgContentSource {
    pool: PgPool,
    placeholder_status: String,
}

impl PgContentSource {
    /// Items still in `placeholder_status` are never listed
    pub fn new(pool: PgPool, placeholder_status: impl Into<String>) -> Self {
        Self {
            pool,
            placeholder_status: placeholder_status.into(),
        }
    }
}

fn source_error(err: sqlx::Error) -> IndexError {
    warn!(error = %err, "Content source query failed");
    IndexError::ContentSourceUnavailable(err.to_string())
}

/// Postgres `LIMIT` takes a BIGINT
fn limit_param(limit: usize) -> content_index::Result<i64> {
    i64::try_from(limit).map_err(|_| {
        IndexError::Configuration(format!("results limit {} is out of range", limit))
    })
}

fn retain_viewable(
    principal: &PrincipalId,
    mut items: Vec<RawContentItem>,
    granted_types: &HashSet<String>,
) -> Vec<RawContentItem> {
    items.retain(|item| {
        item.author_id == principal.0 || granted_types.contains(&item.content_type)
    });
    items
}

#[async_trait]
impl ContentSource for PgContentSource {
    /// Newest items first, excluding soft-deleted rows
    async fn list_content(&self, params: &ListParams) -> content_index::Result<Vec<RawContentItem>> {
        let rows = sqlx::query_as::<_, ContentItemRow>(
            r#"
            SELECT id, title, content_type, status, author_id, modified_at
            FROM content_items
            WHERE deleted_at IS NULL AND status <> $1
            ORDER BY modified_at DESC
            LIMIT $2
            "#,
        )
        .bind(&self.placeholder_status)
        .bind(limit_param(params.limit)?)
        .fetch_all(&self.pool)
        .await
        .map_err(source_error)?;

        Ok(rows.into_iter().map(RawContentItem::from).collect())
    }

    /// Authors see their own items; editors see every item of a granted type
    async fn can_view(
        &self,
        principal: &PrincipalId,
        item: &RawContentItem,
    ) -> content_index::Result<bool> {
        if item.author_id == principal.0 {
            return Ok(true);
        }

        let granted: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM content_editors
                WHERE principal_id = $1 AND content_type = $2
            )
            "#,
        )
        .bind(principal.0)
        .bind(&item.content_type)
        .fetch_one(&self.pool)
        .await
        .map_err(source_error)?;

        Ok(granted)
    }

    /// Loads the principal's granted types once for the whole batch
    async fn filter_viewable(
        &self,
        principal: &PrincipalId,
        items: Vec<RawContentItem>,
    ) -> content_index::Result<Vec<RawContentItem>> {
        if items.iter().all(|item| item.author_id == principal.0) {
            return Ok(items);
        }

        let granted_types: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT content_type FROM content_editors
            WHERE principal_id = $1
            "#,
        )
        .bind(principal.0)
        .fetch_all(&self.pool)
        .await
        .map_err(source_error)?;

        let granted_types: HashSet<String> = granted_types.into_iter().collect();
        Ok(retain_viewable(principal, items, &granted_types))
    }
}
