//! Repository for the `page_blocks` table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::page_block::{CreatePageBlock, PageBlock};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, document_id, snapshot_id, page_id, block_id, \
                       name, sort_order, created_at, updated_at";

/// Provides CRUD operations for page blocks, always snapshot-scoped.
pub struct PageBlockRepo;

impl PageBlockRepo {
    /// Insert a block, appending it after the page's current last block.
    pub async fn insert(pool: &PgPool, input: &CreatePageBlock) -> Result<PageBlock, sqlx::Error> {
        let query = format!(
            "INSERT INTO page_blocks (document_id, snapshot_id, page_id, block_id, name, sort_order)
             SELECT $1, $2, $3, $4, $5,
                    COALESCE(MAX(sort_order) + 1, 0)
             FROM page_blocks
             WHERE snapshot_id = $2 AND page_id = $3
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PageBlock>(&query)
            .bind(&input.document_id)
            .bind(input.snapshot_id)
            .bind(&input.page_id)
            .bind(&input.block_id)
            .bind(&input.name)
            .fetch_one(pool)
            .await
    }

    /// Find a block by its business key within a snapshot.
    pub async fn find(
        pool: &PgPool,
        block_id: &str,
        snapshot_id: Uuid,
    ) -> Result<Option<PageBlock>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM page_blocks WHERE block_id = $1 AND snapshot_id = $2"
        );
        sqlx::query_as::<_, PageBlock>(&query)
            .bind(block_id)
            .bind(snapshot_id)
            .fetch_optional(pool)
            .await
    }

    /// Blocks of one page in one snapshot, in order.
    pub async fn list_for_page(
        pool: &PgPool,
        page_id: &str,
        snapshot_id: Uuid,
    ) -> Result<Vec<PageBlock>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM page_blocks
             WHERE page_id = $1 AND snapshot_id = $2
             ORDER BY sort_order, id"
        );
        sqlx::query_as::<_, PageBlock>(&query)
            .bind(page_id)
            .bind(snapshot_id)
            .fetch_all(pool)
            .await
    }

    /// Highest sort_order on a page, or `None` for an empty page.
    pub async fn max_order(
        pool: &PgPool,
        page_id: &str,
        snapshot_id: Uuid,
    ) -> Result<Option<i32>, sqlx::Error> {
        let (max,): (Option<i32>,) = sqlx::query_as(
            "SELECT MAX(sort_order) FROM page_blocks WHERE page_id = $1 AND snapshot_id = $2",
        )
        .bind(page_id)
        .bind(snapshot_id)
        .fetch_one(pool)
        .await?;
        Ok(max)
    }
}
