//! Multi-table tree mutations that must run as a single transaction.
//!
//! Components reference blocks reference nav nodes, so every cascade
//! here runs in that dependency order: components, then blocks, then
//! nav nodes.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::EditingSessionRepo;

/// Row counts removed by a subtree delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeletedCounts {
    pub components: u64,
    pub blocks: u64,
    pub nodes: u64,
}

/// Mutations spanning nav_nodes, page_blocks, and components.
pub struct TreeRepo;

impl TreeRepo {
    /// Delete a nav node and everything beneath it within one snapshot:
    /// the node's descendants, their blocks, and their components.
    ///
    /// Runs in one transaction so a failure leaves no orphaned rows.
    pub async fn delete_subtree(
        pool: &PgPool,
        page_id: &str,
        snapshot_id: Uuid,
    ) -> Result<DeletedCounts, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let pages: Vec<(String,)> = sqlx::query_as(
            "WITH RECURSIVE descendants AS (
                 SELECT page_id FROM nav_nodes
                 WHERE page_id = $1 AND snapshot_id = $2
                 UNION ALL
                 SELECT n.page_id FROM nav_nodes n
                 JOIN descendants d ON n.parent_page_id = d.page_id
                 WHERE n.snapshot_id = $2
             )
             SELECT page_id FROM descendants",
        )
        .bind(page_id)
        .bind(snapshot_id)
        .fetch_all(&mut *tx)
        .await?;
        let page_ids: Vec<String> = pages.into_iter().map(|(p,)| p).collect();

        let components = sqlx::query(
            "DELETE FROM components WHERE snapshot_id = $2 AND page_id = ANY($1)",
        )
        .bind(&page_ids)
        .bind(snapshot_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let blocks = sqlx::query(
            "DELETE FROM page_blocks WHERE snapshot_id = $2 AND page_id = ANY($1)",
        )
        .bind(&page_ids)
        .bind(snapshot_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let nodes = sqlx::query(
            "DELETE FROM nav_nodes WHERE snapshot_id = $2 AND page_id = ANY($1)",
        )
        .bind(&page_ids)
        .bind(snapshot_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok(DeletedCounts {
            components,
            blocks,
            nodes,
        })
    }

    /// Rewrite the document identity of one snapshot across all three
    /// tree tables and the session rows pointing at it. Used when a
    /// temporary document id is promoted to a permanent one, or when two
    /// previously-separate identities are merged.
    pub async fn rebind_snapshot(
        pool: &PgPool,
        old_document_id: Option<&str>,
        new_document_id: &str,
        snapshot_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        for table in ["components", "page_blocks", "nav_nodes"] {
            let query = format!(
                "UPDATE {table} SET document_id = $2
                 WHERE snapshot_id = $3
                   AND (document_id = $1 OR ($1::text IS NULL AND document_id IS NULL))"
            );
            sqlx::query(&query)
                .bind(old_document_id)
                .bind(new_document_id)
                .bind(snapshot_id)
                .execute(&mut *tx)
                .await?;
        }

        EditingSessionRepo::rebind_document(&mut *tx, old_document_id, new_document_id, snapshot_id)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
