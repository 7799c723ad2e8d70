//! Repository for the `nav_nodes` table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::nav_node::{CreateNavNode, NavNode};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, document_id, snapshot_id, page_id, parent_page_id, \
                       title, sort_order, is_active, created_at, updated_at";

/// Provides CRUD and traversal operations for the navigation forest of
/// one snapshot. Every query takes the snapshot id explicitly.
pub struct NavNodeRepo;

impl NavNodeRepo {
    /// Insert a nav node, appending it after the current last sibling.
    pub async fn insert(pool: &PgPool, input: &CreateNavNode) -> Result<NavNode, sqlx::Error> {
        let query = format!(
            "INSERT INTO nav_nodes (document_id, snapshot_id, page_id, parent_page_id, title, sort_order)
             SELECT $1, $2, $3, $4, $5,
                    COALESCE(MAX(sort_order) + 1, 0)
             FROM nav_nodes
             WHERE snapshot_id = $2
               AND (parent_page_id = $4 OR ($4::text IS NULL AND parent_page_id IS NULL))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NavNode>(&query)
            .bind(&input.document_id)
            .bind(input.snapshot_id)
            .bind(&input.page_id)
            .bind(&input.parent_page_id)
            .bind(&input.title)
            .fetch_one(pool)
            .await
    }

    /// Find a node by its business key within a snapshot.
    pub async fn find(
        pool: &PgPool,
        page_id: &str,
        snapshot_id: Uuid,
    ) -> Result<Option<NavNode>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM nav_nodes WHERE page_id = $1 AND snapshot_id = $2"
        );
        sqlx::query_as::<_, NavNode>(&query)
            .bind(page_id)
            .bind(snapshot_id)
            .fetch_optional(pool)
            .await
    }

    /// Root nodes (null parent) of a document snapshot, in order.
    pub async fn roots(
        pool: &PgPool,
        document_id: &str,
        snapshot_id: Uuid,
    ) -> Result<Vec<NavNode>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM nav_nodes
             WHERE document_id = $1 AND snapshot_id = $2 AND parent_page_id IS NULL
             ORDER BY sort_order, id"
        );
        sqlx::query_as::<_, NavNode>(&query)
            .bind(document_id)
            .bind(snapshot_id)
            .fetch_all(pool)
            .await
    }

    /// Direct children of a node, in order.
    pub async fn children(
        pool: &PgPool,
        parent_page_id: &str,
        snapshot_id: Uuid,
    ) -> Result<Vec<NavNode>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM nav_nodes
             WHERE parent_page_id = $1 AND snapshot_id = $2
             ORDER BY sort_order, id"
        );
        sqlx::query_as::<_, NavNode>(&query)
            .bind(parent_page_id)
            .bind(snapshot_id)
            .fetch_all(pool)
            .await
    }

    /// The node plus all of its descendants within the snapshot,
    /// breadth before depth, siblings in order.
    pub async fn subtree(
        pool: &PgPool,
        page_id: &str,
        snapshot_id: Uuid,
    ) -> Result<Vec<NavNode>, sqlx::Error> {
        let query = format!(
            "WITH RECURSIVE descendants AS (
                 SELECT {COLUMNS}, 0 AS depth FROM nav_nodes
                 WHERE page_id = $1 AND snapshot_id = $2
                 UNION ALL
                 SELECT n.id, n.document_id, n.snapshot_id, n.page_id, n.parent_page_id,
                        n.title, n.sort_order, n.is_active, n.created_at, n.updated_at,
                        d.depth + 1
                 FROM nav_nodes n
                 JOIN descendants d
                   ON n.parent_page_id = d.page_id AND n.snapshot_id = d.snapshot_id
             )
             SELECT {COLUMNS} FROM descendants
             ORDER BY depth, sort_order, id"
        );
        sqlx::query_as::<_, NavNode>(&query)
            .bind(page_id)
            .bind(snapshot_id)
            .fetch_all(pool)
            .await
    }

    /// Highest sort_order among the siblings under a parent, or `None`
    /// for an empty sibling set. Used to append new nodes at the end.
    pub async fn max_sibling_order(
        pool: &PgPool,
        parent_page_id: Option<&str>,
        snapshot_id: Uuid,
    ) -> Result<Option<i32>, sqlx::Error> {
        let (max,): (Option<i32>,) = sqlx::query_as(
            "SELECT MAX(sort_order) FROM nav_nodes
             WHERE snapshot_id = $2
               AND (parent_page_id = $1 OR ($1::text IS NULL AND parent_page_id IS NULL))",
        )
        .bind(parent_page_id)
        .bind(snapshot_id)
        .fetch_one(pool)
        .await?;
        Ok(max)
    }

    /// Renumber an ordered sibling set atomically.
    ///
    /// Siblings listed in `new_order` take positions 0..n in that order;
    /// any sibling not listed keeps its relative position after them,
    /// ties broken by insertion id. The result is contiguous and unique,
    /// and applying the same order twice is a no-op.
    pub async fn reorder_siblings(
        pool: &PgPool,
        parent_page_id: Option<&str>,
        snapshot_id: Uuid,
        new_order: &[&str],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let siblings: Vec<(i64, String)> = sqlx::query_as(
            "SELECT id, page_id FROM nav_nodes
             WHERE snapshot_id = $2
               AND (parent_page_id = $1 OR ($1::text IS NULL AND parent_page_id IS NULL))
             ORDER BY sort_order, id
             FOR UPDATE",
        )
        .bind(parent_page_id)
        .bind(snapshot_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut ordered: Vec<&str> = new_order
            .iter()
            .copied()
            .filter(|p| siblings.iter().any(|(_, page)| page == p))
            .collect();
        for (_, page) in &siblings {
            if !ordered.contains(&page.as_str()) {
                ordered.push(page);
            }
        }

        for (position, page_id) in ordered.iter().enumerate() {
            sqlx::query(
                "UPDATE nav_nodes SET sort_order = $3
                 WHERE snapshot_id = $2 AND page_id = $1",
            )
            .bind(page_id)
            .bind(snapshot_id)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
