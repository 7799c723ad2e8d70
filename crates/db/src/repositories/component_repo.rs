//! Repository for the `components` table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::component::{Component, CreateComponent};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, document_id, snapshot_id, page_id, block_id, component_id, \
                       component_type_name, rendered_html, properties_blob, \
                       sort_order, is_active, created_at, updated_at";

/// Provides CRUD operations for components.
///
/// A `block_id` alone can match rows across several snapshots of the
/// same document, so every query here requires the snapshot id. Mixing
/// rows from two snapshots is the historical duplicate-export bug.
pub struct ComponentRepo;

impl ComponentRepo {
    /// Insert a component, appending it after the block's current last one.
    pub async fn insert(pool: &PgPool, input: &CreateComponent) -> Result<Component, sqlx::Error> {
        let query = format!(
            "INSERT INTO components (document_id, snapshot_id, page_id, block_id, component_id,
                                     component_type_name, rendered_html, properties_blob, sort_order)
             SELECT $1, $2, $3, $4, $5, $6, $7, $8,
                    COALESCE(MAX(sort_order) + 1, 0)
             FROM components
             WHERE snapshot_id = $2 AND block_id = $4
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Component>(&query)
            .bind(&input.document_id)
            .bind(input.snapshot_id)
            .bind(&input.page_id)
            .bind(&input.block_id)
            .bind(&input.component_id)
            .bind(&input.component_type_name)
            .bind(&input.rendered_html)
            .bind(&input.properties_blob)
            .fetch_one(pool)
            .await
    }

    /// Find a component by its business key within a snapshot.
    pub async fn find(
        pool: &PgPool,
        component_id: &str,
        snapshot_id: Uuid,
    ) -> Result<Option<Component>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM components WHERE component_id = $1 AND snapshot_id = $2"
        );
        sqlx::query_as::<_, Component>(&query)
            .bind(component_id)
            .bind(snapshot_id)
            .fetch_optional(pool)
            .await
    }

    /// Components of one block in one snapshot, in order.
    pub async fn list_for_block(
        pool: &PgPool,
        block_id: &str,
        snapshot_id: Uuid,
    ) -> Result<Vec<Component>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM components
             WHERE block_id = $1 AND snapshot_id = $2
             ORDER BY sort_order, id"
        );
        sqlx::query_as::<_, Component>(&query)
            .bind(block_id)
            .bind(snapshot_id)
            .fetch_all(pool)
            .await
    }

    /// All components on one page in one snapshot, block by block.
    pub async fn list_for_page(
        pool: &PgPool,
        page_id: &str,
        snapshot_id: Uuid,
    ) -> Result<Vec<Component>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM components
             WHERE page_id = $1 AND snapshot_id = $2
             ORDER BY block_id, sort_order, id"
        );
        sqlx::query_as::<_, Component>(&query)
            .bind(page_id)
            .bind(snapshot_id)
            .fetch_all(pool)
            .await
    }

    /// Replace a component's rendered HTML and properties.
    /// Returns the updated row, or `None` if it does not exist.
    pub async fn update_content(
        pool: &PgPool,
        component_id: &str,
        snapshot_id: Uuid,
        rendered_html: &str,
        properties_blob: &str,
    ) -> Result<Option<Component>, sqlx::Error> {
        let query = format!(
            "UPDATE components SET rendered_html = $3, properties_blob = $4
             WHERE component_id = $1 AND snapshot_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Component>(&query)
            .bind(component_id)
            .bind(snapshot_id)
            .bind(rendered_html)
            .bind(properties_blob)
            .fetch_optional(pool)
            .await
    }

    /// Highest sort_order within a block, or `None` for an empty block.
    pub async fn max_order(
        pool: &PgPool,
        block_id: &str,
        snapshot_id: Uuid,
    ) -> Result<Option<i32>, sqlx::Error> {
        let (max,): (Option<i32>,) = sqlx::query_as(
            "SELECT MAX(sort_order) FROM components WHERE block_id = $1 AND snapshot_id = $2",
        )
        .bind(block_id)
        .bind(snapshot_id)
        .fetch_one(pool)
        .await?;
        Ok(max)
    }
}
