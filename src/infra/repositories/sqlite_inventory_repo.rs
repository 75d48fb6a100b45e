use crate::domain::{models::inventory::InventoryItem, ports::InventoryRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::error;

pub struct SqliteInventoryRepo {
    pool: SqlitePool,
}

impl SqliteInventoryRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryRepository for SqliteInventoryRepo {
    async fn create(&self, item: &InventoryItem) -> Result<InventoryItem, AppError> {
        sqlx::query_as::<_, InventoryItem>(
            "INSERT INTO inventory_items (id, branch_id, name, sku, quantity, unit, reorder_level, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&item.id).bind(&item.branch_id).bind(&item.name).bind(&item.sku).bind(item.quantity)
            .bind(&item.unit).bind(item.reorder_level).bind(item.created_at).bind(item.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<InventoryItem>, AppError> {
        sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory_items WHERE id = ?")
            .bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self, branch_id: Option<&str>, low_stock_only: bool) -> Result<Vec<InventoryItem>, AppError> {
        sqlx::query_as::<_, InventoryItem>(
            "SELECT * FROM inventory_items
             WHERE (? IS NULL OR branch_id = ?)
             AND (? = 0 OR quantity <= reorder_level)
             ORDER BY branch_id ASC, name ASC"
        )
            .bind(branch_id).bind(branch_id).bind(low_stock_only)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, item: &InventoryItem) -> Result<InventoryItem, AppError> {
        sqlx::query_as::<_, InventoryItem>(
            "UPDATE inventory_items SET branch_id = ?, name = ?, sku = ?, quantity = ?, unit = ?, reorder_level = ?, updated_at = ?
             WHERE id = ?
             RETURNING *"
        )
            .bind(&item.branch_id).bind(&item.name).bind(&item.sku).bind(item.quantity)
            .bind(&item.unit).bind(item.reorder_level).bind(item.updated_at).bind(&item.id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Inventory item not found".into()))
    }

    async fn adjust_quantity(&self, id: &str, delta: i32) -> Result<Option<InventoryItem>, AppError> {
        sqlx::query_as::<_, InventoryItem>(
            "UPDATE inventory_items SET quantity = quantity + ?, updated_at = ?
             WHERE id = ? AND quantity + ? >= 0
             RETURNING *"
        )
            .bind(delta).bind(Utc::now()).bind(id).bind(delta)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool).await
            .map_err(|e| {
                error!("SQLite inventory deletion failed: {:?}", e);
                AppError::Database(e)
            })?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("Inventory item not found".into())); }
        Ok(())
    }

    async fn count_low_stock(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM inventory_items WHERE quantity <= reorder_level")
            .fetch_one(&self.pool).await.map_err(AppError::Database)?;
        Ok(row.get::<i64, _>("count"))
    }
}
