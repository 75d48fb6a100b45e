use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct InventoryItem {
    pub id: String,
    pub branch_id: String,
    pub name: String,
    pub sku: String,
    pub quantity: i32,
    pub unit: String,
    pub reorder_level: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewInventoryItem {
    pub branch_id: String,
    pub name: String,
    pub sku: String,
    pub quantity: i32,
    pub unit: String,
    pub reorder_level: i32,
}

impl InventoryItem {
    pub fn new(params: NewInventoryItem) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            branch_id: params.branch_id,
            name: params.name,
            sku: params.sku,
            quantity: params.quantity,
            unit: params.unit,
            reorder_level: params.reorder_level,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_level
    }
}
