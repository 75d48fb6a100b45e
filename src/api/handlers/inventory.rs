use axum::{extract::{State, Path, Query}, response::IntoResponse, Json, http::StatusCode};
use chrono::Utc;
use serde_json::json;
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::{AdjustStockRequest, CreateInventoryItemRequest, InventoryListQuery, UpdateInventoryItemRequest};
use crate::domain::models::inventory::{InventoryItem, NewInventoryItem};
use crate::domain::models::notification::KIND_LOW_STOCK;
use crate::domain::models::user::ROLE_ADMIN;
use crate::domain::services::admin_config::load;
use crate::error::AppError;
use std::sync::Arc;
use tracing::{error, info, warn};

pub async fn list_items(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<InventoryListQuery>,
) -> Result<impl IntoResponse, AppError> {
    user.require_staff()?;
    Ok(Json(state.inventory_repo.list(query.branch.as_deref(), query.low_stock).await?))
}

pub async fn create_item(
    State(state): State<Arc<AppState>>,
    admin: AuthUser,
    Json(payload): Json<CreateInventoryItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    admin.require_admin()?;

    let config = load(state.config_repo.as_ref()).await?;
    if config.branch(&payload.branch_id).is_none() {
        return Err(AppError::Validation(format!("Unknown branch: {}", payload.branch_id)));
    }
    if payload.name.trim().is_empty() || payload.sku.trim().is_empty() {
        return Err(AppError::Validation("Name and SKU are required".into()));
    }
    if payload.quantity < 0 || payload.reorder_level < 0 {
        return Err(AppError::Validation("Quantities cannot be negative".into()));
    }

    let item = InventoryItem::new(NewInventoryItem {
        branch_id: payload.branch_id,
        name: payload.name.trim().to_string(),
        sku: payload.sku.trim().to_string(),
        quantity: payload.quantity,
        unit: payload.unit,
        reorder_level: payload.reorder_level,
    });
    let created = state.inventory_repo.create(&item).await?;
    info!(item_id = %created.id, sku = %created.sku, "Inventory item created");

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    admin: AuthUser,
    Path(item_id): Path<String>,
    Json(payload): Json<UpdateInventoryItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    admin.require_admin()?;

    let mut item = state.inventory_repo.find_by_id(&item_id).await?
        .ok_or(AppError::NotFound("Inventory item not found".into()))?;

    if let Some(name) = payload.name { item.name = name.trim().to_string(); }
    if let Some(sku) = payload.sku { item.sku = sku.trim().to_string(); }
    if let Some(unit) = payload.unit { item.unit = unit; }
    if let Some(level) = payload.reorder_level {
        if level < 0 {
            return Err(AppError::Validation("Reorder level cannot be negative".into()));
        }
        item.reorder_level = level;
    }
    if item.name.is_empty() || item.sku.is_empty() {
        return Err(AppError::Validation("Name and SKU are required".into()));
    }
    item.updated_at = Utc::now();

    Ok(Json(state.inventory_repo.update(&item).await?))
}

pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    admin: AuthUser,
    Path(item_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    admin.require_admin()?;
    state.inventory_repo.delete(&item_id).await?;
    info!("Deleted inventory item: {}", item_id);
    Ok(Json(json!({"status": "deleted"})))
}

pub async fn adjust_stock(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(item_id): Path<String>,
    Json(payload): Json<AdjustStockRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_staff()?;
    if payload.delta == 0 {
        return Err(AppError::Validation("delta must not be zero".into()));
    }

    let before = state.inventory_repo.find_by_id(&item_id).await?
        .ok_or(AppError::NotFound("Inventory item not found".into()))?;

    let after = state.inventory_repo.adjust_quantity(&item_id, payload.delta).await?
        .ok_or_else(|| {
            warn!(item_id = %item_id, delta = payload.delta, "Stock adjustment would go negative");
            AppError::Conflict("Not enough stock for this adjustment".into())
        })?;

    info!(
        item_id = %after.id,
        delta = payload.delta,
        quantity = after.quantity,
        reason = payload.reason.as_deref().unwrap_or(""),
        "Stock adjusted by {}", user.0.id
    );

    // Alert once when the level is crossed, not on every later adjustment.
    if after.is_low_stock() && before.quantity > before.reorder_level {
        alert_low_stock(&state, &after).await;
    }

    Ok(Json(after))
}

async fn alert_low_stock(state: &AppState, item: &InventoryItem) {
    let context = json!({
        "item_name": item.name,
        "sku": item.sku,
        "branch_id": item.branch_id,
        "quantity": item.quantity,
        "unit": item.unit,
        "reorder_level": item.reorder_level,
    });

    let result: Result<usize, AppError> = async {
        let admins: Vec<String> = state.user_repo.list_active_by_role(ROLE_ADMIN).await?
            .into_iter()
            .map(|u| u.id)
            .collect();
        state.notifications.notify_users(&admins, KIND_LOW_STOCK, &context).await
    }.await;

    if let Err(e) = result {
        error!(item_id = %item.id, "Failed to send low stock alert: {:?}", e);
    }
}
