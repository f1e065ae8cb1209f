use crate::config::InventoryConfig;
use crate::entities::{
    product_entity as products, profile_entity as profiles,
    stock_adjustment_entity as adjustments,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::{BTreeSet, HashMap};

/// 库存台账：所有库存变更都经过这里，并追加审计记录
#[derive(Clone)]
pub struct StockService {
    pool: DatabaseConnection,
    config: InventoryConfig,
}

/// 一次成功的 compare-and-swap
struct StockChange {
    previous_stock: i64,
    new_stock: i64,
}

impl StockService {
    pub fn new(pool: DatabaseConnection, config: InventoryConfig) -> Self {
        Self { pool, config }
    }

    /// 调整库存并写审计记录
    ///
    /// 逻辑:
    /// 1. 读取当前库存，计算 new_stock，小于 0 直接拒绝
    /// 2. update ... where stock = 读到的值 (compare-and-swap)
    /// 3. 影响行数为 0 说明被并发修改，重新读取后重试，超过次数返回 Conflict
    /// 4. 追加审计记录 (strict_audit 决定是否与第 2 步同一事务)
    pub async fn adjust_stock(
        &self,
        product_id: i64,
        adjustment: i64,
        reason: Option<String>,
        actor: StockActor,
    ) -> AppResult<StockAdjustmentResponse> {
        if adjustment == 0 {
            return Err(AppError::ValidationError(
                "Adjustment must be a non-zero integer".to_string(),
            ));
        }
        let reason = normalize_reason(reason);

        if self.config.strict_audit {
            let txn = self.pool.begin().await?;
            let change = self.swap_stock(&txn, product_id, adjustment).await?;
            audit_record(product_id, adjustment, &change, reason, actor)
                .insert(&txn)
                .await
                .map_err(|e| {
                    log::error!(
                        "Failed to record stock adjustment for product {product_id}, rolling back: {e}"
                    );
                    AppError::InternalError("Failed to record stock adjustment".to_string())
                })?;
            txn.commit().await?;
            log_change(product_id, adjustment, &change, actor);
            return Ok(response(product_id, adjustment, &change));
        }

        let change = self.swap_stock(&self.pool, product_id, adjustment).await?;
        log_change(product_id, adjustment, &change, actor);

        // 库存已提交，审计写入失败只记录日志
        if let Err(e) = audit_record(product_id, adjustment, &change, reason, actor)
            .insert(&self.pool)
            .await
        {
            log::error!(
                "Stock for product {product_id} changed {} -> {} but the audit record could not be written: {e}",
                change.previous_stock,
                change.new_stock
            );
        }

        Ok(response(product_id, adjustment, &change))
    }

    /// 订单取消后回补库存，原因固定为 "order cancelled"，操作人为系统
    ///
    /// 商品已不存在则跳过并在结果中返回；其他错误直接中止剩余条目
    pub async fn restore_cancelled_order(
        &self,
        order_id: i64,
        items: &[OrderLineItem],
    ) -> AppResult<RestoreOrderStockResponse> {
        if order_id <= 0 {
            return Err(AppError::ValidationError("Invalid order id".to_string()));
        }
        if let Some(item) = items.iter().find(|i| i.quantity <= 0) {
            return Err(AppError::ValidationError(format!(
                "Quantity for product {} must be positive",
                item.product_id
            )));
        }

        let mut applied = Vec::with_capacity(items.len());
        let mut skipped_product_ids = Vec::new();

        for item in items {
            match self
                .adjust_stock(
                    item.product_id,
                    item.quantity,
                    Some(ORDER_CANCELLED_REASON.to_string()),
                    StockActor::System,
                )
                .await
            {
                Ok(result) => applied.push(result),
                Err(AppError::NotFound(_)) => {
                    log::warn!(
                        "Order {order_id}: product {} no longer exists, stock not restored",
                        item.product_id
                    );
                    skipped_product_ids.push(item.product_id);
                }
                Err(e) => {
                    log::error!("Order {order_id}: failed to restore stock: {e}");
                    return Err(e);
                }
            }
        }

        log::info!(
            "Order {order_id} cancelled: restored {} item(s), skipped {}",
            applied.len(),
            skipped_product_ids.len()
        );
        Ok(RestoreOrderStockResponse {
            order_id,
            applied,
            skipped_product_ids,
        })
    }

    /// 库存变更历史，按时间倒序
    pub async fn get_stock_history(
        &self,
        product_id: Option<i64>,
        limit: Option<u64>,
    ) -> AppResult<Vec<StockHistoryEntry>> {
        let limit = limit
            .unwrap_or(self.config.history_default_limit)
            .clamp(1, self.config.history_max_limit.max(1));

        let mut query = adjustments::Entity::find();
        if let Some(product_id) = product_id {
            query = query.filter(adjustments::Column::ProductId.eq(product_id));
        }
        let records = query
            .order_by_desc(adjustments::Column::CreatedAt)
            .order_by_desc(adjustments::Column::Id)
            .limit(limit)
            .all(&self.pool)
            .await?;

        if records.is_empty() {
            return Ok(Vec::new());
        }

        // 批量加载商品与操作人，避免逐条查询
        let product_ids: BTreeSet<i64> = records.iter().map(|r| r.product_id).collect();
        let admin_ids: BTreeSet<i64> = records.iter().filter_map(|r| r.admin_id).collect();

        let product_map: HashMap<i64, products::Model> = products::Entity::find()
            .filter(products::Column::Id.is_in(product_ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let profile_map: HashMap<i64, profiles::Model> = if admin_ids.is_empty() {
            HashMap::new()
        } else {
            profiles::Entity::find()
                .filter(profiles::Column::Id.is_in(admin_ids))
                .all(&self.pool)
                .await?
                .into_iter()
                .map(|p| (p.id, p))
                .collect()
        };

        Ok(records
            .into_iter()
            .map(|record| {
                let product = product_map.get(&record.product_id);
                let actor = record.admin_id.and_then(|id| profile_map.get(&id));
                StockHistoryEntry::new(record, product, actor)
            })
            .collect())
    }

    async fn swap_stock<C: ConnectionTrait>(
        &self,
        db: &C,
        product_id: i64,
        adjustment: i64,
    ) -> AppResult<StockChange> {
        let attempts = self.config.max_update_attempts.max(1);

        for attempt in 1..=attempts {
            let product = products::Entity::find_by_id(product_id)
                .one(db)
                .await?
                .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

            let new_stock = product.stock.checked_add(adjustment).ok_or_else(|| {
                AppError::ValidationError("Adjustment is out of range".to_string())
            })?;
            if new_stock < 0 {
                log::warn!(
                    "Rejected adjustment {adjustment} for product {product_id}: stock is {}",
                    product.stock
                );
                return Err(AppError::InvalidAdjustment(
                    "Stock cannot be negative".to_string(),
                ));
            }

            let result = products::Entity::update_many()
                .col_expr(products::Column::Stock, Expr::value(new_stock))
                .col_expr(products::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(products::Column::Id.eq(product_id))
                .filter(products::Column::Stock.eq(product.stock))
                .exec(db)
                .await?;

            if result.rows_affected == 1 {
                return Ok(StockChange {
                    previous_stock: product.stock,
                    new_stock,
                });
            }

            log::debug!(
                "Stock for product {product_id} changed concurrently (attempt {attempt}/{attempts})"
            );
        }

        log::warn!("Giving up on product {product_id} after {attempts} concurrent updates");
        Err(AppError::Conflict(
            "Stock was modified concurrently, please retry".to_string(),
        ))
    }
}

fn audit_record(
    product_id: i64,
    adjustment: i64,
    change: &StockChange,
    reason: Option<String>,
    actor: StockActor,
) -> adjustments::ActiveModel {
    adjustments::ActiveModel {
        product_id: Set(product_id),
        admin_id: Set(actor.admin_id()),
        previous_stock: Set(change.previous_stock),
        new_stock: Set(change.new_stock),
        adjustment: Set(adjustment),
        reason: Set(reason),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
}

fn response(product_id: i64, adjustment: i64, change: &StockChange) -> StockAdjustmentResponse {
    StockAdjustmentResponse {
        success: true,
        product_id,
        previous_stock: change.previous_stock,
        new_stock: change.new_stock,
        adjustment,
    }
}

fn log_change(product_id: i64, adjustment: i64, change: &StockChange, actor: StockActor) {
    let by = match actor {
        StockActor::Admin(id) => format!("admin {id}"),
        StockActor::System => "system".to_string(),
    };
    log::info!(
        "Stock for product {product_id} adjusted by {adjustment}: {} -> {} ({by})",
        change.previous_stock,
        change.new_stock
    );
}
