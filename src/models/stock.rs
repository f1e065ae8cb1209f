use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{
    product_entity as products, profile_entity as profiles,
    stock_adjustment_entity as adjustments,
};

/// 订单取消回补库存时写入审计记录的原因
pub const ORDER_CANCELLED_REASON: &str = "order cancelled";

/// 审计记录中 reason 的最大长度
pub const MAX_REASON_LEN: usize = 500;

/// 库存调整的操作人
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockActor {
    Admin(i64),
    /// 系统自动操作，例如订单取消回补库存
    System,
}

impl StockActor {
    pub fn admin_id(&self) -> Option<i64> {
        match self {
            StockActor::Admin(id) => Some(*id),
            StockActor::System => None,
        }
    }
}

/// productId / adjustment 声明为 Option，缺失时由接口返回 VALIDATION_ERROR
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockRequest {
    pub product_id: Option<i64>,
    pub adjustment: Option<i64>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustmentResponse {
    pub success: bool,
    pub product_id: i64,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub adjustment: i64,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestoreOrderStockRequest {
    pub order_id: i64,
    pub items: Vec<OrderLineItem>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestoreOrderStockResponse {
    pub order_id: i64,
    pub applied: Vec<StockAdjustmentResponse>,
    /// 商品已不存在而跳过的条目
    pub skipped_product_ids: Vec<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockHistoryQuery {
    pub product_id: Option<i64>,
    /// 默认 50
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: i64,
    pub name: String,
    pub sku: Option<String>,
}

impl From<&products::Model> for ProductSummary {
    fn from(m: &products::Model) -> Self {
        Self {
            id: m.id,
            name: m.name.clone(),
            sku: m.sku.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActorSummary {
    pub id: i64,
    pub full_name: Option<String>,
    pub email: Option<String>,
}

impl From<&profiles::Model> for ActorSummary {
    fn from(m: &profiles::Model) -> Self {
        Self {
            id: m.id,
            full_name: m.full_name.clone(),
            email: m.email.clone(),
        }
    }
}

/// 库存历史条目（附带商品与操作人信息）
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockHistoryEntry {
    pub id: i64,
    pub product_id: i64,
    pub product: Option<ProductSummary>,
    /// None 表示系统操作
    pub actor: Option<ActorSummary>,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub adjustment: i64,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StockHistoryEntry {
    pub fn new(
        record: adjustments::Model,
        product: Option<&products::Model>,
        actor: Option<&profiles::Model>,
    ) -> Self {
        Self {
            id: record.id,
            product_id: record.product_id,
            product: product.map(ProductSummary::from),
            actor: actor.map(ActorSummary::from),
            previous_stock: record.previous_stock,
            new_stock: record.new_stock,
            adjustment: record.adjustment,
            reason: record.reason,
            created_at: record.created_at,
        }
    }
}

/// 去除首尾空白，空字符串视为无，超长截断
pub fn normalize_reason(reason: Option<String>) -> Option<String> {
    let trimmed = reason?.trim().to_string();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_REASON_LEN).collect())
}
