use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 库存调整审计记录
/// 说明:
/// - 只追加，不更新也不删除
/// - new_stock = previous_stock + adjustment
/// - admin_id 为 NULL 表示系统操作 (例如订单取消回补库存)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_adjustments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub product_id: i64,
    pub admin_id: Option<i64>,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub adjustment: i64,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
