use crate::models::CouponRejection;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    ToSchema,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    #[sea_orm(string_value = "percentage")]
    Percentage,
    #[sea_orm(string_value = "fixed_amount")]
    FixedAmount,
}

impl std::fmt::Display for DiscountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscountType::Percentage => write!(f, "percentage"),
            DiscountType::FixedAmount => write!(f, "fixed_amount"),
        }
    }
}

/// 优惠券实体
/// 金额字段统一使用美分:
/// - discount_value: percentage 为 basis points (10% = 1000)，fixed_amount 为美分
/// - max_discount_amount: 仅 percentage 生效
/// - valid_from / valid_until: 闭区间，NULL 表示该侧不限
/// - usage_limit: NULL 表示不限次数
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub max_discount_amount: Option<i64>,
    pub min_purchase_amount: Option<i64>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub usage_limit: Option<i64>,
    pub used_count: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// 按顺序检查可用性: 已过期 -> 未生效 -> 最低消费 -> 使用次数
    /// 校验与核销共用同一套检查
    pub fn check_usable(&self, cart_total: i64, now: DateTime<Utc>) -> Result<(), CouponRejection> {
        if !self.is_active {
            return Err(CouponRejection::NotFound);
        }
        if let Some(until) = self.valid_until
            && now > until
        {
            return Err(CouponRejection::Expired);
        }
        if let Some(from) = self.valid_from
            && now < from
        {
            return Err(CouponRejection::NotYetActive);
        }
        if let Some(minimum) = self.min_purchase_amount
            && cart_total < minimum
        {
            return Err(CouponRejection::MinimumNotMet { minimum });
        }
        if !self.has_uses_left() {
            return Err(CouponRejection::UsageLimitReached);
        }
        Ok(())
    }

    /// 是否还有剩余使用次数 (无上限或 used_count < usage_limit)
    pub fn has_uses_left(&self) -> bool {
        match self.usage_limit {
            None => true,
            Some(limit) => self.used_count < limit,
        }
    }

    /// 计算优惠金额(美分)
    ///
    /// percentage: 四舍五入到美分后再受 max_discount_amount 限制
    /// fixed_amount: 不超过购物车金额
    pub fn discount_for(&self, cart_total: i64) -> i64 {
        match self.discount_type {
            DiscountType::Percentage => {
                let discount = percent_of(cart_total, self.discount_value);
                match self.max_discount_amount {
                    Some(cap) if discount > cap => cap,
                    _ => discount,
                }
            }
            DiscountType::FixedAmount => self.discount_value.min(cart_total),
        }
    }
}

/// `amount * basis_points / 10000`，四舍五入 (两个参数均非负)
pub fn percent_of(amount: i64, basis_points: i64) -> i64 {
    let scaled = i128::from(amount) * i128::from(basis_points);
    i64::try_from((scaled + 5_000) / 10_000).unwrap_or(i64::MAX)
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
