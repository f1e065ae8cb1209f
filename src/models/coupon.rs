use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{DiscountType, coupon_entity, coupon_redemption_entity};

use super::format_cents;

pub const COUPON_APPLIED_MESSAGE: &str = "Coupon applied successfully";

/// 优惠券不可用的原因（正常业务结果，不是错误）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponRejection {
    /// 优惠码不存在或已停用
    NotFound,
    Expired,
    NotYetActive,
    /// 未达到最低消费(美分)
    MinimumNotMet { minimum: i64 },
    UsageLimitReached,
}

impl CouponRejection {
    pub fn message(&self) -> String {
        match self {
            CouponRejection::NotFound => "Invalid coupon code".to_string(),
            CouponRejection::Expired => "This coupon has expired".to_string(),
            CouponRejection::NotYetActive => "This coupon is not yet active".to_string(),
            CouponRejection::MinimumNotMet { minimum } => {
                format!("Minimum purchase amount of {} required", format_cents(*minimum))
            }
            CouponRejection::UsageLimitReached => {
                "This coupon has reached its usage limit".to_string()
            }
        }
    }
}

impl std::fmt::Display for CouponRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// 优惠券校验结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponOutcome {
    Applied {
        /// 优惠金额(美分)
        discount: i64,
        coupon: CouponSummary,
    },
    Rejected(CouponRejection),
}

/// 展示用的优惠券摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CouponSummary {
    pub id: i64,
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    /// basis points (percentage) 或美分 (fixed_amount)
    pub discount_value: i64,
}

impl From<&coupon_entity::Model> for CouponSummary {
    fn from(m: &coupon_entity::Model) -> Self {
        Self {
            id: m.id,
            code: m.code.clone(),
            description: m.description.clone(),
            discount_type: m.discount_type,
            discount_value: m.discount_value,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCouponRequest {
    pub code: String,
    /// 购物车小计(美分)
    pub cart_total: i64,
}

/// 成功与失败使用相同结构，前端统一展示
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCouponResponse {
    pub success: bool,
    pub message: String,
    /// 优惠金额(美分)，失败时为 0
    pub discount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_data: Option<CouponSummary>,
}

impl From<CouponOutcome> for ValidateCouponResponse {
    fn from(outcome: CouponOutcome) -> Self {
        match outcome {
            CouponOutcome::Applied { discount, coupon } => Self {
                success: true,
                message: COUPON_APPLIED_MESSAGE.to_string(),
                discount,
                coupon_data: Some(coupon),
            },
            CouponOutcome::Rejected(reason) => Self {
                success: false,
                message: reason.message(),
                discount: 0,
                coupon_data: None,
            },
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedeemCouponRequest {
    pub code: String,
    pub order_id: i64,
    /// 订单小计(美分)
    pub cart_total: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedeemCouponResponse {
    pub redemption_id: i64,
    pub coupon_id: i64,
    pub code: String,
    pub order_id: i64,
    pub discount: i64,
    pub used_count: i64,
    /// true 表示该订单此前已核销过，本次未重复计数
    pub already_redeemed: bool,
}

impl RedeemCouponResponse {
    pub fn new(
        coupon: &coupon_entity::Model,
        redemption: &coupon_redemption_entity::Model,
        used_count: i64,
        already_redeemed: bool,
    ) -> Self {
        Self {
            redemption_id: redemption.id,
            coupon_id: coupon.id,
            code: coupon.code.clone(),
            order_id: redemption.order_id,
            discount: redemption.discount_amount,
            used_count,
            already_redeemed,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponRequest {
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub max_discount_amount: Option<i64>,
    pub min_purchase_amount: Option<i64>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub usage_limit: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCouponStatusRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CouponQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// 仅返回启用/停用的优惠券
    pub active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CouponResponse {
    pub id: i64,
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

impl From<coupon_entity::Model> for CouponResponse {
    fn from(m: coupon_entity::Model) -> Self {
        Self {
            id: m.id,
            code: m.code,
            description: m.description,
            discount_type: m.discount_type,
            discount_value: m.discount_value,
            max_discount_amount: m.max_discount_amount,
            min_purchase_amount: m.min_purchase_amount,
            valid_from: m.valid_from,
            valid_until: m.valid_until,
            usage_limit: m.usage_limit,
            used_count: m.used_count,
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages() {
        assert_eq!(CouponRejection::NotFound.message(), "Invalid coupon code");
        assert_eq!(CouponRejection::Expired.message(), "This coupon has expired");
        assert_eq!(
            CouponRejection::MinimumNotMet { minimum: 5000 }.message(),
            "Minimum purchase amount of $50.00 required"
        );
    }

    #[test]
    fn test_rejected_outcome_has_uniform_shape() {
        let response = ValidateCouponResponse::from(CouponOutcome::Rejected(
            CouponRejection::UsageLimitReached,
        ));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["discount"], 0);
        assert_eq!(value["message"], "This coupon has reached its usage limit");
        assert!(value.get("couponData").is_none());
    }

    #[test]
    fn test_applied_outcome_serializes_coupon_data() {
        let response = ValidateCouponResponse::from(CouponOutcome::Applied {
            discount: 1500,
            coupon: CouponSummary {
                id: 7,
                code: "FLAT20".to_string(),
                description: Some("$20 off".to_string()),
                discount_type: DiscountType::FixedAmount,
                discount_value: 2000,
            },
        });
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["message"], COUPON_APPLIED_MESSAGE);
        assert_eq!(value["discount"], 1500);
        assert_eq!(value["couponData"]["code"], "FLAT20");
        assert_eq!(value["couponData"]["discount_type"], "fixed_amount");
    }
}
