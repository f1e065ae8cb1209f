use crate::entities::{
    DiscountType, coupon_entity as coupons, coupon_redemption_entity as redemptions,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    SqlErr, TransactionTrait,
};

pub const MAX_CODE_LEN: usize = 64;

/// 100%，单位 basis points
pub const MAX_PERCENTAGE_BP: i64 = 10_000;

/// 优惠码去除首尾空白并转大写后匹配
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[derive(Clone)]
pub struct CouponService {
    pool: DatabaseConnection,
}

impl CouponService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 校验优惠券并计算优惠金额（只读，不修改 used_count）
    ///
    /// 优惠码不存在及所有业务规则不满足都返回 `CouponOutcome::Rejected`，
    /// 只有参数非法和数据库错误才返回 Err
    pub async fn validate_coupon(
        &self,
        code: &str,
        cart_total: i64,
        now: DateTime<Utc>,
    ) -> AppResult<CouponOutcome> {
        let code = validate_input(code, cart_total)?;

        let Some(coupon) = find_active_by_code(&self.pool, &code).await? else {
            log::warn!("Coupon {code} not found or inactive");
            return Ok(CouponOutcome::Rejected(CouponRejection::NotFound));
        };

        let outcome = match coupon.check_usable(cart_total, now) {
            Ok(()) => CouponOutcome::Applied {
                discount: coupon.discount_for(cart_total),
                coupon: CouponSummary::from(&coupon),
            },
            Err(reason) => {
                log::warn!("Coupon {code} rejected for cart total {cart_total}: {reason}");
                CouponOutcome::Rejected(reason)
            }
        };
        Ok(outcome)
    }

    /// 订单确认时核销优惠券
    ///
    /// 逻辑:
    /// 1. 同一订单已核销过则直接返回原记录（幂等，不重复计数）
    /// 2. 与 validate_coupon 相同的可用性检查 (已停用视为优惠码无效)
    /// 3. 原子递增 used_count (update where used_count < usage_limit)
    /// 4. 写核销记录，与第 3 步在同一事务中
    pub async fn redeem_coupon(
        &self,
        code: &str,
        order_id: i64,
        cart_total: i64,
        redeemed_by: Option<i64>,
        now: DateTime<Utc>,
    ) -> AppResult<RedeemCouponResponse> {
        let code = validate_input(code, cart_total)?;
        if order_id <= 0 {
            return Err(AppError::ValidationError("Invalid order id".to_string()));
        }

        let txn = self.pool.begin().await?;

        // 不过滤 is_active：已核销的订单在优惠券停用后重试仍返回原记录
        let coupon = coupons::Entity::find()
            .filter(coupons::Column::Code.eq(code.as_str()))
            .one(&txn)
            .await?
            .ok_or_else(|| rejected(&code, CouponRejection::NotFound))?;

        if let Some(existing) = redemptions::Entity::find()
            .filter(redemptions::Column::CouponId.eq(coupon.id))
            .filter(redemptions::Column::OrderId.eq(order_id))
            .one(&txn)
            .await?
        {
            txn.commit().await?;
            log::info!("Coupon {code} already redeemed for order {order_id}");
            return Ok(RedeemCouponResponse::new(
                &coupon,
                &existing,
                coupon.used_count,
                true,
            ));
        }

        coupon
            .check_usable(cart_total, now)
            .map_err(|reason| rejected(&code, reason))?;
        let discount = coupon.discount_for(cart_total);

        // 原子递增并校验上限，避免并发核销超出 usage_limit
        let result = coupons::Entity::update_many()
            .col_expr(
                coupons::Column::UsedCount,
                Expr::col(coupons::Column::UsedCount).add(1),
            )
            .col_expr(coupons::Column::UpdatedAt, Expr::value(now))
            .filter(coupons::Column::Id.eq(coupon.id))
            .filter(coupons::Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(coupons::Column::UsageLimit.is_null())
                    .add(
                        Expr::col(coupons::Column::UsedCount)
                            .lt(Expr::col(coupons::Column::UsageLimit)),
                    ),
            )
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(rejected(&code, CouponRejection::UsageLimitReached));
        }

        let redemption = redemptions::ActiveModel {
            coupon_id: Set(coupon.id),
            order_id: Set(order_id),
            discount_amount: Set(discount),
            redeemed_by: Set(redeemed_by),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Coupon already redeemed for this order".to_string())
            }
            _ => AppError::from(e),
        })?;

        let used_count = coupons::Entity::find_by_id(coupon.id)
            .one(&txn)
            .await?
            .map(|c| c.used_count)
            .unwrap_or(coupon.used_count + 1);

        txn.commit().await?;

        log::info!(
            "Coupon {code} redeemed for order {order_id}: discount {discount}, used {used_count}"
        );
        Ok(RedeemCouponResponse::new(
            &coupon,
            &redemption,
            used_count,
            false,
        ))
    }

    pub async fn create_coupon(&self, request: CreateCouponRequest) -> AppResult<CouponResponse> {
        let code = normalize_code(&request.code);
        validate_new_coupon(&code, &request)?;

        let exists = coupons::Entity::find()
            .filter(coupons::Column::Code.eq(code.as_str()))
            .count(&self.pool)
            .await?
            > 0;
        if exists {
            return Err(AppError::Conflict(format!("Coupon code {code} already exists")));
        }

        let now = Utc::now();
        let description = request
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let model = coupons::ActiveModel {
            code: Set(code.clone()),
            description: Set(description),
            discount_type: Set(request.discount_type),
            discount_value: Set(request.discount_value),
            max_discount_amount: Set(request.max_discount_amount),
            min_purchase_amount: Set(request.min_purchase_amount),
            valid_from: Set(request.valid_from),
            valid_until: Set(request.valid_until),
            usage_limit: Set(request.usage_limit),
            used_count: Set(0),
            is_active: Set(request.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict(format!("Coupon code {code} already exists"))
            }
            _ => AppError::from(e),
        })?;

        log::info!("Coupon {} created ({})", model.code, model.discount_type);
        Ok(model.into())
    }

    pub async fn list_coupons(
        &self,
        query: &CouponQuery,
    ) -> AppResult<PaginatedResponse<CouponResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut base_query = coupons::Entity::find();
        if let Some(active) = query.active {
            base_query = base_query.filter(coupons::Column::IsActive.eq(active));
        }

        let total = base_query.clone().count(&self.pool).await? as i64;

        let items = base_query
            .order_by_desc(coupons::Column::CreatedAt)
            .order_by_desc(coupons::Column::Id)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?
            .into_iter()
            .map(CouponResponse::from)
            .collect();

        Ok(PaginatedResponse::new(
            items,
            params.get_page(),
            params.get_limit(),
            total,
        ))
    }

    /// 启用/停用优惠券
    pub async fn set_coupon_active(&self, id: i64, is_active: bool) -> AppResult<CouponResponse> {
        let coupon = coupons::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Coupon not found".to_string()))?;

        let mut am = coupon.into_active_model();
        am.is_active = Set(is_active);
        am.updated_at = Set(Utc::now());
        let updated = am.update(&self.pool).await?;

        log::info!("Coupon {} is_active set to {is_active}", updated.code);
        Ok(updated.into())
    }
}

async fn find_active_by_code<C: ConnectionTrait>(
    db: &C,
    code: &str,
) -> Result<Option<coupons::Model>, DbErr> {
    coupons::Entity::find()
        .filter(coupons::Column::Code.eq(code))
        .filter(coupons::Column::IsActive.eq(true))
        .one(db)
        .await
}

fn rejected(code: &str, reason: CouponRejection) -> AppError {
    log::warn!("Redemption of coupon {code} rejected: {reason}");
    AppError::CouponRejected(reason.message())
}

fn validate_input(code: &str, cart_total: i64) -> AppResult<String> {
    let code = normalize_code(code);
    if code.is_empty() {
        return Err(AppError::ValidationError(
            "Coupon code is required".to_string(),
        ));
    }
    if cart_total < 0 {
        return Err(AppError::ValidationError(
            "Cart total cannot be negative".to_string(),
        ));
    }
    Ok(code)
}

fn validate_new_coupon(code: &str, request: &CreateCouponRequest) -> AppResult<()> {
    if code.is_empty() || code.len() > MAX_CODE_LEN {
        return Err(AppError::ValidationError(format!(
            "Coupon code must be between 1 and {MAX_CODE_LEN} characters"
        )));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::ValidationError(
            "Coupon code may only contain letters, digits, '-' and '_'".to_string(),
        ));
    }

    match request.discount_type {
        DiscountType::Percentage => {
            if request.discount_value < 1 || request.discount_value > MAX_PERCENTAGE_BP {
                return Err(AppError::ValidationError(
                    "Percentage discount must be between 1 and 10000 basis points".to_string(),
                ));
            }
            if let Some(cap) = request.max_discount_amount
                && cap <= 0
            {
                return Err(AppError::ValidationError(
                    "Maximum discount amount must be positive".to_string(),
                ));
            }
        }
        DiscountType::FixedAmount => {
            if request.discount_value <= 0 {
                return Err(AppError::ValidationError(
                    "Fixed discount must be positive".to_string(),
                ));
            }
            if request.max_discount_amount.is_some() {
                return Err(AppError::ValidationError(
                    "Maximum discount amount only applies to percentage coupons".to_string(),
                ));
            }
        }
    }

    if let Some(minimum) = request.min_purchase_amount
        && minimum < 0
    {
        return Err(AppError::ValidationError(
            "Minimum purchase amount cannot be negative".to_string(),
        ));
    }
    if let Some(limit) = request.usage_limit
        && limit <= 0
    {
        return Err(AppError::ValidationError(
            "Usage limit must be positive".to_string(),
        ));
    }
    if let (Some(from), Some(until)) = (request.valid_from, request.valid_until)
        && from > until
    {
        return Err(AppError::ValidationError(
            "valid_from must not be after valid_until".to_string(),
        ));
    }
    Ok(())
}
