use super::{current_user_id, require_admin};
use crate::models::*;
use crate::services::{AuthorizationService, CouponService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use serde_json::json;

#[utoipa::path(
    post,
    path = "/coupons/validate",
    tag = "coupon",
    request_body = ValidateCouponRequest,
    responses(
        (status = 200, description = "校验结果，无论是否可用都返回相同结构", body = ValidateCouponResponse),
        (status = 400, description = "请求参数错误", body = ErrorResponse)
    )
)]
pub async fn validate_coupon(
    coupon_service: web::Data<CouponService>,
    request: web::Json<ValidateCouponRequest>,
) -> Result<HttpResponse> {
    match coupon_service
        .validate_coupon(&request.code, request.cart_total, Utc::now())
        .await
    {
        Ok(outcome) => Ok(HttpResponse::Ok().json(ValidateCouponResponse::from(outcome))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/coupons/redeem",
    tag = "coupon",
    request_body = RedeemCouponRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "核销成功（重复核销返回已有记录）", body = RedeemCouponResponse),
        (status = 400, description = "优惠券不可用", body = ErrorResponse),
        (status = 401, description = "未授权"),
        (status = 409, description = "并发核销冲突", body = ErrorResponse)
    )
)]
pub async fn redeem_coupon(
    coupon_service: web::Data<CouponService>,
    req: HttpRequest,
    request: web::Json<RedeemCouponRequest>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match coupon_service
        .redeem_coupon(
            &request.code,
            request.order_id,
            request.cart_total,
            Some(user_id),
            Utc::now(),
        )
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/coupons",
    tag = "admin",
    params(
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量"),
        ("active" = Option<bool>, Query, description = "按启用状态过滤")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取优惠券列表成功"),
        (status = 401, description = "未授权"),
        (status = 403, description = "非管理员")
    )
)]
pub async fn list_coupons(
    coupon_service: web::Data<CouponService>,
    auth_service: web::Data<AuthorizationService>,
    req: HttpRequest,
    query: web::Query<CouponQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&auth_service, &req).await {
        return Ok(e.error_response());
    }

    match coupon_service.list_coupons(&query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/coupons",
    tag = "admin",
    request_body = CreateCouponRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "创建优惠券成功", body = CouponResponse),
        (status = 400, description = "请求参数错误", body = ErrorResponse),
        (status = 403, description = "非管理员"),
        (status = 409, description = "优惠码已存在", body = ErrorResponse)
    )
)]
pub async fn create_coupon(
    coupon_service: web::Data<CouponService>,
    auth_service: web::Data<AuthorizationService>,
    req: HttpRequest,
    request: web::Json<CreateCouponRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&auth_service, &req).await {
        return Ok(e.error_response());
    }

    match coupon_service.create_coupon(request.into_inner()).await {
        Ok(coupon) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": coupon
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/coupons/{id}/status",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "优惠券ID")
    ),
    request_body = UpdateCouponStatusRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "更新成功", body = CouponResponse),
        (status = 403, description = "非管理员"),
        (status = 404, description = "优惠券不存在", body = ErrorResponse)
    )
)]
pub async fn update_coupon_status(
    coupon_service: web::Data<CouponService>,
    auth_service: web::Data<AuthorizationService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateCouponStatusRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&auth_service, &req).await {
        return Ok(e.error_response());
    }

    match coupon_service
        .set_coupon_active(path.into_inner(), request.is_active)
        .await
    {
        Ok(coupon) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": coupon
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn coupon_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/coupons")
            .route("/validate", web::post().to(validate_coupon))
            .route("/redeem", web::post().to(redeem_coupon)),
    );
}

pub fn admin_coupon_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/coupons")
            .route("", web::get().to(list_coupons))
            .route("", web::post().to(create_coupon))
            .route("/{id}/status", web::put().to(update_coupon_status)),
    );
}
