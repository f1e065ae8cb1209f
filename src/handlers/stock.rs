use super::require_admin;
use crate::error::AppError;
use crate::models::*;
use crate::services::{AuthorizationService, StockService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/admin/stock/adjust",
    tag = "stock",
    request_body = AdjustStockRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "调整成功", body = StockAdjustmentResponse),
        (status = 400, description = "参数错误或库存不足", body = ErrorResponse),
        (status = 401, description = "未授权"),
        (status = 403, description = "非管理员"),
        (status = 404, description = "商品不存在", body = ErrorResponse),
        (status = 409, description = "并发修改冲突", body = ErrorResponse)
    )
)]
pub async fn adjust_stock(
    stock_service: web::Data<StockService>,
    auth_service: web::Data<AuthorizationService>,
    req: HttpRequest,
    request: web::Json<AdjustStockRequest>,
) -> Result<HttpResponse> {
    let admin_id = match require_admin(&auth_service, &req).await {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    let AdjustStockRequest {
        product_id,
        adjustment,
        reason,
    } = request.into_inner();
    let (Some(product_id), Some(adjustment)) = (product_id, adjustment) else {
        return Ok(AppError::ValidationError(
            "productId and adjustment are required".to_string(),
        )
        .error_response());
    };

    match stock_service
        .adjust_stock(product_id, adjustment, reason, StockActor::Admin(admin_id))
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/stock/restore",
    tag = "stock",
    request_body = RestoreOrderStockRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "已回补库存", body = RestoreOrderStockResponse),
        (status = 400, description = "参数错误", body = ErrorResponse),
        (status = 403, description = "非管理员")
    )
)]
pub async fn restore_order_stock(
    stock_service: web::Data<StockService>,
    auth_service: web::Data<AuthorizationService>,
    req: HttpRequest,
    request: web::Json<RestoreOrderStockRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&auth_service, &req).await {
        return Ok(e.error_response());
    }

    match stock_service
        .restore_cancelled_order(request.order_id, &request.items)
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
    path = "/admin/stock/history",
    tag = "stock",
    params(
        ("productId" = Option<i64>, Query, description = "按商品过滤"),
        ("limit" = Option<u64>, Query, description = "返回条数，默认 50，最大 200")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "库存变更历史，按时间倒序", body = [StockHistoryEntry]),
        (status = 403, description = "非管理员")
    )
)]
pub async fn get_stock_history(
    stock_service: web::Data<StockService>,
    auth_service: web::Data<AuthorizationService>,
    req: HttpRequest,
    query: web::Query<StockHistoryQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&auth_service, &req).await {
        return Ok(e.error_response());
    }

    match stock_service
        .get_stock_history(query.product_id, query.limit)
        .await
    {
        Ok(history) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": history
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn stock_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/stock")
            .route("/adjust", web::post().to(adjust_stock))
            .route("/restore", web::post().to(restore_order_stock))
            .route("/history", web::get().to(get_stock_history)),
    );
}
