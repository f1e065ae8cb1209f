pub mod coupon;
pub mod stock;

pub use coupon::{admin_coupon_config, coupon_config};
pub use stock::stock_config;

use crate::error::{AppError, AppResult};
use crate::services::AuthorizationService;
use actix_web::{HttpMessage, HttpRequest, web};

/// 由 AuthMiddleware 写入的当前用户ID
pub(crate) fn current_user_id(req: &HttpRequest) -> AppResult<i64> {
    req.extensions()
        .get::<i64>()
        .copied()
        .ok_or_else(|| AppError::AuthError("Missing access token".to_string()))
}

/// 当前用户必须是管理员
pub(crate) async fn require_admin(
    auth_service: &AuthorizationService,
    req: &HttpRequest,
) -> AppResult<i64> {
    let user_id = current_user_id(req)?;
    auth_service.require_admin(user_id).await?;
    Ok(user_id)
}

/// 请求体 / 查询参数解析失败统一返回 VALIDATION_ERROR
pub fn extractor_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid request body: {err}")).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid query parameters: {err}")).into()
    }));
}

/// `/api/v1` 下的全部路由
pub fn api_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(coupon_config)
            .service(
                web::scope("/admin")
                    .configure(admin_coupon_config)
                    .configure(stock_config),
            ),
    );
}
