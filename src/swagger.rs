use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::entities::DiscountType;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::coupon::validate_coupon,
        handlers::coupon::redeem_coupon,
        handlers::coupon::list_coupons,
        handlers::coupon::create_coupon,
        handlers::coupon::update_coupon_status,
        handlers::stock::adjust_stock,
        handlers::stock::restore_order_stock,
        handlers::stock::get_stock_history,
    ),
    components(
        schemas(
            DiscountType,
            CouponSummary,
            ValidateCouponRequest,
            ValidateCouponResponse,
            RedeemCouponRequest,
            RedeemCouponResponse,
            CreateCouponRequest,
            UpdateCouponStatusRequest,
            CouponQuery,
            CouponResponse,
            AdjustStockRequest,
            StockAdjustmentResponse,
            OrderLineItem,
            RestoreOrderStockRequest,
            RestoreOrderStockResponse,
            StockHistoryQuery,
            StockHistoryEntry,
            ProductSummary,
            ActorSummary,
            ErrorResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "coupon", description = "Coupon validation and redemption API"),
        (name = "admin", description = "Coupon administration API"),
        (name = "stock", description = "Stock ledger API"),
    ),
    info(
        title = "Storefront Backend API",
        version = "1.0.0",
        description = "Coupon engine and stock ledger REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/coupons/validate",
            "/coupons/redeem",
            "/admin/coupons",
            "/admin/coupons/{id}/status",
            "/admin/stock/adjust",
            "/admin/stock/restore",
            "/admin/stock/history",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
