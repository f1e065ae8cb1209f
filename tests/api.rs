use actix_web::{App, ResponseError, http::StatusCode, test, web};
use chrono::{Duration, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use serde_json::{Value, json};

use storefront_backend::{
    config::InventoryConfig,
    entities::{DiscountType, coupon_entity, product_entity, profile_entity},
    handlers,
    middlewares::AuthMiddleware,
    services::{AuthorizationService, CouponService, StockService},
    utils::JwtService,
};

const SECRET: &str = "integration-test-secret";

async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options.max_connections(1).sqlx_logging(false);
    let pool = Database::connect(options).await.unwrap();
    Migrator::up(&pool, None).await.unwrap();
    pool
}

fn jwt() -> JwtService {
    JwtService::new(SECRET, 3600)
}

fn bearer(user_id: i64) -> (&'static str, String) {
    let token = jwt().generate_access_token(user_id).unwrap();
    ("Authorization", format!("Bearer {token}"))
}

macro_rules! init_app {
    ($pool:expr) => {
        test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt()))
                .app_data(web::Data::new(AuthorizationService::new($pool.clone())))
                .app_data(web::Data::new(CouponService::new($pool.clone())))
                .app_data(web::Data::new(StockService::new(
                    $pool.clone(),
                    InventoryConfig::default(),
                )))
                .configure(handlers::extractor_config)
                .configure(handlers::api_config),
        )
        .await
    };
}

async fn insert_profile(pool: &DatabaseConnection, is_admin: bool) -> i64 {
    profile_entity::ActiveModel {
        full_name: Set(Some("Store Admin".to_string())),
        email: Set(Some("admin@example.com".to_string())),
        is_admin: Set(is_admin),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(pool)
    .await
    .unwrap()
    .id
}

async fn insert_product(pool: &DatabaseConnection, stock: i64) -> i64 {
    let now = Utc::now();
    product_entity::ActiveModel {
        name: Set("Teapot".to_string()),
        sku: Set(Some("TP-01".to_string())),
        stock: Set(stock),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(pool)
    .await
    .unwrap()
    .id
}

async fn insert_coupon(
    pool: &DatabaseConnection,
    code: &str,
    discount_type: DiscountType,
    discount_value: i64,
    max_discount_amount: Option<i64>,
    valid_until: Option<chrono::DateTime<Utc>>,
) {
    let now = Utc::now();
    coupon_entity::ActiveModel {
        code: Set(code.to_string()),
        description: Set(None),
        discount_type: Set(discount_type),
        discount_value: Set(discount_value),
        max_discount_amount: Set(max_discount_amount),
        min_purchase_amount: Set(None),
        valid_from: Set(None),
        valid_until: Set(valid_until),
        usage_limit: Set(None),
        used_count: Set(0),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(pool)
    .await
    .unwrap();
}

#[actix_web::test]
async fn validate_coupon_is_public_and_applies_discount() {
    let pool = setup_db().await;
    insert_coupon(&pool, "SAVE10", DiscountType::Percentage, 1000, Some(5000), None).await;
    let app = init_app!(pool);

    let req = test::TestRequest::post()
        .uri("/api/v1/coupons/validate")
        .set_json(json!({ "code": "save10", "cartTotal": 100000 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Coupon applied successfully");
    assert_eq!(body["discount"], 5000);
    assert_eq!(body["couponData"]["code"], "SAVE10");
}

#[actix_web::test]
async fn rejected_coupon_returns_uniform_shape() {
    let pool = setup_db().await;
    insert_coupon(
        &pool,
        "OLD",
        DiscountType::FixedAmount,
        500,
        None,
        Some(Utc::now() - Duration::days(1)),
    )
    .await;
    let app = init_app!(pool);

    let req = test::TestRequest::post()
        .uri("/api/v1/coupons/validate")
        .set_json(json!({ "code": "OLD", "cartTotal": 1000 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "This coupon has expired");
    assert_eq!(body["discount"], 0);
}

#[actix_web::test]
async fn malformed_body_is_a_validation_error() {
    let pool = setup_db().await;
    let app = init_app!(pool);

    let req = test::TestRequest::post()
        .uri("/api/v1/coupons/validate")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[actix_web::test]
async fn redeem_requires_a_token() {
    let pool = setup_db().await;
    let app = init_app!(pool);

    let req = test::TestRequest::post()
        .uri("/api/v1/coupons/redeem")
        .set_json(json!({ "code": "SAVE10", "orderId": 1, "cartTotal": 1000 }))
        .to_request();
    let err = test::try_call_service(&app, req).await.unwrap_err();
    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn redeem_counts_once_per_order() {
    let pool = setup_db().await;
    insert_coupon(&pool, "FLAT20", DiscountType::FixedAmount, 2000, None, None).await;
    let user = insert_profile(&pool, false).await;
    let app = init_app!(pool);

    for expected_already in [false, true] {
        let req = test::TestRequest::post()
            .uri("/api/v1/coupons/redeem")
            .insert_header(bearer(user))
            .set_json(json!({ "code": "FLAT20", "orderId": 42, "cartTotal": 1500 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["discount"], 1500);
        assert_eq!(body["data"]["usedCount"], 1);
        assert_eq!(body["data"]["alreadyRedeemed"], expected_already);
    }
}

#[actix_web::test]
async fn admin_adjusts_stock() {
    let pool = setup_db().await;
    let admin = insert_profile(&pool, true).await;
    let product = insert_product(&pool, 10).await;
    let app = init_app!(pool);

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/stock/adjust")
        .insert_header(bearer(admin))
        .set_json(json!({ "productId": product, "adjustment": -4, "reason": "breakage" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["previousStock"], 10);
    assert_eq!(body["newStock"], 6);
    assert_eq!(body["adjustment"], -4);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/admin/stock/history?productId={product}"))
        .insert_header(bearer(admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["reason"], "breakage");
    assert_eq!(entries[0]["product"]["name"], "Teapot");
    assert_eq!(entries[0]["actor"]["id"], admin);
}

#[actix_web::test]
async fn stock_cannot_go_negative() {
    let pool = setup_db().await;
    let admin = insert_profile(&pool, true).await;
    let product = insert_product(&pool, 2).await;
    let app = init_app!(pool);

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/stock/adjust")
        .insert_header(bearer(admin))
        .set_json(json!({ "productId": product, "adjustment": -3 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "INVALID_ADJUSTMENT");
    assert_eq!(body["error"]["message"], "Stock cannot be negative");
}

#[actix_web::test]
async fn bad_adjust_requests_are_validation_errors() {
    let pool = setup_db().await;
    let admin = insert_profile(&pool, true).await;
    let product = insert_product(&pool, 2).await;
    let app = init_app!(pool);

    for payload in [
        json!({ "productId": product, "adjustment": "abc" }),
        json!({ "adjustment": 1 }),
        json!({ "productId": product, "adjustment": 0 }),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/v1/admin/stock/adjust")
            .insert_header(bearer(admin))
            .set_json(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}

#[actix_web::test]
async fn non_admin_is_forbidden() {
    let pool = setup_db().await;
    let user = insert_profile(&pool, false).await;
    let product = insert_product(&pool, 2).await;
    let app = init_app!(pool);

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/stock/adjust")
        .insert_header(bearer(user))
        .set_json(json!({ "productId": product, "adjustment": 1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[actix_web::test]
async fn admin_creates_and_deactivates_coupon() {
    let pool = setup_db().await;
    let admin = insert_profile(&pool, true).await;
    let app = init_app!(pool);

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/coupons")
        .insert_header(bearer(admin))
        .set_json(json!({
            "code": "spring15",
            "discountType": "percentage",
            "discountValue": 1500,
            "maxDiscountAmount": 3000
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["code"], "SPRING15");
    let id = body["data"]["id"].as_i64().unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/admin/coupons/{id}/status"))
        .insert_header(bearer(admin))
        .set_json(json!({ "isActive": false }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/v1/coupons/validate")
        .set_json(json!({ "code": "SPRING15", "cartTotal": 10000 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid coupon code");

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/coupons?active=false")
        .insert_header(bearer(admin))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total"], 1);
}

#[actix_web::test]
async fn restore_reports_skipped_products() {
    let pool = setup_db().await;
    let admin = insert_profile(&pool, true).await;
    let product = insert_product(&pool, 0).await;
    let app = init_app!(pool);

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/stock/restore")
        .insert_header(bearer(admin))
        .set_json(json!({
            "orderId": 9,
            "items": [
                { "productId": product, "quantity": 3 },
                { "productId": 999, "quantity": 1 }
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["applied"][0]["newStock"], 3);
    assert_eq!(body["data"]["skippedProductIds"], json!([999]));
}
