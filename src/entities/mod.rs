pub mod coupon_redemptions;
pub mod coupons;
pub mod products;
pub mod profiles;
pub mod stock_adjustments;

pub use coupon_redemptions as coupon_redemption_entity;
pub use coupons as coupon_entity;
pub use coupons::DiscountType;
pub use products as product_entity;
pub use profiles as profile_entity;
pub use stock_adjustments as stock_adjustment_entity;
