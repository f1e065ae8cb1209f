pub mod authorization_service;
pub mod coupon_service;
pub mod stock_service;

pub use authorization_service::*;
pub use coupon_service::*;
pub use stock_service::*;
