pub mod common;
pub mod coupon;
pub mod pagination;
pub mod stock;

pub use common::*;
pub use coupon::*;
pub use pagination::*;
pub use stock::*;
