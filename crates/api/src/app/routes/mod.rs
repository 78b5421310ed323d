pub mod manufacturing;
pub mod purchases;
pub mod sales;
pub mod stock;
