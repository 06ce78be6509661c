pub mod bulk_orders;
pub mod checkout;
pub mod health;
pub mod metrics;
