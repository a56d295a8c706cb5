//! Request handlers

pub mod health;
pub mod invoice_items;
pub mod sales_returns;
