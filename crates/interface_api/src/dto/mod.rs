//! Request and response data transfer objects

pub mod invoice_items;
pub mod sales_return;
