//! `neurocore-sales` — sale records synced from sales channels.

pub mod sale;

pub use sale::{NewSaleRecord, SaleRecord};
