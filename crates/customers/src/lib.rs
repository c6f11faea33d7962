//! `neurocore-customers` — CRM customer records.

pub mod customer;

pub use customer::{Customer, NewCustomer, Segment};
