//! `neurocore-analytics` — derived dashboard metrics.
//!
//! Pure, synchronous functions over in-memory records: filtering, criticality
//! ordering, inventory/sales/customer KPIs and daily sales series. Nothing
//! here performs I/O or fails; odd input (missing numbers, unparseable date
//! bounds) degrades to zeros or empty results.

pub mod customers;
pub mod filter;
pub mod inventory;
pub mod sales;

pub use customers::{CustomerKpis, SegmentCounts, customer_kpis, filter_customers, segment_counts};
pub use filter::{FilterSpec, Filterable, filter_items, matches};
pub use inventory::{CriticalItem, SummaryKpis, summary_kpis, with_criticality};
pub use sales::{
    ProductQty, SalesFilter, SalesKpis, SeriesPoint, filter_sales, local_date_key, parse_instant,
    previous_period_series, sales_kpis, time_series,
};
