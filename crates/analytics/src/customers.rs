//! Customer views: segment filter, segment counts and averaged KPIs.

use serde::Serialize;

use neurocore_customers::{Customer, Segment};

/// Customers in `segment`, in input order. `None` keeps everyone; legacy
/// segment names are understood.
pub fn filter_customers(customers: &[Customer], segment: Option<&str>) -> Vec<Customer> {
    let Some(raw) = segment.filter(|s| !s.is_empty()) else {
        return customers.to_vec();
    };
    match Segment::parse(raw) {
        Some(segment) => customers
            .iter()
            .filter(|c| c.segment == segment)
            .cloned()
            .collect(),
        None => Vec::new(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SegmentCounts {
    pub new: usize,
    pub active: usize,
    pub inactive: usize,
}

pub fn segment_counts(customers: &[Customer]) -> SegmentCounts {
    customers
        .iter()
        .fold(SegmentCounts::default(), |mut counts, customer| {
            match customer.segment {
                Segment::New => counts.new += 1,
                Segment::Active => counts.active += 1,
                Segment::Inactive => counts.inactive += 1,
            }
            counts
        })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerKpis {
    pub ltv_average: f64,
    pub churn_average: f64,
    pub frequency_average: f64,
}

/// Averages over every customer; missing values count as 0.
pub fn customer_kpis(customers: &[Customer]) -> CustomerKpis {
    let average = |value: fn(&Customer) -> Option<f64>| -> f64 {
        if customers.is_empty() {
            return 0.0;
        }
        let sum: f64 = customers.iter().map(|c| value(c).unwrap_or(0.0)).sum();
        sum / customers.len() as f64
    };

    CustomerKpis {
        ltv_average: average(|c| c.ltv),
        churn_average: average(|c| c.churn_rate),
        frequency_average: average(|c| c.purchase_frequency),
    }
}
