//! Inventory views: criticality ordering and summary KPIs.

use serde::Serialize;

use neurocore_inventory::InventoryItem;

/// An item paired with its derived criticality.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalItem {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub criticality: i64,
}

/// Items augmented with criticality, most urgent first.
///
/// The sort is stable: equal criticality keeps input order.
pub fn with_criticality(items: &[InventoryItem]) -> Vec<CriticalItem> {
    let mut out: Vec<CriticalItem> = items
        .iter()
        .map(|item| CriticalItem {
            criticality: item.criticality(),
            item: item.clone(),
        })
        .collect();
    out.sort_by(|a, b| b.criticality.cmp(&a.criticality));
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryKpis {
    pub total_stock: i64,
    pub low_stock_count: usize,
    pub rotation_average: f64,
}

pub fn summary_kpis(items: &[InventoryItem]) -> SummaryKpis {
    let total_stock = items
        .iter()
        .fold(0i64, |total, item| total.saturating_add(item.stock));
    let low_stock_count = items.iter().filter(|item| item.is_low_stock()).count();
    let rotation_average = if items.is_empty() {
        0.0
    } else {
        let sum: f64 = items
            .iter()
            .map(|item| item.rotation_rate.unwrap_or(0.0))
            .sum();
        sum / items.len() as f64
    };

    SummaryKpis {
        total_stock,
        low_stock_count,
        rotation_average,
    }
}
