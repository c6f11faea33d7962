//! Sales views: windowed KPIs, range/channel filtering and daily series.
//!
//! Calendar boundaries (day, ISO week, month, `YYYY-MM-DD` bounds, series
//! keys) are all evaluated in one fixed UTC offset supplied by the caller.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use neurocore_sales::SaleRecord;

use crate::filter::FilterSpec;

pub const TOP_PRODUCTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductQty {
    pub product_id: String,
    pub qty: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesKpis {
    pub day_total: f64,
    pub week_total: f64,
    pub month_total: f64,
    pub average_ticket: f64,
    pub top_products: Vec<ProductQty>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: String,
    pub total: f64,
}

/// Parse a filter bound: RFC 3339, or `YYYY-MM-DD` as midnight in `offset`.
pub fn parse_instant(raw: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    offset
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .single()
        .map(|local| local.with_timezone(&Utc))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Open,
    At(DateTime<Utc>),
    /// Unparseable input: every comparison against it is false.
    Malformed,
}

impl Bound {
    fn parse(raw: Option<&str>, offset: FixedOffset) -> Bound {
        match raw {
            None => Bound::Open,
            Some(raw) => parse_instant(raw, offset).map_or(Bound::Malformed, Bound::At),
        }
    }

    fn admits_after(&self, date: DateTime<Utc>) -> bool {
        match self {
            Bound::Open => true,
            Bound::At(start) => date >= *start,
            Bound::Malformed => false,
        }
    }

    fn admits_before(&self, date: DateTime<Utc>) -> bool {
        match self {
            Bound::Open => true,
            Bound::At(end) => date <= *end,
            Bound::Malformed => false,
        }
    }
}

/// Parsed `start` / `end` / `channel` constraints for sale rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesFilter {
    start: Bound,
    end: Bound,
    channel: Option<String>,
}

impl SalesFilter {
    pub const KEYS: [&'static str; 3] = ["start", "end", "channel"];

    pub fn from_spec(filters: &FilterSpec, offset: FixedOffset) -> Self {
        Self {
            start: Bound::parse(filters.get("start"), offset),
            end: Bound::parse(filters.get("end"), offset),
            channel: filters.get("channel").map(str::to_string),
        }
    }

    pub fn matches(&self, sale: &SaleRecord) -> bool {
        let in_range = self.start.admits_after(sale.date) && self.end.admits_before(sale.date);
        let by_channel = self
            .channel
            .as_deref()
            .is_none_or(|channel| sale.channel == channel);
        in_range && by_channel
    }
}

pub fn filter_sales(sales: &[SaleRecord], filters: &FilterSpec, offset: FixedOffset) -> Vec<SaleRecord> {
    let filter = SalesFilter::from_spec(filters, offset);
    sales.iter().filter(|s| filter.matches(s)).cloned().collect()
}

/// Daily totals of the filtered sales, one point per date, first-seen order.
pub fn time_series(sales: &[SaleRecord], filters: &FilterSpec, offset: FixedOffset) -> Vec<SeriesPoint> {
    let filter = SalesFilter::from_spec(filters, offset);
    daily_totals(sales.iter().filter(|s| filter.matches(s)), offset)
}

/// The same series for the window `[start - d, end - d]` where `d = end - start`.
///
/// Empty when either bound is absent.
pub fn previous_period_series(
    sales: &[SaleRecord],
    start: Option<&str>,
    end: Option<&str>,
    channel: Option<&str>,
    offset: FixedOffset,
) -> Vec<SeriesPoint> {
    let (Some(start), Some(end)) = (
        start.filter(|s| !s.is_empty()),
        end.filter(|s| !s.is_empty()),
    ) else {
        return Vec::new();
    };
    let (Some(start), Some(end)) = (parse_instant(start, offset), parse_instant(end, offset)) else {
        return Vec::new();
    };

    let delta = end - start;
    let filter = SalesFilter {
        start: Bound::At(start - delta),
        end: Bound::At(end - delta),
        channel: channel.filter(|c| !c.is_empty()).map(str::to_string),
    };
    daily_totals(sales.iter().filter(|s| filter.matches(s)), offset)
}

fn daily_totals<'a>(sales: impl Iterator<Item = &'a SaleRecord>, offset: FixedOffset) -> Vec<SeriesPoint> {
    let mut points: Vec<SeriesPoint> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for sale in sales {
        let key = local_date_key(sale.date, offset);
        match index.get(&key) {
            Some(&pos) => points[pos].total += sale.total_amount,
            None => {
                index.insert(key.clone(), points.len());
                points.push(SeriesPoint {
                    date: key,
                    total: sale.total_amount,
                });
            }
        }
    }
    points
}

pub fn local_date_key(date: DateTime<Utc>, offset: FixedOffset) -> String {
    date.with_timezone(&offset).format("%Y-%m-%d").to_string()
}

fn start_of_day(now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    now - now.time().signed_duration_since(NaiveTime::MIN)
}

/// Windowed totals relative to `now`, plus average ticket and top products
/// over every record.
pub fn sales_kpis(sales: &[SaleRecord], now: DateTime<FixedOffset>) -> SalesKpis {
    let day_start = start_of_day(now);
    let week_start = day_start - Duration::days(i64::from(now.weekday().num_days_from_monday()));
    let month_start = day_start - Duration::days(i64::from(now.day0()));
    let now_utc = now.with_timezone(&Utc);

    let window_total = |from: DateTime<FixedOffset>| -> f64 {
        let from = from.with_timezone(&Utc);
        sales
            .iter()
            .filter(|s| s.date >= from && s.date <= now_utc)
            .map(|s| s.total_amount)
            .sum()
    };

    let grand_total: f64 = sales.iter().map(|s| s.total_amount).sum();
    let average_ticket = if sales.is_empty() {
        0.0
    } else {
        grand_total / sales.len() as f64
    };

    SalesKpis {
        day_total: window_total(day_start),
        week_total: window_total(week_start),
        month_total: window_total(month_start),
        average_ticket,
        top_products: top_products(sales, TOP_PRODUCTS),
    }
}

fn top_products(sales: &[SaleRecord], limit: usize) -> Vec<ProductQty> {
    let mut totals: Vec<ProductQty> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for sale in sales {
        match index.get(sale.product_id.as_str()) {
            Some(&pos) => totals[pos].qty = totals[pos].qty.saturating_add(sale.qty),
            None => {
                index.insert(sale.product_id.as_str(), totals.len());
                totals.push(ProductQty {
                    product_id: sale.product_id.clone(),
                    qty: sale.qty,
                });
            }
        }
    }
    totals.sort_by(|a, b| b.qty.cmp(&a.qty));
    totals.truncate(limit);
    totals
}
