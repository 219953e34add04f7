//! Dashboard and report aggregation over stored orders.
//!
//! All aggregates are computed from order rows in memory; date ranges
//! are resolved against the shop's local calendar.

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::db::DbState;
use crate::error::StoreError;
use crate::models::{Category, Order, OrderStatus};
use crate::orders::{self, OrderFilter};

/// Reporting period, resolved to an inclusive local date range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Period {
    /// The current local calendar day.
    Today,
    /// Monday through Sunday of the current week.
    Week,
    /// First through last day of the given month.
    Month { year: i32, month: u32 },
    /// Explicit inclusive range.
    Range { start: NaiveDate, end: NaiveDate },
}

impl Period {
    /// Resolve to an inclusive `[start, end]` date pair, relative to
    /// `today` for the calendar-anchored variants.
    pub fn resolve(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), StoreError> {
        match *self {
            Period::Today => Ok((today, today)),
            Period::Week => {
                let monday =
                    today - Duration::days(today.weekday().num_days_from_monday() as i64);
                Ok((monday, monday + Duration::days(6)))
            }
            Period::Month { year, month } => {
                let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
                    StoreError::validation(format!("invalid month {year}-{month}"))
                })?;
                let next = if month == 12 {
                    NaiveDate::from_ymd_opt(year + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(year, month + 1, 1)
                }
                .ok_or_else(|| StoreError::validation(format!("invalid month {year}-{month}")))?;
                Ok((start, next - Duration::days(1)))
            }
            Period::Range { start, end } => {
                if start > end {
                    return Err(StoreError::validation("range start is after its end"));
                }
                Ok((start, end))
            }
        }
    }
}

/// One status slice of the breakdown.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusSlice {
    pub status: OrderStatus,
    pub count: i64,
}

/// One entry of the top-services ranking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopService {
    pub service_id: String,
    pub count: i64,
    /// Share of all orders in the period, rounded to whole percent.
    pub percent: i64,
}

/// Aggregated figures for a period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportSummary {
    pub revenue: i64,
    pub total_orders: i64,
    /// Kilograms across kilo orders; satuan orders contribute nothing.
    pub total_weight: f64,
    /// Orders per calendar day that had at least one order, rounded.
    pub avg_per_active_day: i64,
    /// Counts in fixed display order: Proses, Siap, Selesai.
    pub status_breakdown: Vec<StatusSlice>,
    /// Top three services by order count, descending.
    pub top_services: Vec<TopService>,
}

/// Daily revenue point for the report chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayRevenue {
    pub date: NaiveDate,
    pub orders: i64,
    pub revenue: i64,
}

fn local_date(order: &Order) -> NaiveDate {
    order.created_at.with_timezone(&Local).date_naive()
}

fn load_orders_in_range(
    db: &DbState,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Order>, StoreError> {
    let mut all = orders::list_orders(db, &OrderFilter::default())?;
    all.retain(|o| {
        let d = local_date(o);
        d >= start && d <= end
    });
    Ok(all)
}

/// Aggregate a slice of orders. Pure; the orders are assumed to already
/// match the period.
pub fn summarize_orders(orders: &[Order]) -> ReportSummary {
    let total_orders = orders.len() as i64;
    let revenue: i64 = orders.iter().map(|o| o.total_price).sum();
    let total_weight: f64 = orders
        .iter()
        .filter(|o| o.category == Category::Kilo)
        .filter_map(|o| o.weight_kg)
        .sum();

    let mut active_days: Vec<NaiveDate> = orders.iter().map(local_date).collect();
    active_days.sort_unstable();
    active_days.dedup();
    let avg_per_active_day = if active_days.is_empty() {
        0
    } else {
        (total_orders as f64 / active_days.len() as f64).round() as i64
    };

    let status_breakdown = OrderStatus::ALL
        .into_iter()
        .map(|status| StatusSlice {
            status,
            count: orders.iter().filter(|o| o.status == status).count() as i64,
        })
        .collect();

    let mut per_service: Vec<(String, i64)> = Vec::new();
    for order in orders {
        if let Some(id) = order.service_id() {
            match per_service.iter_mut().find(|(sid, _)| sid == id) {
                Some((_, n)) => *n += 1,
                None => per_service.push((id.to_string(), 1)),
            }
        }
    }
    // descending by count, then id so equal counts rank deterministically
    per_service.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let top_services = per_service
        .into_iter()
        .take(3)
        .map(|(service_id, count)| TopService {
            service_id,
            count,
            percent: (count as f64 * 100.0 / total_orders as f64).round() as i64,
        })
        .collect();

    ReportSummary {
        revenue,
        total_orders,
        total_weight,
        avg_per_active_day,
        status_breakdown,
        top_services,
    }
}

/// Aggregate the stored orders over a period.
pub fn summarize(db: &DbState, period: &Period) -> Result<ReportSummary, StoreError> {
    let (start, end) = period.resolve(Local::now().date_naive())?;
    let rows = load_orders_in_range(db, start, end)?;
    Ok(summarize_orders(&rows))
}

/// Revenue and order count per day across the period, zero-filled so the
/// chart has a point for every day.
pub fn revenue_by_day(db: &DbState, period: &Period) -> Result<Vec<DayRevenue>, StoreError> {
    let (start, end) = period.resolve(Local::now().date_naive())?;
    let rows = load_orders_in_range(db, start, end)?;

    let mut out = Vec::new();
    let mut day = start;
    while day <= end {
        let mut point = DayRevenue {
            date: day,
            orders: 0,
            revenue: 0,
        };
        for order in rows.iter().filter(|o| local_date(o) == day) {
            point.orders += 1;
            point.revenue += order.total_price;
        }
        out.push(point);
        day += Duration::days(1);
    }
    Ok(out)
}

/// Dashboard headline numbers: today's intake plus the all-time status
/// counts shown next to it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodayStats {
    pub orders_today: i64,
    pub revenue_today: i64,
    pub proses: i64,
    pub siap: i64,
    pub selesai: i64,
}

/// Today's figures for the dashboard header.
pub fn today_stats(db: &DbState) -> Result<TodayStats, StoreError> {
    let today = summarize(db, &Period::Today)?;
    let counts = orders::status_counts(db)?;
    Ok(TodayStats {
        orders_today: today.total_orders,
        revenue_today: today.revenue,
        proses: counts.proses,
        siap: counts.siap,
        selesai: counts.selesai,
    })
}

/// Distinct (year, month) pairs that have orders, most recent first.
/// Feeds the report screen's month picker.
pub fn order_months(db: &DbState) -> Result<Vec<(i32, u32)>, StoreError> {
    let all = orders::list_orders(db, &OrderFilter::default())?;
    let mut months: Vec<(i32, u32)> = all
        .iter()
        .map(|o| {
            let d = local_date(o);
            (d.year(), d.month())
        })
        .collect();
    months.sort_unstable_by(|a, b| b.cmp(a));
    months.dedup();
    Ok(months)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn order(
        id: &str,
        service_id: &str,
        category: Category,
        total: i64,
        weight: Option<f64>,
        status: OrderStatus,
        day_offset: i64,
    ) -> Order {
        let created = Utc::now() - Duration::days(day_offset);
        Order {
            id: id.into(),
            order_number: 1,
            customer_name: "X".into(),
            customer_phone: "0811".into(),
            note: None,
            category,
            kilo_service_id: (category == Category::Kilo).then(|| service_id.to_string()),
            satuan_item_id: (category == Category::Satuan).then(|| service_id.to_string()),
            speed_id: "sp".into(),
            weight_kg: weight,
            qty: weight.is_none().then_some(1),
            base_price: 0,
            express_extra: 0,
            price_per_unit: 0,
            total_price: total,
            status,
            created_at: created,
        }
    }

    #[test]
    fn empty_summary_is_all_zero() {
        let summary = summarize_orders(&[]);
        assert_eq!(summary.revenue, 0);
        assert_eq!(summary.total_orders, 0);
        assert_eq!(summary.total_weight, 0.0);
        assert_eq!(summary.avg_per_active_day, 0);
        assert!(summary.status_breakdown.iter().all(|s| s.count == 0));
        assert!(summary.top_services.is_empty());
    }

    #[test]
    fn breakdown_sums_to_total_and_keeps_order() {
        let rows = vec![
            order("a", "s1", Category::Kilo, 10_000, Some(2.0), OrderStatus::Proses, 0),
            order("b", "s1", Category::Kilo, 12_000, Some(3.0), OrderStatus::Siap, 0),
            order("c", "s2", Category::Satuan, 15_000, None, OrderStatus::Selesai, 0),
            order("d", "s2", Category::Satuan, 15_000, None, OrderStatus::Selesai, 0),
        ];
        let summary = summarize_orders(&rows);
        assert_eq!(summary.total_orders, 4);
        assert_eq!(summary.revenue, 52_000);
        assert_eq!(summary.total_weight, 5.0);

        let counts: Vec<i64> = summary.status_breakdown.iter().map(|s| s.count).collect();
        assert_eq!(counts.iter().sum::<i64>(), summary.total_orders);
        let statuses: Vec<OrderStatus> =
            summary.status_breakdown.iter().map(|s| s.status).collect();
        assert_eq!(statuses, OrderStatus::ALL.to_vec());
    }

    #[test]
    fn top_services_descend_and_percentages_cap_at_100() {
        let rows = vec![
            order("a", "s1", Category::Kilo, 0, Some(1.0), OrderStatus::Proses, 0),
            order("b", "s1", Category::Kilo, 0, Some(1.0), OrderStatus::Proses, 0),
            order("c", "s1", Category::Kilo, 0, Some(1.0), OrderStatus::Proses, 0),
            order("d", "s2", Category::Satuan, 0, None, OrderStatus::Proses, 0),
            order("e", "s2", Category::Satuan, 0, None, OrderStatus::Proses, 0),
            order("f", "s3", Category::Kilo, 0, Some(1.0), OrderStatus::Proses, 0),
            order("g", "s4", Category::Kilo, 0, Some(1.0), OrderStatus::Proses, 0),
        ];
        let summary = summarize_orders(&rows);
        assert_eq!(summary.top_services.len(), 3);
        assert_eq!(summary.top_services[0].service_id, "s1");
        assert_eq!(summary.top_services[0].count, 3);
        for pair in summary.top_services.windows(2) {
            assert!(pair[1].count <= pair[0].count);
        }
        let percent_sum: i64 = summary.top_services.iter().map(|t| t.percent).sum();
        assert!(percent_sum <= 100);
    }

    #[test]
    fn avg_per_active_day_ignores_empty_days() {
        let rows = vec![
            order("a", "s1", Category::Kilo, 0, Some(1.0), OrderStatus::Proses, 0),
            order("b", "s1", Category::Kilo, 0, Some(1.0), OrderStatus::Proses, 0),
            order("c", "s1", Category::Kilo, 0, Some(1.0), OrderStatus::Proses, 4),
        ];
        // 3 orders across 2 active days, rounds to 2
        let summary = summarize_orders(&rows);
        assert_eq!(summary.avg_per_active_day, 2);
    }

    #[test]
    fn week_runs_monday_through_sunday() {
        // 2026-08-27 is a Thursday
        let today = NaiveDate::from_ymd_opt(2026, 8, 27).unwrap();
        let (start, end) = Period::Week.resolve(today).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 8, 24).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 8, 30).unwrap());
        assert_eq!(start.weekday(), chrono::Weekday::Mon);
        assert_eq!(end.weekday(), chrono::Weekday::Sun);
    }

    #[test]
    fn month_resolves_to_full_month() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 27).unwrap();
        let (start, end) = Period::Month { year: 2026, month: 2 }.resolve(today).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());

        let (_, dec_end) = Period::Month { year: 2025, month: 12 }.resolve(today).unwrap();
        assert_eq!(dec_end, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());

        let err = Period::Month { year: 2026, month: 13 }.resolve(today).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn explicit_range_must_be_ordered() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 27).unwrap();
        let start = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let err = Period::Range { start, end }.resolve(today).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        Period::Range { start: end, end: start }.resolve(today).unwrap();
    }

    #[test]
    fn chart_days_cover_range_and_sum_to_revenue() {
        use crate::catalog::{create_kilo_service, create_speed, KiloServiceInput, SpeedInput};
        use crate::db::test_db;
        use crate::orders::{create_order, NewOrder};
        use crate::profile::set_active_until;

        let db = test_db();
        set_active_until(&db, Utc::now() + Duration::days(30)).unwrap();
        let svc = create_kilo_service(
            &db,
            &KiloServiceInput {
                name: "Cuci".into(),
                description: None,
                price_per_kg: 5_000,
            },
        )
        .unwrap();
        let speed = create_speed(
            &db,
            &SpeedInput {
                name: "Reguler".into(),
                description: None,
                extra_price_kilo: 0,
                extra_price_satuan: 0,
            },
        )
        .unwrap();
        for weight in [1.0, 2.0] {
            create_order(
                &db,
                &NewOrder {
                    customer_name: "Budi".into(),
                    customer_phone: "0811".into(),
                    note: None,
                    category: Category::Kilo,
                    kilo_service_id: Some(svc.id.clone()),
                    satuan_item_id: None,
                    speed_id: speed.id.clone(),
                    weight_kg: Some(weight),
                    qty: None,
                },
                Utc::now(),
            )
            .unwrap();
        }

        let period = Period::Week;
        let points = revenue_by_day(&db, &period).unwrap();
        assert_eq!(points.len(), 7);
        let summary = summarize(&db, &period).unwrap();
        assert_eq!(
            points.iter().map(|p| p.revenue).sum::<i64>(),
            summary.revenue
        );
        assert_eq!(points.iter().map(|p| p.orders).sum::<i64>(), 2);

        let stats = today_stats(&db).unwrap();
        assert_eq!(stats.orders_today, 2);
        assert_eq!(stats.revenue_today, summary.revenue);
        assert_eq!(stats.proses, 2);

        let months = order_months(&db).unwrap();
        assert_eq!(months.len(), 1);
        let today = Local::now().date_naive();
        assert_eq!(months[0], (today.year(), today.month()));
    }
}
