//! Order record store: create, list, update, delete.
//!
//! All price fields are recomputed from the referenced offering and
//! speed on every create and update; the stored totals are the single
//! source of truth for receipts and reports. Order numbers come from a
//! dedicated sequence and are never reused, even after deletes.

use chrono::{DateTime, Utc};
use rusqlite::{params, TransactionBehavior};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::catalog;
use crate::db::DbState;
use crate::error::StoreError;
use crate::models::{Category, Order, OrderStatus};
use crate::pricing::{self, Quantity};
use crate::profile;

/// Input for creating an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_name: String,
    pub customer_phone: String,
    #[serde(default)]
    pub note: Option<String>,
    pub category: Category,
    #[serde(default)]
    pub kilo_service_id: Option<String>,
    #[serde(default)]
    pub satuan_item_id: Option<String>,
    pub speed_id: String,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub qty: Option<i64>,
}

/// Input for editing an existing order. Same shape as [`NewOrder`];
/// status and order number are changed through their own operations.
pub type OrderUpdate = NewOrder;

/// List filter. `status = None` means all statuses; `search` matches
/// customer name (case-insensitive), phone, or order number.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderFilter {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub search: Option<String>,
}

/// Per-status counts used by the list screen's filter chips.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: i64,
    pub proses: i64,
    pub siap: i64,
    pub selesai: i64,
}

/// Priced and validated order fields, ready to write.
struct PricedOrder {
    kilo_service_id: Option<String>,
    satuan_item_id: Option<String>,
    weight_kg: Option<f64>,
    qty: Option<i64>,
    base_price: i64,
    express_extra: i64,
    price_per_unit: i64,
    total_price: i64,
}

/// Validate the input's shape against its category and recompute all
/// price fields from the current tariffs.
fn resolve_and_price(db: &DbState, input: &NewOrder) -> Result<PricedOrder, StoreError> {
    if input.customer_name.trim().is_empty() {
        return Err(StoreError::validation("customer name must not be empty"));
    }
    if input.customer_phone.trim().is_empty() {
        return Err(StoreError::validation("customer phone must not be empty"));
    }

    let speed = catalog::get_speed(db, &input.speed_id)?;
    let express_extra = speed.extra_for(input.category);

    let (base_price, quantity, kilo_service_id, satuan_item_id) = match input.category {
        Category::Kilo => {
            if input.satuan_item_id.is_some() {
                return Err(StoreError::validation(
                    "kilo order must not reference a satuan item",
                ));
            }
            let service_id = input
                .kilo_service_id
                .as_deref()
                .ok_or_else(|| StoreError::validation("kilo order requires a kilo service"))?;
            let weight = input
                .weight_kg
                .ok_or_else(|| StoreError::validation("kilo order requires a weight"))?;
            let service = catalog::get_kilo_service(db, service_id)?;
            (
                service.price_per_kg,
                Quantity::Kilo(weight),
                Some(service.id),
                None,
            )
        }
        Category::Satuan => {
            if input.kilo_service_id.is_some() {
                return Err(StoreError::validation(
                    "satuan order must not reference a kilo service",
                ));
            }
            let item_id = input
                .satuan_item_id
                .as_deref()
                .ok_or_else(|| StoreError::validation("satuan order requires an item"))?;
            let qty = input
                .qty
                .ok_or_else(|| StoreError::validation("satuan order requires an item count"))?;
            let item = catalog::get_satuan_item(db, item_id)?;
            (
                item.price_per_item,
                Quantity::Satuan(qty),
                None,
                Some(item.id),
            )
        }
    };

    let quote = pricing::compute_price(input.category, base_price, express_extra, quantity)?;

    let (weight_kg, qty) = match quantity {
        Quantity::Kilo(w) => (Some(w), None),
        Quantity::Satuan(q) => (None, Some(q)),
    };

    Ok(PricedOrder {
        kilo_service_id,
        satuan_item_id,
        weight_kg,
        qty,
        base_price,
        express_extra,
        price_per_unit: quote.price_per_unit,
        total_price: quote.total,
    })
}

/// Create an order. Fails with [`StoreError::SubscriptionExpired`] when
/// the shop's subscription has lapsed.
pub fn create_order(db: &DbState, input: &NewOrder, now: DateTime<Utc>) -> Result<Order, StoreError> {
    profile::ensure_subscription_active(db, now)?;
    let priced = resolve_and_price(db, input)?;

    let id = Uuid::new_v4().to_string();
    let mut conn = db.lock()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let order_number: i64 = tx.query_row(
        "SELECT next_number FROM order_sequence WHERE id = 1",
        [],
        |row| row.get(0),
    )?;
    tx.execute(
        "UPDATE order_sequence SET next_number = next_number + 1 WHERE id = 1",
        [],
    )?;

    tx.execute(
        "INSERT INTO orders (
            id, order_number, customer_name, customer_phone, note, category,
            kilo_service_id, satuan_item_id, speed_id, weight_kg, qty,
            base_price, express_extra, price_per_unit, total_price, status, created_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            id,
            order_number,
            input.customer_name.trim(),
            input.customer_phone.trim(),
            input.note,
            input.category.code(),
            priced.kilo_service_id,
            priced.satuan_item_id,
            input.speed_id,
            priced.weight_kg,
            priced.qty,
            priced.base_price,
            priced.express_extra,
            priced.price_per_unit,
            priced.total_price,
            OrderStatus::Proses.label(),
            now.to_rfc3339(),
        ],
    )?;
    tx.commit()?;
    drop(conn);

    info!(
        "Created order #{:06} for '{}' ({} rupiah)",
        order_number,
        input.customer_name.trim(),
        priced.total_price
    );

    get_order(db, &id)
}

const ORDER_COLUMNS: &str = "id, order_number, customer_name, customer_phone, note, category,
    kilo_service_id, satuan_item_id, speed_id, weight_kg, qty,
    base_price, express_extra, price_per_unit, total_price, status, created_at";

fn row_to_order(row: &rusqlite::Row<'_>) -> rusqlite::Result<Order> {
    let category_raw: String = row.get(5)?;
    let category = Category::from_code(&category_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("unknown category '{category_raw}'").into(),
        )
    })?;
    let status_raw: String = row.get(15)?;
    let status = OrderStatus::from_label(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            15,
            rusqlite::types::Type::Text,
            format!("unknown status '{status_raw}'").into(),
        )
    })?;
    let created_raw: String = row.get(16)?;
    let created_at = DateTime::parse_from_rfc3339(&created_raw)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                16,
                rusqlite::types::Type::Text,
                format!("bad created_at '{created_raw}': {e}").into(),
            )
        })?
        .with_timezone(&Utc);

    Ok(Order {
        id: row.get(0)?,
        order_number: row.get(1)?,
        customer_name: row.get(2)?,
        customer_phone: row.get(3)?,
        note: row.get(4)?,
        category,
        kilo_service_id: row.get(6)?,
        satuan_item_id: row.get(7)?,
        speed_id: row.get(8)?,
        weight_kg: row.get(9)?,
        qty: row.get(10)?,
        base_price: row.get(11)?,
        express_extra: row.get(12)?,
        price_per_unit: row.get(13)?,
        total_price: row.get(14)?,
        status,
        created_at,
    })
}

fn matches_search(order: &Order, query: &str) -> bool {
    let q = query.trim().trim_start_matches('#').to_lowercase();
    if q.is_empty() {
        return true;
    }
    order.customer_name.to_lowercase().contains(&q)
        || order.customer_phone.contains(&q)
        || format!("{:06}", order.order_number).contains(&q)
}

/// List orders, newest first, applying the filter.
pub fn list_orders(db: &DbState, filter: &OrderFilter) -> Result<Vec<Order>, StoreError> {
    let rows = {
        let conn = db.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, order_number DESC"
        ))?;
        let rows = stmt.query_map([], |row| row_to_order(row))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
    };

    let mut orders = rows;
    if let Some(status) = filter.status {
        orders.retain(|o| o.status == status);
    }
    if let Some(query) = filter.search.as_deref() {
        orders.retain(|o| matches_search(o, query));
    }
    Ok(orders)
}

/// Per-status order counts across the whole store (filters do not apply).
pub fn status_counts(db: &DbState) -> Result<StatusCounts, StoreError> {
    let conn = db.lock()?;
    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM orders GROUP BY status")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut counts = StatusCounts::default();
    for row in rows {
        let (status, n) = row?;
        counts.total += n;
        match OrderStatus::from_label(&status) {
            Some(OrderStatus::Proses) => counts.proses += n,
            Some(OrderStatus::Siap) => counts.siap += n,
            Some(OrderStatus::Selesai) => counts.selesai += n,
            None => {}
        }
    }
    Ok(counts)
}

/// Fetch one order by id.
pub fn get_order(db: &DbState, id: &str) -> Result<Order, StoreError> {
    let conn = db.lock()?;
    conn.query_row(
        &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"),
        params![id],
        |row| row_to_order(row),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::not_found("order", id),
        other => other.into(),
    })
}

/// Fetch one order by its shop-unique number.
pub fn get_order_by_number(db: &DbState, order_number: i64) -> Result<Order, StoreError> {
    let conn = db.lock()?;
    conn.query_row(
        &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = ?1"),
        params![order_number],
        |row| row_to_order(row),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            StoreError::not_found("order", format!("#{order_number:06}"))
        }
        other => other.into(),
    })
}

/// Set an order's status. Setting the current status again is a no-op,
/// not an error.
pub fn update_status(db: &DbState, id: &str, status: OrderStatus) -> Result<Order, StoreError> {
    {
        let conn = db.lock()?;
        let changed = conn.execute(
            "UPDATE orders SET status = ?1 WHERE id = ?2",
            params![status.label(), id],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("order", id));
        }
    }
    info!("Order {} status -> {}", id, status.label());
    get_order(db, id)
}

/// Edit an order's customer details and service selection. Price fields
/// are recomputed from the current tariffs; status, number and creation
/// time are untouched.
pub fn update_order(db: &DbState, id: &str, input: &OrderUpdate) -> Result<Order, StoreError> {
    // existence check up front so a bad id beats a bad payload
    get_order(db, id)?;
    let priced = resolve_and_price(db, input)?;

    {
        let conn = db.lock()?;
        conn.execute(
            "UPDATE orders SET
                customer_name = ?1, customer_phone = ?2, note = ?3, category = ?4,
                kilo_service_id = ?5, satuan_item_id = ?6, speed_id = ?7,
                weight_kg = ?8, qty = ?9, base_price = ?10, express_extra = ?11,
                price_per_unit = ?12, total_price = ?13
             WHERE id = ?14",
            params![
                input.customer_name.trim(),
                input.customer_phone.trim(),
                input.note,
                input.category.code(),
                priced.kilo_service_id,
                priced.satuan_item_id,
                input.speed_id,
                priced.weight_kg,
                priced.qty,
                priced.base_price,
                priced.express_extra,
                priced.price_per_unit,
                priced.total_price,
                id
            ],
        )?;
    }
    info!("Updated order {} (total {} rupiah)", id, priced.total_price);
    get_order(db, id)
}

/// Delete an order. Its number is not returned to the sequence.
pub fn delete_order(db: &DbState, id: &str) -> Result<(), StoreError> {
    let conn = db.lock()?;
    let changed = conn.execute("DELETE FROM orders WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(StoreError::not_found("order", id));
    }
    info!("Deleted order {}", id);
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================
