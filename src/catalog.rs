//! Service master data: categories, per-kg offerings, per-item offerings
//! and speed tiers.
//!
//! Rows are soft-hidden via the `active` flag rather than deleted, so
//! old orders keep resolving their service names.

use std::collections::HashMap;

use rusqlite::params;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::db::DbState;
use crate::error::StoreError;
use crate::models::{Category, KiloService, SatuanItem, ServiceCategory, Speed};

/// Input for creating or updating a per-kg offering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KiloServiceInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_per_kg: i64,
}

/// Input for creating or updating a per-item offering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatuanItemInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_per_item: i64,
}

/// Input for creating or updating a speed tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub extra_price_kilo: i64,
    pub extra_price_satuan: i64,
}

fn require_name(name: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::validation("name must not be empty"));
    }
    Ok(())
}

fn require_price(label: &str, price: i64) -> Result<(), StoreError> {
    if price < 0 {
        return Err(StoreError::validation(format!(
            "{label} must not be negative"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Service categories
// ---------------------------------------------------------------------------

/// List service categories, optionally restricted to active ones.
pub fn list_categories(db: &DbState, only_active: bool) -> Result<Vec<ServiceCategory>, StoreError> {
    let conn = db.lock()?;
    let sql = if only_active {
        "SELECT id, code, name, active FROM service_categories WHERE active = 1 ORDER BY name"
    } else {
        "SELECT id, code, name, active FROM service_categories ORDER BY name"
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, bool>(3)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (id, code, name, active) = row?;
        let code = Category::from_code(&code)
            .ok_or_else(|| StoreError::validation(format!("unknown category code '{code}'")))?;
        out.push(ServiceCategory {
            id,
            code,
            name,
            active,
        });
    }
    Ok(out)
}

/// Create a service category.
pub fn create_category(
    db: &DbState,
    code: Category,
    name: &str,
) -> Result<ServiceCategory, StoreError> {
    require_name(name)?;
    let id = Uuid::new_v4().to_string();
    let conn = db.lock()?;
    conn.execute(
        "INSERT INTO service_categories (id, code, name, active) VALUES (?1, ?2, ?3, 1)",
        params![id, code.code(), name.trim()],
    )?;
    debug!("Created service category '{}' ({})", name.trim(), code.code());
    Ok(ServiceCategory {
        id,
        code,
        name: name.trim().to_string(),
        active: true,
    })
}

/// Rename a category or toggle its visibility.
pub fn update_category(
    db: &DbState,
    id: &str,
    name: &str,
    active: bool,
) -> Result<(), StoreError> {
    require_name(name)?;
    let conn = db.lock()?;
    let changed = conn.execute(
        "UPDATE service_categories SET name = ?1, active = ?2 WHERE id = ?3",
        params![name.trim(), active, id],
    )?;
    if changed == 0 {
        return Err(StoreError::not_found("service category", id));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Kilo services
// ---------------------------------------------------------------------------

fn row_to_kilo_service(row: &rusqlite::Row<'_>) -> rusqlite::Result<KiloService> {
    Ok(KiloService {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price_per_kg: row.get(3)?,
        active: row.get(4)?,
    })
}

/// List per-kg offerings ordered by name.
pub fn list_kilo_services(db: &DbState, only_active: bool) -> Result<Vec<KiloService>, StoreError> {
    let conn = db.lock()?;
    let sql = if only_active {
        "SELECT id, name, description, price_per_kg, active
         FROM kilo_services WHERE active = 1 ORDER BY name"
    } else {
        "SELECT id, name, description, price_per_kg, active
         FROM kilo_services ORDER BY name"
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| row_to_kilo_service(row))?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
}

/// Fetch one per-kg offering by id.
pub fn get_kilo_service(db: &DbState, id: &str) -> Result<KiloService, StoreError> {
    let conn = db.lock()?;
    conn.query_row(
        "SELECT id, name, description, price_per_kg, active
         FROM kilo_services WHERE id = ?1",
        params![id],
        |row| row_to_kilo_service(row),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::not_found("kilo service", id),
        other => other.into(),
    })
}

/// Create a per-kg offering.
pub fn create_kilo_service(
    db: &DbState,
    input: &KiloServiceInput,
) -> Result<KiloService, StoreError> {
    require_name(&input.name)?;
    require_price("price per kg", input.price_per_kg)?;
    let id = Uuid::new_v4().to_string();
    let conn = db.lock()?;
    conn.execute(
        "INSERT INTO kilo_services (id, name, description, price_per_kg, active)
         VALUES (?1, ?2, ?3, ?4, 1)",
        params![id, input.name.trim(), input.description, input.price_per_kg],
    )?;
    debug!("Created kilo service '{}'", input.name.trim());
    Ok(KiloService {
        id,
        name: input.name.trim().to_string(),
        description: input.description.clone(),
        price_per_kg: input.price_per_kg,
        active: true,
    })
}

/// Update a per-kg offering.
pub fn update_kilo_service(
    db: &DbState,
    id: &str,
    input: &KiloServiceInput,
    active: bool,
) -> Result<(), StoreError> {
    require_name(&input.name)?;
    require_price("price per kg", input.price_per_kg)?;
    let conn = db.lock()?;
    let changed = conn.execute(
        "UPDATE kilo_services
         SET name = ?1, description = ?2, price_per_kg = ?3, active = ?4
         WHERE id = ?5",
        params![
            input.name.trim(),
            input.description,
            input.price_per_kg,
            active,
            id
        ],
    )?;
    if changed == 0 {
        return Err(StoreError::not_found("kilo service", id));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Satuan items
// ---------------------------------------------------------------------------

fn row_to_satuan_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<SatuanItem> {
    Ok(SatuanItem {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price_per_item: row.get(3)?,
        active: row.get(4)?,
    })
}

/// List per-item offerings ordered by name.
pub fn list_satuan_items(db: &DbState, only_active: bool) -> Result<Vec<SatuanItem>, StoreError> {
    let conn = db.lock()?;
    let sql = if only_active {
        "SELECT id, name, description, price_per_item, active
         FROM satuan_items WHERE active = 1 ORDER BY name"
    } else {
        "SELECT id, name, description, price_per_item, active
         FROM satuan_items ORDER BY name"
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| row_to_satuan_item(row))?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
}

/// Fetch one per-item offering by id.
pub fn get_satuan_item(db: &DbState, id: &str) -> Result<SatuanItem, StoreError> {
    let conn = db.lock()?;
    conn.query_row(
        "SELECT id, name, description, price_per_item, active
         FROM satuan_items WHERE id = ?1",
        params![id],
        |row| row_to_satuan_item(row),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::not_found("satuan item", id),
        other => other.into(),
    })
}

/// Create a per-item offering.
pub fn create_satuan_item(
    db: &DbState,
    input: &SatuanItemInput,
) -> Result<SatuanItem, StoreError> {
    require_name(&input.name)?;
    require_price("price per item", input.price_per_item)?;
    let id = Uuid::new_v4().to_string();
    let conn = db.lock()?;
    conn.execute(
        "INSERT INTO satuan_items (id, name, description, price_per_item, active)
         VALUES (?1, ?2, ?3, ?4, 1)",
        params![id, input.name.trim(), input.description, input.price_per_item],
    )?;
    debug!("Created satuan item '{}'", input.name.trim());
    Ok(SatuanItem {
        id,
        name: input.name.trim().to_string(),
        description: input.description.clone(),
        price_per_item: input.price_per_item,
        active: true,
    })
}

/// Update a per-item offering.
pub fn update_satuan_item(
    db: &DbState,
    id: &str,
    input: &SatuanItemInput,
    active: bool,
) -> Result<(), StoreError> {
    require_name(&input.name)?;
    require_price("price per item", input.price_per_item)?;
    let conn = db.lock()?;
    let changed = conn.execute(
        "UPDATE satuan_items
         SET name = ?1, description = ?2, price_per_item = ?3, active = ?4
         WHERE id = ?5",
        params![
            input.name.trim(),
            input.description,
            input.price_per_item,
            active,
            id
        ],
    )?;
    if changed == 0 {
        return Err(StoreError::not_found("satuan item", id));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Speeds
// ---------------------------------------------------------------------------

fn row_to_speed(row: &rusqlite::Row<'_>) -> rusqlite::Result<Speed> {
    Ok(Speed {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        extra_price_kilo: row.get(3)?,
        extra_price_satuan: row.get(4)?,
        active: row.get(5)?,
    })
}

/// List speed tiers ordered by name.
pub fn list_speeds(db: &DbState, only_active: bool) -> Result<Vec<Speed>, StoreError> {
    let conn = db.lock()?;
    let sql = if only_active {
        "SELECT id, name, description, extra_price_kilo, extra_price_satuan, active
         FROM service_speeds WHERE active = 1 ORDER BY name"
    } else {
        "SELECT id, name, description, extra_price_kilo, extra_price_satuan, active
         FROM service_speeds ORDER BY name"
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| row_to_speed(row))?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
}

/// Fetch one speed tier by id.
pub fn get_speed(db: &DbState, id: &str) -> Result<Speed, StoreError> {
    let conn = db.lock()?;
    conn.query_row(
        "SELECT id, name, description, extra_price_kilo, extra_price_satuan, active
         FROM service_speeds WHERE id = ?1",
        params![id],
        |row| row_to_speed(row),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::not_found("service speed", id),
        other => other.into(),
    })
}

/// Create a speed tier.
pub fn create_speed(db: &DbState, input: &SpeedInput) -> Result<Speed, StoreError> {
    require_name(&input.name)?;
    require_price("kilo surcharge", input.extra_price_kilo)?;
    require_price("satuan surcharge", input.extra_price_satuan)?;
    let id = Uuid::new_v4().to_string();
    let conn = db.lock()?;
    conn.execute(
        "INSERT INTO service_speeds (id, name, description, extra_price_kilo, extra_price_satuan, active)
         VALUES (?1, ?2, ?3, ?4, ?5, 1)",
        params![
            id,
            input.name.trim(),
            input.description,
            input.extra_price_kilo,
            input.extra_price_satuan
        ],
    )?;
    debug!("Created speed '{}'", input.name.trim());
    Ok(Speed {
        id,
        name: input.name.trim().to_string(),
        description: input.description.clone(),
        extra_price_kilo: input.extra_price_kilo,
        extra_price_satuan: input.extra_price_satuan,
        active: true,
    })
}

/// Update a speed tier.
pub fn update_speed(
    db: &DbState,
    id: &str,
    input: &SpeedInput,
    active: bool,
) -> Result<(), StoreError> {
    require_name(&input.name)?;
    require_price("kilo surcharge", input.extra_price_kilo)?;
    require_price("satuan surcharge", input.extra_price_satuan)?;
    let conn = db.lock()?;
    let changed = conn.execute(
        "UPDATE service_speeds
         SET name = ?1, description = ?2, extra_price_kilo = ?3, extra_price_satuan = ?4, active = ?5
         WHERE id = ?6",
        params![
            input.name.trim(),
            input.description,
            input.extra_price_kilo,
            input.extra_price_satuan,
            active,
            id
        ],
    )?;
    if changed == 0 {
        return Err(StoreError::not_found("service speed", id));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// Map of offering id to display name across both offering tables,
/// used to resolve service names on order lists and receipts.
pub fn service_name_map(db: &DbState) -> Result<HashMap<String, String>, StoreError> {
    let conn = db.lock()?;
    let mut map = HashMap::new();
    for sql in [
        "SELECT id, name FROM kilo_services",
        "SELECT id, name FROM satuan_items",
    ] {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (id, name) = row?;
            map.insert(id, name);
        }
    }
    Ok(map)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    #[test]
    fn kilo_service_crud() {
        let db = test_db();
        let created = create_kilo_service(
            &db,
            &KiloServiceInput {
                name: "Cuci Setrika".into(),
                description: Some("wash and iron".into()),
                price_per_kg: 6_000,
            },
        )
        .unwrap();

        let fetched = get_kilo_service(&db, &created.id).unwrap();
        assert_eq!(fetched.price_per_kg, 6_000);

        update_kilo_service(
            &db,
            &created.id,
            &KiloServiceInput {
                name: "Cuci Setrika".into(),
                description: None,
                price_per_kg: 7_000,
            },
            false,
        )
        .unwrap();

        assert!(list_kilo_services(&db, true).unwrap().is_empty());
        let all = list_kilo_services(&db, false).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].price_per_kg, 7_000);
        assert!(!all[0].active);
    }

    #[test]
    fn missing_offering_is_not_found() {
        let db = test_db();
        let err = get_satuan_item(&db, "nope").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn empty_name_is_rejected() {
        let db = test_db();
        let err = create_speed(
            &db,
            &SpeedInput {
                name: "  ".into(),
                description: None,
                extra_price_kilo: 0,
                extra_price_satuan: 0,
            },
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn negative_price_is_rejected() {
        let db = test_db();
        let err = create_satuan_item(
            &db,
            &SatuanItemInput {
                name: "Bed Cover".into(),
                description: None,
                price_per_item: -1,
            },
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn name_map_spans_both_offering_tables() {
        let db = test_db();
        let kilo = create_kilo_service(
            &db,
            &KiloServiceInput {
                name: "Cuci Kering".into(),
                description: None,
                price_per_kg: 5_000,
            },
        )
        .unwrap();
        let item = create_satuan_item(
            &db,
            &SatuanItemInput {
                name: "Sepatu".into(),
                description: None,
                price_per_item: 25_000,
            },
        )
        .unwrap();

        let map = service_name_map(&db).unwrap();
        assert_eq!(map.get(&kilo.id).map(String::as_str), Some("Cuci Kering"));
        assert_eq!(map.get(&item.id).map(String::as_str), Some("Sepatu"));
    }

    #[test]
    fn categories_list_respects_active_flag() {
        let db = test_db();
        let cat = create_category(&db, Category::Kilo, "Kiloan").unwrap();
        update_category(&db, &cat.id, "Kiloan", false).unwrap();
        assert!(list_categories(&db, true).unwrap().is_empty());
        assert_eq!(list_categories(&db, false).unwrap().len(), 1);
    }
}
