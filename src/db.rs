//! Local SQLite persistence layer.
//!
//! Uses rusqlite with WAL mode. Provides schema migrations and the
//! shared `DbState` handle that every store function takes explicitly —
//! there is no ambient global connection. This layer owns the shop's
//! order-number sequence.

use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::error::StoreError;

/// Shared handle holding the database connection.
pub struct DbState {
    pub conn: Mutex<Connection>,
    pub db_path: PathBuf,
}

impl DbState {
    /// Lock the connection, mapping a poisoned mutex into a store error.
    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|e| StoreError::Lock(e.to_string()))
    }
}

/// Current schema version. Bump when adding new migrations.
const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Initialize the database at `{data_dir}/laundry.db`.
///
/// Creates the directory if needed, opens the connection, sets pragmas,
/// and runs any pending migrations. On corruption or open failure,
/// deletes the file and retries once.
pub fn init(data_dir: &Path) -> Result<DbState, StoreError> {
    fs::create_dir_all(data_dir)?;

    let db_path = data_dir.join("laundry.db");
    info!("Opening database at {}", db_path.display());

    let conn = match open_and_configure(&db_path) {
        Ok(c) => c,
        Err(first_err) => {
            warn!(
                "Database open failed ({}), deleting and retrying once",
                first_err
            );
            if db_path.exists() {
                let _ = fs::remove_file(&db_path);
                // Also remove WAL/SHM files if present
                let _ = fs::remove_file(db_path.with_extension("db-wal"));
                let _ = fs::remove_file(db_path.with_extension("db-shm"));
            }
            open_and_configure(&db_path)?
        }
    };

    run_migrations(&conn)?;

    info!("Database initialized (schema v{CURRENT_SCHEMA_VERSION})");

    Ok(DbState {
        conn: Mutex::new(conn),
        db_path,
    })
}

/// Open the database file and apply pragmas.
fn open_and_configure(path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(path)?;

    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;

    Ok(conn)
}

/// Run all pending migrations up to `CURRENT_SCHEMA_VERSION`.
fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    // Ensure schema_version table exists first
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT DEFAULT (datetime('now'))
        );",
    )?;

    let current: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current >= CURRENT_SCHEMA_VERSION {
        info!("Database schema up to date (v{current})");
        return Ok(());
    }

    info!("Migrating database from v{current} to v{CURRENT_SCHEMA_VERSION}");

    if current < 1 {
        migrate_v1(conn)?;
    }
    if current < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Migration v1: master data, orders, profile, order-number sequence.
fn migrate_v1(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        -- service master data
        CREATE TABLE IF NOT EXISTS service_categories (
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL CHECK (code IN ('kilo', 'satuan')),
            name TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS kilo_services (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            price_per_kg INTEGER NOT NULL DEFAULT 0,
            active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS satuan_items (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            price_per_item INTEGER NOT NULL DEFAULT 0,
            active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS service_speeds (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            extra_price_kilo INTEGER NOT NULL DEFAULT 0,
            extra_price_satuan INTEGER NOT NULL DEFAULT 0,
            active INTEGER NOT NULL DEFAULT 1
        );

        -- orders
        CREATE TABLE IF NOT EXISTS orders (
            id TEXT PRIMARY KEY,
            order_number INTEGER NOT NULL UNIQUE,
            customer_name TEXT NOT NULL,
            customer_phone TEXT NOT NULL,
            note TEXT,
            category TEXT NOT NULL CHECK (category IN ('kilo', 'satuan')),
            kilo_service_id TEXT,
            satuan_item_id TEXT,
            speed_id TEXT NOT NULL,
            weight_kg REAL,
            qty INTEGER,
            base_price INTEGER NOT NULL DEFAULT 0,
            express_extra INTEGER NOT NULL DEFAULT 0,
            price_per_unit INTEGER NOT NULL DEFAULT 0,
            total_price INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'Proses',
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_orders_created_at ON orders(created_at);
        CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status);

        -- order_number allocator; numbers survive deletes and are never reused
        CREATE TABLE IF NOT EXISTS order_sequence (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            next_number INTEGER NOT NULL
        );
        INSERT OR IGNORE INTO order_sequence (id, next_number) VALUES (1, 1);

        -- shop profile singleton; active_until gates order creation
        CREATE TABLE IF NOT EXISTS profiles (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            laundry_name TEXT NOT NULL DEFAULT '',
            address TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            active_until TEXT NOT NULL DEFAULT '1970-01-01T00:00:00Z'
        );
        INSERT OR IGNORE INTO profiles (id) VALUES (1);

        INSERT INTO schema_version (version) VALUES (1);
        ",
    )?;
    Ok(())
}

/// Migration v2: WhatsApp receipt message template.
fn migrate_v2(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS message_templates (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            header TEXT NOT NULL DEFAULT '',
            footer TEXT NOT NULL DEFAULT ''
        );
        INSERT OR IGNORE INTO message_templates (id, header, footer) VALUES (
            1,
            'Terima kasih telah laundry di tempat kami 🙏',
            'Simpan nota ini sebagai bukti pengambilan.'
        );

        INSERT INTO schema_version (version) VALUES (2);
        ",
    )?;
    Ok(())
}

/// Test helper: run migrations against an arbitrary (in-memory) connection.
#[cfg(test)]
pub(crate) fn run_migrations_for_test(conn: &Connection) {
    run_migrations(conn).expect("run_migrations should succeed in test");
}

/// Test helper: a fully migrated in-memory database.
#[cfg(test)]
pub(crate) fn test_db() -> DbState {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )
    .expect("set pragmas");
    run_migrations_for_test(&conn);
    DbState {
        conn: Mutex::new(conn),
        db_path: PathBuf::from(":memory:"),
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let db = test_db();
        let conn = db.conn.lock().unwrap();
        run_migrations(&conn).expect("second run is a no-op");

        let version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_version",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn singletons_are_seeded() {
        let db = test_db();
        let conn = db.conn.lock().unwrap();

        let profiles: i64 = conn
            .query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))
            .unwrap();
        assert_eq!(profiles, 1);

        let header: String = conn
            .query_row(
                "SELECT header FROM message_templates WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(!header.is_empty());

        let next: i64 = conn
            .query_row(
                "SELECT next_number FROM order_sequence WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(next, 1);
    }
}
