//! SQLite storage layer for energy-access planning data.
//!
//! This crate owns the tables the API reads from and exposes them two ways:
//! typed pass-through lookups (countries, models, stats) and a generic
//! [`QueryExecutor`] that runs parameterized SQL assembled elsewhere and
//! hands back column-typed rows.
//!
//! # Architecture
//!
//! - `Rc<RefCell<Connection>>` wrapper; every request opens its own
//!   [`Database`] so nothing is shared between threads
//! - On-disk SQLite via `rusqlite` for the server, in-memory for tests
//! - CSV fixtures loaded through the `load_*` methods
//! - Named-parameter binding only, never value interpolation
//!
//! # Usage
//!
//! ```rust
//! use gep_db::{Database, Params, QueryExecutor};
//!
//! let db = Database::new().unwrap();
//! db.load_scenarios("scenarioId,featureId,Pop2020\nabc-ke-1,0,100\n").unwrap();
//!
//! let mut params = Params::new();
//! params.bind("scenarioId", "abc-ke-1".to_string());
//! let row = db
//!     .execute_one("SELECT sum(Pop2020) AS pop FROM scenarios WHERE scenarioId = :scenarioId", &params)
//!     .unwrap();
//! assert_eq!(row.get_f64("pop"), Some(100.0));
//! ```
//!
//! # Tables
//!
//! See [`schema::create_schema`] for the full SQL schema.
//!
//! - `countries` - Country names keyed by ISO code
//! - `models` - Model metadata, including the JSON list columns
//!   (`filters`, `timesteps`, `levers`)
//! - `scenarios` - One row per (scenario, feature) with year-suffixed
//!   measure columns such as `Pop2030` or `ElecCode2025`

pub mod error;
pub mod execute;
mod loader;
pub mod models;
mod queries;
pub mod schema;

pub use error::{DbError, Result};
pub use execute::{is_identifier, quote_ident, Params, QueryExecutor, Row};

use rusqlite::{Connection, OpenFlags};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// SQLite database holding countries, models and scenario feature rows.
///
/// This struct is cheaply cloneable (via `Rc`). It is not `Send`: the API
/// server opens one per request inside a blocking task.
///
/// # Example
///
/// ```rust
/// use gep_db::Database;
///
/// let db = Database::new().unwrap();
/// db.load_countries("id,name\nKE,Kenya\n").unwrap();
/// assert!(db.query_countries().unwrap().is_empty(), "no model references KE yet");
/// ```
#[derive(Clone)]
pub struct Database {
    conn: Rc<RefCell<Connection>>,
}

impl Database {
    /// Create a new in-memory database with the full schema applied.
    ///
    /// The database is empty after creation; use the `load_*` methods
    /// to populate it with CSV data.
    pub fn new() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(schema::create_schema())?;
        Ok(Self::from_connection(conn))
    }

    /// Open (or create) a database file for loading, applying the schema.
    pub fn create<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch(schema::create_schema())?;
        log::info!("[GEP] db: opened {} for writing", path.as_ref().display());
        Ok(Self::from_connection(conn))
    }

    /// Open an existing database file read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Rc::new(RefCell::new(conn)),
        }
    }
}
