//! Database layer
//!
//! Storage for users, sessions, notes, news and comments. Two drivers are
//! supported:
//! - SQLite (default, single file next to the binary)
//! - MySQL
//!
//! The driver is selected by `database.driver` in the configuration.
//!
//! # Architecture
//!
//! `DatabasePool` hides the concrete driver. Repositories match on
//! `DatabasePool::backend()` and run the query against whichever pool is
//! behind it.
//!
//! # Usage
//!
//! ```ignore
//! use notenews::config::DatabaseConfig;
//! use notenews::db::{create_pool, migrations};
//!
//! let config = DatabaseConfig::default();
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, is_unique_violation, Backend, DatabasePool, DynDatabasePool,
    MysqlDatabase, SqliteDatabase,
};
