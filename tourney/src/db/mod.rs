//! PostgreSQL configuration and the PostgreSQL-backed [`Store`].
//!
//! [`Store`]: crate::store::Store

pub mod config;
pub mod store;

pub use config::{DatabaseConfig, parse_env_or};
pub use store::PgStore;
