pub mod connection_pool;
pub mod db;
pub mod dialect;

pub use connection_pool::{ConnectionFactory, ConnectionHandle, PoolStats, Session};
pub use db::{DatabaseSettings, DATABASE_URL_ENV};
pub use dialect::{Dialect, PoolPolicy};
