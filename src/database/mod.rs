pub mod connection;
pub mod models;
pub mod setup;
pub mod store;

pub use connection::{DbConn, DbPool, create_pool, get_connection};
pub use models::*;
pub use store::{SqliteStateStore, StateStore};
