pub mod auth;
pub mod cargo_client;
pub mod handlers;
pub mod parsers;
pub mod routes;

pub use auth::{Anonymous, AuthProvider, WikiLogin};
pub use cargo_client::CargoClient;
