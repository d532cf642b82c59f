mod client;

pub use client::{Session, SessionClient, collect_cookies};
