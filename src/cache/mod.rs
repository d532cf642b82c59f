mod structs;

pub use structs::JsonCache;
