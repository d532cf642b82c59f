pub mod envelope;

pub use envelope::parse_page;
