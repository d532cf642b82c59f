pub mod settings;
pub mod sources;

pub use settings::AppConfig;
pub use sources::{ConfigSource, DirectoryConfigSource, RemoteConfigSource, build_config_source};
