// Configuration layer - settings and logging
pub mod logging;
pub mod settings;

pub use logging::init_logging;
pub use settings::{AppSettings, ConfigError};
