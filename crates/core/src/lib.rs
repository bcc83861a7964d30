pub mod config;
pub mod error;
pub mod notify;
pub mod types;

pub use config::AppConfig;
pub use error::{StoreError, TrackerError, TrackerResult};
