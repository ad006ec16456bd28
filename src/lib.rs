pub mod collector;
pub mod config;
pub mod device;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod routes;

pub use collector::{build_registry, MeterCollector};
pub use config::Config;
pub use device::{DeviceReader, HttpDeviceReader};
pub use error::{AppError, FetchError, Result};
pub use handlers::AppState;
pub use metrics::{MeterDescriptors, MetricDescriptor, Tariff};
pub use models::Reading;
