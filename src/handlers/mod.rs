pub mod health;
pub mod metrics;

use prometheus::Registry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
}

impl AppState {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }
}
