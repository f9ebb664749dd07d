//! Application state shared across handlers.

use std::sync::Arc;

use anyhow::Result;

use crate::analyzer::VisionClient;
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub vision: Arc<VisionClient>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let vision = VisionClient::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            vision: Arc::new(vision),
        })
    }
}
