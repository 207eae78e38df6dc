use std::sync::Arc;

use super::SessionCoordinator;
use crate::config::SessionConfig;
use crate::error::CoordinatorError;
use crate::transport::ReplicaLink;

/// Builder for creating coordinators (used in both tests and main)
#[derive(Default)]
pub struct CoordinatorBuilder {
    config: Option<SessionConfig>,
    link: Option<Arc<dyn ReplicaLink>>,
}

impl CoordinatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_link(mut self, link: Arc<dyn ReplicaLink>) -> Self {
        self.link = Some(link);
        self
    }

    /// Without an explicit config, `UNO_*` environment variables apply.
    pub fn build(self) -> Result<SessionCoordinator, CoordinatorError> {
        let config = match self.config {
            Some(config) => config,
            None => SessionConfig::from_env()?,
        };
        config.validate()?;
        let link = self
            .link
            .ok_or_else(|| CoordinatorError::config("A replica link is required"))?;
        Ok(SessionCoordinator::new(config, link))
    }
}

pub fn build_coordinator() -> CoordinatorBuilder {
    CoordinatorBuilder::new()
}
