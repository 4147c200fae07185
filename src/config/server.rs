use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};
use std::collections::HashSet;
use std::time::Duration;
use super::Validate;
use crate::simulation::Category;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8585/".to_string(),
            request_timeout_ms: 5000,
        }
    }
}

/// Initialization payload sent to the remote model.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelParams {
    #[serde(rename = "NAgents", alias = "agents")]
    pub agents: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            agents: 500,
            width: 50,
            height: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    pub snapshot_interval_ms: u64,
    pub target_fps: f32,
}

impl TimingConfig {
    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_millis(self.snapshot_interval_ms)
    }

    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.target_fps)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            snapshot_interval_ms: 1000,
            target_fps: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Categories re-fetched after every advance. The initial sync always
    /// pulls all of them.
    pub poll_categories: Vec<Category>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_categories: Category::ALL.to_vec(),
        }
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(anyhow!("Server base URL must not be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(anyhow!("Server base URL must start with http:// or https://, got '{}'", self.base_url));
        }

        if self.request_timeout_ms == 0 {
            return Err(anyhow!("Request timeout must be greater than zero"));
        }

        Ok(())
    }
}

impl Validate for ModelParams {
    fn validate(&self) -> Result<()> {
        if self.agents == 0 {
            return Err(anyhow!("Agent count must be greater than zero"));
        }

        if self.width == 0 || self.height == 0 {
            return Err(anyhow!("Grid dimensions must be positive, got {}x{}", self.width, self.height));
        }

        Ok(())
    }
}

impl Validate for TimingConfig {
    fn validate(&self) -> Result<()> {
        if self.snapshot_interval_ms == 0 {
            return Err(anyhow!("Snapshot interval must be greater than zero"));
        }

        if !(self.target_fps > 0.0) || !self.target_fps.is_finite() {
            return Err(anyhow!("Target FPS must be positive, got {}", self.target_fps));
        }

        Ok(())
    }
}

impl Validate for SyncConfig {
    fn validate(&self) -> Result<()> {
        if self.poll_categories.is_empty() {
            return Err(anyhow!("At least one category must be polled"));
        }

        let mut seen = HashSet::new();
        for category in &self.poll_categories {
            if !seen.insert(category) {
                return Err(anyhow!("Category '{}' is listed more than once in poll_categories", category));
            }
        }

        Ok(())
    }
}
