use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod server;
pub mod scene;

pub use server::*;
pub use scene::*;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct VisualizerConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelParams,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
}

impl VisualizerConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: VisualizerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

impl Validate for VisualizerConfig {
    fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.model.validate()?;
        self.timing.validate()?;
        self.sync.validate()?;
        self.scene.validate()?;
        self.performance.validate()?;
        Ok(())
    }
}

pub trait Validate {
    fn validate(&self) -> Result<()>;
}
