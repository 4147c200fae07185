use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};
use super::Validate;
use crate::simulation::{Category, SignalState};

pub type Rgba = [f32; 4];

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Seed for derived placement. The same seed with cells arriving in the
    /// same sequence of compositions produces the same buildings.
    pub seed: u64,
    pub entity_scale: f32,
    pub buildings: BuildingConfig,
    pub ground: GroundConfig,
    pub palette: Palette,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            entity_scale: 0.5,
            buildings: BuildingConfig::default(),
            ground: GroundConfig::default(),
            palette: Palette::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BuildingConfig {
    pub max_count: usize,
    pub probability: f64,
    pub min_height: f32,
    pub max_height: f32,
}

impl Default for BuildingConfig {
    fn default() -> Self {
        Self {
            max_count: 60,
            probability: 0.35,
            min_height: 1.0,
            max_height: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GroundConfig {
    pub enabled: bool,
    pub thickness: f32,
    /// Extra extent around the static entities' bounding box.
    pub margin: f32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            thickness: 0.1,
            margin: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Palette {
    pub car: Rgba,
    pub road: Rgba,
    pub signal_green: Rgba,
    pub signal_red: Rgba,
    pub destination: Rgba,
    pub obstacle: Rgba,
    pub building: Rgba,
    pub ground: Rgba,
}

impl Palette {
    pub fn category_color(&self, category: Category) -> Rgba {
        match category {
            Category::Car => self.car,
            Category::Road => self.road,
            Category::TrafficLight => self.signal_red,
            Category::Destination => self.destination,
            Category::Obstacle => self.obstacle,
        }
    }

    pub fn signal_color(&self, signal: SignalState) -> Rgba {
        match signal {
            SignalState::Green => self.signal_green,
            SignalState::Red => self.signal_red,
        }
    }

    fn entries(&self) -> [(&'static str, &Rgba); 8] {
        [
            ("car", &self.car),
            ("road", &self.road),
            ("signal_green", &self.signal_green),
            ("signal_red", &self.signal_red),
            ("destination", &self.destination),
            ("obstacle", &self.obstacle),
            ("building", &self.building),
            ("ground", &self.ground),
        ]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            car: [0.118, 0.565, 1.0, 1.0],
            road: [0.8, 0.8, 0.8, 1.0],
            signal_green: [0.0, 0.8, 0.0, 1.0],
            signal_red: [0.9, 0.0, 0.0, 1.0],
            destination: [0.196, 0.804, 0.196, 1.0],
            obstacle: [0.7, 0.7, 0.7, 1.0],
            building: [0.45, 0.45, 0.5, 1.0],
            ground: [0.6, 0.6, 0.6, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub timing_samples: u32,
    /// How often the headless renderer reports, in frames.
    pub log_interval_frames: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            timing_samples: 120,
            log_interval_frames: 300,
        }
    }
}

impl Validate for SceneConfig {
    fn validate(&self) -> Result<()> {
        if !(self.entity_scale > 0.0) {
            return Err(anyhow!("Entity scale must be positive"));
        }

        let buildings = &self.buildings;
        if !(0.0..=1.0).contains(&buildings.probability) {
            return Err(anyhow!("Building probability must be in range [0, 1], got {}", buildings.probability));
        }

        if !(buildings.min_height > 0.0) || buildings.min_height > buildings.max_height {
            return Err(anyhow!(
                "Building heights must satisfy 0 < min_height <= max_height, got {}..{}",
                buildings.min_height,
                buildings.max_height
            ));
        }

        if self.ground.thickness <= 0.0 || self.ground.margin < 0.0 {
            return Err(anyhow!("Ground thickness must be positive and margin non-negative"));
        }

        for (name, color) in self.palette.entries() {
            if color.iter().any(|c| !(0.0..=1.0).contains(c)) {
                return Err(anyhow!("Palette color '{}' has channels outside [0, 1]: {:?}", name, color));
            }
        }

        Ok(())
    }
}

impl Validate for PerformanceConfig {
    fn validate(&self) -> Result<()> {
        if self.timing_samples == 0 {
            return Err(anyhow!("Timing samples must be greater than zero"));
        }

        if self.log_interval_frames == 0 {
            return Err(anyhow!("Log interval must be greater than zero"));
        }

        Ok(())
    }
}
