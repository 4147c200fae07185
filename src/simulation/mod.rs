use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod transform;
pub mod entity;
pub mod snapshot;
pub mod registry;
pub mod clock;
pub mod performance;

pub use transform::*;
pub use entity::*;
pub use snapshot::*;
pub use registry::*;
pub use clock::*;
pub use performance::*;

pub type Vec3 = Vector3<f32>;

/// Opaque identity of one simulated object within its category.
///
/// The remote model hands out integer ids, but nothing here depends on that;
/// integers are normalized to their decimal string form on the way in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawEntityId", into = "String")]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntityId {
    Int(i64),
    Text(String),
}

impl From<RawEntityId> for EntityId {
    fn from(raw: RawEntityId) -> Self {
        match raw {
            RawEntityId::Int(id) => Self(id.to_string()),
            RawEntityId::Text(id) => Self(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Road,
    TrafficLight,
    Destination,
    Obstacle,
    Car,
}

impl Category {
    /// Every category in scene order: background geometry first, cars last.
    pub const ALL: [Category; 5] = [
        Category::Road,
        Category::TrafficLight,
        Category::Destination,
        Category::Obstacle,
        Category::Car,
    ];

    /// Remote endpoint serving this category's snapshot.
    pub fn endpoint(self) -> &'static str {
        match self {
            Category::Road => "getRoads",
            Category::TrafficLight => "getTrafficLights",
            Category::Destination => "getDestinations",
            Category::Obstacle => "getObstacles",
            Category::Car => "getCars",
        }
    }

    /// Static categories never move once the model is initialized.
    pub fn is_static(self) -> bool {
        !matches!(self, Category::Car)
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::Road => "road",
            Category::TrafficLight => "traffic light",
            Category::Destination => "destination",
            Category::Obstacle => "obstacle",
            Category::Car => "car",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// All registries of one visualization session.
///
/// Owned by the frame driver and handed by reference to reconciliation and
/// scene composition. Dropped (or cleared) on model re-initialization.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub roads: Registry,
    pub traffic_lights: Registry,
    pub destinations: Registry,
    pub obstacles: Registry,
    pub cars: Registry,
    pub step: Option<u64>,
}

impl SimulationState {
    pub fn new() -> Self {
        Self {
            roads: Registry::new(Category::Road),
            traffic_lights: Registry::new(Category::TrafficLight),
            destinations: Registry::new(Category::Destination),
            obstacles: Registry::new(Category::Obstacle),
            cars: Registry::new(Category::Car),
            step: None,
        }
    }

    pub fn registry(&self, category: Category) -> &Registry {
        match category {
            Category::Road => &self.roads,
            Category::TrafficLight => &self.traffic_lights,
            Category::Destination => &self.destinations,
            Category::Obstacle => &self.obstacles,
            Category::Car => &self.cars,
        }
    }

    pub fn registry_mut(&mut self, category: Category) -> &mut Registry {
        match category {
            Category::Road => &mut self.roads,
            Category::TrafficLight => &mut self.traffic_lights,
            Category::Destination => &mut self.destinations,
            Category::Obstacle => &mut self.obstacles,
            Category::Car => &mut self.cars,
        }
    }

    /// Routes a snapshot to the registry of its category.
    pub fn reconcile(&mut self, snapshot: &Snapshot) -> ReconcileReport {
        self.registry_mut(snapshot.category).reconcile(snapshot)
    }

    pub fn get(&self, category: Category, id: &EntityId) -> Option<&RenderableEntity> {
        self.registry(category).get(id)
    }

    pub fn total_entities(&self) -> usize {
        Category::ALL.iter().map(|c| self.registry(*c).len()).sum()
    }

    pub fn clear(&mut self) {
        for category in Category::ALL {
            self.registry_mut(category).clear();
        }
        self.step = None;
    }

    pub fn get_category_counts(&self) -> Vec<(Category, usize)> {
        Category::ALL
            .iter()
            .map(|c| (*c, self.registry(*c).len()))
            .collect()
    }
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::new()
    }
}
