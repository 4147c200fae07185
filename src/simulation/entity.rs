use super::{Category, EntityId, Transform, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalState {
    Green,
    Red,
}

impl SignalState {
    pub fn from_green(green: bool) -> Self {
        if green { SignalState::Green } else { SignalState::Red }
    }
}

/// Flow direction of a one-way road cell on the model grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoadDirection {
    Up,
    Down,
    Left,
    Right,
}

impl RoadDirection {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "Up" => Some(RoadDirection::Up),
            "Down" => Some(RoadDirection::Down),
            "Left" => Some(RoadDirection::Left),
            "Right" => Some(RoadDirection::Right),
            _ => None,
        }
    }

    /// Yaw about the vertical axis. Grid "up" maps to world +Z.
    pub fn yaw(self) -> f32 {
        match self {
            RoadDirection::Up => 0.0,
            RoadDirection::Right => FRAC_PI_2,
            RoadDirection::Down => PI,
            RoadDirection::Left => -FRAC_PI_2,
        }
    }
}

/// Category-discriminated payload of a renderable entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Attributes {
    Car,
    TrafficLight { signal: SignalState },
    Destination,
    Road { direction: Option<RoadDirection> },
    Obstacle,
}

impl Attributes {
    pub fn category(&self) -> Category {
        match self {
            Attributes::Car => Category::Car,
            Attributes::TrafficLight { .. } => Category::TrafficLight,
            Attributes::Destination => Category::Destination,
            Attributes::Road { .. } => Category::Road,
            Attributes::Obstacle => Category::Obstacle,
        }
    }

    /// Payload assumed for a category when a record carried none: lights
    /// start red, roads without a direction.
    pub fn fallback(category: Category) -> Self {
        match category {
            Category::Car => Attributes::Car,
            Category::TrafficLight => Attributes::TrafficLight { signal: SignalState::Red },
            Category::Destination => Attributes::Destination,
            Category::Road => Attributes::Road { direction: None },
            Category::Obstacle => Attributes::Obstacle,
        }
    }

    pub fn signal(&self) -> Option<SignalState> {
        match self {
            Attributes::TrafficLight { signal } => Some(*signal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderableEntity {
    pub id: EntityId,
    pub transform: Transform,
    attributes: Attributes,
}

impl RenderableEntity {
    pub fn new(id: EntityId, position: Vec3, attributes: Attributes) -> Self {
        let mut entity = Self {
            id,
            transform: Transform::at(position),
            attributes,
        };
        entity.orient_from_attributes();
        entity
    }

    pub fn category(&self) -> Category {
        self.attributes.category()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Accepts a newer sighting. Attributes are replaced wholesale; the
    /// caller guarantees they belong to the same category.
    pub(crate) fn update(&mut self, position: Vec3, attributes: Attributes) {
        debug_assert_eq!(attributes.category(), self.category());
        self.transform.accept(position);
        self.attributes = attributes;
        self.orient_from_attributes();

        if self.category() == Category::Car {
            self.face_travel_direction();
        }
    }

    /// Applies an incomplete sighting. A missing position keeps the entity
    /// where it is, with no motion left to interpolate; missing attributes
    /// keep the current ones.
    pub(crate) fn apply_partial(&mut self, position: Option<Vec3>, attributes: Option<Attributes>) {
        let position = position.unwrap_or(self.transform.current_position);
        let attributes = attributes.unwrap_or(self.attributes);
        self.update(position, attributes);
    }

    /// Overwrites the current position without aging it. Used when the same
    /// id shows up twice in one snapshot.
    pub(crate) fn overwrite(&mut self, position: Vec3, attributes: Attributes) {
        debug_assert_eq!(attributes.category(), self.category());
        self.transform.current_position = position;
        self.attributes = attributes;
        self.orient_from_attributes();

        if self.category() == Category::Car {
            self.face_travel_direction();
        }
    }

    fn orient_from_attributes(&mut self) {
        if let Attributes::Road { direction } = self.attributes {
            self.transform.rotation.y = direction.map(RoadDirection::yaw).unwrap_or(0.0);
        }
    }

    fn face_travel_direction(&mut self) {
        let delta = self.transform.displacement();
        if delta.x.abs() > f32::EPSILON || delta.z.abs() > f32::EPSILON {
            self.transform.rotation.y = delta.x.atan2(delta.z);
        }
    }
}
