use crate::simulation::{
    Attributes, Category, EntityId, EntityRecord, PartialRecord, RoadDirection, SignalState, Snapshot, Vec3,
};
use serde::Deserialize;
use serde_json::Value;
use super::RemoteError;

#[derive(Debug, Deserialize)]
struct PositionsResponse {
    positions: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    id: EntityId,
    x: f32,
    y: f32,
    z: f32,
    #[serde(default)]
    state: Option<bool>,
    #[serde(default)]
    direction: Option<String>,
}

impl RawRecord {
    fn into_record(self, category: Category) -> Result<EntityRecord, String> {
        let attributes = match category {
            Category::Car => Attributes::Car,
            Category::Destination => Attributes::Destination,
            Category::Obstacle => Attributes::Obstacle,
            Category::TrafficLight => {
                let green = self.state.ok_or_else(|| "traffic light without 'state'".to_string())?;
                Attributes::TrafficLight { signal: SignalState::from_green(green) }
            }
            Category::Road => {
                let direction = match self.direction.as_deref() {
                    None => None,
                    Some(name) => Some(
                        RoadDirection::parse(name)
                            .ok_or_else(|| format!("unknown road direction '{}'", name))?,
                    ),
                };
                Attributes::Road { direction }
            }
        };

        Ok(EntityRecord::new(self.id, Vec3::new(self.x, self.y, self.z), attributes))
    }
}

/// Salvages what it can from a record that failed to parse as a whole.
fn partial_record(category: Category, id: EntityId, value: &Value) -> PartialRecord {
    let coordinate = |axis: &str| value.get(axis).and_then(Value::as_f64).map(|v| v as f32);
    let position = match (coordinate("x"), coordinate("y"), coordinate("z")) {
        (Some(x), Some(y), Some(z)) => Some(Vec3::new(x, y, z)),
        _ => None,
    };

    let attributes = match category {
        Category::TrafficLight => value
            .get("state")
            .and_then(Value::as_bool)
            .map(|green| Attributes::TrafficLight { signal: SignalState::from_green(green) }),
        Category::Road => match value.get("direction") {
            None | Some(Value::Null) => Some(Attributes::Road { direction: None }),
            Some(direction) => direction
                .as_str()
                .and_then(RoadDirection::parse)
                .map(|direction| Attributes::Road { direction: Some(direction) }),
        },
        other => Some(Attributes::fallback(other)),
    };

    PartialRecord::new(id, position, attributes)
}

/// Parses a category response body of the form `{"positions": [...]}`.
///
/// A bad envelope fails the whole call. A bad record never affects the
/// others: if its id is still readable, whatever fields did parse go into
/// `partial`, otherwise the record is counted in `rejected`.
pub fn parse_snapshot(category: Category, body: &str) -> Result<Snapshot, RemoteError> {
    let response: PositionsResponse = serde_json::from_str(body).map_err(|e| RemoteError::Malformed {
        endpoint: category.endpoint().to_string(),
        reason: e.to_string(),
    })?;

    let mut snapshot = Snapshot::new(category, Vec::with_capacity(response.positions.len()));

    for value in response.positions {
        let id = value
            .get("id")
            .cloned()
            .and_then(|id| serde_json::from_value::<EntityId>(id).ok());

        let parsed = RawRecord::deserialize(&value)
            .map_err(|e| e.to_string())
            .and_then(|raw| raw.into_record(category));

        match (parsed, id) {
            (Ok(record), _) => snapshot.records.push(record),
            (Err(reason), Some(id)) => {
                log::warn!("Incomplete {} record {}: {}", category, id, reason);
                snapshot.partial.push(partial_record(category, id, &value));
            }
            (Err(reason), None) => {
                log::warn!("Dropping {} record without usable id: {}", category, reason);
                snapshot.rejected += 1;
            }
        }
    }

    Ok(snapshot)
}

/// Step counter from an advance response. A missing counter is not an error.
pub fn parse_step(body: &str) -> Result<Option<u64>, RemoteError> {
    let value: Value = serde_json::from_str(body).map_err(|e| RemoteError::Malformed {
        endpoint: super::ADVANCE_ENDPOINT.to_string(),
        reason: e.to_string(),
    })?;

    Ok(value.get("currentStep").and_then(Value::as_u64))
}

/// Acknowledgement message from the init response, empty when absent.
pub fn parse_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_default()
}
