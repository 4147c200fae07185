use crate::config::Rgba;
use crate::graphics::{MaterialFlags, RenderInstance};
use crate::simulation::{compose_world_matrix, Attributes, Category, RenderableEntity, SimulationState, Vec3};
use super::{Building, GroundSlab, SceneComposer, SceneEntry, SceneList};

/// Footprint of a building relative to its grid cell.
const BUILDING_FOOTPRINT: f32 = 0.9;

pub fn category_material(category: Category) -> MaterialFlags {
    match category {
        Category::Car => MaterialFlags::VEHICLE,
        Category::TrafficLight => MaterialFlags::TRAFFIC_LIGHT,
        Category::Destination => MaterialFlags::DESTINATION,
        Category::Road => MaterialFlags::ROAD,
        Category::Obstacle => MaterialFlags::OBSTACLE,
    }
}

fn shaded(color: Rgba, shade: f32) -> Rgba {
    [
        (color[0] * shade).clamp(0.0, 1.0),
        (color[1] * shade).clamp(0.0, 1.0),
        (color[2] * shade).clamp(0.0, 1.0),
        color[3],
    ]
}

impl SceneComposer {
    /// Resolves `scene` into render instances at interpolation `factor`.
    ///
    /// Interpolation happens here rather than during composition, so a scene
    /// list stays valid across frames until membership changes. Entries
    /// that no longer resolve are skipped.
    pub fn resolve_into(
        &self,
        scene: &SceneList,
        state: &SimulationState,
        factor: f32,
        out: &mut Vec<RenderInstance>,
    ) {
        out.clear();
        out.reserve(scene.len());

        for entry in scene.iter() {
            let instance = match entry {
                SceneEntry::Ground => self.ground().map(|g| self.ground_instance(g)),
                SceneEntry::Entity { category, id } => {
                    state.get(*category, id).map(|e| self.entity_instance(e, factor))
                }
                SceneEntry::Building { cell } => self
                    .building(cell)
                    .zip(state.get(cell.category, &cell.id))
                    .map(|(b, source)| self.building_instance(b, source)),
            };

            if let Some(instance) = instance {
                out.push(instance);
            }
        }
    }

    pub fn resolve(&self, scene: &SceneList, state: &SimulationState, factor: f32) -> Vec<RenderInstance> {
        let mut out = Vec::new();
        self.resolve_into(scene, state, factor, &mut out);
        out
    }

    fn entity_instance(&self, entity: &RenderableEntity, factor: f32) -> RenderInstance {
        let palette = &self.config().palette;
        let color = match entity.attributes() {
            Attributes::TrafficLight { signal } => palette.signal_color(*signal),
            other => palette.category_color(other.category()),
        };

        let scale = entity.transform.scale * self.config().entity_scale;
        let world = compose_world_matrix(
            &entity.transform.interpolated_position(factor),
            &entity.transform.rotation,
            &scale,
        );

        RenderInstance::new(&world, color, category_material(entity.category()))
    }

    fn building_instance(&self, building: &Building, source: &RenderableEntity) -> RenderInstance {
        let base = source.transform.current_position;
        let floor = base.y - self.config().entity_scale / 2.0;
        let position = Vec3::new(base.x, floor + building.height / 2.0, base.z);
        let scale = Vec3::new(BUILDING_FOOTPRINT, building.height, BUILDING_FOOTPRINT);
        let world = compose_world_matrix(&position, &Vec3::zeros(), &scale);

        RenderInstance::new(
            &world,
            shaded(self.config().palette.building, building.shade),
            MaterialFlags::BUILDING,
        )
    }

    fn ground_instance(&self, ground: &GroundSlab) -> RenderInstance {
        let world = compose_world_matrix(&ground.center, &Vec3::zeros(), &ground.extent);
        RenderInstance::new(&world, self.config().palette.ground, MaterialFlags::GROUND)
    }
}
