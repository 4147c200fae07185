use crate::config::SceneConfig;
use crate::simulation::{Category, EntityId, SimulationState};
use super::{BuildingPlacer, Building, CellKey, GroundSlab};

/// One drawable item of the scene list. Entries are keys, not data: the
/// registries and the composer's placement cache stay the source of truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneEntry {
    Ground,
    Entity { category: Category, id: EntityId },
    Building { cell: CellKey },
}

/// Render order for one composition: ground, roads, signals, destinations,
/// obstacles, buildings, cars. Background geometry always precedes
/// foreground geometry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneList {
    entries: Vec<SceneEntry>,
}

impl SceneList {
    pub fn entries(&self) -> &[SceneEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_category(&self, category: Category) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, SceneEntry::Entity { category: c, .. } if *c == category))
            .count()
    }

    pub fn count_buildings(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, SceneEntry::Building { .. }))
            .count()
    }
}

pub struct SceneComposer {
    config: SceneConfig,
    placer: BuildingPlacer,
    ground: Option<GroundSlab>,
    compositions: u64,
}

impl SceneComposer {
    pub fn new(config: SceneConfig) -> Self {
        let placer = BuildingPlacer::new(config.buildings.clone(), config.seed);
        Self {
            config,
            placer,
            ground: None,
            compositions: 0,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn ground(&self) -> Option<&GroundSlab> {
        self.ground.as_ref()
    }

    pub fn building(&self, cell: &CellKey) -> Option<&Building> {
        self.placer.get(cell)
    }

    pub fn buildings(&self) -> impl Iterator<Item = &Building> {
        self.placer.buildings()
    }

    pub fn compositions(&self) -> u64 {
        self.compositions
    }

    /// Flattens the registries into a render-ordered list, deciding
    /// placements only for cells not seen before.
    pub fn compose(&mut self, state: &SimulationState) -> SceneList {
        self.placer.update(state);
        self.ground = if self.config.ground.enabled {
            GroundSlab::from_state(state, &self.config.ground, self.config.entity_scale)
        } else {
            None
        };

        let mut entries = Vec::with_capacity(state.total_entities() + self.placer.placed() + 1);
        if self.ground.is_some() {
            entries.push(SceneEntry::Ground);
        }

        for category in Category::ALL {
            if category == Category::Car {
                entries.extend(self.placer.buildings().map(|b| SceneEntry::Building { cell: b.cell.clone() }));
            }

            entries.extend(state.registry(category).sorted_ids().into_iter().map(|id| SceneEntry::Entity {
                category,
                id: id.clone(),
            }));
        }

        self.compositions += 1;
        log::debug!(
            "Composed scene #{}: {} entries ({} buildings)",
            self.compositions,
            entries.len(),
            self.placer.placed()
        );

        SceneList { entries }
    }

    /// Forgets every placement decision and reseeds, for a model
    /// re-initialization.
    pub fn reset(&mut self) {
        self.placer.reset();
        self.ground = None;
    }
}
