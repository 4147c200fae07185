use crate::config::{BuildingConfig, GroundConfig};
use crate::simulation::{Category, EntityId, SimulationState, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashSet};

/// Categories whose cells may carry a building.
pub const BUILDING_SOURCES: [Category; 2] = [Category::Obstacle, Category::Destination];

/// Category-scoped identity of a source cell. Ids are only unique within
/// their category, so the category is part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub category: Category,
    pub id: EntityId,
}

impl CellKey {
    pub fn new(category: Category, id: EntityId) -> Self {
        Self { category, id }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub cell: CellKey,
    pub height: f32,
    /// Brightness multiplier applied to the palette's building color.
    pub shade: f32,
}

/// Seeded, cached assignment of buildings to obstacle and destination cells.
///
/// Each cell is decided exactly once, the first time it is seen, and the
/// decision (building or nothing) sticks for as long as the cell exists.
/// Recomposing therefore never moves buildings around.
///
/// Decisions draw from one seeded stream in arrival order (sorted within a
/// composition), so a cell first seen in a later composition gets a
/// different roll than it would have in an earlier one.
#[derive(Debug, Clone)]
pub struct BuildingPlacer {
    config: BuildingConfig,
    seed: u64,
    rng: StdRng,
    decisions: BTreeMap<CellKey, Option<Building>>,
    placed: usize,
}

impl BuildingPlacer {
    pub fn new(config: BuildingConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            rng: StdRng::seed_from_u64(seed),
            decisions: BTreeMap::new(),
            placed: 0,
        }
    }

    pub fn placed(&self) -> usize {
        self.placed
    }

    pub fn get(&self, cell: &CellKey) -> Option<&Building> {
        self.decisions.get(cell).and_then(Option::as_ref)
    }

    /// Buildings in cell order.
    pub fn buildings(&self) -> impl Iterator<Item = &Building> {
        self.decisions.values().filter_map(Option::as_ref)
    }

    /// Drops decisions for vanished cells and decides new ones. Returns
    /// whether the set of buildings changed.
    pub fn update(&mut self, state: &SimulationState) -> bool {
        let mut live: HashSet<CellKey> = HashSet::new();
        let mut fresh: Vec<CellKey> = Vec::new();

        for category in BUILDING_SOURCES {
            for id in state.registry(category).sorted_ids() {
                let key = CellKey::new(category, id.clone());
                if !self.decisions.contains_key(&key) {
                    fresh.push(key.clone());
                }
                live.insert(key);
            }
        }

        let before = self.placed;
        let mut changed = false;
        self.decisions.retain(|key, decision| {
            let keep = live.contains(key);
            if !keep && decision.is_some() {
                changed = true;
            }
            keep
        });
        self.placed = self.decisions.values().filter(|d| d.is_some()).count();

        for key in fresh {
            let decision = self.decide(&key);
            if decision.is_some() {
                self.placed += 1;
                changed = true;
            }
            self.decisions.insert(key, decision);
        }

        if changed {
            log::debug!("Building placement: {} -> {} buildings ({} cells decided)", before, self.placed, self.decisions.len());
        }

        changed
    }

    fn decide(&mut self, cell: &CellKey) -> Option<Building> {
        // One roll per cell regardless of the cap.
        let selected = self.rng.gen_bool(self.config.probability);
        let height = self.rng.gen_range(self.config.min_height..=self.config.max_height);
        let shade = self.rng.gen_range(0.85f32..=1.15);

        if !selected || self.placed >= self.config.max_count {
            return None;
        }

        Some(Building {
            cell: cell.clone(),
            height,
            shade,
        })
    }

    pub fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
        self.decisions.clear();
        self.placed = 0;
    }
}

/// Ground plane under all static geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundSlab {
    pub center: Vec3,
    pub extent: Vec3,
}

impl GroundSlab {
    /// Bounding box of every static entity, padded by the configured margin
    /// and sunk so its top face sits under the entities' base.
    pub fn from_state(state: &SimulationState, config: &GroundConfig, entity_scale: f32) -> Option<Self> {
        let mut min = Vec3::repeat(f32::INFINITY);
        let mut max = Vec3::repeat(f32::NEG_INFINITY);
        let mut any = false;

        for category in Category::ALL.iter().filter(|c| c.is_static()) {
            for entity in state.registry(*category).iter() {
                let p = entity.transform.current_position;
                min = min.inf(&p);
                max = max.sup(&p);
                any = true;
            }
        }

        if !any {
            return None;
        }

        let pad = 2.0 * config.margin + entity_scale;
        let top = min.y - entity_scale / 2.0;
        Some(Self {
            center: Vec3::new((min.x + max.x) / 2.0, top - config.thickness / 2.0, (min.z + max.z) / 2.0),
            extent: Vec3::new(max.x - min.x + pad, config.thickness, max.z - min.z + pad),
        })
    }
}
