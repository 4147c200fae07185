use super::{Attributes, Category, EntityId, RenderableEntity, Snapshot, Vec3};
use std::collections::{HashMap, HashSet};

/// Outcome counters of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileReport {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    /// Incomplete records that were still applied, as creates or updates.
    pub partial: usize,
    pub rejected: usize,
}

impl ReconcileReport {
    /// Whether entities were added or removed, i.e. whether a scene list
    /// derived from the registry is stale.
    pub fn membership_changed(&self) -> bool {
        self.created + self.removed > 0
    }

    pub fn merge(&mut self, other: ReconcileReport) {
        self.created += other.created;
        self.updated += other.updated;
        self.removed += other.removed;
        self.partial += other.partial;
        self.rejected += other.rejected;
    }
}

/// Identity-indexed entities of a single category.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    category: Category,
    entities: HashMap<EntityId, RenderableEntity>,
}

impl Registry {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            entities: HashMap::new(),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, id: &EntityId) -> Option<&RenderableEntity> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderableEntity> {
        self.entities.values()
    }

    /// Ids in ascending order. Registry storage is unordered, so anything
    /// that must be reproducible goes through here.
    pub fn sorted_ids(&self) -> Vec<&EntityId> {
        let mut ids: Vec<&EntityId> = self.entities.keys().collect();
        ids.sort_unstable();
        ids
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Brings membership and field values in line with `snapshot`.
    ///
    /// Entities missing from the snapshot are deleted immediately. New ids are
    /// created at their reported position with no interpolation; known ids
    /// age their current position and take the new one. Incomplete records
    /// apply the fields they carry: unknown ids are created at the origin if
    /// no position came through, with the category's fallback attributes.
    /// Runs in O(|snapshot| + |registry|).
    pub fn reconcile(&mut self, snapshot: &Snapshot) -> ReconcileReport {
        let mut report = ReconcileReport {
            rejected: snapshot.rejected,
            ..Default::default()
        };

        if snapshot.category != self.category {
            log::warn!(
                "Refusing {} snapshot for {} registry ({} records)",
                snapshot.category,
                self.category,
                snapshot.records.len() + snapshot.partial.len()
            );
            report.rejected += snapshot.records.len() + snapshot.partial.len();
            return report;
        }

        let mut present: HashSet<&EntityId> =
            HashSet::with_capacity(snapshot.records.len() + snapshot.partial.len());
        for record in &snapshot.records {
            if record.attributes.category() == self.category {
                present.insert(&record.id);
            }
        }
        for partial in &snapshot.partial {
            if self.accepts(partial.attributes.as_ref()) {
                present.insert(&partial.id);
            }
        }

        let before = self.entities.len();
        self.entities.retain(|id, _| present.contains(id));
        report.removed = before - self.entities.len();

        let mut seen: HashSet<&EntityId> = HashSet::with_capacity(snapshot.records.len());
        let mut fresh: HashSet<&EntityId> = HashSet::new();
        for record in &snapshot.records {
            if record.attributes.category() != self.category {
                log::debug!(
                    "Skipping {} record {} in {} snapshot",
                    record.attributes.category(),
                    record.id,
                    self.category
                );
                report.rejected += 1;
                continue;
            }

            let repeated = !seen.insert(&record.id);
            match self.entities.get_mut(&record.id) {
                Some(entity) if repeated && fresh.contains(&record.id) => {
                    *entity = RenderableEntity::new(record.id.clone(), record.position, record.attributes);
                }
                Some(entity) if repeated => {
                    log::debug!("Duplicate {} id {} in snapshot, last record wins", self.category, record.id);
                    entity.overwrite(record.position, record.attributes);
                }
                Some(entity) => {
                    entity.update(record.position, record.attributes);
                    report.updated += 1;
                }
                None => {
                    self.entities.insert(
                        record.id.clone(),
                        RenderableEntity::new(record.id.clone(), record.position, record.attributes),
                    );
                    fresh.insert(&record.id);
                    report.created += 1;
                }
            }
        }

        // Complete records take precedence over incomplete ones for the same id.
        for partial in &snapshot.partial {
            if !self.accepts(partial.attributes.as_ref()) || !seen.insert(&partial.id) {
                log::debug!("Dropping incomplete {} record {}", self.category, partial.id);
                report.rejected += 1;
                continue;
            }

            report.partial += 1;
            match self.entities.get_mut(&partial.id) {
                Some(entity) => {
                    entity.apply_partial(partial.position, partial.attributes);
                    report.updated += 1;
                }
                None => {
                    let position = partial.position.unwrap_or_else(Vec3::zeros);
                    let attributes = partial.attributes.unwrap_or_else(|| Attributes::fallback(self.category));
                    self.entities.insert(
                        partial.id.clone(),
                        RenderableEntity::new(partial.id.clone(), position, attributes),
                    );
                    report.created += 1;
                }
            }
        }

        if report.membership_changed() {
            log::debug!(
                "Reconciled {} registry: +{} -{} ~{} ({} total)",
                self.category,
                report.created,
                report.removed,
                report.updated,
                self.entities.len()
            );
        }

        report
    }

    fn accepts(&self, attributes: Option<&Attributes>) -> bool {
        attributes.map_or(true, |a| a.category() == self.category)
    }
}
