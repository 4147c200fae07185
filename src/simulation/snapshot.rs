use super::{Attributes, Category, EntityId, Vec3};

/// One validated entity record from a category snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub id: EntityId,
    pub position: Vec3,
    pub attributes: Attributes,
}

impl EntityRecord {
    pub fn new(id: impl Into<EntityId>, position: Vec3, attributes: Attributes) -> Self {
        Self {
            id: id.into(),
            position,
            attributes,
        }
    }
}

/// A record whose id was readable but whose other fields were not all
/// usable. Whatever did parse is carried along.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialRecord {
    pub id: EntityId,
    pub position: Option<Vec3>,
    pub attributes: Option<Attributes>,
}

impl PartialRecord {
    pub fn new(id: impl Into<EntityId>, position: Option<Vec3>, attributes: Option<Attributes>) -> Self {
        Self {
            id: id.into(),
            position,
            attributes,
        }
    }
}

/// Complete set of entity records for one category at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub category: Category,
    pub records: Vec<EntityRecord>,
    /// Records that were present but incomplete. They count as present and
    /// are applied with the fields they do have.
    pub partial: Vec<PartialRecord>,
    /// Records dropped without a usable id.
    pub rejected: usize,
}

impl Snapshot {
    pub fn new(category: Category, records: Vec<EntityRecord>) -> Self {
        Self {
            category,
            records,
            partial: Vec::new(),
            rejected: 0,
        }
    }

    pub fn empty(category: Category) -> Self {
        Self::new(category, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Result of one fetch cycle: every requested category plus the step counter
/// returned by the advance call, if one was made.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorldSnapshot {
    pub step: Option<u64>,
    pub snapshots: Vec<Snapshot>,
}

impl WorldSnapshot {
    pub fn new(step: Option<u64>, snapshots: Vec<Snapshot>) -> Self {
        Self { step, snapshots }
    }

    pub fn snapshot(&self, category: Category) -> Option<&Snapshot> {
        self.snapshots.iter().find(|s| s.category == category)
    }
}
