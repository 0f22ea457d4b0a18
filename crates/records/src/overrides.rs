use std::collections::BTreeMap;

use foundation::Vec2;

/// User-dragged card positions keyed by entity id.
///
/// Lives independently of the entities it refers to: it survives re-fetch
/// and re-normalization, and is only emptied by an explicit reset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionOverrides {
    positions: BTreeMap<String, Vec2>,
}

impl PositionOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<Vec2> {
        self.positions.get(id).copied()
    }

    pub fn set(&mut self, id: impl Into<String>, position: Vec2) {
        self.positions.insert(id.into(), position);
    }

    pub fn remove(&mut self, id: &str) -> Option<Vec2> {
        self.positions.remove(id)
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Vec2)> + '_ {
        self.positions.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, Vec2)> for PositionOverrides {
    fn from_iter<I: IntoIterator<Item = (String, Vec2)>>(iter: I) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}
