use foundation::Vec2;
use records::Entity;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Below this many candidates every card is shown.
pub const SPARSE_SCENE_LIMIT: usize = 3;

/// Smallest zoom scale used when deriving separation.
pub const MIN_SEPARATION_ZOOM: f64 = 0.5;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DensityTier {
    Low,
    #[default]
    Medium,
    High,
}

impl DensityTier {
    pub fn factor(self) -> f64 {
        match self {
            DensityTier::Low => 1.5,
            DensityTier::Medium => 1.0,
            DensityTier::High => 0.6,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlacementParams {
    pub zoom_scale: f64,
    pub card_width: f64,
    pub density: DensityTier,
    pub max_visible: usize,
}

impl PlacementParams {
    /// Minimum screen distance between two placed cards.
    pub fn separation(&self) -> f64 {
        self.card_width * self.density.factor() / self.zoom_scale.max(MIN_SEPARATION_ZOOM)
    }
}

/// One card competing for screen space this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    pub entity: &'a Entity,
    pub position: Vec2,
    /// Manually placed cards bypass the overlap test.
    pub manual: bool,
    pub visible: bool,
}

impl<'a> Candidate<'a> {
    pub fn new(entity: &'a Entity, position: Vec2, manual: bool) -> Self {
        Self {
            entity,
            position,
            manual,
            visible: false,
        }
    }

    pub fn priority(&self) -> f64 {
        self.entity.priority
    }
}

/// Greedy visibility selection, reusing its buffers across frames.
#[derive(Debug, Default)]
pub struct PlacementResolver {
    order: Vec<usize>,
    accepted: Vec<Vec2>,
}

impl PlacementResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `visible` on every candidate and returns the visible count.
    ///
    /// Manual candidates are always visible and occupy their positions first.
    /// The rest are taken by descending priority, ties in input order, while
    /// the visible total is under `max_visible` and the candidate keeps at
    /// least the separation distance from every card already accepted.
    pub fn resolve(&mut self, candidates: &mut [Candidate<'_>], params: PlacementParams) -> usize {
        if candidates.len() < SPARSE_SCENE_LIMIT {
            for c in candidates.iter_mut() {
                c.visible = true;
            }
            return candidates.len();
        }

        self.order.clear();
        self.accepted.clear();

        for (i, c) in candidates.iter_mut().enumerate() {
            if c.manual {
                c.visible = true;
                self.accepted.push(c.position);
            } else {
                c.visible = false;
                self.order.push(i);
            }
        }

        self.order.sort_by(|&a, &b| {
            candidates[b]
                .priority()
                .total_cmp(&candidates[a].priority())
        });

        let separation = params.separation();
        for &i in &self.order {
            if self.accepted.len() >= params.max_visible {
                break;
            }
            let position = candidates[i].position;
            if self
                .accepted
                .iter()
                .all(|&other| position.distance(other) >= separation)
            {
                candidates[i].visible = true;
                self.accepted.push(position);
            }
        }

        trace!(
            candidates = candidates.len(),
            visible = self.accepted.len(),
            separation,
            "placement resolved"
        );
        self.accepted.len()
    }
}
