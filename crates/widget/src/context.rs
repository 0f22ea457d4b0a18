use std::collections::BTreeSet;

use catalog::{CardPosition, PropertyBag, PropertyError, PropertyStore};
use cube::{
    AcquireError, AcquireOutcome, AcquireRequest, CubeDescriptor, FallbackReason, FetchTracker,
    QuerySource, RowWindow, WindowCache, acquire,
};
use foundation::{CycleId, Vec2};
use layers::{
    Candidate, CardBody, CardRenderer, OrthographicProjector, PlacementResolver, Projector,
};
use records::{Entity, PositionOverrides, assign_priorities, normalize};
use runtime::{DEFAULT_ROTATION, Frame, GlobeView};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::WidgetConfig;
use crate::paging::PageState;
use crate::selection::{SelectionOutcome, SelectionSink};

const DEFAULT_VIEWPORT: Vec2 = Vec2 {
    x: 800.0,
    y: 600.0,
};

/// Globe radius as a fraction of the smaller viewport side.
const RADIUS_DIVISOR: f64 = 2.5;

/// A fetch cycle handed out by [`WidgetContext::begin_fetch`].
///
/// The request owns everything acquisition needs, so the context is free
/// while the fetch is in flight.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    pub cycle: CycleId,
    pub request: AcquireRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchSummary {
    pub kept: usize,
    pub dropped: usize,
    /// Columns the source actually returned when it clipped the window.
    pub patched_from: Option<usize>,
    pub from_cache: bool,
    #[serde(skip)]
    pub fallback: Option<FallbackReason>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyResult {
    Applied(FetchSummary),
    /// A newer cycle started while this one was in flight; nothing changed.
    Stale,
}

/// One card shown this frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedCard {
    pub id: String,
    pub name: String,
    pub element: i64,
    pub x: f64,
    pub y: f64,
    pub manual: bool,
    pub html: String,
    pub body: CardBodyKind,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardBodyKind {
    Template,
    Default,
    Fallback,
}

impl CardBodyKind {
    fn of(body: &CardBody) -> Self {
        match body {
            CardBody::Template(_) => CardBodyKind::Template,
            CardBody::Default(_) => CardBodyKind::Default,
            CardBody::Fallback(_) => CardBodyKind::Fallback,
        }
    }
}

/// All state of one widget instance, from attach to detach.
#[derive(Debug)]
pub struct WidgetContext {
    id: String,
    config: WidgetConfig,
    props: PropertyBag,
    props_dirty: bool,
    overrides: PositionOverrides,
    /// Ids dragged during this session.
    dragged: BTreeSet<String>,
    descriptor: Option<CubeDescriptor>,
    cache: WindowCache,
    tracker: FetchTracker,
    pending: Option<(CycleId, RowWindow)>,
    entities: Vec<Entity>,
    resolver: PlacementResolver,
    renderer: CardRenderer,
    viewport: Vec2,
    view: GlobeView,
}

impl WidgetContext {
    pub fn attach(id: impl Into<String>, config: WidgetConfig, mut props: PropertyBag) -> Self {
        let id = id.into();
        props.page_size = config.effective_page_size();
        let overrides = props
            .card_positions
            .iter()
            .map(|(k, p)| (k.clone(), Vec2::new(p.x, p.y)))
            .collect();
        let renderer = build_renderer(&config, &props);
        let view = GlobeView::new(
            radius_for(DEFAULT_VIEWPORT),
            config.zoom_bounds(),
            DEFAULT_ROTATION,
        );
        info!(
            widget = %id,
            stored_positions = props.card_positions.len(),
            page = props.current_page,
            "widget attached"
        );
        Self {
            id,
            config,
            props,
            props_dirty: false,
            overrides,
            dragged: BTreeSet::new(),
            descriptor: None,
            cache: WindowCache::default(),
            tracker: FetchTracker::new(),
            pending: None,
            entities: Vec::new(),
            resolver: PlacementResolver::new(),
            renderer,
            viewport: DEFAULT_VIEWPORT,
            view,
        }
    }

    /// Ends the widget's life and hands back the properties to persist.
    pub fn detach(self) -> PropertyBag {
        info!(widget = %self.id, "widget detached");
        self.props
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn properties(&self) -> &PropertyBag {
        &self.props
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn view(&self) -> &GlobeView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut GlobeView {
        &mut self.view
    }

    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.resize(width, height);
        self
    }

    /// Resizes the drawing area, keeping rotation and zoom.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport = Vec2::new(width, height);
        let zoom = self.view.zoom_scale();
        let rotation = self.view.rotation();
        self.view = GlobeView::new(
            radius_for(self.viewport),
            self.config.zoom_bounds(),
            DEFAULT_ROTATION,
        );
        self.view.rotate_to(rotation);
        self.view.set_zoom(zoom);
    }

    pub fn projector(&self) -> OrthographicProjector {
        OrthographicProjector::new(
            self.view.scale(),
            Vec2::new(self.viewport.x / 2.0, self.viewport.y / 2.0),
            self.view.rotation(),
        )
    }

    pub fn page_state(&self) -> PageState {
        PageState {
            current_page: self.props.current_page,
            page_size: self.config.effective_page_size(),
            row_count: self.descriptor.as_ref().map(|d| d.row_count).unwrap_or(0),
            dimension_count: self.descriptor.as_ref().map(|d| d.dimensions.len()).unwrap_or(0),
            enabled: self.config.enable_pagination,
        }
    }

    /// Starts a fetch cycle for the current page of `descriptor`.
    pub fn begin_fetch(&mut self, descriptor: CubeDescriptor) -> FetchTicket {
        self.descriptor = Some(descriptor.clone());
        let last_page = self.page_state().total_pages() - 1;
        if self.props.current_page > last_page {
            self.props.current_page = last_page;
            self.props_dirty = true;
        }
        let window = self.page_state().window();
        let cached = self.cache.get(&window);
        let cycle = self.tracker.begin();
        self.pending = Some((cycle, window));
        debug!(
            widget = %self.id,
            cycle = cycle.0,
            top = window.top,
            rows = window.height,
            cached = cached.is_some(),
            "fetch cycle started"
        );
        FetchTicket {
            cycle,
            request: AcquireRequest::new(descriptor, window).with_cached(cached),
        }
    }

    /// Applies an acquisition result if its cycle is still current.
    pub fn complete_fetch(&mut self, cycle: CycleId, outcome: AcquireOutcome) -> ApplyResult {
        if !self.tracker.finish(cycle) {
            debug!(widget = %self.id, cycle = cycle.0, "discarding stale fetch result");
            return ApplyResult::Stale;
        }
        let window = match self.pending.take() {
            Some((pending, window)) if pending == cycle => Some(window),
            _ => None,
        };

        let mut summary = FetchSummary::default();
        match &outcome {
            AcquireOutcome::Cached(_) => summary.from_cache = true,
            AcquireOutcome::Patched { returned_cols, .. } => {
                summary.patched_from = Some(*returned_cols)
            }
            AcquireOutcome::Fallback { reason, .. } => summary.fallback = Some(*reason),
            AcquireOutcome::Complete(_) => {}
        }
        if outcome.is_fresh()
            && let Some(window) = window
        {
            self.cache.insert(window, outcome.matrix().clone());
        }

        let Some(descriptor) = self.descriptor.as_ref() else {
            return ApplyResult::Applied(summary);
        };
        let report = normalize(
            outcome.matrix(),
            &descriptor.dimensions,
            self.config.column_mapping(),
            &self.overrides,
        );
        let mut entities = report.entities;
        assign_priorities(&mut entities);
        for entity in &mut entities {
            entity.manually_positioned = self.is_manual(entity);
        }

        summary.kept = entities.len();
        summary.dropped = report.dropped.len();
        self.entities = entities;
        info!(
            widget = %self.id,
            kept = summary.kept,
            dropped = summary.dropped,
            "fetch applied"
        );
        ApplyResult::Applied(summary)
    }

    /// Runs one whole fetch cycle against `source`.
    pub async fn fetch(&mut self, source: &dyn QuerySource) -> Result<ApplyResult, AcquireError> {
        let ticket = self.begin_fetch(source.describe_cube());
        let outcome = acquire(source, &ticket.request).await?;
        Ok(self.complete_fetch(ticket.cycle, outcome))
    }

    /// Drops cached data and starts a new cycle. `None` before the first fetch.
    pub fn refresh(&mut self) -> Option<FetchTicket> {
        self.cache.clear();
        let descriptor = self.descriptor.clone()?;
        Some(self.begin_fetch(descriptor))
    }

    /// Moves to `page` (clamped) and starts a new cycle for it.
    pub fn change_page(&mut self, page: usize) -> Option<FetchTicket> {
        let last = self.page_state().total_pages().saturating_sub(1);
        let page = page.min(last);
        if page != self.props.current_page {
            self.props.current_page = page;
            self.props_dirty = true;
        }
        self.refresh()
    }

    /// Advances the view by one frame and lays out the cards.
    pub fn tick(&mut self, frame: &Frame) -> Vec<PlacedCard> {
        self.view.advance(frame, self.config.rotation_speed);
        let projector = self.projector();
        let zoom = self.view.zoom_scale();
        self.place(&projector, zoom)
    }

    /// Lays out the cards for an externally driven projection.
    ///
    /// Entities that do not project (far side of the globe) are not
    /// candidates. Manual cards compete at their stored position.
    pub fn place(&mut self, projector: &dyn Projector, zoom_scale: f64) -> Vec<PlacedCard> {
        let params = self.config.placement_params(zoom_scale);
        let mut candidates: Vec<Candidate<'_>> = Vec::with_capacity(self.entities.len());
        for entity in &self.entities {
            let Some(projected) = projector.project(entity.location()) else {
                continue;
            };
            if !projected.is_finite() {
                continue;
            }
            let manual = self.is_manual(entity);
            let position = if manual {
                self.manual_position(entity).unwrap_or(projected)
            } else {
                projected
            };
            candidates.push(Candidate::new(entity, position, manual));
        }

        self.resolver.resolve(&mut candidates, params);

        candidates
            .iter()
            .filter(|c| c.visible)
            .map(|c| {
                let body = self.renderer.render(c.entity);
                PlacedCard {
                    id: c.entity.id.clone(),
                    name: c.entity.name.clone(),
                    element: c.entity.element.0,
                    x: c.position.x,
                    y: c.position.y,
                    manual: c.manual,
                    body: CardBodyKind::of(&body),
                    html: body.into_html(),
                }
            })
            .collect()
    }

    /// Pins a card at `position`. Returns `false` when dragging is disabled
    /// or the entity is unknown.
    pub fn drag_card(&mut self, entity_id: &str, position: Vec2) -> bool {
        if !self.config.cards_draggable {
            return false;
        }
        let Some(entity) = self.entities.iter_mut().find(|e| e.id == entity_id) else {
            warn!(widget = %self.id, entity = entity_id, "drag on unknown card ignored");
            return false;
        };
        entity.manually_positioned = true;
        entity.stored_position = Some(position);
        self.overrides.set(entity_id, position);
        self.dragged.insert(entity_id.to_string());

        if self.config.remember_card_positions {
            self.props.card_positions.insert(
                entity_id.to_string(),
                CardPosition {
                    x: position.x,
                    y: position.y,
                },
            );
            self.props_dirty = true;
        }
        debug!(
            widget = %self.id,
            entity = entity_id,
            x = position.x,
            y = position.y,
            "card dragged"
        );
        true
    }

    /// Forgets every stored and dragged position.
    pub fn reset_positions(&mut self) {
        let cleared = self.overrides.len();
        self.overrides.clear();
        self.dragged.clear();
        if !self.props.card_positions.is_empty() {
            self.props.card_positions.clear();
            self.props_dirty = true;
        }
        for entity in &mut self.entities {
            entity.manually_positioned = false;
            entity.stored_position = None;
        }
        info!(widget = %self.id, cleared, "card positions reset");
    }

    /// Selects the entity's name element in the host.
    pub fn select(&self, entity_id: &str, sink: &mut dyn SelectionSink) -> SelectionOutcome {
        let Some(entity) = self.entities.iter().find(|e| e.id == entity_id) else {
            warn!(widget = %self.id, entity = entity_id, "selection on unknown entity ignored");
            return SelectionOutcome::Unavailable;
        };
        if !entity.element.is_selectable() {
            warn!(widget = %self.id, entity = entity_id, "entity has no selectable element");
            return SelectionOutcome::Unavailable;
        }
        let dimension_index = self.config.dim_name_index;
        sink.select(dimension_index, &[entity.element], true);
        SelectionOutcome::Selected {
            dimension_index,
            element: entity.element,
        }
    }

    /// Replaces the custom card template and persists it.
    pub fn set_custom_template(&mut self, template: Option<String>) {
        self.props.custom_template = template;
        self.props_dirty = true;
        self.renderer = build_renderer(&self.config, &self.props);
    }

    pub fn has_unsaved_properties(&self) -> bool {
        self.props_dirty
    }

    /// Writes the properties if they changed. Returns whether a save happened.
    pub fn save_properties(
        &mut self,
        store: &mut dyn PropertyStore,
    ) -> Result<bool, PropertyError> {
        if !self.props_dirty {
            return Ok(false);
        }
        store.save(&self.props)?;
        self.props_dirty = false;
        Ok(true)
    }

    fn is_manual(&self, entity: &Entity) -> bool {
        self.dragged.contains(&entity.id)
            || (self.config.remember_card_positions && entity.stored_position.is_some())
    }

    fn manual_position(&self, entity: &Entity) -> Option<Vec2> {
        self.overrides.get(&entity.id).or(entity.stored_position)
    }
}

fn build_renderer(config: &WidgetConfig, props: &PropertyBag) -> CardRenderer {
    let custom = if config.use_custom_template {
        props.custom_template.as_deref()
    } else {
        None
    };
    CardRenderer::new(config.card_options(), custom)
}

fn radius_for(viewport: Vec2) -> f64 {
    viewport.x.min(viewport.y) / RADIUS_DIVISOR
}
