//! Offline driver for the globe card widget: feeds a JSON cube through a
//! widget context and reports what would be on screen.

use catalog::PropertyBag;
use cube::{CubeDocument, FieldKind, InMemorySource, QuerySource};
use runtime::Frame;
use serde::Serialize;
use tracing::info;
use widget::{ApplyResult, FetchSummary, PageState, PlacedCard, WidgetConfig, WidgetContext};

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub width: f64,
    pub height: f64,
    /// Frames simulated before the reported one.
    pub frames: u64,
    pub fps: f64,
    pub page: Option<usize>,
    /// Columns served per request; `None` serves every column.
    pub column_limit: Option<usize>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            frames: 0,
            fps: 60.0,
            page: None,
            column_limit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderReport {
    pub page: PageState,
    pub page_label: String,
    pub fetch: FetchSummary,
    pub entity_count: usize,
    pub rotation: [f64; 2],
    pub cards: Vec<PlacedCard>,
    /// Properties as they would be persisted after the run.
    pub properties: PropertyBag,
}

#[derive(Debug)]
pub enum ToolError {
    Cube(String),
    Acquire(cube::AcquireError),
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolError::Cube(msg) => write!(f, "invalid cube document: {msg}"),
            ToolError::Acquire(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ToolError {}

impl From<cube::AcquireError> for ToolError {
    fn from(e: cube::AcquireError) -> Self {
        ToolError::Acquire(e)
    }
}

pub fn parse_cube(raw: &str) -> Result<CubeDocument, ToolError> {
    CubeDocument::from_json(raw).map_err(|e| ToolError::Cube(e.to_string()))
}

/// Runs one widget session over `document` and reports the final frame.
pub fn render(
    document: CubeDocument,
    config: WidgetConfig,
    props: PropertyBag,
    options: &RenderOptions,
) -> Result<RenderReport, ToolError> {
    let mut source = InMemorySource::new(document);
    if let Some(limit) = options.column_limit {
        source = source.with_column_limit(limit);
    }

    let mut ctx = WidgetContext::attach("globecards", config, props)
        .with_viewport(options.width, options.height);

    let mut ticket = ctx.begin_fetch(source.describe_cube());
    if let Some(page) = options.page
        && let Some(paged) = ctx.change_page(page)
    {
        ticket = paged;
    }
    let outcome = pollster::block_on(cube::acquire(&source, &ticket.request))?;
    let fetch = match ctx.complete_fetch(ticket.cycle, outcome) {
        ApplyResult::Applied(summary) => summary,
        ApplyResult::Stale => FetchSummary::default(),
    };

    let mut frame = Frame::at_fps(options.fps);
    let mut cards = ctx.tick(&frame);
    for _ in 0..options.frames {
        frame = frame.next();
        cards = ctx.tick(&frame);
    }
    info!(
        frames = frame.index + 1,
        cards = cards.len(),
        entities = ctx.entities().len(),
        "render finished"
    );

    let page = ctx.page_state();
    let report = RenderReport {
        page_label: page.label(),
        page,
        fetch,
        entity_count: ctx.entities().len(),
        rotation: ctx.view().rotation(),
        cards,
        properties: ctx.properties().clone(),
    };
    ctx.detach();
    Ok(report)
}

/// One row of the `fields` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRow {
    pub kind: &'static str,
    pub index: usize,
    pub name: String,
    pub label: String,
    pub safe_key: String,
    /// Template expressions that reach this field.
    pub paths: Vec<String>,
}

pub fn field_rows(document: &CubeDocument) -> Vec<FieldRow> {
    let descriptor = document.descriptor();
    descriptor
        .dimensions
        .iter()
        .chain(descriptor.measures.iter())
        .map(|f| {
            let (kind, paths) = match f.kind {
                FieldKind::Dimension => (
                    "dimension",
                    vec![
                        format!("fields.{}", f.safe_key),
                        format!("fields.{}_num", f.safe_key),
                        format!("raw.dimensions.{}.text", f.index),
                        format!("raw.dimensions.{}.num", f.index),
                    ],
                ),
                FieldKind::Measure if f.index == 0 => {
                    ("measure", vec!["sizeValue".to_string(), "sizeText".to_string()])
                }
                FieldKind::Measure => ("measure", Vec::new()),
            };
            FieldRow {
                kind,
                index: f.index,
                name: f.name.clone(),
                label: f.label.clone(),
                safe_key: f.safe_key.clone(),
                paths,
            }
        })
        .collect()
}
