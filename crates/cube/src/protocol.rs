//! JSON document format for cubes.
//!
//! A cube document carries field names and rows of cells:
//!
//! ```json
//! {
//!   "dimensions": ["Latitude", "Longitude", "Name", {"name": "Job Title", "label": "Title"}],
//!   "measures": ["Sales"],
//!   "rows": [[{"text": "48.85", "num": 48.85, "elem": 0}, ...]]
//! }
//! ```
//!
//! `InMemorySource` serves windows out of a document and can emulate the
//! host's per-request column ceiling.

use std::sync::atomic::{AtomicUsize, Ordering};

use foundation::ElementId;
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, Matrix};
use crate::field::{CubeDescriptor, FieldDescriptor};
use crate::source::{BoxFuture, QuerySource, SourceError, WindowRequest};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSpec {
    Name(String),
    Labeled {
        name: String,
        #[serde(default)]
        label: Option<String>,
    },
}

impl FieldSpec {
    pub fn name(&self) -> &str {
        match self {
            FieldSpec::Name(n) => n,
            FieldSpec::Labeled { name, .. } => name,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            FieldSpec::Name(n) => n,
            FieldSpec::Labeled { name, label } => label.as_deref().unwrap_or(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireCell {
    pub text: String,
    #[serde(default)]
    pub num: Option<f64>,
    #[serde(default = "unselectable")]
    pub elem: i64,
}

fn unselectable() -> i64 {
    ElementId::UNSELECTABLE.0
}

impl From<&WireCell> for Cell {
    fn from(w: &WireCell) -> Self {
        Cell::new(w.text.clone(), w.num.unwrap_or(f64::NAN), ElementId(w.elem))
    }
}

impl From<&Cell> for WireCell {
    fn from(c: &Cell) -> Self {
        Self {
            text: c.text.clone(),
            num: c.has_numeric().then_some(c.numeric),
            elem: c.element.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CubeDocument {
    #[serde(default)]
    pub dimensions: Vec<FieldSpec>,
    #[serde(default)]
    pub measures: Vec<FieldSpec>,
    #[serde(default)]
    pub rows: Vec<Vec<WireCell>>,
}

impl CubeDocument {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn descriptor(&self) -> CubeDescriptor {
        CubeDescriptor {
            dimensions: self
                .dimensions
                .iter()
                .enumerate()
                .map(|(i, f)| FieldDescriptor::dimension(i, f.name()).with_label(f.label()))
                .collect(),
            measures: self
                .measures
                .iter()
                .enumerate()
                .map(|(i, f)| FieldDescriptor::measure(i, f.name()).with_label(f.label()))
                .collect(),
            row_count: self.rows.len(),
        }
    }

    /// Copies the requested window, clipped to the document bounds.
    pub fn window(&self, req: WindowRequest) -> Matrix {
        let rows = self
            .rows
            .iter()
            .skip(req.top)
            .take(req.height)
            .map(|row| {
                row.iter()
                    .skip(req.left)
                    .take(req.width)
                    .map(|c| Some(Cell::from(c)))
                    .collect()
            })
            .collect();
        Matrix::new(rows)
    }
}

/// Query source backed by an in-memory cube document.
#[derive(Debug, Default)]
pub struct InMemorySource {
    document: CubeDocument,
    column_limit: Option<usize>,
    fetches: AtomicUsize,
}

impl InMemorySource {
    pub fn new(document: CubeDocument) -> Self {
        Self {
            document,
            column_limit: None,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Clips every served window to at most `limit` columns.
    pub fn with_column_limit(mut self, limit: usize) -> Self {
        self.column_limit = Some(limit);
        self
    }

    pub fn document(&self) -> &CubeDocument {
        &self.document
    }

    /// Number of `fetch_window` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl QuerySource for InMemorySource {
    fn describe_cube(&self) -> CubeDescriptor {
        self.document.descriptor()
    }

    fn fetch_window(&self, window: WindowRequest) -> BoxFuture<'_, Result<Matrix, SourceError>> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let width = match self.column_limit {
            Some(limit) => window.width.min(limit),
            None => window.width,
        };
        let matrix = self.document.window(WindowRequest { width, ..window });
        Box::pin(async move { Ok(matrix) })
    }
}
