use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::cell::{Cell, Matrix};
use crate::field::{CubeDescriptor, FieldKind};
use crate::request::RowWindow;
use crate::source::{QuerySource, WindowRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireError {
    /// The cube descriptor breaks its own contract; a programming error.
    MalformedDescriptor(String),
}

impl std::fmt::Display for AcquireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AcquireError::MalformedDescriptor(msg) => write!(f, "malformed cube descriptor: {msg}"),
        }
    }
}

impl std::error::Error for AcquireError {}

/// Everything one acquisition needs; owns no reference to the widget.
#[derive(Debug, Clone)]
pub struct AcquireRequest {
    pub descriptor: CubeDescriptor,
    pub window: RowWindow,
    /// Window already held by the caller for the same rows, if any.
    pub cached: Option<Arc<Matrix>>,
}

impl AcquireRequest {
    pub fn new(descriptor: CubeDescriptor, window: RowWindow) -> Self {
        Self {
            descriptor,
            window,
            cached: None,
        }
    }

    pub fn with_cached(mut self, cached: Option<Arc<Matrix>>) -> Self {
        self.cached = cached;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The source reported an error.
    Failed,
    /// The source answered with no rows.
    Empty,
}

/// Result of one acquisition. Every variant carries a usable matrix.
#[derive(Debug, Clone)]
pub enum AcquireOutcome {
    /// The cached window was already full width; nothing was fetched.
    Cached(Arc<Matrix>),
    /// The source returned every column.
    Complete(Arc<Matrix>),
    /// The source clipped the columns; the rest were synthesized.
    Patched {
        matrix: Arc<Matrix>,
        returned_cols: usize,
    },
    /// The fetch failed or came back empty; this is the cached window or an
    /// empty matrix, and may be narrower than a full row.
    Fallback {
        matrix: Arc<Matrix>,
        reason: FallbackReason,
    },
}

impl AcquireOutcome {
    pub fn matrix(&self) -> &Arc<Matrix> {
        match self {
            AcquireOutcome::Cached(m) | AcquireOutcome::Complete(m) => m,
            AcquireOutcome::Patched { matrix, .. } | AcquireOutcome::Fallback { matrix, .. } => {
                matrix
            }
        }
    }

    pub fn into_matrix(self) -> Arc<Matrix> {
        match self {
            AcquireOutcome::Cached(m) | AcquireOutcome::Complete(m) => m,
            AcquireOutcome::Patched { matrix, .. } | AcquireOutcome::Fallback { matrix, .. } => {
                matrix
            }
        }
    }

    /// True when the outcome should replace the cached window.
    pub fn is_fresh(&self) -> bool {
        matches!(
            self,
            AcquireOutcome::Complete(_) | AcquireOutcome::Patched { .. }
        )
    }
}

/// Produces a full-width matrix for `request.window`.
///
/// A cached window that is already full width is returned as-is. Otherwise a
/// single request spans every row of the window and every column. Columns the
/// source withholds are filled with placeholders, and a failed or empty fetch
/// falls back to the cached window. Only a malformed descriptor is an error.
pub async fn acquire(
    source: &dyn QuerySource,
    request: &AcquireRequest,
) -> Result<AcquireOutcome, AcquireError> {
    request
        .descriptor
        .validate()
        .map_err(AcquireError::MalformedDescriptor)?;

    let total_cols = request.descriptor.shape().total_cols();
    if let Some(cached) = &request.cached
        && cached.width() >= total_cols
    {
        debug!(cols = total_cols, "cached window already complete");
        return Ok(AcquireOutcome::Cached(cached.clone()));
    }

    let fallback = |reason: FallbackReason| AcquireOutcome::Fallback {
        matrix: request
            .cached
            .clone()
            .unwrap_or_else(|| Arc::new(Matrix::empty())),
        reason,
    };

    info!(
        rows = request.window.height,
        cols = total_cols,
        top = request.window.top,
        "fetching cube window"
    );
    let fetched = source
        .fetch_window(WindowRequest {
            top: request.window.top,
            left: 0,
            width: total_cols,
            height: request.window.height,
        })
        .await;

    let fetched = match fetched {
        Ok(m) => m,
        Err(err) => {
            error!(error = %err, "cube fetch failed; using cached window");
            return Ok(fallback(FallbackReason::Failed));
        }
    };
    if fetched.is_empty() {
        warn!("cube fetch returned no rows; using cached window");
        return Ok(fallback(FallbackReason::Empty));
    }

    let returned_cols = fetched.width();
    if returned_cols == total_cols && fetched.is_rectangular() {
        return Ok(AcquireOutcome::Complete(Arc::new(fetched)));
    }

    warn!(
        returned = returned_cols,
        required = total_cols,
        "source returned a clipped or ragged window; patching"
    );
    let matrix = patch_matrix(&fetched, &request.descriptor, request.window.height);
    Ok(AcquireOutcome::Patched {
        matrix: Arc::new(matrix),
        returned_cols,
    })
}

/// Widens `fetched` to `row_count` rows of the descriptor's full width.
///
/// Cells inside the returned width are copied; every column at or beyond it
/// gets a placeholder in every row. Returned rows past `row_count` and
/// columns past the full width are discarded.
pub fn patch_matrix(fetched: &Matrix, descriptor: &CubeDescriptor, row_count: usize) -> Matrix {
    let total_cols = descriptor.shape().total_cols();
    let returned_cols = fetched.width().min(total_cols);
    let mut out = Matrix::filled(row_count, total_cols);

    for (r, row) in fetched.rows().iter().take(row_count).enumerate() {
        for (c, cell) in row.iter().take(returned_cols).enumerate() {
            if let Some(cell) = cell {
                out.set(r, c, cell.clone());
            }
        }
    }

    for col in returned_cols..total_cols {
        let placeholder = match descriptor.column(col) {
            Some(f) if f.kind == FieldKind::Dimension => Cell::dimension_placeholder(&f.name),
            Some(_) => Cell::measure_placeholder(),
            None => Cell::dimension_placeholder("Unknown"),
        };
        debug!(col, text = %placeholder.text, "synthesized placeholder column");
        for r in 0..row_count {
            out.set(r, col, placeholder.clone());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use foundation::ElementId;
    use pretty_assertions::assert_eq;

    use super::{AcquireOutcome, AcquireRequest, FallbackReason, acquire, patch_matrix};
    use crate::cell::{Cell, Matrix};
    use crate::field::CubeDescriptor;
    use crate::protocol::{CubeDocument, InMemorySource, WireCell};
    use crate::request::RowWindow;
    use crate::source::{BoxFuture, QuerySource, SourceError, WindowRequest};

    fn document(rows: usize) -> CubeDocument {
        let wire = |text: String, num: Option<f64>, elem: i64| WireCell { text, num, elem };
        CubeDocument {
            dimensions: ["Lat", "Lng", "Name", "Title", "Region", "Team"]
                .into_iter()
                .map(|n| crate::protocol::FieldSpec::Name(n.to_string()))
                .collect(),
            measures: vec![crate::protocol::FieldSpec::Name("Sales".to_string())],
            rows: (0..rows)
                .map(|i| {
                    vec![
                        wire(format!("{i}"), Some(i as f64), i as i64),
                        wire(format!("{i}"), Some(i as f64), i as i64),
                        wire(format!("city{i}"), None, i as i64),
                        wire("title".to_string(), None, 0),
                        wire("region".to_string(), None, 0),
                        wire("team".to_string(), None, 0),
                        wire(format!("{}", i * 10), Some((i * 10) as f64), 0),
                    ]
                })
                .collect(),
        }
    }

    struct FailingSource(CubeDescriptor);

    impl QuerySource for FailingSource {
        fn describe_cube(&self) -> CubeDescriptor {
            self.0.clone()
        }

        fn fetch_window(&self, _w: WindowRequest) -> BoxFuture<'_, Result<Matrix, SourceError>> {
            Box::pin(async { Err(SourceError::new("connection reset")) })
        }
    }

    #[test]
    fn complete_fetch_is_returned_verbatim() {
        let src = InMemorySource::new(document(3));
        let req = AcquireRequest::new(src.describe_cube(), RowWindow::all(3));
        let out = pollster::block_on(acquire(&src, &req)).expect("acquire");
        assert!(matches!(out, AcquireOutcome::Complete(_)));
        assert_eq!(out.matrix().width(), 7);
        assert_eq!(out.matrix().row_count(), 3);
    }

    #[test]
    fn clipped_fetch_is_patched_to_full_width() {
        let src = InMemorySource::new(document(4)).with_column_limit(5);
        let req = AcquireRequest::new(src.describe_cube(), RowWindow::all(4));
        let out = pollster::block_on(acquire(&src, &req)).expect("acquire");

        let AcquireOutcome::Patched { matrix, returned_cols } = &out else {
            panic!("expected patched outcome, got {out:?}");
        };
        assert_eq!(*returned_cols, 5);
        assert_eq!(matrix.row_count(), 4);
        assert!(matrix.is_rectangular());
        assert_eq!(matrix.width(), 7);

        for r in 0..4 {
            let team = matrix.get(r, 5).expect("team placeholder");
            assert_eq!(team.text, "[Team]");
            assert!(team.numeric.is_nan());
            assert_eq!(team.element, ElementId::UNSELECTABLE);

            let sales = matrix.get(r, 6).expect("sales placeholder");
            assert_eq!(sales.text, "0");
            assert_eq!(sales.numeric, 0.0);
            assert_eq!(sales.element, ElementId::UNSELECTABLE);
        }
        assert_eq!(matrix.get(2, 2).map(|c| c.text.as_str()), Some("city2"));
    }

    #[test]
    fn complete_cache_skips_the_fetch() {
        let src = InMemorySource::new(document(2));
        let req = AcquireRequest::new(src.describe_cube(), RowWindow::all(2));
        let first = pollster::block_on(acquire(&src, &req)).expect("acquire");
        assert_eq!(src.fetch_count(), 1);

        let again = req.clone().with_cached(Some(first.matrix().clone()));
        let second = pollster::block_on(acquire(&src, &again)).expect("acquire");
        let third = pollster::block_on(acquire(&src, &again)).expect("acquire");
        assert_eq!(src.fetch_count(), 1);
        assert!(matches!(second, AcquireOutcome::Cached(_)));
        assert!(Arc::ptr_eq(second.matrix(), first.matrix()));
        assert!(Arc::ptr_eq(third.matrix(), first.matrix()));
    }

    #[test]
    fn narrow_cache_triggers_a_fetch() {
        let src = InMemorySource::new(document(2));
        let narrow = Arc::new(Matrix::filled(2, 3));
        let req =
            AcquireRequest::new(src.describe_cube(), RowWindow::all(2)).with_cached(Some(narrow));
        let out = pollster::block_on(acquire(&src, &req)).expect("acquire");
        assert_eq!(src.fetch_count(), 1);
        assert!(out.is_fresh());
    }

    #[test]
    fn failure_falls_back_to_cache_or_empty() {
        let desc = CubeDescriptor::from_names(["Lat", "Lng", "Name"], ["Sales"], 2);
        let src = FailingSource(desc.clone());

        let req = AcquireRequest::new(desc.clone(), RowWindow::all(2));
        let out = pollster::block_on(acquire(&src, &req)).expect("degrades, never rejects");
        assert!(matches!(
            out,
            AcquireOutcome::Fallback { reason: FallbackReason::Failed, .. }
        ));
        assert!(out.matrix().is_empty());

        let cached = Arc::new(Matrix::filled(2, 3));
        let req = req.with_cached(Some(cached.clone()));
        let out = pollster::block_on(acquire(&src, &req)).expect("degrades");
        assert!(Arc::ptr_eq(out.matrix(), &cached));
    }

    #[test]
    fn empty_fetch_falls_back() {
        let src = InMemorySource::new(document(0));
        let mut desc = src.describe_cube();
        desc.row_count = 5;
        let req = AcquireRequest::new(desc, RowWindow::all(5));
        let out = pollster::block_on(acquire(&src, &req)).expect("acquire");
        assert!(matches!(
            out,
            AcquireOutcome::Fallback { reason: FallbackReason::Empty, .. }
        ));
    }

    struct RaggedSource(CubeDescriptor);

    impl QuerySource for RaggedSource {
        fn describe_cube(&self) -> CubeDescriptor {
            self.0.clone()
        }

        fn fetch_window(&self, _w: WindowRequest) -> BoxFuture<'_, Result<Matrix, SourceError>> {
            let full = vec![
                Cell::number(1.0, ElementId(0)),
                Cell::number(2.0, ElementId(0)),
                Cell::text("a", ElementId(0)),
                Cell::number(5.0, ElementId(0)),
            ];
            let short = vec![Cell::number(3.0, ElementId(1)), Cell::number(4.0, ElementId(1))];
            let matrix = Matrix::from_cells(vec![full, short]);
            Box::pin(async move { Ok(matrix) })
        }
    }

    #[test]
    fn ragged_fetch_is_patched_to_a_rectangle() {
        let desc = CubeDescriptor::from_names(["Lat", "Lng", "Name"], ["Sales"], 2);
        let src = RaggedSource(desc.clone());
        let req = AcquireRequest::new(desc, RowWindow::all(2));
        let out = pollster::block_on(acquire(&src, &req)).expect("acquire");

        assert!(matches!(out, AcquireOutcome::Patched { returned_cols: 4, .. }));
        let matrix = out.matrix();
        assert!(matrix.is_rectangular());
        assert_eq!(matrix.width(), 4);
        assert_eq!(matrix.row_count(), 2);
        assert_eq!(matrix.get(1, 0).map(|c| c.numeric), Some(3.0));
        assert!(matrix.get(1, 2).is_none());
        assert!(matrix.get(1, 3).is_none());
    }

    #[test]
    fn malformed_descriptor_is_rejected() {
        let desc = CubeDescriptor::from_names(Vec::<String>::new(), ["Sales"], 1);
        let src = FailingSource(desc.clone());
        let req = AcquireRequest::new(desc, RowWindow::all(1));
        assert!(pollster::block_on(acquire(&src, &req)).is_err());
    }

    #[test]
    fn patch_fills_missing_rows_with_holes_and_placeholders() {
        let desc = CubeDescriptor::from_names(["Lat", "Lng", "Name"], ["Sales"], 3);
        let fetched = Matrix::from_cells(vec![vec![
            Cell::number(1.0, ElementId(0)),
            Cell::number(2.0, ElementId(0)),
        ]]);
        let out = patch_matrix(&fetched, &desc, 3);
        assert_eq!(out.row_count(), 3);
        assert!(out.is_rectangular());
        assert!(out.get(1, 0).is_none());
        assert_eq!(out.get(1, 2).map(|c| c.text.clone()), Some("[Name]".to_string()));
        assert_eq!(out.get(2, 3).map(|c| c.element), Some(ElementId::UNSELECTABLE));
    }

    #[test]
    fn patch_truncates_wider_rows() {
        let desc = CubeDescriptor::from_names(["Lat"], Vec::<String>::new(), 1);
        let fetched = Matrix::from_cells(vec![vec![
            Cell::number(1.0, ElementId(0)),
            Cell::number(2.0, ElementId(0)),
        ]]);
        let out = patch_matrix(&fetched, &desc, 1);
        assert_eq!(out.width(), 1);
    }
}
