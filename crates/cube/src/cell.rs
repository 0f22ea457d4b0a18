use foundation::ElementId;

/// One value of a cube row.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub text: String,
    /// `NaN` when the value has no numeric representation.
    pub numeric: f64,
    pub element: ElementId,
}

impl Cell {
    pub fn new(text: impl Into<String>, numeric: f64, element: ElementId) -> Self {
        Self {
            text: text.into(),
            numeric,
            element,
        }
    }

    pub fn text(text: impl Into<String>, element: ElementId) -> Self {
        Self::new(text, f64::NAN, element)
    }

    pub fn number(value: f64, element: ElementId) -> Self {
        Self::new(value.to_string(), value, element)
    }

    /// Stand-in for a dimension column the host did not return.
    pub fn dimension_placeholder(field_name: &str) -> Self {
        Self::new(format!("[{field_name}]"), f64::NAN, ElementId::UNSELECTABLE)
    }

    /// Stand-in for a measure column the host did not return.
    pub fn measure_placeholder() -> Self {
        Self::new("0", 0.0, ElementId::UNSELECTABLE)
    }

    pub fn has_numeric(&self) -> bool {
        !self.numeric.is_nan()
    }
}

pub type Row = Vec<Option<Cell>>;

/// Row-major grid of cells.
///
/// Slots are `Option` because a patched matrix may contain holes where the
/// host returned fewer rows than requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matrix {
    rows: Vec<Row>,
}

impl Matrix {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_cells(rows: Vec<Vec<Cell>>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(Some).collect())
                .collect(),
        }
    }

    /// `row_count` rows of `width` empty slots.
    pub fn filled(row_count: usize, width: usize) -> Self {
        Self {
            rows: vec![vec![None; width]; row_count],
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column count as reported by the first row.
    pub fn width(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_rectangular(&self) -> bool {
        let width = self.width();
        self.rows.iter().all(|r| r.len() == width)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row)?.get(col)?.as_ref()
    }

    /// Writes a slot; out-of-range coordinates are ignored.
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        if let Some(slot) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *slot = Some(cell);
        }
    }
}
