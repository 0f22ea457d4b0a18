use foundation::ElementId;

/// Host selection API.
pub trait SelectionSink {
    fn select(&mut self, dimension_index: usize, elements: &[ElementId], toggle: bool);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    Selected {
        dimension_index: usize,
        element: ElementId,
    },
    /// The entity is unknown or its element cannot be selected.
    Unavailable,
}

/// Sink that records every call, for tests and dry runs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordingSelection {
    pub calls: Vec<(usize, Vec<ElementId>, bool)>,
}

impl SelectionSink for RecordingSelection {
    fn select(&mut self, dimension_index: usize, elements: &[ElementId], toggle: bool) {
        self.calls.push((dimension_index, elements.to_vec(), toggle));
    }
}
