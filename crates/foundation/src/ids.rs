/// Selection handle of a single cube cell.
///
/// The host query API addresses selectable values by element number. Cells
/// that were synthesized locally carry [`ElementId::UNSELECTABLE`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub i64);

impl ElementId {
    pub const UNSELECTABLE: ElementId = ElementId(-1);

    pub fn new(n: i64) -> Self {
        ElementId(n)
    }

    pub fn is_selectable(&self) -> bool {
        self.0 >= 0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::UNSELECTABLE
    }
}

/// Identifies one fetch cycle of a widget.
///
/// Ids are issued in increasing order; a result tagged with an id that is no
/// longer current belongs to an abandoned cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CycleId(pub u64);

impl CycleId {
    pub fn next(self) -> Self {
        CycleId(self.0 + 1)
    }
}
