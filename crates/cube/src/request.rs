use foundation::CycleId;

/// Contiguous block of cube rows requested in one fetch cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowWindow {
    pub top: usize,
    pub height: usize,
}

impl RowWindow {
    pub fn new(top: usize, height: usize) -> Self {
        Self { top, height }
    }

    pub fn all(row_count: usize) -> Self {
        Self::new(0, row_count)
    }

    /// Window for a zero-based page, clipped to the cube.
    pub fn for_page(page: usize, page_size: usize, row_count: usize) -> Self {
        let top = page.saturating_mul(page_size).min(row_count);
        let height = page_size.min(row_count - top);
        Self::new(top, height)
    }
}

/// Issues fetch-cycle ids and remembers which one is current.
///
/// Starting a cycle invalidates every earlier id, so a result that arrives
/// after a page change or refresh can be recognized and dropped.
#[derive(Debug, Default)]
pub struct FetchTracker {
    last: u64,
    current: Option<CycleId>,
}

impl FetchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> CycleId {
        self.last += 1;
        let id = CycleId(self.last);
        self.current = Some(id);
        id
    }

    pub fn is_current(&self, id: CycleId) -> bool {
        self.current == Some(id)
    }

    /// Marks `id` as settled. Returns `false` for a stale id.
    pub fn finish(&mut self, id: CycleId) -> bool {
        if !self.is_current(id) {
            return false;
        }
        self.current = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{FetchTracker, RowWindow};

    #[test]
    fn page_windows_are_clipped() {
        assert_eq!(RowWindow::for_page(0, 500, 1200), RowWindow::new(0, 500));
        assert_eq!(RowWindow::for_page(2, 500, 1200), RowWindow::new(1000, 200));
        assert_eq!(RowWindow::for_page(9, 500, 1200), RowWindow::new(1200, 0));
        assert_eq!(RowWindow::for_page(0, 500, 0), RowWindow::new(0, 0));
    }

    #[test]
    fn newer_cycle_invalidates_older() {
        let mut t = FetchTracker::new();
        let a = t.begin();
        let b = t.begin();
        assert!(!t.is_current(a));
        assert!(t.is_current(b));
        assert!(!t.finish(a));
        assert!(t.finish(b));
        assert!(!t.finish(b));
    }
}
