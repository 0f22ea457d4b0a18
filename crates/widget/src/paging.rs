use cube::RowWindow;
use serde::Serialize;

/// Pagination position over the cube's rows.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageState {
    pub current_page: usize,
    pub page_size: usize,
    pub row_count: usize,
    pub dimension_count: usize,
    pub enabled: bool,
}

impl PageState {
    pub fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            return 1;
        }
        self.row_count.div_ceil(self.page_size).max(1)
    }

    pub fn has_prev(&self) -> bool {
        self.enabled && self.current_page > 0
    }

    pub fn has_next(&self) -> bool {
        self.enabled && self.current_page + 1 < self.total_pages()
    }

    /// Rows fetched for the current page, or every row when disabled.
    pub fn window(&self) -> RowWindow {
        if self.enabled {
            RowWindow::for_page(self.current_page, self.page_size, self.row_count)
        } else {
            RowWindow::all(self.row_count)
        }
    }

    pub fn label(&self) -> String {
        format!(
            "Page {} of {} ({} rows, {} dimensions)",
            self.current_page + 1,
            self.total_pages(),
            self.row_count,
            self.dimension_count
        )
    }
}

#[cfg(test)]
mod tests {
    use cube::RowWindow;

    use super::PageState;

    fn state(page: usize, rows: usize) -> PageState {
        PageState {
            current_page: page,
            page_size: 500,
            row_count: rows,
            dimension_count: 6,
            enabled: true,
        }
    }

    #[test]
    fn counts_pages() {
        assert_eq!(state(0, 0).total_pages(), 1);
        assert_eq!(state(0, 500).total_pages(), 1);
        assert_eq!(state(0, 1201).total_pages(), 3);
    }

    #[test]
    fn navigation_flags() {
        assert!(!state(0, 1201).has_prev());
        assert!(state(0, 1201).has_next());
        assert!(state(2, 1201).has_prev());
        assert!(!state(2, 1201).has_next());
    }

    #[test]
    fn windows_and_label() {
        assert_eq!(state(2, 1201).window(), RowWindow::new(1000, 201));
        let disabled = PageState {
            enabled: false,
            ..state(2, 1201)
        };
        assert_eq!(disabled.window(), RowWindow::all(1201));
        assert_eq!(
            state(1, 1201).label(),
            "Page 2 of 3 (1201 rows, 6 dimensions)"
        );
    }
}
