//! The table engine: local UI state plus callbacks.

use log::debug;

use super::ActionMenu;
use super::CellView;
use super::Column;
use super::ColumnToggleView;
use super::HeaderView;
use super::PageNav;
use super::PaginationState;
use super::SelectionSet;
use super::render::ActionView;
use super::render::BodyView;
use super::render::PagerView;
use super::render::RowView;
use super::render::TableView;
use crate::model::Row;
use crate::model::RowId;

/// A page-size change. Changing the size always goes back to the first page,
/// so the target page travels with the new size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSizeChange {
    pub page_size: usize,
    /// Always `0`.
    pub page: usize,
}

impl PageSizeChange {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            page: 0,
        }
    }
}

/// Callbacks through which the engine reports user intent.
///
/// These are the engine's only side effects. The owner of the data decides
/// what to fetch.
pub trait TableHandler {
    fn on_page_change(&mut self, page: usize);

    fn on_page_size_change(&mut self, change: PageSizeChange);

    /// Receives the full new selection, including ids from other pages.
    fn set_selected_ids(&mut self, ids: SelectionSet);

    /// Called on every search edit, without debouncing.
    fn set_search_input(&mut self, search: String);
}

/// Inputs of one render.
#[derive(Debug)]
pub struct TableProps<'a, T> {
    pub rows: &'a [T],
    pub pagination: PaginationState,
    pub selection: &'a SelectionSet,
    pub loading: bool,
    pub search: &'a str,
    pub header_content: Option<&'a str>,
}

impl<'a, T> TableProps<'a, T> {
    pub fn new(rows: &'a [T], pagination: PaginationState, selection: &'a SelectionSet) -> Self {
        Self {
            rows,
            pagination,
            selection,
            loading: false,
            search: "",
            header_content: None,
        }
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn search(mut self, search: &'a str) -> Self {
        self.search = search;
        self
    }

    pub fn header_content(mut self, content: &'a str) -> Self {
        self.header_content = Some(content);
        self
    }
}

/// Generic paginated table.
///
/// Holds only presentation state: which columns are visible and which row's
/// action menu is open. Rows, pagination and selection are owned by the
/// caller and passed in on every call.
///
/// # Example
///
/// ```ignore
/// let mut engine = TableEngine::new(columns, ActionMenu::new(actions)?);
///
/// engine.navigate(&controller.pagination(), PageNav::Next, &mut controller);
/// let view = engine.render(TableProps::new(&rows, controller.pagination(), controller.selection()));
/// ```
pub struct TableEngine<T> {
    columns: Vec<Column<T>>,
    visible: Vec<bool>,
    actions: ActionMenu,
    open_menu: Option<RowId>,
}

impl<T: Row> TableEngine<T> {
    /// Creates an engine; column visibility is seeded from each column's
    /// `visible` flag.
    pub fn new(columns: Vec<Column<T>>, actions: ActionMenu) -> Self {
        let visible = columns.iter().map(|c| c.visible).collect();
        Self {
            columns,
            visible,
            actions,
            open_menu: None,
        }
    }

    pub fn columns(&self) -> &[Column<T>] {
        &self.columns
    }

    pub fn is_visible(&self, key: &str) -> bool {
        self.position(key).is_some_and(|i| self.visible[i])
    }

    /// Shows or hides a column. Returns the new visibility, or `None` for an
    /// unknown key.
    pub fn toggle_column(&mut self, key: &str) -> Option<bool> {
        let index = self.position(key)?;
        self.visible[index] = !self.visible[index];
        Some(self.visible[index])
    }

    /// Sets a column's visibility. Returns `false` for an unknown key.
    pub fn set_visible(&mut self, key: &str, visible: bool) -> bool {
        match self.position(key) {
            Some(index) => {
                self.visible[index] = visible;
                true
            }
            None => false,
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.key == key)
    }

    // =========================================================================
    // Pagination and search
    // =========================================================================

    /// Handles a pager button. Disabled buttons do nothing.
    ///
    /// Returns `true` if the handler was called.
    pub fn navigate(
        &self,
        pagination: &PaginationState,
        nav: PageNav,
        handler: &mut impl TableHandler,
    ) -> bool {
        match pagination.target(nav) {
            Some(page) => {
                handler.on_page_change(page);
                true
            }
            None => false,
        }
    }

    pub fn change_page_size(&self, page_size: usize, handler: &mut impl TableHandler) {
        handler.on_page_size_change(PageSizeChange::new(page_size));
    }

    pub fn search_input(&self, text: impl Into<String>, handler: &mut impl TableHandler) {
        handler.set_search_input(text.into());
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Flips one row in the caller's selection.
    pub fn toggle_row(&self, id: &RowId, selection: &SelectionSet, handler: &mut impl TableHandler) {
        let mut next = selection.clone();
        next.toggle(id);
        handler.set_selected_ids(next);
    }

    /// Select-all over the rows currently shown.
    pub fn toggle_all(&self, rows: &[T], selection: &SelectionSet, handler: &mut impl TableHandler) {
        let page_ids: Vec<RowId> = rows.iter().map(Row::row_id).collect();
        let mut next = selection.clone();
        next.toggle_page(&page_ids);
        handler.set_selected_ids(next);
    }

    // =========================================================================
    // Action menu
    // =========================================================================

    /// Opens the action menu of a row, closing any other.
    pub fn open_menu(&mut self, id: RowId) {
        self.open_menu = Some(id);
    }

    pub fn close_menu(&mut self) {
        self.open_menu = None;
    }

    pub fn open_menu_id(&self) -> Option<&RowId> {
        self.open_menu.as_ref()
    }

    /// Chooses an option of the open menu: closes the menu, then runs the
    /// option's action once with the row id.
    ///
    /// Returns `false` if no menu is open or `value` is unknown.
    pub fn choose_action(&mut self, value: &str) -> bool {
        let Some(id) = self.open_menu.take() else {
            return false;
        };
        match self.actions.get(value) {
            Some(option) => {
                debug!("Row action '{}' on {}", value, id);
                option.invoke(&id);
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Render
    // =========================================================================

    pub fn render(&self, props: TableProps<'_, T>) -> TableView {
        let visible_columns: Vec<&Column<T>> = self
            .columns
            .iter()
            .zip(&self.visible)
            .filter_map(|(column, visible)| visible.then_some(column))
            .collect();

        let page_ids: Vec<RowId> = props.rows.iter().map(Row::row_id).collect();

        let body = if props.loading {
            BodyView::Loading
        } else if props.rows.is_empty() {
            BodyView::Empty
        } else {
            BodyView::Rows(
                props
                    .rows
                    .iter()
                    .zip(&page_ids)
                    .map(|(row, id)| RowView {
                        id: id.clone(),
                        selected: props.selection.contains(id),
                        cells: visible_columns
                            .iter()
                            .map(|column| CellView::render(column.kind, &column.value(row)))
                            .collect(),
                        menu_open: self.open_menu.as_ref() == Some(id),
                    })
                    .collect(),
            )
        };

        TableView {
            header_content: props.header_content.map(str::to_string),
            search: props.search.to_string(),
            column_toggles: self
                .columns
                .iter()
                .zip(&self.visible)
                .map(|(column, visible)| ColumnToggleView {
                    key: column.key.clone(),
                    header: column.header.clone(),
                    visible: *visible,
                })
                .collect(),
            headers: visible_columns
                .iter()
                .map(|column| HeaderView {
                    key: column.key.clone(),
                    header: column.header.clone(),
                })
                .collect(),
            select_all: props.selection.page_state(&page_ids),
            actions: self
                .actions
                .options()
                .iter()
                .map(|option| ActionView {
                    value: option.value.clone(),
                    label: option.label.clone(),
                    icon: option.icon.clone(),
                })
                .collect(),
            body,
            pager: PagerView::from(&props.pagination),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use super::*;
    use crate::table::ActionOption;
    use crate::table::CellValue;
    use crate::table::CheckState;
    use crate::table::ColumnKind;
    use crate::table::Tone;

    #[derive(Debug, Clone)]
    struct Course {
        id: i64,
        title: String,
        published: bool,
    }

    impl Row for Course {
        fn row_id(&self) -> RowId {
            RowId::from(self.id)
        }
    }

    #[derive(Default)]
    struct Recorder {
        pages: Vec<usize>,
        sizes: Vec<PageSizeChange>,
        selections: Vec<SelectionSet>,
        searches: Vec<String>,
    }

    impl TableHandler for Recorder {
        fn on_page_change(&mut self, page: usize) {
            self.pages.push(page);
        }

        fn on_page_size_change(&mut self, change: PageSizeChange) {
            self.sizes.push(change);
        }

        fn set_selected_ids(&mut self, ids: SelectionSet) {
            self.selections.push(ids);
        }

        fn set_search_input(&mut self, search: String) {
            self.searches.push(search);
        }
    }

    fn courses(range: std::ops::Range<i64>) -> Vec<Course> {
        range
            .map(|id| Course {
                id,
                title: format!("Course {}", id),
                published: id % 2 == 0,
            })
            .collect()
    }

    fn engine(actions: ActionMenu) -> TableEngine<Course> {
        TableEngine::new(
            vec![
                Column::new("Title", "title", |c: &Course| c.title.as_str().into()),
                Column::new("Published", "published", |c: &Course| c.published.into())
                    .kind(ColumnKind::Badge),
                Column::new("Id", "id", |c: &Course| CellValue::from(c.id)).hidden(),
            ],
            actions,
        )
    }

    #[test]
    fn test_visibility_toggle_only_changes_cells() {
        let mut engine = engine(ActionMenu::default());
        let rows = courses(0..3);
        let selection = SelectionSet::new();
        let pagination = PaginationState::new(0, 10, 3);

        let before = engine.render(TableProps::new(&rows, pagination, &selection));
        assert_eq!(before.headers.len(), 2);

        assert_eq!(engine.toggle_column("published"), Some(false));
        assert_eq!(engine.toggle_column("id"), Some(true));
        assert_eq!(engine.toggle_column("missing"), None);

        let after = engine.render(TableProps::new(&rows, pagination, &selection));
        let keys: Vec<_> = after.headers.iter().map(|h| h.key.as_str()).collect();
        assert_eq!(keys, vec!["title", "id"]);
        assert_eq!(after.rows().len(), before.rows().len());
        assert_eq!(after.pager, before.pager);
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_set_visible_is_idempotent() {
        let mut engine = engine(ActionMenu::default());

        assert!(engine.set_visible("id", false));
        assert!(!engine.is_visible("id"));
        assert!(engine.set_visible("title", false));
        assert!(engine.set_visible("title", false));
        assert!(!engine.is_visible("title"));
        assert!(engine.set_visible("id", true));
        assert!(engine.is_visible("id"));
        assert!(!engine.set_visible("missing", true));
    }

    #[test]
    fn test_navigation_clamped_at_bounds() {
        let engine = engine(ActionMenu::default());
        let mut recorder = Recorder::default();

        let first = PaginationState::new(0, 20, 45);
        assert!(!engine.navigate(&first, PageNav::Prev, &mut recorder));
        assert!(engine.navigate(&first, PageNav::Last, &mut recorder));

        let last = PaginationState::new(2, 20, 45);
        assert!(!engine.navigate(&last, PageNav::Next, &mut recorder));
        assert!(engine.navigate(&last, PageNav::Prev, &mut recorder));

        assert_eq!(recorder.pages, vec![2, 1]);
    }

    #[test]
    fn test_page_size_change_resets_page() {
        let engine = engine(ActionMenu::default());
        let mut recorder = Recorder::default();
        engine.change_page_size(50, &mut recorder);
        assert_eq!(
            recorder.sizes,
            vec![PageSizeChange {
                page_size: 50,
                page: 0
            }]
        );
    }

    #[test]
    fn test_search_reported_immediately() {
        let engine = engine(ActionMenu::default());
        let mut recorder = Recorder::default();
        engine.search_input("a", &mut recorder);
        engine.search_input("ab", &mut recorder);
        assert_eq!(recorder.searches, vec!["a", "ab"]);
    }

    #[test]
    fn test_toggle_all_keeps_other_pages() {
        let engine = engine(ActionMenu::default());
        let mut recorder = Recorder::default();
        let other_page: SelectionSet = [RowId::from(99)].into_iter().collect();
        let rows = courses(0..4);

        engine.toggle_all(&rows, &other_page, &mut recorder);
        let selected = recorder.selections.pop().unwrap();
        assert_eq!(selected.len(), 5);
        assert!(selected.contains(&RowId::from(99)));

        engine.toggle_row(&RowId::from(2), &selected, &mut recorder);
        let selected = recorder.selections.pop().unwrap();
        assert_eq!(selected.len(), 4);

        let view = engine.render(TableProps::new(
            &rows,
            PaginationState::new(0, 4, 10),
            &selected,
        ));
        assert_eq!(view.select_all, CheckState::Indeterminate);
        assert!(!view.rows()[2].selected);
    }

    #[test]
    fn test_action_runs_once_and_closes_menu() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&calls);
        let menu = ActionMenu::new(vec![ActionOption::new("edit", "Edit", move |id| {
            recorded.lock().unwrap().push(id.clone());
        })])
        .unwrap();
        let mut engine = engine(menu);

        engine.open_menu(RowId::from(1));
        engine.open_menu(RowId::from(3));
        assert_eq!(engine.open_menu_id(), Some(&RowId::from(3)));

        assert!(engine.choose_action("edit"));
        assert!(engine.open_menu_id().is_none());
        assert!(!engine.choose_action("edit"));

        assert_eq!(*calls.lock().unwrap(), vec![RowId::from(3)]);
    }

    #[test]
    fn test_loading_and_empty_bodies() {
        let engine = engine(ActionMenu::default());
        let selection = SelectionSet::new();
        let rows = courses(0..2);
        let pagination = PaginationState::new(0, 10, 2);

        let loading = engine.render(TableProps::new(&rows, pagination, &selection).loading(true));
        assert_eq!(loading.body, BodyView::Loading);

        let empty: Vec<Course> = Vec::new();
        let view = engine.render(TableProps::new(&empty, pagination, &selection));
        assert_eq!(view.body, BodyView::Empty);
        assert_eq!(view.select_all, CheckState::Unchecked);
    }

    #[test]
    fn test_badge_cells_rendered() {
        let engine = engine(ActionMenu::default());
        let selection = SelectionSet::new();
        let rows = courses(1..2);
        let view = engine.render(
            TableProps::new(&rows, PaginationState::new(0, 10, 1), &selection)
                .search("intro")
                .header_content("Courses"),
        );
        assert_eq!(view.search, "intro");
        assert_eq!(view.header_content.as_deref(), Some("Courses"));
        assert_eq!(
            view.rows()[0].cells[1],
            CellView::Pill {
                label: "false".into(),
                tone: Tone::Danger
            }
        );
    }
}
