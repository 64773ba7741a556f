//! Page-level list state: the owner of what the table shows.

use std::time::Duration;

use log::debug;
use tokio::time::Instant;

use super::PageSizeChange;
use super::PaginationState;
use super::SelectionSet;
use super::TableHandler;
use crate::api::ListQuery;
use crate::api::Page;
use crate::model::RowId;

/// Owns page, page size, search and selection for one list screen and
/// decides when a fetch is due.
///
/// Search edits are debounced: a fetch happens once the input has been
/// quiet for the debounce period, and always for page 0. Page-size changes
/// reset to page 0 as well.
///
/// The controller does no I/O. Drive it with [`poll_fetch`](Self::poll_fetch)
/// and feed results back with [`apply_page`](Self::apply_page).
///
/// # Example
///
/// ```ignore
/// let mut list = ListController::new(20, config.search_debounce)
///     .with_search_fields(&["name", "email"]);
///
/// loop {
///     if let Some(query) = list.poll_fetch(Instant::now()) {
///         let page = client.list::<UserProfile>(Resource::Users, &query).await?;
///         list.apply_page(&page);
///     }
///     // ... handle input, sleeping until list.deadline() at most
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ListController {
    page: usize,
    page_size: usize,
    total: usize,
    selection: SelectionSet,
    search_input: String,
    applied_search: String,
    search_fields: Vec<String>,
    debounce: Duration,
    search_deadline: Option<Instant>,
    fetch_due: bool,
}

impl ListController {
    /// Creates a controller on page 0 with an initial fetch due.
    pub fn new(page_size: usize, debounce: Duration) -> Self {
        Self {
            page: 0,
            page_size: page_size.max(1),
            total: 0,
            selection: SelectionSet::new(),
            search_input: String::new(),
            applied_search: String::new(),
            search_fields: Vec::new(),
            debounce,
            search_deadline: None,
            fetch_due: true,
        }
    }

    /// Sets the fields the search applies to.
    pub fn with_search_fields(mut self, fields: &[&str]) -> Self {
        self.search_fields = fields.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn pagination(&self) -> PaginationState {
        PaginationState::new(self.page, self.page_size, self.total)
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// The search text as typed, before debouncing.
    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    /// Records a search edit made at `now`; restarts the debounce window.
    pub fn edit_search(&mut self, text: String, now: Instant) {
        self.search_input = text;
        self.search_deadline = Some(now + self.debounce);
    }

    /// When the pending search edit settles, if one is pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.search_deadline
    }

    /// Marks a fetch as due, e.g. after a row action changed server data.
    pub fn request_fetch(&mut self) {
        self.fetch_due = true;
    }

    /// Returns the query to fetch if a fetch is due at `now`.
    ///
    /// A settled search edit that changed the term moves to page 0.
    pub fn poll_fetch(&mut self, now: Instant) -> Option<ListQuery> {
        if let Some(deadline) = self.search_deadline
            && now >= deadline
        {
            self.search_deadline = None;
            if self.search_input.trim() != self.applied_search.trim() {
                self.applied_search = self.search_input.clone();
                self.page = 0;
                self.fetch_due = true;
                debug!("Search settled on '{}'", self.applied_search);
            }
        }

        if !self.fetch_due {
            return None;
        }
        self.fetch_due = false;
        Some(self.query())
    }

    /// The query for the current state.
    pub fn query(&self) -> ListQuery {
        let fields: Vec<&str> = self.search_fields.iter().map(String::as_str).collect();
        ListQuery::new(self.page, self.page_size)
            .search(self.applied_search.as_str())
            .search_fields(&fields)
    }

    /// Records the total of a fetched page, pulling the page back into range
    /// if the total shrank.
    pub fn apply_page<T>(&mut self, page: &Page<T>) {
        self.total = page.total();
        let clamped = self.pagination().page();
        if clamped != self.page {
            debug!("Page {} out of range, moving to {}", self.page, clamped);
            self.page = clamped;
            self.fetch_due = true;
        }
    }

    /// Removes deleted ids from the selection.
    pub fn prune_selection<'a>(&mut self, deleted: impl IntoIterator<Item = &'a RowId>) {
        let removed = self.selection.remove_all(deleted);
        if removed > 0 {
            debug!("Pruned {} deleted id(s) from selection", removed);
        }
    }
}

impl TableHandler for ListController {
    fn on_page_change(&mut self, page: usize) {
        self.page = PaginationState::new(page, self.page_size, self.total).page();
        self.fetch_due = true;
    }

    fn on_page_size_change(&mut self, change: PageSizeChange) {
        self.page_size = change.page_size.max(1);
        self.page = change.page;
        self.fetch_due = true;
    }

    fn set_selected_ids(&mut self, ids: SelectionSet) {
        self.selection = ids;
    }

    fn set_search_input(&mut self, search: String) {
        self.edit_search(search, Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEBOUNCE: Duration = Duration::from_millis(500);

    fn settled(list: &mut ListController, at: Instant) {
        list.apply_page(&Page::<()>::new(Vec::new(), 100));
        assert!(list.poll_fetch(at).is_some());
    }

    #[test]
    fn test_initial_fetch_due_once() {
        let start = Instant::now();
        let mut list = ListController::new(20, DEBOUNCE);
        let query = list.poll_fetch(start).unwrap();
        assert_eq!(query.page, 0);
        assert_eq!(query.limit, 20);
        assert!(list.poll_fetch(start).is_none());
    }

    #[test]
    fn test_rapid_search_edits_fetch_once_on_page_zero() {
        let start = Instant::now();
        let mut list = ListController::new(20, DEBOUNCE).with_search_fields(&["name"]);
        settled(&mut list, start);
        list.on_page_change(3);
        assert_eq!(list.poll_fetch(start).unwrap().page, 3);

        list.edit_search("abc".into(), start);
        list.edit_search("abcd".into(), start + Duration::from_millis(200));

        assert!(list.poll_fetch(start + Duration::from_millis(600)).is_none());

        let query = list.poll_fetch(start + Duration::from_millis(700)).unwrap();
        assert_eq!(query.search.as_deref(), Some("abcd"));
        assert_eq!(query.page, 0);
        assert!(list.poll_fetch(start + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn test_unchanged_search_does_not_refetch() {
        let start = Instant::now();
        let mut list = ListController::new(10, DEBOUNCE);
        settled(&mut list, start);

        list.edit_search("x".into(), start);
        list.edit_search("".into(), start + Duration::from_millis(100));
        assert!(list.poll_fetch(start + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn test_page_size_change_resets_page() {
        let start = Instant::now();
        let mut list = ListController::new(10, DEBOUNCE);
        settled(&mut list, start);
        list.on_page_change(4);
        list.on_page_size_change(PageSizeChange::new(50));

        let query = list.poll_fetch(start).unwrap();
        assert_eq!((query.page, query.limit), (0, 50));
    }

    #[test]
    fn test_shrinking_total_pulls_page_back() {
        let start = Instant::now();
        let mut list = ListController::new(10, DEBOUNCE);
        settled(&mut list, start);
        list.on_page_change(9);
        list.poll_fetch(start);

        list.apply_page(&Page::<()>::new(Vec::new(), 35));
        assert_eq!(list.pagination().page(), 3);
        assert_eq!(list.poll_fetch(start).unwrap().page, 3);
    }

    #[test]
    fn test_prune_selection() {
        let mut list = ListController::new(10, DEBOUNCE);
        list.set_selected_ids([RowId::from("a"), RowId::from("b")].into_iter().collect());
        list.prune_selection(&[RowId::from("a")]);
        assert_eq!(list.selection().ids(), vec![RowId::from("b")]);
    }
}
