//! View models produced by the table engine.
//!
//! Front ends draw these; nothing here knows about pixels or terminals.

use super::CheckState;
use super::PageNav;
use super::PaginationState;
use super::column::CellValue;
use super::column::ColumnKind;
use crate::model::RowId;

/// Pill color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Danger,
}

/// A rendered cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellView {
    Text(String),
    Pill { label: String, tone: Tone },
    Image { url: String },
    Group(Vec<String>),
}

impl CellView {
    /// Renders `value` for a column of the given kind.
    pub fn render(kind: ColumnKind, value: &CellValue) -> Self {
        match kind {
            ColumnKind::Plain => Self::Text(value.to_string()),
            ColumnKind::Badge | ColumnKind::System => Self::Pill {
                label: value.to_string(),
                tone: if value.is_truthy() {
                    Tone::Success
                } else {
                    Tone::Danger
                },
            },
            ColumnKind::ImagePreview => Self::Image {
                url: value.to_string(),
            },
            ColumnKind::Group => match value {
                CellValue::List(items) => Self::Group(items.clone()),
                CellValue::Empty => Self::Group(Vec::new()),
                other => Self::Group(vec![other.to_string()]),
            },
        }
    }
}

/// Entry of the column show/hide menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnToggleView {
    pub key: String,
    pub header: String,
    pub visible: bool,
}

/// Header cell of a visible column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderView {
    pub key: String,
    pub header: String,
}

/// An entry of the row action menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionView {
    pub value: String,
    pub label: String,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub id: RowId,
    pub selected: bool,
    /// One cell per visible column, in column order.
    pub cells: Vec<CellView>,
    pub menu_open: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BodyView {
    Loading,
    Empty,
    Rows(Vec<RowView>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerView {
    pub page: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub total: usize,
    /// 1-based first and last row shown, `None` when there are no rows.
    pub rows: Option<(usize, usize)>,
    pub first_disabled: bool,
    pub prev_disabled: bool,
    pub next_disabled: bool,
    pub last_disabled: bool,
}

impl From<&PaginationState> for PagerView {
    fn from(state: &PaginationState) -> Self {
        Self {
            page: state.page(),
            page_count: state.page_count(),
            page_size: state.page_size(),
            total: state.total(),
            rows: state.row_range(),
            first_disabled: state.is_disabled(PageNav::First),
            prev_disabled: state.is_disabled(PageNav::Prev),
            next_disabled: state.is_disabled(PageNav::Next),
            last_disabled: state.is_disabled(PageNav::Last),
        }
    }
}

/// The whole table, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    /// Caller-supplied content for the header area.
    pub header_content: Option<String>,
    pub search: String,
    pub column_toggles: Vec<ColumnToggleView>,
    pub headers: Vec<HeaderView>,
    pub select_all: CheckState,
    pub actions: Vec<ActionView>,
    pub body: BodyView,
    pub pager: PagerView,
}

impl TableView {
    /// Rows of the body, empty while loading or when there is no data.
    pub fn rows(&self) -> &[RowView] {
        match &self.body {
            BodyView::Rows(rows) => rows,
            BodyView::Loading | BodyView::Empty => &[],
        }
    }
}
