//! Plain-text drawing of table views and notifications.

use std::fmt::Write;

use coursedesk_lib::model::Notification;
use coursedesk_lib::table::BodyView;
use coursedesk_lib::table::CellView;
use coursedesk_lib::table::CheckState;
use coursedesk_lib::table::PagerView;
use coursedesk_lib::table::TableView;

const GAP: &str = "  ";

fn cell_text(cell: &CellView) -> String {
    match cell {
        CellView::Text(text) => text.clone(),
        CellView::Pill { label, .. } => format!("[{}]", label),
        CellView::Image { url } => url.clone(),
        CellView::Group(items) => items.join(", "),
    }
}

fn check_box(state: CheckState) -> &'static str {
    match state {
        CheckState::Unchecked => "[ ]",
        CheckState::Indeterminate => "[-]",
        CheckState::Checked => "[x]",
    }
}

/// Draws `view` as aligned columns with a pager line.
pub fn table(view: &TableView) -> String {
    let mut out = String::new();

    if let Some(header) = &view.header_content {
        let _ = writeln!(out, "{}", header);
    }
    if !view.search.is_empty() {
        let _ = writeln!(out, "Search: {}", view.search);
    }

    let rows: Vec<(bool, Vec<String>)> = view
        .rows()
        .iter()
        .map(|row| (row.selected, row.cells.iter().map(cell_text).collect()))
        .collect();

    let mut widths: Vec<usize> = view.headers.iter().map(|h| h.header.chars().count()).collect();
    for (_, cells) in &rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let headers: Vec<String> = view.headers.iter().map(|h| h.header.clone()).collect();
    let _ = writeln!(out, "{}{}{}", check_box(view.select_all), GAP, line(&headers, &widths));

    match &view.body {
        BodyView::Loading => out.push_str("Loading...\n"),
        BodyView::Empty => out.push_str("No data\n"),
        BodyView::Rows(_) => {
            for (selected, cells) in &rows {
                let mark = if *selected {
                    CheckState::Checked
                } else {
                    CheckState::Unchecked
                };
                let _ = writeln!(out, "{}{}{}", check_box(mark), GAP, line(cells, &widths));
            }
        }
    }

    let _ = writeln!(out, "{}", pager_line(&view.pager));
    out
}

fn pager_line(pager: &PagerView) -> String {
    let page = format!("Page {} of {}", pager.page + 1, pager.page_count.max(1));
    match pager.rows {
        Some((first, last)) => format!("{} (rows {}-{} of {})", page, first, last, pager.total),
        None => format!("{} (no rows)", page),
    }
}

fn line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = width))
        .collect::<Vec<_>>()
        .join(GAP)
        .trim_end()
        .to_string()
}

/// One-line summary of a notification.
pub fn notification_line(notification: &Notification) -> String {
    let marker = if notification.is_unread() { "*" } else { " " };
    let when = notification
        .created_at
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    format!(
        "{} {} {:<16} {}",
        marker,
        notification.id,
        when,
        notification.plain_message()
    )
}
