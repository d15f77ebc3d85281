use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Header height including its border.
pub const HEADER_HEIGHT: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashRects {
    pub header: Rect,
    pub table: Rect,
    /// Present only when the frame has detail panels.
    pub detail: Option<Rect>,
}

/// Header band on top; below it the metrics table, sharing the row with the
/// detail pane when there is one.
pub fn dashboard_layout(area: Rect, with_details: bool) -> DashRects {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT), // header
            Constraint::Min(1),                // body
        ])
        .split(area);

    let body = chunks[1];
    if !with_details {
        return DashRects {
            header: chunks[0],
            table: body,
            detail: None,
        };
    }

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(body);

    DashRects {
        header: chunks[0],
        table: cols[0],
        detail: Some(cols[1]),
    }
}
