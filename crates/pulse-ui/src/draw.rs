//! Terminal drawing for dashboard frames.
//!
//! Turns a [`Frame`] into ratatui widgets: a header bar, then the metrics
//! table with the top-posts pane beside it when the frame carries one.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table},
    Frame as TermFrame,
};

use crate::frame::{Cell, DetailPanel, Frame, MetricsTable, TopPostsPanel, NO_POSTS_TEXT};
use crate::layout::dashboard_layout;

const FOOTER_HINT: &str = "q / Esc / Ctrl+C to quit";

fn status_color(cell: &Cell) -> Color {
    match cell {
        Cell::Value(_) => Color::Green,
        Cell::Failed(_) => Color::Red,
        Cell::Off => Color::DarkGray,
    }
}

/// Draw a whole dashboard frame into the terminal area.
pub fn draw_frame(f: &mut TermFrame, frame: &Frame) {
    let area = f.area();
    if area.width == 0 || area.height == 0 {
        return;
    }

    let rects = dashboard_layout(area, !frame.details.is_empty());

    draw_header(f, rects.header, frame);
    draw_table(f, rects.table, &frame.table);

    if let Some(detail) = rects.detail {
        for panel in &frame.details {
            match panel {
                DetailPanel::TopPosts(posts) => draw_top_posts(f, detail, posts),
            }
        }
    }
}

fn draw_header(f: &mut TermFrame, area: Rect, frame: &Frame) {
    let line = Line::from(vec![
        Span::styled(
            frame.header.title.as_str(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | Last Updated: "),
        Span::raw(frame.header.last_updated.as_str()),
    ]);
    let header = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title_bottom(Line::from(FOOTER_HINT).dark_gray()),
    );
    f.render_widget(header, area);
}

fn draw_table(f: &mut TermFrame, area: Rect, table: &MetricsTable) {
    let rows = table.rows.iter().map(|row| {
        let color = status_color(&row.cell);
        Row::new(vec![
            Span::raw(row.label),
            Span::styled(row.cell.value_text().to_string(), Style::default().fg(color)),
            Span::styled(row.cell.status_text(), Style::default().fg(color)),
        ])
    });

    let widget = Table::new(
        rows,
        [
            Constraint::Percentage(50),
            Constraint::Percentage(30),
            Constraint::Percentage(20),
        ],
    )
    .header(
        Row::new(vec!["Metric", "Value", "Status"])
            .style(Style::default().add_modifier(Modifier::BOLD))
            .bottom_margin(1),
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(table.title.as_str()),
    );
    f.render_widget(widget, area);
}

fn draw_top_posts(f: &mut TermFrame, area: Rect, panel: &TopPostsPanel) {
    let lines: Vec<Line> = if panel.entries.is_empty() {
        vec![Line::from(NO_POSTS_TEXT.dark_gray())]
    } else {
        panel
            .entries
            .iter()
            .map(|post| {
                Line::from(vec![
                    Span::styled(format!("{}. ", post.rank), Style::default().fg(Color::Yellow)),
                    Span::styled(post.title.as_str(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(format!(" by {}", post.author)),
                    Span::styled(
                        format!("  score {}  views {}", post.score, post.views),
                        Style::default().fg(Color::DarkGray),
                    ),
                ])
            })
            .collect()
    };

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(panel.title.as_str()),
    );
    f.render_widget(widget, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Header, MetricRow, PostLine};
    use pulse_core::MetricId;
    use ratatui::{backend::TestBackend, Terminal};

    fn render_to_buffer(width: u16, height: u16, frame: &Frame) -> ratatui::buffer::Buffer {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| {
                draw_frame(f, frame);
            })
            .unwrap();
        terminal.backend().buffer().clone()
    }

    fn buffer_text(buf: &ratatui::buffer::Buffer) -> String {
        buf.content()
            .iter()
            .map(|c| c.symbol().to_string())
            .collect()
    }

    fn sample(details: Vec<DetailPanel>) -> Frame {
        Frame {
            header: Header {
                title: "Campus Pulse Analytics Dashboard".into(),
                last_updated: "2024-05-01 09:30:00".into(),
            },
            table: MetricsTable {
                title: "Live Metrics".into(),
                rows: vec![
                    MetricRow {
                        metric: MetricId::Dau,
                        label: MetricId::Dau.label(),
                        cell: Cell::Value("1,204".into()),
                    },
                    MetricRow {
                        metric: MetricId::NewPosts,
                        label: MetricId::NewPosts.label(),
                        cell: Cell::Failed("new_posts: timeout".into()),
                    },
                    MetricRow {
                        metric: MetricId::MessagesSent,
                        label: MetricId::MessagesSent.label(),
                        cell: Cell::Off,
                    },
                ],
            },
            details,
        }
    }

    #[test]
    fn table_shows_values_failures_and_off() {
        let buf = render_to_buffer(90, 20, &sample(Vec::new()));
        let text = buffer_text(&buf);
        assert!(text.contains("Campus Pulse Analytics Dashboard"));
        assert!(text.contains("Last Updated: 2024-05-01 09:30:00"));
        assert!(text.contains("1,204"));
        assert!(text.contains("ERROR"));
        assert!(text.contains("FAIL"));
        assert!(text.contains("OFF"));
        assert!(!text.contains("Top Posts Today"));
    }

    #[test]
    fn top_posts_pane_lists_entries() {
        let panel = DetailPanel::TopPosts(TopPostsPanel {
            title: "Top Posts Today".into(),
            entries: vec![PostLine {
                rank: 1,
                title: "Free couch".into(),
                author: "sam".into(),
                score: "12".into(),
                views: "340".into(),
            }],
        });
        let buf = render_to_buffer(120, 24, &sample(vec![panel]));
        let text = buffer_text(&buf);
        assert!(text.contains("Top Posts Today"));
        assert!(text.contains("1. Free couch by sam"));
    }

    #[test]
    fn empty_top_posts_pane_says_so() {
        let panel = DetailPanel::TopPosts(TopPostsPanel {
            title: "Top Posts Today".into(),
            entries: Vec::new(),
        });
        let buf = render_to_buffer(90, 24, &sample(vec![panel]));
        assert!(buffer_text(&buf).contains(NO_POSTS_TEXT));
    }

    #[test]
    fn no_panic_with_tiny_area() {
        let _buf = render_to_buffer(3, 2, &sample(Vec::new()));
    }
}
