use pulse_core::config::Config;
use pulse_core::error::RenderError;
use pulse_core::metric::{MetricEntry, MetricId, MetricValue, MetricsSnapshot, PostSummary};
use pulse_core::scheduler::Render;

use crate::format::{format_count, format_score, format_timestamp, truncate_title};
use crate::frame::{
    Cell, DetailPanel, Frame, Header, MetricRow, MetricsTable, PostLine, TopPostsPanel,
    DASHBOARD_TITLE, TABLE_TITLE, TOP_POSTS_TITLE,
};

/// Builds dashboard [`Frame`]s from snapshots.
///
/// Shows one table row per metric it was built for, in that order.
#[derive(Debug, Clone)]
pub struct DashboardRenderer {
    metrics: Vec<MetricId>,
}

impl Default for DashboardRenderer {
    fn default() -> Self {
        Self::new(MetricId::ALL.to_vec())
    }
}

impl DashboardRenderer {
    pub fn new(metrics: Vec<MetricId>) -> Self {
        Self { metrics }
    }

    fn row(&self, id: MetricId, snapshot: &MetricsSnapshot) -> Result<MetricRow, RenderError> {
        let cell = match snapshot.entry(id) {
            MetricEntry::Disabled => Cell::Off,
            MetricEntry::Failed(err) => Cell::Failed(err.to_string()),
            MetricEntry::Value(value) => Cell::Value(format_value(id, value)?),
        };
        Ok(MetricRow {
            metric: id,
            label: id.label(),
            cell,
        })
    }

    fn details(
        &self,
        snapshot: &MetricsSnapshot,
        config: &Config,
    ) -> Result<Vec<DetailPanel>, RenderError> {
        let mut panels = Vec::new();
        if !self.metrics.contains(&MetricId::TopPosts) || !config.is_enabled(MetricId::TopPosts) {
            return Ok(panels);
        }
        if let MetricEntry::Value(value) = snapshot.entry(MetricId::TopPosts) {
            let posts = ranked_list(MetricId::TopPosts, value)?;
            panels.push(DetailPanel::TopPosts(top_posts_panel(
                posts,
                config.display().title_width,
            )));
        }
        Ok(panels)
    }
}

impl Render for DashboardRenderer {
    type Frame = Frame;

    fn render(&self, snapshot: &MetricsSnapshot, config: &Config) -> Result<Frame, RenderError> {
        let rows = self
            .metrics
            .iter()
            .map(|&id| self.row(id, snapshot))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Frame {
            header: Header {
                title: DASHBOARD_TITLE.to_string(),
                last_updated: format_timestamp(&snapshot.collected_at),
            },
            table: MetricsTable {
                title: TABLE_TITLE.to_string(),
                rows,
            },
            details: self.details(snapshot, config)?,
        })
    }
}

/// Render with the default metric list.
pub fn render(snapshot: &MetricsSnapshot, config: &Config) -> Result<Frame, RenderError> {
    DashboardRenderer::default().render(snapshot, config)
}

fn check_shape(id: MetricId, value: &MetricValue) -> Result<(), RenderError> {
    if value.shape() == id.shape() {
        Ok(())
    } else {
        Err(RenderError::ShapeMismatch {
            metric: id,
            expected: id.shape(),
            found: value.shape(),
        })
    }
}

fn ranked_list(id: MetricId, value: &MetricValue) -> Result<&[PostSummary], RenderError> {
    check_shape(id, value)?;
    match value {
        MetricValue::RankedList(posts) => Ok(posts),
        MetricValue::Count(_) => unreachable!("shape checked above"),
    }
}

/// Table text for a value; ranked lists show how many entries they hold.
fn format_value(id: MetricId, value: &MetricValue) -> Result<String, RenderError> {
    check_shape(id, value)?;
    Ok(match value {
        MetricValue::Count(n) => format_count(*n),
        MetricValue::RankedList(posts) => format_count(posts.len() as u64),
    })
}

fn top_posts_panel(posts: &[PostSummary], title_width: usize) -> TopPostsPanel {
    TopPostsPanel {
        title: TOP_POSTS_TITLE.to_string(),
        entries: posts
            .iter()
            .enumerate()
            .map(|(i, post)| PostLine {
                rank: i + 1,
                title: truncate_title(&post.title, title_width),
                author: post.author_name.clone(),
                score: format_score(post.score),
                views: format_count(post.view_count),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use pulse_core::config::{ConnectionParams, DisplayOptions};
    use pulse_core::error::{CollectionError, QueryError};
    use std::time::Duration;

    fn config(enabled: &[MetricId], title_width: usize) -> Config {
        Config::new(
            ConnectionParams {
                host: "localhost".into(),
                port: 5432,
                database: "campus".into(),
                user: "analytics".into(),
                password: "pw".into(),
            },
            Duration::from_secs(10),
            "UTC",
            DisplayOptions { title_width },
            enabled.iter().map(|id| (id.key().to_string(), true)),
        )
        .unwrap()
    }

    fn snapshot() -> MetricsSnapshot {
        MetricsSnapshot::new(Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap())
    }

    fn post(title: &str, author: &str, score: i64, views: u64) -> PostSummary {
        PostSummary {
            title: title.into(),
            author_name: author.into(),
            score,
            view_count: views,
        }
    }

    #[test]
    fn all_disabled_renders_every_row_off() {
        let cfg = config(&[], 40);
        let frame = render(&snapshot(), &cfg).unwrap();

        assert_eq!(frame.table.rows.len(), MetricId::ALL.len());
        assert!(frame.table.rows.iter().all(|r| r.cell == Cell::Off));
        assert!(frame.details.is_empty());
        assert_eq!(frame.header.last_updated, "2024-05-01 09:30:00");
    }

    #[test]
    fn values_failures_and_off_are_distinct() {
        let cfg = config(&[MetricId::Dau, MetricId::NewPosts], 40);
        let mut snap = snapshot();
        snap.values.insert(MetricId::Dau, Ok(MetricValue::Count(0)));
        snap.values.insert(
            MetricId::NewPosts,
            Err(CollectionError::Query {
                metric: MetricId::NewPosts,
                cause: QueryError::Execution("timeout".into()),
            }),
        );

        let frame = render(&snap, &cfg).unwrap();
        let cell = |id: MetricId| {
            frame
                .table
                .rows
                .iter()
                .find(|r| r.metric == id)
                .map(|r| r.cell.clone())
                .unwrap()
        };

        assert_eq!(cell(MetricId::Dau), Cell::Value("0".into()));
        assert!(matches!(cell(MetricId::NewPosts), Cell::Failed(msg) if msg.contains("timeout")));
        assert_eq!(cell(MetricId::MessagesSent), Cell::Off);
        assert_eq!(cell(MetricId::NewPosts).value_text(), "ERROR");
        assert_eq!(cell(MetricId::MessagesSent).status_text(), "OFF");
    }

    #[test]
    fn top_posts_panel_keeps_order_and_truncates() {
        let cfg = config(&[MetricId::TopPosts], 12);
        let mut snap = snapshot();
        snap.values.insert(
            MetricId::TopPosts,
            Ok(MetricValue::RankedList(vec![
                post("Mini fridge for the dorm", "jo", 12, 300),
                post("Tutor", "li", 9, 1_200),
                post("Ride to SFO", "mo", -1, 4),
            ])),
        );

        let frame = render(&snap, &cfg).unwrap();
        assert_eq!(frame.details.len(), 1);
        let DetailPanel::TopPosts(panel) = &frame.details[0];
        let titles: Vec<&str> = panel.entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Mini frid...", "Tutor", "Ride to SFO"]);
        assert_eq!(panel.entries[1].author, "li");
        assert_eq!(panel.entries[1].views, "1,200");
        assert_eq!(panel.entries[2].score, "-1");
        assert_eq!(
            panel.entries.iter().map(|e| e.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );

        let row = frame.table.rows.iter().find(|r| r.metric == MetricId::TopPosts).unwrap();
        assert_eq!(row.cell, Cell::Value("3".into()));
    }

    #[test]
    fn empty_top_posts_still_gets_a_panel() {
        let cfg = config(&[MetricId::TopPosts], 40);
        let mut snap = snapshot();
        snap.values
            .insert(MetricId::TopPosts, Ok(MetricValue::RankedList(Vec::new())));
        let frame = render(&snap, &cfg).unwrap();
        assert!(matches!(&frame.details[..], [DetailPanel::TopPosts(p)] if p.entries.is_empty()));
    }

    #[test]
    fn failed_top_posts_has_no_panel() {
        let cfg = config(&[MetricId::TopPosts], 40);
        let mut snap = snapshot();
        snap.values.insert(
            MetricId::TopPosts,
            Err(CollectionError::Query {
                metric: MetricId::TopPosts,
                cause: QueryError::Closed,
            }),
        );
        let frame = render(&snap, &cfg).unwrap();
        assert!(frame.details.is_empty());
    }

    #[test]
    fn render_is_idempotent() {
        let cfg = config(&[MetricId::Dau, MetricId::TopPosts], 40);
        let mut snap = snapshot();
        snap.values.insert(MetricId::Dau, Ok(MetricValue::Count(1_024)));
        snap.values.insert(
            MetricId::TopPosts,
            Ok(MetricValue::RankedList(vec![post("Lamp", "ed", 2, 2)])),
        );
        assert_eq!(render(&snap, &cfg).unwrap(), render(&snap, &cfg).unwrap());
    }

    #[test]
    fn shape_mismatch_is_reported() {
        let cfg = config(&[MetricId::Dau], 40);
        let mut snap = snapshot();
        snap.values
            .insert(MetricId::Dau, Ok(MetricValue::RankedList(Vec::new())));
        let err = render(&snap, &cfg).unwrap_err();
        assert_eq!(
            err,
            RenderError::ShapeMismatch {
                metric: MetricId::Dau,
                expected: pulse_core::metric::MetricShape::Count,
                found: pulse_core::metric::MetricShape::RankedList,
            }
        );
    }

    #[test]
    fn custom_metric_list_limits_rows() {
        let renderer = DashboardRenderer::new(vec![MetricId::UserRegistrations, MetricId::Dau]);
        let frame = renderer.render(&snapshot(), &config(&[], 40)).unwrap();
        let ids: Vec<MetricId> = frame.table.rows.iter().map(|r| r.metric).collect();
        assert_eq!(ids, vec![MetricId::UserRegistrations, MetricId::Dau]);
    }
}
