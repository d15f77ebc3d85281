//! Toolkit-agnostic description of one dashboard screen.
//!
//! A [`Frame`] is plain data derived from a snapshot. It owns no live state,
//! so two frames built from the same inputs compare equal.

use pulse_core::MetricId;

pub const DASHBOARD_TITLE: &str = "Campus Pulse Analytics Dashboard";
pub const TABLE_TITLE: &str = "Live Metrics";
pub const TOP_POSTS_TITLE: &str = "Top Posts Today";
pub const NO_POSTS_TEXT: &str = "No posts today";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: Header,
    pub table: MetricsTable,
    pub details: Vec<DetailPanel>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub title: String,
    /// Formatted snapshot timestamp.
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsTable {
    pub title: String,
    pub rows: Vec<MetricRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricRow {
    pub metric: MetricId,
    pub label: &'static str,
    pub cell: Cell,
}

/// What the value and status columns show for one metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// Enabled and collected.
    Value(String),
    /// Enabled, but collection failed; carries the error text.
    Failed(String),
    /// Not enabled.
    Off,
}

impl Cell {
    /// Text for the value column.
    pub fn value_text(&self) -> &str {
        match self {
            Cell::Value(v) => v,
            Cell::Failed(_) => "ERROR",
            Cell::Off => "-",
        }
    }

    /// Text for the status column.
    pub fn status_text(&self) -> &'static str {
        match self {
            Cell::Value(_) => "ON",
            Cell::Failed(_) => "FAIL",
            Cell::Off => "OFF",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailPanel {
    TopPosts(TopPostsPanel),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopPostsPanel {
    pub title: String,
    /// Empty when no posts exist today.
    pub entries: Vec<PostLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostLine {
    /// 1-based position.
    pub rank: usize,
    /// Already truncated to the configured width.
    pub title: String,
    pub author: String,
    pub score: String,
    pub views: String,
}
