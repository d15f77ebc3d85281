use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};

use crate::error::CollectionError;

/// Maximum number of posts carried by a ranked list.
pub const TOP_POSTS_LIMIT: usize = 5;

/// Identifier of one dashboard metric.
///
/// The set is closed: every variant has an evaluator in
/// [`MetricRegistry::builtin`](crate::registry::MetricRegistry::builtin).
/// Configuration may still name metrics outside this set; those are kept as
/// plain keys and treated as disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricId {
    Dau,
    NewPosts,
    MessagesSent,
    TopPosts,
    ActiveUniversities,
    UserRegistrations,
}

impl MetricId {
    /// All metrics in dashboard display order.
    pub const ALL: [MetricId; 6] = [
        MetricId::Dau,
        MetricId::NewPosts,
        MetricId::MessagesSent,
        MetricId::TopPosts,
        MetricId::ActiveUniversities,
        MetricId::UserRegistrations,
    ];

    /// Canonical lowercase key used in config files and logs.
    pub fn key(self) -> &'static str {
        match self {
            Self::Dau => "dau",
            Self::NewPosts => "new_posts",
            Self::MessagesSent => "messages_sent",
            Self::TopPosts => "top_posts",
            Self::ActiveUniversities => "active_universities",
            Self::UserRegistrations => "user_registrations",
        }
    }

    /// Human-readable row label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Dau => "Daily Active Users",
            Self::NewPosts => "New Posts Today",
            Self::MessagesSent => "Messages Sent Today",
            Self::TopPosts => "Top Posts Today",
            Self::ActiveUniversities => "Active Universities",
            Self::UserRegistrations => "New Registrations",
        }
    }

    /// Shape of the value this metric produces.
    pub fn shape(self) -> MetricShape {
        match self {
            Self::TopPosts => MetricShape::RankedList,
            _ => MetricShape::Count,
        }
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for MetricId {
    type Err = String;

    /// Accepts the canonical key (`new_posts`) or the flag name
    /// (`METRIC_NEW_POSTS`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = metric_key(s);
        MetricId::ALL
            .into_iter()
            .find(|id| id.key() == key)
            .ok_or_else(|| format!("unknown metric: {s}"))
    }
}

/// Normalize a metric name or `METRIC_*` flag to its canonical key.
pub fn metric_key(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    match lower.strip_prefix("metric_") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

/// The two kinds of value a metric can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricShape {
    Count,
    RankedList,
}

impl fmt::Display for MetricShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count => f.write_str("count"),
            Self::RankedList => f.write_str("ranked list"),
        }
    }
}

/// One post as shown in the top-posts panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSummary {
    pub title: String,
    pub author_name: String,
    pub score: i64,
    pub view_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricValue {
    Count(u64),
    RankedList(Vec<PostSummary>),
}

impl MetricValue {
    pub fn shape(&self) -> MetricShape {
        match self {
            Self::Count(_) => MetricShape::Count,
            Self::RankedList(_) => MetricShape::RankedList,
        }
    }
}

/// How a single metric appears in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricEntry<'a> {
    /// Not enabled, so never collected.
    Disabled,
    /// Enabled, but collection failed this tick.
    Failed(&'a CollectionError),
    Value(&'a MetricValue),
}

/// Results of one collection pass.
///
/// Holds an entry for every enabled metric and nothing else.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub collected_at: DateTime<Local>,
    pub values: BTreeMap<MetricId, Result<MetricValue, CollectionError>>,
}

impl MetricsSnapshot {
    pub fn new(collected_at: DateTime<Local>) -> Self {
        Self {
            collected_at,
            values: BTreeMap::new(),
        }
    }

    pub fn entry(&self, id: MetricId) -> MetricEntry<'_> {
        match self.values.get(&id) {
            None => MetricEntry::Disabled,
            Some(Err(err)) => MetricEntry::Failed(err),
            Some(Ok(value)) => MetricEntry::Value(value),
        }
    }

    /// Number of enabled metrics that failed.
    pub fn failure_count(&self) -> usize {
        self.values.values().filter(|v| v.is_err()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
