//! Built-in metric evaluators.
//!
//! Every query compares against `CURRENT_DATE`, so "today" follows the
//! session time zone the source was opened with.

use crate::error::QueryError;
use crate::evaluator::Evaluator;
use crate::metric::{MetricId, MetricValue, PostSummary, TOP_POSTS_LIMIT};
use crate::source::{Query, QuerySource, Row};

pub const DAU_QUERY: Query = Query {
    name: "dau",
    sql: "SELECT COUNT(DISTINCT user_id) AS count FROM ( \
            SELECT user_id FROM posts WHERE DATE(created_at) = CURRENT_DATE \
            UNION \
            SELECT sender_id AS user_id FROM messages WHERE DATE(created_at) = CURRENT_DATE \
            UNION \
            SELECT receiver_id AS user_id FROM messages WHERE DATE(created_at) = CURRENT_DATE \
          ) active_users",
};

pub const NEW_POSTS_QUERY: Query = Query {
    name: "new_posts",
    sql: "SELECT COUNT(*) AS count FROM posts WHERE DATE(created_at) = CURRENT_DATE",
};

pub const MESSAGES_SENT_QUERY: Query = Query {
    name: "messages_sent",
    sql: "SELECT COUNT(*) AS count FROM messages WHERE DATE(created_at) = CURRENT_DATE",
};

pub const USER_REGISTRATIONS_QUERY: Query = Query {
    name: "user_registrations",
    sql: "SELECT COUNT(*) AS count FROM users WHERE DATE(created_at) = CURRENT_DATE",
};

pub const ACTIVE_UNIVERSITIES_QUERY: Query = Query {
    name: "active_universities",
    sql: "SELECT COUNT(DISTINCT u.university_id) AS count FROM users u \
          INNER JOIN ( \
            SELECT user_id FROM posts WHERE DATE(created_at) = CURRENT_DATE \
            UNION \
            SELECT sender_id AS user_id FROM messages WHERE DATE(created_at) = CURRENT_DATE \
          ) active ON u.id = active.user_id",
};

pub const TOP_POSTS_QUERY: Query = Query {
    name: "top_posts",
    sql: "SELECT title, author_name, score, view_count FROM posts \
          WHERE DATE(created_at) = CURRENT_DATE \
          ORDER BY score DESC, view_count DESC, id ASC \
          LIMIT 5",
};

/// A metric answered by a single `count` column in a single row.
pub struct CountMetric {
    id: MetricId,
    query: Query,
}

impl CountMetric {
    pub fn new(id: MetricId, query: Query) -> Self {
        Self { id, query }
    }
}

impl Evaluator for CountMetric {
    fn id(&self) -> MetricId {
        self.id
    }

    fn evaluate(&self, source: &mut dyn QuerySource) -> Result<MetricValue, QueryError> {
        let rows = source.execute(&self.query)?;
        let row = rows.first().ok_or(QueryError::EmptyResult)?;
        Ok(MetricValue::Count(row.count("count")?))
    }
}

/// Today's highest-scoring posts.
pub struct TopPostsMetric {
    query: Query,
    limit: usize,
}

impl TopPostsMetric {
    pub fn new(query: Query, limit: usize) -> Self {
        Self { query, limit }
    }
}

impl Default for TopPostsMetric {
    fn default() -> Self {
        Self::new(TOP_POSTS_QUERY, TOP_POSTS_LIMIT)
    }
}

impl Evaluator for TopPostsMetric {
    fn id(&self) -> MetricId {
        MetricId::TopPosts
    }

    fn evaluate(&self, source: &mut dyn QuerySource) -> Result<MetricValue, QueryError> {
        let rows = source.execute(&self.query)?;
        let posts = rows
            .iter()
            .map(post_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MetricValue::RankedList(rank_posts(posts, self.limit)))
    }
}

fn post_from_row(row: &Row) -> Result<PostSummary, QueryError> {
    Ok(PostSummary {
        title: row.text("title")?.to_string(),
        author_name: row.text("author_name")?.to_string(),
        score: row.int("score")?,
        view_count: row.count("view_count")?,
    })
}

/// Order posts by score, then views, both descending, and keep `limit`.
///
/// The sort is stable, so posts tied on both keys keep the order the source
/// returned them in.
pub fn rank_posts(mut posts: Vec<PostSummary>, limit: usize) -> Vec<PostSummary> {
    posts.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.view_count.cmp(&a.view_count))
    });
    posts.truncate(limit);
    posts
}

/// Evaluators for every [`MetricId`], in display order.
pub fn builtin_evaluators() -> Vec<Box<dyn Evaluator>> {
    vec![
        Box::new(CountMetric::new(MetricId::Dau, DAU_QUERY)),
        Box::new(CountMetric::new(MetricId::NewPosts, NEW_POSTS_QUERY)),
        Box::new(CountMetric::new(MetricId::MessagesSent, MESSAGES_SENT_QUERY)),
        Box::new(TopPostsMetric::default()),
        Box::new(CountMetric::new(
            MetricId::ActiveUniversities,
            ACTIVE_UNIVERSITIES_QUERY,
        )),
        Box::new(CountMetric::new(
            MetricId::UserRegistrations,
            USER_REGISTRATIONS_QUERY,
        )),
    ]
}
