use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;
use crate::metric::{metric_key, MetricId};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_TIME_ZONE: &str = "UTC";
pub const DEFAULT_TITLE_WIDTH: usize = 40;
/// Narrowest title width that still leaves room for the ellipsis.
pub const MIN_TITLE_WIDTH: usize = 4;

/// Where the data store lives and who to log in as.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl ConnectionParams {
    /// `user@host:port/database`, safe to log.
    pub fn target(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"****")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOptions {
    /// Post titles wider than this are cut and end in `...`.
    pub title_width: usize,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            title_width: DEFAULT_TITLE_WIDTH,
        }
    }
}

/// Immutable dashboard configuration, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    connection: ConnectionParams,
    refresh_interval: Duration,
    time_zone: String,
    display: DisplayOptions,
    enabled_metrics: BTreeMap<String, bool>,
}

impl Config {
    /// Validate and build a configuration.
    ///
    /// Metric names are normalized to canonical keys (`METRIC_DAU` → `dau`).
    /// Names that match no known metric are kept so they can be reported, but
    /// never enable anything.
    pub fn new(
        connection: ConnectionParams,
        refresh_interval: Duration,
        time_zone: impl Into<String>,
        display: DisplayOptions,
        enabled_metrics: impl IntoIterator<Item = (String, bool)>,
    ) -> Result<Self, ConfigError> {
        if refresh_interval.is_zero() {
            return Err(ConfigError::NonPositiveInterval);
        }

        let time_zone = time_zone.into();
        validate_time_zone(&time_zone)?;

        if display.title_width < MIN_TITLE_WIDTH {
            return Err(ConfigError::Invalid {
                key: "title_width",
                value: display.title_width.to_string(),
                reason: format!("must be at least {MIN_TITLE_WIDTH}"),
            });
        }

        let enabled_metrics = enabled_metrics
            .into_iter()
            .map(|(name, on)| (metric_key(&name), on))
            .collect();

        Ok(Self {
            connection,
            refresh_interval,
            time_zone,
            display,
            enabled_metrics,
        })
    }

    pub fn connection(&self) -> &ConnectionParams {
        &self.connection
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    pub fn time_zone(&self) -> &str {
        &self.time_zone
    }

    pub fn display(&self) -> &DisplayOptions {
        &self.display
    }

    /// Metrics are opt-in: anything not explicitly enabled is off.
    pub fn is_enabled(&self, id: MetricId) -> bool {
        self.enabled_metrics.get(id.key()).copied().unwrap_or(false)
    }

    /// Enabled metrics in display order.
    pub fn enabled(&self) -> Vec<MetricId> {
        MetricId::ALL
            .into_iter()
            .filter(|id| self.is_enabled(*id))
            .collect()
    }

    /// Configured metric keys that name no known metric.
    pub fn unknown_metrics(&self) -> Vec<&str> {
        self.enabled_metrics
            .keys()
            .filter(|key| key.parse::<MetricId>().is_err())
            .map(String::as_str)
            .collect()
    }
}

/// Reject zone names that could not be an IANA name or UTC offset.
///
/// The data store has the final say on whether the zone exists; this only
/// keeps quoting characters out of the session setup statement.
fn validate_time_zone(tz: &str) -> Result<(), ConfigError> {
    let ok = !tz.is_empty()
        && tz
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '+' | '-' | ':'));
    if ok {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            key: "timezone",
            value: tz.to_string(),
            reason: "expected an IANA zone name such as Europe/Berlin".into(),
        })
    }
}

#[cfg(test)]
pub(crate) fn test_config(enabled: &[MetricId], interval: Duration) -> Config {
    Config::new(
        ConnectionParams {
            host: "localhost".into(),
            port: 5432,
            database: "campus".into(),
            user: "analytics".into(),
            password: "secret".into(),
        },
        interval,
        DEFAULT_TIME_ZONE,
        DisplayOptions::default(),
        enabled.iter().map(|id| (id.key().to_string(), true)),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ConnectionParams {
        ConnectionParams {
            host: "db.internal".into(),
            port: 5433,
            database: "campus".into(),
            user: "ro".into(),
            password: "hunter2".into(),
        }
    }

    fn build(
        interval: Duration,
        tz: &str,
        metrics: &[(&str, bool)],
    ) -> Result<Config, ConfigError> {
        Config::new(
            params(),
            interval,
            tz,
            DisplayOptions::default(),
            metrics.iter().map(|(k, v)| (k.to_string(), *v)),
        )
    }

    #[test]
    fn zero_interval_rejected() {
        let err = build(Duration::ZERO, "UTC", &[]).unwrap_err();
        assert_eq!(err, ConfigError::NonPositiveInterval);
    }

    #[test]
    fn smallest_interval_accepted() {
        let cfg = build(Duration::from_secs(1), "UTC", &[]).unwrap();
        assert_eq!(cfg.refresh_interval(), Duration::from_secs(1));
    }

    #[test]
    fn metrics_default_to_disabled() {
        let cfg = build(DEFAULT_REFRESH_INTERVAL, "UTC", &[]).unwrap();
        assert!(cfg.enabled().is_empty());
        for id in MetricId::ALL {
            assert!(!cfg.is_enabled(id));
        }
    }

    #[test]
    fn flag_names_are_normalized() {
        let cfg = build(
            DEFAULT_REFRESH_INTERVAL,
            "UTC",
            &[("METRIC_DAU", true), ("top_posts", true), ("new_posts", false)],
        )
        .unwrap();
        assert_eq!(cfg.enabled(), vec![MetricId::Dau, MetricId::TopPosts]);
    }

    #[test]
    fn unknown_metrics_are_kept_but_ignored() {
        let cfg = build(
            DEFAULT_REFRESH_INTERVAL,
            "UTC",
            &[("METRIC_FULFILLMENT_RATE", true), ("post_categories", true)],
        )
        .unwrap();
        assert!(cfg.enabled().is_empty());
        assert_eq!(cfg.unknown_metrics(), vec!["fulfillment_rate", "post_categories"]);
    }

    #[test]
    fn time_zone_with_quote_rejected() {
        let err = build(DEFAULT_REFRESH_INTERVAL, "UTC'; DROP", &[]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "timezone", .. }));
        assert!(build(DEFAULT_REFRESH_INTERVAL, "America/Los_Angeles", &[]).is_ok());
        assert!(build(DEFAULT_REFRESH_INTERVAL, "", &[]).is_err());
    }

    #[test]
    fn tiny_title_width_rejected() {
        let err = Config::new(
            params(),
            DEFAULT_REFRESH_INTERVAL,
            "UTC",
            DisplayOptions { title_width: 2 },
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "title_width", .. }));
    }

    #[test]
    fn debug_output_hides_password() {
        let shown = format!("{:?}", params());
        assert!(!shown.contains("hunter2"));
        assert_eq!(params().target(), "ro@db.internal:5433/campus");
    }
}
