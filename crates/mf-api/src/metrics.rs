//! Prometheus counters served at `/metrics`.

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct LimiterLabels {
    pub limiter: String,
}

pub struct Metrics {
    registry: Registry,
    pub threads_created: Counter,
    pub threads_deleted: Counter,
    pub replies_created: Counter,
    pub replies_deleted: Counter,
    rate_limited: Family<LimiterLabels, Counter>,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("forum");

        let threads_created = Counter::default();
        let threads_deleted = Counter::default();
        let replies_created = Counter::default();
        let replies_deleted = Counter::default();
        let rate_limited = Family::<LimiterLabels, Counter>::default();

        registry.register("threads_created", "Threads created", threads_created.clone());
        registry.register("threads_deleted", "Threads deleted", threads_deleted.clone());
        registry.register("replies_created", "Replies created", replies_created.clone());
        registry.register("replies_deleted", "Replies deleted", replies_deleted.clone());
        registry.register(
            "rate_limited",
            "Requests rejected by a rate limiter",
            rate_limited.clone(),
        );

        Self {
            registry,
            threads_created,
            threads_deleted,
            replies_created,
            replies_deleted,
            rate_limited,
        }
    }

    pub fn record_rate_limited(&self, limiter: &str) {
        self.rate_limited
            .get_or_create(&LimiterLabels {
                limiter: limiter.to_string(),
            })
            .inc();
    }

    /// OpenMetrics text exposition of every registered metric.
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_includes_counters_and_labels() {
        let metrics = Metrics::new();
        metrics.threads_created.inc();
        metrics.record_rate_limited("post");
        metrics.record_rate_limited("post");

        let body = metrics.encode().unwrap();
        assert!(body.contains("forum_threads_created_total 1"));
        assert!(body.contains("forum_rate_limited_total{limiter=\"post\"} 2"));
        assert!(body.contains("forum_replies_deleted_total 0"));
    }
}
