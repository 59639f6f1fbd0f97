use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Which source a dispatch was selected from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchSource {
    Inbox,
    Event,
    Internal,
    Channel,
}

/// Per-source dispatch counts plus chain depth
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchCounts {
    pub inbox_messages: u64,
    pub events: u64,
    pub internal_messages: u64,
    pub channel_items: u64,
    /// Total handler invocations inside topic-dispatch chains
    pub chain_steps: u64,
}

/// Handler timing across the run
#[derive(Debug, Clone, Default, Serialize)]
pub struct HandlerTimings {
    pub total_dispatches: u64,
    #[serde(with = "duration_serde")]
    pub total_processing_time: Duration,
    #[serde(with = "duration_serde")]
    pub max_processing_time: Duration,
    #[serde(with = "option_duration_serde")]
    pub min_processing_time: Option<Duration>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchMetrics {
    pub counts: DispatchCounts,
    pub timings: HandlerTimings,
    pub start_time: DateTime<Utc>,
    pub last_dispatch: Option<DateTime<Utc>>,
    pub uptime_secs: u64,
}

impl Default for DispatchMetrics {
    fn default() -> Self {
        Self {
            counts: DispatchCounts::default(),
            timings: HandlerTimings::default(),
            start_time: Utc::now(),
            last_dispatch: None,
            uptime_secs: 0,
        }
    }
}

/// Shared, cloneable metrics recorder for one actor run
#[derive(Clone)]
pub struct MetricsCollector {
    metrics: Arc<RwLock<DispatchMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(DispatchMetrics::default())),
        }
    }

    /// Record one select-loop dispatch: its source, how many handler
    /// invocations it triggered, and how long the handlers ran
    pub async fn record_dispatch(&self, source: DispatchSource, steps: u64, duration: Duration) {
        let mut metrics = self.metrics.write().await;
        match source {
            DispatchSource::Inbox => metrics.counts.inbox_messages += 1,
            DispatchSource::Event => metrics.counts.events += 1,
            DispatchSource::Internal => metrics.counts.internal_messages += 1,
            DispatchSource::Channel => metrics.counts.channel_items += 1,
        }
        metrics.counts.chain_steps += steps;
        metrics.timings.total_dispatches += 1;
        metrics.timings.total_processing_time += duration;
        if duration > metrics.timings.max_processing_time {
            metrics.timings.max_processing_time = duration;
        }
        metrics.timings.min_processing_time = Some(
            metrics
                .timings
                .min_processing_time
                .map_or(duration, |min| min.min(duration)),
        );
        metrics.last_dispatch = Some(Utc::now());
    }

    /// Snapshot the current metrics
    pub async fn get_metrics(&self) -> DispatchMetrics {
        let mut snapshot = self.metrics.read().await.clone();
        snapshot.uptime_secs = (Utc::now() - snapshot.start_time).num_seconds().max(0) as u64;
        snapshot
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

mod duration_serde {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}

mod option_duration_serde {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }
}
