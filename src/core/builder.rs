use std::sync::Arc;

use crate::core::ExecutorConfig;
use crate::core::backend::Backends;
use crate::core::executor::AsyncExecutor;
use crate::core::pool::Shared;
use crate::core::registry::Registry;
use crate::core::stats::Counters;
use crate::events::Bus;
use crate::monitor::{ResourceMonitor, ResourceProbe, SysinfoProbe};
use crate::queue::TaskQueue;
use crate::rate_limit::RateLimiter;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for constructing an [`AsyncExecutor`] with optional features.
pub struct ExecutorBuilder {
    cfg: ExecutorConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    probe: Option<Box<dyn ResourceProbe>>,
}

impl ExecutorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: ExecutorConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            probe: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (submissions, attempts, retries, shutdown)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one event subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Replaces the `sysinfo` probe used by the resource monitor and per-task memory deltas.
    pub fn with_probe(mut self, probe: Box<dyn ResourceProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Builds the executor.
    ///
    /// Spawns subscriber workers, so it must be called within a Tokio runtime.
    /// The built-in `LogWriter` is attached first when `log_events` is set.
    pub fn build(self) -> Arc<AsyncExecutor> {
        let cfg = self.cfg;
        let bus = Bus::new(cfg.bus_capacity_clamped());

        #[allow(unused_mut)]
        let mut subscribers = self.subscribers;
        #[cfg(feature = "logging")]
        if cfg.log_events {
            subscribers.insert(0, Arc::new(crate::subscribers::LogWriter::new()));
        }
        let subs = (!subscribers.is_empty())
            .then(|| SubscriberSet::new(subscribers, bus.clone()));

        let probe = self
            .probe
            .unwrap_or_else(|| Box::new(SysinfoProbe::new()));
        let monitor = ResourceMonitor::with_probe(cfg.monitor, probe, Some(bus.clone()));

        let shared = Arc::new(Shared {
            queue: TaskQueue::new(cfg.queue_limits),
            registry: Registry::new(cfg.retention_limit()),
            limiter: RateLimiter::from_config(cfg.rate_limit),
            monitor,
            backends: Backends::new(&cfg),
            counters: Counters::default(),
            bus,
            cfg,
        });
        Arc::new(AsyncExecutor::new_internal(shared, subs))
    }
}
