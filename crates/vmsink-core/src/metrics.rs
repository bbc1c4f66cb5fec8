//! Metrics sources: the registry sampled on every due tick.
//!
//! [`PromRegistry`] keeps a Prometheus registry that is updated from the
//! operations carried by each tick and rendered in the text exposition
//! format. [`StaticMetrics`] serves a fixed exposition for tests and dry
//! runs.

use prometheus::{CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;
use vmsink_common::format::MANIFEST_PREFIX;

use crate::source::{MetricKind, MetricOperation, OpKind};

/// Errors from metrics sources.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("metric {name} is a {registered:?}, not a {requested:?}")]
    KindMismatch {
        name: String,
        registered: MetricKind,
        requested: MetricKind,
    },

    #[error("operation {op:?} is not valid for {kind:?} {name}")]
    InvalidOperation {
        name: String,
        kind: MetricKind,
        op: OpKind,
    },

    #[error("metric {name} expects labels {expected:?}")]
    LabelMismatch { name: String, expected: Vec<String> },

    #[error("exposition is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

impl From<MetricsError> for vmsink_common::Error {
    fn from(err: MetricsError) -> Self {
        vmsink_common::Error::MetricsSource(err.to_string())
    }
}

/// A registry that can be updated and rendered as a text exposition.
pub trait MetricsSource {
    /// Apply one registry update.
    fn apply(&mut self, operation: &MetricOperation) -> Result<(), MetricsError>;

    /// Current state as a text exposition.
    fn metrics(&self) -> Result<String, MetricsError>;
}

impl<M: MetricsSource + ?Sized> MetricsSource for Box<M> {
    fn apply(&mut self, operation: &MetricOperation) -> Result<(), MetricsError> {
        (**self).apply(operation)
    }

    fn metrics(&self) -> Result<String, MetricsError> {
        (**self).metrics()
    }
}

struct Family<V> {
    vec: V,
    label_names: Vec<String>,
}

impl<V> Family<V> {
    /// Label values of `op` in declaration order.
    fn label_values<'a>(&self, op: &'a MetricOperation) -> Result<Vec<&'a str>, MetricsError> {
        if op.labels.len() != self.label_names.len() {
            return Err(self.mismatch(op));
        }
        self.label_names
            .iter()
            .map(|name| {
                op.labels
                    .iter()
                    .find(|(k, _)| k == name)
                    .map(|(_, v)| v.as_str())
                    .ok_or_else(|| self.mismatch(op))
            })
            .collect()
    }

    fn mismatch(&self, op: &MetricOperation) -> MetricsError {
        MetricsError::LabelMismatch {
            name: op.name.clone(),
            expected: self.label_names.clone(),
        }
    }
}

/// Prometheus-backed registry.
///
/// Metric families are created on first use with the label names of that
/// first operation.
pub struct PromRegistry {
    registry: Registry,
    gauges: HashMap<String, Family<GaugeVec>>,
    counters: HashMap<String, Family<CounterVec>>,
}

impl PromRegistry {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            gauges: HashMap::new(),
            counters: HashMap::new(),
        }
    }

    /// Registry whose metrics all carry `labels`.
    pub fn with_common_labels<I, K, V>(labels: I) -> Result<Self, MetricsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let labels: HashMap<String, String> = labels
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let registry = if labels.is_empty() {
            Registry::new()
        } else {
            Registry::new_custom(None, Some(labels))?
        };
        Ok(Self {
            registry,
            gauges: HashMap::new(),
            counters: HashMap::new(),
        })
    }

    /// Registry carrying a `manifest{module_hash="…"} 1` gauge.
    pub fn with_manifest(module_hash: &str) -> Result<Self, MetricsError> {
        let mut registry = Self::new();
        registry.register_manifest(module_hash)?;
        Ok(registry)
    }

    pub fn register_manifest(&mut self, module_hash: &str) -> Result<(), MetricsError> {
        self.apply(&MetricOperation {
            name: MANIFEST_PREFIX.to_string(),
            kind: MetricKind::Gauge,
            op: OpKind::Set,
            value: 1.0,
            labels: vec![("module_hash".to_string(), module_hash.to_string())],
        })
    }

    /// Also expose `process_*` series for this process (CPU time, resident
    /// memory, open file descriptors). Only Linux has a collector; elsewhere
    /// this logs a warning and leaves the registry unchanged.
    pub fn register_process_collector(&mut self) -> Result<(), MetricsError> {
        #[cfg(target_os = "linux")]
        {
            let collector = prometheus::process_collector::ProcessCollector::for_self();
            self.registry.register(Box::new(collector))?;
            debug!("registered process collector");
        }
        #[cfg(not(target_os = "linux"))]
        tracing::warn!("process metrics are only collected on linux");
        Ok(())
    }

    fn check_kind(&self, op: &MetricOperation) -> Result<(), MetricsError> {
        let registered = match op.kind {
            MetricKind::Gauge if self.counters.contains_key(&op.name) => MetricKind::Counter,
            MetricKind::Counter if self.gauges.contains_key(&op.name) => MetricKind::Gauge,
            _ => return Ok(()),
        };
        Err(MetricsError::KindMismatch {
            name: op.name.clone(),
            registered,
            requested: op.kind,
        })
    }

    fn gauge_family(&mut self, op: &MetricOperation) -> Result<&Family<GaugeVec>, MetricsError> {
        if !self.gauges.contains_key(&op.name) {
            let label_names: Vec<String> = op.labels.iter().map(|(k, _)| k.clone()).collect();
            let names: Vec<&str> = label_names.iter().map(String::as_str).collect();
            let vec = GaugeVec::new(Opts::new(op.name.as_str(), op.name.as_str()), &names)?;
            self.registry.register(Box::new(vec.clone()))?;
            debug!(name = %op.name, "registered gauge");
            self.gauges
                .insert(op.name.clone(), Family { vec, label_names });
        }
        Ok(&self.gauges[&op.name])
    }

    fn counter_family(
        &mut self,
        op: &MetricOperation,
    ) -> Result<&Family<CounterVec>, MetricsError> {
        if !self.counters.contains_key(&op.name) {
            let label_names: Vec<String> = op.labels.iter().map(|(k, _)| k.clone()).collect();
            let names: Vec<&str> = label_names.iter().map(String::as_str).collect();
            let vec = CounterVec::new(Opts::new(op.name.as_str(), op.name.as_str()), &names)?;
            self.registry.register(Box::new(vec.clone()))?;
            debug!(name = %op.name, "registered counter");
            self.counters
                .insert(op.name.clone(), Family { vec, label_names });
        }
        Ok(&self.counters[&op.name])
    }
}

impl Default for PromRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSource for PromRegistry {
    fn apply(&mut self, op: &MetricOperation) -> Result<(), MetricsError> {
        self.check_kind(op)?;
        match op.kind {
            MetricKind::Gauge => {
                let family = self.gauge_family(op)?;
                let values = family.label_values(op)?;
                let gauge = family.vec.get_metric_with_label_values(&values)?;
                match op.op {
                    OpKind::Set => gauge.set(op.value),
                    OpKind::Inc => gauge.inc(),
                    OpKind::Dec => gauge.dec(),
                    OpKind::Add => gauge.add(op.value),
                }
            }
            MetricKind::Counter => {
                let invalid = match op.op {
                    OpKind::Set | OpKind::Dec => true,
                    OpKind::Add => op.value < 0.0 || op.value.is_nan(),
                    OpKind::Inc => false,
                };
                if invalid {
                    return Err(MetricsError::InvalidOperation {
                        name: op.name.clone(),
                        kind: op.kind,
                        op: op.op,
                    });
                }
                let family = self.counter_family(op)?;
                let values = family.label_values(op)?;
                let counter = family.vec.get_metric_with_label_values(&values)?;
                match op.op {
                    OpKind::Add => counter.inc_by(op.value),
                    _ => counter.inc(),
                }
            }
        }
        Ok(())
    }

    fn metrics(&self) -> Result<String, MetricsError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

/// Fixed exposition. Operations are accepted and ignored.
#[derive(Debug, Clone, Default)]
pub struct StaticMetrics {
    exposition: String,
}

impl StaticMetrics {
    pub fn new(exposition: impl Into<String>) -> Self {
        Self {
            exposition: exposition.into(),
        }
    }
}

impl MetricsSource for StaticMetrics {
    fn apply(&mut self, _operation: &MetricOperation) -> Result<(), MetricsError> {
        Ok(())
    }

    fn metrics(&self) -> Result<String, MetricsError> {
        Ok(self.exposition.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(name: &str, kind: MetricKind, op: OpKind, value: f64) -> MetricOperation {
        MetricOperation {
            name: name.to_string(),
            kind,
            op,
            value,
            labels: Vec::new(),
        }
    }

    #[test]
    fn test_gauge_set_and_exposition() {
        let mut registry = PromRegistry::new();
        registry
            .apply(&op("head_block_number", MetricKind::Gauge, OpKind::Set, 2500.0))
            .unwrap();
        let text = registry.metrics().unwrap();
        assert!(text.contains("# TYPE head_block_number gauge"));
        assert!(text.contains("head_block_number 2500"));
    }

    #[test]
    fn test_counter_rejects_set() {
        let mut registry = PromRegistry::new();
        let err = registry
            .apply(&op("transfers", MetricKind::Counter, OpKind::Set, 1.0))
            .unwrap_err();
        assert!(matches!(err, MetricsError::InvalidOperation { .. }));
    }

    #[test]
    fn test_kind_mismatch() {
        let mut registry = PromRegistry::new();
        registry
            .apply(&op("x", MetricKind::Gauge, OpKind::Inc, 0.0))
            .unwrap();
        let err = registry
            .apply(&op("x", MetricKind::Counter, OpKind::Inc, 0.0))
            .unwrap_err();
        assert!(matches!(err, MetricsError::KindMismatch { .. }));
    }

    #[test]
    fn test_labels_must_match_first_use() {
        let mut registry = PromRegistry::new();
        let mut labelled = op("transfers", MetricKind::Counter, OpKind::Inc, 0.0);
        labelled.labels = vec![("token".into(), "eos".into())];
        registry.apply(&labelled).unwrap();
        registry.apply(&labelled).unwrap();

        let bare = op("transfers", MetricKind::Counter, OpKind::Inc, 0.0);
        assert!(matches!(
            registry.apply(&bare),
            Err(MetricsError::LabelMismatch { .. })
        ));
        assert!(registry
            .metrics()
            .unwrap()
            .contains("transfers{token=\"eos\"} 2"));
    }

    #[test]
    fn test_common_labels_on_every_metric() {
        let mut registry = PromRegistry::with_common_labels([("chain", "eos")]).unwrap();
        registry
            .apply(&op("head_block_number", MetricKind::Gauge, OpKind::Set, 7.0))
            .unwrap();
        assert!(registry
            .metrics()
            .unwrap()
            .contains("head_block_number{chain=\"eos\"} 7"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_process_collector_adds_process_series() {
        let mut registry = PromRegistry::with_common_labels([("chain", "eos")]).unwrap();
        registry.register_process_collector().unwrap();
        let text = registry.metrics().unwrap();
        assert!(text.contains("# TYPE process_cpu_seconds_total counter"));
        assert!(text.contains("process_resident_memory_bytes{chain=\"eos\"}"));
    }

    #[test]
    fn test_manifest_line_present() {
        let registry = PromRegistry::with_manifest("abc123").unwrap();
        let text = registry.metrics().unwrap();
        assert!(text.contains("manifest{module_hash=\"abc123\"} 1"));
    }
}
