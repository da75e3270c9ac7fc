//! Ingestion storage for one asynchronous instrument.
//!
//! Asynchronous instruments report absolute values, while collectors may
//! want deltas, so every observation is diffed against the last absolute
//! value before it reaches the temporal layer. Both maps live under one
//! lock: a concurrent drain never observes a half-updated pair.

use crate::core::types::{InstrumentDescriptor, InstrumentValueType, Number};
use crate::metrics::aggregate::{Aggregation, AggregationConfig, AggregationKind};
use crate::metrics::attributes::AttributeSet;
use crate::metrics::data::MetricData;
use crate::storage::attributes_map::AttributesHashMap;
use crate::storage::collector::CollectorHandle;
use crate::storage::temporal::TemporalMetricStorage;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;

/// The cumulative/delta map pair, always mutated as one unit.
#[derive(Debug, Default)]
struct Maps {
    /// Latest absolute aggregation per attribute set.
    cumulative: AttributesHashMap,
    /// Unreported incremental aggregation per attribute set since the
    /// last drain.
    delta: AttributesHashMap,
}

/// Ingestion entry point for one asynchronous instrument.
///
/// Exclusively owned by its instrument; `record_*` runs from callback
/// execution threads and [`collect`](Self::collect) from reader threads,
/// concurrently.
pub struct AsyncMetricStorage {
    descriptor: InstrumentDescriptor,
    aggregation_kind: AggregationKind,
    config: AggregationConfig,
    maps: Mutex<Maps>,
    temporal: TemporalMetricStorage,
}

impl AsyncMetricStorage {
    /// Creates a storage with an explicit aggregation policy and config.
    pub fn new(
        descriptor: InstrumentDescriptor,
        aggregation_kind: AggregationKind,
        config: AggregationConfig,
    ) -> Self {
        Self {
            temporal: TemporalMetricStorage::new(descriptor.clone()),
            descriptor,
            aggregation_kind,
            config,
            maps: Mutex::new(Maps::default()),
        }
    }

    /// Creates a storage with the standard policy for the descriptor's
    /// instrument kind.
    pub fn with_default_aggregation(descriptor: InstrumentDescriptor) -> Self {
        let kind = AggregationKind::default_for(descriptor.kind());
        Self::new(descriptor, kind, AggregationConfig::default())
    }

    /// The instrument this storage aggregates for.
    pub fn descriptor(&self) -> &InstrumentDescriptor {
        &self.descriptor
    }

    /// Records a batch of integer observations. A no-op if the instrument
    /// declares floating-point values: one mistyped callback must not
    /// abort the whole batch cycle.
    pub fn record_long(
        &self,
        measurements: &[(AttributeSet, i64)],
        _observation_time: SystemTime,
    ) {
        if self.descriptor.value_type() != InstrumentValueType::Long {
            debug!(
                instrument = self.descriptor.name(),
                "dropping integer batch for a floating-point instrument"
            );
            return;
        }
        self.record(
            measurements
                .iter()
                .map(|(attrs, value)| (attrs.clone(), Number::Long(*value))),
        );
    }

    /// Records a batch of floating-point observations. A no-op if the
    /// instrument declares integer values.
    pub fn record_double(
        &self,
        measurements: &[(AttributeSet, f64)],
        _observation_time: SystemTime,
    ) {
        if self.descriptor.value_type() != InstrumentValueType::Double {
            debug!(
                instrument = self.descriptor.name(),
                "dropping floating-point batch for an integer instrument"
            );
            return;
        }
        self.record(
            measurements
                .iter()
                .map(|(attrs, value)| (attrs.clone(), Number::Double(*value))),
        );
    }

    fn record(&self, measurements: impl Iterator<Item = (AttributeSet, Number)>) {
        let mut guard = self.maps.lock();
        let maps = &mut *guard;

        for (attributes, value) in measurements {
            let mut fresh = Aggregation::new(self.aggregation_kind, &self.descriptor, &self.config);
            fresh.aggregate(value);

            let delta = maps
                .cumulative
                .get(&attributes)
                .map(|prev| prev.diff(&fresh));
            match delta {
                Some(Some(delta)) => {
                    maps.cumulative.set(attributes.clone(), fresh);
                    // Unreported deltas from an earlier batch accumulate
                    // rather than being overwritten, so a drain between
                    // any two batches reports the exact total.
                    match maps.delta.get_mut(&attributes) {
                        Some(existing) => existing.merge(&delta),
                        None => maps.delta.set(attributes, delta),
                    }
                },
                // Policy mismatch; cannot happen for one instrument.
                Some(None) => {},
                None => {
                    // First observation of this attribute set: its entire
                    // value is its own delta.
                    maps.cumulative.set(attributes.clone(), fresh.clone());
                    maps.delta.set(attributes, fresh);
                },
            }
        }
    }

    /// Drains the unreported deltas atomically and hands them to the
    /// temporal layer for reconciliation and emission.
    ///
    /// Returns the sink callback's verdict, per
    /// [`TemporalMetricStorage::build_metrics`].
    pub fn collect<F>(
        &self,
        collector: &dyn CollectorHandle,
        all_collectors: &[Arc<dyn CollectorHandle>],
        sdk_start: SystemTime,
        collection_ts: SystemTime,
        callback: F,
    ) -> bool
    where
        F: FnMut(MetricData) -> bool,
    {
        let drained = self.maps.lock().delta.swap_out();
        self.temporal.build_metrics(
            collector,
            all_collectors,
            sdk_start,
            collection_ts,
            drained,
            callback,
        )
    }

    /// The temporal reconciliation state, for registrar-side maintenance
    /// such as dropping deregistered collectors.
    pub fn temporal(&self) -> &TemporalMetricStorage {
        &self.temporal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{InstrumentKind, Temporality};
    use crate::metrics::data::{MetricPoint, PointValue};
    use crate::storage::collector::{CollectorId, SimpleCollector};

    fn long_counter_storage() -> AsyncMetricStorage {
        AsyncMetricStorage::with_default_aggregation(InstrumentDescriptor::new(
            "requests_total",
            InstrumentKind::Counter,
            InstrumentValueType::Long,
        ))
    }

    fn attrs() -> AttributeSet {
        [("route", "/api")].into_iter().collect()
    }

    fn collect_points(
        storage: &AsyncMetricStorage,
        collector: &Arc<SimpleCollector>,
    ) -> Vec<MetricPoint> {
        let all: Vec<Arc<dyn CollectorHandle>> = vec![Arc::clone(collector) as _];
        let mut out = Vec::new();
        storage.collect(
            collector.as_ref(),
            &all,
            SystemTime::UNIX_EPOCH,
            SystemTime::now(),
            |data| {
                out = data.points;
                true
            },
        );
        out
    }

    #[test]
    fn test_first_observation_is_its_own_delta() {
        let storage = long_counter_storage();
        let collector = Arc::new(SimpleCollector::new(CollectorId::new(1), Temporality::Delta));

        storage.record_long(&[(attrs(), 42)], SystemTime::now());

        let points = collect_points(&storage, &collector);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, PointValue::Sum(Number::Long(42)));
    }

    #[test]
    fn test_absolute_observations_become_deltas() {
        let storage = long_counter_storage();
        let collector = Arc::new(SimpleCollector::new(CollectorId::new(1), Temporality::Delta));

        storage.record_long(&[(attrs(), 10)], SystemTime::now());
        let points = collect_points(&storage, &collector);
        assert_eq!(points[0].value, PointValue::Sum(Number::Long(10)));

        // The instrument reports the absolute value 25; the collector
        // sees only the increase.
        storage.record_long(&[(attrs(), 25)], SystemTime::now());
        let points = collect_points(&storage, &collector);
        assert_eq!(points[0].value, PointValue::Sum(Number::Long(15)));
    }

    #[test]
    fn test_multiple_batches_between_drains_accumulate() {
        let storage = long_counter_storage();
        let collector = Arc::new(SimpleCollector::new(CollectorId::new(1), Temporality::Delta));

        storage.record_long(&[(attrs(), 10)], SystemTime::now());
        storage.record_long(&[(attrs(), 17)], SystemTime::now());
        storage.record_long(&[(attrs(), 20)], SystemTime::now());

        // One drain covers all three batches: 10 + 7 + 3.
        let points = collect_points(&storage, &collector);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, PointValue::Sum(Number::Long(20)));
    }

    #[test]
    fn test_mistyped_batch_is_dropped_silently() {
        let storage = long_counter_storage();
        let collector = Arc::new(SimpleCollector::new(CollectorId::new(1), Temporality::Delta));

        storage.record_double(&[(attrs(), 1.5)], SystemTime::now());

        let points = collect_points(&storage, &collector);
        assert!(points.is_empty());
    }

    #[test]
    fn test_streams_are_keyed_by_attribute_content() {
        let storage = long_counter_storage();
        let collector = Arc::new(SimpleCollector::new(CollectorId::new(1), Temporality::Delta));

        let a: AttributeSet = [("host", "a"), ("region", "eu")].into_iter().collect();
        let b: AttributeSet = [("region", "eu"), ("host", "a")].into_iter().collect();

        storage.record_long(&[(a, 3)], SystemTime::now());
        storage.record_long(&[(b, 8)], SystemTime::now());

        // Same content, same stream: one point carrying the full delta.
        let points = collect_points(&storage, &collector);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, PointValue::Sum(Number::Long(8)));
    }

    #[test]
    fn test_gauge_storage_reports_last_reading() {
        let storage = AsyncMetricStorage::with_default_aggregation(InstrumentDescriptor::new(
            "temperature",
            InstrumentKind::Gauge,
            InstrumentValueType::Double,
        ));
        let collector = Arc::new(SimpleCollector::new(CollectorId::new(1), Temporality::Delta));

        storage.record_double(&[(attrs(), 20.5)], SystemTime::now());
        storage.record_double(&[(attrs(), 21.25)], SystemTime::now());

        let points = collect_points(&storage, &collector);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, PointValue::LastValue(Number::Double(21.25)));
    }

    #[test]
    fn test_drop_aggregation_produces_no_points() {
        let storage = AsyncMetricStorage::new(
            InstrumentDescriptor::new(
                "ignored",
                InstrumentKind::Counter,
                InstrumentValueType::Long,
            ),
            AggregationKind::Drop,
            AggregationConfig::default(),
        );
        let collector = Arc::new(SimpleCollector::new(CollectorId::new(1), Temporality::Delta));

        storage.record_long(&[(attrs(), 42)], SystemTime::now());

        let points = collect_points(&storage, &collector);
        assert!(points.is_empty());
    }
}
