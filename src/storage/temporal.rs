//! Multi-reader temporal reconciliation.
//!
//! Every drained delta batch is fanned out to *every* registered
//! collector's private unreported accumulator; only the invoking
//! collector's accumulator is then reported and reset. Collectors that
//! have not yet collected keep their share until they do, so no
//! contribution is lost, duplicated, or leaked across readers.

use crate::core::types::{InstrumentDescriptor, Temporality};
use crate::metrics::data::{MetricData, MetricPoint};
use crate::storage::attributes_map::AttributesHashMap;
use crate::storage::collector::{CollectorHandle, CollectorId};
use ahash::RandomState;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::trace;

/// Per-collector carry-over state, created lazily on first sight.
#[derive(Debug, Default)]
struct CollectorState {
    /// Deltas merged in but not yet reported to this collector.
    unreported: AttributesHashMap,
    /// Running totals already reported, for cumulative temporality only.
    last_cumulative: AttributesHashMap,
    /// When this collector last collected, for delta interval starts.
    last_collection_ts: Option<SystemTime>,
}

/// Reconciles drained deltas across all registered collectors.
///
/// The whole collector table sits behind one lock: step one of
/// [`build_metrics`](Self::build_metrics) writes into every collector's
/// accumulator, so concurrent invocations from two different collectors
/// touch the same entries and must serialize.
pub struct TemporalMetricStorage {
    descriptor: InstrumentDescriptor,
    collectors: Mutex<HashMap<CollectorId, CollectorState, RandomState>>,
}

impl TemporalMetricStorage {
    /// Creates the reconciliation state for one instrument.
    pub fn new(descriptor: InstrumentDescriptor) -> Self {
        Self {
            descriptor,
            collectors: Mutex::new(HashMap::default()),
        }
    }

    /// Merges `drained` into every collector's accumulator, then reports
    /// and resets the invoking collector's share.
    ///
    /// The batch is handed to `callback` exactly once; its return value is
    /// passed through. A rejected batch is not rolled back — emission is
    /// at-most-once from this storage's perspective, and later deltas
    /// accumulate normally for the next cycle.
    pub fn build_metrics<F>(
        &self,
        collector: &dyn CollectorHandle,
        all_collectors: &[Arc<dyn CollectorHandle>],
        sdk_start: SystemTime,
        collection_ts: SystemTime,
        drained: AttributesHashMap,
        mut callback: F,
    ) -> bool
    where
        F: FnMut(MetricData) -> bool,
    {
        let temporality = collector.temporality(self.descriptor.kind());
        let mut table = self.collectors.lock();

        // Step 1: fan the drained batch out to every registered collector,
        // not only the invoker. Collectors that collect later consume
        // their share then.
        if !drained.is_empty() {
            for handle in all_collectors {
                let state = table.entry(handle.id()).or_default();
                drained.for_each(|attrs, delta| match state.unreported.get_mut(attrs) {
                    Some(existing) => existing.merge(delta),
                    None => state.unreported.set(attrs.clone(), delta.clone()),
                });
            }
        }

        // Step 2: report and reset the invoking collector only.
        let state = table.entry(collector.id()).or_default();
        let start_time = match temporality {
            Temporality::Cumulative => sdk_start,
            Temporality::Delta => state.last_collection_ts.unwrap_or(sdk_start),
        };

        let to_report = state.unreported.swap_out();
        let mut points = Vec::with_capacity(to_report.len());
        for (attributes, aggregation) in to_report {
            let value = match temporality {
                Temporality::Cumulative => match state.last_cumulative.get_mut(&attributes) {
                    Some(total) => {
                        total.merge(&aggregation);
                        total.to_point()
                    },
                    None => {
                        let point = aggregation.to_point();
                        state.last_cumulative.set(attributes.clone(), aggregation);
                        point
                    },
                },
                Temporality::Delta => aggregation.to_point(),
            };
            if let Some(value) = value {
                points.push(MetricPoint { attributes, value });
            }
        }
        state.last_collection_ts = Some(collection_ts);
        drop(table);

        trace!(
            instrument = self.descriptor.name(),
            collector = collector.id().raw(),
            points = points.len(),
            "reconciled collection cycle"
        );

        callback(MetricData {
            descriptor: self.descriptor.clone(),
            temporality,
            start_time,
            end_time: collection_ts,
            points,
        })
    }

    /// Drops a deregistered collector's carry-over state. Called by the
    /// external registrar; nothing in this core invokes it.
    pub fn remove_collector(&self, id: CollectorId) {
        self.collectors.lock().remove(&id);
    }
}
