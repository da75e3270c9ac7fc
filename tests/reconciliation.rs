//! End-to-end reconciliation behavior across record and collect cycles,
//! exercised through the public API the way an SDK reader driver would.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Once};
use std::thread;
use std::time::SystemTime;

use pretty_assertions::assert_eq;

use omet::core::{
    InstrumentDescriptor, InstrumentKind, InstrumentValueType, Number, Temporality,
};
use omet::metrics::{AttributeSet, MetricPoint, PointValue};
use omet::storage::{AsyncMetricStorage, CollectorHandle, CollectorId, SimpleCollector};

/// Installs a test-writer subscriber so the record/collect paths' debug
/// events show up under `RUST_LOG` when a test fails.
fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

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

fn roster(handles: &[&Arc<SimpleCollector>]) -> Vec<Arc<dyn CollectorHandle>> {
    handles
        .iter()
        .map(|h| Arc::clone(*h) as Arc<dyn CollectorHandle>)
        .collect()
}

fn collect_points(
    storage: &AsyncMetricStorage,
    collector: &SimpleCollector,
    all: &[Arc<dyn CollectorHandle>],
) -> Vec<MetricPoint> {
    let mut out = Vec::new();
    let accepted = storage.collect(
        collector,
        all,
        SystemTime::UNIX_EPOCH,
        SystemTime::now(),
        |data| {
            out = data.points;
            true
        },
    );
    assert!(accepted);
    out
}

fn sum_value(points: &[MetricPoint]) -> i64 {
    points
        .iter()
        .filter_map(|p| p.value.as_long())
        .sum()
}

#[test]
fn delta_conservation_over_observation_sequence() {
    let storage = long_counter_storage();
    let collector = Arc::new(SimpleCollector::new(CollectorId::new(1), Temporality::Delta));
    let all = roster(&[&collector]);

    // Monotonic absolute readings, one drain covering the whole run.
    for absolute in [3, 10, 11, 40, 100] {
        storage.record_long(&[(attrs(), absolute)], SystemTime::now());
    }

    let points = collect_points(&storage, &collector, &all);
    assert_eq!(sum_value(&points), 100);
}

#[test]
fn multi_collector_independence() {
    let storage = long_counter_storage();
    let a = Arc::new(SimpleCollector::new(CollectorId::new(1), Temporality::Delta));
    let b = Arc::new(SimpleCollector::new(CollectorId::new(2), Temporality::Delta));
    let all = roster(&[&a, &b]);

    storage.record_long(&[(attrs(), 30)], SystemTime::now());

    // A collects first, B afterwards without new observations; both see
    // the full independent delta.
    assert_eq!(sum_value(&collect_points(&storage, &a, &all)), 30);
    assert_eq!(sum_value(&collect_points(&storage, &b, &all)), 30);

    // A further increase of 12 is reported exactly once to each.
    storage.record_long(&[(attrs(), 42)], SystemTime::now());
    assert_eq!(sum_value(&collect_points(&storage, &a, &all)), 12);
    assert_eq!(sum_value(&collect_points(&storage, &b, &all)), 12);
}

#[test]
fn first_observation_seeding() {
    let storage = long_counter_storage();
    let collector = Arc::new(SimpleCollector::new(CollectorId::new(1), Temporality::Delta));
    let all = roster(&[&collector]);

    storage.record_long(&[(attrs(), 7)], SystemTime::now());

    let points = collect_points(&storage, &collector, &all);
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].value, PointValue::Sum(Number::Long(7)));
}

#[test]
fn type_isolation_drops_mistyped_batches() {
    init_tracing();
    let storage = long_counter_storage();
    let collector = Arc::new(SimpleCollector::new(CollectorId::new(1), Temporality::Delta));
    let all = roster(&[&collector]);

    storage.record_double(&[(attrs(), 2.5)], SystemTime::now());
    assert!(collect_points(&storage, &collector, &all).is_empty());

    let double_storage =
        AsyncMetricStorage::with_default_aggregation(InstrumentDescriptor::new(
            "bytes_sent",
            InstrumentKind::Counter,
            InstrumentValueType::Double,
        ));
    double_storage.record_long(&[(attrs(), 5)], SystemTime::now());
    assert!(collect_points(&double_storage, &collector, &all).is_empty());
}

#[test]
fn cumulative_reconstruction_matches_delta_view() {
    let storage = long_counter_storage();
    let delta = Arc::new(SimpleCollector::new(CollectorId::new(1), Temporality::Delta));
    let cumulative = Arc::new(SimpleCollector::new(
        CollectorId::new(2),
        Temporality::Cumulative,
    ));
    let all = roster(&[&delta, &cumulative]);

    let mut cumulative_reports = Vec::new();
    let mut delta_reports = Vec::new();

    for absolute in [5, 12, 12, 30] {
        storage.record_long(&[(attrs(), absolute)], SystemTime::now());
        delta_reports.push(sum_value(&collect_points(&storage, &delta, &all)));
        cumulative_reports.push(sum_value(&collect_points(&storage, &cumulative, &all)));
    }

    // The cumulative view is non-decreasing and its successive differences
    // are exactly the delta view of the same cycles.
    assert!(cumulative_reports.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(cumulative_reports, vec![5, 12, 12, 30]);
    assert_eq!(delta_reports, vec![5, 7, 0, 18]);
}

#[test]
fn no_double_report_without_new_observations() {
    let storage = long_counter_storage();
    let collector = Arc::new(SimpleCollector::new(CollectorId::new(1), Temporality::Delta));
    let all = roster(&[&collector]);

    storage.record_long(&[(attrs(), 9)], SystemTime::now());
    assert_eq!(sum_value(&collect_points(&storage, &collector, &all)), 9);

    // Absence, not a zero-valued point.
    assert!(collect_points(&storage, &collector, &all).is_empty());
}

#[test]
fn late_registering_collector_sees_only_later_deltas() {
    let storage = long_counter_storage();
    let early = Arc::new(SimpleCollector::new(CollectorId::new(1), Temporality::Delta));
    let late = Arc::new(SimpleCollector::new(CollectorId::new(2), Temporality::Delta));

    let only_early = roster(&[&early]);
    storage.record_long(&[(attrs(), 10)], SystemTime::now());
    assert_eq!(sum_value(&collect_points(&storage, &early, &only_early)), 10);

    // The roster grows; the late collector only receives deltas drained
    // after it joined.
    let both = roster(&[&early, &late]);
    storage.record_long(&[(attrs(), 16)], SystemTime::now());
    assert_eq!(sum_value(&collect_points(&storage, &late, &both)), 6);
    assert_eq!(sum_value(&collect_points(&storage, &early, &both)), 6);
}

#[test]
fn separate_attribute_streams_stay_separate() {
    let storage = long_counter_storage();
    let collector = Arc::new(SimpleCollector::new(CollectorId::new(1), Temporality::Delta));
    let all = roster(&[&collector]);

    let api: AttributeSet = [("route", "/api")].into_iter().collect();
    let health: AttributeSet = [("route", "/health")].into_iter().collect();

    storage.record_long(
        &[(api.clone(), 100), (health.clone(), 1)],
        SystemTime::now(),
    );
    storage.record_long(
        &[(api.clone(), 150), (health.clone(), 2)],
        SystemTime::now(),
    );

    let points = collect_points(&storage, &collector, &all);
    assert_eq!(points.len(), 2);

    let by_attrs = |target: &AttributeSet| {
        points
            .iter()
            .find(|p| &p.attributes == target)
            .and_then(|p| p.value.as_long())
    };
    assert_eq!(by_attrs(&api), Some(150));
    assert_eq!(by_attrs(&health), Some(2));
}

#[test]
fn concurrent_record_and_collect_conserve_deltas() {
    init_tracing();
    let storage = Arc::new(long_counter_storage());
    let collector = Arc::new(SimpleCollector::new(CollectorId::new(1), Temporality::Delta));
    let all = roster(&[&collector]);
    let reported = Arc::new(AtomicI64::new(0));

    let final_absolute = 5_000;
    let recorder = {
        let storage = Arc::clone(&storage);
        thread::spawn(move || {
            for absolute in 1..=final_absolute {
                storage.record_long(&[(attrs(), absolute)], SystemTime::now());
            }
        })
    };

    let reader = {
        let storage = Arc::clone(&storage);
        let collector = Arc::clone(&collector);
        let all = all.clone();
        let reported = Arc::clone(&reported);
        thread::spawn(move || {
            for _ in 0..100 {
                storage.collect(
                    collector.as_ref(),
                    &all,
                    SystemTime::UNIX_EPOCH,
                    SystemTime::now(),
                    |data| {
                        for point in &data.points {
                            if let Some(v) = point.value.as_long() {
                                reported.fetch_add(v, Ordering::Relaxed);
                            }
                        }
                        true
                    },
                );
                thread::yield_now();
            }
        })
    };

    recorder.join().expect("recorder thread panicked");
    reader.join().expect("reader thread panicked");

    // A final drain picks up whatever the racing reads missed; the grand
    // total must equal the instrument's overall absolute increase.
    reported.fetch_add(
        sum_value(&collect_points(&storage, &collector, &all)),
        Ordering::Relaxed,
    );
    assert_eq!(reported.load(Ordering::Relaxed), final_absolute);
}

#[test]
fn histogram_instrument_round_trip() {
    let storage = AsyncMetricStorage::with_default_aggregation(InstrumentDescriptor::new(
        "payload_size",
        InstrumentKind::Histogram,
        InstrumentValueType::Double,
    ));
    let collector = Arc::new(SimpleCollector::new(CollectorId::new(1), Temporality::Delta));
    let all = roster(&[&collector]);

    storage.record_double(&[(attrs(), 3.0)], SystemTime::now());

    let points = collect_points(&storage, &collector, &all);
    assert_eq!(points.len(), 1);
    match &points[0].value {
        PointValue::Histogram(h) => {
            assert_eq!(h.count, 1);
            assert_eq!(h.sum, Number::Double(3.0));
        },
        other => panic!("expected histogram point, got {:?}", other),
    }
}
