//! Metrics definitions for the journal.

use shared::metrics_defs::{MetricDef, MetricType};

pub const JOURNAL_RECORD: MetricDef = MetricDef {
    name: "journal.record",
    metric_type: MetricType::Counter,
    description: "Number of query outcomes submitted to the journal",
};

pub const SINK_SUCCESS: MetricDef = MetricDef {
    name: "journal.sink.success",
    metric_type: MetricType::Counter,
    description: "Number of sink calls that persisted their entry",
};

pub const SINK_FAILURE: MetricDef = MetricDef {
    name: "journal.sink.failure",
    metric_type: MetricType::Counter,
    description: "Number of sink calls that failed; the entry is lost",
};

pub const SINK_CONFLICT: MetricDef = MetricDef {
    name: "journal.sink.conflict",
    metric_type: MetricType::Counter,
    description: "Number of appends lost to a concurrent writer",
};

pub const SINK_DURATION: MetricDef = MetricDef {
    name: "journal.sink.duration",
    metric_type: MetricType::Histogram,
    description: "Time to complete a sink call in seconds",
};

pub const ALL_METRICS: &[MetricDef] = &[
    JOURNAL_RECORD,
    SINK_SUCCESS,
    SINK_FAILURE,
    SINK_CONFLICT,
    SINK_DURATION,
];
