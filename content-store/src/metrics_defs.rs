//! Metrics definitions for the content store.

use shared::metrics_defs::{MetricDef, MetricType};

pub const STORE_FETCH: MetricDef = MetricDef {
    name: "content_store.fetch",
    metric_type: MetricType::Counter,
    description: "Number of document fetches issued against the backing store",
};

pub const STORE_PUT: MetricDef = MetricDef {
    name: "content_store.put",
    metric_type: MetricType::Counter,
    description: "Number of conditional writes issued against the backing store",
};

pub const STORE_PUT_CONFLICT: MetricDef = MetricDef {
    name: "content_store.put.conflict",
    metric_type: MetricType::Counter,
    description: "Number of conditional writes rejected due to a version mismatch",
};

pub const ALL_METRICS: &[MetricDef] = &[STORE_FETCH, STORE_PUT, STORE_PUT_CONFLICT];
