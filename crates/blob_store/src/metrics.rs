//! OpenTelemetry instruments for blob store calls.

use std::time::Instant;

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

use crate::BlobError;

#[derive(Clone)]
pub struct BlobMetrics {
    latency: Histogram<f64>,
    failures: Counter<u64>,
}

impl BlobMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            latency: meter
                .f64_histogram("blob_store_operation_duration_seconds")
                .with_unit("s")
                .with_description("Latency of blob store calls by operation")
                .build(),
            failures: meter
                .u64_counter("blob_store_operation_errors_total")
                .with_description("Failed blob store calls by operation, not found excluded")
                .build(),
        }
    }

    /// Instruments registered on the process-wide meter provider.
    pub fn global() -> Self {
        Self::new(&global::meter("blob_store"))
    }

    /// Start timing `op`. The latency is recorded when the timer drops.
    pub fn timer(&self, op: &'static str) -> Timer {
        Timer {
            op,
            started: Instant::now(),
            latency: self.latency.clone(),
        }
    }

    pub fn record_error(&self, op: &'static str, err: &BlobError) {
        if err.is_not_found() {
            return;
        }
        self.failures.add(1, &[KeyValue::new("op", op)]);
    }
}

pub struct Timer {
    op: &'static str,
    started: Instant,
    latency: Histogram<f64>,
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.latency.record(
            self.started.elapsed().as_secs_f64(),
            &[KeyValue::new("op", self.op)],
        );
    }
}
