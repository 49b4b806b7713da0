//! Metric recording.
//!
//! Portico records through the `metrics` facade and never installs an
//! exporter; without a recorder every call is a no-op.
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `portico_resolutions_total` | Counter | `outcome` | Request resolutions by outcome |
//! | `portico_validation_failures_total` | Counter | `kind` | Individual validation failures |
//! | `portico_handler_contract_errors_total` | Counter | `operation` | Handler outputs that broke their contract |
//! | `portico_dispatch_duration_seconds` | Histogram | `operation`, `status` | Full dispatch cycle latency |

use metrics::{counter, describe_counter, describe_histogram, histogram};
use portico_core::ValidationFailure;
use std::time::Duration;

/// Counter of resolutions, labelled by outcome.
pub const RESOLUTIONS_TOTAL: &str = "portico_resolutions_total";

/// Counter of validation failures, labelled by kind.
pub const VALIDATION_FAILURES_TOTAL: &str = "portico_validation_failures_total";

/// Counter of handler contract errors, labelled by operation.
pub const HANDLER_CONTRACT_ERRORS_TOTAL: &str = "portico_handler_contract_errors_total";

/// Histogram of dispatch durations.
pub const DISPATCH_DURATION_SECONDS: &str = "portico_dispatch_duration_seconds";

/// Registers descriptions for all metrics with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(RESOLUTIONS_TOTAL, "Request resolutions by outcome");
    describe_counter!(
        VALIDATION_FAILURES_TOTAL,
        "Individual request validation failures by kind"
    );
    describe_counter!(
        HANDLER_CONTRACT_ERRORS_TOTAL,
        "Handler outputs that violated their declared response contract"
    );
    describe_histogram!(
        DISPATCH_DURATION_SECONDS,
        "Duration of resolve, handle and serialize in seconds"
    );
}

/// Records one resolution with its outcome ("resolved", "validation_failed",
/// "authentication_failed", "dependency_failed", "payload_too_large").
pub fn record_resolution(outcome: &'static str) {
    counter!(RESOLUTIONS_TOTAL, "outcome" => outcome).increment(1);
}

/// Records each failure under its kind.
pub fn record_validation_failures(failures: &[ValidationFailure]) {
    for failure in failures {
        counter!(VALIDATION_FAILURES_TOTAL, "kind" => failure.kind.as_str()).increment(1);
    }
}

/// Records a handler contract error.
pub fn record_handler_contract_error(operation: &str) {
    counter!(HANDLER_CONTRACT_ERRORS_TOTAL, "operation" => operation.to_string()).increment(1);
}

/// Records a completed dispatch.
pub fn record_dispatch(operation: &str, status: u16, duration: Duration) {
    histogram!(
        DISPATCH_DURATION_SECONDS,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());
}
