//! Prometheus-style metrics for management calls.
//!
//! Only the `metrics` facade is used here; installing a recorder is up to the
//! application.

use crate::error::JsmResult;
use metrics::{counter, histogram};
use std::time::Duration;

/// Management metrics recorder.
pub struct ManagerMetrics;

impl ManagerMetrics {
    /// Record one request-reply exchange with the API.
    pub fn record_request<T>(operation: &'static str, result: &JsmResult<T>, elapsed: Duration) {
        let outcome = match result {
            Ok(_) => "ok",
            Err(e) => e.label(),
        };
        counter!("jsm_requests_total", "operation" => operation, "outcome" => outcome)
            .increment(1);
        histogram!("jsm_request_duration_seconds", "operation" => operation)
            .record(elapsed.as_secs_f64());
    }

    /// Record one attempt of a retrying create.
    pub fn record_create_attempt<T>(operation: &'static str, result: &JsmResult<T>) {
        let outcome = match result {
            Ok(_) => "ok",
            Err(e) => e.label(),
        };
        counter!("jsm_create_attempts_total", "operation" => operation, "outcome" => outcome)
            .increment(1);
    }

    /// Record a listing page received from the server.
    pub fn record_page(operation: &'static str, items: usize) {
        counter!("jsm_pages_fetched_total", "operation" => operation).increment(1);
        counter!("jsm_listed_items_total", "operation" => operation).increment(items as u64);
    }
}

/// Register metric descriptions for documentation.
pub fn describe_metrics() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        "jsm_requests_total",
        "JetStream API requests by operation and outcome"
    );
    describe_histogram!(
        "jsm_request_duration_seconds",
        "JetStream API request duration in seconds"
    );
    describe_counter!(
        "jsm_create_attempts_total",
        "Create attempts by operation and outcome"
    );
    describe_counter!("jsm_pages_fetched_total", "Listing pages fetched");
    describe_counter!("jsm_listed_items_total", "Items received through listings");
}
