use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("ip_tally_requests_total", "Total number of API requests").unwrap();
    pub static ref ADDED_TOTAL: Counter =
        register_counter!("ip_tally_added_total", "Submissions of previously unseen addresses").unwrap();
    pub static ref DUPLICATES_TOTAL: Counter =
        register_counter!("ip_tally_duplicates_total", "Submissions of already recorded addresses").unwrap();
    pub static ref REJECTED_TOTAL: Counter =
        register_counter!("ip_tally_rejected_total", "Requests rejected as malformed").unwrap();
    pub static ref STORAGE_ERRORS: Counter =
        register_counter!("ip_tally_storage_errors_total", "Requests failed by the record store").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "ip_tally_request_latency_seconds",
        "Request latency in seconds"
    )
    .unwrap();
    pub static ref LIVE_RECORDS: Gauge =
        register_gauge!("ip_tally_live_records", "Current number of unexpired records").unwrap();
}
