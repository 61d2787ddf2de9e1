//! ip-tally: records submitted IPv4 addresses, flags repeats, and reports
//! unique vs duplicate counts with a daily counter reset and 30-day expiry.

pub mod config;
pub mod error;
pub mod expiry;
pub mod handlers;
pub mod maintenance;
pub mod metrics;
pub mod models;
pub mod processor;
pub mod reset;
pub mod state;
pub mod stats;
pub mod store;
pub mod validation;
