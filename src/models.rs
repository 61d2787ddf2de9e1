use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

// One submitted address, keyed by `ip`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct IpRecord {
    #[serde(rename = "ip")]
    pub address: Ipv4Addr,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub duplicate_count: u64,
}

impl IpRecord {
    pub fn new(address: Ipv4Addr, created_at: DateTime<Utc>) -> Self {
        Self {
            address,
            created_at,
            duplicate_count: 0,
        }
    }
}

// Result of a submission
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Added,
    Duplicate,
}

// Aggregate counters reported by GET /api/stats
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub successful: u64,
    #[serde(rename = "duplicateCount")]
    pub duplicate_count: u64,
}

// POST /api/check request body
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct CheckRequest {
    #[serde(default)]
    pub ip: Option<String>,
}

// POST /api/check response body
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CheckResponse {
    pub status: Outcome,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ErrorBody {
    pub error: String,
}
