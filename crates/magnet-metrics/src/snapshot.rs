use serde::{Deserialize, Serialize};

/// Type of Magnet server.
///
/// There is currently a single kind; the field exists so clients of the
/// `/_info` endpoint can distinguish server roles if more are added.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServerType {
    Gateway,
}

/// Server information returned by the `/_info` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub server_type: ServerType,
    pub version: String,
    pub uptime_ms: u64,
}

impl ServerInfo {
    pub fn new(server_type: ServerType, uptime_ms: u64) -> Self {
        Self {
            server_type,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_ms,
        }
    }
}

/// Complete metrics snapshot returned by the `/_metrics` endpoint.
///
/// `cache_hits` counts reuses of an unchanged compiled script,
/// `cache_misses` first-time compiles, and `recompiles` replacements of a
/// stale entry. `not_found_requests` is a subset of `failed_requests`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub not_found_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub recompiles: u64,
    pub avg_latency_us: u64,
    pub uptime_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_type_serializes_lowercase() {
        let info = ServerInfo::new(ServerType::Gateway, 125);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["server_type"], "gateway");
        assert_eq!(json["uptime_ms"], 125);
        assert!(json["version"].is_string());
    }

    #[test]
    fn test_snapshot_round_trips() {
        let snapshot = MetricsSnapshot {
            total_requests: 10,
            successful_requests: 7,
            failed_requests: 3,
            not_found_requests: 1,
            cache_hits: 6,
            cache_misses: 3,
            recompiles: 1,
            avg_latency_us: 420,
            uptime_ms: 9000,
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: MetricsSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.total_requests, 10);
        assert_eq!(back.cache_hits, 6);
    }
}
