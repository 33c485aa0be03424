//! Stream configuration and state.

use super::duration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Message retention policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetentionPolicy {
    /// Keep messages until a limit is hit
    #[default]
    Limits,
    /// Keep messages while consumers are interested
    Interest,
    /// Remove messages once acknowledged
    #[serde(rename = "workqueue")]
    WorkQueue,
}

/// What to discard once a stream is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscardPolicy {
    #[default]
    Old,
    New,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    #[default]
    File,
    Memory,
}

/// Properties of a stream. If no subjects are given the name is used as the only subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<String>,
    pub retention: RetentionPolicy,
    pub max_consumers: i64,
    pub max_msgs: i64,
    pub max_bytes: i64,
    pub discard: DiscardPolicy,
    #[serde(with = "duration")]
    pub max_age: Duration,
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub max_msg_size: i32,
    pub storage: StorageType,
    #[serde(rename = "num_replicas")]
    pub replicas: usize,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub no_ack: bool,
    #[serde(rename = "template_owner", skip_serializing_if = "String::is_empty")]
    pub template: String,
    #[serde(
        rename = "duplicate_window",
        with = "duration",
        skip_serializing_if = "Duration::is_zero"
    )]
    pub duplicates: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement: Option<Placement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror: Option<StreamSource>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<StreamSource>,
}

fn is_zero_i32(value: &i32) -> bool {
    *value == 0
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            subjects: Vec::new(),
            retention: RetentionPolicy::default(),
            max_consumers: -1,
            max_msgs: -1,
            max_bytes: -1,
            discard: DiscardPolicy::default(),
            max_age: Duration::ZERO,
            max_msg_size: 0,
            storage: StorageType::default(),
            replicas: 1,
            no_ack: false,
            template: String::new(),
            duplicates: Duration::ZERO,
            placement: None,
            mirror: None,
            sources: Vec::new(),
        }
    }
}

impl StreamConfig {
    /// Create a configuration with the given name and server-side defaults.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the subjects the stream captures.
    pub fn with_subjects<I, S>(mut self, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subjects = subjects.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_storage(mut self, storage: StorageType) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_max_msgs(mut self, max_msgs: i64) -> Self {
        self.max_msgs = max_msgs;
        self
    }
}

/// Placement of a stream in clustered JetStream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub cluster: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Upstream stream a stream mirrors or sources from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSource {
    pub name: String,
    #[serde(default, skip_serializing_if = "is_zero_u64")]
    pub opt_start_seq: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opt_start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub filter_subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<ExternalStream>,
}

fn is_zero_u64(value: &u64) -> bool {
    *value == 0
}

/// Access to a stream source in another account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalStream {
    #[serde(rename = "api")]
    pub api_prefix: String,
    #[serde(rename = "deliver")]
    pub deliver_prefix: String,
}

/// Configuration and current state of a stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub config: StreamConfig,
    #[serde(default)]
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub state: StreamState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ClusterInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror: Option<StreamSourceInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<StreamSourceInfo>,
}

/// Replication status of an upstream source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSourceInfo {
    pub name: String,
    #[serde(default)]
    pub lag: u64,
    #[serde(default, with = "duration")]
    pub active: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamState {
    #[serde(rename = "messages")]
    pub msgs: u64,
    pub bytes: u64,
    pub first_seq: u64,
    #[serde(rename = "first_ts")]
    pub first_time: DateTime<Utc>,
    pub last_seq: u64,
    #[serde(rename = "last_ts")]
    pub last_time: DateTime<Utc>,
    #[serde(rename = "consumer_count")]
    pub consumers: usize,
}

/// Servers backing a clustered stream or consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leader: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub replicas: Vec<PeerInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerInfo {
    pub name: String,
    pub current: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub offline: bool,
    #[serde(with = "duration")]
    pub active: Duration,
    #[serde(skip_serializing_if = "is_zero_u64")]
    pub lag: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_wire_format() {
        let cfg = StreamConfig::new("ORDERS")
            .with_subjects(["orders.>"])
            .with_max_age(Duration::from_secs(60))
            .with_retention(RetentionPolicy::WorkQueue);

        let value = serde_json::to_value(&cfg).unwrap();
        assert_eq!(value["name"], "ORDERS");
        assert_eq!(value["subjects"], json!(["orders.>"]));
        assert_eq!(value["retention"], "workqueue");
        assert_eq!(value["max_age"], 60_000_000_000u64);
        assert_eq!(value["num_replicas"], 1);
        assert!(value.get("duplicate_window").is_none());
        assert!(value.get("no_ack").is_none());
    }

    #[test]
    fn test_info_from_server_reply() {
        let info: StreamInfo = serde_json::from_value(json!({
            "type": "io.nats.jetstream.api.v1.stream_info_response",
            "config": {
                "name": "ORDERS",
                "subjects": ["orders.*"],
                "retention": "limits",
                "max_consumers": -1,
                "max_msgs": -1,
                "max_bytes": -1,
                "discard": "old",
                "max_age": 0,
                "storage": "memory",
                "num_replicas": 1
            },
            "created": "2021-03-01T10:00:00Z",
            "state": {
                "messages": 3,
                "bytes": 120,
                "first_seq": 1,
                "first_ts": "2021-03-01T10:00:01Z",
                "last_seq": 3,
                "last_ts": "0001-01-01T00:00:00Z",
                "consumer_count": 2
            },
            "mirror": {"name": "UPSTREAM", "lag": 4, "active": -1}
        }))
        .unwrap();

        assert_eq!(info.config.name, "ORDERS");
        assert_eq!(info.config.storage, StorageType::Memory);
        assert_eq!(info.state.msgs, 3);
        assert_eq!(info.state.consumers, 2);
        let mirror = info.mirror.unwrap();
        assert_eq!(mirror.lag, 4);
        assert_eq!(mirror.active, Duration::ZERO);
    }
}
