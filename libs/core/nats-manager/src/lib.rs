//! JetStream management client over NATS request-reply.
//!
//! Creates, inspects and deletes streams and consumers, reads and deletes
//! stored messages, and enumerates streams and consumers through paged
//! listings delivered as async streams.
//!
//! # Architecture
//!
//! ```text
//! caller ──▶ ManageOpt[] ──▶ ResolvedOptions ──┬──▶ create loop ──┐
//!                                              │                  ├──▶ request envelope ──▶ Transport
//!                                              └──▶ Pager ────────┘
//!                                                     │
//!                                                     ▼
//!                                           listing task ──▶ ItemStream ──▶ caller
//! ```
//!
//! Every call resolves its options once: a timeout or an external
//! cancellation token (never both), plus a retry budget for create calls.
//! All network waits of the call observe the resolved context.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use nats_manager::{JetStreamManager, ManageOpt, ManagerConfig, StreamConfig};
//! use std::time::Duration;
//!
//! let manager = JetStreamManager::connect(&ManagerConfig::from_env()?).await?;
//!
//! let config = StreamConfig::new("ORDERS").with_subjects(["orders.>"]);
//! manager.add_stream(&config, &[ManageOpt::Retries(2)]).await?;
//!
//! let mut names = manager.stream_names(&[ManageOpt::Timeout(Duration::from_secs(2))])?;
//! while let Some(name) = names.next().await {
//!     println!("{name}");
//! }
//! names.finish().await?;
//! ```

mod account;
mod api;
mod bridge;
mod client;
pub mod config;
mod consumers;
mod create;
mod error;
pub mod metrics;
mod options;
mod pager;
mod streams;
mod transport;
pub mod types;

pub use api::{ApiPaged, DEFAULT_API_PREFIX, domain_prefix};
pub use bridge::ItemStream;
pub use client::JetStreamManager;
pub use config::{ConfigError, DEFAULT_REQUEST_TIMEOUT, ManagerConfig};
pub use error::{JsmError, JsmResult, TransportError};
pub use metrics::{ManagerMetrics, describe_metrics};
pub use options::{CallContext, ManageOpt, ResolvedOptions};
pub use pager::{
    ConsumerInfoFetcher, ConsumerNamesFetcher, Page, PageFetcher, Pager, StreamInfoFetcher,
    StreamNamesFetcher,
};
pub use transport::Transport;
pub use types::{
    AccountInfo, AccountLimits, AckPolicy, ApiStats, ClusterInfo, ConsumerConfig, ConsumerInfo,
    DeliverPolicy, DiscardPolicy, ExternalStream, PeerInfo, Placement, RawStreamMsg,
    ReplayPolicy, RetentionPolicy, SequencePair, StorageType, StreamConfig, StreamInfo,
    StreamSource, StreamSourceInfo, StreamState,
};
