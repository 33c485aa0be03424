//! Records exchanged with the JetStream API.

mod account;
mod consumer;
pub(crate) mod duration;
mod message;
mod stream;

pub use account::{AccountInfo, AccountLimits, ApiStats};
pub use consumer::{
    AckPolicy, ConsumerConfig, ConsumerInfo, DeliverPolicy, ReplayPolicy, SequencePair,
};
pub(crate) use consumer::CreateConsumerRequest;
pub use message::RawStreamMsg;
pub(crate) use message::SeqRequest;
pub(crate) use message::StoredMsgResponse;
pub use stream::{
    ClusterInfo, DiscardPolicy, ExternalStream, PeerInfo, Placement, RetentionPolicy, StorageType,
    StreamConfig, StreamInfo, StreamSource, StreamSourceInfo, StreamState,
};
