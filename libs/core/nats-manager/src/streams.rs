//! Stream and stored-message operations.

use crate::api::{ApiSubject, SuccessResponse};
use crate::bridge::{ItemStream, spawn_listing};
use crate::client::{JetStreamManager, encode};
use crate::error::{JsmError, JsmResult};
use crate::options::ManageOpt;
use crate::pager::{StreamInfoFetcher, StreamNamesFetcher};
use crate::types::{RawStreamMsg, SeqRequest, StoredMsgResponse, StreamConfig, StreamInfo};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct PurgeResponse {
    #[serde(default)]
    purged: u64,
}

fn require_stream(name: &str) -> JsmResult<()> {
    if name.is_empty() {
        return Err(JsmError::StreamNameRequired);
    }
    Ok(())
}

impl JetStreamManager {
    /// Create a stream, retrying up to the resolved budget.
    pub async fn add_stream(
        &self,
        config: &StreamConfig,
        opts: &[ManageOpt],
    ) -> JsmResult<StreamInfo> {
        let opts = self.resolve(opts)?;
        require_stream(&config.name)?;

        let payload = encode(config)?;
        let stream: StreamInfo = self
            .create_with_retry(ApiSubject::StreamCreate(&config.name), payload, &opts)
            .await?;

        info!(stream = %config.name, subjects = ?stream.config.subjects, "Stream created");
        Ok(stream)
    }

    /// Replace the configuration of an existing stream.
    pub async fn update_stream(
        &self,
        config: &StreamConfig,
        opts: &[ManageOpt],
    ) -> JsmResult<StreamInfo> {
        let opts = self.resolve(opts)?;
        require_stream(&config.name)?;

        let payload = encode(config)?;
        self.api_request(
            ApiSubject::StreamUpdate(&config.name),
            payload,
            opts.context(),
        )
        .await
    }

    pub async fn delete_stream(&self, name: &str, opts: &[ManageOpt]) -> JsmResult<()> {
        let opts = self.resolve(opts)?;
        require_stream(name)?;

        let _: SuccessResponse = self
            .api_request(ApiSubject::StreamDelete(name), Vec::new(), opts.context())
            .await?;

        info!(stream = %name, "Stream deleted");
        Ok(())
    }

    pub async fn stream_info(&self, name: &str, opts: &[ManageOpt]) -> JsmResult<StreamInfo> {
        let opts = self.resolve(opts)?;
        require_stream(name)?;

        self.api_request(ApiSubject::StreamInfo(name), Vec::new(), opts.context())
            .await
    }

    /// Remove every message from a stream. Returns the number of messages purged.
    pub async fn purge_stream(&self, name: &str, opts: &[ManageOpt]) -> JsmResult<u64> {
        let opts = self.resolve(opts)?;
        require_stream(name)?;

        let resp: PurgeResponse = self
            .api_request(ApiSubject::StreamPurge(name), Vec::new(), opts.context())
            .await?;

        info!(stream = %name, purged = resp.purged, "Stream purged");
        Ok(resp.purged)
    }

    /// Read one stored message by sequence.
    pub async fn get_msg(
        &self,
        name: &str,
        seq: u64,
        opts: &[ManageOpt],
    ) -> JsmResult<RawStreamMsg> {
        let opts = self.resolve(opts)?;
        require_stream(name)?;

        let payload = encode(&SeqRequest { seq })?;
        let resp: StoredMsgResponse = self
            .api_request(ApiSubject::MsgGet(name), payload, opts.context())
            .await?;
        resp.into_raw()
    }

    pub async fn delete_msg(&self, name: &str, seq: u64, opts: &[ManageOpt]) -> JsmResult<()> {
        let opts = self.resolve(opts)?;
        require_stream(name)?;

        let payload = encode(&SeqRequest { seq })?;
        let _: SuccessResponse = self
            .api_request(ApiSubject::MsgDelete(name), payload, opts.context())
            .await?;
        Ok(())
    }

    /// Stream every stream's configuration and state.
    ///
    /// Fails only when the options conflict; listing errors are reported by
    /// [`ItemStream::finish`].
    pub fn streams_info(&self, opts: &[ManageOpt]) -> JsmResult<ItemStream<StreamInfo>> {
        let opts = self.resolve(opts)?;
        Ok(spawn_listing(StreamInfoFetcher::new(self.clone()), opts))
    }

    /// Stream the names of all streams.
    pub fn stream_names(&self, opts: &[ManageOpt]) -> JsmResult<ItemStream<String>> {
        let opts = self.resolve(opts)?;
        Ok(spawn_listing(StreamNamesFetcher::new(self.clone(), None), opts))
    }

    /// Stream the names of streams capturing `subject`.
    pub fn stream_names_matching(
        &self,
        subject: &str,
        opts: &[ManageOpt],
    ) -> JsmResult<ItemStream<String>> {
        let opts = self.resolve(opts)?;
        let filter = Some(subject.to_string()).filter(|s| !s.is_empty());
        Ok(spawn_listing(
            StreamNamesFetcher::new(self.clone(), filter),
            opts,
        ))
    }
}
