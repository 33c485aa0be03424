//! Consumer operations.

use crate::api::{ApiSubject, SuccessResponse};
use crate::bridge::{ItemStream, spawn_listing};
use crate::client::{JetStreamManager, encode};
use crate::error::{JsmError, JsmResult};
use crate::options::ManageOpt;
use crate::pager::{ConsumerInfoFetcher, ConsumerNamesFetcher};
use crate::types::{ConsumerConfig, ConsumerInfo, CreateConsumerRequest};
use tracing::info;

fn require_names(stream: &str, consumer: &str) -> JsmResult<()> {
    if stream.is_empty() {
        return Err(JsmError::StreamNameRequired);
    }
    if consumer.is_empty() {
        return Err(JsmError::ConsumerNameRequired);
    }
    Ok(())
}

impl JetStreamManager {
    /// Create a consumer on `stream`, retrying up to the resolved budget.
    ///
    /// A config with a durable name creates a durable consumer; otherwise the
    /// consumer is ephemeral. Durable names may not contain `.`.
    pub async fn add_consumer(
        &self,
        stream: &str,
        config: Option<&ConsumerConfig>,
        opts: &[ManageOpt],
    ) -> JsmResult<ConsumerInfo> {
        let opts = self.resolve(opts)?;
        if stream.is_empty() {
            return Err(JsmError::StreamNameRequired);
        }

        let durable = config
            .and_then(|c| c.durable.as_deref())
            .filter(|name| !name.is_empty());
        if durable.is_some_and(|name| name.contains('.')) {
            return Err(JsmError::InvalidDurableName);
        }

        let subject = match durable {
            Some(name) => ApiSubject::DurableCreate(stream, name),
            None => ApiSubject::ConsumerCreate(stream),
        };
        let payload = encode(&CreateConsumerRequest { stream, config })?;

        let consumer: ConsumerInfo = self.create_with_retry(subject, payload, &opts).await?;

        info!(stream = %stream, consumer = %consumer.name, durable = durable.is_some(), "Consumer created");
        Ok(consumer)
    }

    pub async fn delete_consumer(
        &self,
        stream: &str,
        consumer: &str,
        opts: &[ManageOpt],
    ) -> JsmResult<()> {
        let opts = self.resolve(opts)?;
        require_names(stream, consumer)?;

        let _: SuccessResponse = self
            .api_request(
                ApiSubject::ConsumerDelete(stream, consumer),
                Vec::new(),
                opts.context(),
            )
            .await?;

        info!(stream = %stream, consumer = %consumer, "Consumer deleted");
        Ok(())
    }

    pub async fn consumer_info(
        &self,
        stream: &str,
        consumer: &str,
        opts: &[ManageOpt],
    ) -> JsmResult<ConsumerInfo> {
        let opts = self.resolve(opts)?;
        require_names(stream, consumer)?;

        self.api_request(
            ApiSubject::ConsumerInfo(stream, consumer),
            Vec::new(),
            opts.context(),
        )
        .await
    }

    /// Stream the configuration and state of every consumer of `stream`.
    ///
    /// An empty stream name surfaces as [`JsmError::StreamNameRequired`] from
    /// [`ItemStream::finish`] without any request being sent.
    pub fn consumers_info(
        &self,
        stream: &str,
        opts: &[ManageOpt],
    ) -> JsmResult<ItemStream<ConsumerInfo>> {
        let opts = self.resolve(opts)?;
        Ok(spawn_listing(
            ConsumerInfoFetcher::new(self.clone(), stream),
            opts,
        ))
    }

    /// Stream the names of every consumer of `stream`.
    pub fn consumer_names(
        &self,
        stream: &str,
        opts: &[ManageOpt],
    ) -> JsmResult<ItemStream<String>> {
        let opts = self.resolve(opts)?;
        Ok(spawn_listing(
            ConsumerNamesFetcher::new(self.clone(), stream),
            opts,
        ))
    }
}
