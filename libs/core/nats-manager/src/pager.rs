//! Cursor over paged API listings.
//!
//! A [`Pager`] pulls one page per [`Pager::advance`] call through a
//! [`PageFetcher`], which knows how to request a page at an offset for one
//! kind of listing (stream records, consumer records, names).

use crate::api::{ApiPaged, ApiSubject, PagedRequest, StreamNamesRequest};
use crate::client::{JetStreamManager, encode};
use crate::error::{JsmError, JsmResult};
use crate::metrics::ManagerMetrics;
use crate::options::CallContext;
use crate::types::{ConsumerInfo, StreamInfo};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub paged: ApiPaged,
    pub items: Vec<T>,
}

/// Fetches a single page of one kind of listing.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    type Item: Send + 'static;

    /// Request the page starting at `offset`.
    async fn fetch(&self, offset: usize, ctx: &CallContext) -> JsmResult<Page<Self::Item>>;
}

/// Single-owner cursor over a paged listing. Not meant to be shared across tasks.
///
/// Once an error is recorded or every item has been seen, the pager is
/// exhausted and [`advance`](Pager::advance) returns `false` without
/// issuing further requests.
pub struct Pager<F: PageFetcher> {
    fetcher: F,
    ctx: CallContext,
    offset: usize,
    page: Vec<F::Item>,
    paged: Option<ApiPaged>,
    err: Option<JsmError>,
    exhausted: bool,
}

impl<F: PageFetcher> Pager<F> {
    pub fn new(fetcher: F, ctx: CallContext) -> Self {
        Self {
            fetcher,
            ctx,
            offset: 0,
            page: Vec::new(),
            paged: None,
            err: None,
            exhausted: false,
        }
    }

    /// Fetch the next page. Returns `false` once the listing is exhausted or failed.
    pub async fn advance(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        // The tracked offset, not the page sizes, decides when we are done.
        if self.paged.is_some_and(|paged| self.offset >= paged.total) {
            self.exhausted = true;
            return false;
        }

        match self.fetcher.fetch(self.offset, &self.ctx).await {
            Ok(page) => {
                self.paged = Some(page.paged);
                if page.items.is_empty() {
                    // No progress possible; stop instead of asking for the same offset forever.
                    self.page.clear();
                    self.exhausted = true;
                    return false;
                }
                self.offset += page.items.len();
                self.page = page.items;
                true
            }
            Err(e) => {
                self.err = Some(e);
                self.page.clear();
                self.exhausted = true;
                false
            }
        }
    }

    /// The most recently fetched page.
    pub fn current_page(&self) -> &[F::Item] {
        &self.page
    }

    /// Take ownership of the current page, leaving it empty.
    pub fn take_page(&mut self) -> Vec<F::Item> {
        std::mem::take(&mut self.page)
    }

    /// The error that exhausted the pager, if any.
    pub fn error(&self) -> Option<&JsmError> {
        self.err.as_ref()
    }

    pub fn into_error(self) -> Option<JsmError> {
        self.err
    }

    /// Items received so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Metadata of the last page, `None` before the first successful fetch.
    pub fn page_info(&self) -> Option<ApiPaged> {
        self.paged
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn context(&self) -> &CallContext {
        &self.ctx
    }
}

/// Paged listing reply; servers may send `null` for an empty item array.
#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct ListResponse<T> {
    #[serde(default)]
    total: usize,
    #[serde(default)]
    offset: usize,
    #[serde(default)]
    limit: usize,
    #[serde(default, alias = "streams", alias = "consumers")]
    items: Option<Vec<T>>,
}

async fn fetch_page<T: DeserializeOwned>(
    manager: &JetStreamManager,
    subject: ApiSubject<'_>,
    payload: Vec<u8>,
    ctx: &CallContext,
) -> JsmResult<Page<T>> {
    let resp: ListResponse<T> = manager.api_request(subject, payload, ctx).await?;
    let items = resp.items.unwrap_or_default();
    ManagerMetrics::record_page(subject.operation(), items.len());

    Ok(Page {
        paged: ApiPaged {
            total: resp.total,
            offset: resp.offset,
            limit: resp.limit,
        },
        items,
    })
}

/// Pages of [`StreamInfo`] records.
pub struct StreamInfoFetcher {
    manager: JetStreamManager,
}

impl StreamInfoFetcher {
    pub fn new(manager: JetStreamManager) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl PageFetcher for StreamInfoFetcher {
    type Item = StreamInfo;

    async fn fetch(&self, offset: usize, ctx: &CallContext) -> JsmResult<Page<StreamInfo>> {
        let payload = encode(&StreamNamesRequest {
            offset,
            subject: None,
        })?;
        fetch_page(&self.manager, ApiSubject::StreamList, payload, ctx).await
    }
}

/// Pages of stream names, optionally restricted to streams capturing a subject.
pub struct StreamNamesFetcher {
    manager: JetStreamManager,
    subject: Option<String>,
}

impl StreamNamesFetcher {
    pub fn new(manager: JetStreamManager, subject: Option<String>) -> Self {
        Self { manager, subject }
    }
}

#[async_trait]
impl PageFetcher for StreamNamesFetcher {
    type Item = String;

    async fn fetch(&self, offset: usize, ctx: &CallContext) -> JsmResult<Page<String>> {
        let payload = encode(&StreamNamesRequest {
            offset,
            subject: self.subject.clone(),
        })?;
        fetch_page(&self.manager, ApiSubject::StreamNames, payload, ctx).await
    }
}

/// Pages of [`ConsumerInfo`] records of one stream.
pub struct ConsumerInfoFetcher {
    manager: JetStreamManager,
    stream: String,
}

impl ConsumerInfoFetcher {
    pub fn new(manager: JetStreamManager, stream: impl Into<String>) -> Self {
        Self {
            manager,
            stream: stream.into(),
        }
    }
}

#[async_trait]
impl PageFetcher for ConsumerInfoFetcher {
    type Item = ConsumerInfo;

    async fn fetch(&self, offset: usize, ctx: &CallContext) -> JsmResult<Page<ConsumerInfo>> {
        if self.stream.is_empty() {
            return Err(JsmError::StreamNameRequired);
        }
        let payload = encode(&PagedRequest { offset })?;
        fetch_page(
            &self.manager,
            ApiSubject::ConsumerList(&self.stream),
            payload,
            ctx,
        )
        .await
    }
}

/// Pages of consumer names of one stream.
pub struct ConsumerNamesFetcher {
    manager: JetStreamManager,
    stream: String,
}

impl ConsumerNamesFetcher {
    pub fn new(manager: JetStreamManager, stream: impl Into<String>) -> Self {
        Self {
            manager,
            stream: stream.into(),
        }
    }
}

#[async_trait]
impl PageFetcher for ConsumerNamesFetcher {
    type Item = String;

    async fn fetch(&self, offset: usize, ctx: &CallContext) -> JsmResult<Page<String>> {
        if self.stream.is_empty() {
            return Err(JsmError::StreamNameRequired);
        }
        let payload = encode(&PagedRequest { offset })?;
        fetch_page(
            &self.manager,
            ApiSubject::ConsumerNames(&self.stream),
            payload,
            ctx,
        )
        .await
    }
}


#[cfg(test)]
mod tests {
    use super::testing::VecFetcher;
    use super::*;
    use crate::transport::MockTransport;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn ctx() -> CallContext {
        CallContext::with_timeout(Duration::from_secs(5))
    }

    async fn drain<F: PageFetcher>(pager: &mut Pager<F>) -> Vec<F::Item>
    where
        F::Item: Clone,
    {
        let mut out = Vec::new();
        while pager.advance().await {
            out.extend_from_slice(pager.current_page());
        }
        out
    }

    #[tokio::test]
    async fn test_uneven_pages_deliver_every_item() {
        let fetcher = VecFetcher::new(vec![1, 2, 3, 4, 5], 2);
        let calls = fetcher.calls.clone();
        let mut pager = Pager::new(fetcher, ctx());

        assert_eq!(drain(&mut pager).await, vec![1, 2, 3, 4, 5]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(pager.offset(), 5);
        assert!(pager.error().is_none());
        assert!(pager.is_exhausted());
    }

    #[tokio::test]
    async fn test_advance_after_exhaustion_makes_no_calls() {
        let fetcher = VecFetcher::new(vec![1, 2, 3], 2);
        let calls = fetcher.calls.clone();
        let mut pager = Pager::new(fetcher, ctx());

        drain(&mut pager).await;
        let after_drain = calls.load(Ordering::SeqCst);

        assert!(!pager.advance().await);
        assert!(!pager.advance().await);
        assert_eq!(calls.load(Ordering::SeqCst), after_drain);
    }

    #[tokio::test]
    async fn test_error_is_sticky() {
        let mut fetcher = VecFetcher::new(vec![1, 2, 3, 4, 5], 2);
        fetcher.fail_at_call = Some(2);
        let calls = fetcher.calls.clone();
        let mut pager = Pager::new(fetcher, ctx());

        assert!(pager.advance().await);
        assert_eq!(pager.current_page(), &[1, 2]);
        assert!(!pager.advance().await);
        assert!(!pager.advance().await);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(pager.error().unwrap().to_string(), "listing failed");
        assert!(pager.current_page().is_empty());
    }

    #[tokio::test]
    async fn test_zero_total_yields_nothing() {
        let fetcher = VecFetcher::new(Vec::new(), 2);
        let calls = fetcher.calls.clone();
        let mut pager = Pager::new(fetcher, ctx());

        assert!(!pager.advance().await);
        assert!(pager.current_page().is_empty());
        assert!(pager.error().is_none());
        assert_eq!(pager.page_info().unwrap().total, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_overstated_total_does_not_loop() {
        let mut fetcher = VecFetcher::new(vec![1, 2, 3], 2);
        fetcher.total = 10;
        let calls = fetcher.calls.clone();
        let mut pager = Pager::new(fetcher, ctx());

        assert_eq!(drain(&mut pager).await, vec![1, 2, 3]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_understated_total_stops_at_tracked_offset() {
        let mut fetcher = VecFetcher::new(vec![1, 2, 3, 4, 5], 2);
        fetcher.total = 3;
        let mut pager = Pager::new(fetcher, ctx());

        assert_eq!(drain(&mut pager).await, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_missing_stream_fails_without_request() {
        let mut transport = MockTransport::new();
        transport.expect_request().times(0);
        let manager = JetStreamManager::new(transport);

        let mut pager = Pager::new(ConsumerNamesFetcher::new(manager, ""), ctx());
        assert!(!pager.advance().await);
        assert!(matches!(pager.error(), Some(JsmError::StreamNameRequired)));
    }

    #[tokio::test]
    async fn test_consumer_names_request_carries_offset() {
        let mut transport = MockTransport::new();
        let mut seq = mockall::Sequence::new();
        transport
            .expect_request()
            .withf(|subject, payload, _| {
                subject == "$JS.API.CONSUMER.NAMES.ORDERS" && payload == br#"{"offset":0}"#
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| {
                Ok(br#"{"total":3,"offset":0,"limit":2,"consumers":["a","b"]}"#.to_vec())
            });
        transport
            .expect_request()
            .withf(|_, payload, _| payload == br#"{"offset":2}"#)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| {
                Ok(br#"{"total":3,"offset":2,"limit":2,"consumers":["c"]}"#.to_vec())
            });

        let manager = JetStreamManager::new(transport);
        let mut pager = Pager::new(ConsumerNamesFetcher::new(manager, "ORDERS"), ctx());
        assert_eq!(drain(&mut pager).await, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_null_item_array_is_empty_page() {
        let mut transport = MockTransport::new();
        transport
            .expect_request()
            .times(1)
            .returning(|_, _, _| Ok(br#"{"total":0,"offset":0,"limit":256,"streams":null}"#.to_vec()));

        let manager = JetStreamManager::new(transport);
        let mut pager = Pager::new(StreamNamesFetcher::new(manager, None), ctx());
        assert!(!pager.advance().await);
        assert!(pager.error().is_none());
    }
}
