//! Background task turning a [`Pager`] into a stream of items.

use crate::error::{JsmError, JsmResult};
use crate::options::ResolvedOptions;
use crate::pager::{PageFetcher, Pager};
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Hand-off capacity between the listing task and the reader.
const CHANNEL_CAPACITY: usize = 1;

/// Items of one listing call, in server order.
///
/// The stream ends when the listing is exhausted, fails, or its context is
/// done. Call [`finish`](ItemStream::finish) to learn which.
#[derive(Debug)]
pub struct ItemStream<T> {
    rx: mpsc::Receiver<T>,
    handle: JoinHandle<JsmResult<()>>,
}

impl<T> ItemStream<T> {
    /// Receive the next item, `None` once the listing task has stopped.
    pub async fn next_item(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Stop reading and wait for the listing task's outcome.
    ///
    /// Returns the pager's error, [`JsmError::Cancelled`] or
    /// [`JsmError::Timeout`] when the context ended the listing, and `Ok`
    /// when every item was delivered or the reader stopped early.
    pub async fn finish(self) -> JsmResult<()> {
        let Self { rx, handle } = self;
        drop(rx);
        handle
            .await
            .map_err(|e| JsmError::Task(e.to_string()))?
    }
}

impl<T> Stream for ItemStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

/// Drive a pager built from `fetcher` on a background task.
///
/// The task owns `opts`, so a timeout-derived token is released exactly once
/// when it exits.
pub(crate) fn spawn_listing<F>(fetcher: F, opts: ResolvedOptions) -> ItemStream<F::Item>
where
    F: PageFetcher + 'static,
{
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let ctx = opts.context().clone();
    let mut pager = Pager::new(fetcher, ctx.clone());

    let handle = tokio::spawn(async move {
        let _opts = opts;
        debug!("Listing started");

        while pager.advance().await {
            for item in pager.take_page() {
                tokio::select! {
                    biased;
                    _ = ctx.done() => {
                        let err = ctx.done_error();
                        debug!(error = %err, offset = pager.offset(), "Listing aborted");
                        return Err(err);
                    }
                    sent = tx.send(item) => {
                        if sent.is_err() {
                            debug!(offset = pager.offset(), "Listing reader went away");
                            return Ok(());
                        }
                    }
                }
            }
        }

        debug!(offset = pager.offset(), failed = pager.error().is_some(), "Listing finished");
        match pager.into_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    });

    ItemStream { rx, handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::JetStreamManager;
    use crate::options::ManageOpt;
    use crate::pager::StreamInfoFetcher;
    use crate::pager::testing::VecFetcher;
    use crate::transport::testing::HangingTransport;
    use futures::StreamExt;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    const WAIT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_items_arrive_in_order() {
        let fetcher = VecFetcher::new((1..=7).collect(), 3);
        let opts = ResolvedOptions::resolve(&[], WAIT).unwrap();

        let mut items = spawn_listing(fetcher, opts);
        let mut received = Vec::new();
        while let Some(item) = items.next().await {
            received.push(item);
        }

        assert_eq!(received, vec![1, 2, 3, 4, 5, 6, 7]);
        assert!(items.finish().await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_listing_closes_immediately() {
        let fetcher = VecFetcher::new(Vec::new(), 3);
        let opts = ResolvedOptions::resolve(&[], WAIT).unwrap();

        let mut items = spawn_listing(fetcher, opts);
        assert_eq!(items.next_item().await, None);
        assert!(items.finish().await.is_ok());
    }

    #[tokio::test]
    async fn test_pager_error_reported_by_finish() {
        let mut fetcher = VecFetcher::new((1..=6).collect(), 2);
        fetcher.fail_at_call = Some(2);
        let opts = ResolvedOptions::resolve(&[], WAIT).unwrap();

        let (received, outcome) = drain(spawn_listing(fetcher, opts)).await;
        assert_eq!(received, vec![1, 2]);
        assert_eq!(outcome.unwrap_err().to_string(), "listing failed");
    }

    #[tokio::test]
    async fn test_cancel_mid_delivery_stops_fetching() {
        let fetcher = VecFetcher::new((1..=20).collect(), 2);
        let calls = fetcher.calls.clone();
        let token = CancellationToken::new();
        let opts = ResolvedOptions::resolve(&[ManageOpt::Context(token.clone())], WAIT).unwrap();

        let mut items = spawn_listing(fetcher, opts);
        assert_eq!(items.next_item().await, Some(1));

        token.cancel();
        let calls_at_cancel = calls.load(Ordering::SeqCst);

        while items.next_item().await.is_some() {}
        let err = items.finish().await.unwrap_err();

        assert!(matches!(err, JsmError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), calls_at_cancel);
        assert!(calls_at_cancel < 10);
    }

    #[tokio::test]
    async fn test_cancel_while_fetch_pending() {
        let manager = JetStreamManager::new(HangingTransport);
        let token = CancellationToken::new();
        let opts = ResolvedOptions::resolve(&[ManageOpt::Context(token.clone())], WAIT).unwrap();

        let items = spawn_listing(StreamInfoFetcher::new(manager), opts);
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();

        let (received, outcome) = tokio::time::timeout(Duration::from_secs(2), drain(items))
            .await
            .expect("listing should end on cancel");
        assert!(received.is_empty());
        assert!(matches!(outcome, Err(JsmError::Cancelled)));
    }

    #[tokio::test]
    async fn test_dropped_reader_ends_task_cleanly() {
        let fetcher = VecFetcher::new((1..=20).collect(), 2);
        let calls = fetcher.calls.clone();
        let opts = ResolvedOptions::resolve(&[], WAIT).unwrap();

        let mut items = spawn_listing(fetcher, opts);
        assert_eq!(items.next_item().await, Some(1));
        assert!(items.finish().await.is_ok());
        assert!(calls.load(Ordering::SeqCst) < 10);
    }

    #[tokio::test]
    async fn test_derived_token_released_when_task_exits() {
        let fetcher = VecFetcher::new(vec![1], 1);
        let opts = ResolvedOptions::resolve(&[], WAIT).unwrap();
        let token = opts.context().token().clone();

        let (_, outcome) = drain(spawn_listing(fetcher, opts)).await;
        assert!(outcome.is_ok());
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_caller_token_survives_listing() {
        let fetcher = VecFetcher::new(vec![1, 2], 1);
        let token = CancellationToken::new();
        let opts = ResolvedOptions::resolve(&[ManageOpt::Context(token.clone())], WAIT).unwrap();

        let (_, outcome) = drain(spawn_listing(fetcher, opts)).await;
        assert!(outcome.is_ok());
        assert!(!token.is_cancelled());
    }

    /// Drain every item, then wait for the task so its exit effects are visible.
    async fn drain<T>(mut items: ItemStream<T>) -> (Vec<T>, JsmResult<()>) {
        let mut out = Vec::new();
        while let Some(item) = items.next_item().await {
            out.push(item);
        }
        (out, items.finish().await)
    }
}
