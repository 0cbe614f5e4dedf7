//! Retry coordinator with unconditional context release
//!
//! Wraps one full search attempt: acquire a fresh browsing context, run
//! the pagination engine, and release the context on every exit path.
//! Release is structural - the context rides in an RAII guard that is
//! explicitly closed on both outcome branches and whose `Drop` spawns
//! disposal if the future is cancelled out from under it.

use std::future::Future;
use tokio::runtime::Handle;
use tracing::{info, warn};

use super::SearchParams;
use crate::errors::{SearchError, SearchResult};
use crate::navigator::SerpDriver;
use crate::pagination::{SearchAttempt, run_attempt};

/// An acquired browsing context that can mint page drivers and must be
/// disposed exactly once
///
/// The trait seam lets the coordinator be exercised with counting fakes;
/// the real implementation is
/// [`StealthContext`](crate::context::StealthContext).
pub trait SearchContext: Send + 'static {
    type Driver: SerpDriver + Send;

    /// Create a prepared page driver inside this context
    fn new_driver(&mut self) -> impl Future<Output = SearchResult<Self::Driver>> + Send;

    /// Release the context and everything it owns
    fn dispose(self) -> impl Future<Output = ()> + Send;
}

/// RAII guard ensuring a context is disposed exactly once
pub struct ContextGuard<C: SearchContext> {
    context: Option<C>,
}

impl<C: SearchContext> ContextGuard<C> {
    #[must_use]
    pub fn new(context: C) -> Self {
        Self {
            context: Some(context),
        }
    }

    /// Access the guarded context
    pub fn context_mut(&mut self) -> &mut C {
        self.context
            .as_mut()
            .expect("BUG: context guard used after close")
    }

    /// Dispose the context now
    pub async fn close(mut self) {
        if let Some(context) = self.context.take() {
            context.dispose().await;
        }
    }
}

impl<C: SearchContext> Drop for ContextGuard<C> {
    fn drop(&mut self) {
        if let Some(context) = self.context.take() {
            // Reached when the owning future was cancelled (e.g. the
            // overall search deadline fired mid-attempt)
            warn!("Context guard dropped without explicit close; disposing in background");
            if let Ok(handle) = Handle::try_current() {
                handle.spawn(context.dispose());
            }
        }
    }
}

/// Run a search with retries, acquiring one fresh context per attempt
///
/// A `Blocked`-flagged attempt is a successful outcome and is never
/// retried here - escalation is the caller's decision. Only transient
/// errors (context creation, navigation) drive the loop; after
/// `retry_count + 1` failed attempts the last error surfaces inside
/// [`SearchError::Exhausted`].
pub async fn search_with_retry<C, F, Fut>(
    factory: F,
    params: &SearchParams,
) -> SearchResult<SearchAttempt>
where
    C: SearchContext,
    F: Fn() -> Fut,
    Fut: Future<Output = SearchResult<C>> + Send,
{
    let mut last_error: Option<SearchError> = None;

    for attempt in 0..=params.retry_count {
        if attempt > 0 {
            // Linear backoff scaled by the inter-page interval
            let delay = params.sleep_interval.mul_f64(f64::from(attempt));
            info!(
                "Retrying search '{}' (attempt {}/{}) after {:?}",
                params.query,
                attempt + 1,
                params.retry_count + 1,
                delay
            );
            tokio::time::sleep(delay).await;
        }

        let context = match factory().await {
            Ok(context) => context,
            Err(e) => {
                // No context exists on this path; nothing to dispose
                warn!("Attempt {} failed before navigation: {e}", attempt + 1);
                if !e.is_transient() {
                    return Err(e);
                }
                last_error = Some(e);
                continue;
            }
        };

        let mut guard = ContextGuard::new(context);
        let outcome = async {
            let mut driver = guard.context_mut().new_driver().await?;
            run_attempt(&mut driver, params, attempt).await
        }
        .await;
        // Release before inspecting the outcome: success and failure
        // paths both close exactly one context
        guard.close().await;

        match outcome {
            Ok(state) => return Ok(state),
            Err(e) => {
                warn!(
                    "Attempt {}/{} failed: {e}",
                    attempt + 1,
                    params.retry_count + 1
                );
                if !e.is_transient() {
                    return Err(e);
                }
                last_error = Some(e);
            }
        }
    }

    let source =
        last_error.unwrap_or_else(|| SearchError::Other("no attempt produced an error".into()));
    Err(SearchError::Exhausted {
        attempts: params.retry_count + 1,
        source: Box::new(source),
    })
}
