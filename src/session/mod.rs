//! Browser session lifecycle manager
//!
//! Owns the single long-lived Chrome process shared by all searches.
//! The session is launched lazily on first acquire, health-checked and
//! relaunched transparently after a crash, and torn down on explicit
//! shutdown. Initialization is serialized behind one async lock so
//! concurrent first callers never launch two browser processes.

mod browser;

pub use browser::{BrowserWrapper, launch_browser};

use chromiumoxide::browser::Browser;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::errors::{SearchError, SearchResult};

/// Manager for the shared browser session used by searches
///
/// # Lifecycle
/// - Browser NOT launched on manager creation (lazy initialization)
/// - First `acquire()` call launches the browser (~2-3s)
/// - Subsequent calls return the existing browser (a lock + Arc clone)
/// - `shutdown()` explicitly closes the browser; the next `acquire()`
///   re-initializes
///
/// # Thread safety
/// `Arc<Mutex<Option<BrowserWrapper>>>` serializes initialization and
/// recovery; once the session is ready, callers receive `Arc<Browser>`
/// handles and create browsing contexts without holding the lock.
#[derive(Clone)]
pub struct SessionManager {
    session: Arc<Mutex<Option<BrowserWrapper>>>,
    headless: bool,
}

impl SessionManager {
    /// Create a new session manager; the browser is lazy-launched on
    /// first acquire
    #[must_use]
    pub fn new() -> Self {
        Self::with_headless(true)
    }

    /// Create a manager with explicit headless mode (headful is useful
    /// when debugging block pages interactively)
    #[must_use]
    pub fn with_headless(headless: bool) -> Self {
        Self {
            session: Arc::new(Mutex::new(None)),
            headless,
        }
    }

    /// Get or launch the shared browser, with health check and recovery
    ///
    /// If a session exists, its liveness is verified with a CDP
    /// `version()` call; a crashed browser is cleaned up and replaced.
    /// Launch failures tear down any partially-created resources before
    /// surfacing [`SearchError::SessionInit`].
    pub async fn acquire(&self) -> SearchResult<Arc<Browser>> {
        let mut guard = self.session.lock().await;

        if let Some(wrapper) = guard.as_ref() {
            match wrapper.browser().version().await {
                Ok(_) => {
                    tracing::debug!("Browser health check passed, reusing existing session");
                    return Ok(wrapper.browser_arc());
                }
                Err(e) => {
                    tracing::warn!("Browser health check failed: {e}. Triggering recovery...");
                    if let Some(mut crashed) = guard.take() {
                        // Best-effort cleanup (the process may already be dead)
                        if let Some(browser) = crashed.browser_mut() {
                            let _ = browser.close().await;
                            let _ = browser.wait().await;
                        }
                        crashed.cleanup_temp_dir();
                    }
                    info!("Crashed browser cleaned up, launching new session");
                }
            }
        }

        info!("Launching browser session (first use or after recovery)");
        let (browser, handler, user_data_dir) = launch_browser(self.headless)
            .await
            .map_err(|e| SearchError::SessionInit(format!("{e:#}")))?;
        let wrapper = BrowserWrapper::new(browser, handler, user_data_dir);
        let shared = wrapper.browser_arc();
        *guard = Some(wrapper);

        Ok(shared)
    }

    /// Shut down the browser if running
    ///
    /// Safe to call multiple times; subsequent calls are no-ops. The
    /// browser process is closed gracefully when no attempt still holds
    /// a handle; otherwise it is killed when the last handle drops.
    pub async fn shutdown(&self) -> SearchResult<()> {
        let mut guard = self.session.lock().await;

        if let Some(mut wrapper) = guard.take() {
            info!("Shutting down search browser session");

            match wrapper.browser_mut() {
                Some(browser) => {
                    if let Err(e) = browser.close().await {
                        tracing::warn!("Failed to close browser cleanly: {e}");
                    }
                    if let Err(e) = browser.wait().await {
                        tracing::warn!("Failed to wait for browser exit: {e}");
                    }
                }
                None => {
                    tracing::warn!(
                        "Browser still referenced by an in-flight attempt; process will be \
                         killed when the last handle drops"
                    );
                }
            }

            wrapper.cleanup_temp_dir();
            drop(wrapper);
        }

        Ok(())
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
