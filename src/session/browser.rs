//! Browser process launch and lifecycle wrapper
//!
//! Handles launching the headless Chrome process with anti-automation
//! flags and owns the CDP event handler task for its lifetime.

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tracing::info;

/// Distinguishes profile directories when the session is relaunched
/// within one process (crash recovery re-uses the same pid).
static LAUNCH_SEQ: AtomicU64 = AtomicU64::new(0);

/// Wrapper for the Browser and its event handler task
///
/// The browser is stored in an `Arc` so browsing contexts can be created
/// concurrently without holding the session slot lock. The handler MUST
/// be aborted when the wrapper goes away or it runs indefinitely after
/// the browser process is gone.
pub struct BrowserWrapper {
    browser: std::sync::Arc<Browser>,
    handler: JoinHandle<()>,
    user_data_dir: Option<PathBuf>,
}

impl BrowserWrapper {
    pub(crate) fn new(browser: Browser, handler: JoinHandle<()>, user_data_dir: PathBuf) -> Self {
        Self {
            browser: std::sync::Arc::new(browser),
            handler,
            user_data_dir: Some(user_data_dir),
        }
    }

    /// Get reference to inner browser
    pub(crate) fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Get an Arc handle for sharing across concurrent attempts
    pub(crate) fn browser_arc(&self) -> std::sync::Arc<Browser> {
        std::sync::Arc::clone(&self.browser)
    }

    /// Get mutable reference to the inner browser
    ///
    /// Only succeeds while no attempt still holds an Arc handle.
    pub(crate) fn browser_mut(&mut self) -> Option<&mut Browser> {
        std::sync::Arc::get_mut(&mut self.browser)
    }

    /// Clean up the temp profile directory (blocking operation)
    ///
    /// MUST be called after the process has exited; Chrome keeps file
    /// handles open until then and some platforms refuse removal of
    /// locked files. Blocking `std::fs` because this is also called from
    /// Drop where async is not available.
    pub fn cleanup_temp_dir(&mut self) {
        if let Some(path) = self.user_data_dir.take() {
            info!("Cleaning up temp profile directory: {}", path.display());
            if let Err(e) = std::fs::remove_dir_all(&path) {
                tracing::warn!(
                    "Failed to clean up temp directory {}: {}. Manual cleanup may be required.",
                    path.display(),
                    e
                );
            }
        }
    }
}

impl Drop for BrowserWrapper {
    fn drop(&mut self) {
        self.handler.abort();
        // Browser::drop() kills the Chrome process if still running

        if self.user_data_dir.is_some() {
            tracing::warn!("BrowserWrapper dropped without explicit shutdown - removing temp dir");
            self.cleanup_temp_dir();
        }
    }
}

/// Launch a new browser process with anti-automation flags
///
/// Returns `(Browser, JoinHandle, PathBuf)` where the `PathBuf` is the
/// temp profile directory that must be removed once the process exits.
/// The `JoinHandle` drives CDP events and must be aborted when done;
/// [`BrowserWrapper::drop`] handles both automatically.
///
/// On any failure after the profile directory was created, the directory
/// is removed before the error is surfaced so a failed launch leaves
/// nothing behind.
pub async fn launch_browser(headless: bool) -> Result<(Browser, JoinHandle<()>, PathBuf)> {
    info!("Launching search browser (headless: {headless})");

    let seq = LAUNCH_SEQ.fetch_add(1, Ordering::Relaxed);
    let user_data_dir =
        std::env::temp_dir().join(format!("serpcrawl_chrome_{}_{}", std::process::id(), seq));

    std::fs::create_dir_all(&user_data_dir).context("Failed to create user data directory")?;

    let mut config_builder = BrowserConfigBuilder::default()
        .request_timeout(Duration::from_secs(30))
        .window_size(1366, 768)
        .user_data_dir(user_data_dir.clone())
        // Flags that strip the automation fingerprint
        .arg("--disable-blink-features=AutomationControlled")
        .arg("--disable-infobars")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        // Container-friendly flags
        .arg("--no-sandbox")
        .arg("--disable-setuid-sandbox")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-gpu")
        .arg("--disable-accelerated-2d-canvas")
        .arg("--disable-web-security")
        .arg("--disable-features=IsolateOrigins,site-per-process")
        // Quiet-down flags
        .arg("--disable-extensions")
        .arg("--disable-notifications")
        .arg("--disable-popup-blocking")
        .arg("--disable-background-networking")
        .arg("--metrics-recording-only")
        .arg("--password-store=basic")
        .arg("--use-mock-keychain")
        .arg("--hide-scrollbars")
        .arg("--mute-audio");

    config_builder = if headless {
        config_builder.headless_mode(HeadlessMode::default())
    } else {
        config_builder.with_head()
    };

    let browser_config = match config_builder.build() {
        Ok(config) => config,
        Err(e) => {
            let _ = std::fs::remove_dir_all(&user_data_dir);
            return Err(anyhow::anyhow!("Failed to build browser config: {e}"));
        }
    };

    let (browser, mut handler) = match Browser::launch(browser_config).await {
        Ok(launched) => launched,
        Err(e) => {
            let _ = std::fs::remove_dir_all(&user_data_dir);
            return Err(anyhow::Error::new(e).context("Failed to launch browser"));
        }
    };

    // Spawn the event pump with a tracked JoinHandle so it can be stopped
    let handler_task = task::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                tracing::error!("Browser handler error: {:?}", e);
            }
        }
        info!("Browser event handler task completed");
    });

    Ok((browser, handler_task, user_data_dir))
}
