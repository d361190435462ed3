//! Shared browser lifecycle
//!
//! One browser process serves every request. It is launched lazily by the
//! first caller; concurrent callers queue on the mutex and reuse the same
//! instance instead of racing to launch a second one.

use std::path::PathBuf;
use std::sync::Arc;

use chromiumoxide::Page;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::launch::launch_browser;
use super::session::PageSession;
use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::utils::with_timeout;

/// Browser process plus the task pumping its CDP connection
pub struct BrowserWrapper {
    browser: Browser,
    handler: JoinHandle<()>,
    user_data_dir: Option<PathBuf>,
}

impl BrowserWrapper {
    fn new(browser: Browser, handler: JoinHandle<()>, user_data_dir: PathBuf) -> Self {
        Self {
            browser,
            handler,
            user_data_dir: Some(user_data_dir),
        }
    }

    fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Close the process, wait for it to exit, then remove the profile
    async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Failed to wait for browser exit: {}", e);
        }
        self.cleanup_temp_dir();
    }

    /// Must run after the process has exited so the profile is unlocked
    fn cleanup_temp_dir(&mut self) {
        if let Some(path) = self.user_data_dir.take() {
            debug!("Removing browser profile {}", path.display());
            if let Err(e) = std::fs::remove_dir_all(&path) {
                warn!(
                    "Failed to remove browser profile {}: {}",
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
        if self.user_data_dir.is_some() {
            warn!("BrowserWrapper dropped without shutdown - removing profile in Drop");
            self.cleanup_temp_dir();
        }
    }
}

/// Lazily launched, health-checked shared browser
#[derive(Clone)]
pub struct BrowserManager {
    browser: Arc<Mutex<Option<BrowserWrapper>>>,
    config: Arc<FetchConfig>,
}

impl BrowserManager {
    /// The browser is not launched until the first session is opened
    #[must_use]
    pub fn new(config: FetchConfig) -> Self {
        Self {
            browser: Arc::new(Mutex::new(None)),
            config: Arc::new(config),
        }
    }

    /// Open a page inside a fresh browsing context
    ///
    /// Launches (or relaunches after a crash) the shared browser first.
    /// The context keeps cookies and storage apart from every other
    /// in-flight request.
    ///
    /// # Errors
    ///
    /// `FetchError::Browser` if the browser cannot be launched within the
    /// launch timeout or the context/page cannot be created.
    pub async fn open_session(&self) -> Result<PageSession, FetchError> {
        let mut guard = self.browser.lock().await;
        let wrapper = self.ensure_running(&mut guard).await?;
        let browser = wrapper.browser();

        let context_id = browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| FetchError::Browser(format!("Failed to create browsing context: {e}")))?
            .result
            .browser_context_id;

        let mut target = CreateTargetParams::new("about:blank");
        target.browser_context_id = Some(context_id.clone());

        let page: Page = match browser.new_page(target).await {
            Ok(page) => page,
            Err(e) => {
                // Context is useless without its page
                if let Err(dispose_err) = browser
                    .execute(DisposeBrowserContextParams::new(context_id))
                    .await
                {
                    warn!("Failed to dispose orphaned context: {}", dispose_err);
                }
                return Err(FetchError::Browser(format!("Failed to open page: {e}")));
            }
        };
        drop(guard);

        debug!("Opened browsing context {:?}", context_id);
        Ok(PageSession::new(page, context_id, self.clone()))
    }

    /// Dispose a browsing context and every page in it
    pub(crate) async fn dispose_context(&self, context_id: BrowserContextId) {
        let guard = self.browser.lock().await;
        let Some(wrapper) = guard.as_ref() else {
            debug!("Browser already shut down; context {:?} went with it", context_id);
            return;
        };
        if let Err(e) = wrapper
            .browser()
            .execute(DisposeBrowserContextParams::new(context_id.clone()))
            .await
        {
            warn!("Failed to dispose browsing context {:?}: {}", context_id, e);
        }
    }

    async fn ensure_running<'g>(
        &self,
        slot: &'g mut Option<BrowserWrapper>,
    ) -> Result<&'g BrowserWrapper, FetchError> {
        let healthy = match slot.as_ref() {
            Some(wrapper) => match wrapper.browser().version().await {
                Ok(_) => true,
                Err(e) => {
                    warn!("Browser health check failed: {}. Relaunching", e);
                    false
                }
            },
            None => false,
        };

        if !healthy {
            if let Some(crashed) = slot.take() {
                crashed.close().await;
            }

            info!("Launching shared browser");
            let (browser, handler, user_data_dir) = with_timeout(
                launch_browser(&self.config),
                self.config.launch_timeout(),
                "Browser launch",
            )
            .await
            .map_err(|e| FetchError::Browser(format!("{e:#}")))?;
            *slot = Some(BrowserWrapper::new(browser, handler, user_data_dir));
        }

        slot.as_ref()
            .ok_or_else(|| FetchError::Browser("browser missing after launch".to_string()))
    }

    /// Close the browser if it is running; later calls are no-ops
    pub async fn shutdown(&self) {
        let mut guard = self.browser.lock().await;
        if let Some(wrapper) = guard.take() {
            info!("Shutting down shared browser");
            wrapper.close().await;
        }
    }

    pub async fn is_running(&self) -> bool {
        self.browser.lock().await.is_some()
    }
}
