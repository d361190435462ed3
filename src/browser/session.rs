//! One request's browsing context and page

use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use tracing::{debug, warn};

use super::manager::BrowserManager;

/// Exclusively owned page in an isolated browsing context
///
/// Call [`PageSession::close`] on every exit path. If the session is dropped
/// without it (panic, cancelled future) the context is disposed from a
/// spawned task instead.
pub struct PageSession {
    page: Page,
    context_id: Option<BrowserContextId>,
    manager: BrowserManager,
}

impl PageSession {
    pub(crate) fn new(page: Page, context_id: BrowserContextId, manager: BrowserManager) -> Self {
        Self {
            page,
            context_id: Some(context_id),
            manager,
        }
    }

    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Close the page and dispose its browsing context
    pub async fn close(mut self) {
        if let Err(e) = self.page.clone().close().await {
            debug!("Page close failed (disposing context anyway): {}", e);
        }
        if let Some(context_id) = self.context_id.take() {
            self.manager.dispose_context(context_id).await;
        }
    }
}

impl Drop for PageSession {
    fn drop(&mut self) {
        let Some(context_id) = self.context_id.take() else {
            return;
        };
        warn!("PageSession dropped without close - disposing context in background");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let manager = self.manager.clone();
                handle.spawn(async move {
                    manager.dispose_context(context_id).await;
                });
            }
            Err(_) => warn!("No runtime available; context {:?} leaks until browser shutdown", context_id),
        }
    }
}
