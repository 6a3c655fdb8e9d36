use crate::actions::{PageActions, WaitUntil};
use crate::error::{BrowserError, Result};
use crate::fingerprint::FingerprintConfig;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::Page;
use futures_util::stream::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::task::JoinHandle;

const SCROLL_TO_END_JS: &str = "window.scrollTo(0, document.body.scrollHeight)";
const HANDLER_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Quiet period with no new resource entries that counts as network idle.
const NETWORK_QUIET_MS: u64 = 500;
const NETWORK_POLL_MS: u64 = 100;

/// Resolves `true` once the document is complete and the resource timeline
/// has stopped growing for the quiet period, `false` when the budget runs out.
fn network_idle_script(budget_ms: u64) -> String {
    format!(
        r"(async () => {{
            const budget = {budget_ms};
            const quiet = {NETWORK_QUIET_MS};
            const start = Date.now();
            const count = () => {{
                try {{ return performance.getEntriesByType('resource').length; }} catch (_) {{ return 0; }}
            }};
            let last = count();
            let stable = 0;
            while (Date.now() - start < budget) {{
                await new Promise(r => setTimeout(r, {NETWORK_POLL_MS}));
                const now = count();
                if (document.readyState === 'complete' && now === last) {{
                    stable += {NETWORK_POLL_MS};
                    if (stable >= quiet) return true;
                }} else {{
                    stable = 0;
                }}
                last = now;
            }}
            return false;
        }})()"
    )
}

/// Opens browser sessions. Injected into the scraper so tests can supply fixtures.
#[async_trait::async_trait]
pub trait SessionLauncher: Send + Sync {
    /// Launch a browser, open one context with `fingerprint`, and one page in it
    async fn launch(&self, fingerprint: &FingerprintConfig) -> Result<Box<dyn BrowserSession>>;
}

/// One browser + one context + one page.
#[async_trait::async_trait]
pub trait BrowserSession: Send + Sync {
    /// The session's only page
    fn page(&self) -> &dyn PageActions;

    /// Release the page, context and browser
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Process-level launch settings.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
    pub args: Vec<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            args: vec![
                "--no-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
            ],
        }
    }
}

/// Chromium-backed session launcher
#[derive(Debug, Clone, Default)]
pub struct BrowserEngine {
    options: LaunchOptions,
}

impl BrowserEngine {
    pub fn new(options: LaunchOptions) -> Self {
        Self { options }
    }

    fn browser_config(
        &self,
        fingerprint: &FingerprintConfig,
        profile_dir: &Path,
    ) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .window_size(fingerprint.viewport_width, fingerprint.viewport_height)
            .user_data_dir(profile_dir)
            .args(self.options.args.clone());

        if !self.options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.options.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(BrowserError::LaunchFailed)
    }
}

#[async_trait::async_trait]
impl SessionLauncher for BrowserEngine {
    async fn launch(&self, fingerprint: &FingerprintConfig) -> Result<Box<dyn BrowserSession>> {
        // One Chrome profile per session, never the shared default directory
        let profile_dir = tempfile::Builder::new()
            .prefix("scout-chrome-")
            .tempdir()
            .map_err(|e| BrowserError::LaunchFailed(format!("profile directory: {e}")))?;
        let config = self.browser_config(fingerprint, profile_dir.path())?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        // Spawn browser handler
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "chromium handler event error");
                }
            }
        });

        let mut launched = Launched {
            browser,
            handler,
            context_id: None,
            profile_dir,
        };

        match launched.open_page(fingerprint).await {
            Ok(page) => {
                tracing::debug!(user_agent = %fingerprint.user_agent, "browser session opened");
                Ok(Box::new(ChromiumSession {
                    inner: Some(launched),
                    page: ChromiumPage { page },
                }))
            }
            Err(e) => {
                if let Err(close_err) = launched.shutdown(None).await {
                    tracing::warn!(error = %close_err, "cleanup after failed context open");
                }
                Err(e)
            }
        }
    }
}

/// Browser process plus the isolated context created for the session
struct Launched {
    browser: Browser,
    handler: JoinHandle<()>,
    context_id: Option<BrowserContextId>,
    profile_dir: TempDir,
}

impl Launched {
    async fn open_page(&mut self, fingerprint: &FingerprintConfig) -> Result<Page> {
        let created = self
            .browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| BrowserError::ContextFailed(e.to_string()))?;
        let context_id = created.result.browser_context_id.clone();
        self.context_id = Some(context_id.clone());

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id)
            .build()
            .map_err(BrowserError::ContextFailed)?;

        let page = self
            .browser
            .new_page(target)
            .await
            .map_err(|e| BrowserError::ContextFailed(e.to_string()))?;

        page.execute(SetUserAgentOverrideParams::new(
            fingerprint.user_agent.clone(),
        ))
        .await
        .map_err(|e| BrowserError::ContextFailed(e.to_string()))?;

        page.execute(SetDeviceMetricsOverrideParams::new(
            i64::from(fingerprint.viewport_width),
            i64::from(fingerprint.viewport_height),
            1.0,
            false,
        ))
        .await
        .map_err(|e| BrowserError::ContextFailed(e.to_string()))?;

        Ok(page)
    }

    /// Tear down page, context and browser. Every exit path ends here.
    async fn shutdown(mut self, page: Option<Page>) -> Result<()> {
        if let Some(page) = page {
            if let Err(e) = page.close().await {
                tracing::debug!(error = %e, "page close failed");
            }
        }

        if let Some(context_id) = self.context_id.take() {
            if let Err(e) = self
                .browser
                .execute(DisposeBrowserContextParams::new(context_id))
                .await
            {
                tracing::debug!(error = %e, "context dispose failed");
            }
        }

        let closed = self
            .browser
            .close()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()));
        let _ = self.browser.wait().await;

        if tokio::time::timeout(HANDLER_SHUTDOWN_GRACE, &mut self.handler)
            .await
            .is_err()
        {
            self.handler.abort();
        }

        let profile_path = self.profile_dir.path().to_path_buf();
        if let Err(e) = self.profile_dir.close() {
            tracing::debug!(path = %profile_path.display(), error = %e, "profile directory cleanup failed");
        }

        closed.map(|_| ())
    }
}

/// Live Chromium session. Call [`BrowserSession::close`]; dropping it only
/// aborts the event handler and leaves process cleanup to chromiumoxide.
pub struct ChromiumSession {
    inner: Option<Launched>,
    page: ChromiumPage,
}

#[async_trait::async_trait]
impl BrowserSession for ChromiumSession {
    fn page(&self) -> &dyn PageActions {
        &self.page
    }

    async fn close(mut self: Box<Self>) -> Result<()> {
        match self.inner.take() {
            Some(launched) => launched.shutdown(Some(self.page.page.clone())).await,
            None => Ok(()),
        }
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if let Some(launched) = self.inner.take() {
            tracing::warn!("browser session dropped without close");
            launched.handler.abort();
        }
    }
}

struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    /// Poll the page until the network goes quiet or `budget` is spent.
    async fn wait_for_network_idle(&self, url: &str, budget: Duration) {
        let budget_ms = u64::try_from(budget.as_millis()).unwrap_or(u64::MAX);
        if budget_ms == 0 {
            return;
        }

        let idle = async {
            self.page
                .evaluate(network_idle_script(budget_ms))
                .await
                .ok()
                .and_then(|result| result.into_value::<bool>().ok())
                .unwrap_or(false)
        };

        match tokio::time::timeout(budget, idle).await {
            Ok(true) => tracing::debug!(url, "network idle"),
            _ => tracing::debug!(url, budget_ms, "network still busy at deadline, continuing"),
        }
    }
}

fn selector_error(selector: &str, e: impl std::fmt::Display) -> BrowserError {
    BrowserError::SelectorError {
        selector: selector.to_string(),
        reason: e.to_string(),
    }
}

#[async_trait::async_trait]
impl PageActions for ChromiumPage {
    async fn goto(&self, url: &str, wait: WaitUntil, timeout: Duration) -> Result<()> {
        let started = Instant::now();

        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(BrowserError::NavigationError {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(BrowserError::NavigationTimeout {
                    url: url.to_string(),
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                })
            }
        }

        if wait == WaitUntil::NetworkIdle {
            self.wait_for_network_idle(url, timeout.saturating_sub(started.elapsed()))
                .await;
        }
        Ok(())
    }

    async fn query_text(&self, selector: &str) -> Result<Option<String>> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| selector_error(selector, e))?;

        match elements.first() {
            Some(element) => element
                .inner_text()
                .await
                .map_err(|e| selector_error(selector, e)),
            None => Ok(None),
        }
    }

    async fn query_all_text(&self, selector: &str) -> Result<Vec<String>> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| selector_error(selector, e))?;

        let mut texts = Vec::with_capacity(elements.len());
        for element in &elements {
            if let Some(text) = element
                .inner_text()
                .await
                .map_err(|e| selector_error(selector, e))?
            {
                texts.push(text);
            }
        }
        Ok(texts)
    }

    async fn query_all_attr(&self, selector: &str, name: &str) -> Result<Vec<String>> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| selector_error(selector, e))?;

        let mut values = Vec::with_capacity(elements.len());
        for element in &elements {
            if let Some(value) = element
                .attribute(name)
                .await
                .map_err(|e| selector_error(selector, e))?
            {
                values.push(value);
            }
        }
        Ok(values)
    }

    async fn exists(&self, selector: &str) -> Result<bool> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| selector_error(selector, e))?;
        Ok(!elements.is_empty())
    }

    async fn content(&self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))
    }

    async fn scroll_to_end(&self) -> Result<()> {
        self.page
            .evaluate(SCROLL_TO_END_JS)
            .await
            .map(|_| ())
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))
    }
}
