// ABOUTME: Chromium-backed Session implementation driven over the DevTools protocol.
// ABOUTME: Launches one dedicated browser process per session and tears it down deterministically.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::options::Options;
use crate::profiles::WaitPolicy;
use crate::session::{Session, SessionManager};

/// Flags Chromium needs to run inside minimal containers.
const CHROMIUM_ARGS: [&str; 4] = [
    "--disable-setuid-sandbox",
    "--no-sandbox",
    "--single-process",
    "--no-zygote",
];

/// Poll cadence while waiting for a selector to appear.
const SELECTOR_POLL: Duration = Duration::from_millis(250);

/// Budget for each teardown step; a wedged browser gets killed after it.
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Opens one dedicated Chromium process per session. Sessions are never
/// shared or pooled, so a crashed page can only ever poison its own
/// extraction.
#[derive(Debug, Clone)]
pub struct ChromiumSessionManager {
    executable: Option<PathBuf>,
    window_size: (u32, u32),
    launch_timeout: Duration,
    navigation_timeout: Duration,
    network_idle_settle: Duration,
}

impl ChromiumSessionManager {
    pub fn new(opts: &Options) -> Self {
        Self {
            executable: opts.browser_executable.clone(),
            window_size: opts.window_size,
            launch_timeout: opts.launch_timeout,
            navigation_timeout: opts.navigation_timeout,
            network_idle_settle: opts.network_idle_settle,
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, ExtractError> {
        let mut builder =
            BrowserConfig::builder().window_size(self.window_size.0, self.window_size.1);
        for arg in CHROMIUM_ARGS {
            builder = builder.arg(arg);
        }
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        builder
            .build()
            .map_err(|err| ExtractError::launch("configure", Some(anyhow!(err))))
    }
}

#[async_trait]
impl SessionManager for ChromiumSessionManager {
    async fn open(&self) -> Result<Box<dyn Session>, ExtractError> {
        let config = self.browser_config()?;

        debug!(window = ?self.window_size, "launching chromium");
        let launched = tokio::time::timeout(self.launch_timeout, Browser::launch(config)).await;
        let (browser, mut handler) = match launched {
            Ok(Ok(pair)) => pair,
            Ok(Err(err)) => return Err(ExtractError::launch("launch", Some(err.into()))),
            Err(_) => {
                return Err(ExtractError::launch(
                    "launch",
                    Some(anyhow!(
                        "browser did not start within {:?}",
                        self.launch_timeout
                    )),
                ))
            }
        };

        // CDP traffic stops flowing if nobody drains the handler.
        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let opened =
            tokio::time::timeout(self.launch_timeout, browser.new_page("about:blank")).await;
        let page = match opened {
            Ok(Ok(page)) => page,
            Ok(Err(err)) => {
                teardown(None, Some(browser), Some(handler_task)).await;
                return Err(ExtractError::launch("new-page", Some(err.into())));
            }
            Err(_) => {
                teardown(None, Some(browser), Some(handler_task)).await;
                return Err(ExtractError::launch(
                    "new-page",
                    Some(anyhow!(
                        "page did not open within {:?}",
                        self.launch_timeout
                    )),
                ));
            }
        };

        Ok(Box::new(ChromiumSession {
            page: Some(page),
            browser: Some(browser),
            handler_task: Some(handler_task),
            navigation_timeout: self.navigation_timeout,
            network_idle_settle: self.network_idle_settle,
            url: String::new(),
        }))
    }
}

/// A live page plus the browser process and handler task behind it.
///
/// Fields move to `None` on close so teardown stays idempotent.
struct ChromiumSession {
    page: Option<Page>,
    browser: Option<Browser>,
    handler_task: Option<JoinHandle<()>>,
    navigation_timeout: Duration,
    network_idle_settle: Duration,
    url: String,
}

#[async_trait]
impl Session for ChromiumSession {
    async fn navigate(&mut self, url: &str, policy: WaitPolicy) -> Result<(), ExtractError> {
        self.url = url.to_string();
        let Some(page) = self.page.as_ref() else {
            return Err(ExtractError::navigation(
                url,
                "navigate",
                Some(anyhow!("session already closed")),
            ));
        };

        let settle = self.network_idle_settle;
        let load = async move {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            if policy == WaitPolicy::NetworkIdle {
                // The load event fires before late script-driven requests
                // finish; give them a moment to land in the DOM.
                tokio::time::sleep(settle).await;
            }
            Ok::<(), chromiumoxide::error::CdpError>(())
        };

        match tokio::time::timeout(self.navigation_timeout, load).await {
            Ok(Ok(())) => {
                debug!(url, policy = %policy, "navigation complete");
                Ok(())
            }
            Ok(Err(err)) => Err(ExtractError::navigation(url, "navigate", Some(err.into()))),
            Err(_) => Err(ExtractError::timeout(
                url,
                "navigate",
                Some(anyhow!(
                    "no load event within {:?}",
                    self.navigation_timeout
                )),
            )),
        }
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> bool {
        let Some(page) = self.page.as_ref() else {
            return false;
        };
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return false;
            }
            match tokio::time::timeout(remaining, page.find_element(selector)).await {
                Ok(Ok(_)) => return true,
                Ok(Err(_)) => {}
                Err(_) => return false,
            }
            let poll =
                SELECTOR_POLL.min(deadline.saturating_duration_since(tokio::time::Instant::now()));
            if poll.is_zero() {
                return false;
            }
            tokio::time::sleep(poll).await;
        }
    }

    async fn content(&mut self) -> Result<String, ExtractError> {
        let Some(page) = self.page.as_ref() else {
            return Err(ExtractError::navigation(
                self.url.as_str(),
                "content",
                Some(anyhow!("session already closed")),
            ));
        };
        match tokio::time::timeout(self.navigation_timeout, page.content()).await {
            Ok(Ok(html)) => Ok(html),
            Ok(Err(err)) => Err(ExtractError::navigation(
                self.url.as_str(),
                "content",
                Some(err.into()),
            )),
            Err(_) => Err(ExtractError::timeout(
                self.url.as_str(),
                "content",
                Some(anyhow!(
                    "no page content within {:?}",
                    self.navigation_timeout
                )),
            )),
        }
    }

    async fn screenshot(&mut self) -> anyhow::Result<Vec<u8>> {
        let page = self
            .page
            .as_ref()
            .ok_or_else(|| anyhow!("session already closed"))?;
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        let bytes = tokio::time::timeout(self.navigation_timeout, page.screenshot(params))
            .await
            .map_err(|_| anyhow!("screenshot timed out"))??;
        Ok(bytes)
    }

    async fn close(&mut self) {
        teardown(
            self.page.take(),
            self.browser.take(),
            self.handler_task.take(),
        )
        .await;
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if self.page.is_none() && self.browser.is_none() {
            return;
        }
        let page = self.page.take();
        let browser = self.browser.take();
        let handler_task = self.handler_task.take();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!("browser session dropped without close, detaching teardown");
                handle.spawn(teardown(page, browser, handler_task));
            }
            // No runtime left; dropping the Browser kills the child process.
            Err(_) => {
                if let Some(task) = handler_task {
                    task.abort();
                }
            }
        }
    }
}

/// Close the page, close the browser, reap the process, and stop the
/// handler task. Every step is bounded so a wedged browser cannot stall
/// the pipeline past the grace budget.
async fn teardown(
    page: Option<Page>,
    browser: Option<Browser>,
    handler_task: Option<JoinHandle<()>>,
) {
    if let Some(page) = page {
        match tokio::time::timeout(CLOSE_GRACE, page.close()).await {
            Ok(Err(err)) => debug!(error = %err, "page close failed"),
            Err(_) => debug!("page close timed out"),
            Ok(Ok(_)) => {}
        }
    }
    if let Some(mut browser) = browser {
        match tokio::time::timeout(CLOSE_GRACE, browser.close()).await {
            Ok(Err(err)) => debug!(error = %err, "browser close failed"),
            Err(_) => debug!("browser close timed out"),
            Ok(Ok(_)) => {}
        }
        match tokio::time::timeout(CLOSE_GRACE, browser.wait()).await {
            Ok(Err(err)) => debug!(error = %err, "browser did not exit cleanly"),
            Err(_) => {
                debug!("browser exit timed out, killing the process");
                let _ = browser.kill().await;
            }
            Ok(Ok(_)) => {}
        }
    }
    if let Some(task) = handler_task {
        task.abort();
    }
}
