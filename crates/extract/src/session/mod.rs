// ABOUTME: Browser session abstraction the extraction pipeline drives pages through.
// ABOUTME: The traits here are the seam that lets tests swap Chromium for a scripted fake.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ExtractError;
use crate::profiles::WaitPolicy;

pub mod chromium;

pub use chromium::ChromiumSessionManager;

/// One live browser page, scoped to a single extraction call.
///
/// A session is opened, driven through navigate/wait/content, and then
/// closed exactly once by the pipeline. `close` must be idempotent.
#[async_trait]
pub trait Session: Send {
    /// Navigate to `url` and block until the profile's wait policy is
    /// satisfied.
    async fn navigate(&mut self, url: &str, policy: WaitPolicy) -> Result<(), ExtractError>;

    /// Wait up to `timeout` for `selector` to match an element. Returns
    /// false when the budget runs out; absence is not an error.
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> bool;

    /// Snapshot of the rendered page HTML.
    async fn content(&mut self) -> Result<String, ExtractError>;

    /// PNG capture of the current page state, for failure diagnostics.
    async fn screenshot(&mut self) -> anyhow::Result<Vec<u8>>;

    /// Tear the page and its browser process down. Never fails; callers
    /// invoke it on every path out of the pipeline.
    async fn close(&mut self);
}

/// Opens fresh sessions for the pipeline.
#[async_trait]
pub trait SessionManager: Send + Sync + fmt::Debug {
    async fn open(&self) -> Result<Box<dyn Session>, ExtractError>;
}
