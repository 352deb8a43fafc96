// ABOUTME: Options for configuring article extraction behavior.
// ABOUTME: Provides a builder pattern for timeouts, browser placement, and test injection points.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::client::Client;
use crate::profiles::ProfileRegistry;
use crate::session::SessionManager;

/// Configuration options for the extraction client.
#[derive(Debug, Clone)]
pub struct Options {
    /// Budget for starting the browser process and opening its first page.
    pub launch_timeout: Duration,
    /// Budget for one navigation, including the wait policy.
    pub navigation_timeout: Duration,
    /// Settle delay after the load event for network-idle sites.
    pub network_idle_settle: Duration,
    /// Optional bound on a whole extraction call, navigation through
    /// content read. `None` leaves only the per-step timeouts.
    pub deadline: Option<Duration>,
    /// Browser window size at launch.
    pub window_size: (u32, u32),
    /// Explicit Chromium executable; `None` lets the launcher search the
    /// system.
    pub browser_executable: Option<PathBuf>,
    /// Production deployments pin the executable through the environment.
    pub production: bool,
    /// Where to write a PNG of the page when navigation or the content
    /// read fails. `None` disables the capture.
    pub failure_screenshot: Option<PathBuf>,
    /// Profile registry override; `None` uses the builtin profiles.
    pub registry: Option<ProfileRegistry>,
    /// Session manager override; `None` drives a real Chromium.
    pub session_manager: Option<Arc<dyn SessionManager>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            launch_timeout: Duration::from_secs(100),
            navigation_timeout: Duration::from_secs(30),
            network_idle_settle: Duration::from_millis(500),
            deadline: None,
            window_size: (1080, 1024),
            browser_executable: None,
            production: false,
            failure_screenshot: None,
            registry: None,
            session_manager: None,
        }
    }
}

impl Options {
    /// Options mapped from the process environment: `PRENSA_ENV=production`
    /// switches on production mode, which reads the Chromium path from
    /// `PRENSA_CHROMIUM_PATH`.
    pub fn from_env() -> Self {
        let production = std::env::var("PRENSA_ENV")
            .map(|value| value == "production")
            .unwrap_or(false);
        Self::for_environment(production)
    }

    /// Environment mapping with the production decision made by the
    /// caller, e.g. from a CLI flag.
    pub fn for_environment(production: bool) -> Self {
        let browser_executable = if production {
            std::env::var("PRENSA_CHROMIUM_PATH")
                .ok()
                .filter(|path| !path.is_empty())
                .map(PathBuf::from)
        } else {
            None
        };
        Self {
            production,
            browser_executable,
            ..Self::default()
        }
    }
}

/// Builder for creating a customized [`Client`].
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    opts: Options,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the environment mapping instead of the defaults.
    pub fn from_env() -> Self {
        Self {
            opts: Options::from_env(),
        }
    }

    pub fn launch_timeout(mut self, timeout: Duration) -> Self {
        self.opts.launch_timeout = timeout;
        self
    }

    pub fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.opts.navigation_timeout = timeout;
        self
    }

    pub fn network_idle_settle(mut self, settle: Duration) -> Self {
        self.opts.network_idle_settle = settle;
        self
    }

    /// Bound each whole extraction call by `deadline`.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.opts.deadline = Some(deadline);
        self
    }

    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.opts.window_size = (width, height);
        self
    }

    pub fn browser_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.opts.browser_executable = Some(path.into());
        self
    }

    pub fn production(mut self, production: bool) -> Self {
        self.opts.production = production;
        self
    }

    /// Write a PNG of the page state to `path` when navigation or the
    /// content read fails.
    pub fn failure_screenshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.opts.failure_screenshot = Some(path.into());
        self
    }

    /// Replace the builtin site profiles.
    pub fn registry(mut self, registry: ProfileRegistry) -> Self {
        self.opts.registry = Some(registry);
        self
    }

    /// Replace the Chromium session manager, e.g. with a scripted fake.
    pub fn session_manager(mut self, manager: Arc<dyn SessionManager>) -> Self {
        self.opts.session_manager = Some(manager);
        self
    }

    pub fn build(self) -> Client {
        Client::new(self.opts)
    }
}
