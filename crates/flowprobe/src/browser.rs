//! Chromium launcher and the session factory the CLI runs journeys with.
//!
//! One browser process serves the whole run. Each attempt gets its own
//! browser context, so cookies and storage never leak between scenarios.

use crate::config::{BrowserConfig, DeviceProfile, LoanSiteConfig};
use crate::driver::{ChromiumDriver, PageDriver, PageSetup};
use crate::harness::SessionFactory;
use crate::result::{FlowError, FlowResult};
use crate::scenario::Site;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams,
};
use futures::StreamExt;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

fn launch_error(e: impl fmt::Display) -> FlowError {
    FlowError::BrowserLaunch {
        message: e.to_string(),
    }
}

/// A running Chromium
pub struct Browser {
    inner: Arc<Mutex<CdpBrowser>>,
    handle: JoinHandle<()>,
}

impl fmt::Debug for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Browser").finish_non_exhaustive()
    }
}

impl Browser {
    /// Launch Chromium with `config`
    pub async fn launch(config: &BrowserConfig) -> FlowResult<Self> {
        let mut builder = CdpConfig::builder();
        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if config.ignore_https_errors {
            builder = builder.arg("--ignore-certificate-errors");
        }
        if let Some(path) = &config.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder.build().map_err(launch_error)?;

        let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(launch_error)?;
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });
        info!(headless = config.headless, "chromium launched");
        Ok(Self {
            inner: Arc::new(Mutex::new(browser)),
            handle,
        })
    }

    /// Fresh page in a fresh browser context
    pub async fn new_isolated_page(&self, setup: &PageSetup) -> FlowResult<ChromiumDriver> {
        let mut browser = self.inner.lock().await;
        let context = browser
            .create_browser_context(CreateBrowserContextParams::default())
            .await
            .map_err(|e| FlowError::driver(e.to_string()))?;
        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context.clone())
            .build()
            .map_err(FlowError::driver)?;
        let page = browser
            .new_page(target)
            .await
            .map_err(|e| FlowError::driver(e.to_string()))?;
        drop(browser);

        Ok(ChromiumDriver::attach(page, setup)
            .await?
            .owning_context(Arc::clone(&self.inner), context))
    }

    /// Close the browser process
    pub async fn close(self) -> FlowResult<()> {
        let result = self.inner.lock().await.close().await;
        self.handle.abort();
        result.map(drop).map_err(launch_error)
    }
}

/// [`SessionFactory`] opening isolated Chromium pages
#[derive(Debug)]
pub struct ChromiumSessionFactory {
    browser: Browser,
    loan: LoanSiteConfig,
}

impl ChromiumSessionFactory {
    /// Launch a browser for a run against `loan`
    pub async fn launch(config: &BrowserConfig, loan: LoanSiteConfig) -> FlowResult<Self> {
        Ok(Self {
            browser: Browser::launch(config).await?,
            loan,
        })
    }

    /// Page setup for `site` on `project`
    #[must_use]
    pub fn setup_for(&self, project: DeviceProfile, site: Site) -> PageSetup {
        PageSetup {
            profile: project,
            basic_auth: match site {
                Site::Loan => self.loan.basic_auth.clone(),
                Site::Store => None,
            },
        }
    }

    /// Shut the browser down
    pub async fn shutdown(self) -> FlowResult<()> {
        self.browser.close().await
    }
}

#[async_trait]
impl SessionFactory for ChromiumSessionFactory {
    async fn open(&self, project: DeviceProfile, site: Site) -> FlowResult<Arc<dyn PageDriver>> {
        let setup = self.setup_for(project, site);
        match self.browser.new_isolated_page(&setup).await {
            Ok(driver) => Ok(Arc::new(driver)),
            Err(e) => {
                warn!(error = %e, %project, %site, "could not open page");
                Err(e)
            }
        }
    }
}
