use std::{ffi::OsStr, sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use headless_chrome::{
    browser::{default_executable, tab::NoElementFound},
    Browser, LaunchOptions, Tab,
};
use sysinfo::{Pid, PidExt, ProcessExt, System, SystemExt};
use tokio::time::sleep;

use crate::{
    config::Backend,
    utils::{LinkCollector, MOBILE_USER_AGENT, MOBILE_VIEWPORT},
};

use super::{Scraper, ScraperOptions};

const SCROLL_SCRIPT: &str = "window.scrollBy(0, window.innerHeight);";

/// `find_elements` reports an empty selector result as an error; only
/// that case is safe to treat as "nothing to collect".
fn is_anchorless_page(e: &anyhow::Error) -> bool {
    e.downcast_ref::<NoElementFound>().is_some()
}

/// Driver over headless_chrome. Always runs headful with
/// anti-automation-detection arguments; the headless flag is not exposed
/// by this variant.
pub struct HeadlessChromeScraper {
    browser: Browser,
    tab: Arc<Tab>,
    opts: ScraperOptions,
}

impl HeadlessChromeScraper {
    pub async fn launch(opts: ScraperOptions) -> anyhow::Result<Self> {
        let launch_options = LaunchOptions::default_builder()
            .path(Some(default_executable().map_err(|e| anyhow!(e))?))
            .window_size(Some(MOBILE_VIEWPORT))
            .idle_browser_timeout(Duration::from_secs(opts.navigation_timeout_secs))
            .headless(false)
            .sandbox(opts.sandbox)
            .args(vec![
                OsStr::new("--disable-blink-features=AutomationControlled"),
                OsStr::new("--no-first-run"),
                OsStr::new("--no-default-browser-check"),
            ])
            .build()
            .map_err(|e| anyhow!("could not build launch options: {}", e))?;
        let browser = Browser::new(launch_options).context("browser launching error")?;

        let tab = browser.new_tab().context("could not create tab")?;
        tab.set_default_timeout(Duration::from_secs(opts.navigation_timeout_secs));
        if opts.mobile_ua {
            tab.set_user_agent(MOBILE_USER_AGENT, None, Some("Android"))
                .context("could not set user agent")?;
        }

        Ok(HeadlessChromeScraper { browser, tab, opts })
    }

    async fn goto(&self, url: &str, settle_ms: u64) -> anyhow::Result<()> {
        debug!("navigating to {}", url);
        self.tab
            .navigate_to(url)
            .context(format!("could not navigate to {}", url))?
            .wait_until_navigated()
            .context(format!("could not finish navigation to {}", url))?;
        sleep(Duration::from_millis(settle_ms)).await;
        Ok(())
    }

    fn harvest(&self, collector: &mut LinkCollector) -> anyhow::Result<()> {
        let elements = match self.tab.find_elements("a") {
            Ok(elements) => elements,
            // an anchor-less page is benign, a dead tab is not
            Err(e) if is_anchorless_page(&e) => {
                debug!("no anchors found on {}", self.tab.get_url());
                return Ok(());
            }
            Err(e) => {
                return Err(e.context(format!(
                    "could not query anchors on {}",
                    self.tab.get_url()
                )))
            }
        };
        let anchors = elements.len();
        for element in elements.iter() {
            let attributes = match element
                .get_attributes()
                .context("could not read anchor attributes")?
            {
                Some(attributes) => attributes,
                None => continue,
            };
            // attributes come back as a flat [name, value, ...] list
            if let Some(pos) = attributes.iter().position(|a| a == "href") {
                if let Some(href) = attributes.get(pos + 1) {
                    collector.offer(href);
                }
            }
        }
        debug!(
            "{} anchors in dom, {} video links so far",
            anchors,
            collector.len()
        );
        Ok(())
    }

    fn scroll_once(&self) -> anyhow::Result<()> {
        self.tab
            .evaluate(SCROLL_SCRIPT, false)
            .context("could not scroll viewport")?;
        Ok(())
    }

    fn kill(&self) -> bool {
        let pid = match self.browser.get_process_id() {
            Some(pid) => pid,
            None => return false,
        };
        let mut s = System::new();
        if s.refresh_process(Pid::from_u32(pid)) {
            if let Some(process) = s.process(Pid::from_u32(pid)) {
                debug!("killing browser process with id {}", pid);
                process.kill();
                return true;
            }
        }
        false
    }
}

#[async_trait]
impl Scraper for HeadlessChromeScraper {
    async fn open_home(&mut self) -> anyhow::Result<()> {
        self.opts.check_terminated()?;
        let home = self.opts.home_url.clone();
        self.goto(&home, self.opts.home_settle_ms).await
    }

    async fn collect_video_links(
        &mut self,
        seed_url: Option<&str>,
        scrolls: u32,
    ) -> anyhow::Result<Vec<String>> {
        if let Some(seed) = seed_url {
            self.opts.check_terminated()?;
            self.goto(seed, self.opts.seed_settle_ms).await?;
        }

        let mut collector = LinkCollector::new();
        self.harvest(&mut collector)?;
        for pass in 0..scrolls {
            self.opts.check_terminated()?;
            self.scroll_once()?;
            sleep(self.opts.scroll_pause()).await;
            self.harvest(&mut collector)?;
            debug!("scroll pass {}/{} done", pass + 1, scrolls);
        }
        info!("collected {} video links", collector.len());
        Ok(collector.into_links())
    }

    async fn shutdown(&mut self) -> anyhow::Result<()> {
        debug!("shutting headless_chrome down...");
        // the process is killed outright so a failing devtools teardown
        // cannot leak it
        if !self.kill() {
            debug!("browser process already gone");
        }
        Ok(())
    }

    fn backend(&self) -> Backend {
        Backend::HeadlessChrome
    }
}

impl Drop for HeadlessChromeScraper {
    fn drop(&mut self) {
        // safety net when shutdown was never reached
        self.kill();
    }
}
