use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig, HeadlessMode};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::{task::JoinHandle, time::sleep};

use crate::{
    config::Backend,
    types::CrawlerError,
    utils::{LinkCollector, MOBILE_USER_AGENT, MOBILE_VIEWPORT},
};

use super::{first_teardown_failure, Scraper, ScraperOptions};

const HREFS_SCRIPT: &str =
    "Array.from(document.querySelectorAll('a')).map((a) => a.href).filter(Boolean)";
const SCROLL_SCRIPT: &str = "window.scrollBy(0, window.innerHeight)";

/// Driver over the devtools protocol via chromiumoxide. Honors the
/// headless flag from configuration.
pub struct ChromiumScraper {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    opts: ScraperOptions,
}

impl ChromiumScraper {
    pub async fn launch(opts: ScraperOptions) -> anyhow::Result<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(MOBILE_VIEWPORT.0, MOBILE_VIEWPORT.1)
            .headless_mode(if opts.headless {
                HeadlessMode::New
            } else {
                HeadlessMode::False
            })
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");
        if opts.mobile_ua {
            builder = builder.arg(format!("--user-agent={}", MOBILE_USER_AGENT));
        }
        if !opts.sandbox {
            builder = builder.arg("--no-sandbox");
        }
        let config = builder
            .build()
            .map_err(|e| anyhow!("could not build browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("browser launching error")?;

        // the handler stream must be drained for the browser to make progress
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("could not create page")?;
        if opts.mobile_ua {
            page.set_user_agent(MOBILE_USER_AGENT)
                .await
                .context("could not set user agent")?;
        }

        Ok(ChromiumScraper {
            browser,
            page,
            handler,
            opts,
        })
    }

    async fn goto(&self, url: &str, settle_ms: u64) -> anyhow::Result<()> {
        debug!("navigating to {}", url);
        let nav = async {
            self.page
                .goto(url)
                .await
                .context(format!("could not navigate to {}", url))?;
            self.page
                .wait_for_navigation()
                .await
                .context(format!("could not finish navigation to {}", url))?;
            Ok::<_, anyhow::Error>(())
        };
        match tokio::time::timeout(Duration::from_secs(self.opts.navigation_timeout_secs), nav)
            .await
        {
            Ok(res) => res?,
            Err(_) => {
                return Err(CrawlerError::NavigationTimeout {
                    url: url.into(),
                    timeout_secs: self.opts.navigation_timeout_secs,
                }
                .into())
            }
        }
        sleep(Duration::from_millis(settle_ms)).await;
        Ok(())
    }

    async fn harvest(&self, collector: &mut LinkCollector) -> anyhow::Result<()> {
        let hrefs: Vec<String> = self
            .page
            .evaluate(HREFS_SCRIPT)
            .await
            .context("could not extract hrefs")?
            .into_value()
            .context("unexpected href payload")?;
        for href in &hrefs {
            collector.offer(href);
        }
        debug!(
            "{} anchors in dom, {} video links so far",
            hrefs.len(),
            collector.len()
        );
        Ok(())
    }

    async fn scroll_once(&self) -> anyhow::Result<()> {
        self.page
            .evaluate(SCROLL_SCRIPT)
            .await
            .context("could not scroll viewport")?;
        Ok(())
    }
}

#[async_trait]
impl Scraper for ChromiumScraper {
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
        // links visible before any scrolling count too
        self.harvest(&mut collector).await?;
        for pass in 0..scrolls {
            self.opts.check_terminated()?;
            self.scroll_once().await?;
            sleep(self.opts.scroll_pause()).await;
            self.harvest(&mut collector).await?;
            debug!("scroll pass {}/{} done", pass + 1, scrolls);
        }
        info!("collected {} video links", collector.len());
        Ok(collector.into_links())
    }

    async fn shutdown(&mut self) -> anyhow::Result<()> {
        debug!("shutting chromium down...");
        // every teardown step runs even when an earlier one fails; the
        // first failure is reported once all steps have been attempted
        let page = self
            .page
            .clone()
            .close()
            .await
            .context("could not close page");
        let browser = self
            .browser
            .close()
            .await
            .map(|_| ())
            .context("could not close browser");
        let exit = self
            .browser
            .wait()
            .await
            .map(|_| ())
            .context("could not wait for browser exit");
        self.handler.abort();
        first_teardown_failure([page, browser, exit])
    }

    fn backend(&self) -> Backend {
        Backend::Chromium
    }
}

impl Drop for ChromiumScraper {
    fn drop(&mut self) {
        // safety net when shutdown was never reached
        self.handler.abort();
    }
}
