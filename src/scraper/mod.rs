pub mod chromium;
pub mod headless;

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use rand::Rng;

use crate::{
    config::{Backend, Config},
    types::CrawlerError,
    utils::HOME_URL,
};

use self::{chromium::ChromiumScraper, headless::HeadlessChromeScraper};

/// One browser session driving one crawl.
#[async_trait]
pub trait Scraper {
    /// Navigates to the landing page and lets it settle. Establishes the
    /// session state (cookies, mobile emulation) the site keys off.
    async fn open_home(&mut self) -> anyhow::Result<()>;

    /// Scroll-and-collect loop. Navigates to `seed_url` first when given,
    /// then alternates href extraction with viewport scrolls.
    async fn collect_video_links(
        &mut self,
        seed_url: Option<&str>,
        scrolls: u32,
    ) -> anyhow::Result<Vec<String>>;

    /// Releases all browser resources. Safe to call once; the crawl
    /// service calls it on every exit path.
    async fn shutdown(&mut self) -> anyhow::Result<()>;

    fn backend(&self) -> Backend;
}

#[derive(Builder, Debug, Clone)]
#[builder(setter(into))]
pub struct ScraperOptions {
    #[builder(default = "HOME_URL.into()")]
    pub(crate) home_url: String,
    // upper bound on every navigation/wait, the browser gets no unbounded waits
    #[builder(default = "30")]
    pub(crate) navigation_timeout_secs: u64,
    // settle delay after landing-page navigation
    #[builder(default = "2500")]
    pub(crate) home_settle_ms: u64,
    // settle delay after seed navigation
    #[builder(default = "1500")]
    pub(crate) seed_settle_ms: u64,
    // jittered pause between scrolls, avoids a fixed-interval fingerprint
    #[builder(default = "1200")]
    pub(crate) min_scroll_pause_ms: u64,
    #[builder(default = "1800")]
    pub(crate) max_scroll_pause_ms: u64,
    #[builder(default = "true")]
    pub(crate) mobile_ua: bool,
    #[builder(default = "false")]
    pub(crate) headless: bool,
    #[builder(default = "true")]
    pub(crate) sandbox: bool,
    #[builder(default = "Arc::new(AtomicBool::new(false))")]
    pub(crate) should_terminate: Arc<AtomicBool>,
}

impl ScraperOptions {
    pub fn default_builder() -> ScraperOptionsBuilder {
        ScraperOptionsBuilder::default()
    }

    pub(crate) fn check_terminated(&self) -> anyhow::Result<()> {
        if self.should_terminate.load(Ordering::Relaxed) {
            return Err(CrawlerError::Terminated.into());
        }
        Ok(())
    }

    pub(crate) fn scroll_pause(&self) -> Duration {
        let mut rng = rand::thread_rng();
        Duration::from_millis(rng.gen_range(self.min_scroll_pause_ms..=self.max_scroll_pause_ms))
    }
}

/// Reports the first teardown failure only after every step has been
/// attempted, so one failing step cannot suppress the others.
pub(crate) fn first_teardown_failure(
    results: impl IntoIterator<Item = anyhow::Result<()>>,
) -> anyhow::Result<()> {
    let mut first: anyhow::Result<()> = Ok(());
    for res in results {
        if let Err(e) = res {
            if first.is_ok() {
                first = Err(e);
            } else {
                warn!("further teardown failure: {:#}", e);
            }
        }
    }
    first
}

/// Closed set of driver variants, picked once from validated configuration.
pub enum Driver {
    Chromium(ChromiumScraper),
    HeadlessChrome(HeadlessChromeScraper),
}

impl Driver {
    pub async fn from_config(
        config: &Config,
        should_terminate: Arc<AtomicBool>,
    ) -> anyhow::Result<Driver> {
        let opts = ScraperOptions::default_builder()
            .headless(config.headless)
            .mobile_ua(config.mobile_ua)
            .sandbox(config.sandbox)
            .should_terminate(should_terminate)
            .build()?;

        match config.backend {
            Backend::Chromium => Ok(Driver::Chromium(ChromiumScraper::launch(opts).await?)),
            Backend::HeadlessChrome => Ok(Driver::HeadlessChrome(
                HeadlessChromeScraper::launch(opts).await?,
            )),
        }
    }
}

#[async_trait]
impl Scraper for Driver {
    async fn open_home(&mut self) -> anyhow::Result<()> {
        match self {
            Driver::Chromium(s) => s.open_home().await,
            Driver::HeadlessChrome(s) => s.open_home().await,
        }
    }

    async fn collect_video_links(
        &mut self,
        seed_url: Option<&str>,
        scrolls: u32,
    ) -> anyhow::Result<Vec<String>> {
        match self {
            Driver::Chromium(s) => s.collect_video_links(seed_url, scrolls).await,
            Driver::HeadlessChrome(s) => s.collect_video_links(seed_url, scrolls).await,
        }
    }

    async fn shutdown(&mut self) -> anyhow::Result<()> {
        match self {
            Driver::Chromium(s) => s.shutdown().await,
            Driver::HeadlessChrome(s) => s.shutdown().await,
        }
    }

    fn backend(&self) -> Backend {
        match self {
            Driver::Chromium(s) => s.backend(),
            Driver::HeadlessChrome(s) => s.backend(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn options_defaults() {
        let opts = ScraperOptions::default_builder().build().unwrap();
        assert_eq!(opts.home_url, HOME_URL);
        assert_eq!(opts.navigation_timeout_secs, 30);
        assert!(opts.mobile_ua);
        assert!(!opts.headless);
        assert!(opts.sandbox);
    }

    #[test]
    fn scroll_pause_stays_in_range() {
        let opts = ScraperOptions::default_builder().build().unwrap();
        for _ in 0..50 {
            let pause = opts.scroll_pause().as_millis() as u64;
            assert!((1200..=1800).contains(&pause));
        }
    }

    #[test]
    fn teardown_attempts_every_step_and_keeps_the_first_error() {
        let steps: [anyhow::Result<()>; 3] = [
            Ok(()),
            Err(anyhow::anyhow!("page close failed")),
            Err(anyhow::anyhow!("browser close failed")),
        ];
        let res = first_teardown_failure(steps);
        assert_eq!(res.unwrap_err().to_string(), "page close failed");
    }

    #[test]
    fn teardown_passes_when_every_step_passes() {
        let steps: [anyhow::Result<()>; 2] = [Ok(()), Ok(())];
        assert!(first_teardown_failure(steps).is_ok());
    }

    #[test]
    fn terminated_flag_turns_into_an_error() {
        let flag = Arc::new(AtomicBool::new(false));
        let opts = ScraperOptions::default_builder()
            .should_terminate(flag.clone())
            .build()
            .unwrap();
        assert!(opts.check_terminated().is_ok());
        flag.store(true, Ordering::Relaxed);
        assert!(opts.check_terminated().is_err());
    }
}
