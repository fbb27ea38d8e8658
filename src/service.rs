use std::sync::{atomic::AtomicBool, Arc};

use anyhow::Context;

use crate::{
    config::Config,
    scraper::{Driver, Scraper},
    types::{CrawlRequest, CrawlResponse},
    utils::normalize_url,
};

/// Selects a driver from configuration and runs one crawl on it. The
/// termination flag is threaded into the driver so a signal can stop the
/// scroll loop between iterations.
pub async fn crawl(
    config: &Config,
    req: &CrawlRequest,
    should_terminate: Arc<AtomicBool>,
) -> anyhow::Result<CrawlResponse> {
    let mut driver = Driver::from_config(config, should_terminate).await?;
    crawl_links(&mut driver, req).await
}

/// Runs one crawl on an already-constructed driver. `shutdown` runs on
/// every exit path; a shutdown failure after a crawl failure is logged
/// instead of masking the original error.
pub async fn crawl_links<S: Scraper>(
    scraper: &mut S,
    req: &CrawlRequest,
) -> anyhow::Result<CrawlResponse> {
    let outcome = run_crawl(scraper, req).await;
    let shutdown_outcome = scraper.shutdown().await;
    match outcome {
        Ok(response) => {
            shutdown_outcome.context("browser shutdown failed")?;
            Ok(response)
        }
        Err(e) => {
            if let Err(shutdown_err) = shutdown_outcome {
                warn!("browser shutdown failed after crawl error: {:#}", shutdown_err);
            }
            Err(e)
        }
    }
}

async fn run_crawl<S: Scraper>(
    scraper: &mut S,
    req: &CrawlRequest,
) -> anyhow::Result<CrawlResponse> {
    scraper.open_home().await?;
    let seed = req
        .seed_url
        .as_deref()
        .map(normalize_url)
        .transpose()?;
    let links = scraper
        .collect_video_links(seed.as_deref(), req.scrolls)
        .await?;
    info!(
        "crawl finished with {} links on the {} backend",
        links.len(),
        scraper.backend().name()
    );
    Ok(CrawlResponse {
        count: links.len(),
        links,
        backend: scraper.backend().name().into(),
    })
}
