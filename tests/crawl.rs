use std::sync::{atomic::AtomicBool, Arc};

use vidcrawl::{
    config::{Backend, Config},
    service,
    types::CrawlRequest,
};

macro_rules! aw {
    ($e:expr) => {
        tokio_test::block_on($e)
    };
}

/*
RUST_LOG=debug cargo test --test crawl -- crawl_home_chromium --exact --ignored
*/
#[test]
#[ignore = "needs a local chrome and network access"]
fn crawl_home_chromium() -> anyhow::Result<()> {
    env_logger::init();
    let config = Config {
        backend: Backend::Chromium,
        headless: true,
        ..Config::default()
    };
    let req = CrawlRequest {
        seed_url: None,
        scrolls: 2,
    };
    let res = aw!(service::crawl(
        &config,
        &req,
        Arc::new(AtomicBool::new(false))
    ))?;
    println!("{res:#?}");
    assert_eq!(res.count, res.links.len());
    assert_eq!(res.backend, "chromium");
    Ok(())
}

#[test]
#[ignore = "needs a local chrome and network access"]
fn crawl_home_headless_chrome() -> anyhow::Result<()> {
    env_logger::init();
    let config = Config {
        backend: Backend::HeadlessChrome,
        ..Config::default()
    };
    let req = CrawlRequest {
        seed_url: None,
        scrolls: 2,
    };
    let res = aw!(service::crawl(
        &config,
        &req,
        Arc::new(AtomicBool::new(false))
    ))?;
    println!("{res:#?}");
    assert_eq!(res.count, res.links.len());
    assert_eq!(res.backend, "headless-chrome");
    Ok(())
}

#[test]
#[ignore = "needs a local chrome and network access"]
fn crawl_seed_page() -> anyhow::Result<()> {
    env_logger::init();
    let config = Config {
        headless: true,
        ..Config::default()
    };
    let req = CrawlRequest {
        seed_url: Some("https://www.douyin.com/discover".into()),
        scrolls: 0,
    };
    let res = aw!(service::crawl(
        &config,
        &req,
        Arc::new(AtomicBool::new(false))
    ))?;
    println!("{res:#?}");
    assert_eq!(res.count, res.links.len());
    Ok(())
}
