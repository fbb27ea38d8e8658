use std::sync::{atomic::AtomicBool, Arc};

use clap::Parser;
use env_logger::Env;
use log::debug;
use signal_hook::consts::{SIGINT, SIGTERM};
use vidcrawl::{
    config::Config,
    service,
    types::{CrawlRequest, DEFAULT_SCROLLS},
};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Scroll-and-collect crawler for short-video links", long_about = None)]
struct Args {
    /// Optional page to navigate to before scrolling, instead of staying
    /// on the landing page
    #[arg(short = 's', long)]
    seed_url: Option<String>,
    /// Number of scroll iterations; 0 collects only the links visible
    /// without scrolling
    #[arg(short = 'n', long, default_value_t = DEFAULT_SCROLLS)]
    scrolls: u32,
    /// Override the configured backend (chromium|headless-chrome)
    #[arg(short = 'b', long)]
    backend: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::from_env()?;
    if let Some(backend) = &args.backend {
        config.backend = backend.parse()?;
    }

    // RUST_LOG wins over the configured level
    env_logger::Builder::from_env(Env::default().default_filter_or(&config.log_level)).init();
    debug!("starting crawl with {:?} and {:?}", config, args);

    let should_terminate = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGTERM, Arc::clone(&should_terminate))?;
    signal_hook::flag::register(SIGINT, Arc::clone(&should_terminate))?;

    let req = CrawlRequest {
        seed_url: args.seed_url,
        scrolls: args.scrolls,
    };

    let response = service::crawl(&config, &req, should_terminate).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
