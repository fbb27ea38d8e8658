use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SCROLLS: u32 = 8;

#[derive(Error, Debug)]
pub enum CrawlerError {
    #[error("unknown backend `{0}`, expected `chromium` or `headless-chrome`")]
    UnknownBackend(String),
    #[error("unknown environment `{0}`, expected `dev`, `staging` or `prod`")]
    UnknownEnvironment(String),
    #[error("invalid boolean `{value}` for {key}")]
    InvalidFlag { key: String, value: String },
    #[error("navigation to {url} timed out after {timeout_secs}s")]
    NavigationTimeout { url: String, timeout_secs: u64 },
    #[error("crawl terminated")]
    Terminated,
}

/// One crawl order: an optional page to start from and how many times
/// to scroll the viewport down. Zero scrolls collects the links visible
/// without scrolling.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlRequest {
    #[serde(default)]
    pub seed_url: Option<String>,
    #[serde(default = "default_scrolls")]
    pub scrolls: u32,
}

fn default_scrolls() -> u32 {
    DEFAULT_SCROLLS
}

impl Default for CrawlRequest {
    fn default() -> Self {
        CrawlRequest {
            seed_url: None,
            scrolls: DEFAULT_SCROLLS,
        }
    }
}

/// Deduplicated video links in first-seen order, plus the identity of the
/// driver variant that actually produced them.
#[derive(Debug, Serialize)]
pub struct CrawlResponse {
    pub count: usize,
    pub links: Vec<String>,
    pub backend: String,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scrolls_defaults_to_eight() {
        let req: CrawlRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.scrolls, 8);
        assert!(req.seed_url.is_none());
    }

    #[test]
    fn negative_scrolls_are_rejected() {
        let res = serde_json::from_str::<CrawlRequest>(r#"{"scrolls": -1}"#);
        assert!(res.is_err());
    }

    #[test]
    fn response_serializes_to_json() {
        let resp = CrawlResponse {
            count: 1,
            links: vec!["https://www.douyin.com/video/123".into()],
            backend: "chromium".into(),
        };
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["count"], 1);
        assert_eq!(v["links"][0], "https://www.douyin.com/video/123");
        assert_eq!(v["backend"], "chromium");
    }
}
