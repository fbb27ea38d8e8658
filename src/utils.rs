use std::collections::HashSet;

use anyhow::{bail, Context};
use reqwest::Url;

pub const HOME_URL: &str = "https://www.douyin.com/";
pub const VIDEO_HOST_FRAGMENT: &str = "douyin.com/video";

/// The site serves mobile-optimized markup for this agent + viewport.
pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 10; Pixel 3 XL) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
pub const MOBILE_VIEWPORT: (u32, u32) = (412, 915);

pub fn is_video_link(href: &str) -> bool {
    let h = href.to_lowercase();
    h.contains("/video/") || h.contains(VIDEO_HOST_FRAGMENT) || h.contains("share")
}

/// Canonicalizes a seed url. Malformed input and non-http(s) schemes are
/// rejected here, before any browser gets involved.
pub fn normalize_url(url: &str) -> anyhow::Result<String> {
    let parsed = Url::parse(url).context(format!("invalid seed url {}", url))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        bail!("unsupported scheme `{}` in seed url {}", parsed.scheme(), url);
    }
    Ok(parsed.to_string())
}

/// Deduplicating accumulator for video links, keeping first-seen order.
#[derive(Debug, Default)]
pub struct LinkCollector {
    seen: HashSet<String>,
    links: Vec<String>,
}

impl LinkCollector {
    pub fn new() -> Self {
        LinkCollector::default()
    }

    /// Feeds one href through the classifier; returns true if it was kept.
    pub fn offer(&mut self, href: &str) -> bool {
        if !is_video_link(href) {
            return false;
        }
        if self.seen.insert(href.to_string()) {
            self.links.push(href.to_string());
            return true;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn into_links(self) -> Vec<String> {
        self.links
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn classifies_video_links() {
        assert!(is_video_link("https://www.douyin.com/video/123"));
        assert!(is_video_link("https://www.iesdouyin.com/share/video/123"));
        assert!(is_video_link("HTTPS://WWW.DOUYIN.COM/VIDEO/123"));
        assert!(is_video_link("https://example.com/a/video/b"));
        assert!(is_video_link("https://example.com/shared/clip"));
    }

    #[test]
    fn rejects_non_video_links() {
        assert!(!is_video_link("https://example.com/user/abc"));
        assert!(!is_video_link("https://www.douyin.com/discover"));
        assert!(!is_video_link(""));
    }

    #[test]
    fn classification_is_idempotent() {
        let href = "https://www.douyin.com/video/42";
        assert_eq!(is_video_link(href), is_video_link(href));
    }

    #[test]
    fn normalizes_valid_urls() {
        assert_eq!(
            normalize_url("https://www.douyin.com").unwrap(),
            "https://www.douyin.com/"
        );
        assert_eq!(
            normalize_url("https://www.douyin.com/video/123").unwrap(),
            "https://www.douyin.com/video/123"
        );
    }

    #[test]
    fn rejects_malformed_urls() {
        assert!(normalize_url("not a url").is_err());
        assert!(normalize_url("ftp://example.com/video/1").is_err());
    }

    #[test]
    fn collector_deduplicates_across_passes() {
        let mut collector = LinkCollector::new();
        for _ in 0..3 {
            collector.offer("a/video/1");
            collector.offer("b/other");
            collector.offer("a/video/1");
        }
        assert_eq!(collector.len(), 1);
        assert_eq!(collector.into_links(), vec!["a/video/1".to_string()]);
    }

    #[test]
    fn collector_keeps_first_seen_order() {
        let mut collector = LinkCollector::new();
        collector.offer("x.com/video/2");
        collector.offer("x.com/video/1");
        collector.offer("x.com/video/2");
        assert_eq!(
            collector.into_links(),
            vec!["x.com/video/2".to_string(), "x.com/video/1".to_string()]
        );
    }
}
