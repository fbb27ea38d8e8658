use std::str::FromStr;

use anyhow::Context;

use crate::types::CrawlerError;

pub const ENV_KEY: &str = "ENV";
pub const LOG_LEVEL_KEY: &str = "LOG_LEVEL";
pub const BACKEND_KEY: &str = "VIDCRAWL_BACKEND";
pub const HEADLESS_KEY: &str = "VIDCRAWL_HEADLESS";
pub const MOBILE_UA_KEY: &str = "VIDCRAWL_MOBILE_UA";
pub const IN_DOCKER_KEY: &str = "IN_DOCKER";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl FromStr for Environment {
    type Err = CrawlerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "staging" => Ok(Environment::Staging),
            "prod" => Ok(Environment::Prod),
            other => Err(CrawlerError::UnknownEnvironment(other.into())),
        }
    }
}

/// The browser-automation stack driving the crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// chromiumoxide over the devtools protocol, headless or headful.
    Chromium,
    /// headless_chrome, always headful with anti-detection arguments.
    HeadlessChrome,
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Chromium => "chromium",
            Backend::HeadlessChrome => "headless-chrome",
        }
    }
}

impl FromStr for Backend {
    type Err = CrawlerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // an unrecognized value is a hard error, not a silent default;
        // the playwright/selenium tokens from older deployments stay valid
        match s.to_lowercase().as_str() {
            "chromium" | "chromiumoxide" | "playwright" => Ok(Backend::Chromium),
            "headless-chrome" | "headless_chrome" | "selenium" => Ok(Backend::HeadlessChrome),
            other => Err(CrawlerError::UnknownBackend(other.into())),
        }
    }
}

/// Process-wide settings, read from the environment once at startup and
/// passed by reference afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub log_level: String,
    pub backend: Backend,
    pub headless: bool,
    pub mobile_ua: bool,
    /// Chrome's sandbox; disabled when running inside a container.
    pub sandbox: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            environment: Environment::Dev,
            log_level: "info".into(),
            backend: Backend::Chromium,
            headless: false,
            mobile_ua: true,
            sandbox: true,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Config> {
        let mut config = Config::default();

        if let Some(env) = env_var(ENV_KEY) {
            config.environment = env.parse().context("invalid ENV")?;
        }
        if let Some(level) = env_var(LOG_LEVEL_KEY) {
            config.log_level = level.to_lowercase();
        }
        if let Some(backend) = env_var(BACKEND_KEY) {
            config.backend = backend.parse().context("invalid backend selector")?;
        }
        if let Some(headless) = env_var(HEADLESS_KEY) {
            config.headless = parse_flag(HEADLESS_KEY, &headless)?;
        }
        if let Some(mobile_ua) = env_var(MOBILE_UA_KEY) {
            config.mobile_ua = parse_flag(MOBILE_UA_KEY, &mobile_ua)?;
        }
        // warning only do this if in docker env
        if std::env::var(IN_DOCKER_KEY).is_ok() {
            config.sandbox = false;
        }

        Ok(config)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(key: &str, value: &str) -> Result<bool, CrawlerError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CrawlerError::InvalidFlag {
            key: key.into(),
            value: value.into(),
        }),
    }
}
