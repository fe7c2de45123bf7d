use anyhow::{Result, bail};
use log::warn;
use reqwest::Url;
use std::{fmt, path::PathBuf, time::Duration};

pub const DEFAULT_API_VERSION: &str = "v3";
pub const DEFAULT_PER_PAGE: u32 = 100;
// Pagination ceiling, 10 pages of 100 = 1000 items.
pub const DEFAULT_MAX_PAGES: u32 = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
// How much of a non-JSON body is kept in the error record.
pub const RAW_BODY_PREVIEW_CHARS: usize = 500;

// Consumer key/secret pair sent as Basic Auth.
#[derive(Clone)]
pub struct Credentials {
    pub key: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let secret = secret.into();

        if key.trim().is_empty() || secret.trim().is_empty() {
            bail!("Consumer key and secret must be set");
        }

        let credentials = Self { key, secret };
        if credentials.looks_like_placeholder() {
            warn!("Consumer key looks like a placeholder. Please set your actual key.");
        }

        Ok(credentials)
    }

    pub fn looks_like_placeholder(&self) -> bool {
        self.key.starts_with("ck_") && self.key.len() < 10
    }
}

// Keep the secret out of logs and panics.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub store_url: String,
    pub api_base: String,
    pub credentials: Credentials,
    pub email: String,
    pub per_page: u32,
    pub max_pages: u32,
    pub timeout: Duration,
    pub output_dir: PathBuf,
}

impl Settings {
    pub fn new(store_url: &str, api_version: &str, credentials: Credentials, email: &str) -> Result<Self> {
        if email.trim().is_empty() {
            bail!("Target email must be set");
        }

        let api_base = api_base(store_url, api_version)?;

        Ok(Self {
            store_url: store_url.to_string(),
            api_base,
            credentials,
            email: email.to_string(),
            per_page: DEFAULT_PER_PAGE,
            max_pages: DEFAULT_MAX_PAGES,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            output_dir: PathBuf::from("."),
        })
    }

    pub fn with_paging(mut self, per_page: u32, max_pages: u32) -> Result<Self> {
        if per_page == 0 || max_pages == 0 {
            bail!("per_page and max_pages must be at least 1");
        }
        self.per_page = per_page;
        self.max_pages = max_pages;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }
}

// `https://shop.example/` + `v3` -> `https://shop.example/wp-json/wc/v3`
pub fn api_base(store_url: &str, api_version: &str) -> Result<String> {
    let store_url = store_url.trim().trim_end_matches('/');
    if store_url.is_empty() {
        bail!("Store URL must be set");
    }
    if let Err(e) = Url::parse(store_url) {
        bail!("Store URL {} is not a valid URL: {}", store_url, e);
    }
    Ok(format!("{}/wp-json/wc/{}", store_url, api_version))
}
