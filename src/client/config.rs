//! API base URL resolution and image URL normalization

use url::Url;

use super::errors::ClientError;
use crate::config::{Environment, Settings};

/// Local service address used when nothing else is configured in development.
pub const DEV_API_BASE_URL: &str = "http://localhost:5000";

/// Shown for products and shops without an image.
pub const DEFAULT_FALLBACK_IMAGE: &str = "/images/placeholder.png";

/// Where the API lives and how relative asset paths resolve against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: String,
    fallback_image: String,
}

impl ApiConfig {
    /// Build from an absolute http(s) base URL. A trailing slash is dropped.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let parsed = Url::parse(base_url.trim())
            .map_err(|e| ClientError::Config(format!("invalid API base URL '{}': {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "API base URL must be http or https, got '{}'",
                parsed.scheme()
            )));
        }

        Ok(Self {
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            fallback_image: DEFAULT_FALLBACK_IMAGE.to_string(),
        })
    }

    /// Pick the base URL for an environment. An explicit URL always wins;
    /// development falls back to the local service, other environments must
    /// configure one.
    pub fn for_environment(env: Environment, configured: Option<&str>) -> Result<Self, ClientError> {
        match configured.map(str::trim).filter(|s| !s.is_empty()) {
            Some(url) => Self::new(url),
            None if env.is_dev() => Self::new(DEV_API_BASE_URL),
            None => Err(ClientError::Config(
                "API_BASE_URL must be set outside development".to_string(),
            )),
        }
    }

    /// Same base URL the service advertises.
    pub fn from_settings(settings: &Settings) -> Result<Self, ClientError> {
        Self::for_environment(settings.env, settings.api_base_url.as_deref())
    }

    pub fn with_fallback_image(mut self, fallback: impl Into<String>) -> Self {
        self.fallback_image = fallback.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn fallback_image(&self) -> &str {
        &self.fallback_image
    }

    /// Absolute URL of an API path such as `/cart/items`.
    pub fn api_url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        let path = path.strip_prefix("api/").unwrap_or(path);
        format!("{}/api/{}", self.base_url, path)
    }

    /// Turn a stored image reference into a loadable URL.
    ///
    /// Absolute http(s) and data URLs pass through untouched. Upload paths
    /// and other relative paths resolve against the API base. Blank input
    /// yields the fallback image.
    pub fn process_image_url(&self, url: Option<&str>) -> String {
        let url = match url.map(str::trim) {
            Some(u) if !u.is_empty() => u,
            _ => return self.fallback_image.clone(),
        };

        let lower = url.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("data:") {
            return url.to_string();
        }
        if url.starts_with("//") {
            return format!("https:{}", url);
        }
        if url.starts_with('/') {
            return format!("{}{}", self.base_url, url);
        }
        format!("{}/{}", self.base_url, url.trim_start_matches("./"))
    }
}
