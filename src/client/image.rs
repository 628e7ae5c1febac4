//! Retrying image loader
//!
//! One load attempt is made, then up to `max_retries` more, each after a
//! fixed `retry_delay`. When every attempt fails the state settles on the
//! fallback image. Each transition is published on a watch channel.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

use super::config::{ApiConfig, DEFAULT_FALLBACK_IMAGE};

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLoaderOptions {
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub fallback_image: String,
}

impl Default for ImageLoaderOptions {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            fallback_image: DEFAULT_FALLBACK_IMAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Loading,
    Retrying,
    Loaded,
    Failed,
}

/// What a caller should render right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageState {
    pub src: String,
    pub phase: LoadPhase,
    pub has_error: bool,
    /// Attempts made so far, including the current one
    pub attempts: u32,
}

impl ImageState {
    fn loading(src: &str, attempts: u32) -> Self {
        Self {
            src: src.to_string(),
            phase: LoadPhase::Loading,
            has_error: false,
            attempts,
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.phase, LoadPhase::Loaded | LoadPhase::Failed)
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("image request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("image request returned status {0}")]
    Status(u16),
}

/// Performs one load attempt.
#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn probe(&self, url: &str) -> Result<(), ProbeError>;
}

/// Issues a GET and requires a 2xx status.
#[derive(Debug, Clone)]
pub struct HttpImageProbe {
    client: reqwest::Client,
}

impl HttpImageProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Share the API client's connection pool and timeout.
    pub fn from_api(api: &super::http::ApiClient) -> Self {
        Self::new(api.http().clone())
    }
}

#[async_trait]
impl ImageProbe for HttpImageProbe {
    async fn probe(&self, url: &str) -> Result<(), ProbeError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::Status(status.as_u16()))
        }
    }
}

pub struct ImageLoader<P> {
    probe: P,
    options: ImageLoaderOptions,
}

impl<P: ImageProbe> ImageLoader<P> {
    pub fn new(probe: P, options: ImageLoaderOptions) -> Self {
        Self { probe, options }
    }

    /// Default retry policy with the configured fallback image.
    pub fn for_config(probe: P, config: &ApiConfig) -> Self {
        Self::new(
            probe,
            ImageLoaderOptions {
                fallback_image: config.fallback_image().to_string(),
                ..ImageLoaderOptions::default()
            },
        )
    }

    pub fn options(&self) -> &ImageLoaderOptions {
        &self.options
    }

    fn failed(&self, attempts: u32) -> ImageState {
        ImageState {
            src: self.options.fallback_image.clone(),
            phase: LoadPhase::Failed,
            has_error: true,
            attempts,
        }
    }

    /// Run the load to completion, publishing every transition on `tx`.
    pub async fn load_into(&self, src: &str, tx: &watch::Sender<ImageState>) -> ImageState {
        let src = src.trim();
        if src.is_empty() {
            let state = self.failed(0);
            tx.send_replace(state.clone());
            return state;
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            tx.send_replace(ImageState::loading(src, attempts));

            match self.probe.probe(src).await {
                Ok(()) => {
                    let state = ImageState {
                        src: src.to_string(),
                        phase: LoadPhase::Loaded,
                        has_error: false,
                        attempts,
                    };
                    tx.send_replace(state.clone());
                    return state;
                }
                Err(e) => {
                    tracing::debug!(src = %src, attempt = attempts, error = %e, "Image load failed");
                }
            }

            if attempts > self.options.max_retries {
                tracing::warn!(src = %src, attempts, "Image unavailable, using fallback");
                let state = self.failed(attempts);
                tx.send_replace(state.clone());
                return state;
            }

            tx.send_replace(ImageState {
                src: src.to_string(),
                phase: LoadPhase::Retrying,
                has_error: false,
                attempts,
            });
            tokio::time::sleep(self.options.retry_delay).await;
        }
    }

    /// Run the load to completion and return the settled state.
    pub async fn load(&self, src: &str) -> ImageState {
        let (tx, _rx) = watch::channel(ImageState::loading(src, 0));
        self.load_into(src, &tx).await
    }
}

impl<P: ImageProbe + 'static> ImageLoader<P> {
    /// Start loading in the background and hand back the state stream.
    pub fn spawn(self: &Arc<Self>, src: impl Into<String>) -> watch::Receiver<ImageState> {
        let src = src.into();
        let (tx, rx) = watch::channel(ImageState::loading(&src, 0));
        let loader = Arc::clone(self);
        tokio::spawn(async move {
            loader.load_into(&src, &tx).await;
        });
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    /// Fails the first `failures` attempts, then succeeds.
    struct FlakyProbe {
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakyProbe {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ImageProbe for Arc<FlakyProbe> {
        async fn probe(&self, _url: &str) -> Result<(), ProbeError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(ProbeError::Status(404))
            } else {
                Ok(())
            }
        }
    }

    fn options() -> ImageLoaderOptions {
        ImageLoaderOptions {
            fallback_image: "/img/fallback.png".into(),
            ..ImageLoaderOptions::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_image_settles_on_fallback_after_retries() {
        let probe = Arc::new(FlakyProbe::new(u32::MAX));
        let loader = ImageLoader::new(probe.clone(), options());

        let started = Instant::now();
        let state = loader.load("https://cdn.emall.test/broken.jpg").await;

        assert_eq!(started.elapsed(), Duration::from_millis(3000));
        assert_eq!(probe.calls(), 4);
        assert_eq!(
            state,
            ImageState {
                src: "/img/fallback.png".into(),
                phase: LoadPhase::Failed,
                has_error: true,
                attempts: 4,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_on_a_retry() {
        let probe = Arc::new(FlakyProbe::new(1));
        let loader = ImageLoader::new(probe.clone(), options());

        let started = Instant::now();
        let state = loader.load("https://cdn.emall.test/slow.jpg").await;

        assert_eq!(started.elapsed(), Duration::from_millis(1000));
        assert_eq!(state.phase, LoadPhase::Loaded);
        assert_eq!(state.src, "https://cdn.emall.test/slow.jpg");
        assert!(!state.has_error);
        assert_eq!(state.attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_source_goes_straight_to_fallback() {
        let probe = Arc::new(FlakyProbe::new(0));
        let loader = ImageLoader::new(probe.clone(), options());

        let state = loader.load("   ").await;
        assert_eq!(probe.calls(), 0);
        assert!(state.has_error);
        assert_eq!(state.src, "/img/fallback.png");
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_load_publishes_the_settled_state() {
        let probe = Arc::new(FlakyProbe::new(u32::MAX));
        let loader = Arc::new(ImageLoader::new(
            probe,
            ImageLoaderOptions {
                max_retries: 1,
                retry_delay: Duration::from_millis(200),
                fallback_image: "/img/fallback.png".into(),
            },
        ));

        let mut rx = loader.spawn("https://cdn.emall.test/gone.jpg");
        let state = rx.wait_for(ImageState::is_settled).await.unwrap().clone();
        assert_eq!(state.phase, LoadPhase::Failed);
        assert_eq!(state.attempts, 2);
    }

    #[tokio::test]
    async fn http_probe_requires_success_status() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/uploads/ok.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8]))
            .mount(&server)
            .await;

        let probe = HttpImageProbe::new(reqwest::Client::new());
        assert!(probe.probe(&format!("{}/uploads/ok.jpg", server.uri())).await.is_ok());
        assert!(matches!(
            probe.probe(&format!("{}/uploads/missing.jpg", server.uri())).await,
            Err(ProbeError::Status(404))
        ));
    }
}
