//! Typed SDK for the marketplace API.
//!
//! [`ApiClient`] wraps one shared HTTP client with the storefront's auth
//! policy: the stored bearer token goes on every request, failures are
//! classified and shown through a [`Notifier`], and an expired session on a
//! private page signs the user out and sends them to login. Resource calls
//! live in [`api`]; [`image`] loads pictures with retries and a fallback.

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod image;
pub mod navigation;
pub mod notify;
pub mod session;

pub use api::{OnboardingFlow, ProductDraft};
pub use config::ApiConfig;
pub use errors::{ClientError, ErrorCategory};
pub use http::ApiClient;
pub use image::{HttpImageProbe, ImageLoader, ImageLoaderOptions, ImageState, LoadPhase};
pub use navigation::{MemoryNavigator, Navigator};
pub use notify::{Notifier, TracingNotifier};
pub use session::{KeyValueStore, MemoryStore, Session};
