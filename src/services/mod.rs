//! Service layer modules for external integrations.
//!
//! Contains the Redis cache and the analytics forwarder.

pub mod analytics;
pub mod cache;

pub use analytics::AnalyticsForwarder;
pub use cache::RedisCache;
