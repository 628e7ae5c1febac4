//! Runtime configuration
//!
//! Settings are read from the process environment (after `.env` is loaded by
//! `dotenvy`) and checked by the [`validator`] before the server starts.

pub mod validator;

use anyhow::{Context, Result};
use std::env;

pub use validator::{EnvReport, EnvValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    /// Read `ENV` from `lookup`, defaulting to dev.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_str(&lookup("ENV").unwrap_or_default())
    }

    /// Read `ENV` from the process environment. Needed before logging is
    /// installed, so it never logs.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,

    // Auth
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Redis
    pub redis_url: String,
    pub redis_cache_ttl_seconds: u64,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // Public URLs
    pub frontend_url: Option<String>,
    pub api_base_url: Option<String>,

    // Analytics proxy
    pub ga_measurement_id: Option<String>,
    pub ga_api_secret: Option<String>,
}

impl Settings {
    /// Load settings from the process environment, validating first.
    /// Validation problems are reported through `tracing`, so install the
    /// subscriber before calling this.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings from an arbitrary variable source.
    ///
    /// In production any missing or invalid required variable aborts; in other
    /// environments problems are logged and defaults are used where possible.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Environment::from_lookup(&lookup);

        let report = validator::validate(env, &lookup);
        report.enforce(env)?;

        let port: u16 = lookup("PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(5000);
        let server_addr = format!("0.0.0.0:{}", port);

        // Auth
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET must be set")?;
        let jwt_ttl_hours = lookup("JWT_TTL_HOURS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(24 * 7);

        // Database
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        // Redis
        let redis_url = lookup("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379/0".to_string());
        let redis_cache_ttl_seconds = lookup("REDIS_CACHE_TTL_SECONDS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(600);

        let frontend_url = lookup("FRONTEND_URL").filter(|s| !s.trim().is_empty());
        let api_base_url = lookup("API_BASE_URL").filter(|s| !s.trim().is_empty());

        // CORS: explicit list, else the frontend, else the local dev server
        let cors_allow_origins = lookup("ALLOWED_ORIGINS")
            .or_else(|| frontend_url.clone())
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let ga_measurement_id = lookup("GA_MEASUREMENT_ID").filter(|s| !s.is_empty());
        let ga_api_secret = lookup("GA_API_SECRET").filter(|s| !s.is_empty());

        Ok(Settings {
            env,
            server_addr,
            jwt_secret,
            jwt_ttl_hours,
            database_url,
            database_max_connections,
            redis_url,
            redis_cache_ttl_seconds,
            cors_allow_origins,
            frontend_url,
            api_base_url,
            ga_measurement_id,
            ga_api_secret,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn environment_parses_aliases() {
        assert_eq!(Environment::from_str("production"), Environment::Prod);
        assert_eq!(Environment::from_str("PROD"), Environment::Prod);
        assert_eq!(Environment::from_str("staging"), Environment::Staging);
        assert_eq!(Environment::from_str("development"), Environment::Dev);
        assert_eq!(Environment::from_str(""), Environment::Dev);
    }

    #[test]
    fn dev_settings_fill_defaults() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("JWT_SECRET", "dev-secret"),
            ("DATABASE_URL", "postgres://localhost/emall"),
        ]))
        .unwrap();

        assert_eq!(settings.env, Environment::Dev);
        assert_eq!(settings.server_addr, "0.0.0.0:5000");
        assert_eq!(settings.cors_allow_origins, vec!["http://localhost:3000"]);
        assert!(settings.ga_measurement_id.is_none());
    }

    #[test]
    fn allowed_origins_are_split_and_trimmed() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("JWT_SECRET", "dev-secret"),
            ("DATABASE_URL", "postgres://localhost/emall"),
            ("PORT", "8081"),
            ("ALLOWED_ORIGINS", "https://emall.world, https://admin.emall.world,"),
        ]))
        .unwrap();

        assert_eq!(settings.server_addr, "0.0.0.0:8081");
        assert_eq!(
            settings.cors_allow_origins,
            vec!["https://emall.world", "https://admin.emall.world"]
        );
    }

    #[test]
    fn production_without_public_urls_fails() {
        let result = Settings::from_lookup(lookup_from(&[
            ("ENV", "production"),
            ("PORT", "8080"),
            ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
            ("DATABASE_URL", "postgres://db/emall"),
        ]));

        assert!(result.is_err());
    }

    #[test]
    fn dev_without_secret_still_reports_missing_secret() {
        let result = Settings::from_lookup(lookup_from(&[(
            "DATABASE_URL",
            "postgres://localhost/emall",
        )]));

        assert!(result.is_err());
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn environment_reads_env_var() {
        assert_eq!(
            Environment::from_lookup(lookup_from(&[("ENV", "production")])),
            Environment::Prod
        );
        assert_eq!(Environment::from_lookup(lookup_from(&[])), Environment::Dev);
    }

    #[test]
    fn dev_problems_are_logged_as_warnings() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let settings = tracing::subscriber::with_default(subscriber, || {
            Settings::from_lookup(lookup_from(&[
                ("ENV", "dev"),
                ("PORT", "5000"),
                ("JWT_SECRET", "short"),
                ("DATABASE_URL", "postgres://localhost/emall"),
                ("SMTP_HOST", "smtp.example.com"),
            ]))
        })
        .unwrap();
        assert_eq!(settings.env, Environment::Dev);

        let output = String::from_utf8(logs.0.lock().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("JWT_SECRET must be at least 32 characters"));
        assert!(output.contains("email provider is partially configured"));
    }
}
