//! Startup environment validation
//!
//! Variables fall into groups: core variables are required everywhere,
//! production variables only when running in production, and optional
//! provider groups (email, payment, storage, sms) are checked for partial
//! configuration. Production aborts on any error; other environments warn.

use thiserror::Error;
use url::Url;

use super::Environment;

/// Required in every environment. `ENV` itself defaults to dev.
pub const CORE_VARS: &[&str] = &["PORT", "JWT_SECRET", "DATABASE_URL"];

/// Required when running in production.
pub const PRODUCTION_VARS: &[&str] = &["FRONTEND_URL", "API_BASE_URL", "ALLOWED_ORIGINS"];

/// Optional provider groups. A group is either fully set or fully unset.
pub const OPTIONAL_GROUPS: &[(&str, &[&str])] = &[
    ("email", &["SMTP_HOST", "SMTP_USER", "SMTP_PASSWORD"]),
    ("payment", &["RAZORPAY_KEY_ID", "RAZORPAY_KEY_SECRET"]),
    (
        "storage",
        &["STORAGE_BUCKET", "STORAGE_ACCESS_KEY", "STORAGE_SECRET_KEY"],
    ),
    ("sms", &["SMS_API_KEY", "SMS_SENDER_ID"]),
];

const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
#[error("environment validation failed: {}", .problems.join("; "))]
pub struct EnvValidationError {
    pub problems: Vec<String>,
}

/// Outcome of validating the environment.
#[derive(Debug, Default, Clone)]
pub struct EnvReport {
    /// Required variables that are unset or blank
    pub missing: Vec<String>,
    /// Variables that are set but unusable, with the reason
    pub invalid: Vec<(String, String)>,
    /// Non-fatal findings (partial provider groups, weak secrets in dev)
    pub warnings: Vec<String>,
    /// Optional groups that are fully configured
    pub enabled_groups: Vec<String>,
}

impl EnvReport {
    pub fn has_errors(&self) -> bool {
        !self.missing.is_empty() || !self.invalid.is_empty()
    }

    fn problems(&self) -> Vec<String> {
        self.missing
            .iter()
            .map(|name| format!("{} is not set", name))
            .chain(
                self.invalid
                    .iter()
                    .map(|(name, reason)| format!("{} {}", name, reason)),
            )
            .collect()
    }

    /// Apply the environment policy: production aborts, everything else warns.
    pub fn enforce(&self, env: Environment) -> Result<(), EnvValidationError> {
        for warning in &self.warnings {
            tracing::warn!(warning = %warning, "Environment configuration warning");
        }

        if !self.has_errors() {
            return Ok(());
        }

        let problems = self.problems();

        if env.is_prod() {
            return Err(EnvValidationError { problems });
        }

        for problem in &problems {
            tracing::warn!(problem = %problem, "Environment variable problem (ignored outside production)");
        }

        Ok(())
    }
}

/// Validate variables obtained from `lookup` for the given environment.
pub fn validate<F>(env: Environment, lookup: F) -> EnvReport
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    let mut report = EnvReport::default();

    for name in CORE_VARS {
        if get(name).is_none() {
            report.missing.push(name.to_string());
        }
    }

    if env.is_prod() {
        for name in PRODUCTION_VARS {
            if get(name).is_none() {
                report.missing.push(name.to_string());
            }
        }
    }

    if let Some(port) = get("PORT") {
        if port.trim().parse::<u16>().is_err() {
            report
                .invalid
                .push(("PORT".to_string(), format!("is not a valid port: {}", port)));
        }
    }

    if let Some(secret) = get("JWT_SECRET") {
        if secret.len() < MIN_JWT_SECRET_LEN {
            let reason = format!("must be at least {} characters", MIN_JWT_SECRET_LEN);
            if env.is_prod() {
                report.invalid.push(("JWT_SECRET".to_string(), reason));
            } else {
                report.warnings.push(format!("JWT_SECRET {}", reason));
            }
        }
    }

    for name in ["FRONTEND_URL", "API_BASE_URL"] {
        if let Some(value) = get(name) {
            if Url::parse(&value).is_err() {
                report
                    .invalid
                    .push((name.to_string(), format!("is not a valid URL: {}", value)));
            }
        }
    }

    if let Some(origins) = get("ALLOWED_ORIGINS") {
        for origin in origins.split(',').map(str::trim).filter(|o| !o.is_empty()) {
            if Url::parse(origin).is_err() {
                report.invalid.push((
                    "ALLOWED_ORIGINS".to_string(),
                    format!("contains an invalid origin: {}", origin),
                ));
            }
        }
    }

    for (group, vars) in OPTIONAL_GROUPS {
        let unset: Vec<&str> = vars.iter().copied().filter(|v| get(v).is_none()).collect();
        if unset.is_empty() {
            report.enabled_groups.push(group.to_string());
        } else if unset.len() < vars.len() {
            report.warnings.push(format!(
                "{} provider is partially configured; missing {}",
                group,
                unset.join(", ")
            ));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    const STRONG_SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn reports_missing_core_vars() {
        let env = vars(&[("PORT", "5000")]);
        let report = validate(Environment::Dev, |k| env.get(k).cloned());

        assert_eq!(report.missing, vec!["JWT_SECRET", "DATABASE_URL"]);
    }

    #[test]
    fn blank_values_count_as_missing() {
        let env = vars(&[("PORT", "5000"), ("JWT_SECRET", "   "), ("DATABASE_URL", "x")]);
        let report = validate(Environment::Dev, |k| env.get(k).cloned());

        assert_eq!(report.missing, vec!["JWT_SECRET"]);
    }

    #[test]
    fn production_requires_public_urls() {
        let env = vars(&[
            ("PORT", "5000"),
            ("JWT_SECRET", STRONG_SECRET),
            ("DATABASE_URL", "postgres://db/emall"),
        ]);
        let report = validate(Environment::Prod, |k| env.get(k).cloned());

        assert_eq!(
            report.missing,
            vec!["FRONTEND_URL", "API_BASE_URL", "ALLOWED_ORIGINS"]
        );
        assert!(report.enforce(Environment::Prod).is_err());
    }

    #[test]
    fn development_only_warns() {
        let env = vars(&[]);
        let report = validate(Environment::Dev, |k| env.get(k).cloned());

        assert!(report.has_errors());
        assert!(report.enforce(Environment::Dev).is_ok());
    }

    #[test]
    fn short_secret_is_fatal_only_in_production() {
        let env = vars(&[
            ("PORT", "5000"),
            ("JWT_SECRET", "short"),
            ("DATABASE_URL", "postgres://db/emall"),
            ("FRONTEND_URL", "https://emall.world"),
            ("API_BASE_URL", "https://api.emall.world"),
            ("ALLOWED_ORIGINS", "https://emall.world"),
        ]);

        let dev = validate(Environment::Dev, |k| env.get(k).cloned());
        assert!(!dev.has_errors());
        assert_eq!(dev.warnings.len(), 1);

        let prod = validate(Environment::Prod, |k| env.get(k).cloned());
        assert_eq!(prod.invalid[0].0, "JWT_SECRET");
    }

    #[test]
    fn invalid_port_and_urls_are_reported() {
        let env = vars(&[
            ("PORT", "eighty"),
            ("JWT_SECRET", STRONG_SECRET),
            ("DATABASE_URL", "postgres://db/emall"),
            ("FRONTEND_URL", "not a url"),
            ("ALLOWED_ORIGINS", "https://ok.example, nope"),
        ]);
        let report = validate(Environment::Dev, |k| env.get(k).cloned());

        let names: Vec<&str> = report.invalid.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["PORT", "FRONTEND_URL", "ALLOWED_ORIGINS"]);
    }

    #[test]
    fn partial_provider_groups_warn() {
        let env = vars(&[
            ("PORT", "5000"),
            ("JWT_SECRET", STRONG_SECRET),
            ("DATABASE_URL", "postgres://db/emall"),
            ("SMTP_HOST", "smtp.example.com"),
            ("RAZORPAY_KEY_ID", "rzp"),
            ("RAZORPAY_KEY_SECRET", "secret"),
        ]);
        let report = validate(Environment::Dev, |k| env.get(k).cloned());

        assert_eq!(report.enabled_groups, vec!["payment"]);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("email provider"));
    }
}
