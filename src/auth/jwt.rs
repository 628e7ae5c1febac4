//! HS256 token issuing and verification

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::Claims;
use crate::domain::users::Role;

/// Signing keys shared by the auth routes and the extractors
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Issue a token for a user
    pub fn issue(
        &self,
        user_id: uuid::Uuid,
        email: &str,
        role: Role,
        name: Option<&str>,
    ) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            email: email.to_string(),
            role: role.as_str().to_string(),
            name: name.map(str::to_string),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .context("Failed to sign JWT")
    }

    /// Verify a JWT token and return the claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 30;

        let token_data =
            decode::<Claims>(token, &self.decoding, &validation).context("JWT validation failed")?;

        Ok(token_data.claims)
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn issued_tokens_verify() {
        let keys = JwtKeys::new("test-secret-test-secret-test-secret", 1);
        let user_id = Uuid::new_v4();

        let token = keys
            .issue(user_id, "seller@emall.world", Role::Seller, Some("Asha"))
            .unwrap();
        let claims = keys.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, "seller");
        assert_eq!(claims.name.as_deref(), Some("Asha"));
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let keys = JwtKeys::new("first-secret", 1);
        let other = JwtKeys::new("second-secret", 1);

        let token = keys
            .issue(Uuid::new_v4(), "a@b.co", Role::Customer, None)
            .unwrap();
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let keys = JwtKeys::new("secret", -1);
        let token = keys
            .issue(Uuid::new_v4(), "a@b.co", Role::Customer, None)
            .unwrap();

        assert!(keys.verify(&token).is_err());
    }
}
