//! Bearer tokens identifying the acting creator.
//!
//! Tokens are minted by the identity service and only verified here. The
//! engine reads two facts from them: the actor id (`sub`) that scopes every
//! query, and the plan tier, which is carried for logging.

use influberry_core::types::DbId;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Value of the `iss` claim on every accepted token.
pub const TOKEN_ISSUER: &str = "influberry";

const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Actor id.
    pub sub: DbId,
    /// Plan tier, e.g. `free` or `pro`.
    pub plan: String,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HS256 signing secret shared with the identity service.
    pub secret: String,
    pub access_token_expiry_mins: i64,
}

impl JwtConfig {
    /// | Env Var                  | Required | Default |
    /// |--------------------------|----------|---------|
    /// | `JWT_SECRET`             | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS` | no       | `15`    |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is missing or empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let access_token_expiry_mins = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .ok()
            .map(|v| {
                v.parse::<i64>()
                    .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64")
            })
            .unwrap_or(DEFAULT_ACCESS_EXPIRY_MINS);

        Self {
            secret,
            access_token_expiry_mins,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::default();
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation
    }
}

/// Sign a token for `actor_id`. Used by the test harness and local tooling.
pub fn issue_access_token(
    actor_id: DbId,
    plan: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: actor_id,
        plan: plan.to_string(),
        iss: TOKEN_ISSUER.to_string(),
        exp: now + config.access_token_expiry_mins * 60,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify signature, expiry and issuer, and return the claims.
pub fn decode_access_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &config.validation(),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            access_token_expiry_mins: 15,
        }
    }

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims_for(actor_id: DbId) -> Claims {
        let now = chrono::Utc::now().timestamp();
        Claims {
            sub: actor_id,
            plan: "free".to_string(),
            iss: TOKEN_ISSUER.to_string(),
            exp: now + 600,
            iat: now,
            jti: Uuid::new_v4().to_string(),
        }
    }

    #[test]
    fn issued_token_carries_actor_and_plan() {
        let config = config("creator-secret");
        let token = issue_access_token(42, "pro", &config).unwrap();

        let claims = decode_access_token(&token, &config).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.plan, "pro");
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut claims = claims_for(1);
        // Past the default 60-second leeway.
        claims.exp = claims.iat - 300;
        let token = sign(&claims, "creator-secret");

        assert!(decode_access_token(&token, &config("creator-secret")).is_err());
    }

    #[test]
    fn foreign_issuer_is_rejected() {
        let mut claims = claims_for(1);
        claims.iss = "someone-else".to_string();
        let token = sign(&claims, "creator-secret");

        assert!(decode_access_token(&token, &config("creator-secret")).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_access_token(7, "free", &config("secret-alpha")).unwrap();
        assert!(decode_access_token(&token, &config("secret-bravo")).is_err());
    }
}
