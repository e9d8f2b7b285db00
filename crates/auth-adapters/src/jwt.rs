//! HS256 session tokens issued by the hosted auth provider.

use domains::{DomainError, Result, SessionClaims, SessionVerifier};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audience the provider stamps on tokens of signed-in users.
pub const DEFAULT_AUDIENCE: &str = "authenticated";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
    #[serde(default)]
    pub aud: Option<String>,
}

pub struct JwtSessionVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtSessionVerifier {
    pub fn new(secret: &[u8], audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);
        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl SessionVerifier for JwtSessionVerifier {
    fn verify(&self, token: &str) -> Result<SessionClaims> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "session token rejected");
            DomainError::Unauthorized("invalid session token".into())
        })?;

        let actor_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| DomainError::Unauthorized("session subject is not a user id".into()))?;

        Ok(SessionClaims {
            actor_id,
            email: data.claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &[u8] = b"provider-jwt-secret";

    fn token(sub: &str, aud: &str, exp_offset: i64) -> String {
        let claims = Claims {
            sub: sub.into(),
            email: Some("poster@example.com".into()),
            exp: (chrono::Utc::now().timestamp() + exp_offset) as usize,
            aud: Some(aud.into()),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    #[test]
    fn accepts_provider_token() {
        let id = Uuid::new_v4();
        let verifier = JwtSessionVerifier::new(SECRET, DEFAULT_AUDIENCE);

        let claims = verifier.verify(&token(&id.to_string(), DEFAULT_AUDIENCE, 600)).unwrap();

        assert_eq!(claims.actor_id, id);
        assert_eq!(claims.email.as_deref(), Some("poster@example.com"));
    }

    #[test]
    fn rejects_expired_foreign_and_malformed_tokens() {
        let id = Uuid::new_v4().to_string();
        let verifier = JwtSessionVerifier::new(SECRET, DEFAULT_AUDIENCE);

        for bad in [
            token(&id, DEFAULT_AUDIENCE, -3600),
            token(&id, "anon", 600),
            token("not-a-uuid", DEFAULT_AUDIENCE, 600),
            "garbage".to_string(),
        ] {
            assert!(matches!(verifier.verify(&bad), Err(DomainError::Unauthorized(_))));
        }

        let other = JwtSessionVerifier::new(b"another-secret", DEFAULT_AUDIENCE);
        assert!(other.verify(&token(&id, DEFAULT_AUDIENCE, 600)).is_err());
    }
}
