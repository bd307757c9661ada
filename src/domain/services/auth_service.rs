use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/**
 * JWT claims issued by the external auth platform.
 *
 * Only `sub` is required to identify the caller; the remaining optional
 * claims are carried along for logging.
 */
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject identifier - the user id every record is scoped to
    pub sub: String,

    /// Expiration timestamp (seconds since Unix epoch)
    pub exp: i64,

    #[serde(default)]
    pub iat: Option<i64>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Returned when a JWT token has passed its expiration time
    #[error("Token expirado")]
    TokenExpired,

    /// Returned when a JWT token is malformed or has invalid signature
    #[error("Token inválido: {0}")]
    InvalidToken(String),
}

/**
 * Verifies bearer tokens.
 *
 * Tokens are never issued here; the service only checks the HS256
 * signature, the expiry and, when configured, the audience.
 */
pub struct AuthService {
    jwt_secret: String,
    audience: Option<String>,
}

impl AuthService {
    pub fn new(jwt_secret: String, audience: Option<String>) -> Self {
        Self { jwt_secret, audience }
    }

    pub fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let token_data = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken(format!("Error al validar token: {}", e)),
        })?;

        if token_data.claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken("Token sin sujeto".to_string()));
        }

        tracing::debug!("Token validated for subject {}", token_data.claims.sub);
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn token(claims: serde_json::Value, secret: &str) -> String {
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_validate_token_accepts_matching_audience() {
        let service = AuthService::new(SECRET.to_string(), Some("authenticated".to_string()));
        let exp = Utc::now().timestamp() + 3600;
        let jwt = token(json!({"sub": "user-1", "exp": exp, "aud": "authenticated", "email": "a@b.c"}), SECRET);

        let claims = service.validate_token(&jwt).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn test_validate_token_rejects_wrong_secret_and_audience() {
        let service = AuthService::new(SECRET.to_string(), Some("authenticated".to_string()));
        let exp = Utc::now().timestamp() + 3600;

        let forged = token(json!({"sub": "user-1", "exp": exp, "aud": "authenticated"}), "other");
        assert!(matches!(service.validate_token(&forged), Err(AuthError::InvalidToken(_))));

        let wrong_aud = token(json!({"sub": "user-1", "exp": exp, "aud": "anon"}), SECRET);
        assert!(matches!(service.validate_token(&wrong_aud), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_validate_token_reports_expiry() {
        let service = AuthService::new(SECRET.to_string(), None);
        let exp = Utc::now().timestamp() - 3600;
        let jwt = token(json!({"sub": "user-1", "exp": exp}), SECRET);

        assert!(matches!(service.validate_token(&jwt), Err(AuthError::TokenExpired)));
    }
}
