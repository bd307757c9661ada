use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::common::di::AppState;
use crate::domain::services::auth_service::AuthError as TokenError;

// Extensión para almacenar datos del usuario autenticado
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: String,
    pub email: Option<String>,
}

// Extractor para los handlers: el id del usuario autenticado
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
}

// Error para las operaciones de autenticación
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token no proporcionado")]
    TokenNotProvided,

    #[error("Token inválido: {0}")]
    InvalidToken(String),

    #[error("Token expirado")]
    TokenExpired,

    #[error("Usuario no encontrado")]
    UserNotFound,
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::TokenExpired => AuthError::TokenExpired,
            TokenError::InvalidToken(msg) => AuthError::InvalidToken(msg),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = axum::Json(serde_json::json!({
            "error": "Unauthorized",
            "details": self.to_string(),
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .map(|user| AuthUser { id: user.id.clone() })
            .ok_or(AuthError::UserNotFound)
    }
}

/// Verifica el token Bearer y adjunta el usuario a la petición
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::TokenNotProvided)?;

    let claims = state.auth_service.validate_token(token).map_err(|e| {
        tracing::debug!("Token rechazado: {}", e);
        AuthError::from(e)
    })?;

    request.extensions_mut().insert(CurrentUser {
        id: claims.sub,
        email: claims.email,
    });

    Ok(next.run(request).await)
}
