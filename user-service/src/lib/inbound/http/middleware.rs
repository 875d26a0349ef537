use auth::Authenticator;
use auth::JwtError;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use crate::domain::user::models::Role;
use crate::domain::user::models::UserId;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// Identity of the caller, attached to request extensions once the bearer
/// token has been validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
}

impl TryFrom<auth::Claims> for IdentityContext {
    type Error = AuthRejection;

    fn try_from(claims: auth::Claims) -> Result<Self, Self::Error> {
        let user_id = UserId::from_string(&claims.sub).map_err(|e| {
            tracing::warn!(error = %e, "Token subject is not a user id");
            AuthRejection::InvalidToken
        })?;

        let role = claims.role.parse::<Role>().map_err(|e| {
            tracing::warn!(error = %e, "Token carries an unknown role");
            AuthRejection::InvalidToken
        })?;

        Ok(Self {
            user_id,
            email: claims.email,
            role,
        })
    }
}

/// Reasons a request is turned away before reaching its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    MissingHeader,
    MalformedHeader,
    InvalidToken,
    ExpiredToken,
    MissingIdentity,
    InsufficientPermissions,
}

impl AuthRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthRejection::InsufficientPermissions => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            AuthRejection::MissingHeader => "Authorization header required",
            AuthRejection::MalformedHeader => "Invalid authorization header format",
            AuthRejection::InvalidToken => "Invalid token",
            AuthRejection::ExpiredToken => "Token expired",
            AuthRejection::MissingIdentity => "Authentication required",
            AuthRejection::InsufficientPermissions => "Insufficient permissions",
        }
    }
}

impl From<AuthRejection> for ApiError {
    fn from(rejection: AuthRejection) -> Self {
        let message = rejection.message().to_string();
        match rejection {
            AuthRejection::InsufficientPermissions => ApiError::Forbidden(message),
            _ => ApiError::Unauthorized(message),
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// The scheme is case-sensitive and exactly one space separates it from a
/// non-empty token.
pub fn bearer_token(header: Option<&HeaderValue>) -> Result<&str, AuthRejection> {
    let value = header.ok_or(AuthRejection::MissingHeader)?;
    let value = value.to_str().map_err(|_| AuthRejection::MalformedHeader)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthRejection::MalformedHeader),
    }
}

/// Resolve the caller's identity from the `Authorization` header.
pub fn identify(
    authenticator: &Authenticator,
    header: Option<&HeaderValue>,
) -> Result<IdentityContext, AuthRejection> {
    let token = bearer_token(header)?;

    let claims = authenticator.validate_token(token).map_err(|e| match e {
        JwtError::TokenExpired => AuthRejection::ExpiredToken,
        other => {
            tracing::debug!(error = %other, "Token validation failed");
            AuthRejection::InvalidToken
        }
    })?;

    IdentityContext::try_from(claims)
}

/// Decide whether an identity may pass a role gate.
pub fn authorize(
    identity: Option<&IdentityContext>,
    allowed: &[Role],
) -> Result<(), AuthRejection> {
    let identity = identity.ok_or(AuthRejection::MissingIdentity)?;

    if allowed.contains(&identity.role) {
        Ok(())
    } else {
        Err(AuthRejection::InsufficientPermissions)
    }
}

/// Middleware that validates JWT tokens and adds the caller's identity to
/// request extensions
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let identity = identify(&state.authenticator, req.headers().get(AUTHORIZATION))
        .inspect_err(|rejection| {
            tracing::warn!(
                uri = %req.uri(),
                reason = rejection.message(),
                "Request rejected by authentication"
            );
        })?;

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Roles admitted by a `require_role` gate.
#[derive(Debug, Clone, Copy)]
pub struct RequiredRoles(pub &'static [Role]);

pub const ADMIN_ONLY: RequiredRoles = RequiredRoles(&[Role::Admin]);

/// Middleware that admits only identities holding one of the required roles.
///
/// Must run after `authenticate`.
pub async fn require_role(
    State(required): State<RequiredRoles>,
    req: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    if let Err(rejection) = authorize(req.extensions().get::<IdentityContext>(), required.0) {
        tracing::warn!(
            uri = %req.uri(),
            reason = rejection.message(),
            "Request rejected by role gate"
        );
        return Err(rejection);
    }

    Ok(next.run(req).await)
}
