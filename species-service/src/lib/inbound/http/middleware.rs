use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::domain::user::models::User;
use crate::domain::user::ports::UserServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// Extension type carrying the caller resolved from the bearer token
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Middleware for routes that need an authenticated caller.
///
/// Rejects with 401 before the handler runs when the header is missing,
/// malformed, or carries a token that does not resolve to a user.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token_from_header(req.headers())?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    let user = authorize(&state, &token).await?;
    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}

/// Middleware for routes open to anonymous callers.
///
/// A caller whose header or token does not check out (typically a client
/// still holding an expired token) is served as anonymous. Only store
/// failures abort the request.
pub async fn optional_bearer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let extracted = extract_token_from_header(req.headers());
    let caller = match extracted {
        Ok(Some(token)) => authorize(&state, &token).await,
        Ok(None) => return Ok(next.run(req).await),
        Err(e) => Err(e),
    };

    match caller {
        Ok(user) => {
            req.extensions_mut().insert(CurrentUser(user));
        }
        Err(ApiError::Unauthorized(reason)) => {
            tracing::warn!(reason = %reason, "Ignoring unusable credentials, serving as anonymous");
        }
        Err(e) => return Err(e),
    }

    Ok(next.run(req).await)
}

async fn authorize(state: &AppState, token: &str) -> Result<User, ApiError> {
    state.user_service.authorize(token).await.map_err(|e| {
        tracing::warn!(error = %e, "Bearer token rejected");
        ApiError::from(e)
    })
}

/// `Ok(None)` when the header is absent, an error when it is unusable.
fn extract_token_from_header(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(auth_header) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header".to_string()))?;

    match auth_str.split_once(' ') {
        Some((scheme, token))
            if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() =>
        {
            Ok(Some(token.trim().to_string()))
        }
        _ => Err(ApiError::Unauthorized(
            "Invalid Authorization header format. Expected: Bearer <token>".to_string(),
        )),
    }
}
