use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;
use crate::state::AppState;

/// Identity of the caller, attached to the request by [`require_auth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub uid: u64,
    #[allow(dead_code)]
    pub role: u32,
}

/// Handler-side accessor for [`AuthContext`].
///
/// Rejects the request when the route was mounted without the auth layer
/// instead of panicking on a missing value.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub AuthContext);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Internal("authenticated account missing from request".to_string()))
    }
}

fn bearer_token(req: &Request) -> Option<String> {
    if let Some(token) = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return Some(token.to_string());
    }

    req.uri().query().and_then(|q| {
        q.split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == "token")
            .map(|(_, v)| v.to_string())
    })
}

/// Verifies the session token and stashes the caller's identity.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(token) = bearer_token(&req) else {
        return AppError::Auth("please log in first".to_string()).into_response();
    };

    let claims = match super::jwt::verify_token(&state.config.auth.token_secret, &token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Rejected session token: {e}");
            return AppError::Auth("session invalid or expired, please log in again".to_string())
                .into_response();
        }
    };

    req.extensions_mut().insert(AuthContext {
        uid: claims.id,
        role: claims.role,
    });
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http;

    #[test]
    fn token_from_header_wins() {
        let req = http::Request::builder()
            .uri("/adm/auth/get?token=query")
            .header("authorization", "Bearer header")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&req).as_deref(), Some("header"));
    }

    #[test]
    fn token_from_query() {
        let req = http::Request::builder()
            .uri("/adm/auth/get?x=1&token=abc.def")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&req).as_deref(), Some("abc.def"));
    }

    #[test]
    fn no_token() {
        let req = http::Request::builder()
            .uri("/adm/auth/get")
            .header("authorization", "Basic Zm9vOmJhcg==")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&req), None);
    }

    #[tokio::test]
    async fn accessor_fails_without_context() {
        let (mut parts, _) = http::Request::builder()
            .uri("/adm/auth/get")
            .body(Body::empty())
            .unwrap()
            .into_parts();
        let result = CurrentUser::from_request_parts(&mut parts, &()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn accessor_reads_context() {
        let (mut parts, _) = http::Request::builder()
            .uri("/adm/auth/get")
            .body(Body::empty())
            .unwrap()
            .into_parts();
        parts.extensions.insert(AuthContext { uid: 3, role: 1 });
        let CurrentUser(ctx) = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(ctx.uid, 3);
    }
}
