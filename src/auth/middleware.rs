use crate::auth::claims::{Claims, Role};
use crate::auth::jwt::TokenService;
use crate::types::AppError;
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request, State},
    http::{header, request::Parts, Extensions, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use std::sync::Arc;

/// Cookie consulted when no bearer header is present.
pub const DEFAULT_TOKEN_COOKIE: &str = "jwt";

/// State for [`authenticate`]: the token service plus where to look for tokens.
#[derive(Clone)]
pub struct Authenticator {
    tokens: Arc<TokenService>,
    cookie_name: String,
}

impl Authenticator {
    pub fn new(tokens: Arc<TokenService>, cookie_name: impl Into<String>) -> Self {
        Self {
            tokens,
            cookie_name: cookie_name.into(),
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Finds a candidate token: `Authorization: Bearer` first, then the cookie.
    pub fn token_from_headers<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        bearer_token(headers).or_else(|| cookie_token(headers, &self.cookie_name))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn cookie_token<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value)
}

/// Rejects requests without a valid token and attaches the verified claims.
///
/// Every failure (no token, malformed, forged, expired) produces the same
/// 401 response; the reason is only logged.
pub async fn authenticate(
    State(auth): State<Arc<Authenticator>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = auth
        .token_from_headers(req.headers())
        .ok_or_else(|| AppError::Unauthenticated("no token presented".to_string()))?;

    let claims = auth.tokens.verify(token).map_err(|kind| {
        tracing::debug!(reason = %kind, "token verification failed");
        AppError::from(kind)
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Lets the request through only if the verified role satisfies `required`.
///
/// Must sit behind [`authenticate`]; missing claims are answered with 401.
pub async fn require_role(
    State(required): State<Role>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = current_identity(req.extensions()).ok_or_else(|| {
        tracing::error!(%required, "role check reached without authenticated identity");
        AppError::Unauthenticated("no verified identity".to_string())
    })?;

    let Some(role) = claims.role() else {
        tracing::warn!(
            user_id = claims.user_id,
            role = ?claims.role,
            %required,
            "token carries no recognised role"
        );
        return Err(AppError::Forbidden(format!("role {required} required")));
    };

    if !role.satisfies(required) {
        tracing::warn!(user_id = claims.user_id, %role, %required, "insufficient role");
        return Err(AppError::Forbidden(format!("role {required} required")));
    }

    Ok(next.run(req).await)
}

/// Verified claims attached to this request, if any.
pub fn current_identity(extensions: &Extensions) -> Option<&Claims> {
    extensions.get::<Claims>()
}

/// Extractor for the verified caller. Rejects with 401 when absent.
///
/// `Option<AuthUser>` is also accepted for routes that allow anonymous callers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_identity(&parts.extensions)
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::Unauthenticated("no verified identity".to_string()))
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(current_identity(&parts.extensions).cloned().map(AuthUser))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::DEFAULT_ISSUER;
    use axum::{
        body::Body,
        http::{HeaderValue, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use chrono::Utc;
    use tower::ServiceExt;

    fn authenticator() -> Arc<Authenticator> {
        let tokens = TokenService::new(b"middleware-test-secret", DEFAULT_ISSUER, 3600)
            .expect("valid configuration");
        Arc::new(Authenticator::new(Arc::new(tokens), DEFAULT_TOKEN_COOKIE))
    }

    async fn whoami(AuthUser(claims): AuthUser) -> String {
        claims.username
    }

    async fn maybe_whoami(user: Option<AuthUser>) -> String {
        user.map(|AuthUser(c)| c.username)
            .unwrap_or_else(|| "anonymous".to_string())
    }

    fn app(auth: Arc<Authenticator>, required: Option<Role>) -> Router {
        let mut router = Router::new().route("/", get(whoami));
        if let Some(required) = required {
            router = router.route_layer(middleware::from_fn_with_state(required, require_role));
        }
        router.route_layer(middleware::from_fn_with_state(auth, authenticate))
    }

    fn request(headers: &[(header::HeaderName, String)]) -> Request {
        let mut builder = axum::http::Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn status_and_body(router: Router, req: Request) -> (StatusCode, String) {
        let response = router.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn token_for(auth: &Authenticator, role: Role) -> String {
        auth.tokens()
            .issue(9, "t@x.com", "tess", role)
            .expect("should issue")
    }

    #[test]
    fn test_bearer_header_wins_over_cookie() {
        let auth = authenticator();
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(header::COOKIE, HeaderValue::from_static("jwt=from-cookie"));

        assert_eq!(auth.token_from_headers(&headers), Some("from-header"));
    }

    #[test]
    fn test_cookie_used_when_header_missing_or_not_bearer() {
        let auth = authenticator();
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; jwt=from-cookie"));
        assert_eq!(auth.token_from_headers(&headers), Some("from-cookie"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert_eq!(auth.token_from_headers(&headers), Some("from-cookie"));
    }

    #[test]
    fn test_no_candidate_token() {
        let auth = authenticator();
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        headers.insert(header::COOKIE, HeaderValue::from_static("session=abc; jwt="));

        assert_eq!(auth.token_from_headers(&headers), None);
    }

    #[tokio::test]
    async fn test_valid_bearer_reaches_handler_with_claims() {
        let auth = authenticator();
        let token = token_for(&auth, Role::User);

        let (status, body) = status_and_body(
            app(auth, None),
            request(&[(header::AUTHORIZATION, format!("Bearer {token}"))]),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "tess");
    }

    #[tokio::test]
    async fn test_valid_cookie_reaches_handler() {
        let auth = authenticator();
        let token = token_for(&auth, Role::User);

        let (status, _) = status_and_body(
            app(auth, None),
            request(&[(header::COOKIE, format!("jwt={token}"))]),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_failures_are_indistinguishable() {
        let auth = authenticator();
        let now = Utc::now().timestamp();
        let mut expired = auth.tokens().claims_at(9, "t@x.com", "tess", Role::User, now - 7200);
        expired.exp = now - 1;
        let expired = auth.tokens().sign(&expired).unwrap();
        let mut forged = token_for(&auth, Role::Admin);
        forged.push('x');

        let cases = vec![
            vec![],
            vec![(header::AUTHORIZATION, "Bearer garbage".to_string())],
            vec![(header::AUTHORIZATION, format!("Bearer {expired}"))],
            vec![(header::AUTHORIZATION, format!("Bearer {forged}"))],
        ];

        let mut responses = Vec::new();
        for headers in cases {
            responses.push(status_and_body(app(auth.clone(), None), request(&headers)).await);
        }

        assert!(responses.iter().all(|(status, _)| *status == StatusCode::UNAUTHORIZED));
        assert!(responses.windows(2).all(|pair| pair[0].1 == pair[1].1));
    }

    #[tokio::test]
    async fn test_wrong_role_is_forbidden() {
        let auth = authenticator();
        let token = token_for(&auth, Role::User);

        let (status, _) = status_and_body(
            app(auth, Some(Role::Author)),
            request(&[(header::AUTHORIZATION, format!("Bearer {token}"))]),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_bypasses_required_role() {
        let auth = authenticator();
        let token = token_for(&auth, Role::Admin);

        for required in [Role::User, Role::Author, Role::Admin] {
            let (status, _) = status_and_body(
                app(auth.clone(), Some(required)),
                request(&[(header::AUTHORIZATION, format!("Bearer {token}"))]),
            )
            .await;
            assert_eq!(status, StatusCode::OK, "admin should pass {required}");
        }
    }

    #[tokio::test]
    async fn test_unknown_or_missing_role_is_forbidden() {
        let auth = authenticator();
        let now = Utc::now().timestamp();

        for role in [Some("Admin".to_string()), Some("editor".to_string()), None] {
            let mut claims = auth.tokens().claims_at(9, "t@x.com", "tess", Role::User, now);
            claims.role = role;
            let token = auth.tokens().sign(&claims).unwrap();

            let (status, _) = status_and_body(
                app(auth.clone(), Some(Role::User)),
                request(&[(header::AUTHORIZATION, format!("Bearer {token}"))]),
            )
            .await;
            assert_eq!(status, StatusCode::FORBIDDEN);
        }
    }

    #[tokio::test]
    async fn test_role_check_without_authentication_is_unauthorized() {
        let router = Router::new()
            .route("/", get(whoami))
            .route_layer(middleware::from_fn_with_state(Role::User, require_role));

        let (status, _) = status_and_body(router, request(&[])).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_optional_identity_on_open_route() {
        let router = Router::new().route("/", get(maybe_whoami));

        let (status, body) = status_and_body(router, request(&[])).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[test]
    fn test_current_identity_reads_without_mutating() {
        let mut extensions = Extensions::new();
        assert!(current_identity(&extensions).is_none());

        let auth = authenticator();
        let claims = auth.tokens().claims_at(3, "c@x.com", "cara", Role::Author, 0);
        extensions.insert(claims.clone());

        assert_eq!(current_identity(&extensions), Some(&claims));
        assert_eq!(current_identity(&extensions), Some(&claims));
    }
}
