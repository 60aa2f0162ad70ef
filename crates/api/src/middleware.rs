use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::context::PrincipalContext;

const USER_HEADER: &str = "x-user-id";
const ROLE_HEADER: &str = "x-user-role";

/// Resolve the authenticated identity from the gateway-supplied headers and
/// stash it as a request extension. Rejects with 401 when absent or malformed.
pub async fn identity_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let principal = extract_principal(req.headers())?;
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

fn extract_principal(headers: &HeaderMap) -> Result<PrincipalContext, StatusCode> {
    let user_id = headers
        .get(USER_HEADER)
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_str()
        .map_err(|_| StatusCode::UNAUTHORIZED)?
        .parse()
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let admin = headers
        .get(ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|role| role.eq_ignore_ascii_case("admin"));

    Ok(PrincipalContext::new(user_id, admin))
}
