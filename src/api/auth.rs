use super::{ApiError, AppState};
use crate::database::models::UserRecord;
use crate::database::repositories::UserRepository;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

/// The authenticated caller, resolved from an `Authorization: Bearer <token>`
/// header against the users table.
pub(crate) struct AuthUser(pub UserRecord);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| ApiError::Unauthorized("missing authorization header".into()))?
            .to_str()
            .map_err(|_| ApiError::Unauthorized("malformed authorization header".into()))?;

        let mut words = header_value.split_whitespace();
        let scheme = words.next().unwrap_or("");
        let token = words.next().unwrap_or("");
        if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() || words.next().is_some() {
            return Err(ApiError::Unauthorized("expected a bearer token".into()));
        }

        let user = state
            .database
            .with_repositories(|repos| repos.users().get_by_token(token))?;
        user.map(AuthUser)
            .ok_or_else(|| ApiError::Unauthorized("unknown token".into()))
    }
}
