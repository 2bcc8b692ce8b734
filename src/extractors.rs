use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use uuid::Uuid;

pub const USER_HEADER: &str = "x-user-id";

/// Caller identity taken from the `x-user-id` header. Identification only;
/// whatever sits in front of the service is trusted to have authenticated it.
#[derive(Debug, Clone, Copy)]
pub struct UserContext(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_HEADER)
            .and_then(|h| h.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, format!("missing {USER_HEADER} header")))?;

        let id = Uuid::parse_str(raw.trim())
            .map_err(|_| (StatusCode::BAD_REQUEST, format!("invalid {USER_HEADER} header")))?;

        Ok(UserContext(id))
    }
}
