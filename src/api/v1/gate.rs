use super::error::ApiErrorCode;
use crate::application_port::TokenLifecycle;
use crate::domain_model::Principal;
use std::sync::Arc;
use warp::{Filter, http, reject};

/// Extracts `<token>` from an `Authorization: Bearer <token>` value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, ApiErrorCode> {
    let token = header
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiErrorCode::MalformedHeader)?;
    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(ApiErrorCode::MalformedHeader);
    }
    Ok(token)
}

/// Rejects the request unless it carries a live access token; downstream
/// filters receive the resolved [`Principal`].
pub fn with_principal(
    token_lifecycle: Arc<dyn TokenLifecycle>,
) -> impl Filter<Extract = (Principal,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(http::header::AUTHORIZATION.as_ref()).and_then(
        move |header: Option<String>| {
            let token_lifecycle = token_lifecycle.clone();
            async move {
                let token = bearer_token(header.as_deref()).map_err(reject::custom)?;
                token_lifecycle
                    .validate_access(token)
                    .await
                    .map_err(ApiErrorCode::from)
                    .map_err(reject::custom)
            }
        },
    )
}
