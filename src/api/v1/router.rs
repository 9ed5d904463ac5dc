use super::error::{ApiErrorCode, recover_error};
use super::gate::with_principal;
use super::handler::{self, LogoutRequest};
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;

const MAX_BODY_BYTES: u64 = 16 * 1024;

/// All routes under `/api/v1`, with rejections rendered as `ApiResponse` errors.
pub fn api(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
    warp::path("api")
        .and(warp::path("v1"))
        .and(routes(server))
        .recover(recover_error)
}

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let register = warp::path!("auth" / "register")
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::register);

    let login = warp::path!("auth" / "login")
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::login);

    let refresh = warp::path!("auth" / "refresh")
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::refresh);

    let logout = warp::path!("auth" / "logout")
        .and(warp::post())
        .and(with_principal(server.token_lifecycle.clone()))
        .and(optional_json_body::<LogoutRequest>())
        .and(with(server.auth_service.clone()))
        .and_then(handler::logout);

    let profile = warp::path!("protected" / "profile")
        .and(warp::get())
        .and(with_principal(server.token_lifecycle.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::profile);

    register.or(login).or(refresh).or(logout).or(profile)
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// Like [`json_body`], but a request without any body yields `T::default()`.
/// A body that is present and does not parse is still a 400.
fn optional_json_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Default + Send,
{
    let no_body = warp::header::optional::<u64>("content-length")
        .and(warp::header::optional::<String>("transfer-encoding"))
        .and_then(|length: Option<u64>, encoding: Option<String>| async move {
            match (length, encoding) {
                (None | Some(0), None) => Ok(T::default()),
                _ => Err(warp::reject::custom(ApiErrorCode::BadRequest)),
            }
        });

    json_body::<T>().or(no_body).unify()
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}
