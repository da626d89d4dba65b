use crate::error::ErrorCause;
use actix_web::dev::{Body, ResponseBody, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::middleware::errhandlers::{ErrorHandlerResponse, ErrorHandlers};
use actix_web::Result;
use serde_json::json;

/// Adds a `detail` field with the underlying cause to unexpected 500s.
/// Only mounted outside production.
pub fn error_detail<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new().handler(StatusCode::INTERNAL_SERVER_ERROR, attach_detail)
}

fn attach_detail<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    let cause = res.response().extensions().get::<ErrorCause>().cloned();
    let cause = match cause {
        Some(cause) => cause,
        None => return Ok(ErrorHandlerResponse::Response(res)),
    };
    let body = json!({
        "message": cause.message,
        "detail": cause.detail,
    })
    .to_string();
    let res = res.map_body(|_, _| ResponseBody::Other(Body::from(body)));
    Ok(ErrorHandlerResponse::Response(res))
}
