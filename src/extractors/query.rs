//! Query string extractor backed by serde_qs.

use crate::error::ApiError;
use actix_web::{dev, Error, FromRequest, HttpRequest};
use futures::future::{err, ok, Ready};
use log::debug;
use serde::de;
use std::ops;

/// Deserializes the query string into `T`; a query that does not fit answers
/// with a JSON 400 like every other error.
#[derive(Debug)]
pub struct Query<T>(pub T);

impl<T> Query<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> ops::Deref for Query<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> FromRequest for Query<T>
where
    T: de::DeserializeOwned,
{
    type Error = Error;
    type Future = Ready<Result<Self, Error>>;
    type Config = ();

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        match serde_qs::from_str::<T>(req.query_string()) {
            Ok(value) => ok(Query(value)),
            Err(e) => {
                debug!("Could not extract query {:?}: {}", req.query_string(), e);
                err(ApiError::BadRequest("Could not extract query".to_owned()).into())
            }
        }
    }
}
