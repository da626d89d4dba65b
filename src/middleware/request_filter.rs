//! Rejects requests whose body, query or path look like injection attempts.
//!
//! This is a blunt signature scan over the serialized request, not a parser:
//! it knows nothing about field semantics, so legitimate text containing a
//! listed keyword is rejected as well.

use crate::error::ApiError;
use actix_http::h1;
use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::web::{self, Bytes, BytesMut};
use actix_web::{Error, HttpMessage};
use futures::future::{ok, Ready};
use futures::{Future, StreamExt};
use lazy_static::lazy_static;
use log::warn;
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

pub const MAX_BODY_BYTES: usize = 1024 * 1024;
pub const REJECTION_MESSAGE: &str = "Malicious content detected in request data";

lazy_static! {
    static ref SIGNATURES: Vec<(&'static str, Regex)> = vec![
        (
            "sql-statement",
            Regex::new(r"(?i)\b(SELECT|INSERT|UPDATE|DELETE|DROP|TRUNCATE|ALTER|CREATE|EXEC|UNION|LOAD_FILE|OUTFILE)\b.*\b(FROM|INTO|TABLE|DATABASE)\b").unwrap(),
        ),
        (
            "sql-tautology",
            Regex::new(r"(?i)\b(OR 1=1|AND 1=1|OR '1'='1'|--|#|/\*|\*/|;|\bUNION\b.*?\bSELECT\b)").unwrap(),
        ),
        (
            "nosql-operator",
            Regex::new(r"(?i)\$(where|ne|gt|lt|regex|exists|not|or|and)\b").unwrap(),
        ),
        (
            "script",
            Regex::new(r"(?i)(<script|</script>|document\.cookie|eval\(|alert\(|javascript:|onerror=|onmouseover=)").unwrap(),
        ),
        (
            "command",
            Regex::new(r"(?i)(\bexec\s*xp_cmdshell|\bshutdown\b|\bdrop\s+database|\bdelete\s+from)").unwrap(),
        ),
        (
            "shell",
            Regex::new(r"(?i)\b(base64_decode|cmd|powershell|wget|curl|rm -rf|nc -e|perl -e|python -c)\b").unwrap(),
        ),
    ];
}

/// Name of the first signature family matching `payload`, if any.
pub fn find_suspicious(payload: &str) -> Option<&'static str> {
    SIGNATURES
        .iter()
        .find(|(_, pattern)| pattern.is_match(payload))
        .map(|(family, _)| *family)
}

/// The parts of a request the filter looks at, each as JSON.
#[derive(Debug)]
pub struct RequestSnapshot {
    body: Value,
    query: Value,
    params: Value,
}

impl RequestSnapshot {
    /// Route parameters are unknown before routing, so the decoded path
    /// segments stand in for them.
    pub fn new(body: &[u8], query_string: &str, path: &str) -> Self {
        let body = if body.is_empty() {
            json!({})
        } else {
            serde_json::from_slice::<Value>(body)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
        };
        let query = if query_string.is_empty() {
            json!({})
        } else {
            web::Query::<BTreeMap<String, String>>::from_query(query_string)
                .map(|query| json!(query.into_inner()))
                .unwrap_or_else(|_| Value::String(query_string.to_owned()))
        };
        let params: Vec<String> = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
            .collect();
        Self {
            body,
            query,
            params: json!(params),
        }
    }

    /// Each part is scanned on its own: a keyword in the route path must not
    /// pair up with another one in the body.
    pub fn suspicious_family(&self) -> Option<&'static str> {
        [&self.body, &self.query, &self.params]
            .iter()
            .find_map(|part| find_suspicious(&part.to_string()))
    }

    pub fn to_json(&self) -> String {
        json!({ "body": self.body, "query": self.query, "params": self.params }).to_string()
    }
}

fn bytes_to_payload(buf: Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}

pub struct RequestFilter;

impl<S, B> Transform<S> for RequestFilter
where
    S: Service<Request = ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Request = ServiceRequest;
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestFilterMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequestFilterMiddleware {
            service: Rc::new(RefCell::new(service)),
        })
    }
}

pub struct RequestFilterMiddleware<S> {
    service: Rc<RefCell<S>>,
}

impl<S, B> Service for RequestFilterMiddleware<S>
where
    S: Service<Request = ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Request = ServiceRequest;
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, mut req: ServiceRequest) -> Self::Future {
        let mut svc = self.service.clone();

        Box::pin(async move {
            let mut body = BytesMut::new();
            let mut stream = req.take_payload();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                if body.len() + chunk.len() > MAX_BODY_BYTES {
                    return Ok(req.error_response(ApiError::PayloadTooLarge(
                        "Request body too large".to_owned(),
                    )));
                }
                body.extend_from_slice(&chunk);
            }
            let body = body.freeze();

            let snapshot = RequestSnapshot::new(&body, req.query_string(), req.path());
            if let Some(family) = snapshot.suspicious_family() {
                warn!("Suspicious input detected ({}): {}", family, snapshot.to_json());
                return Ok(req.error_response(ApiError::BadRequest(REJECTION_MESSAGE.to_owned())));
            }

            req.set_payload(bytes_to_payload(body));
            svc.call(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MessageResponse;
    use actix_web::{test, App, HttpResponse};

    fn scan(body: &[u8], query: &str, path: &str) -> Option<&'static str> {
        RequestSnapshot::new(body, query, path).suspicious_family()
    }

    #[test]
    fn test_clean_payloads_pass() {
        assert_eq!(scan(b"", "", "/api/articles"), None);
        let body = br#"{"title":"Ownership","content":"Values move from one owner into another"}"#;
        assert_eq!(scan(body, "page=2&limit=10", "/api/articles/create-article"), None);
    }

    #[test]
    fn test_sql_injection_is_caught() {
        let body = br#"{"password":"'; DROP TABLE users; --"}"#;
        assert!(scan(body, "", "/api/auth/login").is_some());
        assert_eq!(find_suspicious("select name from users"), Some("sql-statement"));
        assert_eq!(find_suspicious("x' OR 1=1"), Some("sql-tautology"));
    }

    #[test]
    fn test_operator_injection_is_caught() {
        let body = br#"{"$where": "this.likes > 0"}"#;
        assert_eq!(scan(body, "", "/api/auth/login"), Some("nosql-operator"));
        assert!(scan(b"", "q[$ne]=1", "/api/articles/search").is_some());
    }

    #[test]
    fn test_script_and_shell_are_caught() {
        assert_eq!(find_suspicious("<SCRIPT>alert(1)</SCRIPT>"), Some("script"));
        assert_eq!(find_suspicious("please wget this"), Some("shell"));
        assert_eq!(scan(b"", "", "/api/articles/%3Cscript%3E"), Some("script"));
    }

    #[test]
    fn test_snapshot_shape() {
        let snapshot = RequestSnapshot::new(b"not json", "a=1", "/api/articles/hello");
        let value: Value = serde_json::from_str(&snapshot.to_json()).unwrap();
        assert_eq!(value["body"], "not json");
        assert_eq!(value["query"]["a"], "1");
        assert_eq!(value["params"], json!(["api", "articles", "hello"]));
    }

    async fn echo(body: Bytes) -> HttpResponse {
        HttpResponse::Ok().body(body)
    }

    #[actix_rt::test]
    async fn test_middleware_passes_body_through() {
        let mut app = test::init_service(
            App::new()
                .wrap(RequestFilter)
                .route("/echo", web::post().to(echo)),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/echo")
            .set_payload(r#"{"title":"hello"}"#)
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(test::read_body(resp).await, r#"{"title":"hello"}"#);
    }

    #[actix_rt::test]
    async fn test_middleware_rejects_before_handler() {
        let mut app = test::init_service(
            App::new()
                .wrap(RequestFilter)
                .route("/echo", web::post().to(|| async { HttpResponse::Ok().body("reached") })),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/echo")
            .set_json(&json!({ "password": "'; DROP TABLE users; --" }))
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
        let body: MessageResponse = test::read_body_json(resp).await;
        assert_eq!(body.message, REJECTION_MESSAGE);
    }

    #[actix_rt::test]
    async fn test_middleware_limits_body_size() {
        let mut app = test::init_service(
            App::new()
                .wrap(RequestFilter)
                .route("/echo", web::post().to(echo)),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/echo")
            .set_payload(vec![b'a'; MAX_BODY_BYTES + 1])
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status().as_u16(), 413);
    }
}
