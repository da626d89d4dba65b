use actix_web::{dev, Error, FromRequest, HttpRequest};
use futures::future::{ok, Ready};

pub const UNKNOWN_IP: &str = "unknown";

/// Caller address as seen through a reverse proxy.
pub struct ClientIp {
    pub ip_address: String,
}

fn header_value<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl ClientIp {
    pub fn from_request_head(req: &HttpRequest) -> Self {
        let forwarded = header_value(req, "x-forwarded-for")
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty());
        let ip_address = header_value(req, "x-real-ip")
            .or(forwarded)
            .map(str::to_owned)
            .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
            .unwrap_or_else(|| UNKNOWN_IP.to_owned());
        Self { ip_address }
    }
}

impl FromRequest for ClientIp {
    type Error = Error;
    type Future = Ready<Result<ClientIp, Error>>;
    type Config = ();

    fn from_request(req: &HttpRequest, _payload: &mut dev::Payload) -> Self::Future {
        ok(ClientIp::from_request_head(req))
    }
}
