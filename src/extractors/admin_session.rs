use crate::auth::{AuthService, ADMIN_COOKIE};
use crate::error::ApiError;
use actix_web::{dev, web::Data, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{err, ok, Ready};
use log::error;

/// Proof that the request carries a valid admin session cookie.
/// Taking it as a handler argument makes the handler admin-only.
#[derive(Debug)]
pub struct AdminSession {
    pub is_admin: bool,
}

impl FromRequest for AdminSession {
    type Error = Error;
    type Future = Ready<Result<AdminSession, Error>>;
    type Config = ();

    fn from_request(req: &HttpRequest, _payload: &mut dev::Payload) -> Self::Future {
        let auth = match req.app_data::<Data<AuthService>>() {
            Some(auth) => auth,
            None => {
                error!("AuthService is not registered as app data");
                return err(ApiError::Internal("Authentication failed".to_owned()).into());
            }
        };
        let cookie = match req.cookie(ADMIN_COOKIE) {
            Some(cookie) => cookie,
            None => {
                return err(
                    ApiError::Unauthorized("Access denied. Admin token required.".to_owned())
                        .into(),
                )
            }
        };
        match auth.verify_token(cookie.value()) {
            Some(claims) if claims.is_admin() => ok(AdminSession { is_admin: true }),
            _ => err(ApiError::Unauthorized("Invalid or expired token".to_owned()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::cookie::Cookie;
    use actix_web::test::TestRequest;
    use actix_web::ResponseError;
    use futures::executor::block_on;

    fn auth() -> AuthService {
        AuthService::new(&bcrypt::hash("correct", 4).unwrap(), "test-secret")
    }

    fn extract(req: TestRequest) -> Result<AdminSession, Error> {
        let (req, mut payload) = req.data(auth()).to_http_parts();
        block_on(AdminSession::from_request(&req, &mut payload))
    }

    #[test]
    fn test_missing_cookie() {
        let e = extract(TestRequest::default()).unwrap_err();
        assert_eq!(e.as_response_error().status_code().as_u16(), 401);
    }

    #[test]
    fn test_invalid_cookie() {
        let req = TestRequest::default().cookie(Cookie::new(ADMIN_COOKIE, "garbage"));
        let e = extract(req).unwrap_err();
        assert_eq!(e.as_response_error().status_code().as_u16(), 401);
    }

    #[test]
    fn test_valid_cookie() {
        let token = auth().issue_token().unwrap();
        let req = TestRequest::default().cookie(Cookie::new(ADMIN_COOKIE, token));
        let session = extract(req).unwrap();
        assert!(session.is_admin);
    }
}
