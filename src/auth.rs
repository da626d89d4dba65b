use crate::config::Config;
use actix_web::cookie::{Cookie, SameSite};
use anyhow::Result;
use chrono::prelude::*;
use chrono::Duration;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, error};
use serde::{Deserialize, Serialize};

pub const ADMIN_COOKIE: &str = "adminToken";
pub const ADMIN_ROLE: &str = "admin";
pub const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub role: String,
    /// Issue time in milliseconds since the epoch.
    pub timestamp: i64,
    #[serde(with = "jwt_numeric_date")]
    iat: DateTime<Utc>,
    #[serde(with = "jwt_numeric_date")]
    exp: DateTime<Utc>,
}

impl TokenClaims {
    pub fn new(role: &str, iat: DateTime<Utc>, exp: DateTime<Utc>) -> Self {
        // normalize the timestamps by stripping of sub-second precision
        let timestamp = iat.timestamp_millis();
        let iat = iat.with_nanosecond(0).unwrap_or(iat);
        let exp = exp.with_nanosecond(0).unwrap_or(exp);
        Self {
            role: role.to_owned(),
            timestamp,
            iat,
            exp,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// Password check and session tokens for the single admin identity.
#[derive(Clone)]
pub struct AuthService {
    password_hash: String,
    secret: String,
    secure_cookies: bool,
}

impl AuthService {
    pub fn new(password_hash: &str, secret: &str) -> Self {
        Self {
            password_hash: password_hash.to_owned(),
            secret: secret.to_owned(),
            secure_cookies: false,
        }
    }

    /// Session cookies carry the `Secure` attribute when enabled.
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.admin_password_hash, &config.jwt_secret)
            .with_secure_cookies(config.is_production())
    }

    /// A malformed hash is reported as a mismatch, never as an error.
    pub fn verify_password(&self, candidate: &str) -> bool {
        match bcrypt::verify(candidate, &self.password_hash) {
            Ok(valid) => valid,
            Err(e) => {
                error!("Error verifying password: {}", e);
                false
            }
        }
    }

    pub fn issue_token(&self) -> Result<String> {
        let now = Utc::now();
        let claims = TokenClaims::new(ADMIN_ROLE, now, now + Duration::days(TOKEN_TTL_DAYS));
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )?;
        Ok(token)
    }

    pub fn verify_token(&self, token: &str) -> Option<TokenClaims> {
        match decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        ) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!("Invalid token: {}", e);
                None
            }
        }
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build(ADMIN_COOKIE, token)
            .path("/")
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::days(TOKEN_TTL_DAYS))
            .finish()
    }

    /// Same attributes as the session cookie, emptied and already expired.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build(ADMIN_COOKIE, "")
            .path("/")
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::zero())
            .finish()
    }
}

mod jwt_numeric_date {
    //! Custom serialization of DateTime<Utc> to conform with the JWT spec (RFC 7519 section 2, "Numeric Date")
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    /// Serializes a DateTime<Utc> to a Unix timestamp (seconds since 1970/1/1T00:00:00T)
    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let timestamp = date.timestamp();
        serializer.serialize_i64(timestamp)
    }

    /// Attempts to deserialize an i64 and use as a Unix timestamp
    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Utc.timestamp_opt(i64::deserialize(deserializer)?, 0)
            .single() // If there are multiple or no valid DateTimes from timestamp, return None
            .ok_or_else(|| serde::de::Error::custom("invalid Unix timestamp value"))
    }
}
