use actix_web::middleware::DefaultHeaders;

/// Response headers every reply carries, API and client bundle alike.
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .header("X-Content-Type-Options", "nosniff")
        .header("X-Frame-Options", "SAMEORIGIN")
        .header("X-XSS-Protection", "0")
        .header("X-DNS-Prefetch-Control", "off")
        .header("X-Download-Options", "noopen")
        .header("X-Permitted-Cross-Domain-Policies", "none")
        .header("Referrer-Policy", "no-referrer")
        .header(
            "Strict-Transport-Security",
            "max-age=15552000; includeSubDomains",
        )
}
