//! Security headers middleware

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};

const STATIC_HEADERS: [(&str, &str); 5] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "no-referrer"),
    ("content-security-policy", "default-src 'none'"),
    ("cross-origin-resource-policy", "same-site"),
];

fn forwarded_https(req: &Request) -> bool {
    let header_says_https = req
        .headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("https"));
    let uri_says_https = req
        .uri()
        .scheme_str()
        .is_some_and(|s| s.eq_ignore_ascii_case("https"));
    header_says_https || uri_says_https
}

/// Baseline hardening headers for a JSON API; HSTS only behind HTTPS.
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let https = forwarded_https(&req);
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    for (name, value) in STATIC_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
    if https {
        headers.insert(
            "strict-transport-security",
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }

    response
}
