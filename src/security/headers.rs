//! Security headers for HTTP responses
//!
//! Every reply of the accounts API, errors included, carries these headers.

use warp::Reply;

/// Strict Content Security Policy for a JSON-only API
const STRICT_CSP: &str = "default-src 'none'; frame-ancestors 'none';";

const PERMISSIONS_POLICY: &str =
    "geolocation=(), microphone=(), camera=(), payment=(), usb=(), magnetometer=(), gyroscope=(), accelerometer=()";

/// Wrap a reply with strict security headers for API endpoints
pub fn with_api_security_headers<T: Reply>(reply: T) -> impl Reply {
    let reply = warp::reply::with_header(reply, "X-Frame-Options", "DENY");
    let reply = warp::reply::with_header(reply, "X-Content-Type-Options", "nosniff");
    let reply = warp::reply::with_header(reply, "Referrer-Policy", "no-referrer");
    let reply = warp::reply::with_header(reply, "Content-Security-Policy", STRICT_CSP);
    // Responses carry tokens and personal data
    let reply = warp::reply::with_header(reply, "Cache-Control", "no-store");
    warp::reply::with_header(reply, "Permissions-Policy", PERMISSIONS_POLICY)
}
