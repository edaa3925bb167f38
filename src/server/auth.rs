//! Shared-credential basic auth for the whole API.

use std::net::SocketAddr;

use base64::Engine;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, AUTHORIZATION, WWW_AUTHENTICATE};
use hyper::{Request, Response, StatusCode};
use tracing::warn;

use super::router::json_error;
use crate::config::AuthConfig;

/// Check a request against the configured credential. Returns the
/// rejection response when the request must not proceed, None when it
/// may. Generic over the body so it is testable without a live
/// connection.
pub fn check<B>(
    credentials: &AuthConfig,
    req: &Request<B>,
    remote: SocketAddr,
) -> Option<Response<Full<Bytes>>> {
    let header = match req.headers().get(AUTHORIZATION) {
        Some(header) => header,
        None => {
            warn!(client = %remote, "Unauthorized attempt: no credentials provided");
            return Some(challenge());
        }
    };

    let value = match header.to_str() {
        Ok(value) => value,
        Err(_) => return Some(bad_header()),
    };

    let encoded = match value.split_once(' ') {
        // Authorization may be padded; be liberal and strip trailing
        // equals before decoding without padding.
        Some(("Basic", encoded)) => encoded.trim_end_matches('='),
        _ => return Some(bad_header()),
    };

    let decoded = match base64::engine::general_purpose::STANDARD_NO_PAD.decode(encoded) {
        Ok(decoded) => decoded,
        Err(_) => return Some(bad_header()),
    };
    let text = match std::str::from_utf8(&decoded) {
        Ok(text) => text,
        Err(_) => return Some(bad_header()),
    };

    match text.split_once(':') {
        Some((user, password)) if user == credentials.user && password == credentials.password => {
            None
        }
        _ => {
            warn!(client = %remote, "Unauthorized attempt: credentials rejected");
            Some(challenge())
        }
    }
}

fn challenge() -> Response<Full<Bytes>> {
    let mut response = json_error(StatusCode::UNAUTHORIZED, "Unauthorized", None);
    response.headers_mut().insert(
        WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"mailshelf\""),
    );
    response
}

fn bad_header() -> Response<Full<Bytes>> {
    json_error(
        StatusCode::BAD_REQUEST,
        "Unsupported Authorization field",
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> AuthConfig {
        AuthConfig {
            user: "admin".to_string(),
            password: "secret".to_string(),
        }
    }

    fn remote() -> SocketAddr {
        "127.0.0.1:9999".parse().unwrap()
    }

    fn request(auth_header: Option<&str>) -> Request<()> {
        let mut builder = Request::builder().uri("/emails");
        if let Some(value) = auth_header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap()
    }

    fn basic(user: &str, password: &str) -> String {
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", user, password));
        format!("Basic {}", encoded)
    }

    #[test]
    fn test_valid_credentials_pass() {
        let req = request(Some(&basic("admin", "secret")));
        assert!(check(&credentials(), &req, remote()).is_none());
    }

    #[test]
    fn test_missing_header_is_challenged() {
        let req = request(None);
        let response = check(&credentials(), &req, remote()).expect("Should be rejected");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(WWW_AUTHENTICATE));
    }

    #[test]
    fn test_wrong_password_is_rejected() {
        let req = request(Some(&basic("admin", "wrong")));
        let response = check(&credentials(), &req, remote()).expect("Should be rejected");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_malformed_header_is_a_bad_request() {
        for value in ["Bearer token", "Basic !!!not-base64!!!"] {
            let req = request(Some(value));
            let response = check(&credentials(), &req, remote()).expect("Should be rejected");
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }
}
