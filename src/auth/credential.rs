//! Credential extraction and classification.
//!
//! Nothing here performs I/O: it only decides which verifier, if any, a
//! presented token deserves.

use axum::http::{header::AUTHORIZATION, HeaderMap, Uri};

use crate::auth::collaborators::CustomTokenVerifier;

/// A presented token, tagged by the verifier that should see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential<'a> {
    /// Opaque token owned by the custom token verifier.
    CustomToken(&'a str),
    /// `raw` is the value as presented, `jwt` has the bearer prefix removed.
    BearerJwt { raw: &'a str, jwt: &'a str },
}

impl<'a> Credential<'a> {
    /// Returns `None` for tokens no verifier should be asked about.
    pub fn classify(raw: &'a str, custom: &dyn CustomTokenVerifier) -> Option<Self> {
        if custom.is_custom_token(raw) {
            return Some(Credential::CustomToken(raw));
        }
        let jwt = strip_bearer(raw);
        is_jwt(jwt).then_some(Credential::BearerJwt { raw, jwt })
    }
}

/// Token presented with the request.
///
/// Every `Authorization` value is considered (header names are
/// case-insensitive, so `authorization` and `Authorization` share a slot),
/// then the `token` query parameter. The first non-empty value wins.
pub fn extract_token(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let from_header = headers
        .get_all(AUTHORIZATION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| !v.is_empty())
        .map(str::to_string);

    from_header.or_else(|| query_token(uri))
}

fn query_token(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, v)| k == "token" && !v.is_empty())
        .map(|(_, v)| v.into_owned())
}

pub fn strip_bearer(raw: &str) -> &str {
    raw.strip_prefix("Bearer ")
        .or_else(|| raw.strip_prefix("bearer "))
        .unwrap_or(raw)
}

/// Structural JWT check: three dot-separated base64url segments.
pub fn is_jwt(candidate: &str) -> bool {
    let segments: Vec<&str> = candidate.split('.').collect();
    segments.len() == 3 && segments.iter().all(|s| is_base64url(s))
}

fn is_base64url(segment: &str) -> bool {
    let body = segment.trim_end_matches('=');
    let padding = segment.len() - body.len();
    !body.is_empty()
        && padding <= 2
        && body
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
